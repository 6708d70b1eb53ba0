// Wrong-answer options derived from the correct term
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+").unwrap());

const PREFIXES: &[&str] = &["Neo-", "Proto-", "Meta-", "Pseudo-"];
const SUFFIXES: &[&str] = &["-like", "-based", "-oriented", "-centric"];

/// Three distractors for `term`. Numbers are perturbed; anything else gets
/// a prefix, a suffix and an "Alternative" variant. Duplicates are allowed.
pub fn distractors<R: Rng + ?Sized>(term: &str, rng: &mut R) -> Vec<String> {
    if let Some(n) = as_integer(term) {
        return vec![
            n.saturating_add(rng.gen_range(1..=10)).to_string(),
            n.saturating_sub(rng.gen_range(1..=10)).to_string(),
            n.saturating_mul(2).to_string(),
        ];
    }

    if let Some(x) = as_decimal(term) {
        return vec![
            format!("{:.2}", x + rng.gen_range(0.5..=2.0)),
            format!("{:.2}", x - rng.gen_range(0.5..=2.0)),
            format!("{:.2}", x * 1.5),
        ];
    }

    let prefix = PREFIXES.choose(rng).copied().unwrap_or_default();
    let suffix = SUFFIXES.choose(rng).copied().unwrap_or_default();
    vec![
        format!("{}{}", prefix, term),
        format!("{}{}", term, suffix),
        format!("Alternative {}", term),
    ]
}

fn as_integer(term: &str) -> Option<i64> {
    if term.is_empty() || !term.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    term.parse().ok()
}

fn as_decimal(term: &str) -> Option<f64> {
    let m = DECIMAL.find(term)?;
    m.as_str().parse().ok()
}
