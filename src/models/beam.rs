// Beam search decoding for sequence-to-sequence models
//
// The search is independent of any tensor library: a StepScorer hands back
// next-token logits for each live prefix and the search keeps the best
// `num_beams` continuations per step.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::errors::Result;

/// Scores the next token for a batch of decoder prefixes
pub trait StepScorer {
    /// Returns one logits row (vocabulary-sized) per prefix, in prefix order
    fn next_token_logits(&mut self, prefixes: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}

/// Beam search parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamSearchParams {
    /// Number of beams kept alive per step
    pub num_beams: usize,
    /// Maximum decoder length, start token included
    pub max_length: usize,
    /// End-of-sequence is suppressed below this decoder length
    pub min_length: usize,
    /// Forbid repeating any n-gram of this size (0 disables)
    pub no_repeat_ngram_size: usize,
    /// Stop as soon as `num_beams` hypotheses have finished
    pub early_stopping: bool,
    /// Exponent applied to the hypothesis length when normalising scores
    pub length_penalty: f32,
}

impl Default for BeamSearchParams {
    fn default() -> Self {
        Self {
            num_beams: 4,
            max_length: 150,
            min_length: 10,
            no_repeat_ngram_size: 3,
            early_stopping: true,
            length_penalty: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    score: f32,
}

/// Finished hypotheses, capped at `capacity` best by normalised score
struct Hypotheses {
    capacity: usize,
    length_penalty: f32,
    items: Vec<(f32, Vec<u32>)>,
}

impl Hypotheses {
    fn new(capacity: usize, length_penalty: f32) -> Self {
        Self {
            capacity,
            length_penalty,
            items: Vec::with_capacity(capacity + 1),
        }
    }

    fn normalise(&self, score: f32, len: usize) -> f32 {
        score / (len.max(1) as f32).powf(self.length_penalty)
    }

    fn push(&mut self, tokens: Vec<u32>, score: f32) {
        let normalised = self.normalise(score, tokens.len());
        self.items.push((normalised, tokens));
        self.items.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.items.truncate(self.capacity);
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    fn worst(&self) -> Option<f32> {
        self.items.last().map(|(s, _)| *s)
    }

    fn best(self) -> Option<Vec<u32>> {
        self.items.into_iter().next().map(|(_, tokens)| tokens)
    }
}

/// Beam search driver
#[derive(Debug, Clone, Default)]
pub struct BeamSearch {
    params: BeamSearchParams,
}

impl BeamSearch {
    pub fn new(params: BeamSearchParams) -> Self {
        Self { params }
    }

    /// Decode from `start_token` until `eos_token` or `max_length`.
    ///
    /// Returns the generated tokens without the start token and without
    /// a trailing end-of-sequence token.
    pub fn run<S: StepScorer>(&self, scorer: &mut S, start_token: u32, eos_token: u32) -> Result<Vec<u32>> {
        let num_beams = self.params.num_beams.max(1);
        let max_length = self.params.max_length.max(1);
        let mut finished = Hypotheses::new(num_beams, self.params.length_penalty);

        // A single root beam avoids num_beams identical copies on the first step
        let mut beams = vec![Beam { tokens: vec![start_token], score: 0.0 }];

        while !beams.is_empty() {
            let cur_len = beams[0].tokens.len();
            if cur_len >= max_length {
                break;
            }

            let prefixes: Vec<Vec<u32>> = beams.iter().map(|b| b.tokens.clone()).collect();
            let logits = scorer.next_token_logits(&prefixes)?;

            let mut candidates: Vec<(f32, usize, u32)> = Vec::new();
            for (beam_idx, (beam, row)) in beams.iter().zip(logits.iter()).enumerate() {
                let mut logprobs = log_softmax(row);
                if cur_len < self.params.min_length {
                    if let Some(lp) = logprobs.get_mut(eos_token as usize) {
                        *lp = f32::NEG_INFINITY;
                    }
                }
                for banned in banned_ngram_tokens(&beam.tokens, self.params.no_repeat_ngram_size) {
                    if let Some(lp) = logprobs.get_mut(banned as usize) {
                        *lp = f32::NEG_INFINITY;
                    }
                }
                for (token, lp) in top_k(&logprobs, 2 * num_beams) {
                    candidates.push((beam.score + lp, beam_idx, token));
                }
            }
            candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

            let mut next = Vec::with_capacity(num_beams);
            for (rank, (score, beam_idx, token)) in candidates.into_iter().enumerate() {
                if token == eos_token {
                    if rank < num_beams {
                        finished.push(beams[beam_idx].tokens[1..].to_vec(), score);
                    }
                } else {
                    let mut tokens = beams[beam_idx].tokens.clone();
                    tokens.push(token);
                    next.push(Beam { tokens, score });
                }
                if next.len() == num_beams {
                    break;
                }
            }

            if finished.is_full() {
                if self.params.early_stopping {
                    break;
                }
                let best_running = next
                    .first()
                    .map(|b| finished.normalise(b.score, b.tokens.len() - 1));
                match (finished.worst(), best_running) {
                    (Some(worst), Some(best)) if worst >= best => break,
                    (_, None) => break,
                    _ => {}
                }
            }

            beams = next;
        }

        if !finished.is_full() {
            for beam in beams {
                finished.push(beam.tokens[1..].to_vec(), beam.score);
            }
        }

        Ok(finished.best().unwrap_or_default())
    }
}

fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let sum: f32 = logits
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v - max).exp())
        .sum();
    let log_sum = sum.ln() + max;
    logits
        .iter()
        .map(|v| if v.is_finite() { v - log_sum } else { f32::NEG_INFINITY })
        .collect()
}

/// Best `k` finite entries as (token, logprob), highest first
fn top_k(logprobs: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut entries: Vec<(u32, f32)> = logprobs
        .iter()
        .enumerate()
        .filter(|(_, lp)| lp.is_finite())
        .map(|(i, lp)| (i as u32, *lp))
        .collect();

    let by_score = |a: &(u32, f32), b: &(u32, f32)| -> Ordering {
        b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
    };
    if entries.len() > k && k > 0 {
        entries.select_nth_unstable_by(k - 1, by_score);
        entries.truncate(k);
    }
    entries.sort_by(by_score);
    entries.truncate(k);
    entries
}

/// Tokens that would complete an n-gram already present in `tokens`
fn banned_ngram_tokens(tokens: &[u32], n: usize) -> Vec<u32> {
    if n == 0 || tokens.len() + 1 < n {
        return Vec::new();
    }
    if n == 1 {
        return tokens.to_vec();
    }
    let prefix = &tokens[tokens.len() - (n - 1)..];
    tokens
        .windows(n)
        .filter(|w| &w[..n - 1] == prefix)
        .map(|w| w[n - 1])
        .collect()
}
