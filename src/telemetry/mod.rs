//! Service statistics
//!
//! Request handlers record what they did; `/health` reports the totals.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Something worth counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceEvent {
    MaterialIngested { chunks: usize },
    LectureEmbedded { chunks: usize },
    /// A question was answered from the material
    Answered,
    /// A relevance gate refused a question
    Refused,
    QuizGenerated { questions: usize },
    RequestFailed,
}

/// Running totals since startup
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceStats {
    pub materials_ingested: usize,
    pub lectures_embedded: usize,
    pub chunks_embedded: usize,
    pub questions_answered: usize,
    pub questions_refused: usize,
    pub quizzes_generated: usize,
    pub quiz_questions: usize,
    pub failed_requests: usize,
    /// Share of questions answered rather than refused
    pub answer_rate: f64,
    pub uptime_secs: u64,
}

/// Shared stats collector, cheap to clone into handlers
#[derive(Clone)]
pub struct StatsCollector {
    stats: Arc<Mutex<ServiceStats>>,
    start_time: Instant,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(ServiceStats::default())),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, event: ServiceEvent) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            ServiceEvent::MaterialIngested { chunks } => {
                stats.materials_ingested += 1;
                stats.chunks_embedded += chunks;
            }
            ServiceEvent::LectureEmbedded { chunks } => {
                stats.lectures_embedded += 1;
                stats.chunks_embedded += chunks;
            }
            ServiceEvent::Answered => stats.questions_answered += 1,
            ServiceEvent::Refused => stats.questions_refused += 1,
            ServiceEvent::QuizGenerated { questions } => {
                stats.quizzes_generated += 1;
                stats.quiz_questions += questions;
            }
            ServiceEvent::RequestFailed => stats.failed_requests += 1,
        }
    }

    /// Snapshot with the current answer rate and uptime filled in
    pub fn snapshot(&self) -> ServiceStats {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone();
        stats.answer_rate = answer_rate(&stats);
        stats.uptime_secs = self.elapsed().as_secs();
        stats
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

}

fn answer_rate(stats: &ServiceStats) -> f64 {
    let total = stats.questions_answered + stats.questions_refused;
    if total == 0 {
        1.0
    } else {
        stats.questions_answered as f64 / total as f64
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
