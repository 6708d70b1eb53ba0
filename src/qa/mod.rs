// Question answering over stored material
//
// - extractive: keyword gate + sentence extraction, no model beyond the embedder
// - study_buddy: similarity gate + grounded generation

pub mod extractive;
pub mod study_buddy;

pub use extractive::ExtractiveAnswerer;
pub use study_buddy::{Confidence, StudyBuddy, StudyBuddyAnswer};
