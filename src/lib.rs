//! PrepEase AI service
//!
//! Retrieval-grounded study assistant: extracts text from study files,
//! chunks and embeds it per material, answers questions only from the
//! stored material and builds fill-in-the-blank quizzes.
//!
//! # Architecture
//!
//! - `rag`: chunking, embedding matrix, cosine ranking, material store
//! - `models`: embedder/generator traits, local candle models, beam search
//! - `qa` and `quiz`: answer and quiz synthesis over retrieved chunks
//! - `extract`: PDF and PPTX text extraction
//! - `server`: axum HTTP surface

pub mod errors;
pub mod text;

pub use errors::{Result, ServiceError};

pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod qa;
pub mod quiz;
pub mod rag;
pub mod server;
pub mod telemetry;
