// Route handlers. Model work runs on the blocking pool.
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::path::PathBuf;
use tracing::{info, warn};

use super::error::ApiError;
use super::types::*;
use super::AppState;
use crate::errors::{Result, ServiceError};
use crate::extract;
use crate::qa::extractive::{ExtractiveAnswerer, NOT_AVAILABLE};
use crate::qa::study_buddy::{StudyBuddy, StudyBuddyAnswer, NOT_COVERED};
use crate::quiz;
use crate::telemetry::ServiceEvent;

const LECTURE_NOT_FOUND: &str =
    "Lecture content not found. Please ensure the material has been uploaded and processed.";

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ServiceError::ProcessingFailure(format!("Worker task failed: {}", e)))?
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        embedding_model: state.registry.embedder_state(),
        qa_model: state.registry.generator_state(),
        materials_stored: state.materials.len(),
        lectures_stored: state.lectures.len(),
        stats: state.stats.snapshot(),
    })
}

pub async fn process_material(
    State(state): State<AppState>,
    Json(request): Json<ProcessMaterialRequest>,
) -> ApiResult<ProcessMaterialResponse> {
    let path = PathBuf::from(&request.file_path);
    let extracted = run_blocking(move || extract::extract_text(&path)).await;

    match extracted {
        Ok(extracted_text) => Ok(Json(ProcessMaterialResponse {
            success: true,
            extracted_text,
        })),
        Err(err) => {
            warn!(file = %request.file_path, "extraction failed: {}", err);
            Err(state.failed(match err {
                err if err.is_client_error() => err.into(),
                _ => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Processing failed."),
            }))
        }
    }
}

pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<StatusResponse> {
    match ingest_material(&state, request).await {
        Ok(chunks) => {
            state.stats.record(ServiceEvent::MaterialIngested { chunks });
            Ok(Json(StatusResponse {
                status: "stored".to_string(),
            }))
        }
        Err(err) => Err(state.failed(ApiError::ingestion(err))),
    }
}

async fn ingest_material(state: &AppState, request: IngestRequest) -> Result<usize> {
    let embedder = state.registry.embedder()?;
    let materials = state.materials.clone();
    let IngestRequest {
        material_id,
        extracted_text,
    } = request;
    run_blocking(move || materials.ingest(embedder.as_ref(), &material_id, &extracted_text)).await
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    match answer_chat(&state, request).await {
        Ok(answer) => {
            state.stats.record(if answer == NOT_AVAILABLE {
                ServiceEvent::Refused
            } else {
                ServiceEvent::Answered
            });
            Ok(Json(ChatResponse { answer }))
        }
        Err(err) => Err(state.failed(ApiError::with_context(err, "Chat failed"))),
    }
}

async fn answer_chat(state: &AppState, request: ChatRequest) -> Result<String> {
    if !state.materials.exists(&request.material_id) {
        return Err(ServiceError::material_not_found(&request.material_id));
    }
    let embedder = state.registry.embedder()?;
    let materials = state.materials.clone();
    let answerer = ExtractiveAnswerer::new(state.retrieval.chat_top_k);
    run_blocking(move || {
        answerer.answer_material(&materials, embedder.as_ref(), &request.material_id, &request.question)
    })
    .await
}

pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(request): Json<QuizRequest>,
) -> ApiResult<QuizResponse> {
    let result = quiz::generate_for_material(
        &state.materials,
        &request.material_id,
        &request.difficulty,
        request.question_count,
        &mut rand::thread_rng(),
    );

    match result {
        Ok(questions) => {
            state.stats.record(ServiceEvent::QuizGenerated {
                questions: questions.len(),
            });
            Ok(Json(QuizResponse { questions }))
        }
        Err(err) => Err(state.failed(ApiError::with_context(err, "Quiz generation failed"))),
    }
}

pub async fn embed(
    State(state): State<AppState>,
    Json(request): Json<EmbedRequest>,
) -> ApiResult<EmbedResponse> {
    let chunks_embedded = request.chunks.len();
    let lecture_id = request.lecture_id.clone();

    match embed_lecture(&state, request).await {
        Ok(embedding_dim) => {
            state.stats.record(ServiceEvent::LectureEmbedded {
                chunks: chunks_embedded,
            });
            Ok(Json(EmbedResponse {
                status: "success".to_string(),
                lecture_id,
                chunks_embedded,
                embedding_dim,
            }))
        }
        Err(err) => Err(state.failed(ApiError::with_context(err, "Embedding failed"))),
    }
}

async fn embed_lecture(state: &AppState, request: EmbedRequest) -> Result<usize> {
    let embedder = state.registry.embedder()?;
    if request.chunks.is_empty() {
        return Err(ServiceError::InvalidInput("No chunks provided".to_string()));
    }
    info!(lecture_id = %request.lecture_id, chunks = request.chunks.len(), "embedding lecture");
    let lectures = state.lectures.clone();
    let EmbedRequest { lecture_id, chunks } = request;
    run_blocking(move || lectures.ingest_chunks(embedder.as_ref(), &lecture_id, chunks)).await
}

pub async fn study_buddy(
    State(state): State<AppState>,
    Json(request): Json<StudyBuddyRequest>,
) -> ApiResult<StudyBuddyAnswer> {
    match answer_study_buddy(&state, request).await {
        Ok(answer) => {
            state.stats.record(if answer.answer == NOT_COVERED && answer.sources_used == 0 {
                ServiceEvent::Refused
            } else {
                ServiceEvent::Answered
            });
            info!(confidence = ?answer.confidence, sources = answer.sources_used, "study buddy answered");
            Ok(Json(answer))
        }
        Err(err) => Err(state.failed(ApiError::with_context(err, "Failed to generate answer"))),
    }
}

async fn answer_study_buddy(state: &AppState, request: StudyBuddyRequest) -> Result<StudyBuddyAnswer> {
    let (embedder, generator) = match (state.registry.embedder(), state.registry.generator()) {
        (Ok(e), Ok(g)) => (e, g),
        _ => return Err(ServiceError::ModelUnavailable("AI models not loaded".to_string())),
    };
    if !state.lectures.exists(&request.lecture_id) {
        return Err(ServiceError::NotFound(LECTURE_NOT_FOUND.to_string()));
    }

    let lectures = state.lectures.clone();
    let buddy = StudyBuddy::from_config(&state.retrieval);
    run_blocking(move || {
        buddy.answer(
            &lectures,
            embedder.as_ref(),
            generator.as_ref(),
            &request.lecture_id,
            &request.question,
        )
    })
    .await
}

pub async fn delete_lecture(
    State(state): State<AppState>,
    Path(lecture_id): Path<String>,
) -> ApiResult<DeleteLectureResponse> {
    if state.lectures.remove(&lecture_id) {
        Ok(Json(DeleteLectureResponse {
            status: "deleted".to_string(),
            lecture_id,
        }))
    } else {
        Err(ApiError::new(StatusCode::NOT_FOUND, "Lecture not found"))
    }
}
