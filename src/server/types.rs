// Request and response bodies. Field names follow the wire format clients
// already use, which mixes camelCase and snake_case.
use serde::{Deserialize, Serialize};

use crate::models::ModelState;
use crate::quiz::QuizQuestion;
use crate::telemetry::ServiceStats;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub embedding_model: ModelState,
    pub qa_model: ModelState,
    pub materials_stored: usize,
    pub lectures_stored: usize,
    pub stats: ServiceStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMaterialRequest {
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMaterialResponse {
    pub success: bool,
    pub extracted_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub material_id: String,
    pub extracted_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub material_id: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub material_id: String,
    pub difficulty: String,
    pub question_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedRequest {
    pub lecture_id: String,
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub status: String,
    #[serde(rename = "lectureId")]
    pub lecture_id: String,
    pub chunks_embedded: usize,
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyBuddyRequest {
    pub question: String,
    pub lecture_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteLectureResponse {
    pub status: String,
    #[serde(rename = "lectureId")]
    pub lecture_id: String,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
