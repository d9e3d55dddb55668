//! Wire types for the HTTP surface.

use serde::{Deserialize, Serialize};

/// Incoming `/clone_chat` body. A `question` of any non-string type fails
/// deserialization and is treated the same as a missing one.
#[derive(Debug, Clone, Deserialize)]
pub struct CloneChatRequest {
    pub question: Option<String>,
}

/// Successful answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CloneChatResponse {
    pub response: String,
}

/// Error body. The message is one of a fixed set and never carries detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

pub const MISSING_QUESTION: &str = "Missing question field";
pub const INTERNAL_ERROR: &str = "Internal Server Error";

/// Liveness probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub collection: String,
    pub passages: usize,
    #[serde(rename = "embeddingModel")]
    pub embedding_model: String,
    #[serde(rename = "chatModel")]
    pub chat_model: String,
    #[serde(rename = "topK")]
    pub top_k: usize,
}
