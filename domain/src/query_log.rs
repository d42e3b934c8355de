use crate::models::ScoredChunk;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One line of the append-only query log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogRecord {
    pub timestamp: DateTime<Local>,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_sources: Option<usize>,
    pub elapsed_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics_used: Option<Vec<String>>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
}

impl QueryLogRecord {
    pub fn success(
        question: &str,
        model: &str,
        answer: &str,
        sources: &[ScoredChunk],
        elapsed_time: f64,
    ) -> Self {
        let mut topics: Vec<String> = sources
            .iter()
            .map(|s| s.chunk.metadata.topic.clone())
            .collect();
        topics.sort();
        topics.dedup();
        Self {
            timestamp: Local::now(),
            question: question.to_string(),
            answer_length: Some(answer.chars().count()),
            num_sources: Some(sources.len()),
            elapsed_time,
            topics_used: Some(topics),
            model: model.to_string(),
            error: None,
            success: true,
        }
    }

    pub fn failure(question: &str, model: &str, error: &str, elapsed_time: f64) -> Self {
        Self {
            timestamp: Local::now(),
            question: question.to_string(),
            answer_length: None,
            num_sources: None,
            elapsed_time,
            topics_used: None,
            model: model.to_string(),
            error: Some(error.to_string()),
            success: false,
        }
    }
}
