use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Active,
    Completed,
    Aborted,
}

impl StreamStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl std::str::FromStr for StreamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "aborted" => Ok(Self::Aborted),
            other => Err(format!("unknown stream status: {}", other)),
        }
    }
}

/// Durable snapshot of a generation, one per thread.
///
/// `chunks` is append-only while the stream is active: chunk `k` never changes once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCheckpoint {
    pub thread_id: String,
    pub status: StreamStatus,
    pub chunks: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl StreamCheckpoint {
    pub fn new(
        thread_id: impl Into<String>,
        status: StreamStatus,
        chunks: Vec<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            status,
            chunks,
            updated_at,
        }
    }

    /// Chunks from `cursor` onward; empty when the cursor is past the end
    pub fn chunks_from(&self, cursor: usize) -> &[String] {
        self.chunks.get(cursor..).unwrap_or(&[])
    }
}
