use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Metadata;

/// A conversation. `updated_at` never moves backwards and never precedes `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Thread {
    /// Advance `updated_at` to `at` unless it is already later
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}

/// Input for idempotent thread creation
#[derive(Debug, Clone)]
pub struct NewThread {
    pub id: String,
    pub session_id: String,
    pub metadata: Option<Metadata>,
    pub created_at: DateTime<Utc>,
}

impl NewThread {
    pub fn into_thread(self) -> Thread {
        Thread {
            id: self.id,
            session_id: self.session_id,
            created_at: self.created_at,
            updated_at: self.created_at,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_touch_is_monotonic() {
        let now = Utc::now();
        let mut thread = NewThread {
            id: "t1".to_string(),
            session_id: "s1".to_string(),
            metadata: None,
            created_at: now,
        }
        .into_thread();

        thread.touch(now + Duration::seconds(5));
        assert_eq!(thread.updated_at, now + Duration::seconds(5));

        thread.touch(now - Duration::seconds(5));
        assert_eq!(thread.updated_at, now + Duration::seconds(5));
        assert!(thread.updated_at >= thread.created_at);
    }
}
