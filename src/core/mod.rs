pub mod middleware;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The body Google APIs return alongside a non-success status.
///
/// ```json
/// { "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirestoreErrorResponse {
    pub error: FirestoreErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirestoreErrorDetails {
    pub code: i32,
    pub message: String,
    pub status: String,
}

impl FirestoreErrorResponse {
    pub fn new(code: i32, message: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            error: FirestoreErrorDetails {
                code,
                message: message.into(),
                status: status.into(),
            },
        }
    }

    pub fn display_message(&self) -> String {
        format!(
            "{} (code: {}, status: {})",
            self.error.message, self.error.code, self.error.status
        )
    }
}

impl fmt::Display for FirestoreErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_message())
    }
}
