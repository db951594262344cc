//! Audit record payload.

use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// Summary of one proxied request/response pair, as accepted by the log backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// `"Request: METHOD PATH"`.
    pub service: String,
    /// `"Response: STATUS"`.
    pub message: String,
}

impl AuditRecord {
    pub fn new(method: &Method, path: &str, status: StatusCode) -> Self {
        Self {
            service: format!("Request: {} {}", method, path),
            message: format!("Response: {}", status.as_u16()),
        }
    }

    /// Compact JSON body for the ingestion endpoint.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let record = AuditRecord::new(&Method::DELETE, "/service/7", StatusCode::NO_CONTENT);
        assert_eq!(record.service, "Request: DELETE /service/7");
        assert_eq!(record.message, "Response: 204");
    }

    #[test]
    fn test_json_has_only_service_and_message() {
        let record = AuditRecord::new(&Method::GET, "/service/:id", StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = serde_json::from_slice(&record.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "service": "Request: GET /service/:id",
                "message": "Response: 502",
            })
        );
    }
}
