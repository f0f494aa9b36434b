use axum::http::{Method, StatusCode, Uri};
use serde::Serialize;
use serde_json::json;
use serde_with::skip_serializing_none;
use tracing::debug;
use uuid::Uuid;

use super::error::ClientError;
use crate::web::{Error, Result};

/// One structured line per request, emitted after the response mapper has
/// settled what the client actually receives.
#[skip_serializing_none]
#[derive(Serialize)]
struct LogLine {
    timestamp: String,
    req_id: String,

    req_method: String,
    uri: String,
    status_code: String,

    client_error_type: Option<String>,
    web_error_type: Option<String>,
    web_error_cause: Option<String>,
}

impl LogLine {
    fn new(
        req_id: Uuid,
        req_method: Method,
        uri: Uri,
        status_code: StatusCode,
        web_error: Option<&Error>,
        client_status_and_error: Option<(StatusCode, ClientError)>,
    ) -> Self {
        // When an error was mapped, the status the client sees comes from the
        // mapping, not from the original response.
        let status_code = client_status_and_error
            .as_ref()
            .map(|(status, _)| status.to_string())
            .unwrap_or(status_code.to_string());
        let client_error_type =
            client_status_and_error.map(|(_, cl_err)| cl_err.as_ref().to_string());

        LogLine {
            timestamp: chrono::Utc::now().to_rfc3339(),
            req_id: req_id.to_string(),
            req_method: req_method.to_string(),
            uri: uri.to_string(),
            status_code,
            client_error_type,
            web_error_type: web_error.map(|we| we.as_ref().to_string()),
            // The Debug impl renders the whole source chain.
            web_error_cause: web_error.map(|we| format!("{we:?}")),
        }
    }
}

pub async fn log_request(
    req_id: Uuid,
    req_method: Method,
    uri: Uri,
    status_code: StatusCode,
    web_error: Option<&Error>,
    client_status_and_error: Option<(StatusCode, ClientError)>,
) -> Result<()> {
    let logline = LogLine::new(
        req_id,
        req_method,
        uri,
        status_code,
        web_error,
        client_status_and_error,
    );

    // TODO: send logline
    debug!("LOGLINE: {}", json!(logline));

    Ok(())
}
