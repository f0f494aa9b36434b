use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, Method, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::web::{log, Error, REQUEST_ID_HEADER};

pub async fn response_mapper(req_method: Method, uri: Uri, resp: Response) -> Response {
    // Set by `SetRequestIdLayer`, copied onto the response by the propagation
    // layer before this mapper runs.
    let uuid = req_id_from_response(&resp).unwrap_or_else(|e| {
        tracing::error!("{:<12} - {e}", "RESP_MAPPER");
        Uuid::new_v4()
    });

    let web_error = resp.extensions().get::<Arc<Error>>().map(|er| er.as_ref());
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    let err_resp = client_status_and_error.as_ref().map(|(status, cl_err)| {
        let client_error_body = json!({
            "error": cl_err.to_string(),
        });

        (*status, Json(client_error_body)).into_response()
    });

    #[allow(clippy::redundant_pattern_matching)]
    if let Ok(_) = log::log_request(
        uuid,
        req_method,
        uri,
        resp.status(),
        web_error,
        client_status_and_error,
    )
    .await
    {}

    err_resp.unwrap_or(resp)
}

fn req_id_from_response(resp: &Response) -> crate::web::Result<Uuid> {
    let header = resp
        .headers()
        .get(REQUEST_ID_HEADER)
        .ok_or(Error::UuidNotInHeader)?;
    let header = header
        .to_str()
        .map_err(|e| Error::HeaderToStrFail(e.to_string()))?;
    let uuid = Uuid::try_parse(header).map_err(|e| Error::HeaderToStrFail(e.to_string()))?;

    Ok(uuid)
}

/// Redirects plain-HTTP traffic that arrived through a TLS-terminating proxy.
///
/// Only acts when the proxy actually set `x-forwarded-proto`, so local
/// development traffic passes straight through. 307 keeps the original method
/// on redirected form posts.
pub async fn https_redirect(req: Request, next: Next) -> Response {
    let proto = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok());

    if let Some(proto) = proto {
        if proto != "https" {
            let host = req
                .headers()
                .get(header::HOST)
                .and_then(|v| v.to_str().ok());

            if let Some(host) = host {
                let target = format!("https://{host}{}", req.uri());
                return Redirect::temporary(&target).into_response();
            }
        }
    }

    next.run(req).await
}
