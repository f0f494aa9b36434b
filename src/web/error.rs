use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use strum_macros::AsRefStr;

use crate::utils;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("request id was not in the response header: 'x-request-id'")]
    UuidNotInHeader,
    #[error("failed to convert header to string: {0}")]
    HeaderToStrFail(String),

    #[error("email was not provided in the request body")]
    EmailNotProvided,
    #[error("email is already subscribed")]
    EmailAlreadySubscribed,
    #[error("survey token was not provided in the query string")]
    SurveyTokenNotProvided,
    #[error("survey token was not found or was already redeemed")]
    SurveyTokenNotRedeemable,

    #[error("email client error: {0}")]
    EmailClient(#[from] crate::email_client::Error),
    #[error("alert client error: {0}")]
    AlertClient(#[from] crate::alert_client::Error),

    #[error("error awaiting a tokio task: {0}")]
    TokioJoin(#[from] tokio::task::JoinError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("templating error: {0}")]
    Tera(#[from] tera::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::EmailNotProvided => (StatusCode::BAD_REQUEST, EmailRequired),
            Error::EmailAlreadySubscribed => (StatusCode::CONFLICT, AlreadySubscribed),
            Error::SurveyTokenNotProvided => (StatusCode::BAD_REQUEST, TokenRequired),
            Error::SurveyTokenNotRedeemable => (StatusCode::FORBIDDEN, TokenRejected),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        utils::error_chain_fmt(self, f)
    }
}

/// What the caller gets to see.
///
/// The `Display` strings double as the literal `error` field of the JSON
/// response body, so they are part of the public API contract.
#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Email is required")]
    EmailRequired,
    #[display("This email is already subscribed.")]
    AlreadySubscribed,
    #[display("Survey token is required")]
    TokenRequired,
    #[display("This survey link is invalid or has already been used.")]
    TokenRejected,
    #[display("Submission failed.")]
    ServiceError,
}
