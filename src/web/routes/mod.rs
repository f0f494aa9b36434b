//! Contains all the routes that this application can handle.

mod home;
mod signup;
mod survey;
mod survey_links;

use crate::AppState;
use home::home;
use signup::signup;
use survey::{survey_page, survey_submit};
use survey_links::{survey_email_send, survey_links_generate};

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
///
/// The survey page is reachable both as "/survey" and "/survey.html" so that
/// the generated links keep working for readers who saved the old static path.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/submit", post(signup))
        .route("/survey", get(survey_page))
        .route("/survey.html", get(survey_page))
        .route("/submit-survey", post(survey_submit))
        .route("/generate-survey-links", post(survey_links_generate))
        .route("/send-survey-email", post(survey_email_send))
        .with_state(app_state)
        .route("/health-check", get(health_check))
}
