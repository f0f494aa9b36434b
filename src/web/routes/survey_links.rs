use axum::{extract::State, Json};
use chrono::Utc;
use sqlx::PgPool;
use tera::Context;
use tracing::info;

use crate::{
    web::{
        data::{ApiMessage, DeserEmailBatch, DeserSignup, GeneratedLink, GeneratedLinks, SurveyToken},
        Error, Result,
    },
    AppState,
};

const SURVEY_SUBJECT: &str = "We'd love your feedback on Homefront";

/// Issues a fresh token per email and returns the ready-to-send links.
///
/// Issuance is sequential and aborts on the first store error, links already
/// issued by then stay valid in the database but are not returned.
#[tracing::instrument(name = "Generating survey links", skip(app_state, batch))]
pub async fn survey_links_generate(
    State(app_state): State<AppState>,
    Json(batch): Json<DeserEmailBatch>,
) -> Result<Json<GeneratedLinks>> {
    let db = app_state.database_mgr.db();
    let mut generated_links = Vec::with_capacity(batch.emails.len());

    for email in batch.emails {
        let token = issue_survey_token(db, &email).await?;
        let survey_link = build_survey_link(&app_state.base_url, &token);
        generated_links.push(GeneratedLink { email, survey_link });
    }

    info!("SUCCESS: {} links", generated_links.len());
    Ok(Json(GeneratedLinks { generated_links }))
}

#[tracing::instrument(name = "Sending survey email", skip(app_state, req))]
pub async fn survey_email_send(
    State(app_state): State<AppState>,
    Json(req): Json<DeserSignup>,
) -> Result<Json<ApiMessage>> {
    let email = req
        .email
        .filter(|email| !email.is_empty())
        .ok_or(Error::EmailNotProvided)?;

    let token = issue_survey_token(app_state.database_mgr.db(), &email).await?;
    let survey_link = build_survey_link(&app_state.base_url, &token);

    send_survey_email(&app_state, &email, &survey_link).await?;

    info!("SUCCESS");
    Ok(Json(ApiMessage {
        message: "Survey email sent successfully!",
    }))
}

/// Inserts a fresh one-time token for the given email. Multiple live tokens
/// per email are allowed, each is redeemable independently.
async fn issue_survey_token(db: &PgPool, email: &str) -> Result<SurveyToken> {
    let token = SurveyToken::generate();

    sqlx::query(
        r#"
        INSERT INTO survey_tokens (token, email, completed, created_at)
        VALUES ($1, $2, FALSE, $3)
    "#,
    )
    .bind(*token)
    .bind(email)
    .bind(Utc::now())
    .execute(db)
    .await?;

    Ok(token)
}

#[tracing::instrument(name = "Sending survey invitation", skip(app_state, survey_link))]
async fn send_survey_email(app_state: &AppState, recipient: &str, survey_link: &str) -> Result<()> {
    let email_client = &app_state.email_client;

    let mut ctx = Context::new();
    ctx.insert("survey_link", survey_link);

    let html_email = app_state
        .templ_mgr
        .render_email_to_string(&ctx, "survey_email.html")?;
    let plain_email = app_state
        .templ_mgr
        .render_email_to_string(&ctx, "survey_email.txt")?;

    email_client
        .send_email(recipient, SURVEY_SUBJECT, &html_email, &plain_email, None)
        .await?;

    info!("SUCCESS");
    Ok(())
}

// ###################################
// ->   HELPERS
// ###################################

fn build_survey_link(base_url: &str, token: &SurveyToken) -> String {
    format!("{base_url}/survey.html?token={token}")
}
