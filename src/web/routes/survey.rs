use anyhow::Context as _;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use chrono::Utc;
use sqlx::{Executor, Row};
use tracing::info;

use crate::{
    web::{
        data::{ApiMessage, DeserSurveyForm, SurveyToken, SurveyTokenQuery},
        Error, Result,
    },
    AppState,
};

/// Serves the survey form, gated behind a redeemable token.
///
/// The page itself carries no subscriber data, the token in the query string
/// is the only link back to an email address.
#[tracing::instrument(name = "Serving survey page", skip(app_state, query))]
pub async fn survey_page(
    State(app_state): State<AppState>,
    Query(query): Query<SurveyTokenQuery>,
) -> Result<Html<String>> {
    let token = parse_token(query.token)?;

    let redeemable: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM survey_tokens WHERE token = $1 AND completed = FALSE)",
    )
    .bind(*token)
    .fetch_one(app_state.database_mgr.db())
    .await?;

    if !redeemable {
        return Err(Error::SurveyTokenNotRedeemable);
    }

    let body = app_state
        .templ_mgr
        .render_html_to_string("survey.html")
        .context("tera failed to render 'html/survey.html' template")?;

    Ok(Html(body))
}

#[tracing::instrument(name = "Recording survey submission", skip(app_state, query, form))]
pub async fn survey_submit(
    State(app_state): State<AppState>,
    Query(query): Query<SurveyTokenQuery>,
    Json(form): Json<DeserSurveyForm>,
) -> Result<Json<ApiMessage>> {
    let token = parse_token(query.token)?;

    // BEGIN sql transaction
    let mut transaction = app_state.database_mgr.db().begin().await?;

    // The `completed = FALSE` condition is the authoritative one-time guard:
    // of two concurrent submissions only one can match the row.
    let query = sqlx::query(
        r#"
        UPDATE survey_tokens
        SET completed = TRUE,
            feedback = $2,
            improvements = $3,
            frequency = $4,
            submitted_at = $5
        WHERE token = $1 AND completed = FALSE
        RETURNING email
    "#,
    )
    .bind(*token)
    .bind(form.feedback.as_deref())
    .bind(form.improvements.as_deref())
    .bind(form.frequency.as_deref())
    .bind(Utc::now());

    let Some(row) = transaction.fetch_optional(query).await? else {
        transaction.rollback().await?;
        return Err(Error::SurveyTokenNotRedeemable);
    };
    let email: String = row.try_get("email")?;

    update_subscriber_profile(&mut transaction, &email, &form).await?;
    transaction.commit().await?;
    // END sql transaction

    info!("SUCCESS");
    Ok(Json(ApiMessage {
        message: "Survey submitted successfully!",
    }))
}

/// Writes the profile fields onto the subscriber row matched by the token's
/// email. A full overwrite: fields left blank in the form blank the columns.
/// Zero matched rows is fine, a token can outlive its subscriber row.
async fn update_subscriber_profile(
    transaction: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    email: &str,
    form: &DeserSurveyForm,
) -> Result<()> {
    let query = sqlx::query(
        r#"
        UPDATE subscribers
        SET first_name = $2,
            last_name = $3,
            company = $4,
            occupation = $5,
            city = $6,
            state = $7
        WHERE email = $1
    "#,
    )
    .bind(email)
    .bind(form.first_name.as_deref())
    .bind(form.last_name.as_deref())
    .bind(form.company.as_deref())
    .bind(form.occupation.as_deref())
    .bind(form.city.as_deref())
    .bind(form.state.as_deref());

    transaction.execute(query).await?;

    Ok(())
}

// ###################################
// ->   HELPERS
// ###################################

/// A missing token is a 400, a token that doesn't parse as a UUID can never
/// have been issued so it gets the same rejection as an unknown one.
fn parse_token(token: Option<String>) -> Result<SurveyToken> {
    let token = token
        .filter(|token| !token.is_empty())
        .ok_or(Error::SurveyTokenNotProvided)?;

    SurveyToken::parse(token).map_err(|_| Error::SurveyTokenNotRedeemable)
}
