use axum::{extract::State, Json};
use chrono::Utc;
use sqlx::PgPool;
use tera::Context;
use tracing::info;
use uuid::Uuid;

use crate::{
    web::{
        data::{ApiMessage, DeserSignup},
        Error, Result,
    },
    AppState,
};

const WELCOME_SUBJECT: &str = "Thanks for joining Homefront!";

// TODO: reject malformed addresses before they reach Mailgun
#[tracing::instrument(name = "Recording new signup", skip(app_state, signup))]
pub async fn signup(
    State(app_state): State<AppState>,
    Json(signup): Json<DeserSignup>,
) -> Result<Json<ApiMessage>> {
    let email = signup
        .email
        .filter(|email| !email.is_empty())
        .ok_or(Error::EmailNotProvided)?;

    let db = app_state.database_mgr.db();

    // Fast path: a known duplicate never reaches the insert, so no second
    // welcome email or alert can go out for it.
    let already_subscribed: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM subscribers WHERE email = $1)")
            .bind(&email)
            .fetch_one(db)
            .await?;
    if already_subscribed {
        return Err(Error::EmailAlreadySubscribed);
    }

    insert_subscriber(db, &email).await?;

    // The row stays persisted even if one of these sends fails.
    send_welcome_email(&app_state, &email).await?;
    post_signup_alert(&app_state, &email).await?;

    info!("SUCCESS");
    Ok(Json(ApiMessage {
        message: "Email submitted successfully!",
    }))
}

/// Tries to insert a new subscriber row with only the email populated.
/// The unique constraint on `email` is the authoritative duplicate guard,
/// the lookup in the handler only exists to skip the side effects early.
async fn insert_subscriber(db: &PgPool, email: &str) -> Result<()> {
    let query_result = sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, subscribed_at)
        VALUES ($1, $2, $3)
    "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(Utc::now())
    .execute(db)
    .await;

    if let Err(error) = query_result {
        if is_unique_violation(&error) {
            return Err(Error::EmailAlreadySubscribed);
        }
        return Err(error.into());
    }

    Ok(())
}

#[tracing::instrument(name = "Sending welcome email", skip(app_state))]
async fn send_welcome_email(app_state: &AppState, recipient: &str) -> Result<()> {
    let email_client = &app_state.email_client;

    let mut ctx = Context::new();
    ctx.insert("base_url", &app_state.base_url);

    let html_email = app_state
        .templ_mgr
        .render_email_to_string(&ctx, "welcome_email.html")?;
    let plain_email = app_state
        .templ_mgr
        .render_email_to_string(&ctx, "welcome_email.txt")?;

    let bcc = email_client.bcc.to_string();
    email_client
        .send_email(recipient, WELCOME_SUBJECT, &html_email, &plain_email, Some(&bcc))
        .await?;

    info!("SUCCESS");
    Ok(())
}

#[tracing::instrument(name = "Posting signup alert", skip(app_state))]
async fn post_signup_alert(app_state: &AppState, email: &str) -> Result<()> {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let text = format!("🎉 *New Signup* | 📧 {email} | ⏰ {timestamp}");

    app_state.alert_client.post_alert(text).await?;

    Ok(())
}

// ###################################
// ->   HELPERS
// ###################################

/// `23505` is the Postgres unique-constraint violation code.
fn is_unique_violation(error: &sqlx::Error) -> bool {
    use sqlx::postgres::PgDatabaseError;

    if let sqlx::Error::Database(er) = error {
        er.try_downcast_ref::<PgDatabaseError>()
            .is_some_and(|er| er.code() == "23505")
    } else {
        false
    }
}
