use std::collections::HashMap;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{any, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{token_from_link, TestApp};

#[tokio::test]
async fn generate_survey_links_ok() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app
        .generate_survey_links_post(&json!({
            "emails": ["jane.doe@example.com", "john.doe@example.com"]
        }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await?;
    let links = body["generatedLinks"].as_array().unwrap();
    assert_eq!(links.len(), 2);

    let mut tokens = Vec::new();
    for (link, email) in links
        .iter()
        .zip(["jane.doe@example.com", "john.doe@example.com"])
    {
        assert_eq!(link["email"], email);

        let survey_link = link["surveyLink"].as_str().unwrap();
        assert!(
            survey_link.starts_with(&format!("http://{}/survey.html?token=", app.addr)),
            "Unexpected link shape: {survey_link}"
        );
        tokens.push(token_from_link(&reqwest::Url::parse(survey_link)?)?);
    }
    assert_ne!(tokens[0], tokens[1], "Each link must get its own token");

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM survey_tokens WHERE completed = FALSE")
            .fetch_one(app.dm.db())
            .await?;
    assert_eq!(count, 2);

    Ok(())
}

#[tokio::test]
async fn generate_survey_links_empty_batch_ok() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app
        .generate_survey_links_post(&json!({ "emails": [] }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["generatedLinks"].as_array().unwrap().len(), 0);

    Ok(())
}

#[tokio::test]
async fn generate_survey_links_missing_field_unprocessable_entity() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.generate_survey_links_post(&json!({})).await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn send_survey_email_ok() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/v3/mg.homefront.news/messages"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let res = app
        .send_survey_email_post(&json!({ "email": "jane.doe@example.com" }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["message"], "Survey email sent successfully!");

    let email_req = &app.email_server.received_requests().await.unwrap()[0];
    let fields: HashMap<String, String> = url::form_urlencoded::parse(&email_req.body)
        .into_owned()
        .collect();
    assert_eq!(
        fields.get("to").map(String::as_str),
        Some("jane.doe@example.com")
    );
    assert_eq!(
        fields.get("subject").map(String::as_str),
        Some("We'd love your feedback on Homefront")
    );
    assert!(
        fields.get("bcc").is_none(),
        "Survey invitations should not carry the team copy"
    );

    // Both bodies carry the same link, and the link actually serves the page.
    let survey_link = app.survey_link_get(email_req)?;
    assert_eq!(survey_link.html, survey_link.plain_text);

    let page = app.http_client.get(survey_link.html).send().await?;
    assert_eq!(page.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn send_survey_email_missing_email_rejected_with_400() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let res = app.send_survey_email_post(&json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "Email is required");

    Ok(())
}

#[tokio::test]
async fn send_survey_email_delivery_failure_returns_500() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let res = app
        .send_survey_email_post(&json!({ "email": "jane.doe@example.com" }))
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "Submission failed.");

    // The token was already issued when the send failed, it stays usable.
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM survey_tokens WHERE completed = FALSE")
            .fetch_one(app.dm.db())
            .await?;
    assert_eq!(count, 1);

    Ok(())
}
