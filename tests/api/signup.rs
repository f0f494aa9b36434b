use std::collections::HashMap;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{any, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::TestApp;

#[tokio::test]
async fn submit_ok() -> Result<()> {
    let app = TestApp::spawn().await?;

    // Setup the mock servers
    Mock::given(path("/v3/mg.homefront.news/messages"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(path("/services/test-alert-hook"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.alert_server)
        .await;

    let res = app
        .submit_post(&json!({ "email": "jane.doe@example.com" }))
        .await?;

    assert_eq!(
        res.status(),
        StatusCode::OK,
        "Wrong response StatusCode: {}",
        res.status()
    );
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["message"], "Email submitted successfully!");

    let (email,): (String,) = sqlx::query_as("SELECT email FROM subscribers")
        .fetch_one(app.dm.db())
        .await?;
    assert_eq!(email, "jane.doe@example.com");

    Ok(())
}

#[tokio::test]
async fn submit_sends_welcome_email_with_team_copy() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/v3/mg.homefront.news/messages"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.alert_server)
        .await;

    app.submit_post(&json!({ "email": "jane.doe@example.com" }))
        .await?
        .error_for_status()?;

    let email_req = &app.email_server.received_requests().await.unwrap()[0];
    let fields: HashMap<String, String> = url::form_urlencoded::parse(&email_req.body)
        .into_owned()
        .collect();

    assert_eq!(fields.get("to").map(String::as_str), Some("jane.doe@example.com"));
    assert_eq!(
        fields.get("bcc").map(String::as_str),
        Some("team@homefront.news")
    );
    assert_eq!(
        fields.get("subject").map(String::as_str),
        Some("Thanks for joining Homefront!")
    );

    Ok(())
}

#[tokio::test]
async fn submit_posts_chat_alert_with_email() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;
    Mock::given(path("/services/test-alert-hook"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.alert_server)
        .await;

    app.submit_post(&json!({ "email": "jane.doe@example.com" }))
        .await?
        .error_for_status()?;

    let alert_req = &app.alert_server.received_requests().await.unwrap()[0];
    let alert_body: serde_json::Value = serde_json::from_slice(&alert_req.body)?;
    let text = alert_body["text"].as_str().unwrap();

    assert!(text.contains("New Signup"), "Alert text was: {text}");
    assert!(text.contains("jane.doe@example.com"), "Alert text was: {text}");

    Ok(())
}

#[tokio::test]
async fn submit_duplicate_email_rejected_with_409() -> Result<()> {
    let app = TestApp::spawn().await?;

    // Only the first submission may trigger the side effects.
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.alert_server)
        .await;

    let json_request = json!({ "email": "jane.doe@example.com" });

    let res = app.submit_post(&json_request).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.submit_post(&json_request).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "This email is already subscribed.");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscribers")
        .fetch_one(app.dm.db())
        .await?;
    assert_eq!(count, 1);

    Ok(())
}

#[tokio::test]
async fn submit_missing_email_rejected_with_400() -> Result<()> {
    let app = TestApp::spawn().await?;

    let tests = [
        (json!({}), "Empty json"),
        (json!({ "email": null }), "Null email"),
        (json!({ "email": "" }), "Empty email"),
    ];

    for (json_request, params) in tests {
        let res = app.submit_post(&json_request).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "Wrong response: ({}), Expected: ({}); for request with: {params}",
            res.status(),
            StatusCode::BAD_REQUEST
        );

        let body: serde_json::Value = res.json().await?;
        assert_eq!(body["error"], "Email is required");
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscribers")
        .fetch_one(app.dm.db())
        .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[tokio::test]
async fn submit_keeps_subscriber_when_welcome_email_fails() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;
    // The alert runs after the welcome email, so it never fires here.
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.alert_server)
        .await;

    let res = app
        .submit_post(&json!({ "email": "jane.doe@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "Submission failed.");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscribers")
        .fetch_one(app.dm.db())
        .await?;
    assert_eq!(count, 1, "The subscriber row should survive a failed send");

    Ok(())
}
