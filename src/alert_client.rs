use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Slack incoming-webhook client used for operational signup alerts.
///
/// The whole webhook URL is the credential, so it stays wrapped in a
/// [`SecretString`] and is only exposed at the point of the request.
#[derive(Debug)]
pub struct AlertClient {
    pub http_client: Client,
    webhook_url: SecretString,
}

impl AlertClient {
    pub fn new(webhook_url: SecretString, timeout: std::time::Duration) -> Result<Self> {
        // Surface a malformed webhook URL at startup rather than on the first alert.
        reqwest::Url::parse(webhook_url.expose_secret())
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(AlertClient {
            http_client,
            webhook_url,
        })
    }

    pub async fn post_alert<S>(&self, text: S) -> Result<()>
    where
        S: AsRef<str>,
    {
        let url = reqwest::Url::parse(self.webhook_url.expose_secret())
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let message = AlertMessage {
            text: text.as_ref(),
        };

        let _resp = self
            .http_client
            .post(url)
            .json(&message)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[derive(Serialize)]
pub struct AlertMessage<'a> {
    pub text: &'a str,
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, derive_more::From)]
pub enum Error {
    UrlParsing(String),
    #[from]
    Reqwest(reqwest::Error),
}
// Error Boilerplate
impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
