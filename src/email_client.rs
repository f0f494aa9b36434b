use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::web::data::ValidEmail;

/// Mailgun messages-API client.
///
/// Messages are posted to `/v3/{domain}/messages` as a URL-encoded form,
/// authenticated with HTTP basic auth where the username is the literal
/// string `api` and the password is the account API key.
#[derive(Debug)]
pub struct EmailClient {
    pub http_client: Client,
    pub api_url: reqwest::Url,
    pub sender: ValidEmail,
    pub bcc: ValidEmail,
    domain: String,
    from: String,
    api_key: SecretString,
}

impl EmailClient {
    pub fn new<S: AsRef<str>>(
        api_url: S,
        domain: S,
        sender_name: S,
        sender: ValidEmail,
        bcc: ValidEmail,
        api_key: SecretString,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let api_url =
            reqwest::Url::parse(api_url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;

        let http_client = Client::builder().timeout(timeout).build()?;
        let from = format!("{} <{}>", sender_name.as_ref(), sender.as_ref());

        Ok(EmailClient {
            http_client,
            api_url,
            sender,
            bcc,
            domain: domain.as_ref().to_string(),
            from,
            api_key,
        })
    }

    /// The `bcc` field is only added to the form when given, Mailgun rejects
    /// empty recipient fields.
    pub async fn send_email<S>(
        &self,
        recipient: &str,
        subject: S,
        html_content: S,
        text_content: S,
        bcc: Option<&str>,
    ) -> Result<()>
    where
        S: AsRef<str>,
    {
        let url = self
            .api_url
            .join(&format!("v3/{}/messages", self.domain))
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let message = MailgunMessage {
            from: &self.from,
            to: recipient,
            bcc,
            subject: subject.as_ref(),
            html: html_content.as_ref(),
            text: text_content.as_ref(),
        };

        let _resp = self
            .http_client
            .post(url)
            .basic_auth("api", Some(self.api_key.expose_secret()))
            .form(&message)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[derive(Serialize)]
pub struct MailgunMessage<'a> {
    pub from: &'a str,
    pub to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<&'a str>,
    pub subject: &'a str,
    pub html: &'a str,
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
