//! Request/response payloads of the `web` module and the validated types
//! they parse into, with their parsing implementations and tests.

use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;
use validator::ValidateEmail;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable signup request.
/// The email is optional on the wire; presence is checked by the handler so
/// a missing field maps to the documented 400 instead of an extractor reject.
#[derive(Deserialize, Debug)]
pub struct DeserSignup {
    pub email: Option<String>,
}

/// Query string carrying the one-time survey token.
#[derive(Deserialize, Debug)]
pub struct SurveyTokenQuery {
    pub token: Option<String>,
}

/// Deserializable survey submission.
/// Every field is optional; whatever arrives overwrites the subscriber's
/// profile columns wholesale on a successful submit.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeserSurveyForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub occupation: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub feedback: Option<String>,
    pub improvements: Option<String>,
    pub frequency: Option<String>,
}

/// Deserializable batch of addresses to issue survey links for.
#[derive(Deserialize, Debug)]
pub struct DeserEmailBatch {
    pub emails: Vec<String>,
}

/// Uniform `{"message": ...}` success body.
#[derive(Serialize, Debug)]
pub struct ApiMessage {
    pub message: &'static str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLink {
    pub email: String,
    pub survey_link: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLinks {
    pub generated_links: Vec<GeneratedLink>,
}

/// Validated Email
#[derive(Debug, Clone, Display)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if value.graphemes(true).count() > 256 {
            return Err(DataParsingError::EmailTooLong);
        }

        if value.validate_email() {
            Ok(ValidEmail(value.to_owned()))
        } else {
            Err(DataParsingError::EmailInvalid)
        }
    }
}

/// A one-time survey credential: an opaque UUID v4 issued per email.
/// Redeemable until the first successful feedback submission.
#[derive(Debug, Clone, Copy, Deref, Display)]
pub struct SurveyToken(Uuid);

impl SurveyToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        let uuid = Uuid::parse_str(value)
            .map_err(|_| DataParsingError::SurveyTokenInvalid(value.to_string()))?;

        Ok(Self(uuid))
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, Serialize)]
pub enum DataParsingError {
    EmailInvalid,
    EmailTooLong,
    SurveyTokenInvalid(String),
}
// Error Boilerplate
impl core::fmt::Display for DataParsingError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for DataParsingError {}
