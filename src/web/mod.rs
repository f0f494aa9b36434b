mod error;

pub mod data;
pub mod log;
pub mod midware;
pub mod routes;
pub mod serve;

pub use error::{ClientError, Error, Result};
pub use serve::serve;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
