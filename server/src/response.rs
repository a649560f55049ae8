use serde::Serialize;

use kernel::FieldError;

pub use self::booking::*;

mod booking;

/// Body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl<T> Envelope<T> {
    pub fn success(message: Option<&str>, data: T) -> Self {
        Self {
            success: true,
            message: message.map(ToString::to_string),
            data: Some(data),
            errors: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            errors,
        }
    }
}
