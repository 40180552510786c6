use actix_web::{error, http::StatusCode, HttpResponse, HttpResponseBuilder};
use derive_more::{Display, Error};

/// Request rejection raised by the security layer.
///
/// Responses carry no body, so nothing about the rejection reason leaks to
/// the caller.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[display("unauthorized")]
    Unauthorized,
    #[display("forbidden")]
    Forbidden,
}

impl error::ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match *self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponseBuilder::new(self.status_code()).finish()
    }
}
