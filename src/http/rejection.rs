use std::convert::Infallible;

use serde::Serialize;
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        self, InvalidHeader, InvalidQuery, LengthRequired, MethodNotAllowed, MissingHeader,
        PayloadTooLarge, Rejection, UnsupportedMediaType,
    },
    reply::{self, Reply},
};

use crate::{error::ActionError, middleware::Unauthorized};

pub trait OrReject<T> {
    fn or_reject(self) -> Result<T, Rejection>;
}

impl<T> OrReject<T> for Result<T, ActionError> {
    fn or_reject(self) -> Result<T, Rejection> {
        self.map_err(reject::custom)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    errors: String,
}

fn status_and_message(err: &Rejection) -> (StatusCode, String) {
    if let Some(e) = err.find::<ActionError>() {
        let status = e.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("Action failed: {e}");
            return (status, "Internal server error".to_string());
        }
        return (status, e.to_string());
    }

    if err.find::<Unauthorized>().is_some() || err.find::<MissingHeader>().is_some() {
        return (
            StatusCode::UNAUTHORIZED,
            "Authentication credentials were not provided or are invalid".to_string(),
        );
    }

    if let Some(e) = err.find::<BodyDeserializeError>() {
        return (StatusCode::BAD_REQUEST, e.to_string());
    }
    if let Some(e) = err.find::<InvalidQuery>() {
        return (StatusCode::BAD_REQUEST, e.to_string());
    }
    if let Some(e) = err.find::<InvalidHeader>() {
        return (StatusCode::BAD_REQUEST, e.to_string());
    }
    if err.find::<PayloadTooLarge>().is_some() {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body is too large".to_string(),
        );
    }
    if err.find::<UnsupportedMediaType>().is_some() {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Request body must be JSON".to_string(),
        );
    }
    if err.find::<LengthRequired>().is_some() {
        return (
            StatusCode::LENGTH_REQUIRED,
            "Content-Length header is required".to_string(),
        );
    }

    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, "Not found".to_string());
    }

    if err.find::<MethodNotAllowed>().is_some() {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        );
    }

    log::error!("Unhandled rejection: {err:?}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Renders every rejection as `{"errors": "<message>"}`. Store and cache
/// failures are logged and reported without their details.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, errors) = status_and_message(&err);

    Ok(reply::with_status(
        reply::json(&ErrorBody { errors }),
        status,
    ))
}
