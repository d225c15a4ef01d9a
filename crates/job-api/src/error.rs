//! HTTP error mapping.

use crate::response;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use job_handlers::{HandlerError, Rejection};
use job_media::MediaError;
use job_types::{RegistryError, TEXT_PLAIN};

const SERVER_ERROR: &str = "A server error occurred.  Please contact the administrator.\n";

/// Every failure a request can end in. Bodies are short `text/plain` messages.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed { allow: &'static str },
    #[error("not acceptable")]
    NotAcceptable,
    #[error("gone")]
    Gone,
    #[error("length required")]
    LengthRequired,
    #[error("unsupported media type")]
    UnsupportedMediaType,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("internal: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            ApiError::Gone => StatusCode::GONE,
            ApiError::LengthRequired => StatusCode::LENGTH_REQUIRED,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> String {
        match self {
            ApiError::BadRequest(msg) if msg.ends_with('\n') => msg.clone(),
            ApiError::BadRequest(msg) => format!("{}\n", msg),
            ApiError::NotFound => "Not found.\n".to_string(),
            ApiError::MethodNotAllowed { .. } => "Method not allowed.\n".to_string(),
            ApiError::NotAcceptable => "Not acceptable.\n".to_string(),
            ApiError::Gone => "Gone.\n".to_string(),
            ApiError::LengthRequired => "Length required.\n".to_string(),
            ApiError::UnsupportedMediaType => "Unsupported media type.\n".to_string(),
            ApiError::PayloadTooLarge => "Payload too large.\n".to_string(),
            ApiError::Internal(_) => SERVER_ERROR.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            tracing::error!(error = %cause, "request failed");
        }
        let mut res = response::bytes(self.status(), Some(TEXT_PLAIN), self.body().into_bytes());
        if let ApiError::MethodNotAllowed { allow } = self {
            res.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(allow));
        }
        res
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::BadRequest(_) => ApiError::BadRequest("Bad Accept header.\n".to_string()),
            MediaError::NotAcceptable => ApiError::NotAcceptable,
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        ApiError::Internal(format!("registry: {}", e))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Internal(format!("io: {}", e))
    }
}

impl From<HandlerError> for ApiError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Rejected(Rejection::UnsupportedMediaType) => {
                ApiError::UnsupportedMediaType
            }
            HandlerError::Rejected(Rejection::BadRequest(msg)) => ApiError::BadRequest(msg),
            HandlerError::NotFound => ApiError::NotFound,
            HandlerError::Media(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_errors_map_to_statuses() {
        let cases = [
            (
                HandlerError::Rejected(Rejection::UnsupportedMediaType),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                HandlerError::Rejected(Rejection::BadRequest("no".into())),
                StatusCode::BAD_REQUEST,
            ),
            (HandlerError::NotFound, StatusCode::NOT_FOUND),
            (
                HandlerError::Media(MediaError::NotAcceptable),
                StatusCode::NOT_ACCEPTABLE,
            ),
            (
                HandlerError::MissingArtifact("job_id".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let res = ApiError::Internal("disk on fire".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()[header::CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(
            res.headers()[header::CONTENT_LENGTH],
            SERVER_ERROR.len().to_string().as_str()
        );
    }

    #[test]
    fn method_not_allowed_lists_methods() {
        let res = ApiError::MethodNotAllowed { allow: "GET, DELETE" }.into_response();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "GET, DELETE");
    }
}
