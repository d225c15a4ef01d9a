//! Response builders. Every response carries an explicit `Content-Length`.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use job_types::Representation;

pub(crate) fn bytes(status: StatusCode, media_type: Option<&str>, body: Vec<u8>) -> Response {
    let length = body.len();
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = status;
    let headers = res.headers_mut();
    if let Some(media_type) = media_type {
        let value = HeaderValue::from_str(media_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    res
}

pub(crate) fn representation(rep: Representation) -> Response {
    bytes(StatusCode::OK, Some(&rep.media_type), rep.body)
}

pub(crate) fn created(location: &str) -> Response {
    let mut res = bytes(StatusCode::CREATED, None, Vec::new());
    if let Ok(value) = HeaderValue::from_str(location) {
        res.headers_mut().insert(header::LOCATION, value);
    }
    res
}

pub(crate) fn no_content() -> Response {
    bytes(StatusCode::NO_CONTENT, None, Vec::new())
}
