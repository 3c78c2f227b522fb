use axum::response::{IntoResponse, Response};
use http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderMap, Method, StatusCode,
};

use super::{AcceptPolicy, Configuration};

/// Why a request was turned away before reaching the dispatch runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Only POST is served.
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    /// `Content-Type` or `Accept` did not match the server's media type.
    #[error("Unsupported Media Type")]
    UnsupportedMediaType,
    /// `Accept` did not match, under `AcceptPolicy::BadRequest`.
    #[error("Bad Request")]
    BadRequest,
}

impl Rejection {
    /// The HTTP status this rejection is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::BadRequest => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status(), format!("{self}\n")).into_response()
    }
}

/// Check that a request may be dispatched.
pub fn validate(
    method: &Method,
    headers: &HeaderMap,
    configuration: &Configuration,
) -> Result<(), Rejection> {
    if *method != Method::POST {
        return Err(Rejection::MethodNotAllowed);
    }
    let Some(media_type) = &configuration.media_type else {
        return Ok(());
    };

    let content_type_matches = headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .map(|content_type| content_type.split(';').next().unwrap_or_default().trim())
        .is_some_and(|essence| {
            essence
                .as_bytes()
                .eq_ignore_ascii_case(media_type.as_bytes())
        });
    if !content_type_matches {
        return Err(Rejection::UnsupportedMediaType);
    }

    let accept_matches = headers
        .get(ACCEPT)
        .is_some_and(|accept| accept.as_bytes() == media_type.as_bytes());
    match (accept_matches, configuration.accept_policy) {
        (true, _) | (false, AcceptPolicy::Ignore) => Ok(()),
        (false, AcceptPolicy::UnsupportedMediaType) => Err(Rejection::UnsupportedMediaType),
        (false, AcceptPolicy::BadRequest) => Err(Rejection::BadRequest),
    }
}
