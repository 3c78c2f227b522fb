use http::HeaderValue;

/// What to do with a request whose `Accept` header is not the server's media type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcceptPolicy {
    /// Reject with 415 Unsupported Media Type.
    #[default]
    UnsupportedMediaType,
    /// Reject with 400 Bad Request.
    BadRequest,
    /// Serve the request anyway.
    Ignore,
}

/// Configuration for an httprpc server.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub(crate) media_type: Option<HeaderValue>,
    pub(crate) accept_policy: AcceptPolicy,
    pub(crate) max_body_length: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            media_type: None,
            accept_policy: AcceptPolicy::default(),
            max_body_length: 4 << 20,
        }
    }
}

impl Configuration {
    /// Requests must carry this `Content-Type` (parameters like `charset` are ignored)
    /// and `Accept`. Responses are sent with it as their `Content-Type`.
    ///
    /// Default: no content negotiation
    pub fn media_type(&mut self, media_type: HeaderValue) {
        self.media_type = Some(media_type);
    }

    /// How to treat a missing or different `Accept` header. Only applies when a media
    /// type is configured.
    ///
    /// Default: `AcceptPolicy::UnsupportedMediaType`
    pub fn accept_policy(&mut self, accept_policy: AcceptPolicy) {
        self.accept_policy = accept_policy;
    }

    /// Max request body length. Larger requests are rejected with 413.
    ///
    /// Default: 4MiB
    pub fn max_body_length(&mut self, max_body_length: usize) {
        self.max_body_length = max_body_length;
    }
}
