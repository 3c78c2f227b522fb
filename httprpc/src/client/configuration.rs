use std::sync::{atomic::AtomicU64, Arc};

use http::HeaderValue;

/// Called on each outgoing HTTP request immediately before it is sent.
///
/// Use this for headers like authorization. The request body is attached after the
/// hook runs, so the hook cannot change it.
pub type RequestHook = Arc<dyn Fn(&mut reqwest::Request) + Send + Sync>;

/// Configuration for an httprpc client.
#[derive(Clone, Default)]
pub struct Configuration {
    pub(crate) media_type: Option<HeaderValue>,
    pub(crate) http_client: Option<reqwest::Client>,
    pub(crate) sequence_counter: Option<Arc<AtomicU64>>,
    pub(crate) request_hook: Option<RequestHook>,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("media_type", &self.media_type)
            .field("http_client", &self.http_client)
            .field("sequence_counter", &self.sequence_counter)
            .field("request_hook", &self.request_hook.is_some())
            .finish()
    }
}

impl Configuration {
    /// Sent as both `Content-Type` and `Accept` on every request. Protocol fronts pin this
    /// to their codec's media type.
    ///
    /// Default: no content headers
    pub fn media_type(&mut self, media_type: HeaderValue) {
        self.media_type = Some(media_type);
    }

    /// The HTTP client used for every call. Configure timeouts and TLS here; httprpc
    /// does not time out calls on its own.
    ///
    /// Default: a new `reqwest::Client`
    pub fn http_client(&mut self, http_client: reqwest::Client) {
        self.http_client = Some(http_client);
    }

    /// The counter sequence numbers are drawn from. Every call increments it once.
    /// Clients sharing a counter never reuse each other's sequence numbers.
    ///
    /// Default: a new counter per client, starting at 0
    pub fn sequence_counter(&mut self, sequence_counter: Arc<AtomicU64>) {
        self.sequence_counter = Some(sequence_counter);
    }

    /// Customize each outgoing request, e.g. to add authorization headers.
    ///
    /// Default: none
    pub fn request_hook(
        &mut self,
        request_hook: impl Fn(&mut reqwest::Request) + Send + Sync + 'static,
    ) {
        self.request_hook = Some(Arc::new(request_hook));
    }
}
