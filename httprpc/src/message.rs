/// Header of an rpc request.
///
/// The sequence number is used to relate requests to responses. A response has the
/// same sequence number as the request that generated it.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RequestHeader {
    /// Name of the method, like `Service.Method`.
    pub method: String,
    /// Per-call correlation id, assigned by the client.
    pub sequence: u64,
}

/// Header of an rpc response.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResponseHeader {
    /// Echo of the request's sequence number.
    pub sequence: u64,
    /// Empty on success. Otherwise the server's error message; there is no body.
    pub error: String,
}

impl ResponseHeader {
    /// A successful response header for `sequence`.
    pub fn ok(sequence: u64) -> Self {
        Self {
            sequence,
            error: String::new(),
        }
    }

    /// A failed response header for `sequence`.
    pub fn error(sequence: u64, error: impl Into<String>) -> Self {
        Self {
            sequence,
            error: error.into(),
        }
    }

    /// True when the server reported an error for this rpc.
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}
