use crate::CodecError;

/// Result type for httprpc.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for httprpc calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be encoded. Nothing was sent.
    #[error("Encode failure: {0}")]
    Encode(#[source] CodecError),
    /// The response could not be decoded.
    #[error("Decode failure: {0}")]
    Decode(#[source] CodecError),
    /// The endpoint url could not be parsed.
    #[error("Invalid url: {0}")]
    InvalidUrl(#[source] reqwest::Error),
    /// The HTTP exchange itself failed.
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a status outside of 2xx.
    #[error("server returned non-200 status code {status}: {body}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Response body, trimmed of surrounding whitespace.
        body: String,
    },
    /// The response was for some other rpc.
    #[error("mismatched sequence number: sent {sent}, received {received}")]
    MismatchedSequence {
        /// Sequence number of the request.
        sent: u64,
        /// Sequence number found in the response header.
        received: u64,
    },
    /// The server reported an error for this rpc.
    #[error("{0}")]
    Server(String),
    /// The rpc was cancelled before it completed.
    #[error("Rpc was cancelled")]
    Cancelled,
}
