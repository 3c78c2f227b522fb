use crate::{CodecError, DuplexBuffer, ServerCodec};

/// Why a dispatch runtime could not answer a request at all.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The request header could not be decoded. The client sent something unusable.
    #[error("could not decode request: {0}")]
    Request(#[source] CodecError),
    /// Not even an error response could be encoded.
    #[error("could not encode response: {0}")]
    Response(#[source] CodecError),
}

/// A dispatch runtime serves rpc exchanges over a codec.
///
/// The HTTP server hands you a codec wrapping one request body and an empty response
/// buffer. You read the request, run the method, and write exactly one response. This
/// is called on a blocking thread, so it is fine to block in here.
///
/// Method-level failures (an unknown method, bad arguments, a failed handler, a reply
/// that cannot be encoded) are data: write them into the response header's error and
/// return `Ok`. Return `Err` only when no response could be written at all. A
/// `ServeError::Request` is answered with 400, a `ServeError::Response` with 500.
pub trait ServeCodec: Send + Sync + 'static {
    /// The message encoding this runtime speaks.
    type Codec: ServerCodec<DuplexBuffer>;

    /// Serve one request/response exchange to completion.
    fn serve_codec(&self, codec: &mut Self::Codec) -> Result<(), ServeError>;
}
