use serde::{de::DeserializeOwned, Serialize};

use crate::{RequestHeader, ResponseHeader};

/// Errors that can occur while encoding or decoding rpc messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The underlying stream failed. For a `DuplexBuffer` this includes phase violations.
    #[error("IO failure: {0}")]
    IoFailure(#[from] std::io::Error),
    /// The bytes were not a valid message for this codec.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    /// The stream ended before a complete message was read.
    #[error("Unexpected end of stream")]
    EndOfStream,
}

impl CodecError {
    /// Wrap a codec-specific failure.
    pub fn invalid(error: impl std::fmt::Display) -> Self {
        Self::InvalidMessage(error.to_string())
    }
}

/// The client half of an rpc encoding.
///
/// Client codecs are written as if for a persistent stream: a request is written,
/// then a response is read. httprpc drives one of these per call over a
/// `DuplexBuffer`, so exactly one request is written and one response is read.
///
/// ## Call lifecycle
/// ### 1 write_request
/// The header and arguments are written to the stream together.
/// ### 2 read_response_header
/// The response header is read. If it carries an error or an unexpected sequence
/// number, the body is never read.
/// ### 3 read_response_body
/// The reply is decoded.
pub trait ClientCodec<S>: Send {
    /// Wrap a stream.
    fn new(stream: S) -> Self;

    /// Access the stream, e.g. to attach a response to it.
    fn get_mut(&mut self) -> &mut S;

    /// Write a request header and its arguments.
    fn write_request<A>(&mut self, header: &RequestHeader, args: &A) -> Result<(), CodecError>
    where
        A: Serialize;

    /// Read the header of the next response.
    fn read_response_header(&mut self) -> Result<ResponseHeader, CodecError>;

    /// Read the body of the response whose header was just read.
    fn read_response_body<R>(&mut self) -> Result<R, CodecError>
    where
        R: DeserializeOwned;
}

/// The server half of an rpc encoding.
///
/// The dispatch runtime reads a request header, finds the method, reads or
/// discards the arguments, and writes exactly one response.
pub trait ServerCodec<S>: Send + Sized {
    /// Wrap a stream.
    fn new(stream: S) -> Self;

    /// Unwrap the stream, e.g. to collect what was written to it.
    fn into_inner(self) -> S;

    /// Read the header of the next request.
    fn read_request_header(&mut self) -> Result<RequestHeader, CodecError>;

    /// Read the arguments of the request whose header was just read.
    fn read_request_body<A>(&mut self) -> Result<A, CodecError>
    where
        A: DeserializeOwned;

    /// Skip the arguments of the request whose header was just read.
    fn discard_request_body(&mut self) -> Result<(), CodecError>;

    /// Write a response. `body` is `None` when the header carries an error.
    fn write_response<R>(
        &mut self,
        header: &ResponseHeader,
        body: Option<&R>,
    ) -> Result<(), CodecError>
    where
        R: Serialize;
}
