use std::io::{Read, Write};

use httprpc::{ClientCodec, CodecError, RequestHeader, ResponseHeader};
use serde::{de::DeserializeOwned, Serialize};

use crate::decode_error;

/// The client half of the messagepack encoding.
///
/// A request is a `RequestHeader` map followed by the arguments. A response is a
/// `ResponseHeader` map followed by the reply, or `nil` when the header carries an
/// error.
#[derive(Debug)]
pub struct MessagePackClientCodec<S> {
    stream: S,
}

impl<S> ClientCodec<S> for MessagePackClientCodec<S>
where
    S: Read + Write + Send,
{
    fn new(stream: S) -> Self {
        Self { stream }
    }

    fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    fn write_request<A>(&mut self, header: &RequestHeader, args: &A) -> Result<(), CodecError>
    where
        A: Serialize,
    {
        rmp_serde::encode::write_named(&mut self.stream, header).map_err(CodecError::invalid)?;
        rmp_serde::encode::write_named(&mut self.stream, args).map_err(CodecError::invalid)
    }

    fn read_response_header(&mut self) -> Result<ResponseHeader, CodecError> {
        rmp_serde::decode::from_read(&mut self.stream).map_err(decode_error)
    }

    fn read_response_body<R>(&mut self) -> Result<R, CodecError>
    where
        R: DeserializeOwned,
    {
        rmp_serde::decode::from_read(&mut self.stream).map_err(decode_error)
    }
}
