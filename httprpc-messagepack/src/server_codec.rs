use std::io::{Read, Write};

use httprpc::{CodecError, RequestHeader, ResponseHeader, ServerCodec};
use serde::{de::DeserializeOwned, de::IgnoredAny, Serialize};

use crate::decode_error;

/// The server half of the messagepack encoding.
#[derive(Debug)]
pub struct MessagePackServerCodec<S> {
    stream: S,
}

impl<S> ServerCodec<S> for MessagePackServerCodec<S>
where
    S: Read + Write + Send,
{
    fn new(stream: S) -> Self {
        Self { stream }
    }

    fn into_inner(self) -> S {
        self.stream
    }

    fn read_request_header(&mut self) -> Result<RequestHeader, CodecError> {
        rmp_serde::decode::from_read(&mut self.stream).map_err(decode_error)
    }

    fn read_request_body<A>(&mut self) -> Result<A, CodecError>
    where
        A: DeserializeOwned,
    {
        rmp_serde::decode::from_read(&mut self.stream).map_err(decode_error)
    }

    fn discard_request_body(&mut self) -> Result<(), CodecError> {
        rmp_serde::decode::from_read::<_, IgnoredAny>(&mut self.stream)
            .map(|_| ())
            .map_err(decode_error)
    }

    fn write_response<R>(
        &mut self,
        header: &ResponseHeader,
        body: Option<&R>,
    ) -> Result<(), CodecError>
    where
        R: Serialize,
    {
        let mut encoded = rmp_serde::to_vec_named(header).map_err(CodecError::invalid)?;
        // nil when there is no reply
        rmp_serde::encode::write_named(&mut encoded, &body).map_err(CodecError::invalid)?;
        self.stream.write_all(&encoded)?;
        Ok(())
    }
}
