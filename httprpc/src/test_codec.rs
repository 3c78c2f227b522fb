//! A newline-delimited JSON codec for exercising the core without a protocol front.
//! Every message is a header line followed by a body line.

use std::{
    collections::VecDeque,
    io::{Read, Write},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{ClientCodec, CodecError, RequestHeader, ResponseHeader, ServerCodec};

pub struct LinesCodec<S> {
    stream: S,
    lines: Option<VecDeque<Vec<u8>>>,
}

impl<S> LinesCodec<S>
where
    S: Read + Write,
{
    /// Both lines are encoded before anything reaches the stream.
    fn write_lines(
        &mut self,
        header: &impl Serialize,
        body: &impl Serialize,
    ) -> Result<(), CodecError> {
        let mut encoded = serde_json::to_vec(header).map_err(CodecError::invalid)?;
        encoded.push(b'\n');
        serde_json::to_writer(&mut encoded, body).map_err(CodecError::invalid)?;
        encoded.push(b'\n');
        self.stream.write_all(&encoded)?;
        Ok(())
    }

    fn read_line<T: DeserializeOwned>(&mut self) -> Result<T, CodecError> {
        if self.lines.is_none() {
            let mut everything = Vec::new();
            self.stream.read_to_end(&mut everything)?;
            self.lines = Some(
                everything
                    .split(|byte| *byte == b'\n')
                    .filter(|line| !line.is_empty())
                    .map(<[u8]>::to_vec)
                    .collect(),
            );
        }
        let line = self
            .lines
            .as_mut()
            .and_then(VecDeque::pop_front)
            .ok_or(CodecError::EndOfStream)?;
        serde_json::from_slice(&line).map_err(CodecError::invalid)
    }
}

impl<S> ClientCodec<S> for LinesCodec<S>
where
    S: Read + Write + Send,
{
    fn new(stream: S) -> Self {
        Self {
            stream,
            lines: None,
        }
    }

    fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    fn write_request<A>(&mut self, header: &RequestHeader, args: &A) -> Result<(), CodecError>
    where
        A: Serialize,
    {
        self.write_lines(header, args)
    }

    fn read_response_header(&mut self) -> Result<ResponseHeader, CodecError> {
        self.read_line()
    }

    fn read_response_body<R>(&mut self) -> Result<R, CodecError>
    where
        R: DeserializeOwned,
    {
        self.read_line()
    }
}

impl<S> ServerCodec<S> for LinesCodec<S>
where
    S: Read + Write + Send,
{
    fn new(stream: S) -> Self {
        Self {
            stream,
            lines: None,
        }
    }

    fn into_inner(self) -> S {
        self.stream
    }

    fn read_request_header(&mut self) -> Result<RequestHeader, CodecError> {
        self.read_line()
    }

    fn read_request_body<A>(&mut self) -> Result<A, CodecError>
    where
        A: DeserializeOwned,
    {
        self.read_line()
    }

    fn discard_request_body(&mut self) -> Result<(), CodecError> {
        self.read_line::<serde::de::IgnoredAny>().map(|_| ())
    }

    fn write_response<R>(
        &mut self,
        header: &ResponseHeader,
        body: Option<&R>,
    ) -> Result<(), CodecError>
    where
        R: Serialize,
    {
        self.write_lines(header, &body)
    }
}
