use std::io::{Read, Write};

use httprpc::{CodecError, RequestHeader, ResponseHeader, ServerCodec};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// The server half of JSON-RPC 1.0.
///
/// The request's `id` is echoed back verbatim, whatever its type. Ids that are not
/// unsigned integers are presented to the dispatch runtime as sequence 0.
#[derive(Debug)]
pub struct JsonServerCodec<S> {
    stream: S,
    id: Value,
    params: Option<Value>,
}

#[derive(Deserialize)]
struct Request {
    method: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Value,
}

#[derive(Serialize)]
struct Response<'a, R> {
    id: &'a Value,
    result: Option<&'a R>,
    error: Option<&'a str>,
}

impl<S> ServerCodec<S> for JsonServerCodec<S>
where
    S: Read + Write + Send,
{
    fn new(stream: S) -> Self {
        Self {
            stream,
            id: Value::Null,
            params: None,
        }
    }

    fn into_inner(self) -> S {
        self.stream
    }

    fn read_request_header(&mut self) -> Result<RequestHeader, CodecError> {
        let mut deserializer = serde_json::Deserializer::from_reader(&mut self.stream);
        let request = Request::deserialize(&mut deserializer).map_err(|e| {
            if e.is_eof() {
                CodecError::EndOfStream
            } else {
                CodecError::invalid(e)
            }
        })?;
        let sequence = request.id.as_u64().unwrap_or_default();
        self.id = request.id;
        self.params = request.params;
        Ok(RequestHeader {
            method: request.method,
            sequence,
        })
    }

    fn read_request_body<A>(&mut self) -> Result<A, CodecError>
    where
        A: DeserializeOwned,
    {
        let params = self
            .params
            .take()
            .ok_or_else(|| CodecError::invalid("request body missing params"))?;
        let (args,): (A,) = serde_json::from_value(params).map_err(CodecError::invalid)?;
        Ok(args)
    }

    fn discard_request_body(&mut self) -> Result<(), CodecError> {
        self.params = None;
        Ok(())
    }

    fn write_response<R>(
        &mut self,
        header: &ResponseHeader,
        body: Option<&R>,
    ) -> Result<(), CodecError>
    where
        R: Serialize,
    {
        let response = if header.is_error() {
            Response {
                id: &self.id,
                result: None,
                error: Some(header.error.as_str()),
            }
        } else {
            Response {
                id: &self.id,
                result: body,
                error: None,
            }
        };
        // nothing reaches the stream unless the whole response encodes
        let mut encoded = serde_json::to_vec(&response).map_err(CodecError::invalid)?;
        encoded.push(b'\n');
        self.stream.write_all(&encoded)?;
        Ok(())
    }
}
