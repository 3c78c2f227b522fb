use std::io::{Read, Write};

use httprpc::{ClientCodec, CodecError, RequestHeader, ResponseHeader};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// The client half of JSON-RPC 1.0.
///
/// Requests are written as `{"method": ..., "params": [args], "id": sequence}`.
/// Responses are read as `{"id": sequence, "result": ..., "error": ...}`.
#[derive(Debug)]
pub struct JsonClientCodec<S> {
    stream: S,
    result: Option<Value>,
}

#[derive(Serialize)]
struct Request<'a, A> {
    method: &'a str,
    params: [&'a A; 1],
    id: u64,
}

#[derive(Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl<S> ClientCodec<S> for JsonClientCodec<S>
where
    S: Read + Write + Send,
{
    fn new(stream: S) -> Self {
        Self {
            stream,
            result: None,
        }
    }

    fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    fn write_request<A>(&mut self, header: &RequestHeader, args: &A) -> Result<(), CodecError>
    where
        A: Serialize,
    {
        let request = Request {
            method: &header.method,
            params: [args],
            id: header.sequence,
        };
        serde_json::to_writer(&mut self.stream, &request).map_err(CodecError::invalid)?;
        self.stream.write_all(b"\n")?;
        Ok(())
    }

    fn read_response_header(&mut self) -> Result<ResponseHeader, CodecError> {
        let mut deserializer = serde_json::Deserializer::from_reader(&mut self.stream);
        let response = Response::deserialize(&mut deserializer).map_err(|e| {
            if e.is_eof() {
                CodecError::EndOfStream
            } else {
                CodecError::invalid(e)
            }
        })?;
        self.result = response.result;

        let error = match response.error {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(error)) if error.is_empty() => "unspecified error".to_string(),
            Some(Value::String(error)) => error,
            Some(other) => return Err(CodecError::invalid(format!("invalid error {other}"))),
        };
        Ok(ResponseHeader {
            sequence: response.id,
            error,
        })
    }

    fn read_response_body<R>(&mut self) -> Result<R, CodecError>
    where
        R: DeserializeOwned,
    {
        let result = self.result.take().unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(CodecError::invalid)
    }
}
