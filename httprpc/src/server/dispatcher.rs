use std::{collections::HashMap, fmt::Display};

use serde::{de::DeserializeOwned, Serialize};

use super::{ServeCodec, ServeError};
use crate::{DuplexBuffer, ResponseHeader, ServerCodec};

type Endpoint<Codec> = Box<dyn Fn(&mut Codec, u64) -> Result<(), ServeError> + Send + Sync>;

/// A dispatch runtime that routes requests to handlers by method name.
///
/// Handlers are plain functions from arguments to a reply or an error message. They run
/// on a blocking thread. Errors, unknown methods and undecodable arguments are reported
/// to the caller in the response header.
pub struct Dispatcher<Codec> {
    methods: HashMap<String, Endpoint<Codec>>,
}

impl<Codec> Default for Dispatcher<Codec> {
    fn default() -> Self {
        Self {
            methods: Default::default(),
        }
    }
}

impl<Codec> std::fmt::Debug for Dispatcher<Codec> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<Codec> Dispatcher<Codec>
where
    Codec: ServerCodec<DuplexBuffer> + 'static,
{
    /// A dispatcher with no methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method`, like `Arith.Multiply`. Registering the same name
    /// again replaces the previous handler.
    pub fn register<Args, Reply, Failure, Handler>(
        &mut self,
        method: impl Into<String>,
        handler: Handler,
    ) -> &mut Self
    where
        Args: DeserializeOwned + 'static,
        Reply: Serialize + 'static,
        Failure: Display + 'static,
        Handler: Fn(Args) -> Result<Reply, Failure> + Send + Sync + 'static,
    {
        let method = method.into();
        let serve = endpoint::<Codec, Args, Reply, Failure, Handler>(handler);
        if self.methods.insert(method.clone(), serve).is_some() {
            log::warn!("replaced handler for {method}");
        }
        self
    }

    /// True if a handler is registered for `method`.
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }
}

impl<Codec> ServeCodec for Dispatcher<Codec>
where
    Codec: ServerCodec<DuplexBuffer> + 'static,
{
    type Codec = Codec;

    fn serve_codec(&self, codec: &mut Codec) -> Result<(), ServeError> {
        let header = codec.read_request_header().map_err(ServeError::Request)?;
        let sequence = header.sequence;
        match self.methods.get(&header.method) {
            Some(endpoint) => {
                log::trace!("{sequence} dispatching {}", header.method);
                endpoint(codec, sequence)
            }
            None => {
                log::debug!("{sequence} unknown method {}", header.method);
                if let Err(e) = codec.discard_request_body() {
                    log::debug!("{sequence} could not skip arguments: {e}");
                }
                write_error(codec, sequence, format!("unknown method: {}", header.method))
            }
        }
    }
}

fn write_error<Codec>(codec: &mut Codec, sequence: u64, error: String) -> Result<(), ServeError>
where
    Codec: ServerCodec<DuplexBuffer>,
{
    codec
        .write_response::<()>(&ResponseHeader::error(sequence, error), None)
        .map_err(ServeError::Response)
}

fn endpoint<Codec, Args, Reply, Failure, Handler>(handler: Handler) -> Endpoint<Codec>
where
    Codec: ServerCodec<DuplexBuffer> + 'static,
    Args: DeserializeOwned + 'static,
    Reply: Serialize + 'static,
    Failure: Display + 'static,
    Handler: Fn(Args) -> Result<Reply, Failure> + Send + Sync + 'static,
{
    Box::new(move |codec: &mut Codec, sequence: u64| {
        let args = match codec.read_request_body::<Args>() {
            Ok(args) => args,
            Err(e) => {
                log::debug!("{sequence} invalid arguments: {e}");
                return write_error(codec, sequence, format!("invalid arguments: {e}"));
            }
        };
        match handler(args) {
            Ok(reply) => match codec.write_response(&ResponseHeader::ok(sequence), Some(&reply)) {
                Ok(()) => Ok(()),
                Err(e) => {
                    log::warn!("{sequence} could not encode reply: {e}");
                    write_error(codec, sequence, format!("invalid reply: {e}"))
                }
            },
            Err(failure) => {
                let mut error = failure.to_string();
                if error.is_empty() {
                    // an empty error reads as success on the wire
                    error = "unspecified error".to_string();
                }
                write_error(codec, sequence, error)
            }
        }
    })
}
