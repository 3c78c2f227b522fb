//! Messagepack over HTTP POST.
//!
//! Every message is a header followed by a body, each one messagepack value, with
//! struct fields written by name. `Content-Type` and `Accept` are pinned to
//! `application/msgpack` on both sides.

mod client_codec;
mod server_codec;

use http::HeaderValue;
use httprpc::{
    client::{self, RpcClient},
    server::{self, Dispatcher, HttpRpcServer, ServeCodec},
    CodecError, DuplexBuffer,
};

pub use client_codec::MessagePackClientCodec;
pub use server_codec::MessagePackServerCodec;

/// The media type of every messagepack request and response.
pub const MEDIA_TYPE: &str = "application/msgpack";

/// A client speaking messagepack.
pub type MessagePackClient = RpcClient<MessagePackClientCodec<DuplexBuffer>>;
/// A dispatcher for messagepack requests.
pub type MessagePackDispatcher = Dispatcher<MessagePackServerCodec<DuplexBuffer>>;

/// A messagepack client directing its calls at `url`.
pub fn client(url: impl reqwest::IntoUrl) -> httprpc::Result<MessagePackClient> {
    client_with_configuration(url, client::Configuration::default())
}

/// A messagepack client with custom configuration. The media type is always overridden.
pub fn client_with_configuration(
    url: impl reqwest::IntoUrl,
    mut configuration: client::Configuration,
) -> httprpc::Result<MessagePackClient> {
    configuration.media_type(HeaderValue::from_static(MEDIA_TYPE));
    RpcClient::new(url, configuration)
}

/// Serve a messagepack runtime, usually a `MessagePackDispatcher`.
pub fn server<Runtime>(runtime: Runtime) -> HttpRpcServer<Runtime>
where
    Runtime: ServeCodec<Codec = MessagePackServerCodec<DuplexBuffer>>,
{
    server_with_configuration(runtime, server::Configuration::default())
}

/// Serve a messagepack runtime with custom configuration. The media type is always
/// overridden.
pub fn server_with_configuration<Runtime>(
    runtime: Runtime,
    mut configuration: server::Configuration,
) -> HttpRpcServer<Runtime>
where
    Runtime: ServeCodec<Codec = MessagePackServerCodec<DuplexBuffer>>,
{
    configuration.media_type(HeaderValue::from_static(MEDIA_TYPE));
    log::debug!("serving {MEDIA_TYPE} with {configuration:?}");
    HttpRpcServer::new(runtime, configuration)
}

fn decode_error(error: rmp_serde::decode::Error) -> CodecError {
    match error {
        rmp_serde::decode::Error::InvalidMarkerRead(e)
            if e.kind() == std::io::ErrorKind::UnexpectedEof =>
        {
            CodecError::EndOfStream
        }
        e => {
            log::debug!("decode error: {e:?}");
            CodecError::invalid(e)
        }
    }
}
