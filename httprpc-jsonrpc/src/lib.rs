//! JSON-RPC 1.0 over HTTP POST.
//!
//! This crate fixes httprpc's codec to JSON-RPC and pins `Content-Type` and `Accept`
//! to `application/json` on both sides. Serve a `JsonRpcDispatcher` with [`server`]
//! and call it with a [`client`].

mod client_codec;
mod server_codec;

use http::HeaderValue;
use httprpc::{
    client::{self, RpcClient},
    server::{self, Dispatcher, HttpRpcServer, ServeCodec},
    DuplexBuffer,
};

pub use client_codec::JsonClientCodec;
pub use server_codec::JsonServerCodec;

/// The media type of every JSON-RPC request and response.
pub const MEDIA_TYPE: &str = "application/json";

/// A client speaking JSON-RPC.
pub type JsonRpcClient = RpcClient<JsonClientCodec<DuplexBuffer>>;
/// A dispatcher for JSON-RPC requests.
pub type JsonRpcDispatcher = Dispatcher<JsonServerCodec<DuplexBuffer>>;

/// A JSON-RPC client directing its calls at `url`.
pub fn client(url: impl reqwest::IntoUrl) -> httprpc::Result<JsonRpcClient> {
    client_with_configuration(url, client::Configuration::default())
}

/// A JSON-RPC client with custom configuration. The media type is always overridden.
pub fn client_with_configuration(
    url: impl reqwest::IntoUrl,
    mut configuration: client::Configuration,
) -> httprpc::Result<JsonRpcClient> {
    configuration.media_type(HeaderValue::from_static(MEDIA_TYPE));
    RpcClient::new(url, configuration)
}

/// Serve a JSON-RPC runtime, usually a `JsonRpcDispatcher`.
pub fn server<Runtime>(runtime: Runtime) -> HttpRpcServer<Runtime>
where
    Runtime: ServeCodec<Codec = JsonServerCodec<DuplexBuffer>>,
{
    server_with_configuration(runtime, server::Configuration::default())
}

/// Serve a JSON-RPC runtime with custom configuration. The media type is always
/// overridden.
pub fn server_with_configuration<Runtime>(
    runtime: Runtime,
    mut configuration: server::Configuration,
) -> HttpRpcServer<Runtime>
where
    Runtime: ServeCodec<Codec = JsonServerCodec<DuplexBuffer>>,
{
    configuration.media_type(HeaderValue::from_static(MEDIA_TYPE));
    log::debug!("serving {MEDIA_TYPE} with {configuration:?}");
    HttpRpcServer::new(runtime, configuration)
}
