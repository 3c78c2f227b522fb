//! httprpc
//!
//! This crate carries rpc calls over HTTP POST. Each HTTP exchange carries exactly
//! one rpc request and its one response. You can use whatever encoding you want,
//! but you must provide a `ClientCodec` and a `ServerCodec` for it. If you use
//! JSON-RPC, the `httprpc-jsonrpc` crate provides these implementations. There's
//! also `httprpc-messagepack`, and other encodings are similarly straightforward
//! to add.
//!
//! * See example-jsonrpc for an example of how to serve and call methods.
//!
//! Codecs are written against persistent duplex streams. Here they are driven over
//! a `DuplexBuffer`: the request is written into a growable buffer, sent as the
//! body of one POST, and the response body is then attached as the read side.
//!
//! Requests carry a `RequestHeader` with a method name and a sequence number. The
//! server echoes the sequence number in its `ResponseHeader`, and the client refuses
//! any response whose sequence number is not the one it sent.
//!
//! The `client::RpcClient` issues calls, either awaiting them directly or receiving
//! completed `client::Call`s on a channel. The `server::HttpRpcServer` is an axum
//! router that validates requests and hands them to a `server::ServeCodec`
//! dispatch runtime, such as the bundled `server::Dispatcher`.

#![deny(missing_docs)]

mod codec;
mod duplex;
mod error;
mod message;
#[cfg(test)]
mod test_codec;

pub mod client;
pub mod server;

pub use codec::{ClientCodec, CodecError, ServerCodec};
pub use duplex::{DuplexBuffer, Phase};
pub use error::{Error, Result};
pub use message::{RequestHeader, ResponseHeader};
