//! Issuing rpcs over HTTP POST.

mod call;
mod configuration;
mod rpc_client;

pub use call::{Call, CallHandle, PendingCall};
pub use configuration::{Configuration, RequestHook};
pub use rpc_client::RpcClient;
