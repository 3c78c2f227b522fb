//! Serving rpcs over HTTP POST.

mod configuration;
mod dispatcher;
mod http_server;
mod server_traits;
mod validation;

pub use configuration::{AcceptPolicy, Configuration};
pub use dispatcher::Dispatcher;
pub use http_server::HttpRpcServer;
pub use server_traits::{ServeCodec, ServeError};
pub use validation::{validate, Rejection};
