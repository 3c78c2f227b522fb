use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderMap, HeaderValue, Method, StatusCode,
};

use super::{validation::validate, Configuration, ServeCodec, ServeError};
use crate::{DuplexBuffer, ServerCodec};

/// Serves a dispatch runtime over HTTP POST.
///
/// Each request is validated, then its body is handed to the runtime through a codec
/// over a `DuplexBuffer`. Whatever the runtime writes becomes the response body.
/// Requests that pass validation are answered with 200, even when the rpc failed;
/// the failure is in the response header.
#[derive(Debug)]
pub struct HttpRpcServer<Runtime> {
    runtime: Arc<Runtime>,
    configuration: Configuration,
}

impl<Runtime> HttpRpcServer<Runtime>
where
    Runtime: ServeCodec,
{
    /// Construct a new `HttpRpcServer` for a runtime.
    pub fn new(runtime: Runtime, configuration: Configuration) -> Self {
        Self {
            runtime: Arc::new(runtime),
            configuration,
        }
    }

    /// The configuration this server validates and answers with.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// An axum router serving rpcs at `/`. Nest it to serve elsewhere, e.g.
    /// `Router::new().nest("/rpc", server.into_router())`.
    pub fn into_router(self) -> Router {
        let max_body_length = self.configuration.max_body_length;
        Router::new()
            .route("/", any(serve::<Runtime>))
            .layer(DefaultBodyLimit::max(max_body_length))
            .with_state(Arc::new(self))
    }
}

async fn serve<Runtime>(
    State(server): State<Arc<HttpRpcServer<Runtime>>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    Runtime: ServeCodec,
{
    if let Err(rejection) = validate(&method, &headers, &server.configuration) {
        log::warn!("rejecting {method} request: {rejection}");
        return rejection.into_response();
    }

    let runtime = server.runtime.clone();
    let dispatched = tokio::task::spawn_blocking(move || {
        let mut codec =
            <Runtime::Codec as ServerCodec<DuplexBuffer>>::new(DuplexBuffer::with_reader(body));
        runtime
            .serve_codec(&mut codec)
            .map(|()| codec.into_inner().into_written())
    })
    .await;

    let written = match dispatched {
        Ok(Ok(written)) => written,
        Ok(Err(e @ ServeError::Request(_))) => {
            log::warn!("could not serve request: {e}");
            return (StatusCode::BAD_REQUEST, format!("{e}\n")).into_response();
        }
        Ok(Err(e @ ServeError::Response(_))) => {
            log::error!("could not serve request: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n")).into_response();
        }
        Err(e) => {
            log::error!("dispatch did not complete: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error\n",
            )
                .into_response();
        }
    };
    log::trace!("responding with {} bytes", written.len());

    let content_length = HeaderValue::from(written.len());
    let mut response = Response::new(Body::from(written));
    let response_headers = response.headers_mut();
    if let Some(media_type) = &server.configuration.media_type {
        response_headers.insert(CONTENT_TYPE, media_type.clone());
    }
    response_headers.insert(CONTENT_LENGTH, content_length);
    response
}

#[cfg(test)]
mod test {
    use std::{
        collections::{HashMap, HashSet},
        net::SocketAddr,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use axum::Router;
    use http::{HeaderValue, StatusCode};
    use tokio::net::TcpListener;

    use super::HttpRpcServer;
    use crate::{
        client::{self, RpcClient},
        server::{Configuration, Dispatcher, ServeCodec, ServeError},
        test_codec::LinesCodec,
        CodecError, DuplexBuffer, Error, ResponseHeader, ServerCodec,
    };

    type Codec = LinesCodec<DuplexBuffer>;

    async fn start(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        address
    }

    /// Serves echo, a failing method and a counter of dispatched requests.
    async fn start_dispatcher(configuration: Configuration) -> (SocketAddr, Arc<AtomicUsize>) {
        let dispatched = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::<Codec>::new();
        let count = dispatched.clone();
        dispatcher
            .register("Echo.Echo", move |message: String| {
                count.fetch_add(1, Ordering::Relaxed);
                Ok::<_, String>(message)
            })
            .register("Echo.Fail", |_: String| Err::<String, _>("no such method"));
        let router = HttpRpcServer::new(dispatcher, configuration).into_router();
        (start(router).await, dispatched)
    }

    fn client(address: SocketAddr) -> RpcClient<Codec> {
        RpcClient::new(format!("http://{address}/"), client::Configuration::default())
            .expect("valid url")
    }

    #[tokio::test]
    async fn round_trip() {
        let (address, dispatched) = start_dispatcher(Configuration::default()).await;
        let reply: String = client(address)
            .call("Echo.Echo", "hello".to_string())
            .await
            .expect("call succeeds");
        assert_eq!("hello", reply);
        assert_eq!(1, dispatched.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn concurrent_calls_are_paired_by_sequence() {
        let (address, _) = start_dispatcher(Configuration::default()).await;
        let client = client(address);

        // batches keep the open socket count under common descriptor limits
        let mut sequences = HashSet::new();
        for batch in 0..4 {
            let pending: Vec<_> = (0..250)
                .map(|i| {
                    client.go::<String, String>("Echo.Echo", format!("message {batch}.{i}"))
                })
                .collect();
            for call in futures::future::join_all(pending).await {
                let call = call.expect("call completes");
                assert!(call.error.is_none(), "{:?}", call.error);
                assert_eq!(Some(&call.args), call.reply.as_ref(), "reply matches its call");
                assert!(sequences.insert(call.sequence), "sequence reused");
            }
        }
        assert_eq!(1000, sequences.len());
    }

    #[tokio::test]
    async fn application_error_leaves_reply_alone() {
        let (address, _) = start_dispatcher(Configuration::default()).await;
        let mut reply = "untouched".to_string();
        let error = client(address)
            .call_into("Echo.Fail", "anything".to_string(), &mut reply)
            .await
            .expect_err("handler fails");
        assert!(matches!(error, Error::Server(_)), "{error:?}");
        assert_eq!("no such method", error.to_string());
        assert_eq!("untouched", reply);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let router = Router::new().route(
            "/",
            axum::routing::post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "  boom\n") }),
        );
        let address = start(router).await;
        let error = client(address)
            .call::<String, String>("Echo.Echo", "hello".to_string())
            .await
            .expect_err("server fails");
        assert!(
            matches!(&error, Error::Status { status: 500, body } if body == "boom"),
            "{error:?}"
        );
        let message = error.to_string();
        assert!(message.contains("500"), "{message}");
        assert!(message.contains("boom"), "{message}");
    }

    #[tokio::test]
    async fn mismatched_sequence_is_refused() {
        // a well-formed response, for some other rpc
        let router = Router::new().route(
            "/",
            axum::routing::post(|| async {
                let header = serde_json::to_string(&ResponseHeader::ok(999)).expect("encodes");
                format!("{header}\n\"hello\"\n")
            }),
        );
        let address = start(router).await;
        let error = client(address)
            .call::<String, String>("Echo.Echo", "hello".to_string())
            .await
            .expect_err("wrong sequence");
        assert!(
            matches!(
                error,
                Error::MismatchedSequence {
                    sent: 1,
                    received: 999
                }
            ),
            "{error:?}"
        );
        assert!(error.to_string().contains("mismatched sequence number"));
    }

    #[tokio::test]
    async fn get_is_not_dispatched() {
        let (address, dispatched) = start_dispatcher(Configuration::default()).await;
        let response = reqwest::Client::new()
            .get(format!("http://{address}/"))
            .send()
            .await
            .expect("response");
        assert_eq!(StatusCode::METHOD_NOT_ALLOWED, response.status());
        assert_eq!(0, dispatched.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn wrong_content_type_is_not_dispatched() {
        let mut configuration = Configuration::default();
        configuration.media_type(HeaderValue::from_static("application/json"));
        let (address, dispatched) = start_dispatcher(configuration).await;

        let response = reqwest::Client::new()
            .post(format!("http://{address}/"))
            .header("Content-Type", "text/plain")
            .header("Accept", "application/json")
            .body("{\"method\":\"Echo.Echo\",\"sequence\":1}\n\"hi\"\n")
            .send()
            .await
            .expect("response");
        assert_eq!(StatusCode::UNSUPPORTED_MEDIA_TYPE, response.status());
        assert_eq!(0, dispatched.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn response_is_framed() {
        let mut configuration = Configuration::default();
        configuration.media_type(HeaderValue::from_static("application/json"));
        let (address, _) = start_dispatcher(configuration).await;

        let body = "{\"method\":\"Echo.Echo\",\"sequence\":7}\n\"hi\"\n";
        let response = reqwest::Client::new()
            .post(format!("http://{address}/"))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await
            .expect("response");
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            Some("application/json"),
            response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok())
        );
        let content_length = response.content_length();
        let text = response.text().await.expect("body");
        assert_eq!(Some(text.len() as u64), content_length);
        assert_eq!("{\"sequence\":7,\"error\":\"\"}\n\"hi\"\n", text);
    }

    #[tokio::test]
    async fn undecodable_request_is_a_bad_request() {
        let (address, dispatched) = start_dispatcher(Configuration::default()).await;
        let response = reqwest::Client::new()
            .post(format!("http://{address}/"))
            .body("not an rpc")
            .send()
            .await
            .expect("response");
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
        assert_eq!(0, dispatched.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn unencodable_reply_is_an_rpc_error() {
        let mut dispatcher = Dispatcher::<Codec>::new();
        dispatcher.register("Table.Square", |n: i32| {
            Ok::<_, String>(HashMap::from([((n, n), n * n)]))
        });
        let router = HttpRpcServer::new(dispatcher, Configuration::default()).into_router();
        let address = start(router).await;

        let mut reply: HashMap<(i32, i32), i32> = HashMap::new();
        let error = client(address)
            .call_into("Table.Square", 3, &mut reply)
            .await
            .expect_err("reply cannot be encoded");
        assert!(
            matches!(&error, Error::Server(message) if message.starts_with("invalid reply")),
            "{error:?}"
        );
        assert!(reply.is_empty());
    }

    /// Cannot even write an error response.
    struct Mute;

    impl ServeCodec for Mute {
        type Codec = Codec;

        fn serve_codec(&self, codec: &mut Codec) -> Result<(), ServeError> {
            codec.read_request_header().map_err(ServeError::Request)?;
            Err(ServeError::Response(CodecError::invalid("no encoder")))
        }
    }

    #[tokio::test]
    async fn unwritable_response_is_a_server_error() {
        let address = start(HttpRpcServer::new(Mute, Configuration::default()).into_router()).await;
        let error = client(address)
            .call::<String, String>("Echo.Echo", "hello".to_string())
            .await
            .expect_err("no response");
        assert!(
            matches!(&error, Error::Status { status: 500, body } if body.contains("no encoder")),
            "{error:?}"
        );
    }

    #[tokio::test]
    async fn request_hook_adds_headers_but_not_body() {
        let router = Router::new().route(
            "/",
            axum::routing::post(|headers: http::HeaderMap, body: String| async move {
                let token = headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                // echo what arrived back as the reply
                let header = serde_json::to_string(&ResponseHeader::ok(1)).expect("encodes");
                let reply = serde_json::to_string(&(token, body)).expect("encodes");
                format!("{header}\n{reply}\n")
            }),
        );
        let address = start(router).await;

        let mut configuration = client::Configuration::default();
        configuration.request_hook(|request| {
            request
                .headers_mut()
                .insert("authorization", HeaderValue::from_static("Bearer token"));
            *request.body_mut() = Some("replaced".into());
        });
        let client: RpcClient<Codec> =
            RpcClient::new(format!("http://{address}/"), configuration).expect("valid url");

        let (token, body): (String, String) = client
            .call("Echo.Echo", "hello".to_string())
            .await
            .expect("call succeeds");
        assert_eq!("Bearer token", token);
        assert_eq!(
            "{\"method\":\"Echo.Echo\",\"sequence\":1}\n\"hello\"\n",
            body
        );
    }
}
