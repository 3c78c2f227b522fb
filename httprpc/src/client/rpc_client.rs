use std::{
    marker::PhantomData,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{mpsc, oneshot};

use super::{
    call::{Call, CallHandle, PendingCall},
    configuration::{Configuration, RequestHook},
};
use crate::{ClientCodec, CodecError, DuplexBuffer, Error, RequestHeader};

/// A client for sending rpcs to an httprpc server.
///
/// Each call is one HTTP POST to the client's url, carrying one request encoded by
/// `Codec`. Calls run concurrently on their own tasks, in any order; responses are
/// paired with calls by sequence number.
///
/// Cloning a client is cheap. Clones share the sequence counter.
pub struct RpcClient<Codec> {
    shared: Arc<Shared>,
    _codec: PhantomData<fn() -> Codec>,
}

struct Shared {
    url: reqwest::Url,
    http_client: reqwest::Client,
    media_type: Option<HeaderValue>,
    sequence: Arc<AtomicU64>,
    request_hook: Option<RequestHook>,
}

impl<Codec> Clone for RpcClient<Codec> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            _codec: PhantomData,
        }
    }
}

impl<Codec> std::fmt::Debug for RpcClient<Codec> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.shared.url.as_str())
            .field("media_type", &self.shared.media_type)
            .field("sequence", &self.shared.sequence)
            .finish()
    }
}

impl<Codec> RpcClient<Codec>
where
    Codec: ClientCodec<DuplexBuffer> + 'static,
{
    /// Create a client that directs its requests at `url`.
    pub fn new(url: impl reqwest::IntoUrl, configuration: Configuration) -> crate::Result<Self> {
        let url = url.into_url().map_err(Error::InvalidUrl)?;
        let http_client = match configuration.http_client {
            Some(http_client) => http_client,
            None => reqwest::Client::builder().build()?,
        };
        log::trace!("new client {url}");
        Ok(Self {
            shared: Arc::new(Shared {
                url,
                http_client,
                media_type: configuration.media_type,
                sequence: configuration.sequence_counter.unwrap_or_default(),
                request_hook: configuration.request_hook,
            }),
            _codec: PhantomData,
        })
    }

    /// The url every call is posted to.
    pub fn url(&self) -> &reqwest::Url {
        &self.shared.url
    }

    /// Invoke `method` and wait for its reply.
    pub async fn call<Args, Reply>(
        &self,
        method: impl Into<String>,
        args: Args,
    ) -> crate::Result<Reply>
    where
        Args: Serialize + Send + 'static,
        Reply: DeserializeOwned + Send + 'static,
    {
        self.go(method, args).await?.into_result()
    }

    /// Invoke `method` and wait for it to complete. `reply` is only written when the
    /// call succeeds; on error it is left as it was.
    pub async fn call_into<Args, Reply>(
        &self,
        method: impl Into<String>,
        args: Args,
        reply: &mut Reply,
    ) -> crate::Result<()>
    where
        Args: Serialize + Send + 'static,
        Reply: DeserializeOwned + Send + 'static,
    {
        *reply = self.call(method, args).await?;
        Ok(())
    }

    /// Invoke `method` asynchronously.
    ///
    /// The round trip runs on its own task. The returned completion resolves to the
    /// completed call. This function does not wait for anything.
    pub fn go<Args, Reply>(
        &self,
        method: impl Into<String>,
        args: Args,
    ) -> PendingCall<Args, Reply>
    where
        Args: Serialize + Send + 'static,
        Reply: DeserializeOwned + Send + 'static,
    {
        self.go_call(Call::new(method.into(), args))
    }

    fn go_call<Args, Reply>(&self, call: Call<Args, Reply>) -> PendingCall<Args, Reply>
    where
        Args: Serialize + Send + 'static,
        Reply: DeserializeOwned + Send + 'static,
    {
        let (completor, completion) = oneshot::channel();
        let client = self.clone();
        let round_trip = tokio::spawn(async move {
            let call = client.complete(call).await;
            if completor.send(call).is_err() {
                log::debug!("completed call was not awaited");
            }
        });
        PendingCall::new(completion, round_trip.abort_handle())
    }

    /// Invoke `method` asynchronously, delivering the completed call on `done`.
    ///
    /// `done` may be shared by any number of calls. Each call is sent on it exactly once.
    pub fn go_with<Args, Reply>(
        &self,
        method: impl Into<String>,
        args: Args,
        done: mpsc::Sender<Call<Args, Reply>>,
    ) -> CallHandle
    where
        Args: Serialize + Send + 'static,
        Reply: DeserializeOwned + Send + 'static,
    {
        self.go_call_with(Call::new(method.into(), args), done)
    }

    fn go_call_with<Args, Reply>(
        &self,
        call: Call<Args, Reply>,
        done: mpsc::Sender<Call<Args, Reply>>,
    ) -> CallHandle
    where
        Args: Serialize + Send + 'static,
        Reply: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        let round_trip = tokio::spawn(async move {
            let call = client.complete(call).await;
            if let Err(undelivered) = done.send(call).await {
                log::debug!(
                    "{} completion channel is closed, dropping call",
                    undelivered.0.sequence
                );
            }
        });
        CallHandle::new(round_trip.abort_handle())
    }

    async fn complete<Args, Reply>(&self, mut call: Call<Args, Reply>) -> Call<Args, Reply>
    where
        Args: Serialize,
        Reply: DeserializeOwned,
    {
        match self.round_trip(&mut call).await {
            Ok(reply) => call.reply = Some(reply),
            Err(error) => {
                log::debug!("{} {} failed: {error}", call.sequence, call.method);
                call.error = Some(error);
            }
        }
        call
    }

    async fn round_trip<Args, Reply>(&self, call: &mut Call<Args, Reply>) -> crate::Result<Reply>
    where
        Args: Serialize,
        Reply: DeserializeOwned,
    {
        if call.method.is_empty() {
            return Err(Error::Encode(CodecError::InvalidMessage(
                "method name is empty".to_string(),
            )));
        }

        let mut codec = Codec::new(DuplexBuffer::new());
        let sequence = self.shared.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        call.sequence = sequence;
        codec
            .write_request(
                &RequestHeader {
                    method: call.method.clone(),
                    sequence,
                },
                &call.args,
            )
            .map_err(Error::Encode)?;
        let body = codec.get_mut().freeze_written();
        log::trace!("{sequence} posting {} ({} bytes)", call.method, body.len());

        let mut request = self
            .shared
            .http_client
            .post(self.shared.url.clone())
            .build()?;
        if let Some(media_type) = &self.shared.media_type {
            let headers = request.headers_mut();
            headers.insert(CONTENT_TYPE, media_type.clone());
            headers.insert(ACCEPT, media_type.clone());
        }
        if let Some(request_hook) = &self.shared.request_hook {
            request_hook(&mut request);
        }
        *request.body_mut() = Some(body.into());

        let response = self.shared.http_client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }
        let body = response.bytes().await?;
        log::trace!("{sequence} received {status} ({} bytes)", body.len());

        codec
            .get_mut()
            .attach_reader(body)
            .map_err(|e| Error::Decode(e.into()))?;
        let header = codec.read_response_header().map_err(Error::Decode)?;
        if header.sequence != sequence {
            log::warn!(
                "{sequence} received a response for sequence {}",
                header.sequence
            );
            return Err(Error::MismatchedSequence {
                sent: sequence,
                received: header.sequence,
            });
        }
        if header.is_error() {
            return Err(Error::Server(header.error));
        }
        codec.read_response_body().map_err(Error::Decode)
    }
}
