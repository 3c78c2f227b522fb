use std::{
    future::Future,
    pin::{pin, Pin},
    task::{Context, Poll},
};

use tokio::{sync::oneshot, task::AbortHandle};

/// One rpc invocation.
///
/// A call is completed exactly once, by the task performing its round trip, and is
/// then delivered to whoever is waiting for it.
#[derive(Debug)]
pub struct Call<Args, Reply> {
    /// Name of the method, like `Service.Method`.
    pub method: String,
    /// Arguments, handed back with the completed call.
    pub args: Args,
    /// The decoded reply. Only set when the call succeeded.
    pub reply: Option<Reply>,
    /// Sequence number the request was sent with. 0 if it was never sent.
    pub sequence: u64,
    /// Why the call failed, if it did.
    pub error: Option<crate::Error>,
}

impl<Args, Reply> Call<Args, Reply> {
    pub(crate) fn new(method: String, args: Args) -> Self {
        Self {
            method,
            args,
            reply: None,
            sequence: 0,
            error: None,
        }
    }

    /// The reply, or the reason there is none.
    pub fn into_result(self) -> crate::Result<Reply> {
        match (self.error, self.reply) {
            (Some(error), _) => Err(error),
            (None, Some(reply)) => Ok(reply),
            (None, None) => Err(crate::Error::Cancelled),
        }
    }
}

/// A completion for a call started with `RpcClient::go`.
///
/// Resolves to the completed call. If you drop it before it resolves, the call's
/// round trip is aborted.
#[derive(Debug)]
#[must_use = "You must await the completion to get the response. If you drop the completion, the call will be cancelled."]
pub struct PendingCall<Args, Reply> {
    completion: oneshot::Receiver<Call<Args, Reply>>,
    round_trip: AbortHandle,
    closed: bool,
}

impl<Args, Reply> PendingCall<Args, Reply> {
    pub(crate) fn new(
        completion: oneshot::Receiver<Call<Args, Reply>>,
        round_trip: AbortHandle,
    ) -> Self {
        Self {
            completion,
            round_trip,
            closed: false,
        }
    }
}

impl<Args, Reply> Future for PendingCall<Args, Reply> {
    type Output = crate::Result<Call<Args, Reply>>;

    fn poll(mut self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
        match pin!(&mut self.completion).poll(context) {
            Poll::Ready(result) => {
                self.closed = true;
                match result {
                    Ok(call) => Poll::Ready(Ok(call)),
                    Err(_cancelled) => Poll::Ready(Err(crate::Error::Cancelled)),
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<Args, Reply> Drop for PendingCall<Args, Reply> {
    fn drop(&mut self) {
        if !self.closed {
            log::debug!("pending call dropped before completion, aborting its round trip");
            self.round_trip.abort();
        }
    }
}

/// A handle to a call started with `RpcClient::go_with`.
///
/// The completed call is delivered on the channel passed to `go_with`. Dropping this
/// handle does not cancel the call.
#[derive(Debug)]
pub struct CallHandle {
    round_trip: AbortHandle,
}

impl CallHandle {
    pub(crate) fn new(round_trip: AbortHandle) -> Self {
        Self { round_trip }
    }

    /// Abort the round trip. The call will not be delivered if it has not been already.
    pub fn cancel(&self) {
        self.round_trip.abort();
    }

    /// True once the call has been delivered or cancelled.
    pub fn is_finished(&self) -> bool {
        self.round_trip.is_finished()
    }
}
