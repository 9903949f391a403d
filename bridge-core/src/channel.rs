//! Reply channel with exactly-once delivery.
//!
//! Every submitted operation owns a [`Delivery`] guard. The guard's
//! `respond` method consumes it, so a second reply for the same request is
//! unrepresentable. Closing the channel during teardown makes late replies
//! from still-running background work drop silently.

use bridge_types::{BridgeError, BridgeReply, RequestId, ResponsePayload};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Caller-facing side of the reply path.
///
/// Cheap to clone; all clones share the open/closed flag.
#[derive(Debug, Clone)]
pub struct CallbackChannel {
    tx: mpsc::UnboundedSender<BridgeReply>,
    open: Arc<AtomicBool>,
}

impl CallbackChannel {
    /// Create a channel and the receiver that drains its replies.
    pub fn register() -> (Self, mpsc::UnboundedReceiver<BridgeReply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            tx,
            open: Arc::new(AtomicBool::new(true)),
        };
        (channel, rx)
    }

    /// Whether replies are still being accepted.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Stop accepting replies. Replies sent after this point are dropped.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Create the single-use delivery guard for a request.
    pub fn delivery(&self, request_id: RequestId) -> Delivery {
        Delivery {
            channel: self.clone(),
            request_id,
        }
    }

    fn deliver(&self, reply: BridgeReply) {
        if !self.is_open() {
            tracing::debug!(request_id = %reply.request_id, "channel closed, dropping late reply");
            return;
        }
        if self.tx.send(reply).is_err() {
            tracing::debug!("reply receiver dropped, discarding reply");
        }
    }
}

/// Single-use reply token for one request.
///
/// `respond` takes `self` by value; each request can be answered at most
/// once, and the compiler enforces it.
#[derive(Debug)]
pub struct Delivery {
    channel: CallbackChannel,
    request_id: RequestId,
}

impl Delivery {
    /// The request this guard answers.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Deliver the terminal result for this request.
    pub fn respond(self, result: Result<ResponsePayload, BridgeError>) {
        let reply = BridgeReply {
            request_id: self.request_id,
            result,
        };
        self.channel.deliver(reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reply_reaches_receiver_with_request_id() {
        let (channel, mut rx) = CallbackChannel::register();
        let id = RequestId::new();

        channel.delivery(id).respond(Ok(ResponsePayload::Bool(true)));

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.request_id, id);
        assert_eq!(reply.result, Ok(ResponsePayload::Bool(true)));
    }

    #[tokio::test]
    async fn replies_after_close_are_dropped() {
        let (channel, mut rx) = CallbackChannel::register();
        let delivery = channel.delivery(RequestId::new());

        channel.close();
        delivery.respond(Ok(ResponsePayload::Bool(true)));
        drop(channel);

        // The sender side is gone and nothing was queued.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_is_shared_across_clones() {
        let (channel, _rx) = CallbackChannel::register();
        let clone = channel.clone();
        channel.close();
        assert!(!clone.is_open());
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_panic_the_sender() {
        let (channel, rx) = CallbackChannel::register();
        drop(rx);
        channel
            .delivery(RequestId::new())
            .respond(Err(BridgeError::DocumentUnavailable));
    }
}
