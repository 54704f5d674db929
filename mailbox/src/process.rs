//! Rendezvous endpoint shared by all messaging operations.

use crate::{Error, Exit};
use futures::{
    channel::{mpsc, oneshot},
    lock::Mutex,
    SinkExt, StreamExt,
};
use std::{future::Future, ops::ControlFlow, sync::Arc};
use tracing::debug;

/// A message in flight, paired with the acceptance signal that resolves the
/// sender's rendezvous.
struct Envelope<M> {
    message: M,
    accepted: oneshot::Sender<()>,
}

struct Shared<M> {
    tx: mpsc::Sender<Envelope<M>>,
    rx: Mutex<mpsc::Receiver<Envelope<M>>>,
}

/// An addressable rendezvous endpoint carrying messages of type `M`.
///
/// A [`Process`] is both a task's mailbox and its address: handles are cheap to
/// clone, and every clone refers to the same endpoint. Delivery is a synchronous
/// hand-off with no queueing: [`Process::send`] resolves only once a
/// [`Process::receive`] or [`Process::receive_loop`] on the same endpoint has
/// accepted the message.
///
/// Two messages sent sequentially through the same handle are delivered in send
/// order. No ordering is guaranteed across senders.
///
/// An endpoint is reclaimed when the last handle drops. Falling out of a receive
/// loop does not close the endpoint for producers; closing is explicit via
/// [`Process::close`].
pub struct Process<M> {
    shared: Arc<Shared<M>>,
}

impl<M> Clone for Process<M> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<M> std::fmt::Debug for Process<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process").finish_non_exhaustive()
    }
}

impl<M> PartialEq for Process<M> {
    /// Two handles are equal iff they address the same endpoint.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<M> Eq for Process<M> {}

impl<M> Default for Process<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Process<M> {
    /// Create a standalone endpoint bound to no running task.
    ///
    /// The endpoint starts empty. Nothing consumes it until the caller (or a
    /// task the caller hands a clone to) receives on it; a send into a fresh
    /// endpoint parks until then.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(0);
        Self {
            shared: Arc::new(Shared {
                tx,
                rx: Mutex::new(rx),
            }),
        }
    }

    /// Deliver one message to this endpoint, resolving once a receiver accepts it.
    ///
    /// `send(None)` transmits nothing and resolves `Ok(())` immediately, so call
    /// sites with an optional reply need no special-casing.
    ///
    /// No error is signaled merely because nobody is currently receiving: the
    /// send parks until a receiver arrives. Returns [`Error::Closed`] if the
    /// endpoint was closed before the message could be accepted.
    pub async fn send(&self, message: impl Into<Option<M>>) -> Result<(), Error> {
        let Some(message) = message.into() else {
            return Ok(());
        };
        let (accepted, acceptance) = oneshot::channel();
        let mut tx = self.shared.tx.clone();
        tx.send(Envelope { message, accepted })
            .await
            .map_err(|_| Error::Closed)?;
        acceptance.await.map_err(|_| Error::Closed)
    }

    /// Wait for exactly one message and invoke `handler` with it.
    ///
    /// The handler always receives the full message; destructuring is its
    /// business. Returns the handler's output after exactly one dispatch, or
    /// [`Error::Closed`] if the endpoint is closed and drained before a message
    /// arrives.
    ///
    /// Concurrent receive calls on clones of the same endpoint are serialized;
    /// each message is delivered to exactly one of them.
    pub async fn receive<F, Fut, T>(&self, handler: F) -> Result<T, Error>
    where
        F: FnOnce(M) -> Fut,
        Fut: Future<Output = T>,
    {
        let envelope = {
            let mut rx = self.shared.rx.lock().await;
            rx.next().await
        };
        let Some(Envelope { message, accepted }) = envelope else {
            return Err(Error::Closed);
        };
        // Resolve the sender's rendezvous before dispatching so the sender is
        // not held for the duration of the handler.
        let _ = accepted.send(());
        Ok(handler(message).await)
    }

    /// Dispatch arriving messages to `handler` until it breaks or the endpoint
    /// is closed and drained.
    ///
    /// The handler is invoked once per message with the full message, same
    /// convention as [`Process::receive`]. Returning
    /// [`ControlFlow::Continue`] keeps the loop consuming; returning
    /// [`ControlFlow::Break`] terminates it with [`Exit::Break`] and no further
    /// channel read is performed. Exhaustion of a closed endpoint terminates it
    /// with [`Exit::Closed`].
    pub async fn receive_loop<F, Fut>(&self, mut handler: F) -> Exit
    where
        F: FnMut(M) -> Fut,
        Fut: Future<Output = ControlFlow<()>>,
    {
        loop {
            match self.receive(&mut handler).await {
                Ok(ControlFlow::Continue(())) => continue,
                Ok(ControlFlow::Break(())) => return Exit::Break,
                Err(Error::Closed) => {
                    debug!("mailbox closed, ending receive loop");
                    return Exit::Closed;
                }
            }
        }
    }

    /// Close the endpoint. Idempotent, callable on any handle.
    ///
    /// New sends fail immediately with [`Error::Closed`]. Sends parked before
    /// the close still complete once a receiver drains them; once drained,
    /// [`Process::receive`] reports [`Error::Closed`] and
    /// [`Process::receive_loop`] exits with [`Exit::Closed`].
    pub fn close(&self) {
        self.shared.tx.clone().close_channel();
        debug!("mailbox closed");
    }

    /// Whether [`Process::close`] has been called on any handle to this endpoint.
    pub fn is_closed(&self) -> bool {
        self.shared.tx.is_closed()
    }
}
