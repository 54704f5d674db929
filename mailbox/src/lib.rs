//! Exchange messages between concurrent tasks over rendezvous mailboxes.
//!
//! # Overview
//!
//! A minimal actor-style messaging layer. Each unit of work owns a
//! [`Process`]: an addressable, unbuffered endpoint that is both the task's
//! mailbox and its identity. Delivery is a pure rendezvous: a send resolves
//! only once a receive on the same endpoint accepts the message, so the
//! channel itself is the only coordination between tasks.
//!
//! Message kinds are ordinary Rust enums. The variant is the message's tag and
//! its fields are the payload, so dispatch is an exhaustive `match` in the
//! receive handler and an unhandled message kind cannot exist at runtime. A
//! task that should answer embeds a typed reply endpoint in the message it
//! sends (see the example below).
//!
//! This layer deliberately stops at messaging: there is no process registry,
//! no supervision, no restart strategy, and no mailbox bounding beyond the
//! rendezvous itself. A send with no counterpart parks forever, as does a
//! receive nobody sends to; hosts that need deadlines impose them with their
//! runtime's timers.
//!
//! # Example
//!
//! ```rust
//! use commonware_mailbox::{spawn, Exit, Process};
//! use std::ops::ControlFlow;
//!
//! enum Request {
//!     Ping { reply: Process<&'static str> },
//!     Stop,
//! }
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async move {
//!     // Start a task that answers pings until told to stop.
//!     let server = spawn(|mailbox: Process<Request>| async move {
//!         let exit = mailbox
//!             .receive_loop(|request| async move {
//!                 match request {
//!                     Request::Ping { reply } => {
//!                         let _ = reply.send("pong").await;
//!                         ControlFlow::Continue(())
//!                     }
//!                     Request::Stop => ControlFlow::Break(()),
//!                 }
//!             })
//!             .await;
//!         assert_eq!(exit, Exit::Break);
//!     });
//!
//!     // Ask for a reply on our own endpoint.
//!     let myself = Process::new();
//!     server
//!         .send(Request::Ping {
//!             reply: myself.clone(),
//!         })
//!         .await
//!         .unwrap();
//!     let pong = myself.receive(|reply| async move { reply }).await.unwrap();
//!     assert_eq!(pong, "pong");
//!     server.send(Request::Stop).await.unwrap();
//! });
//! ```

use std::future::Future;
use thiserror::Error;

mod process;
pub use process::Process;

/// An error that can occur when sending to or receiving on a [`Process`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The endpoint was closed before the operation could complete.
    #[error("mailbox closed")]
    Closed,
}

/// Why a [`Process::receive_loop`] terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// A handler returned [`std::ops::ControlFlow::Break`].
    Break,
    /// The endpoint was closed and all parked sends drained.
    Closed,
}

/// Start `entry` as a concurrent task wired to a fresh [`Process`], returning
/// the endpoint immediately.
///
/// The caller does not wait for `entry` to begin, finish, or receive. The
/// returned handle is safe to send into at once: if `entry` has not yet
/// received, the send parks until it does.
///
/// Spawning itself has no error path. Callers that need a join handle should
/// spawn the task themselves around a standalone [`Process::new`].
///
/// # Panics
///
/// Panics if called outside a tokio runtime, as [`tokio::spawn`] does.
pub fn spawn<M, F, Fut>(entry: F) -> Process<M>
where
    M: Send + 'static,
    F: FnOnce(Process<M>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let process = Process::new();
    tokio::spawn(entry(process.clone()));
    process
}
