//! Dialers that never touch the network.

use std::{
    collections::VecDeque,
    io,
    sync::{
        Mutex,
        PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tokio::io::{DuplexStream, duplex};
use warplink::{BoxedStream, DialError, Dialer};

/// Buffer size of each in-memory pipe handed out by [`ScriptedDialer`].
pub const PIPE_CAPACITY: usize = 64 * 1024;

enum Step {
    Fail,
    Connect(DuplexStream),
}

/// Replays a queue of dial outcomes.
///
/// Each [`dial`](Dialer::dial) pops the next step. Once the script is
/// exhausted every attempt fails with `ConnectionRefused`.
#[derive(Default)]
pub struct ScriptedDialer {
    script: Mutex<VecDeque<Step>>,
    attempts: AtomicUsize,
}

impl ScriptedDialer {
    /// Create a dialer with an empty script.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Make the next unscripted attempt fail.
    pub fn push_failure(&self) { self.steps().push_back(Step::Fail); }

    /// Make the next unscripted attempt succeed.
    ///
    /// Returns the server end of the in-memory pipe the client will receive.
    pub fn push_connection(&self) -> DuplexStream {
        let (client, server) = duplex(PIPE_CAPACITY);
        self.steps().push_back(Step::Connect(client));
        server
    }

    /// Number of dial attempts so far.
    #[must_use]
    pub fn attempts(&self) -> usize { self.attempts.load(Ordering::SeqCst) }

    fn steps(&self) -> std::sync::MutexGuard<'_, VecDeque<Step>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self) -> Result<BoxedStream, DialError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self.steps().pop_front();
        match step {
            Some(Step::Connect(stream)) => Ok(Box::new(stream)),
            Some(Step::Fail) | None => Err(refused()),
        }
    }

    fn peer(&self) -> String { "scripted".to_owned() }
}

/// Dialer whose every attempt is refused.
#[derive(Debug, Default)]
pub struct FailingDialer {
    attempts: AtomicUsize,
}

impl FailingDialer {
    /// Number of dial attempts so far.
    #[must_use]
    pub fn attempts(&self) -> usize { self.attempts.load(Ordering::SeqCst) }
}

#[async_trait]
impl Dialer for FailingDialer {
    async fn dial(&self) -> Result<BoxedStream, DialError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(refused())
    }

    fn peer(&self) -> String { "unreachable".to_owned() }
}

fn refused() -> DialError {
    DialError::Other(io::Error::from(io::ErrorKind::ConnectionRefused))
}
