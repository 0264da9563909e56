//! Reply handles
//!
//! What a caller holds between submitting a command and receiving its reply.

use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{ClientError, Result};
use crate::protocol::{FromResultValue, ResultValue};

/// Which logical caller class a request belongs to
///
/// Used for grouping and diagnostics only. Replies are never matched by tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SenderTag {
    /// A standalone command
    #[default]
    Command,

    /// Position of a command inside a pipeline
    Pipeline { index: usize, len: usize },

    /// A command issued on behalf of a pub/sub channel
    Channel(String),

    /// A command issued on behalf of a pub/sub pattern
    Pattern(String),
}

/// Waits for the reply to one submitted command
///
/// Dropping the handle abandons the reply; the dispatch loop discards it
/// when it arrives.
#[derive(Debug)]
pub struct ResponseHandle {
    id: u64,
    tag: SenderTag,
    reply: Receiver<Result<ResultValue>>,
    taken: bool,
}

impl ResponseHandle {
    pub(crate) fn new(id: u64, tag: SenderTag, reply: Receiver<Result<ResultValue>>) -> Self {
        Self {
            id,
            tag,
            reply,
            taken: false,
        }
    }

    /// Correlation id assigned at submission
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn tag(&self) -> &SenderTag {
        &self.tag
    }

    /// Block until the reply arrives, or until `timeout` elapses
    ///
    /// An elapsed timeout returns [`ClientError::NotReady`] and the handle
    /// can be waited on again.
    pub fn await_result(&mut self, timeout: Option<Duration>) -> Result<ResultValue> {
        self.check_taken()?;
        let outcome = match timeout {
            None => self.reply.recv().map_err(|_| ClientError::LoopTerminated),
            Some(timeout) => self.reply.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => ClientError::NotReady,
                RecvTimeoutError::Disconnected => ClientError::LoopTerminated,
            }),
        };
        self.settle(outcome)
    }

    /// Return the reply if it has already arrived
    pub fn try_result(&mut self) -> Result<ResultValue> {
        self.check_taken()?;
        let outcome = self.reply.try_recv().map_err(|e| match e {
            TryRecvError::Empty => ClientError::NotReady,
            TryRecvError::Disconnected => ClientError::LoopTerminated,
        });
        self.settle(outcome)
    }

    /// Block for the reply and narrow it
    pub fn await_as<T: FromResultValue>(mut self, timeout: Option<Duration>) -> Result<T> {
        self.await_result(timeout)?.convert()
    }

    /// Block for the reply, consuming the handle
    pub fn wait(mut self) -> Result<ResultValue> {
        self.await_result(None)
    }

    fn check_taken(&self) -> Result<()> {
        if self.taken {
            return Err(ClientError::message(format!(
                "reply for request {} was already taken",
                self.id
            )));
        }
        Ok(())
    }

    fn settle(&mut self, outcome: Result<Result<ResultValue>>) -> Result<ResultValue> {
        let reply = outcome?;
        self.taken = true;
        reply
    }
}
