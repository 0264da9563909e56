//! Background dispatch
//!
//! A single thread owns the transport and is its only reader and writer.
//! Callers hand commands over through a multi-producer channel and each gets
//! a private single-slot channel for its reply.
//!
//! ## Correlation
//! The wire protocol does not echo any request id: replies arrive in the
//! order the requests were written. The loop therefore keeps pending
//! requests in a strict FIFO queue and always completes the oldest one.
//! Correlation ids exist only on the client side, for diagnostics.
//!
//! ## Loop body
//! 1. With nothing pending, block on the submission channel.
//! 2. Drain submissions without blocking; write each, queue it as pending.
//! 3. Read one reply and complete the front of the queue.
//! 4. On transport failure, or a reply that cannot be decoded without losing
//!    track of where the next one starts, fail every pending and queued
//!    request with the same error and exit.

use std::collections::VecDeque;
use std::io::{BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use super::handle::{ResponseHandle, SenderTag};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::protocol::{encode_command, read_value, Command, Pipeline, ResultValue};

type Interrupt = Box<dyn Fn() + Send + Sync>;

/// Client whose requests are written and read by a background thread
///
/// `AsyncClient` is `Send + Sync`: share it by reference or behind an `Arc`
/// and submit from any number of threads. Replies are delivered in exactly
/// the order the commands reached the loop.
pub struct AsyncClient {
    /// Submission queue into the loop
    requests: Sender<Message>,

    /// Next correlation id (starts at 1)
    next_id: AtomicU64,

    /// Set once the loop stops accepting work
    closed: Arc<AtomicBool>,

    /// Unblocks a read in progress on the loop thread
    interrupt: Option<Interrupt>,

    /// Loop thread, joined at most once
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncClient {
    /// Connect over TCP and start the loop
    ///
    /// `shutdown` closes the socket to wake a loop blocked on a read.
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = super::open_stream(config)?;
        let control: TcpStream = stream.try_clone()?;
        Self::spawn_with_interrupt(stream, move || {
            let _ = control.shutdown(Shutdown::Both);
        })
    }

    /// Start the loop over an already connected transport
    ///
    /// Without an interrupt hook, `shutdown` waits for a read in progress to
    /// complete before the loop notices.
    pub fn spawn<S>(transport: S) -> Result<Self>
    where
        S: Read + Write + Send + 'static,
    {
        Self::start(transport, None)
    }

    /// Start the loop with a hook that makes a blocked transport read return
    pub fn spawn_with_interrupt<S, F>(transport: S, interrupt: F) -> Result<Self>
    where
        S: Read + Write + Send + 'static,
        F: Fn() + Send + Sync + 'static,
    {
        Self::start(transport, Some(Box::new(interrupt)))
    }

    fn start<S>(transport: S, interrupt: Option<Interrupt>) -> Result<Self>
    where
        S: Read + Write + Send + 'static,
    {
        let (requests, inbox) = channel::unbounded();
        let closed = Arc::new(AtomicBool::new(false));

        let dispatch = DispatchLoop {
            transport: BufReader::new(transport),
            inbox,
            pending: PendingQueue::default(),
            closed: Arc::clone(&closed),
        };
        let worker = thread::Builder::new()
            .name("resplink-dispatch".to_string())
            .spawn(move || dispatch.run())?;

        Ok(Self {
            requests,
            next_id: AtomicU64::new(1),
            closed,
            interrupt,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queue a command; the handle yields its reply
    ///
    /// Fails immediately with [`ClientError::LoopTerminated`] once the loop
    /// has stopped.
    pub fn submit(&self, command: &Command, tag: SenderTag) -> Result<ResponseHandle> {
        let payload = encode_command(command)?;
        let (submission, handle) = self.prepare(payload, tag)?;
        self.send(vec![submission])?;
        Ok(handle)
    }

    /// Queue every command of a pipeline so they are written back to back
    pub fn submit_pipeline(&self, pipeline: &Pipeline) -> Result<Vec<ResponseHandle>> {
        if pipeline.is_empty() {
            return Err(ClientError::message("cannot submit an empty pipeline"));
        }

        let len = pipeline.len();
        let mut batch = Vec::with_capacity(len);
        let mut handles = Vec::with_capacity(len);
        for (index, command) in pipeline.commands().iter().enumerate() {
            let payload = encode_command(command)?;
            let (submission, handle) = self.prepare(payload, SenderTag::Pipeline { index, len })?;
            batch.push(submission);
            handles.push(handle);
        }

        self.send(batch)?;
        Ok(handles)
    }

    /// Submit and block for the reply
    pub fn execute(&self, command: &Command) -> Result<ResultValue> {
        self.submit(command, SenderTag::Command)?.wait()
    }

    /// True once the loop no longer accepts work
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop the loop
    ///
    /// Pending requests fail with [`ClientError::LoopTerminated`], later
    /// submissions are rejected, and the loop thread is joined. Calling it
    /// again is a no-op.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let _ = self.requests.send(Message::Shutdown);

        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        if let Some(interrupt) = &self.interrupt {
            interrupt();
        }
        if worker.join().is_err() {
            tracing::warn!("Dispatch thread panicked");
        }
    }

    fn prepare(&self, payload: Bytes, tag: SenderTag) -> Result<(Submission, ResponseHandle)> {
        let id = self
            .next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map_err(|_| ClientError::IdSpaceExhausted)?;
        let (reply, receiver) = channel::bounded(1);

        let submission = Submission {
            request: PendingRequest {
                id,
                tag: tag.clone(),
                reply,
            },
            payload,
        };
        Ok((submission, ResponseHandle::new(id, tag, receiver)))
    }

    fn send(&self, batch: Vec<Submission>) -> Result<()> {
        if self.is_closed() {
            return Err(ClientError::LoopTerminated);
        }
        self.requests
            .send(Message::Submit(batch))
            .map_err(|_| ClientError::LoopTerminated)
    }
}

impl std::fmt::Debug for AsyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncClient")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Loop Internals
// =============================================================================

enum Message {
    Submit(Vec<Submission>),
    Shutdown,
}

struct Submission {
    request: PendingRequest,
    payload: Bytes,
}

/// A written request waiting for its reply
struct PendingRequest {
    id: u64,
    tag: SenderTag,
    reply: Sender<Result<ResultValue>>,
}

impl PendingRequest {
    fn complete(self, outcome: Result<ResultValue>) -> Result<()> {
        self.reply
            .send(outcome)
            .map_err(|_| ClientError::ReceiverGone)
    }
}

/// Requests in the order they were written
///
/// Only the front is ever completed; there is no lookup by id.
#[derive(Default)]
struct PendingQueue {
    entries: VecDeque<PendingRequest>,
}

impl PendingQueue {
    fn push_back(&mut self, request: PendingRequest) {
        self.entries.push_back(request);
    }

    fn pop_front(&mut self) -> Option<PendingRequest> {
        self.entries.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn fail_all(&mut self, error: &ClientError) {
        for request in self.entries.drain(..) {
            let _ = request.complete(Err(error.clone()));
        }
    }
}

/// Why the loop stopped
enum Exit {
    Shutdown,
    Disconnected,
    Failed(ClientError),
}

struct DispatchLoop<S: Read + Write> {
    transport: BufReader<S>,
    inbox: Receiver<Message>,
    pending: PendingQueue,
    closed: Arc<AtomicBool>,
}

impl<S: Read + Write> DispatchLoop<S> {
    fn run(mut self) {
        tracing::debug!("Dispatch loop started");
        let exit = self.serve();
        self.terminate(exit);
    }

    fn serve(&mut self) -> Exit {
        loop {
            if self.pending.is_empty() {
                match self.inbox.recv() {
                    Ok(message) => {
                        if let Err(exit) = self.handle(message) {
                            return exit;
                        }
                    }
                    Err(_) => return Exit::Disconnected,
                }
            }

            // Replies still owed after the client is dropped are read out
            // before the loop exits.
            loop {
                match self.inbox.try_recv() {
                    Ok(message) => {
                        if let Err(exit) = self.handle(message) {
                            return exit;
                        }
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }

            if !self.pending.is_empty() {
                if let Err(exit) = self.read_reply() {
                    return exit;
                }
            }
        }
    }

    /// Write a batch of submissions, queueing each as pending
    fn handle(&mut self, message: Message) -> std::result::Result<(), Exit> {
        let batch = match message {
            Message::Shutdown => return Err(Exit::Shutdown),
            Message::Submit(batch) => batch,
        };

        let mut batch = batch.into_iter();
        while let Some(Submission { request, payload }) = batch.next() {
            let written = self.transport.get_mut().write_all(&payload);
            if written.is_ok() {
                tracing::trace!(id = request.id, tag = ?request.tag, "Wrote {} bytes", payload.len());
            }
            self.pending.push_back(request);

            if let Err(e) = written {
                // Unwritten commands in this batch still get the error
                for rest in batch {
                    self.pending.push_back(rest.request);
                }
                return Err(self.transport_failure(e.into()));
            }
        }

        match self.transport.get_mut().flush() {
            Ok(()) => Ok(()),
            Err(e) => Err(self.transport_failure(e.into())),
        }
    }

    /// Read one reply and complete the oldest pending request
    fn read_reply(&mut self) -> std::result::Result<(), Exit> {
        let outcome = match read_value(&mut self.transport) {
            Err(e) if e.is_fatal() => return Err(self.transport_failure(e)),
            outcome => outcome,
        };

        if let Some(request) = self.pending.pop_front() {
            let id = request.id;
            tracing::trace!(id, "Reply received");
            if let Err(e) = request.complete(outcome) {
                tracing::trace!(id, "Reply discarded: {}", e);
            }
        }
        Ok(())
    }

    /// An error caused by `shutdown` interrupting the transport is not a
    /// failure
    fn transport_failure(&self, error: ClientError) -> Exit {
        if self.closed.load(Ordering::Acquire) {
            Exit::Shutdown
        } else {
            Exit::Failed(error)
        }
    }

    fn terminate(mut self, exit: Exit) {
        self.closed.store(true, Ordering::Release);

        let error = match exit {
            Exit::Shutdown => {
                tracing::debug!("Dispatch loop shutting down");
                ClientError::LoopTerminated
            }
            Exit::Disconnected => {
                tracing::debug!("Dispatch loop stopping: client dropped");
                ClientError::LoopTerminated
            }
            Exit::Failed(e) => {
                tracing::warn!("Connection unusable, failing {} pending requests: {}", self.pending.len(), e);
                e
            }
        };

        // Submissions that raced with the failure were never written
        while let Ok(message) = self.inbox.try_recv() {
            if let Message::Submit(batch) = message {
                for submission in batch {
                    self.pending.push_back(submission.request);
                }
            }
        }
        self.pending.fail_all(&error);
    }
}
