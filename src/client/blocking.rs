//! Blocking client
//!
//! One round trip per call on the caller's thread.

use std::io::{BufReader, Read, Write};
use std::net::TcpStream;

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::protocol::{
    encode_command, encode_pipeline, read_value, read_values, Command, FromResultValue, Pipeline,
    ResultValue,
};

/// Synchronous client over any duplex byte stream
///
/// ## Preconditions
/// A `Client` serves a single caller at a time; every call takes `&mut self`.
/// Sharing one across threads needs external locking, and interleaving
/// requests from several callers on one connection is not supported.
///
/// ## Failure model
/// No retry. After an I/O failure, or a decode failure that loses track of
/// where the next reply starts, the stream state is undefined: the client
/// remembers the failure and every later call fails fast with the same
/// error. Reconnect by building a new client. A malformed reply whose
/// framing is intact is consumed whole and does not poison the client.
pub struct Client<S: Read + Write = TcpStream> {
    /// Buffered reader; writes go through `get_mut()`
    stream: BufReader<S>,

    /// First failure that made the connection unusable
    failed: Option<ClientError>,
}

impl Client<TcpStream> {
    /// Connect over TCP
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = super::open_stream(config)?;
        stream.set_read_timeout(config.read_timeout())?;
        Ok(Self::new(stream))
    }
}

impl<S: Read + Write> Client<S> {
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            failed: None,
        }
    }

    /// Execute a command and return the raw reply
    ///
    /// The whole request is written before reading begins.
    pub fn execute(&mut self, command: &Command) -> Result<ResultValue> {
        let bytes = encode_command(command)?;
        self.round_trip(&bytes, |reader| read_value(reader))
    }

    /// Execute a command and narrow the reply
    pub fn execute_as<T: FromResultValue>(&mut self, command: &Command) -> Result<T> {
        self.execute(command)?.convert()
    }

    /// Execute a pipeline, returning one reply per command in order
    pub fn execute_pipeline(&mut self, pipeline: &Pipeline) -> Result<Vec<ResultValue>> {
        let bytes = encode_pipeline(pipeline)?;
        let count = pipeline.len();
        self.round_trip(&bytes, |reader| read_values(reader, count))
    }

    /// True once the connection has become unusable
    pub fn is_broken(&self) -> bool {
        self.failed.is_some()
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    fn round_trip<T>(
        &mut self,
        request: &[u8],
        read: impl FnOnce(&mut BufReader<S>) -> Result<T>,
    ) -> Result<T> {
        if let Some(failure) = &self.failed {
            return Err(failure.clone());
        }

        let result = self.write_request(request).and_then(|()| read(&mut self.stream));
        if let Err(ref e) = result {
            if e.is_fatal() {
                tracing::debug!("Client connection failed: {}", e);
                self.failed = Some(e.clone());
            }
        }
        result
    }

    fn write_request(&mut self, request: &[u8]) -> Result<()> {
        let writer = self.stream.get_mut();
        writer.write_all(request)?;
        writer.flush()?;
        tracing::trace!("Wrote {} byte request", request.len());
        Ok(())
    }
}

impl<S: Read + Write> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
