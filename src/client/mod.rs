//! Client Module
//!
//! Blocking and background-thread clients over one byte transport.
//!
//! ## Architecture
//! - `Client`: encode, write, read one reply, on the caller's thread
//! - `AsyncClient`: a dispatch thread owns the transport; callers submit
//!   through a channel and wait on a private reply channel
//! - Replies are matched to requests by arrival order (FIFO pipelining)

mod blocking;
mod commands;
mod dispatch;
mod handle;

pub use blocking::Client;
pub use commands::Commands;
pub use dispatch::AsyncClient;
pub use handle::{ResponseHandle, SenderTag};

use std::net::{TcpStream, ToSocketAddrs};

use crate::config::Config;
use crate::error::{ClientError, Result};

/// Open a TCP connection using the given config
///
/// Applies nodelay and the write timeout. The read timeout is left to the
/// caller because the dispatch loop must not time out.
pub(crate) fn open_stream(config: &Config) -> Result<TcpStream> {
    let mut last_err = None;

    for addr in config.addr.to_socket_addrs()? {
        let attempt = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                stream.set_nodelay(config.nodelay)?;
                stream.set_write_timeout(config.write_timeout())?;
                tracing::debug!("Connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("Connection to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) => e.into(),
        None => ClientError::message(format!("address {} did not resolve", config.addr)),
    })
}
