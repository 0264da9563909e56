//! # resplink
//!
//! A client for the RESP key-value wire protocol with:
//! - Multi-bulk command encoding and a five-type reply decoder
//! - A tagged reply model with strict, typed conversions
//! - A blocking client for single-caller use
//! - A background-thread client with FIFO request/reply correlation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────┐      ┌──────────────────────────────┐
//! │     Blocking Client   │      │         Async Client         │
//! │ encode → write → read │      │  submit() ──► channel (MPSC) │
//! └───────────┬───────────┘      └──────────────┬───────────────┘
//!             │                                 │
//!             │                  ┌──────────────▼───────────────┐
//!             │                  │        Dispatch Loop         │
//!             │                  │  write, queue pending (FIFO) │
//!             │                  │  read, complete oldest       │
//!             │                  └──────────────┬───────────────┘
//!             │                                 │
//! ┌───────────▼─────────────────────────────────▼───────────────┐
//! │                     Protocol Codec                          │
//! │        Command ──► bytes      bytes ──► ResultValue          │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │
//!                         Transport (Read + Write)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use resplink::{Client, Command, Commands, Config};
//!
//! # fn main() -> resplink::Result<()> {
//! let mut client = Client::connect(&Config::default())?;
//! client.set("key", "value")?;
//! let value: Option<String> = client.get("key")?;
//! let raw = client.execute(&Command::new("TYPE").arg("key"))?;
//! println!("{:?} {}", value, raw);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ClientError, ParsingFailure, Result};
pub use config::Config;
pub use protocol::{Command, FromResultValue, Pipeline, ResultValue};
pub use client::{AsyncClient, Client, Commands, ResponseHandle, SenderTag};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of resplink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
