//! Bridge Core - Engine Transport for desktop-audio
//!
//! This crate is the process-integration core of the desktop-audio control
//! surface: it owns the connection to the Audio Engine, a sibling process
//! that performs all synthesis and DSP. The engine is external to this
//! codebase; only its wire protocol is known here.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Presentation layer                       │
//! │            (knobs, selectors, spectrum display)              │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │  "audio" channel (Commands)
//! ┌──────────────────────────────┼───────────────────────────────┐
//! │          HOST PROCESS        │                               │
//! │  ┌───────────────────────────┴─────────────────────────────┐ │
//! │  │                       HostShim                          │ │
//! │  └───────────────────────────┬─────────────────────────────┘ │
//! │  ┌───────────────────────────┴─────────────────────────────┐ │
//! │  │   EngineClient  (spawn, probe, connect, frame, events)  │ │
//! │  └───────────────────────────┬─────────────────────────────┘ │
//! └──────────────────────────────┼───────────────────────────────┘
//!                                │  newline-delimited wire lines
//!                       ┌────────┴────────┐
//!                       │   Audio Engine  │  (external process)
//!                       └─────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Command`]: one protocol message, an ordered list of opaque tokens
//! - [`EngineClient`]: the Unix-socket transport with full lifecycle
//!   management (spawn, bounded probe, reader/writer tasks, cleanup)
//! - [`EngineEvent`]: the single event queue replacing callback fields
//! - [`HostShim`]: bidirectional forwarding to the presentation channel,
//!   with the fail-fast exit policy
//! - [`BridgeConfig`] / [`RetryPolicy`]: endpoint, engine binary, and
//!   probe budget
//!
//! # Quick Start
//!
//! ```ignore
//! use bridge_core::{BridgeConfig, Command, EngineClient, EngineTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bridge_core::BridgeError> {
//!     let mut client = EngineClient::new(BridgeConfig::from_env());
//!     client.connect().await?;
//!
//!     client.send(Command::new("note_on").arg(60)).await?;
//!
//!     while let Some(event) = client.next_event().await {
//!         // forward to the presentation layer; exit on terminal events
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`command`]: the token-list message type
//! - [`codec`]: percent-escaped wire lines and streaming line framing
//! - [`config`]: endpoint and probe configuration
//! - [`error`]: bridge and codec error taxonomy
//! - [`events`]: the transport event queue
//! - [`retry`]: bounded fixed-interval retry combinator
//! - [`shim`]: host-side forwarding glue and fail-fast policy
//! - [`transport`]: the `EngineTransport` seam and its implementations
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any UI framework. Widget
//! rendering, layout, and parameter semantics live entirely above the
//! `"audio"` channel.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod retry;
pub mod shim;
pub mod transport;

// Re-exports for convenience
pub use codec::{decode_line, encode, LineDecoder};
pub use command::Command;
pub use config::{BridgeConfig, DEFAULT_ENGINE_BINARY, DEFAULT_SOCKET_PATH};
pub use error::{BridgeError, DecodeError};
pub use events::EngineEvent;
pub use retry::{retry_with_policy, Exhausted, RetryPolicy};
pub use shim::{HostShim, ShimExit, ShimMetrics, AUDIO_CHANNEL};
pub use transport::{BridgeState, EngineTransport, InProcessTransport};

#[cfg(unix)]
pub use transport::EngineClient;
