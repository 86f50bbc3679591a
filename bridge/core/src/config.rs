//! Bridge Configuration
//!
//! Configuration for the engine connection: where the engine binary lives,
//! where its socket appears, and how patiently to probe for it.
//!
//! The endpoint is a fixed, well-known rendezvous path owned by the engine;
//! the defaults here must stay in lockstep with the engine build.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Default rendezvous socket created by the engine process.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/desktop-audio.sock";

/// Default engine binary, relative to the host's working directory.
pub const DEFAULT_ENGINE_BINARY: &str = "./dist/audio";

/// Channel capacity for command and event queues.
const CHANNEL_CAPACITY: usize = 100;

/// Configuration for an [`crate::transport::EngineClient`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Path of the engine's socket file.
    pub socket_path: PathBuf,

    /// Engine binary to spawn on `connect()`.
    ///
    /// `None` means the engine is managed externally (already running or
    /// started by something else); the bridge then only probes and connects.
    pub engine_binary: Option<PathBuf>,

    /// Probe policy while waiting for the socket to appear.
    pub probe: RetryPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            engine_binary: Some(PathBuf::from(DEFAULT_ENGINE_BINARY)),
            probe: RetryPolicy::default(),
        }
    }
}

impl BridgeConfig {
    /// Channel capacity used for the bridge's internal queues.
    #[must_use]
    pub(crate) fn channel_capacity() -> usize {
        CHANNEL_CAPACITY
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AUDIO_SOCKET`: engine socket path
    /// - `AUDIO_ENGINE`: engine binary path ("" disables spawning)
    /// - `AUDIO_PROBE_INTERVAL_MS`: probe interval in milliseconds
    /// - `AUDIO_PROBE_ATTEMPTS`: probe attempt cap
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let socket_path = std::env::var("AUDIO_SOCKET")
            .map(PathBuf::from)
            .unwrap_or(defaults.socket_path);

        let engine_binary = match std::env::var("AUDIO_ENGINE") {
            Ok(s) if s.is_empty() => None,
            Ok(s) => Some(PathBuf::from(s)),
            Err(_) => defaults.engine_binary,
        };

        let interval = std::env::var("AUDIO_PROBE_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(defaults.probe.interval, Duration::from_millis);

        let max_attempts = std::env::var("AUDIO_PROBE_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.probe.max_attempts);

        Self {
            socket_path,
            engine_binary,
            probe: RetryPolicy {
                interval,
                max_attempts,
            },
        }
    }

    /// Set the socket path.
    #[must_use]
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Set (or clear) the engine binary to spawn.
    #[must_use]
    pub fn with_engine_binary(mut self, binary: Option<PathBuf>) -> Self {
        self.engine_binary = binary;
        self
    }

    /// Set the probe policy.
    #[must_use]
    pub fn with_probe(mut self, probe: RetryPolicy) -> Self {
        self.probe = probe;
        self
    }

    /// A configuration for tests: no engine spawn, a caller-provided socket
    /// path, and a short probe budget.
    #[must_use]
    pub fn for_testing(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            engine_binary: None,
            probe: RetryPolicy::for_testing(),
        }
    }
}
