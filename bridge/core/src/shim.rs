//! Host Integration Shim
//!
//! Glue between the engine transport and the hosting process's own IPC
//! channel to the presentation layer. Commands pass through verbatim in
//! both directions under the fixed channel name [`AUDIO_CHANNEL`]; the shim
//! adds no semantics of its own.
//!
//! The shim embodies the fail-fast policy: the UI has no meaningful
//! degraded mode without the engine, so the first terminal bridge event
//! ends [`HostShim::run`] and the hosting process exits non-zero rather
//! than limping along.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::command::Command;
use crate::error::BridgeError;
use crate::events::EngineEvent;
use crate::transport::EngineTransport;

/// Channel name used for both directions of presentation-layer forwarding.
pub const AUDIO_CHANNEL: &str = "audio";

/// Interval between throughput log lines.
const METRICS_INTERVAL: Duration = Duration::from_secs(1);

/// Why [`HostShim::run`] returned.
#[derive(Debug)]
pub enum ShimExit {
    /// The engine closed its side of the stream.
    Disconnected,
    /// A fatal bridge error occurred.
    Error(BridgeError),
    /// The presentation channel closed; normal shutdown.
    UiClosed,
}

impl ShimExit {
    /// Whether the hosting process should exit with a non-zero status.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UiClosed)
    }
}

/// Rolling per-second throughput counters, for diagnostic logging only.
#[derive(Debug, Default)]
pub struct ShimMetrics {
    sent: AtomicU64,
    received: AtomicU64,
}

impl ShimMetrics {
    fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Take and reset the counters accumulated since the last call.
    pub fn take(&self) -> (u64, u64) {
        (
            self.sent.swap(0, Ordering::Relaxed),
            self.received.swap(0, Ordering::Relaxed),
        )
    }
}

/// Forwards commands between an [`EngineTransport`] and the presentation
/// channel until a terminal event or channel closure.
pub struct HostShim<T: EngineTransport> {
    transport: T,
    to_ui: mpsc::Sender<Command>,
    from_ui: mpsc::Receiver<Command>,
    metrics: Arc<ShimMetrics>,
}

impl<T: EngineTransport> HostShim<T> {
    /// Create a shim over an already-connected transport and the two ends
    /// of the presentation channel.
    pub fn new(
        transport: T,
        to_ui: mpsc::Sender<Command>,
        from_ui: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            transport,
            to_ui,
            from_ui,
            metrics: Arc::new(ShimMetrics::default()),
        }
    }

    /// Handle to the throughput counters.
    #[must_use]
    pub fn metrics(&self) -> Arc<ShimMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the forwarding loop to completion.
    pub async fn run(mut self) -> ShimExit {
        let mut ticker = tokio::time::interval(METRICS_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                event = self.transport.next_event() => match event {
                    Some(EngineEvent::Connected) => {
                        tracing::info!("connected to the audio engine");
                    }
                    Some(EngineEvent::Message(command)) => {
                        self.metrics.record_received();
                        tracing::debug!(channel = AUDIO_CHANNEL, %command, "engine -> ui");
                        if self.to_ui.send(command).await.is_err() {
                            return ShimExit::UiClosed;
                        }
                    }
                    Some(EngineEvent::Disconnected) => {
                        tracing::error!("disconnected from the audio engine");
                        return ShimExit::Disconnected;
                    }
                    Some(EngineEvent::Error(err)) => {
                        tracing::error!(error = %err, "audio engine bridge error");
                        return ShimExit::Error(err);
                    }
                    // Event queue gone without a terminal event: same policy
                    None => return ShimExit::Disconnected,
                },
                command = self.from_ui.recv() => match command {
                    Some(command) => {
                        tracing::debug!(channel = AUDIO_CHANNEL, %command, "ui -> engine");
                        match self.transport.send(command).await {
                            Ok(()) => self.metrics.record_sent(),
                            // A terminal event is already in flight; let the
                            // event arm end the loop
                            Err(e) => tracing::warn!(error = %e, "dropping ui command"),
                        }
                    }
                    None => return ShimExit::UiClosed,
                },
                _ = ticker.tick() => {
                    let (sent, received) = self.metrics.take();
                    if sent != 0 || received != 0 {
                        tracing::debug!(sent, received, "bridge throughput per second");
                    }
                }
            }
        }
    }
}
