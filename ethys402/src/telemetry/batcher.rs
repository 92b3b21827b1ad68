use std::{fmt::Debug, sync::Arc};

use bon::bon;

use crate::{
    signing::{PrivateKeySigner, generate_nonce, sign_telemetry_request},
    telemetry::TelemetryTransport,
    transport::{TelemetryEvent, TelemetryRequest, TelemetryResponse},
    types::{AnyJson, EvmAddress, Record, unix_timestamp},
};

/// Number of buffered events that triggers an automatic flush.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// What a flush attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was submitted: the batch is empty, below the threshold, or
    /// telemetry is disabled.
    Skipped,
    /// The server accepted the batch and it was cleared.
    Sent {
        events: usize,
        events_processed: Option<u64>,
    },
    /// Submission failed; the batch is kept as it was.
    Retained { pending: usize, reason: String },
}

/// Why a batch could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum FlushError<E> {
    #[error("Failed to sign telemetry batch: {0}")]
    Signing(#[from] ethys402_core::errors::Error),

    #[error("Failed to submit telemetry batch: {0}")]
    Transport(#[source] E),

    #[error("Telemetry batch rejected: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),
}

/// Buffers telemetry events and submits them as signed batches.
///
/// Events are appended with [`record`](Self::record). Once `batch_size`
/// events are pending the batch is signed under a fresh nonce and timestamp
/// and submitted. The buffer is only cleared when the server confirms the
/// batch with `success: true`; any failure keeps it for the next attempt.
/// Submission errors never reach the caller, they are logged and reported
/// through [`FlushOutcome`].
///
/// Call [`close`](Self::close) to flush pending events on shutdown. Dropping a
/// batcher that still holds events submits them in a background task when a
/// Tokio runtime is available.
pub struct TelemetryBatcher<T: TelemetryTransport> {
    transport: Arc<T>,
    signer: PrivateKeySigner,
    agent_id: String,
    address: EvmAddress,
    batch_size: usize,
    enabled: bool,
    events: Vec<TelemetryEvent>,
    last_send_time: Option<u64>,
}

#[bon]
impl<T: TelemetryTransport> TelemetryBatcher<T> {
    /// The signing address is derived from `signer`.
    #[builder]
    pub fn new(
        #[builder(into)] transport: Arc<T>,
        signer: PrivateKeySigner,
        #[builder(into)] agent_id: String,
        #[builder(default = DEFAULT_BATCH_SIZE)] batch_size: usize,
        #[builder(default = true)] enabled: bool,
    ) -> Self {
        let address = EvmAddress(signer.address());
        TelemetryBatcher {
            transport,
            signer,
            agent_id,
            address,
            batch_size: batch_size.max(1),
            enabled,
            events: Vec::new(),
            last_send_time: None,
        }
    }
}

impl<T: TelemetryTransport> TelemetryBatcher<T> {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn address(&self) -> EvmAddress {
        self.address
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning telemetry off keeps already buffered events.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Buffered events, oldest first.
    pub fn pending(&self) -> &[TelemetryEvent] {
        &self.events
    }

    /// Unix seconds of the last accepted batch.
    pub fn last_send_time(&self) -> Option<u64> {
        self.last_send_time
    }

    /// Append an event stamped with the current time, flushing if the batch is full.
    ///
    /// Does nothing while telemetry is disabled.
    pub async fn record(
        &mut self,
        event_type: impl Into<String>,
        data: Record<AnyJson>,
    ) -> FlushOutcome {
        if !self.enabled {
            return FlushOutcome::Skipped;
        }

        self.events.push(TelemetryEvent {
            event_type: event_type.into(),
            timestamp: unix_timestamp(),
            data,
        });

        if self.events.len() >= self.batch_size {
            self.flush().await
        } else {
            FlushOutcome::Skipped
        }
    }

    /// Submit all pending events now.
    pub async fn flush(&mut self) -> FlushOutcome {
        if !self.enabled || self.events.is_empty() {
            return FlushOutcome::Skipped;
        }

        match self.submit().await {
            Ok(response) => {
                let events = self.events.len();
                self.events.clear();
                self.last_send_time = Some(unix_timestamp());

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "Telemetry batch of {} events accepted for agent '{}'",
                    events,
                    self.agent_id
                );

                FlushOutcome::Sent {
                    events,
                    events_processed: response.events_processed,
                }
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Telemetry submission failed, keeping {} events: {}",
                    self.events.len(),
                    err
                );

                FlushOutcome::Retained {
                    pending: self.events.len(),
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Flush once and shut down.
    ///
    /// Events still pending after a failed flush are discarded.
    pub async fn close(mut self) -> FlushOutcome {
        let outcome = self.flush().await;
        self.events.clear();
        outcome
    }

    fn sign_pending(
        &self,
        events: Vec<TelemetryEvent>,
    ) -> ethys402_core::errors::Result<TelemetryRequest> {
        sign_telemetry_request(
            &self.signer,
            &self.agent_id,
            self.address,
            unix_timestamp(),
            generate_nonce(),
            events,
        )
    }

    async fn submit(&self) -> Result<TelemetryResponse, FlushError<T::Error>> {
        let request = self.sign_pending(self.events.clone())?;
        let response = self
            .transport
            .submit_telemetry(request)
            .await
            .map_err(FlushError::Transport)?;

        if response.success {
            Ok(response)
        } else {
            Err(FlushError::Rejected(response.message))
        }
    }
}

impl<T: TelemetryTransport> Drop for TelemetryBatcher<T> {
    fn drop(&mut self) {
        if !self.enabled || self.events.is_empty() {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Dropping {} telemetry events: no async runtime to submit them",
                self.events.len()
            );
            return;
        };

        let events = std::mem::take(&mut self.events);
        let request = match self.sign_pending(events) {
            Ok(request) => request,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Dropping telemetry events: {}", _err);
                return;
            }
        };

        let transport = Arc::clone(&self.transport);
        handle.spawn(async move {
            match transport.submit_telemetry(request).await {
                Ok(response) if response.success => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Final telemetry batch accepted");
                }
                Ok(_response) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        "Final telemetry batch rejected: {}",
                        _response.message.as_deref().unwrap_or("no message")
                    );
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Final telemetry batch failed: {}", _err);
                }
            }
        });
    }
}

impl<T: TelemetryTransport> Debug for TelemetryBatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryBatcher")
            .field("agent_id", &self.agent_id)
            .field("address", &self.address)
            .field("batch_size", &self.batch_size)
            .field("enabled", &self.enabled)
            .field("pending", &self.events.len())
            .field("last_send_time", &self.last_send_time)
            .finish_non_exhaustive()
    }
}
