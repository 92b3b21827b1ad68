//! Signed, batched telemetry.
//!
//! [`TelemetryBatcher`] buffers events and submits them as one signed batch;
//! [`TelemetryCallback`] turns host lifecycle events into those records.

mod batcher;
pub mod callback;

pub use batcher::*;
pub use callback::TelemetryCallback;

use crate::transport::{TelemetryRequest, TelemetryResponse};

/// Where signed telemetry batches are delivered.
///
/// Implemented by [`EthysClient`](crate::client::EthysClient).
pub trait TelemetryTransport: Send + Sync + 'static {
    type Error: std::error::Error + Send + 'static;

    fn submit_telemetry(
        &self,
        request: TelemetryRequest,
    ) -> impl Future<Output = Result<TelemetryResponse, Self::Error>> + Send;
}
