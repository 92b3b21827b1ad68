//! Common types used across the ETHYS kit.

mod common;
mod evm;

pub use common::*;
pub use evm::*;
