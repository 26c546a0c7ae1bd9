//! Constant variables.

/// Default bit width of identifiers.
pub const DEFAULT_ID_BITS: u8 = 64;
/// Default period of the maintenance routines, in ms.
pub const DEFAULT_STABILIZE_INTERVAL_MS: u64 = 3000;
/// Default deadline of a single remote call, in ms.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 3000;
