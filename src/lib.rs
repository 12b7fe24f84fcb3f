//! HELIX (HLX) Consensus Core
//!
//! Proof-of-work difficulty retargeting and validation for the HLX chain.
//! The node selects one of six retargeting algorithms at startup; every
//! algorithm manipulates compact 256-bit targets with identical
//! truncation rules, so the arithmetic lives in a single shared type.
//!
//! HLX is the short form used in addresses, logos, and protocol identifiers.

pub mod consensus;

/// Protocol constants - HARD-CODED, NEVER CONFIGURABLE
pub mod constants {
    /// Target block time in seconds
    pub const POW_TARGET_SPACING: i64 = 150;

    /// Classical retarget period in seconds
    pub const POW_TARGET_TIMESPAN: i64 = 600;

    /// Easiest allowed target, written in big-endian display hex
    pub const POW_LIMIT_HEX: &str =
        "0000fffff0000000000000000000000000000000000000000000000000000000";

    /// Blocks between subsidy halvings
    pub const SUBSIDY_HALVING_INTERVAL: u32 = 840_000;

    /// Blocks mined at the minimum difficulty before retargeting engages
    pub const WARM_UP_WINDOW: u32 = 100;

    /// Chain name (short form for addresses/logos)
    pub const CHAIN_NAME: &str = "HLX";

    /// Full chain name
    pub const CHAIN_FULL_NAME: &str = "HELIX";
}
