//! Consensus parameters and retarget selection
//!
//! Parameters are immutable after construction; nodes deserialize them
//! from their network configuration and validate once at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::consensus::Uint256;
use crate::constants;

/// Configuration and parameter errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("unknown retarget algorithm selector: {0}")]
    InvalidSelector(u8),
    #[error("pow_target_spacing must be positive")]
    InvalidSpacing,
    #[error("pow_target_timespan must be at least pow_target_spacing")]
    InvalidTimespan,
    #[error("pow_limit does not encode cleanly: {0}")]
    InvalidPowLimit(String),
}

/// Retarget algorithm selector.
///
/// Stable across configuration files as the integers 1 through 6; an
/// out-of-range selector is a fatal configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RetargetAlgorithm {
    /// Classical per-interval retarget
    Classic = 1,
    /// DarkGravityWave v3 rolling 24-block window
    DarkGravityWave = 2,
    /// KimotoGravityWell adaptive window
    KimotoGravityWell = 3,
    /// DigiShield per-interval retarget with asymmetric bounds
    DigiShield = 4,
    /// Dual-KGW3 fusion of KGW and a short classical step
    DualKgw3 = 5,
    /// Orbitcoin Super Shield dual-window retarget
    SuperShield = 6,
}

impl RetargetAlgorithm {
    /// Every algorithm in selector order
    pub const ALL: [RetargetAlgorithm; 6] = [
        RetargetAlgorithm::Classic,
        RetargetAlgorithm::DarkGravityWave,
        RetargetAlgorithm::KimotoGravityWell,
        RetargetAlgorithm::DigiShield,
        RetargetAlgorithm::DualKgw3,
        RetargetAlgorithm::SuperShield,
    ];
}

impl Default for RetargetAlgorithm {
    fn default() -> Self {
        RetargetAlgorithm::Classic
    }
}

impl TryFrom<u8> for RetargetAlgorithm {
    type Error = ParamsError;

    fn try_from(selector: u8) -> Result<Self, ParamsError> {
        match selector {
            1 => Ok(RetargetAlgorithm::Classic),
            2 => Ok(RetargetAlgorithm::DarkGravityWave),
            3 => Ok(RetargetAlgorithm::KimotoGravityWell),
            4 => Ok(RetargetAlgorithm::DigiShield),
            5 => Ok(RetargetAlgorithm::DualKgw3),
            6 => Ok(RetargetAlgorithm::SuperShield),
            other => Err(ParamsError::InvalidSelector(other)),
        }
    }
}

impl From<RetargetAlgorithm> for u8 {
    fn from(algorithm: RetargetAlgorithm) -> u8 {
        algorithm as u8
    }
}

impl fmt::Display for RetargetAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetargetAlgorithm::Classic => "classic interval",
            RetargetAlgorithm::DarkGravityWave => "darkgravitywave v3",
            RetargetAlgorithm::KimotoGravityWell => "kimotogravitywell",
            RetargetAlgorithm::DigiShield => "digishield",
            RetargetAlgorithm::DualKgw3 => "dual kgw3",
            RetargetAlgorithm::SuperShield => "orbitcoin super shield",
        };
        write!(f, "{}", name)
    }
}

/// Immutable consensus parameters for one network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Easiest allowed target
    pub pow_limit: Uint256,
    /// Target seconds between blocks
    pub pow_target_spacing: i64,
    /// Seconds per classical retarget period
    pub pow_target_timespan: i64,
    /// Testnet rule: a stalled chain may mine minimum-difficulty blocks
    pub allow_min_difficulty_blocks: bool,
    /// Regtest rule: targets never move
    pub no_retargeting: bool,
    /// Blocks between subsidy halvings (carried for the node; the
    /// retargeting core never reads it)
    pub subsidy_halving_interval: u32,
}

impl Params {
    /// Main network parameters
    pub fn mainnet() -> Self {
        Self {
            pow_limit: Uint256::from_hex(constants::POW_LIMIT_HEX)
                .expect("mainnet pow limit hex is well formed"),
            pow_target_spacing: constants::POW_TARGET_SPACING,
            pow_target_timespan: constants::POW_TARGET_TIMESPAN,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            subsidy_halving_interval: constants::SUBSIDY_HALVING_INTERVAL,
        }
    }

    /// Blocks between classical retargets
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }

    /// Check the structural invariants once at startup.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.pow_target_spacing <= 0 {
            return Err(ParamsError::InvalidSpacing);
        }
        if self.pow_target_timespan < self.pow_target_spacing {
            return Err(ParamsError::InvalidTimespan);
        }
        if self.pow_limit.is_zero() {
            return Err(ParamsError::InvalidPowLimit("zero".to_string()));
        }

        let (decoded, negative, overflow) = Uint256::from_compact(self.pow_limit.to_compact());
        if negative || overflow || decoded.is_zero() {
            return Err(ParamsError::InvalidPowLimit(self.pow_limit.to_hex()));
        }

        Ok(())
    }
}
