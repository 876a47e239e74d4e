pub mod erc20;
pub mod poseidon;
pub mod timestamp;

use alloy::primitives::{Address, U256};

use crate::errors::AppError;
use crate::ports::PortError;

pub use erc20::{Erc20Contract, Erc20Details};
pub use poseidon::PoseidonHashContract;
pub use timestamp::{SignerInfo, StampInfo, TimestampContract};

/// Signer entry as returned by the timestamping contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSignerInfo {
    pub signer: Address,
    pub is_admitted: bool,
    pub signature_timestamp: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStampInfo {
    pub is_public: bool,
    pub timestamp: U256,
    pub users_to_sign: U256,
    pub users_signed: U256,
    pub signers_info: Vec<RawSignerInfo>,
}

pub(crate) fn to_u64(value: U256, field: &str) -> Result<u64, AppError> {
    u64::try_from(value)
        .map_err(|_| AppError::Port(PortError::Validation(format!("{field} overflows u64: {value}"))))
}
