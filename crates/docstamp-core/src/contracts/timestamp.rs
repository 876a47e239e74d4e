use alloy::primitives::{Address, B256, U256};
use serde::Serialize;

use super::{to_u64, RawSignerInfo};
use crate::domain::PendingTx;
use crate::errors::{handle_eth_error, AppError, StampRevert};
use crate::ports::{PortError, TimestampPort};
use crate::zkp::ZkpPoints;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignerInfo {
    pub address: Address,
    pub signature_timestamp: u64,
    pub is_admitted_to_signing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StampInfo {
    pub is_public: bool,
    pub doc_timestamp: u64,
    pub signers: Vec<SignerInfo>,
    pub signers_total_count: u64,
}

/// Typed access to the timestamping contract. Without a client (no wallet
/// or no configured address) every call fails with
/// [`AppError::ContractInstanceUnavailable`].
#[derive(Debug, Clone)]
pub struct TimestampContract<C> {
    instance: Option<C>,
}

impl<C: TimestampPort> TimestampContract<C> {
    pub fn new(instance: Option<C>) -> Self {
        Self { instance }
    }

    fn instance(&self) -> Result<&C, AppError> {
        self.instance
            .as_ref()
            .ok_or(AppError::ContractInstanceUnavailable)
    }

    pub fn get_stamp_info_with_pagination(
        &self,
        public_hash: B256,
        offset: u64,
        limit: u64,
    ) -> Result<StampInfo, AppError> {
        let raw = self
            .instance()?
            .get_stamp_info_with_pagination(public_hash, U256::from(offset), U256::from(limit))
            .map_err(handle_eth_error)?;

        let signers = raw
            .signers_info
            .into_iter()
            .map(normalize_signer)
            .collect::<Result<Vec<_>, _>>()?;
        let signers_total_count = if raw.is_public {
            to_u64(raw.users_signed, "usersSigned")?
        } else {
            to_u64(raw.users_to_sign, "usersToSign")?
        };
        Ok(StampInfo {
            is_public: raw.is_public,
            doc_timestamp: to_u64(raw.timestamp, "timestamp")?,
            signers,
            signers_total_count,
        })
    }

    pub fn get_signer_info(&self, address: Address, public_hash: B256) -> Result<SignerInfo, AppError> {
        let raw = self
            .instance()?
            .get_user_info(address, public_hash)
            .map_err(handle_eth_error)?;
        normalize_signer(raw)
    }

    pub fn get_fee(&self) -> Result<U256, AppError> {
        self.instance()?.fee().map_err(handle_eth_error)
    }

    pub fn create_stamp(
        &self,
        public_hash: B256,
        is_sign: bool,
        indicated_addresses: &[Address],
        zkp_points: &ZkpPoints,
        value: U256,
    ) -> Result<PendingTx, AppError> {
        self.instance()?
            .create_stamp(public_hash, is_sign, indicated_addresses, zkp_points, value)
            .map_err(classify_stamp_error)
    }

    pub fn sign(&self, public_hash: B256) -> Result<PendingTx, AppError> {
        self.instance()?
            .sign(public_hash)
            .map_err(classify_stamp_error)
    }
}

fn normalize_signer(raw: RawSignerInfo) -> Result<SignerInfo, AppError> {
    Ok(SignerInfo {
        address: raw.signer,
        signature_timestamp: to_u64(raw.signature_timestamp, "signatureTimestamp")?,
        is_admitted_to_signing: raw.is_admitted,
    })
}

/// Contract reverts surface as RPC errors whose message carries the reason.
fn classify_stamp_error(error: PortError) -> AppError {
    if let PortError::Rpc(rpc) = &error {
        if let Some(revert) = StampRevert::from_message(&rpc.message) {
            return AppError::Stamp(revert);
        }
    }
    handle_eth_error(error)
}
