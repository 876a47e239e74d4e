use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use serde_json::Value;
use thiserror::Error;

use crate::contracts::{RawSignerInfo, RawStampInfo};
use crate::domain::{PendingTx, WalletEvent};
use crate::errors::RpcError;
use crate::zkp::{ZkpPoints, ZkpProof};

#[derive(Debug, Clone, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

pub type WalletListener = Arc<dyn Fn(&WalletEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// EIP-1193 wallet surface: JSON-RPC requests plus pushed events.
pub trait WalletPort: Send + Sync {
    fn request(&self, method: &str, params: Value) -> Result<Value, PortError>;
    fn subscribe(&self, listener: WalletListener) -> Result<SubscriptionId, PortError>;
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError>;

    /// Marker flags (`isMetaMask`, ...) advertised by the injected wallet.
    fn check_flags(&self) -> Vec<String> {
        Vec::new()
    }
}

pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> Result<u64, PortError>;
    fn sleep(&self, duration: Duration);
}

/// User-facing notification sink.
pub trait FeedbackPort: Send + Sync {
    fn notify_error(&self, message: &str);
}

pub trait ProofPort {
    fn generate(&self, secret_hash: B256, signer: Address) -> Result<ZkpProof, PortError>;
}

pub trait TimestampPort {
    fn get_stamp_info_with_pagination(
        &self,
        public_hash: B256,
        offset: U256,
        limit: U256,
    ) -> Result<RawStampInfo, PortError>;
    fn get_user_info(&self, user: Address, public_hash: B256)
        -> Result<RawSignerInfo, PortError>;
    fn fee(&self) -> Result<U256, PortError>;
    fn create_stamp(
        &self,
        public_hash: B256,
        is_sign: bool,
        indicated_addresses: &[Address],
        zkp_points: &ZkpPoints,
        value: U256,
    ) -> Result<PendingTx, PortError>;
    fn sign(&self, public_hash: B256) -> Result<PendingTx, PortError>;
}

pub trait PoseidonHashPort {
    fn poseidon(&self, input: B256) -> Result<B256, PortError>;
}

pub trait Erc20Port {
    fn name(&self) -> Result<String, PortError>;
    fn symbol(&self) -> Result<String, PortError>;
    fn decimals(&self) -> Result<u8, PortError>;
    fn owner(&self) -> Result<Address, PortError>;
    fn total_supply(&self) -> Result<U256, PortError>;
    fn balance_of(&self, account: Address) -> Result<U256, PortError>;
    fn allowance(&self, owner: Address, spender: Address) -> Result<U256, PortError>;
    fn approve(&self, spender: Address, amount: U256) -> Result<PendingTx, PortError>;
    fn increase_allowance(&self, spender: Address, added: U256) -> Result<PendingTx, PortError>;
    fn decrease_allowance(
        &self,
        spender: Address,
        subtracted: U256,
    ) -> Result<PendingTx, PortError>;
    fn mint(&self, to: Address, amount: U256) -> Result<PendingTx, PortError>;
    fn transfer(&self, to: Address, amount: U256) -> Result<PendingTx, PortError>;
    fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<PendingTx, PortError>;
    fn renounce_ownership(&self) -> Result<PendingTx, PortError>;
}
