use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::errors::RpcError;

/// Network identifier. Values coming from different sources (decimal config,
/// hex RPC responses) are normalized to decimal and compared as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_u64(&self) -> Option<u64> {
        let raw = self.0.trim();
        if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16).ok()
        } else {
            raw.parse().ok()
        }
    }

    /// Decimal form of a hex or decimal id; non-numeric ids are kept as is.
    pub fn normalized(self) -> Self {
        match self.as_u64() {
            Some(n) => Self::from(n),
            None => self,
        }
    }

    /// `0x`-prefixed quantity as expected by `wallet_switchEthereumChain`.
    pub fn to_hex(&self) -> Option<String> {
        self.as_u64().map(|n| format!("{n:#x}"))
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for ChainId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ChainId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Fallback,
    Metamask,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Metamask => "metamask",
        }
    }

    /// Maps the boolean marker an injected wallet advertises to the
    /// provider kind the application knows how to wrap.
    pub fn from_check_flags<S: AsRef<str>>(flags: &[S]) -> Self {
        if flags.iter().any(|f| f.as_ref() == METAMASK_CHECK_FLAG) {
            Self::Metamask
        } else {
            Self::Fallback
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const METAMASK_CHECK_FLAG: &str = "isMetaMask";

/// A detected wallet with the name the application designated for it.
#[derive(Debug)]
pub struct DesignatedProvider<W> {
    pub name: ProviderName,
    pub instance: Arc<W>,
}

impl<W> Clone for DesignatedProvider<W> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            instance: Arc::clone(&self.instance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// EIP-3085 `wallet_addEthereumChain` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
    Disconnect(Option<RpcError>),
}

impl WalletEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountsChanged(_) => "accountsChanged",
            Self::ChainChanged(_) => "chainChanged",
            Self::Disconnect(_) => "disconnect",
        }
    }
}

/// Observable wallet state held by a provider wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletSnapshot {
    pub chain_id: ChainId,
    pub selected_address: Option<Address>,
}

impl WalletSnapshot {
    pub fn is_connected(&self) -> bool {
        !self.chain_id.is_empty() && self.selected_address.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
}

/// Handle of a submitted transaction that has not been waited on yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingTx {
    pub hash: B256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids_compare_as_strings() {
        assert_eq!(ChainId::from(137u64), ChainId::from("137"));
        assert_ne!(ChainId::from("0x89"), ChainId::from(137u64));
        assert_eq!(ChainId::from("0x89").as_u64(), Some(137));
        assert_eq!(ChainId::from(80001u64).to_hex().as_deref(), Some("0x13881"));
        assert_eq!(ChainId::from("polygon").to_hex(), None);
    }

    #[test]
    fn snapshot_requires_both_fields() {
        let mut snapshot = WalletSnapshot::default();
        assert!(!snapshot.is_connected());
        snapshot.chain_id = ChainId::from(5u64);
        assert!(!snapshot.is_connected());
        snapshot.selected_address = Some(Address::repeat_byte(0x11));
        assert!(snapshot.is_connected());
        snapshot.chain_id = ChainId::default();
        assert!(!snapshot.is_connected());
    }

    #[test]
    fn provider_name_follows_metamask_flag() {
        assert_eq!(
            ProviderName::from_check_flags(&["isMetaMask", "isWeb3"]),
            ProviderName::Metamask
        );
        assert_eq!(
            ProviderName::from_check_flags(&["isBraveWallet"]),
            ProviderName::Fallback
        );
    }
}
