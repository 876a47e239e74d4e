use std::fmt;

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::ChainId;
use crate::ports::PortError;

// EIP-1193 provider errors.
pub const USER_REJECTED_REQUEST: i64 = 4001;
pub const UNAUTHORIZED: i64 = 4100;
pub const UNSUPPORTED_METHOD: i64 = 4200;
pub const DISCONNECTED: i64 = 4900;
pub const CHAIN_DISCONNECTED: i64 = 4901;
// EIP-3085: returned by wallet_switchEthereumChain for unknown chains.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

// EIP-1474 JSON-RPC errors.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const INVALID_INPUT: i64 = -32000;
pub const RESOURCE_NOT_FOUND: i64 = -32001;
pub const RESOURCE_UNAVAILABLE: i64 = -32002;
pub const TRANSACTION_REJECTED: i64 = -32003;
pub const METHOD_NOT_SUPPORTED: i64 = -32004;
pub const LIMIT_EXCEEDED: i64 = -32005;
pub const JSON_RPC_VERSION_NOT_SUPPORTED: i64 = -32006;

/// Error object returned by a wallet for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("rpc error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Logged only.
    Silent,
    /// Logged and shown to the user.
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    UserRejectedRequest,
    Unauthorized,
    UnsupportedMethod,
    Disconnected,
    ChainDisconnected,
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    InvalidInput,
    ResourceNotFound,
    ResourceUnavailable,
    TransactionRejected,
    MethodNotSupported,
    LimitExceeded,
    JsonRpcVersionNotSupported,
}

impl ProviderErrorKind {
    pub const ALL: [ProviderErrorKind; 17] = [
        Self::UserRejectedRequest,
        Self::Unauthorized,
        Self::UnsupportedMethod,
        Self::Disconnected,
        Self::ChainDisconnected,
        Self::ParseError,
        Self::InvalidRequest,
        Self::MethodNotFound,
        Self::InvalidParams,
        Self::InternalError,
        Self::InvalidInput,
        Self::ResourceNotFound,
        Self::ResourceUnavailable,
        Self::TransactionRejected,
        Self::MethodNotSupported,
        Self::LimitExceeded,
        Self::JsonRpcVersionNotSupported,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        let kind = match code {
            USER_REJECTED_REQUEST => Self::UserRejectedRequest,
            UNAUTHORIZED => Self::Unauthorized,
            UNSUPPORTED_METHOD => Self::UnsupportedMethod,
            DISCONNECTED => Self::Disconnected,
            CHAIN_DISCONNECTED => Self::ChainDisconnected,
            PARSE_ERROR => Self::ParseError,
            INVALID_REQUEST => Self::InvalidRequest,
            METHOD_NOT_FOUND => Self::MethodNotFound,
            INVALID_PARAMS => Self::InvalidParams,
            INTERNAL_ERROR => Self::InternalError,
            INVALID_INPUT => Self::InvalidInput,
            RESOURCE_NOT_FOUND => Self::ResourceNotFound,
            RESOURCE_UNAVAILABLE => Self::ResourceUnavailable,
            TRANSACTION_REJECTED => Self::TransactionRejected,
            METHOD_NOT_SUPPORTED => Self::MethodNotSupported,
            LIMIT_EXCEEDED => Self::LimitExceeded,
            JSON_RPC_VERSION_NOT_SUPPORTED => Self::JsonRpcVersionNotSupported,
            _ => return None,
        };
        Some(kind)
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::UserRejectedRequest => USER_REJECTED_REQUEST,
            Self::Unauthorized => UNAUTHORIZED,
            Self::UnsupportedMethod => UNSUPPORTED_METHOD,
            Self::Disconnected => DISCONNECTED,
            Self::ChainDisconnected => CHAIN_DISCONNECTED,
            Self::ParseError => PARSE_ERROR,
            Self::InvalidRequest => INVALID_REQUEST,
            Self::MethodNotFound => METHOD_NOT_FOUND,
            Self::InvalidParams => INVALID_PARAMS,
            Self::InternalError => INTERNAL_ERROR,
            Self::InvalidInput => INVALID_INPUT,
            Self::ResourceNotFound => RESOURCE_NOT_FOUND,
            Self::ResourceUnavailable => RESOURCE_UNAVAILABLE,
            Self::TransactionRejected => TRANSACTION_REJECTED,
            Self::MethodNotSupported => METHOD_NOT_SUPPORTED,
            Self::LimitExceeded => LIMIT_EXCEEDED,
            Self::JsonRpcVersionNotSupported => JSON_RPC_VERSION_NOT_SUPPORTED,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::UserRejectedRequest => "provider-user-rejected-request",
            Self::Unauthorized => "provider-unauthorized",
            Self::UnsupportedMethod => "provider-unsupported-method",
            Self::Disconnected => "provider-disconnected",
            Self::ChainDisconnected => "provider-chain-disconnected",
            Self::ParseError => "provider-parse-error",
            Self::InvalidRequest => "provider-invalid-request",
            Self::MethodNotFound => "provider-method-not-found",
            Self::InvalidParams => "provider-invalid-params",
            Self::InternalError => "provider-internal-error",
            Self::InvalidInput => "provider-invalid-input",
            Self::ResourceNotFound => "provider-resource-not-found",
            Self::ResourceUnavailable => "provider-resource-unavailable",
            Self::TransactionRejected => "provider-transaction-rejected",
            Self::MethodNotSupported => "provider-method-not-supported",
            Self::LimitExceeded => "provider-limit-exceeded",
            Self::JsonRpcVersionNotSupported => "provider-json-rpc-version-not-supported",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UserRejectedRequest => Severity::Silent,
            _ => Severity::Visible,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

/// Revert reasons raised by the timestamping contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampRevert {
    HashCollision,
    AlreadySigned,
    NotAdmitted,
}

impl StampRevert {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::HashCollision => "execution reverted: TimeStamping: Hash collision.",
            Self::AlreadySigned => "execution reverted: TimeStamping: User has signed already.",
            Self::NotAdmitted => "execution reverted: TimeStamping: User is not admitted.",
        }
    }

    pub fn from_message(message: &str) -> Option<Self> {
        [Self::HashCollision, Self::AlreadySigned, Self::NotAdmitted]
            .into_iter()
            .find(|revert| message.contains(revert.reason()))
    }
}

impl fmt::Display for StampRevert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Port(#[from] PortError),
    #[error("provider wrapper method not found")]
    ProviderWrapperMethodNotFound,
    #[error("invalid provider: {0}")]
    InvalidProvider(String),
    #[error("no network config for chain {0}")]
    ChainNotFound(ChainId),
    #[error("contract instance unavailable")]
    ContractInstanceUnavailable,
    #[error("transaction {0} reverted")]
    TransactionReverted(B256),
    #[error("stamp rejected: {0}")]
    Stamp(StampRevert),
}

impl AppError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Provider(e) => e.kind.severity(),
            _ => Severity::Visible,
        }
    }

    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::Provider(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Key of the localized message shown for this error.
    pub fn message_key(&self) -> String {
        let slug = match self {
            Self::Provider(e) => e.kind.slug(),
            Self::ProviderWrapperMethodNotFound => "provider-wrapper-method-not-found",
            Self::InvalidProvider(_) => "provider-not-supported-error",
            Self::ChainNotFound(_) => "provider-chain-not-found-error",
            Self::ContractInstanceUnavailable => "contract-instance-unavailable",
            Self::Stamp(StampRevert::HashCollision) => "stamp-hash-collision",
            Self::Stamp(StampRevert::AlreadySigned) => "stamp-already-signed",
            Self::Stamp(StampRevert::NotAdmitted) => "stamp-not-admitted",
            Self::Port(_) | Self::TransactionReverted(_) => "default",
        };
        format!("errors.{slug}")
    }
}

/// Reclassifies a wallet failure into the typed provider taxonomy. Failures
/// that carry no known EIP-1193/EIP-1474 code are passed through unchanged.
pub fn handle_eth_error(error: PortError) -> AppError {
    match error {
        PortError::Rpc(rpc) => match ProviderErrorKind::from_code(rpc.code) {
            Some(kind) => AppError::Provider(ProviderError {
                kind,
                message: rpc.message,
            }),
            None => AppError::Port(PortError::Rpc(rpc)),
        },
        other => AppError::Port(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_kinds() {
        for kind in ProviderErrorKind::ALL {
            assert_eq!(ProviderErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ProviderErrorKind::from_code(UNRECOGNIZED_CHAIN), None);
    }

    #[test]
    fn only_user_rejection_is_silent() {
        let silent: Vec<_> = ProviderErrorKind::ALL
            .into_iter()
            .filter(|k| k.severity() == Severity::Silent)
            .collect();
        assert_eq!(silent, vec![ProviderErrorKind::UserRejectedRequest]);
        assert_eq!(
            AppError::ContractInstanceUnavailable.severity(),
            Severity::Visible
        );
    }

    #[test]
    fn revert_reasons_are_recognized_inside_longer_messages() {
        let msg = "Error: VM Exception: execution reverted: TimeStamping: Hash collision.";
        assert_eq!(StampRevert::from_message(msg), Some(StampRevert::HashCollision));
        assert_eq!(StampRevert::from_message("execution reverted"), None);
    }
}
