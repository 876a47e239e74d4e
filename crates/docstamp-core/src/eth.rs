//! Typed helpers over the raw EIP-1193 request surface.

use std::time::Duration;

use alloy::primitives::{Address, B256};
use serde_json::{json, Value};

use crate::domain::{AddEthereumChainParameter, ChainId, TxReceipt, TxRequest};
use crate::ports::{ClockPort, PortError, WalletPort};

pub fn connect_eth_accounts<W: WalletPort + ?Sized>(wallet: &W) -> Result<Vec<Address>, PortError> {
    let result = wallet.request("eth_requestAccounts", json!([]))?;
    parse_accounts(&result)
}

pub fn list_accounts<W: WalletPort + ?Sized>(wallet: &W) -> Result<Vec<Address>, PortError> {
    let result = wallet.request("eth_accounts", json!([]))?;
    parse_accounts(&result)
}

pub fn detect_network<W: WalletPort + ?Sized>(wallet: &W) -> Result<ChainId, PortError> {
    let result = wallet.request("eth_chainId", json!([]))?;
    parse_chain_id(&result)
}

pub fn request_switch_eth_chain<W: WalletPort + ?Sized>(
    wallet: &W,
    chain_id: &ChainId,
) -> Result<(), PortError> {
    let hex = chain_id
        .to_hex()
        .ok_or_else(|| PortError::Validation(format!("chain id is not numeric: {chain_id}")))?;
    wallet.request("wallet_switchEthereumChain", json!([{ "chainId": hex }]))?;
    Ok(())
}

pub fn request_add_eth_chain<W: WalletPort + ?Sized>(
    wallet: &W,
    config: &AddEthereumChainParameter,
) -> Result<(), PortError> {
    let param = serde_json::to_value(config)
        .map_err(|e| PortError::Validation(format!("network config serialization failed: {e}")))?;
    wallet.request("wallet_addEthereumChain", Value::Array(vec![param]))?;
    Ok(())
}

pub fn send_transaction<W: WalletPort + ?Sized>(
    wallet: &W,
    tx: &TxRequest,
) -> Result<B256, PortError> {
    let param = serde_json::to_value(tx)
        .map_err(|e| PortError::Validation(format!("tx serialization failed: {e}")))?;
    let result = wallet.request("eth_sendTransaction", Value::Array(vec![param]))?;
    let hash = result
        .as_str()
        .ok_or_else(|| PortError::Transport("eth_sendTransaction must return tx hash".to_owned()))?;
    hash.parse()
        .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")))
}

pub fn eth_call<W: WalletPort + ?Sized>(
    wallet: &W,
    to: Address,
    data: &[u8],
) -> Result<Vec<u8>, PortError> {
    let params = json!([
        { "to": to.to_string(), "data": format!("0x{}", alloy::hex::encode(data)) },
        "latest"
    ]);
    let result = wallet.request("eth_call", params)?;
    let raw = result
        .as_str()
        .ok_or_else(|| PortError::Transport("eth_call must return hex data".to_owned()))?;
    alloy::hex::decode(raw).map_err(|e| PortError::Validation(format!("invalid call data: {e}")))
}

pub fn transaction_receipt<W: WalletPort + ?Sized>(
    wallet: &W,
    hash: B256,
) -> Result<Option<TxReceipt>, PortError> {
    let result = wallet.request("eth_getTransactionReceipt", json!([hash.to_string()]))?;
    if result.is_null() {
        return Ok(None);
    }
    let transaction_hash = result
        .get("transactionHash")
        .and_then(Value::as_str)
        .ok_or_else(|| PortError::Transport("receipt missing transactionHash".to_owned()))?
        .parse()
        .map_err(|e| PortError::Validation(format!("invalid receipt hash: {e}")))?;
    let block_number = match result.get("blockNumber") {
        Some(Value::Null) | None => None,
        Some(value) => Some(parse_quantity(value)?),
    };
    // Pre-Byzantium receipts carry no status; treat them as successful.
    let success = match result.get("status") {
        Some(Value::Null) | None => true,
        Some(value) => parse_quantity(value)? == 1,
    };
    Ok(Some(TxReceipt {
        transaction_hash,
        block_number,
        success,
    }))
}

/// Polls for a receipt until it shows up or `attempts` polls have been made.
pub fn wait_for_receipt<W: WalletPort + ?Sized, C: ClockPort + ?Sized>(
    wallet: &W,
    clock: &C,
    hash: B256,
    interval: Duration,
    attempts: u32,
) -> Result<TxReceipt, PortError> {
    let started_ms = clock.now_ms()?;
    for attempt in 0..attempts {
        if let Some(receipt) = transaction_receipt(wallet, hash)? {
            let waited_ms = clock.now_ms()?.saturating_sub(started_ms);
            tracing::debug!(%hash, polls = attempt + 1, waited_ms, "transaction receipt received");
            return Ok(receipt);
        }
        if attempt + 1 < attempts {
            clock.sleep(interval);
        }
    }
    Err(PortError::Transport(format!(
        "transaction {hash} not mined after {attempts} polls"
    )))
}

pub fn explorer_tx_url(explorer_url: &str, tx_hash: &str) -> String {
    format!("{}/tx/{tx_hash}", explorer_url.trim_end_matches('/'))
}

pub fn explorer_address_url(explorer_url: &str, address: &str) -> String {
    format!("{}/address/{address}", explorer_url.trim_end_matches('/'))
}

pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, PortError> {
    let arr = value
        .as_array()
        .ok_or_else(|| PortError::Transport("accounts: array expected".to_owned()))?;
    arr.iter()
        .map(|item| {
            let raw = item
                .as_str()
                .ok_or_else(|| PortError::Transport("accounts: string expected".to_owned()))?;
            raw.parse()
                .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))
        })
        .collect()
}

/// Accepts `0x` hex or decimal strings and plain numbers; returns the
/// decimal form so ids compare equal whatever the wallet sent.
pub fn parse_chain_id(value: &Value) -> Result<ChainId, PortError> {
    parse_quantity(value).map(ChainId::from)
}

pub fn parse_quantity(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be string or number".to_owned()))?;
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex quantity: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid quantity: {e}")))
    }
}
