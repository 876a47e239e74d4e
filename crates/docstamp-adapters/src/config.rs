use std::time::Duration;

use alloy::primitives::Address;

use docstamp_core::chains::admitted_chain_ids;
use docstamp_core::wrapper::ReceiptPolicy;
use docstamp_core::{ChainId, SessionSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

impl RuntimeProfile {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocstampConfig {
    pub runtime_profile: RuntimeProfile,
    pub eip1193_proxy_url: Option<String>,
    pub chain_id: ChainId,
    pub is_mainnet: bool,
    pub timestamp_address: Option<Address>,
    pub poseidon_hash_address: Option<Address>,
    pub chain_switch_settle_ms: u64,
    pub rpc_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_poll_attempts: u32,
    pub admitted_chain_ids: Option<Vec<ChainId>>,
}

impl Default for DocstampConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            eip1193_proxy_url: None,
            chain_id: ChainId::from(80_001u64),
            is_mainnet: false,
            timestamp_address: None,
            poseidon_hash_address: None,
            chain_switch_settle_ms: 1_000,
            rpc_timeout_ms: 15_000,
            receipt_poll_interval_ms: 1_000,
            receipt_poll_attempts: 120,
            admitted_chain_ids: None,
        }
    }
}

impl DocstampConfig {
    /// Reads `DOCSTAMP_*` variables over the defaults. Unparseable values are
    /// logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get("DOCSTAMP_RUNTIME_PROFILE") {
            match RuntimeProfile::parse(&raw) {
                Some(profile) => cfg.runtime_profile = profile,
                None => tracing::warn!(value = %raw, "unknown DOCSTAMP_RUNTIME_PROFILE"),
            }
        }
        cfg.eip1193_proxy_url = get("DOCSTAMP_EIP1193_PROXY_URL");
        if let Some(raw) = get("DOCSTAMP_CHAIN_ID") {
            cfg.chain_id = ChainId::new(raw.trim()).normalized();
        }
        if let Some(raw) = get("DOCSTAMP_IS_MAINNET") {
            cfg.is_mainnet = matches!(raw.trim(), "1" | "true" | "yes");
        }
        cfg.timestamp_address = parse_var(&get, "DOCSTAMP_CTR_ADDRESS_TIMESTAMP");
        cfg.poseidon_hash_address = parse_var(&get, "DOCSTAMP_CTR_ADDRESS_POSEIDON_HASH");
        if let Some(v) = parse_var(&get, "DOCSTAMP_CHAIN_SWITCH_SETTLE_MS") {
            cfg.chain_switch_settle_ms = v;
        }
        if let Some(v) = parse_var(&get, "DOCSTAMP_RPC_TIMEOUT_MS") {
            cfg.rpc_timeout_ms = v;
        }
        if let Some(v) = parse_var(&get, "DOCSTAMP_RECEIPT_POLL_INTERVAL_MS") {
            cfg.receipt_poll_interval_ms = v;
        }
        if let Some(v) = parse_var(&get, "DOCSTAMP_RECEIPT_POLL_ATTEMPTS") {
            cfg.receipt_poll_attempts = v;
        }
        cfg.admitted_chain_ids = get("DOCSTAMP_ADMITTED_CHAIN_IDS").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|id| ChainId::new(id).normalized())
                .collect()
        });
        cfg
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn admitted_chain_ids(&self) -> Vec<ChainId> {
        self.admitted_chain_ids
            .clone()
            .unwrap_or_else(|| admitted_chain_ids(self.is_mainnet))
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            chain_switch_settle: Duration::from_millis(self.chain_switch_settle_ms),
            receipts: ReceiptPolicy {
                poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
                max_attempts: self.receipt_poll_attempts,
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = get(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "ignoring invalid config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn defaults_target_testnets() {
        let cfg = DocstampConfig::from_lookup(|_| None);
        assert_eq!(cfg.runtime_profile, RuntimeProfile::Development);
        assert_eq!(cfg.chain_switch_settle_ms, 1_000);
        assert_eq!(
            cfg.admitted_chain_ids(),
            vec![ChainId::from(5u64), ChainId::from(80_001u64), ChainId::from(35_443u64)]
        );
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = DocstampConfig::from_lookup(lookup(&[
            ("DOCSTAMP_RUNTIME_PROFILE", "production"),
            ("DOCSTAMP_IS_MAINNET", "true"),
            ("DOCSTAMP_CHAIN_ID", "0x89"),
            ("DOCSTAMP_CTR_ADDRESS_TIMESTAMP", "0x1000000000000000000000000000000000000001"),
            ("DOCSTAMP_CHAIN_SWITCH_SETTLE_MS", "25"),
            ("DOCSTAMP_RECEIPT_POLL_ATTEMPTS", "not-a-number"),
            ("DOCSTAMP_ADMITTED_CHAIN_IDS", "137, 35441"),
        ]));
        assert!(cfg.strict_runtime_required());
        assert!(cfg.is_mainnet);
        assert_eq!(cfg.chain_id, ChainId::from(137u64));
        assert!(cfg.timestamp_address.is_some());
        assert_eq!(cfg.session_settings().chain_switch_settle, Duration::from_millis(25));
        assert_eq!(cfg.receipt_poll_attempts, 120);
        assert_eq!(
            cfg.admitted_chain_ids(),
            vec![ChainId::from(137u64), ChainId::from(35_441u64)]
        );
    }
}
