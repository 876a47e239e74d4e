use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

use alloy::primitives::{address, keccak256, Address, B256};
use serde_json::{json, Value};

use docstamp_core::domain::{ChainId, WalletEvent, METAMASK_CHECK_FLAG};
use docstamp_core::errors::{
    RpcError, INVALID_PARAMS, METHOD_NOT_FOUND, UNAUTHORIZED, UNRECOGNIZED_CHAIN,
};
use docstamp_core::eth::{parse_accounts, parse_quantity};
use docstamp_core::ports::{PortError, SubscriptionId, WalletListener, WalletPort};

use crate::DocstampConfig;

/// EIP-1193 wallet. Runs against a JSON-RPC proxy when one is configured and
/// against an in-memory wallet otherwise; the production profile refuses the
/// in-memory fallback.
#[derive(Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
    listeners: Arc<Mutex<Listeners>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Clone)]
struct ProviderState {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    check_flags: Vec<String>,
    tx_seq: u64,
    receipts: HashMap<B256, Value>,
    failures: HashMap<String, VecDeque<RpcError>>,
    responses: HashMap<String, Value>,
    requests: Vec<(String, Value)>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: vec![address!("1000000000000000000000000000000000000001")],
            authorized: false,
            chain_id: 1,
            // Ethereum networks ship with every wallet.
            known_chains: [1, 5].into_iter().collect(),
            check_flags: vec![METAMASK_CHECK_FLAG.to_owned()],
            tx_seq: 0,
            receipts: HashMap::new(),
            failures: HashMap::new(),
            responses: HashMap::new(),
            requests: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, WalletListener)>,
}

impl fmt::Debug for Eip1193Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eip1193Adapter")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(DocstampConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: DocstampConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = std::time::Duration::from_millis(config.rpc_timeout_ms);
            match reqwest::blocking::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client in production profile: {e}"
                        ))
                    } else {
                        tracing::warn!(error = %e, "proxy client failed, using in-memory wallet");
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };
        tracing::debug!(?mode, "eip1193 adapter mode");

        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// In-memory wallet regardless of environment.
    pub fn deterministic() -> Self {
        Self::with_config(DocstampConfig::default())
    }

    pub fn with_check_flags(self, flags: &[&str]) -> Self {
        if let Ok(mut g) = self.state.lock() {
            g.check_flags = flags.iter().map(|f| (*f).to_owned()).collect();
        }
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|g| g.entries.len()).unwrap_or(0)
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.mode, ProviderMode::Proxy(_))
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    /// Calls every listener. Never invoked with the state lock held, so
    /// listeners may issue requests.
    fn emit(&self, event: WalletEvent) {
        let listeners: Vec<WalletListener> = match self.listeners.lock() {
            Ok(g) => g.entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        tracing::debug!(event = event.name(), listeners = listeners.len(), "emit wallet event");
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        {
            let mut g = self.lock_state()?;
            g.authorized = !accounts.is_empty();
            g.accounts = accounts.clone();
        }
        self.emit(WalletEvent::AccountsChanged(accounts));
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        {
            let mut g = self.lock_state()?;
            g.chain_id = chain_id;
            g.known_chains.insert(chain_id);
        }
        self.emit(WalletEvent::ChainChanged(ChainId::from(chain_id)));
        Ok(())
    }

    pub fn debug_inject_disconnect(&self, error: Option<RpcError>) -> Result<(), PortError> {
        self.emit(WalletEvent::Disconnect(error));
        Ok(())
    }

    /// Queues a wallet error returned by the next call of `method`.
    pub fn debug_fail_next(&self, method: &str, error: RpcError) -> Result<(), PortError> {
        self.lock_state()?
            .failures
            .entry(method.to_owned())
            .or_default()
            .push_back(error);
        Ok(())
    }

    /// Fixes the result of every later call of `method`.
    pub fn debug_respond(&self, method: &str, result: Value) -> Result<(), PortError> {
        self.lock_state()?
            .responses
            .insert(method.to_owned(), result);
        Ok(())
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Result<Vec<(String, Value)>, PortError> {
        Ok(self.lock_state()?.requests.clone())
    }

    pub fn requested_methods(&self) -> Result<Vec<String>, PortError> {
        Ok(self
            .lock_state()?
            .requests
            .iter()
            .map(|(method, _)| method.clone())
            .collect())
    }

    fn deterministic_request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let mut events = Vec::new();
        let result = {
            let mut g = self.lock_state()?;
            g.requests.push((method.to_owned(), params.clone()));
            if let Some(err) = g.failures.get_mut(method).and_then(VecDeque::pop_front) {
                return Err(PortError::Rpc(err));
            }
            if let Some(fixed) = g.responses.get(method) {
                return Ok(fixed.clone());
            }
            deterministic_dispatch(&mut g, method, &params, &mut events)
        };
        for event in events {
            self.emit(event);
        }
        result
    }

    fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            ProviderMode::Proxy(proxy) => proxy,
            ProviderMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => {
                return Err(PortError::NotImplemented(
                    "eip1193 proxy runtime not enabled",
                ))
            }
        };

        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            // Wallet errors keep their EIP-1193 code for the session to classify.
            let rpc: RpcError = serde_json::from_value(err.clone()).map_err(|_| {
                PortError::Transport(format!("eip1193 proxy returned error: {err}"))
            })?;
            return Err(PortError::Rpc(rpc));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }

    /// Proxied wallets cannot push, so events are derived from the responses
    /// that reveal a new account set or chain.
    fn proxy_request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let result = self.proxy_call(method, params.clone())?;
        let event = match method {
            "eth_requestAccounts" => {
                let accounts = parse_accounts(&result)?;
                let mut g = self.lock_state()?;
                (g.accounts != accounts || !g.authorized).then(|| {
                    g.accounts = accounts.clone();
                    g.authorized = true;
                    WalletEvent::AccountsChanged(accounts)
                })
            }
            "wallet_switchEthereumChain" | "wallet_addEthereumChain" => {
                // The request already succeeded; a failed read-back must not
                // turn it into an error. Fall back to the requested chain.
                let observed = self
                    .proxy_call("eth_chainId", json!([]))
                    .and_then(|value| parse_quantity(&value))
                    .or_else(|e| {
                        tracing::warn!(method, error = %e, "chain id read-back failed");
                        chain_id_param(&params)
                    })
                    .ok();
                let mut g = self.lock_state()?;
                observed.filter(|id| g.chain_id != *id).map(|id| {
                    g.chain_id = id;
                    WalletEvent::ChainChanged(ChainId::from(id))
                })
            }
            "eth_chainId" => {
                self.lock_state()?.chain_id = parse_quantity(&result)?;
                None
            }
            "eth_accounts" => {
                let accounts = parse_accounts(&result)?;
                let mut g = self.lock_state()?;
                g.authorized = !accounts.is_empty();
                g.accounts = accounts;
                None
            }
            _ => None,
        };
        if let Some(event) = event {
            self.emit(event);
        }
        Ok(result)
    }
}

fn rpc(code: i64, message: impl Into<String>) -> PortError {
    PortError::Rpc(RpcError::new(code, message))
}

fn chain_id_param(params: &Value) -> Result<u64, PortError> {
    let raw = params
        .get(0)
        .and_then(|p| p.get("chainId"))
        .ok_or_else(|| rpc(INVALID_PARAMS, "missing chainId"))?;
    parse_quantity(raw).map_err(|e| rpc(INVALID_PARAMS, e.to_string()))
}

fn deterministic_dispatch(
    g: &mut ProviderState,
    method: &str,
    params: &Value,
    events: &mut Vec<WalletEvent>,
) -> Result<Value, PortError> {
    match method {
        "eth_requestAccounts" => {
            if !g.authorized {
                g.authorized = true;
                events.push(WalletEvent::AccountsChanged(g.accounts.clone()));
            }
            Ok(json!(g.accounts))
        }
        "eth_accounts" => {
            let visible: &[Address] = if g.authorized { &g.accounts } else { &[] };
            Ok(json!(visible))
        }
        "eth_chainId" => Ok(json!(format!("{:#x}", g.chain_id))),
        "wallet_switchEthereumChain" => {
            let target = chain_id_param(params)?;
            if !g.known_chains.contains(&target) {
                return Err(rpc(
                    UNRECOGNIZED_CHAIN,
                    format!("Unrecognized chain ID \"{target:#x}\". Try adding the chain using wallet_addEthereumChain first."),
                ));
            }
            if g.chain_id != target {
                g.chain_id = target;
                events.push(WalletEvent::ChainChanged(ChainId::from(target)));
            }
            Ok(Value::Null)
        }
        "wallet_addEthereumChain" => {
            let target = chain_id_param(params)?;
            g.known_chains.insert(target);
            // Wallets offer to switch right after adding.
            if g.chain_id != target {
                g.chain_id = target;
                events.push(WalletEvent::ChainChanged(ChainId::from(target)));
            }
            Ok(Value::Null)
        }
        "eth_sendTransaction" => {
            if !g.authorized {
                return Err(rpc(UNAUTHORIZED, "The requested account has not been authorized"));
            }
            g.tx_seq = g.tx_seq.saturating_add(1);
            let mut seed = g.tx_seq.to_be_bytes().to_vec();
            seed.extend_from_slice(params.to_string().as_bytes());
            let hash = keccak256(seed);
            g.receipts.insert(
                hash,
                json!({
                    "transactionHash": hash.to_string(),
                    "blockNumber": format!("{:#x}", g.tx_seq),
                    "status": "0x1",
                }),
            );
            Ok(json!(hash.to_string()))
        }
        "eth_getTransactionReceipt" => {
            let hash: Option<B256> = params
                .get(0)
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse().ok());
            Ok(hash
                .and_then(|h| g.receipts.get(&h).cloned())
                .unwrap_or(Value::Null))
        }
        "eth_call" => Err(PortError::NotImplemented(
            "eth_call needs the proxy runtime or a fixed response",
        )),
        other => Err(rpc(METHOD_NOT_FOUND, format!("method {other} not found"))),
    }
}

impl WalletPort for Eip1193Adapter {
    fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        self.check_mode()?;
        tracing::trace!(method, "wallet request");
        match self.mode {
            ProviderMode::Proxy(_) => self.proxy_request(method, params),
            _ => self.deterministic_request(method, params),
        }
    }

    fn subscribe(&self, listener: WalletListener) -> Result<SubscriptionId, PortError> {
        self.check_mode()?;
        let mut g = self
            .listeners
            .lock()
            .map_err(|e| PortError::Transport(format!("listener lock poisoned: {e}")))?;
        g.next_id = g.next_id.saturating_add(1);
        let id = SubscriptionId(g.next_id);
        g.entries.push((id, listener));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError> {
        let mut g = self
            .listeners
            .lock()
            .map_err(|e| PortError::Transport(format!("listener lock poisoned: {e}")))?;
        let before = g.entries.len();
        g.entries.retain(|(entry, _)| *entry != id);
        if g.entries.len() == before {
            return Err(PortError::NotFound(format!("subscription {}", id.0)));
        }
        Ok(())
    }

    fn check_flags(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|g| g.check_flags.clone())
            .unwrap_or_default()
    }
}
