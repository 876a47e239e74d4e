use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use serde::Serialize;

use crate::chains::network_config_by_chain_id;
use crate::domain::{
    AddEthereumChainParameter, ChainId, DesignatedProvider, PendingTx, ProviderName, TxReceipt,
    TxRequest, WalletSnapshot,
};
use crate::error_handler::ErrorHandler;
use crate::errors::{handle_eth_error, AppError, Severity, UNRECOGNIZED_CHAIN};
use crate::eth;
use crate::ports::{ClockPort, PortError, WalletPort};
use crate::wrapper::{
    MetamaskWrapper, ObserverId, ProviderWrapper, ReceiptPolicy, SnapshotObserver,
};

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Pause after a successful switch/add so the wallet's own chainChanged
    /// push lands before callers read the chain id.
    pub chain_switch_settle: Duration,
    pub receipts: ReceiptPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            chain_switch_settle: Duration::from_millis(1_000),
            receipts: ReceiptPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchOutcome {
    Switched,
    Added,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub selected_provider: Option<ProviderName>,
    pub wallet: Option<WalletSnapshot>,
    pub is_connected: bool,
    pub is_connecting: bool,
    pub is_chain_switching: bool,
    pub chain_id_on_switching: Option<ChainId>,
}

/// Uniform connect/switch/sign surface over whichever wallet wrapper is live.
/// At most one wrapper exists at a time.
pub struct ProviderSession<W: WalletPort + 'static> {
    wrapper: Option<Box<dyn ProviderWrapper>>,
    active: Option<DesignatedProvider<W>>,
    selected_provider: Option<ProviderName>,
    is_connecting: bool,
    is_chain_switching: bool,
    chain_id_on_switching: Option<ChainId>,
    clock: Arc<dyn ClockPort>,
    errors: ErrorHandler,
    settings: SessionSettings,
}

impl<W: WalletPort + 'static> ProviderSession<W> {
    pub fn new(clock: Arc<dyn ClockPort>, errors: ErrorHandler, settings: SessionSettings) -> Self {
        Self {
            wrapper: None,
            active: None,
            selected_provider: None,
            is_connecting: false,
            is_chain_switching: false,
            chain_id_on_switching: None,
            clock,
            errors,
            settings,
        }
    }

    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    pub fn selected_provider(&self) -> Option<ProviderName> {
        self.selected_provider
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.wrapper.as_ref().map(|w| w.chain_id())
    }

    pub fn selected_address(&self) -> Option<Address> {
        self.wrapper.as_ref().and_then(|w| w.selected_address())
    }

    pub fn is_connected(&self) -> bool {
        self.wrapper.as_ref().is_some_and(|w| w.is_connected())
    }

    pub fn is_connecting(&self) -> bool {
        self.is_connecting
    }

    pub fn is_chain_switching(&self) -> bool {
        self.is_chain_switching
    }

    pub fn chain_id_on_switching(&self) -> Option<&ChainId> {
        self.chain_id_on_switching.as_ref()
    }

    pub fn has_wrapper(&self) -> bool {
        self.wrapper.is_some()
    }

    /// Wallet behind the live wrapper, for building contract clients.
    pub fn wallet(&self) -> Option<Arc<W>> {
        self.wrapper
            .as_ref()
            .and(self.active.as_ref())
            .map(|p| Arc::clone(&p.instance))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selected_provider: self.selected_provider,
            wallet: self.wrapper.as_ref().map(|w| w.snapshot()),
            is_connected: self.is_connected(),
            is_connecting: self.is_connecting,
            is_chain_switching: self.is_chain_switching,
            chain_id_on_switching: self.chain_id_on_switching.clone(),
        }
    }

    pub fn init(&mut self, provider: &DesignatedProvider<W>) -> Result<(), AppError> {
        let wrapper: Box<dyn ProviderWrapper> = match provider.name {
            ProviderName::Metamask => Box::new(MetamaskWrapper::new(
                Arc::clone(&provider.instance),
                Arc::clone(&self.clock),
                self.errors.clone(),
                self.settings.receipts,
            )),
            other => return Err(AppError::InvalidProvider(other.to_string())),
        };
        // Tear the previous wrapper (and its listeners) down first.
        self.wrapper = None;
        self.wrapper = Some(wrapper);
        self.active = Some(provider.clone());
        self.selected_provider = Some(provider.name);
        tracing::info!(provider = %provider.name, "provider initialized");

        match self.wrapper.as_mut() {
            Some(w) => w.init(),
            None => Err(AppError::ProviderWrapperMethodNotFound),
        }
    }

    /// Requests account access. Without a live wrapper the session is rebuilt
    /// from the detected provider matching the selected provider name.
    pub fn connect(&mut self, providers: &[DesignatedProvider<W>]) -> Result<(), AppError> {
        self.is_connecting = true;
        let result = self.connect_inner(providers);
        self.is_connecting = false;
        result
    }

    fn connect_inner(&mut self, providers: &[DesignatedProvider<W>]) -> Result<(), AppError> {
        if let Some(wrapper) = self.wrapper.as_mut() {
            return wrapper.connect();
        }
        let Some(selected) = self.selected_provider else {
            return Ok(());
        };
        match providers.iter().find(|p| p.name == selected) {
            Some(provider) => self.init(&provider.clone()),
            None => {
                self.errors
                    .process_without_feedback(&AppError::InvalidProvider(selected.to_string()));
                Ok(())
            }
        }
    }

    pub fn disconnect(&mut self) -> Result<(), AppError> {
        if let Some(w) = self.wrapper.as_mut().filter(|w| w.supports_disconnect()) {
            return w.disconnect();
        }
        self.wrapper = None;
        self.active = None;
        tracing::info!("provider wrapper dropped");
        Ok(())
    }

    pub fn switch_chain(&mut self, chain_id: &ChainId) -> Result<(), AppError> {
        self.wrapper_mut()?.switch_chain(chain_id)
    }

    pub fn add_chain(&mut self, config: &AddEthereumChainParameter) -> Result<(), AppError> {
        self.wrapper_mut()?.add_chain(config)
    }

    /// Switches to `chain_id`, registering the network first when the wallet
    /// does not know it. Failures are reported, not returned; the switching
    /// flags are cleared on every path.
    pub fn try_switch_or_add_chain(&mut self, chain_id: &ChainId) -> SwitchOutcome {
        self.is_chain_switching = true;
        self.chain_id_on_switching = Some(chain_id.clone());

        let outcome = self.switch_or_add(chain_id);

        self.chain_id_on_switching = None;
        self.is_chain_switching = false;
        tracing::info!(%chain_id, ?outcome, "chain switch finished");
        outcome
    }

    fn switch_or_add(&mut self, chain_id: &ChainId) -> SwitchOutcome {
        let switch_error = match self.switch_chain(chain_id) {
            Ok(()) => {
                self.settle();
                return SwitchOutcome::Switched;
            }
            Err(e) if e.severity() == Severity::Silent => {
                self.errors.report(&e);
                return SwitchOutcome::Rejected;
            }
            Err(e) => e,
        };

        let added = match network_config_by_chain_id(chain_id) {
            Some(config) => {
                tracing::debug!(error = %switch_error, "switch failed, trying add-chain");
                self.add_chain(&config)
            }
            // Without a config only an unknown chain maps to ChainNotFound;
            // any other wallet failure is reported as the wallet gave it.
            None if is_unrecognized_chain(&switch_error) => {
                Err(AppError::ChainNotFound(chain_id.clone()))
            }
            None => Err(switch_error),
        };
        match added {
            Ok(()) => {
                self.settle();
                SwitchOutcome::Added
            }
            Err(e) => {
                self.errors.report(&e);
                match e.severity() {
                    Severity::Silent => SwitchOutcome::Rejected,
                    Severity::Visible => SwitchOutcome::Failed,
                }
            }
        }
    }

    fn settle(&self) {
        self.clock.sleep(self.settings.chain_switch_settle);
    }

    pub fn sign_and_send_tx(&mut self, tx: &TxRequest) -> Result<TxReceipt, AppError> {
        self.wrapper_mut()?.sign_and_send_transaction(tx)
    }

    /// Waits for a transaction submitted through a contract client.
    pub fn wait_for_transaction(&self, pending: &PendingTx) -> Result<TxReceipt, AppError> {
        let wallet = self.wallet().ok_or(AppError::ProviderWrapperMethodNotFound)?;
        let receipt = eth::wait_for_receipt(
            wallet.as_ref(),
            self.clock.as_ref(),
            pending.hash,
            self.settings.receipts.poll_interval,
            self.settings.receipts.max_attempts,
        )
        .map_err(handle_eth_error)?;
        if !receipt.success {
            return Err(AppError::TransactionReverted(pending.hash));
        }
        Ok(receipt)
    }

    pub fn hash_from_tx_response(&self, receipt: &TxReceipt) -> Result<B256, AppError> {
        Ok(self.wrapper_ref()?.hash_from_tx_response(receipt))
    }

    pub fn tx_url(&self, explorer_url: &str, tx_hash: B256) -> Result<String, AppError> {
        Ok(self.wrapper_ref()?.tx_url(explorer_url, tx_hash))
    }

    pub fn address_url(&self, explorer_url: &str, address: Address) -> Result<String, AppError> {
        Ok(self.wrapper_ref()?.address_url(explorer_url, address))
    }

    pub fn observe(&self, observer: SnapshotObserver) -> Result<ObserverId, AppError> {
        Ok(self.wrapper_ref()?.observe(observer))
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.wrapper.as_ref().is_some_and(|w| w.unobserve(id))
    }

    fn wrapper_ref(&self) -> Result<&dyn ProviderWrapper, AppError> {
        self.wrapper
            .as_deref()
            .ok_or(AppError::ProviderWrapperMethodNotFound)
    }

    fn wrapper_mut(&mut self) -> Result<&mut Box<dyn ProviderWrapper>, AppError> {
        self.wrapper
            .as_mut()
            .ok_or(AppError::ProviderWrapperMethodNotFound)
    }
}

fn is_unrecognized_chain(error: &AppError) -> bool {
    matches!(error, AppError::Port(PortError::Rpc(rpc)) if rpc.code == UNRECOGNIZED_CHAIN)
}
