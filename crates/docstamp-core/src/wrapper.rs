use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use alloy::primitives::{Address, B256};

use crate::domain::{
    AddEthereumChainParameter, ChainId, ProviderName, TxReceipt, TxRequest, WalletEvent,
    WalletSnapshot,
};
use crate::error_handler::ErrorHandler;
use crate::errors::{handle_eth_error, AppError};
use crate::eth;
use crate::ports::{ClockPort, PortError, SubscriptionId, WalletListener, WalletPort};

pub type SnapshotObserver = Arc<dyn Fn(&WalletSnapshot) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperPhase {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1_000),
            max_attempts: 120,
        }
    }
}

/// Capability set every concrete wallet wrapper offers to the session.
pub trait ProviderWrapper: Send {
    fn name(&self) -> ProviderName;
    fn phase(&self) -> WrapperPhase;
    fn snapshot(&self) -> WalletSnapshot;

    fn chain_id(&self) -> ChainId {
        self.snapshot().chain_id
    }

    fn selected_address(&self) -> Option<Address> {
        self.snapshot().selected_address
    }

    fn is_connected(&self) -> bool {
        self.snapshot().is_connected()
    }

    fn init(&mut self) -> Result<(), AppError>;
    fn connect(&mut self) -> Result<(), AppError>;
    fn switch_chain(&mut self, chain_id: &ChainId) -> Result<(), AppError>;

    fn add_chain(&mut self, _config: &AddEthereumChainParameter) -> Result<(), AppError> {
        Err(AppError::ProviderWrapperMethodNotFound)
    }

    fn sign_and_send_transaction(&mut self, tx: &TxRequest) -> Result<TxReceipt, AppError>;

    fn hash_from_tx_response(&self, receipt: &TxReceipt) -> B256 {
        receipt.transaction_hash
    }

    fn tx_url(&self, explorer_url: &str, tx_hash: B256) -> String {
        eth::explorer_tx_url(explorer_url, &tx_hash.to_string())
    }

    fn address_url(&self, explorer_url: &str, address: Address) -> String {
        eth::explorer_address_url(explorer_url, &address.to_string())
    }

    fn supports_disconnect(&self) -> bool {
        false
    }

    fn disconnect(&mut self) -> Result<(), AppError> {
        Err(AppError::ProviderWrapperMethodNotFound)
    }

    fn observe(&self, observer: SnapshotObserver) -> ObserverId;
    fn unobserve(&self, id: ObserverId) -> bool;
}

#[derive(Debug)]
struct WrapperState {
    phase: WrapperPhase,
    snapshot: WalletSnapshot,
}

#[derive(Default)]
struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, SnapshotObserver)>,
}

/// State shared between the wrapper and the listener it registers on the wallet.
struct Shared {
    state: Mutex<WrapperState>,
    observers: Mutex<Observers>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(WrapperState {
                phase: WrapperPhase::Uninitialized,
                snapshot: WalletSnapshot::default(),
            }),
            observers: Mutex::new(Observers::default()),
        }
    }

    fn snapshot(&self) -> WalletSnapshot {
        match self.state.lock() {
            Ok(g) => g.snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().snapshot.clone(),
        }
    }

    fn phase(&self) -> WrapperPhase {
        match self.state.lock() {
            Ok(g) => g.phase,
            Err(poisoned) => poisoned.into_inner().phase,
        }
    }

    fn set_phase(&self, phase: WrapperPhase) {
        let mut g = match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::debug!(from = ?g.phase, to = ?phase, "wrapper phase");
        g.phase = phase;
    }

    /// Applies `change` and notifies observers when the snapshot moved.
    fn update(&self, change: impl FnOnce(&mut WalletSnapshot)) {
        let changed = {
            let mut g = match self.state.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            let before = g.snapshot.clone();
            change(&mut g.snapshot);
            (g.snapshot != before).then(|| g.snapshot.clone())
        };
        if let Some(snapshot) = changed {
            tracing::debug!(
                chain_id = %snapshot.chain_id,
                address = ?snapshot.selected_address,
                "wallet state changed"
            );
            self.notify(&snapshot);
        }
    }

    fn notify(&self, snapshot: &WalletSnapshot) {
        let observers: Vec<SnapshotObserver> = match self.observers.lock() {
            Ok(g) => g.entries.iter().map(|(_, o)| Arc::clone(o)).collect(),
            Err(_) => return,
        };
        for observer in observers {
            observer(snapshot);
        }
    }

    fn observe(&self, observer: SnapshotObserver) -> ObserverId {
        let mut g = match self.observers.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        g.next_id = g.next_id.saturating_add(1);
        let id = ObserverId(g.next_id);
        g.entries.push((id, observer));
        id
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        let mut g = match self.observers.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = g.entries.len();
        g.entries.retain(|(entry, _)| *entry != id);
        g.entries.len() != before
    }
}

/// Re-reads network and accounts from the wallet. Failures go to the error
/// handler instead of the caller.
fn update_provider_state<W: WalletPort + ?Sized>(
    wallet: &W,
    shared: &Shared,
    errors: &ErrorHandler,
) {
    let chain_id = match eth::detect_network(wallet) {
        Ok(chain_id) => chain_id,
        Err(e) => return errors.report(&handle_eth_error(e)),
    };
    shared.update(|s| s.chain_id = chain_id);

    match eth::list_accounts(wallet) {
        Ok(accounts) => shared.update(|s| s.selected_address = accounts.first().copied()),
        Err(e) => errors.report(&handle_eth_error(e)),
    }
}

/// Wrapper over an injected MetaMask-compatible wallet.
pub struct MetamaskWrapper<W: WalletPort + 'static> {
    wallet: Arc<W>,
    shared: Arc<Shared>,
    subscription: Option<SubscriptionId>,
    clock: Arc<dyn ClockPort>,
    errors: ErrorHandler,
    receipts: ReceiptPolicy,
}

impl<W: WalletPort + 'static> MetamaskWrapper<W> {
    pub fn new(
        wallet: Arc<W>,
        clock: Arc<dyn ClockPort>,
        errors: ErrorHandler,
        receipts: ReceiptPolicy,
    ) -> Self {
        Self {
            wallet,
            shared: Arc::new(Shared::new()),
            subscription: None,
            clock,
            errors,
            receipts,
        }
    }

    fn set_listeners(&mut self) -> Result<(), PortError> {
        if self.subscription.is_some() {
            return Ok(());
        }
        let wallet: Weak<W> = Arc::downgrade(&self.wallet);
        let shared = Arc::downgrade(&self.shared);
        let errors = self.errors.clone();
        let listener: WalletListener = Arc::new(move |event: &WalletEvent| {
            let (Some(wallet), Some(shared)) = (wallet.upgrade(), shared.upgrade()) else {
                return;
            };
            tracing::debug!(event = event.name(), "wallet event");
            match event {
                WalletEvent::AccountsChanged(_) | WalletEvent::ChainChanged(_) => {
                    update_provider_state(wallet.as_ref(), &shared, &errors)
                }
                WalletEvent::Disconnect(_) => shared.update(|s| s.selected_address = None),
            }
        });
        self.subscription = Some(self.wallet.subscribe(listener)?);
        Ok(())
    }

    fn remove_listeners(&mut self) {
        if let Some(id) = self.subscription.take() {
            if let Err(e) = self.wallet.unsubscribe(id) {
                tracing::warn!(error = %e, "failed to remove wallet listener");
            }
        }
    }
}

impl<W: WalletPort + 'static> ProviderWrapper for MetamaskWrapper<W> {
    fn name(&self) -> ProviderName {
        ProviderName::Metamask
    }

    fn phase(&self) -> WrapperPhase {
        self.shared.phase()
    }

    fn snapshot(&self) -> WalletSnapshot {
        self.shared.snapshot()
    }

    fn init(&mut self) -> Result<(), AppError> {
        self.shared.set_phase(WrapperPhase::Initializing);
        if let Err(e) = self.set_listeners() {
            self.shared.set_phase(WrapperPhase::Uninitialized);
            return Err(handle_eth_error(e));
        }
        update_provider_state(self.wallet.as_ref(), &self.shared, &self.errors);
        self.shared.set_phase(WrapperPhase::Ready);
        Ok(())
    }

    fn connect(&mut self) -> Result<(), AppError> {
        // The new account arrives through the accountsChanged push.
        eth::connect_eth_accounts(self.wallet.as_ref())
            .map(|_| ())
            .map_err(handle_eth_error)
    }

    fn switch_chain(&mut self, chain_id: &ChainId) -> Result<(), AppError> {
        eth::request_switch_eth_chain(self.wallet.as_ref(), chain_id).map_err(handle_eth_error)
    }

    fn add_chain(&mut self, config: &AddEthereumChainParameter) -> Result<(), AppError> {
        eth::request_add_eth_chain(self.wallet.as_ref(), config).map_err(handle_eth_error)
    }

    fn sign_and_send_transaction(&mut self, tx: &TxRequest) -> Result<TxReceipt, AppError> {
        let mut tx = tx.clone();
        if tx.from.is_none() {
            tx.from = self.shared.snapshot().selected_address;
        }
        let hash = eth::send_transaction(self.wallet.as_ref(), &tx).map_err(handle_eth_error)?;
        tracing::info!(%hash, "transaction submitted");
        let receipt = eth::wait_for_receipt(
            self.wallet.as_ref(),
            self.clock.as_ref(),
            hash,
            self.receipts.poll_interval,
            self.receipts.max_attempts,
        )
        .map_err(handle_eth_error)?;
        if !receipt.success {
            return Err(AppError::TransactionReverted(hash));
        }
        Ok(receipt)
    }

    fn observe(&self, observer: SnapshotObserver) -> ObserverId {
        self.shared.observe(observer)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.shared.unobserve(id)
    }
}

impl<W: WalletPort + 'static> Drop for MetamaskWrapper<W> {
    fn drop(&mut self) {
        self.remove_listeners();
    }
}
