use std::sync::Arc;

use crate::domain::{ChainId, DesignatedProvider, ProviderName};
use crate::errors::AppError;
use crate::ports::WalletPort;
use crate::session::ProviderSession;

/// Application-wide web3 state, owned by the shell and passed explicitly.
pub struct Web3Context<W: WalletPort + 'static> {
    pub provider: ProviderSession<W>,
    providers: Vec<DesignatedProvider<W>>,
    admitted_chain_ids: Vec<ChainId>,
    is_invalid_network_modal_shown: bool,
}

impl<W: WalletPort + 'static> Web3Context<W> {
    pub fn new(provider: ProviderSession<W>, admitted_chain_ids: Vec<ChainId>) -> Self {
        Self {
            provider,
            providers: Vec::new(),
            admitted_chain_ids,
            is_invalid_network_modal_shown: false,
        }
    }

    /// Designates the injected wallets. Runs once; later calls keep the first
    /// detection result.
    pub fn detect_providers(&mut self, candidates: Vec<Arc<W>>) -> &[DesignatedProvider<W>] {
        if !self.providers.is_empty() {
            tracing::debug!("providers already detected");
            return &self.providers;
        }
        self.providers = designate_providers(candidates);
        tracing::info!(count = self.providers.len(), "providers detected");
        &self.providers
    }

    pub fn providers(&self) -> &[DesignatedProvider<W>] {
        &self.providers
    }

    pub fn metamask(&self) -> Option<&DesignatedProvider<W>> {
        self.providers
            .iter()
            .find(|p| p.name == ProviderName::Metamask)
    }

    pub fn admitted_chain_ids(&self) -> &[ChainId] {
        &self.admitted_chain_ids
    }

    pub fn is_chain_admitted(&self, chain_id: &ChainId) -> bool {
        self.admitted_chain_ids.contains(chain_id)
    }

    pub fn is_invalid_network_modal_shown(&self) -> bool {
        self.is_invalid_network_modal_shown
    }

    pub fn set_invalid_network_modal_shown(&mut self, shown: bool) {
        self.is_invalid_network_modal_shown = shown;
    }

    /// Initializes the session with MetaMask when present.
    pub fn init_provider(&mut self) -> Result<(), AppError> {
        let provider = self
            .metamask()
            .or_else(|| self.providers.first())
            .cloned()
            .ok_or_else(|| AppError::InvalidProvider("no injected provider".to_owned()))?;
        self.provider.init(&provider)
    }

    pub fn connect(&mut self) -> Result<(), AppError> {
        self.provider.connect(&self.providers)
    }

    /// Runs `action` only once a wallet is connected to an admitted chain.
    /// Connects first when needed; on a foreign chain the invalid-network
    /// modal flag is raised and `Ok(None)` is returned.
    pub fn check_connection<T>(
        &mut self,
        action: impl FnOnce(&mut ProviderSession<W>) -> Result<T, AppError>,
    ) -> Result<Option<T>, AppError> {
        if !self.provider.is_connected() {
            self.connect()?;
        }
        if !self.provider.is_connected() {
            tracing::debug!("wallet not connected, action skipped");
            return Ok(None);
        }
        let chain_id = self.provider.chain_id().unwrap_or_default();
        if !self.is_chain_admitted(&chain_id) {
            tracing::warn!(%chain_id, "wallet is on a chain the app does not admit");
            self.is_invalid_network_modal_shown = true;
            return Ok(None);
        }
        self.is_invalid_network_modal_shown = false;
        action(&mut self.provider).map(Some)
    }
}

pub fn designate_providers<W: WalletPort>(candidates: Vec<Arc<W>>) -> Vec<DesignatedProvider<W>> {
    candidates
        .into_iter()
        .map(|instance| DesignatedProvider {
            name: ProviderName::from_check_flags(&instance.check_flags()),
            instance,
        })
        .collect()
}
