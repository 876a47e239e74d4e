//! Bridge between the CLI shell and the docstamp workspace crates.
//! This must remain the only shell-facing boundary for wallet operations.

use std::path::Path;
use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};

use docstamp_adapters::{
    DocstampConfig, Eip1193Adapter, PoseidonClient, SystemClockAdapter, TimestampClient,
    TracingFeedback,
};
use docstamp_core::chains::KnownChain;
use docstamp_core::contracts::{PoseidonHashContract, SignerInfo, StampInfo, TimestampContract};
use docstamp_core::domain::TxReceipt;
use docstamp_core::ports::ProofPort;
use docstamp_core::session::SessionSnapshot;
use docstamp_core::{
    AppError, ChainId, ErrorHandler, ProviderSession, SwitchOutcome, Web3Context,
};

pub type Wallet = Eip1193Adapter;

pub struct StampBridge {
    config: DocstampConfig,
    context: Web3Context<Wallet>,
}

impl StampBridge {
    pub fn new(config: DocstampConfig) -> Result<Self, AppError> {
        let wallet = Arc::new(Eip1193Adapter::with_config(config.clone()));
        let session = ProviderSession::new(
            Arc::new(SystemClockAdapter),
            ErrorHandler::new(Arc::new(TracingFeedback)),
            config.session_settings(),
        );
        let mut context = Web3Context::new(session, config.admitted_chain_ids());
        context.detect_providers(vec![wallet]);
        context.init_provider()?;
        Ok(Self { config, context })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.context.provider.snapshot()
    }

    pub fn connect(&mut self) -> Result<SessionSnapshot, AppError> {
        self.context.connect()?;
        Ok(self.snapshot())
    }

    pub fn switch_chain(&mut self, chain_id: &ChainId) -> SwitchOutcome {
        self.context.provider.try_switch_or_add_chain(chain_id)
    }

    /// Switches to the configured chain unless the wallet is already on it.
    pub fn ensure_target_chain(&mut self) -> SwitchOutcome {
        let target = self.config.chain_id.clone();
        if self.context.provider.chain_id().as_ref() == Some(&target) {
            return SwitchOutcome::Switched;
        }
        self.switch_chain(&target)
    }

    pub fn explorer_url(&self) -> Option<&'static str> {
        let chain_id = self.context.provider.chain_id()?;
        KnownChain::from_chain_id(&chain_id).map(|c| c.explorer_url())
    }

    pub fn tx_url(&self, hash: B256) -> Option<String> {
        let explorer = self.explorer_url()?;
        self.context.provider.tx_url(explorer, hash).ok()
    }

    fn timestamp_contract(
        session: &ProviderSession<Wallet>,
        address: Option<Address>,
    ) -> TimestampContract<TimestampClient<Wallet>> {
        let client = session
            .wallet()
            .zip(address)
            .map(|(wallet, address)| TimestampClient::new(wallet, address, session.selected_address()));
        TimestampContract::new(client)
    }

    /// Runs `f` against the timestamping contract once the wallet is connected
    /// to an admitted chain.
    fn with_timestamp<T>(
        &mut self,
        f: impl FnOnce(&ProviderSession<Wallet>, &TimestampContract<TimestampClient<Wallet>>) -> Result<T, AppError>,
    ) -> Result<Option<T>, AppError> {
        let address = self.config.timestamp_address;
        self.context.check_connection(|session| {
            let contract = Self::timestamp_contract(session, address);
            f(session, &contract)
        })
    }

    pub fn fee(&mut self) -> Result<Option<U256>, AppError> {
        self.with_timestamp(|_, contract| contract.get_fee())
    }

    pub fn stamp_info(
        &mut self,
        public_hash: B256,
        offset: u64,
        limit: u64,
    ) -> Result<Option<StampInfo>, AppError> {
        self.with_timestamp(|_, contract| {
            contract.get_stamp_info_with_pagination(public_hash, offset, limit)
        })
    }

    pub fn signer_info(
        &mut self,
        address: Option<Address>,
        public_hash: B256,
    ) -> Result<Option<SignerInfo>, AppError> {
        self.with_timestamp(|session, contract| {
            let address = address
                .or_else(|| session.selected_address())
                .ok_or(AppError::ProviderWrapperMethodNotFound)?;
            contract.get_signer_info(address, public_hash)
        })
    }

    /// Proves knowledge of the document hash and stamps its public hash,
    /// paying the contract fee.
    pub fn create_stamp(
        &mut self,
        document: &Path,
        is_sign: bool,
        signers: &[Address],
        prover: &dyn ProofPort,
    ) -> Result<Option<(B256, TxReceipt)>, AppError> {
        let secret_hash = docstamp_core::hashing::keccak256_file(document)?;
        self.with_timestamp(|session, contract| {
            let signer = session
                .selected_address()
                .ok_or(AppError::ProviderWrapperMethodNotFound)?;
            let proof = prover.generate(secret_hash, signer)?;
            let fee = contract.get_fee()?;
            tracing::info!(public_hash = %proof.public_hash, %fee, "creating stamp");
            let pending =
                contract.create_stamp(proof.public_hash, is_sign, signers, &proof.points, fee)?;
            let receipt = session.wait_for_transaction(&pending)?;
            Ok((proof.public_hash, receipt))
        })
    }

    pub fn sign(&mut self, public_hash: B256) -> Result<Option<TxReceipt>, AppError> {
        self.with_timestamp(|session, contract| {
            let pending = contract.sign(public_hash)?;
            session.wait_for_transaction(&pending)
        })
    }

    pub fn poseidon(&mut self, input: B256) -> Result<Option<B256>, AppError> {
        let address = self.config.poseidon_hash_address;
        self.context.check_connection(|session| {
            let client = session
                .wallet()
                .zip(address)
                .map(|(wallet, address)| PoseidonClient::new(wallet, address));
            PoseidonHashContract::new(client).get_poseidon_hash(input)
        })
    }
}
