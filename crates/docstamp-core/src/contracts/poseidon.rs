use alloy::primitives::B256;

use crate::errors::{handle_eth_error, AppError};
use crate::ports::PoseidonHashPort;

#[derive(Debug, Clone)]
pub struct PoseidonHashContract<C> {
    instance: Option<C>,
}

impl<C: PoseidonHashPort> PoseidonHashContract<C> {
    pub fn new(instance: Option<C>) -> Self {
        Self { instance }
    }

    pub fn get_poseidon_hash(&self, input: B256) -> Result<B256, AppError> {
        self.instance
            .as_ref()
            .ok_or(AppError::ContractInstanceUnavailable)?
            .poseidon(input)
            .map_err(handle_eth_error)
    }
}
