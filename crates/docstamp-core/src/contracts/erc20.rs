use alloy::primitives::utils::parse_units;
use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::domain::PendingTx;
use crate::errors::{handle_eth_error, AppError};
use crate::ports::{Erc20Port, PortError};

const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Erc20Details {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
    pub total_supply: U256,
}

/// Token wrapper taking human-readable amounts (`"1.5"`) and scaling them by
/// the token decimals before they reach the contract.
#[derive(Debug, Clone)]
pub struct Erc20Contract<C> {
    instance: Option<C>,
    details: Option<Erc20Details>,
}

impl<C: Erc20Port> Erc20Contract<C> {
    pub fn new(instance: Option<C>) -> Self {
        Self {
            instance,
            details: None,
        }
    }

    fn instance(&self) -> Result<&C, AppError> {
        self.instance
            .as_ref()
            .ok_or(AppError::ContractInstanceUnavailable)
    }

    pub fn details(&self) -> Option<&Erc20Details> {
        self.details.as_ref()
    }

    pub fn load_details(&mut self) -> Result<&Erc20Details, AppError> {
        let c = self.instance()?;
        let details = Erc20Details {
            name: c.name().map_err(handle_eth_error)?,
            symbol: c.symbol().map_err(handle_eth_error)?,
            decimals: c.decimals().map_err(handle_eth_error)?,
            owner: c.owner().map_err(handle_eth_error)?,
            total_supply: c.total_supply().map_err(handle_eth_error)?,
        };
        tracing::debug!(symbol = %details.symbol, decimals = details.decimals, "erc20 details loaded");
        Ok(self.details.insert(details))
    }

    fn decimals(&self) -> u8 {
        self.details
            .as_ref()
            .map_or(DEFAULT_DECIMALS, |d| d.decimals)
    }

    /// Scales a decimal string by the token decimals (18 until details load).
    pub fn to_base_units(&self, amount: &str) -> Result<U256, AppError> {
        parse_units(amount, self.decimals())
            .map(|units| units.get_absolute())
            .map_err(|e| AppError::Port(PortError::Validation(format!("invalid amount {amount:?}: {e}"))))
    }

    pub fn balance_of(&self, account: Address) -> Result<U256, AppError> {
        self.instance()?.balance_of(account).map_err(handle_eth_error)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Result<U256, AppError> {
        self.instance()?
            .allowance(owner, spender)
            .map_err(handle_eth_error)
    }

    pub fn approve(&self, spender: Address, amount: &str) -> Result<PendingTx, AppError> {
        let amount = self.to_base_units(amount)?;
        self.instance()?
            .approve(spender, amount)
            .map_err(handle_eth_error)
    }

    pub fn increase_allowance(&self, spender: Address, amount: &str) -> Result<PendingTx, AppError> {
        let amount = self.to_base_units(amount)?;
        self.instance()?
            .increase_allowance(spender, amount)
            .map_err(handle_eth_error)
    }

    pub fn decrease_allowance(&self, spender: Address, amount: &str) -> Result<PendingTx, AppError> {
        let amount = self.to_base_units(amount)?;
        self.instance()?
            .decrease_allowance(spender, amount)
            .map_err(handle_eth_error)
    }

    pub fn mint(&self, to: Address, amount: &str) -> Result<PendingTx, AppError> {
        let amount = self.to_base_units(amount)?;
        self.instance()?.mint(to, amount).map_err(handle_eth_error)
    }

    pub fn transfer(&self, to: Address, amount: &str) -> Result<PendingTx, AppError> {
        let amount = self.to_base_units(amount)?;
        self.instance()?.transfer(to, amount).map_err(handle_eth_error)
    }

    pub fn transfer_from(&self, from: Address, to: Address, amount: &str) -> Result<PendingTx, AppError> {
        let amount = self.to_base_units(amount)?;
        self.instance()?
            .transfer_from(from, to, amount)
            .map_err(handle_eth_error)
    }

    pub fn renounce_ownership(&self) -> Result<PendingTx, AppError> {
        self.instance()?
            .renounce_ownership()
            .map_err(handle_eth_error)
    }
}
