//! Wallet session, error taxonomy and contract wrappers for the docstamp
//! document timestamping client.

pub mod chains;
pub mod context;
pub mod contracts;
pub mod domain;
pub mod error_handler;
pub mod errors;
pub mod eth;
pub mod hashing;
pub mod pagination;
pub mod ports;
pub mod session;
pub mod text;
pub mod wrapper;
pub mod zkp;

pub use context::Web3Context;
pub use domain::{ChainId, DesignatedProvider, ProviderName, WalletEvent, WalletSnapshot};
pub use error_handler::{ErrorHandler, MessageCatalog};
pub use errors::{handle_eth_error, AppError, ProviderErrorKind, Severity};
pub use ports::PortError;
pub use session::{ProviderSession, SessionSettings, SwitchOutcome};
