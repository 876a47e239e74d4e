pub mod clock;
pub mod config;
pub mod contracts;
pub mod eip1193;
pub mod feedback;
pub mod proof;

pub use clock::SystemClockAdapter;
pub use config::{DocstampConfig, RuntimeProfile};
pub use contracts::{Erc20Client, PoseidonClient, TimestampClient};
pub use eip1193::Eip1193Adapter;
pub use feedback::TracingFeedback;
pub use proof::{load_proof_files, SnarkjsProofAdapter};
