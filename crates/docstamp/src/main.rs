//! docstamp: notarize document hashes on an on-chain timestamping contract.

use std::path::PathBuf;

use alloy::primitives::{Address, B256};
use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};

use docstamp_adapters::{load_proof_files, DocstampConfig, RuntimeProfile, SnarkjsProofAdapter};
use docstamp_core::hashing::{format_file_size, keccak256_file};
use docstamp_core::pagination::Pagination;
use docstamp_core::ports::{PortError, ProofPort};
use docstamp_core::text::abbr_center;
use docstamp_core::zkp::ZkpProof;
use docstamp_core::ChainId;

mod bridge;

use bridge::StampBridge;

#[derive(Debug, Parser)]
#[command(name = "docstamp")]
#[command(about = "Timestamp and co-sign documents on chain")]
struct Cli {
    /// JSON-RPC endpoint standing in for the injected wallet.
    #[arg(long, env = "DOCSTAMP_EIP1193_PROXY_URL", global = true)]
    proxy_url: Option<String>,

    /// Chain the wallet should be on.
    #[arg(long, env = "DOCSTAMP_CHAIN_ID", global = true)]
    chain_id: Option<String>,

    /// Timestamping contract address.
    #[arg(long, env = "DOCSTAMP_CTR_ADDRESS_TIMESTAMP", global = true)]
    timestamp_address: Option<Address>,

    /// Poseidon hash contract address.
    #[arg(long, env = "DOCSTAMP_CTR_ADDRESS_POSEIDON_HASH", global = true)]
    poseidon_address: Option<Address>,

    /// Refuse the in-memory wallet fallback.
    #[arg(long, global = true)]
    production: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the keccak256 fingerprint of a document.
    Hash { file: PathBuf },
    /// Request account access and print the session state.
    Connect,
    /// Switch the wallet to a chain, adding the network when unknown.
    Switch {
        /// Defaults to the configured chain.
        chain: Option<String>,
    },
    /// Current stamping fee in wei.
    Fee,
    /// Show a stamp and one page of its signers.
    Info {
        public_hash: B256,
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
    /// Show one signer of a stamp (the connected account by default).
    Signer {
        public_hash: B256,
        #[arg(long)]
        address: Option<Address>,
    },
    /// Stamp a document.
    Stamp {
        file: PathBuf,
        /// Also sign the stamp as the connected account.
        #[arg(long)]
        sign: bool,
        /// Accounts admitted to sign; empty makes the stamp public.
        #[arg(long = "signer")]
        signers: Vec<Address>,
        #[command(flatten)]
        proof: ProofArgs,
    },
    /// Sign an existing stamp.
    Sign { public_hash: B256 },
    /// Poseidon hash of a bytes32 input, computed on chain.
    Poseidon { input: B256 },
}

#[derive(Debug, clap::Args)]
struct ProofArgs {
    /// Existing snarkjs proof.json (with --public).
    #[arg(long, requires = "public")]
    proof: Option<PathBuf>,
    /// Existing snarkjs public.json.
    #[arg(long)]
    public: Option<PathBuf>,
    /// Circuit wasm for proof generation.
    #[arg(long, default_value = "circuits/hash.wasm")]
    circuit: PathBuf,
    /// Proving key for proof generation.
    #[arg(long, default_value = "circuits/hash_final.zkey")]
    zkey: PathBuf,
    /// snarkjs executable.
    #[arg(long, env = "SNARKJS_BIN", default_value = "snarkjs")]
    snarkjs_bin: PathBuf,
    /// Directory for the witness input and generated proof files.
    #[arg(long)]
    proof_dir: Option<PathBuf>,
}

impl ProofArgs {
    fn into_prover(self) -> CliProver {
        let mut snarkjs =
            SnarkjsProofAdapter::new(self.circuit, self.zkey).with_binary(self.snarkjs_bin);
        if let Some(dir) = self.proof_dir {
            snarkjs = snarkjs.with_work_dir(dir);
        }
        CliProver {
            files: self.proof.zip(self.public),
            snarkjs,
        }
    }
}

/// Uses a pre-generated proof when given, else runs snarkjs.
struct CliProver {
    files: Option<(PathBuf, PathBuf)>,
    snarkjs: SnarkjsProofAdapter,
}

impl ProofPort for CliProver {
    fn generate(&self, secret_hash: B256, signer: Address) -> Result<ZkpProof, PortError> {
        match &self.files {
            Some((proof, public)) => load_proof_files(proof, public),
            None => self.snarkjs.generate(secret_hash, signer),
        }
    }
}

fn config_from(cli: &Cli) -> DocstampConfig {
    let mut config = DocstampConfig::from_env();
    if cli.proxy_url.is_some() {
        config.eip1193_proxy_url = cli.proxy_url.clone();
    }
    if let Some(ref chain_id) = cli.chain_id {
        config.chain_id = ChainId::new(chain_id.as_str()).normalized();
    }
    config.timestamp_address = cli.timestamp_address.or(config.timestamp_address);
    config.poseidon_hash_address = cli.poseidon_address.or(config.poseidon_hash_address);
    if cli.production {
        config.runtime_profile = RuntimeProfile::Production;
    }
    config
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open(config: DocstampConfig) -> Result<StampBridge> {
    StampBridge::new(config).wrap_err("wallet initialization failed")
}

fn print_tx(bridge: &StampBridge, hash: B256) {
    match bridge.tx_url(hash) {
        Some(url) => println!("transaction: {url}"),
        None => println!("transaction: {hash}"),
    }
}

fn not_ready() -> eyre::Report {
    eyre!("wallet is not connected to an admitted network")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config_from(&cli);
    tracing::info!(chain_id = %config.chain_id, profile = ?config.runtime_profile, "starting docstamp");

    match cli.command {
        Command::Hash { file } => {
            let hash = keccak256_file(&file)
                .wrap_err_with(|| format!("cannot hash {}", file.display()))?;
            let size = std::fs::metadata(&file)?.len();
            println!(
                "{hash}  {}  {}",
                format_file_size(size),
                abbr_center(&file.display().to_string())
            );
        }
        Command::Connect => print_json(&open(config)?.connect()?)?,
        Command::Switch { chain } => {
            let mut bridge = open(config)?;
            bridge.connect()?;
            let outcome = match chain {
                Some(chain) => bridge.switch_chain(&ChainId::new(chain).normalized()),
                None => bridge.ensure_target_chain(),
            };
            print_json(&outcome)?;
        }
        Command::Fee => {
            let fee = open(config)?.fee()?.ok_or_else(not_ready)?;
            println!("{fee}");
        }
        Command::Info {
            public_hash,
            page,
            limit,
        } => {
            let mut bridge = open(config)?;
            let mut info = bridge
                .stamp_info(public_hash, 0, limit)?
                .ok_or_else(not_ready)?;
            let mut pagination = Pagination::new(info.signers_total_count, limit);
            while pagination.page_number() < page && !pagination.is_last_page() {
                pagination.to_next(|request| {
                    info = bridge
                        .stamp_info(public_hash, request.offset, request.limit)?
                        .ok_or_else(not_ready)?;
                    Ok::<_, eyre::Report>(())
                })?;
            }
            eprintln!(
                "page {}/{}",
                pagination.page_number(),
                pagination.pages_count()
            );
            print_json(&info)?;
        }
        Command::Signer {
            public_hash,
            address,
        } => {
            let signer = open(config)?
                .signer_info(address, public_hash)?
                .ok_or_else(not_ready)?;
            print_json(&signer)?;
        }
        Command::Stamp {
            file,
            sign,
            signers,
            proof,
        } => {
            let mut bridge = open(config)?;
            let prover = proof.into_prover();
            let (public_hash, receipt) = bridge
                .create_stamp(&file, sign, &signers, &prover)?
                .ok_or_else(not_ready)?;
            println!("public hash: {public_hash}");
            print_tx(&bridge, receipt.transaction_hash);
        }
        Command::Sign { public_hash } => {
            let mut bridge = open(config)?;
            let receipt = bridge.sign(public_hash)?.ok_or_else(not_ready)?;
            print_tx(&bridge, receipt.transaction_hash);
        }
        Command::Poseidon { input } => {
            let hash = open(config)?.poseidon(input)?.ok_or_else(not_ready)?;
            println!("{hash}");
        }
    }

    Ok(())
}
