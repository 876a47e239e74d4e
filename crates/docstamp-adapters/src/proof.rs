use std::path::{Path, PathBuf};
use std::process::Command;

use alloy::primitives::{Address, B256, U256};
use serde_json::json;

use docstamp_core::ports::{PortError, ProofPort};
use docstamp_core::zkp::{Groth16Proof, ZkpProof};

/// Groth16 proofs produced by the `snarkjs` CLI from the hash circuit.
#[derive(Debug, Clone)]
pub struct SnarkjsProofAdapter {
    binary: PathBuf,
    circuit_wasm: PathBuf,
    zkey: PathBuf,
    work_dir: PathBuf,
}

impl SnarkjsProofAdapter {
    pub fn new(circuit_wasm: impl Into<PathBuf>, zkey: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from("snarkjs"),
            circuit_wasm: circuit_wasm.into(),
            zkey: zkey.into(),
            work_dir: std::env::temp_dir().join("docstamp-proof"),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }
}

impl ProofPort for SnarkjsProofAdapter {
    fn generate(&self, secret_hash: B256, signer: Address) -> Result<ZkpProof, PortError> {
        std::fs::create_dir_all(&self.work_dir)
            .map_err(|e| PortError::Transport(format!("cannot create proof dir: {e}")))?;
        let input = self.work_dir.join("input.json");
        let proof = self.work_dir.join("proof.json");
        let public = self.work_dir.join("public.json");

        let witness_input = json!({
            "hash": U256::from_be_bytes(secret_hash.0).to_string(),
            "msgSender": U256::from_be_slice(signer.as_slice()).to_string(),
        });
        std::fs::write(&input, witness_input.to_string())
            .map_err(|e| PortError::Transport(format!("cannot write proof input: {e}")))?;

        tracing::info!(circuit = %self.circuit_wasm.display(), "generating groth16 proof");
        let output = Command::new(&self.binary)
            .args(["groth16", "fullprove"])
            .arg(&input)
            .arg(&self.circuit_wasm)
            .arg(&self.zkey)
            .arg(&proof)
            .arg(&public)
            .output()
            .map_err(|e| {
                PortError::NotImplemented(if e.kind() == std::io::ErrorKind::NotFound {
                    "snarkjs binary not found"
                } else {
                    "snarkjs could not be started"
                })
            })?;
        if !output.status.success() {
            return Err(PortError::Transport(format!(
                "snarkjs failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        load_proof_files(&proof, &public)
    }
}

/// Reads a `proof.json` / `public.json` pair written by snarkjs.
pub fn load_proof_files(proof: &Path, public: &Path) -> Result<ZkpProof, PortError> {
    let proof: Groth16Proof = read_json(proof)?;
    let public_signals: Vec<String> = read_json(public)?;
    ZkpProof::from_groth16(&proof, &public_signals)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PortError> {
    let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PortError::NotFound(path.display().to_string()),
        _ => PortError::Transport(format!("failed to read {}: {e}", path.display())),
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| PortError::Validation(format!("invalid {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn witness_input_lands_in_work_dir_before_snarkjs_runs() {
        let work_dir = std::env::temp_dir().join(format!("docstamp-proof-{}", std::process::id()));
        let adapter = SnarkjsProofAdapter::new("hash.wasm", "hash_final.zkey")
            .with_binary("/nonexistent/docstamp/snarkjs")
            .with_work_dir(&work_dir);

        let signer = Address::with_last_byte(0x2a);
        let err = adapter
            .generate(B256::with_last_byte(7), signer)
            .expect_err("binary is missing");
        assert!(matches!(err, PortError::NotImplemented("snarkjs binary not found")));

        let raw = std::fs::read_to_string(work_dir.join("input.json")).expect("witness input");
        let input: serde_json::Value = serde_json::from_str(&raw).expect("input json");
        assert_eq!(input, json!({ "hash": "7", "msgSender": "42" }));
        let _ = std::fs::remove_dir_all(&work_dir);
    }
}
