//! Conversion of snarkjs Groth16 output into the points struct the
//! timestamping contract verifies.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::ports::PortError;

/// Proof as serialized by `snarkjs groth16 fullprove` (`proof.json`).
/// Coordinates are decimal strings; each point carries a trailing projective
/// `1` that the contract does not take.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Groth16Proof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ZkpPoints {
    pub a: [U256; 2],
    pub b: [[U256; 2]; 2],
    pub c: [U256; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZkpProof {
    pub points: ZkpPoints,
    pub public_hash: B256,
}

impl ZkpProof {
    /// `b` pairs are swapped into the (imaginary, real) order the on-chain
    /// verifier expects; the public hash is the first public signal.
    pub fn from_groth16(proof: &Groth16Proof, public_signals: &[String]) -> Result<Self, PortError> {
        let b0 = proof.pi_b.first().map(Vec::as_slice).unwrap_or_default();
        let b1 = proof.pi_b.get(1).map(Vec::as_slice).unwrap_or_default();
        let points = ZkpPoints {
            a: [coordinate(&proof.pi_a, 0, "pi_a")?, coordinate(&proof.pi_a, 1, "pi_a")?],
            b: [
                [coordinate(b0, 1, "pi_b[0]")?, coordinate(b0, 0, "pi_b[0]")?],
                [coordinate(b1, 1, "pi_b[1]")?, coordinate(b1, 0, "pi_b[1]")?],
            ],
            c: [coordinate(&proof.pi_c, 0, "pi_c")?, coordinate(&proof.pi_c, 1, "pi_c")?],
        };
        let signal = public_signals
            .first()
            .ok_or_else(|| PortError::Validation("proof has no public signals".to_owned()))?;
        Ok(Self {
            points,
            public_hash: B256::from(parse_decimal(signal, "publicSignals[0]")?),
        })
    }
}

fn coordinate(values: &[String], index: usize, field: &str) -> Result<U256, PortError> {
    let raw = values
        .get(index)
        .ok_or_else(|| PortError::Validation(format!("{field} is missing coordinate {index}")))?;
    parse_decimal(raw, field)
}

fn parse_decimal(raw: &str, field: &str) -> Result<U256, PortError> {
    U256::from_str_radix(raw.trim(), 10)
        .map_err(|e| PortError::Validation(format!("{field} is not a decimal field element: {e}")))
}
