use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, B256, U256};

use docstamp_core::contracts::{
    Erc20Contract, PoseidonHashContract, RawSignerInfo, RawStampInfo, TimestampContract,
};
use docstamp_core::domain::PendingTx;
use docstamp_core::errors::{ProviderErrorKind, RpcError, StampRevert};
use docstamp_core::ports::{Erc20Port, PoseidonHashPort, TimestampPort};
use docstamp_core::zkp::ZkpPoints;
use docstamp_core::{AppError, PortError};

const SIGNER: Address = address!("1000000000000000000000000000000000000001");
const OTHER: Address = address!("2000000000000000000000000000000000000002");

struct FakeTimestamp {
    stamp: RawStampInfo,
    revert_with: Option<String>,
}

impl FakeTimestamp {
    fn new(is_public: bool) -> Self {
        Self {
            stamp: RawStampInfo {
                is_public,
                timestamp: U256::from(1_700_000_000u64),
                users_to_sign: U256::from(5),
                users_signed: U256::from(2),
                signers_info: vec![
                    RawSignerInfo {
                        signer: SIGNER,
                        is_admitted: true,
                        signature_timestamp: U256::from(1_700_000_100u64),
                    },
                    RawSignerInfo {
                        signer: OTHER,
                        is_admitted: false,
                        signature_timestamp: U256::ZERO,
                    },
                ],
            },
            revert_with: None,
        }
    }

    fn reverting(message: &str) -> Self {
        Self {
            revert_with: Some(message.to_owned()),
            ..Self::new(true)
        }
    }

    fn revert(&self) -> Result<(), PortError> {
        match &self.revert_with {
            Some(message) => Err(PortError::Rpc(RpcError::new(-32603, message.clone()))),
            None => Ok(()),
        }
    }
}

impl TimestampPort for FakeTimestamp {
    fn get_stamp_info_with_pagination(
        &self,
        _public_hash: B256,
        offset: U256,
        limit: U256,
    ) -> Result<RawStampInfo, PortError> {
        let mut stamp = self.stamp.clone();
        let offset = usize::try_from(offset).expect("small offset");
        let limit = usize::try_from(limit).expect("small limit");
        stamp.signers_info = stamp.signers_info.into_iter().skip(offset).take(limit).collect();
        Ok(stamp)
    }

    fn get_user_info(&self, user: Address, _public_hash: B256) -> Result<RawSignerInfo, PortError> {
        self.stamp
            .signers_info
            .iter()
            .find(|s| s.signer == user)
            .cloned()
            .ok_or_else(|| PortError::NotFound(user.to_string()))
    }

    fn fee(&self) -> Result<U256, PortError> {
        Ok(U256::from(1_000u64))
    }

    fn create_stamp(
        &self,
        _public_hash: B256,
        _is_sign: bool,
        indicated_addresses: &[Address],
        _zkp_points: &ZkpPoints,
        value: U256,
    ) -> Result<PendingTx, PortError> {
        self.revert()?;
        if value < U256::from(1_000u64) {
            return Err(PortError::Rpc(RpcError::new(-32000, "insufficient fee")));
        }
        assert!(indicated_addresses.len() <= 2);
        Ok(PendingTx { hash: B256::repeat_byte(0xaa) })
    }

    fn sign(&self, _public_hash: B256) -> Result<PendingTx, PortError> {
        self.revert()?;
        Ok(PendingTx { hash: B256::repeat_byte(0xbb) })
    }
}

#[test]
fn stamp_info_is_normalized() {
    let contract = TimestampContract::new(Some(FakeTimestamp::new(false)));
    let info = contract
        .get_stamp_info_with_pagination(B256::repeat_byte(1), 0, 10)
        .expect("stamp info");
    assert!(!info.is_public);
    assert_eq!(info.doc_timestamp, 1_700_000_000);
    assert_eq!(info.signers_total_count, 5, "private stamps count usersToSign");
    assert_eq!(info.signers.len(), 2);
    assert_eq!(info.signers[0].address, SIGNER);
    assert!(info.signers[0].is_admitted_to_signing);
    assert_eq!(info.signers[0].signature_timestamp, 1_700_000_100);
    assert!(!info.signers[1].is_admitted_to_signing);

    let page = contract
        .get_stamp_info_with_pagination(B256::repeat_byte(1), 1, 1)
        .expect("second page");
    assert_eq!(page.signers.len(), 1);
    assert_eq!(page.signers[0].address, OTHER);
}

#[test]
fn public_stamps_count_signed_users() {
    let contract = TimestampContract::new(Some(FakeTimestamp::new(true)));
    let info = contract
        .get_stamp_info_with_pagination(B256::ZERO, 0, 10)
        .expect("stamp info");
    assert_eq!(info.signers_total_count, 2);
}

#[test]
fn oversized_timestamp_is_a_validation_error() {
    let mut fake = FakeTimestamp::new(true);
    fake.stamp.timestamp = U256::MAX;
    let err = TimestampContract::new(Some(fake))
        .get_stamp_info_with_pagination(B256::ZERO, 0, 10)
        .expect_err("must overflow");
    assert!(matches!(err, AppError::Port(PortError::Validation(_))));
}

#[test]
fn signer_info_and_fee() {
    let contract = TimestampContract::new(Some(FakeTimestamp::new(true)));
    let signer = contract.get_signer_info(OTHER, B256::ZERO).expect("signer");
    assert_eq!(signer.address, OTHER);
    assert_eq!(signer.signature_timestamp, 0);
    assert_eq!(contract.get_fee().expect("fee"), U256::from(1_000u64));

    let missing = contract
        .get_signer_info(Address::ZERO, B256::ZERO)
        .expect_err("unknown signer");
    assert!(matches!(missing, AppError::Port(PortError::NotFound(_))));
}

#[test]
fn create_stamp_forwards_arguments() {
    let contract = TimestampContract::new(Some(FakeTimestamp::new(true)));
    let hash = B256::repeat_byte(7);
    let pending = contract
        .create_stamp(hash, true, &[SIGNER, OTHER], &ZkpPoints::default(), U256::from(1_000u64))
        .expect("create");
    assert_eq!(pending.hash, B256::repeat_byte(0xaa));
    assert_eq!(contract.sign(hash).expect("sign").hash, B256::repeat_byte(0xbb));

    let underpaid = contract
        .create_stamp(hash, false, &[], &ZkpPoints::default(), U256::ZERO)
        .expect_err("fee required");
    assert_eq!(underpaid.provider_kind(), Some(ProviderErrorKind::InvalidInput));
}

#[test]
fn known_reverts_are_recognized() {
    let cases = [
        ("execution reverted: TimeStamping: Hash collision.", StampRevert::HashCollision),
        ("execution reverted: TimeStamping: User has signed already.", StampRevert::AlreadySigned),
        ("execution reverted: TimeStamping: User is not admitted.", StampRevert::NotAdmitted),
    ];
    for (message, expected) in cases {
        let contract = TimestampContract::new(Some(FakeTimestamp::reverting(message)));
        let err = contract.sign(B256::ZERO).expect_err("must revert");
        assert!(matches!(err, AppError::Stamp(r) if r == expected), "{message}");
        assert_eq!(err.message_key(), format!("errors.stamp-{}", match expected {
            StampRevert::HashCollision => "hash-collision",
            StampRevert::AlreadySigned => "already-signed",
            StampRevert::NotAdmitted => "not-admitted",
        }));
    }

    let other = TimestampContract::new(Some(FakeTimestamp::reverting("out of gas")));
    let err = other
        .create_stamp(B256::ZERO, false, &[], &ZkpPoints::default(), U256::ZERO)
        .expect_err("must fail");
    assert_eq!(err.provider_kind(), Some(ProviderErrorKind::InternalError));
}

#[test]
fn missing_instance_is_reported() {
    let timestamp: TimestampContract<FakeTimestamp> = TimestampContract::new(None);
    assert!(matches!(
        timestamp.get_fee(),
        Err(AppError::ContractInstanceUnavailable)
    ));
    let poseidon: PoseidonHashContract<FakePoseidon> = PoseidonHashContract::new(None);
    assert!(matches!(
        poseidon.get_poseidon_hash(B256::ZERO),
        Err(AppError::ContractInstanceUnavailable)
    ));
}

struct FakePoseidon;

impl PoseidonHashPort for FakePoseidon {
    fn poseidon(&self, input: B256) -> Result<B256, PortError> {
        let mut out = input;
        out.0[31] ^= 0xff;
        Ok(out)
    }
}

#[test]
fn poseidon_delegates() {
    let contract = PoseidonHashContract::new(Some(FakePoseidon));
    let out = contract.get_poseidon_hash(B256::ZERO).expect("hash");
    assert_eq!(out.0[31], 0xff);
}

type Calls = Arc<Mutex<Vec<(&'static str, U256)>>>;

#[derive(Default)]
struct FakeToken {
    calls: Calls,
}

impl FakeToken {
    fn record(&self, method: &'static str, amount: U256) -> Result<PendingTx, PortError> {
        self.calls.lock().expect("lock").push((method, amount));
        Ok(PendingTx { hash: B256::repeat_byte(0x20) })
    }
}

impl Erc20Port for FakeToken {
    fn name(&self) -> Result<String, PortError> {
        Ok("Stamp Token".to_owned())
    }
    fn symbol(&self) -> Result<String, PortError> {
        Ok("STMP".to_owned())
    }
    fn decimals(&self) -> Result<u8, PortError> {
        Ok(6)
    }
    fn owner(&self) -> Result<Address, PortError> {
        Ok(SIGNER)
    }
    fn total_supply(&self) -> Result<U256, PortError> {
        Ok(U256::from(1_000_000_000u64))
    }
    fn balance_of(&self, _account: Address) -> Result<U256, PortError> {
        Ok(U256::from(42u64))
    }
    fn allowance(&self, _owner: Address, _spender: Address) -> Result<U256, PortError> {
        Ok(U256::ZERO)
    }
    fn approve(&self, _spender: Address, amount: U256) -> Result<PendingTx, PortError> {
        self.record("approve", amount)
    }
    fn increase_allowance(&self, _spender: Address, added: U256) -> Result<PendingTx, PortError> {
        self.record("increase_allowance", added)
    }
    fn decrease_allowance(
        &self,
        _spender: Address,
        subtracted: U256,
    ) -> Result<PendingTx, PortError> {
        self.record("decrease_allowance", subtracted)
    }
    fn mint(&self, _to: Address, amount: U256) -> Result<PendingTx, PortError> {
        self.record("mint", amount)
    }
    fn transfer(&self, _to: Address, amount: U256) -> Result<PendingTx, PortError> {
        self.record("transfer", amount)
    }
    fn transfer_from(
        &self,
        _from: Address,
        _to: Address,
        amount: U256,
    ) -> Result<PendingTx, PortError> {
        self.record("transfer_from", amount)
    }
    fn renounce_ownership(&self) -> Result<PendingTx, PortError> {
        self.record("renounce_ownership", U256::ZERO)
    }
}

#[test]
fn erc20_amounts_scale_by_token_decimals() {
    let calls = Calls::default();
    let mut token = Erc20Contract::new(Some(FakeToken {
        calls: Arc::clone(&calls),
    }));
    assert_eq!(
        token.to_base_units("1").expect("default decimals"),
        U256::from(10u64).pow(U256::from(18))
    );

    let details = token.load_details().expect("details").clone();
    assert_eq!(details.symbol, "STMP");
    assert_eq!(details.decimals, 6);
    assert_eq!(details.owner, SIGNER);

    token.approve(OTHER, "1.5").expect("approve");
    token.transfer(OTHER, "2").expect("transfer");
    token.mint(OTHER, "0.000001").expect("mint");
    assert_eq!(
        *calls.lock().expect("lock"),
        vec![
            ("approve", U256::from(1_500_000u64)),
            ("transfer", U256::from(2_000_000u64)),
            ("mint", U256::from(1u64)),
        ]
    );

    let bad = token.transfer(OTHER, "one").expect_err("not a number");
    assert!(matches!(bad, AppError::Port(PortError::Validation(_))));
}
