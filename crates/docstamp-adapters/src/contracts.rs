//! ABI bindings for the docstamp contracts, executed through the wallet's
//! `eth_call` / `eth_sendTransaction`.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use docstamp_core::contracts::{RawSignerInfo, RawStampInfo};
use docstamp_core::domain::{PendingTx, TxRequest};
use docstamp_core::eth;
use docstamp_core::ports::{Erc20Port, PoseidonHashPort, PortError, TimestampPort, WalletPort};
use docstamp_core::zkp::ZkpPoints;

sol! {
    interface ITimeStamping {
        struct ZKPPoints {
            uint256[2] a;
            uint256[2][2] b;
            uint256[2] c;
        }

        struct SignerInfo {
            address signer;
            bool isAddmitted;
            uint256 signatureTimestamp;
        }

        struct DetailedStampInfo {
            bool isPublic;
            uint256 timestamp;
            uint256 usersToSign;
            uint256 usersSigned;
            SignerInfo[] signersInfo;
        }

        function fee() external view returns (uint256);
        function getStampInfoWithPagination(bytes32 stampHash_, uint256 offset_, uint256 limit_)
            external view returns (DetailedStampInfo memory);
        function getUserInfo(address user_, bytes32 stampHash_)
            external view returns (SignerInfo memory);
        function createStamp(bytes32 stampHash_, bool isSigned_, address[] calldata signers_, ZKPPoints calldata zkpPoints_)
            external payable;
        function sign(bytes32 stampHash_) external;
    }

    interface IPoseidonHash {
        function poseidon(bytes32[1] calldata inputs) external pure returns (bytes32);
    }

    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function owner() external view returns (address);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
        function decreaseAllowance(address spender, uint256 subtractedValue) external returns (bool);
        function mint(address to, uint256 amount) external;
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function renounceOwnership() external;
    }
}

/// Contract at `address`, reached through `wallet` on behalf of `from`.
#[derive(Debug)]
struct ContractCaller<W> {
    wallet: Arc<W>,
    address: Address,
    from: Option<Address>,
}

impl<W> Clone for ContractCaller<W> {
    fn clone(&self) -> Self {
        Self {
            wallet: Arc::clone(&self.wallet),
            address: self.address,
            from: self.from,
        }
    }
}

impl<W: WalletPort> ContractCaller<W> {
    fn call<C: SolCall>(&self, call: &C) -> Result<C::Return, PortError> {
        let data = eth::eth_call(self.wallet.as_ref(), self.address, &call.abi_encode())?;
        C::abi_decode_returns(&data, true).map_err(|e| {
            PortError::Validation(format!("{} returned undecodable data: {e}", C::SIGNATURE))
        })
    }

    fn send<C: SolCall>(&self, call: &C, value: Option<U256>) -> Result<PendingTx, PortError> {
        let tx = TxRequest {
            from: self.from,
            to: Some(self.address),
            value,
            data: Some(Bytes::from(call.abi_encode())),
            gas: None,
        };
        let hash = eth::send_transaction(self.wallet.as_ref(), &tx)?;
        tracing::info!(%hash, method = C::SIGNATURE, contract = %self.address, "contract transaction sent");
        Ok(PendingTx { hash })
    }
}

pub struct TimestampClient<W> {
    inner: ContractCaller<W>,
}

impl<W: WalletPort> TimestampClient<W> {
    pub fn new(wallet: Arc<W>, address: Address, from: Option<Address>) -> Self {
        Self {
            inner: ContractCaller { wallet, address, from },
        }
    }
}

fn signer_from_abi(info: ITimeStamping::SignerInfo) -> RawSignerInfo {
    RawSignerInfo {
        signer: info.signer,
        is_admitted: info.isAddmitted,
        signature_timestamp: info.signatureTimestamp,
    }
}

impl<W: WalletPort> TimestampPort for TimestampClient<W> {
    fn get_stamp_info_with_pagination(
        &self,
        public_hash: B256,
        offset: U256,
        limit: U256,
    ) -> Result<RawStampInfo, PortError> {
        let info = self
            .inner
            .call(&ITimeStamping::getStampInfoWithPaginationCall {
                stampHash_: public_hash,
                offset_: offset,
                limit_: limit,
            })?
            ._0;
        Ok(RawStampInfo {
            is_public: info.isPublic,
            timestamp: info.timestamp,
            users_to_sign: info.usersToSign,
            users_signed: info.usersSigned,
            signers_info: info.signersInfo.into_iter().map(signer_from_abi).collect(),
        })
    }

    fn get_user_info(&self, user: Address, public_hash: B256) -> Result<RawSignerInfo, PortError> {
        let info = self
            .inner
            .call(&ITimeStamping::getUserInfoCall {
                user_: user,
                stampHash_: public_hash,
            })?
            ._0;
        Ok(signer_from_abi(info))
    }

    fn fee(&self) -> Result<U256, PortError> {
        Ok(self.inner.call(&ITimeStamping::feeCall {})?._0)
    }

    fn create_stamp(
        &self,
        public_hash: B256,
        is_sign: bool,
        indicated_addresses: &[Address],
        zkp_points: &ZkpPoints,
        value: U256,
    ) -> Result<PendingTx, PortError> {
        let call = ITimeStamping::createStampCall {
            stampHash_: public_hash,
            isSigned_: is_sign,
            signers_: indicated_addresses.to_vec(),
            zkpPoints_: ITimeStamping::ZKPPoints {
                a: zkp_points.a,
                b: zkp_points.b,
                c: zkp_points.c,
            },
        };
        self.inner.send(&call, Some(value))
    }

    fn sign(&self, public_hash: B256) -> Result<PendingTx, PortError> {
        self.inner.send(
            &ITimeStamping::signCall {
                stampHash_: public_hash,
            },
            None,
        )
    }
}

pub struct PoseidonClient<W> {
    inner: ContractCaller<W>,
}

impl<W: WalletPort> PoseidonClient<W> {
    pub fn new(wallet: Arc<W>, address: Address) -> Self {
        Self {
            inner: ContractCaller {
                wallet,
                address,
                from: None,
            },
        }
    }
}

impl<W: WalletPort> PoseidonHashPort for PoseidonClient<W> {
    fn poseidon(&self, input: B256) -> Result<B256, PortError> {
        Ok(self
            .inner
            .call(&IPoseidonHash::poseidonCall { inputs: [input] })?
            ._0)
    }
}

pub struct Erc20Client<W> {
    inner: ContractCaller<W>,
}

impl<W: WalletPort> Erc20Client<W> {
    pub fn new(wallet: Arc<W>, address: Address, from: Option<Address>) -> Self {
        Self {
            inner: ContractCaller { wallet, address, from },
        }
    }
}

impl<W: WalletPort> Erc20Port for Erc20Client<W> {
    fn name(&self) -> Result<String, PortError> {
        Ok(self.inner.call(&IERC20::nameCall {})?._0)
    }

    fn symbol(&self) -> Result<String, PortError> {
        Ok(self.inner.call(&IERC20::symbolCall {})?._0)
    }

    fn decimals(&self) -> Result<u8, PortError> {
        Ok(self.inner.call(&IERC20::decimalsCall {})?._0)
    }

    fn owner(&self) -> Result<Address, PortError> {
        Ok(self.inner.call(&IERC20::ownerCall {})?._0)
    }

    fn total_supply(&self) -> Result<U256, PortError> {
        Ok(self.inner.call(&IERC20::totalSupplyCall {})?._0)
    }

    fn balance_of(&self, account: Address) -> Result<U256, PortError> {
        Ok(self.inner.call(&IERC20::balanceOfCall { account })?._0)
    }

    fn allowance(&self, owner: Address, spender: Address) -> Result<U256, PortError> {
        Ok(self.inner.call(&IERC20::allowanceCall { owner, spender })?._0)
    }

    fn approve(&self, spender: Address, amount: U256) -> Result<PendingTx, PortError> {
        self.inner.send(&IERC20::approveCall { spender, amount }, None)
    }

    fn increase_allowance(&self, spender: Address, added: U256) -> Result<PendingTx, PortError> {
        self.inner.send(
            &IERC20::increaseAllowanceCall {
                spender,
                addedValue: added,
            },
            None,
        )
    }

    fn decrease_allowance(
        &self,
        spender: Address,
        subtracted: U256,
    ) -> Result<PendingTx, PortError> {
        self.inner.send(
            &IERC20::decreaseAllowanceCall {
                spender,
                subtractedValue: subtracted,
            },
            None,
        )
    }

    fn mint(&self, to: Address, amount: U256) -> Result<PendingTx, PortError> {
        self.inner.send(&IERC20::mintCall { to, amount }, None)
    }

    fn transfer(&self, to: Address, amount: U256) -> Result<PendingTx, PortError> {
        self.inner.send(&IERC20::transferCall { to, amount }, None)
    }

    fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<PendingTx, PortError> {
        self.inner
            .send(&IERC20::transferFromCall { from, to, amount }, None)
    }

    fn renounce_ownership(&self) -> Result<PendingTx, PortError> {
        self.inner.send(&IERC20::renounceOwnershipCall {}, None)
    }
}
