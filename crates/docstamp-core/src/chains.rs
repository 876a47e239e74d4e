use crate::domain::{AddEthereumChainParameter, ChainId, NativeCurrency};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownChain {
    Ethereum,
    Goerli,
    Polygon,
    Mumbai,
    QMainnet,
    QTestnet,
}

impl KnownChain {
    pub const ALL: [KnownChain; 6] = [
        Self::Ethereum,
        Self::Goerli,
        Self::Polygon,
        Self::Mumbai,
        Self::QMainnet,
        Self::QTestnet,
    ];

    pub fn id(&self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Goerli => 5,
            Self::Polygon => 137,
            Self::Mumbai => 80001,
            Self::QMainnet => 35441,
            Self::QTestnet => 35443,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        ChainId::from(self.id())
    }

    pub fn from_chain_id(chain_id: &ChainId) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.chain_id() == *chain_id)
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::Ethereum | Self::Polygon | Self::QMainnet)
    }

    pub fn explorer_url(&self) -> &'static str {
        match self {
            Self::Ethereum => "https://etherscan.io",
            Self::Goerli => "https://goerli.etherscan.io",
            Self::Polygon => "https://polygonscan.com",
            Self::Mumbai => "https://mumbai.polygonscan.com",
            Self::QMainnet => "https://explorer.q.org",
            Self::QTestnet => "https://explorer.qtestnet.org",
        }
    }
}

/// Catalog key of the human readable network family name.
pub fn title_key_by_chain_id(chain_id: &ChainId) -> &'static str {
    match KnownChain::from_chain_id(chain_id) {
        Some(KnownChain::Ethereum | KnownChain::Goerli) => "switch-ethereum.ethereum-chain-title",
        Some(KnownChain::Polygon | KnownChain::Mumbai) => "switch-ethereum.polygon-chain-title",
        Some(KnownChain::QMainnet | KnownChain::QTestnet) => "switch-ethereum.q-chain-title",
        None => "switch-ethereum.unknown-chain-title",
    }
}

pub fn testnet_by_mainnet_chain_id(chain_id: &ChainId) -> Option<ChainId> {
    let testnet = match KnownChain::from_chain_id(chain_id)? {
        KnownChain::Ethereum => KnownChain::Goerli,
        KnownChain::Polygon => KnownChain::Mumbai,
        KnownChain::QMainnet => KnownChain::QTestnet,
        _ => return None,
    };
    Some(testnet.chain_id())
}

/// Chains the application admits for the given network flavour.
pub fn admitted_chain_ids(is_mainnet: bool) -> Vec<ChainId> {
    KnownChain::ALL
        .into_iter()
        .filter(|chain| chain.is_mainnet() == is_mainnet)
        .map(|chain| chain.chain_id())
        .collect()
}

/// Static EIP-3085 config for chains a wallet may not know about.
/// Ethereum networks are built into every wallet and have none.
pub fn network_config_by_chain_id(chain_id: &ChainId) -> Option<AddEthereumChainParameter> {
    match KnownChain::from_chain_id(chain_id)? {
        KnownChain::Polygon => Some(polygon_mainnet_network_config()),
        KnownChain::Mumbai => Some(mumbai_testnet_network_config()),
        KnownChain::QMainnet => Some(q_mainnet_network_config()),
        KnownChain::QTestnet => Some(q_testnet_network_config()),
        KnownChain::Ethereum | KnownChain::Goerli => None,
    }
}

pub fn polygon_mainnet_network_config() -> AddEthereumChainParameter {
    network_config(
        KnownChain::Polygon,
        "Polygon Mainnet",
        "MATIC",
        "https://polygon-rpc.com/",
        "https://polygonscan.com/",
    )
}

pub fn mumbai_testnet_network_config() -> AddEthereumChainParameter {
    network_config(
        KnownChain::Mumbai,
        "Mumbai",
        "MATIC",
        "https://matic-mumbai.chainstacklabs.com",
        "https://mumbai.polygonscan.com/",
    )
}

pub fn q_mainnet_network_config() -> AddEthereumChainParameter {
    network_config(
        KnownChain::QMainnet,
        "Q Mainnet",
        "Q ",
        "https://rpc.q.org",
        "https://explorer.q.org",
    )
}

pub fn q_testnet_network_config() -> AddEthereumChainParameter {
    network_config(
        KnownChain::QTestnet,
        "Q Testnet",
        "Q ",
        "https://rpc.qtestnet.org",
        "https://explorer.qtestnet.org",
    )
}

fn network_config(
    chain: KnownChain,
    chain_name: &str,
    currency: &str,
    rpc_url: &str,
    explorer_url: &str,
) -> AddEthereumChainParameter {
    AddEthereumChainParameter {
        chain_id: format!("{:#x}", chain.id()),
        chain_name: chain_name.to_owned(),
        native_currency: NativeCurrency {
            name: currency.to_owned(),
            symbol: currency.to_owned(),
            decimals: 18,
        },
        rpc_urls: vec![rpc_url.to_owned()],
        block_explorer_urls: Some(vec![explorer_url.to_owned()]),
        icon_urls: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_config_serializes_per_eip3085() {
        let json = serde_json::to_value(polygon_mainnet_network_config()).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "chainId": "0x89",
                "chainName": "Polygon Mainnet",
                "nativeCurrency": { "name": "MATIC", "symbol": "MATIC", "decimals": 18 },
                "rpcUrls": ["https://polygon-rpc.com/"],
                "blockExplorerUrls": ["https://polygonscan.com/"]
            })
        );
    }

    #[test]
    fn ethereum_networks_have_no_add_config() {
        assert!(network_config_by_chain_id(&ChainId::from(1u64)).is_none());
        assert!(network_config_by_chain_id(&ChainId::from(5u64)).is_none());
        assert!(network_config_by_chain_id(&ChainId::from(999u64)).is_none());
        assert_eq!(
            network_config_by_chain_id(&ChainId::from("35443")).map(|c| c.chain_id),
            Some("0x8a73".to_owned())
        );
    }

    #[test]
    fn testnet_lookup_and_admitted_sets() {
        assert_eq!(
            testnet_by_mainnet_chain_id(&ChainId::from(137u64)),
            Some(ChainId::from(80001u64))
        );
        assert_eq!(testnet_by_mainnet_chain_id(&ChainId::from(5u64)), None);
        assert_eq!(
            admitted_chain_ids(false),
            vec![
                ChainId::from(5u64),
                ChainId::from(80001u64),
                ChainId::from(35443u64)
            ]
        );
        assert_eq!(
            title_key_by_chain_id(&ChainId::from(35441u64)),
            "switch-ethereum.q-chain-title"
        );
    }
}
