use crate::types::{NetworkName, NetworkType};

/// Sentinel address used for a network's native currency in every output
/// list. Providers that include the native asset (1inch) use the same
/// placeholder.
pub const NATIVE_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// Static description of a network's native currency and provider-facing id.
#[derive(Debug, Clone, Copy)]
pub struct ChainConfig {
    pub chain_id: &'static str,
    pub kind: NetworkType,
    pub cg_id: &'static str,
    pub logo_uri: &'static str,
    pub decimals: u8,
    pub symbol: &'static str,
    pub name: &'static str,
}

pub fn chain_config(network: NetworkName) -> ChainConfig {
    match network {
        NetworkName::Ethereum => ChainConfig {
            chain_id: "1",
            kind: NetworkType::Evm,
            cg_id: "ethereum",
            logo_uri: "https://tokens.1inch.io/0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee.png",
            decimals: 18,
            symbol: "ETH",
            name: "Ethereum",
        },
        NetworkName::EthereumClassic => ChainConfig {
            chain_id: "61",
            kind: NetworkType::Evm,
            cg_id: "ethereum-classic",
            logo_uri: "https://assets.coingecko.com/coins/images/453/thumb/ethereum-classic-logo.png",
            decimals: 18,
            symbol: "ETC",
            name: "Ethereum Classic",
        },
        NetworkName::Binance => ChainConfig {
            chain_id: "56",
            kind: NetworkType::Evm,
            cg_id: "binancecoin",
            logo_uri: "https://tokens.1inch.io/0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c_1.png",
            decimals: 18,
            symbol: "BNB",
            name: "BNB",
        },
        NetworkName::Matic => ChainConfig {
            chain_id: "137",
            kind: NetworkType::Evm,
            cg_id: "matic-network",
            logo_uri: "https://tokens.1inch.io/0x7d1afa7b718fb893db30a3abc0cfc608aacfebb0.png",
            decimals: 18,
            symbol: "POL",
            name: "POL",
        },
        NetworkName::Optimism => ChainConfig {
            chain_id: "10",
            kind: NetworkType::Evm,
            cg_id: "ethereum",
            logo_uri: "https://tokens.1inch.io/0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee.png",
            decimals: 18,
            symbol: "ETH",
            name: "Ethereum",
        },
        NetworkName::Arbitrum => ChainConfig {
            chain_id: "42161",
            kind: NetworkType::Evm,
            cg_id: "ethereum",
            logo_uri: "https://tokens.1inch.io/0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee.png",
            decimals: 18,
            symbol: "ETH",
            name: "Ethereum",
        },
        NetworkName::Gnosis => ChainConfig {
            chain_id: "100",
            kind: NetworkType::Evm,
            cg_id: "dai",
            logo_uri: "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/ethereum/assets/0x6B175474E89094C44Da98b954EedeAC495271d0F/logo.png",
            decimals: 18,
            symbol: "xDAI",
            name: "xDAI",
        },
        NetworkName::Avalanche => ChainConfig {
            chain_id: "43114",
            kind: NetworkType::Evm,
            cg_id: "avalanche-2",
            logo_uri: "https://tokens.1inch.io/0xb31f66aa3c1e785363f0875a1b74e27b85fd66c7.png",
            decimals: 18,
            symbol: "AVAX",
            name: "Avalanche",
        },
        NetworkName::Fantom => ChainConfig {
            chain_id: "250",
            kind: NetworkType::Evm,
            cg_id: "fantom",
            logo_uri: "https://tokens.1inch.io/0x4e15361fd6b4bb609fa63c81a2be19d873717870.png",
            decimals: 18,
            symbol: "FTM",
            name: "Fantom Token",
        },
        NetworkName::Kaia => ChainConfig {
            chain_id: "8217",
            kind: NetworkType::Evm,
            cg_id: "klay-token",
            logo_uri: "https://tokens.1inch.io/0xe4f05a66ec68b54a58b17c22107b02e0232cc817.png",
            decimals: 18,
            symbol: "KAIA",
            name: "Kaia",
        },
        NetworkName::Aurora => ChainConfig {
            chain_id: "1313161554",
            kind: NetworkType::Evm,
            cg_id: "ethereum",
            logo_uri: "https://tokens.1inch.io/0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee.png",
            decimals: 18,
            symbol: "ETH",
            name: "Ethereum",
        },
        NetworkName::Moonbeam => ChainConfig {
            chain_id: "1284",
            kind: NetworkType::Evm,
            cg_id: "moonbeam",
            logo_uri: "https://assets.coingecko.com/coins/images/22459/thumb/glmr.png",
            decimals: 18,
            symbol: "GLMR",
            name: "Moonbeam",
        },
        NetworkName::ZkSync => ChainConfig {
            chain_id: "324",
            kind: NetworkType::Evm,
            cg_id: "ethereum",
            logo_uri: "https://tokens.1inch.io/0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee.png",
            decimals: 18,
            symbol: "ETH",
            name: "Ethereum",
        },
        NetworkName::Base => ChainConfig {
            chain_id: "8453",
            kind: NetworkType::Evm,
            cg_id: "ethereum",
            logo_uri: "https://tokens.1inch.io/0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee.png",
            decimals: 18,
            symbol: "ETH",
            name: "Ethereum",
        },
        NetworkName::MaticZk => ChainConfig {
            chain_id: "1101",
            kind: NetworkType::Evm,
            cg_id: "ethereum",
            logo_uri: "https://tokens.1inch.io/0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee.png",
            decimals: 18,
            symbol: "ETH",
            name: "Ethereum",
        },
        NetworkName::Solana => ChainConfig {
            chain_id: "900",
            kind: NetworkType::Solana,
            cg_id: "solana",
            logo_uri: "https://assets.coingecko.com/coins/images/4128/thumb/solana.png",
            decimals: 9,
            symbol: "SOL",
            name: "Solana",
        },
        NetworkName::Rootstock => ChainConfig {
            chain_id: "30",
            kind: NetworkType::Evm,
            cg_id: "rootstock",
            logo_uri: "https://assets.coingecko.com/coins/images/5070/thumb/rsk-logo.jpg",
            decimals: 18,
            symbol: "RBTC",
            name: "Rootstock",
        },
        NetworkName::Telos => ChainConfig {
            chain_id: "40",
            kind: NetworkType::Evm,
            cg_id: "telos",
            logo_uri: "https://assets.coingecko.com/coins/images/7588/thumb/tlos_png.png",
            decimals: 18,
            symbol: "TLOS",
            name: "Telos",
        },
        NetworkName::Blast => ChainConfig {
            chain_id: "81457",
            kind: NetworkType::Evm,
            cg_id: "ethereum",
            logo_uri: "https://tokens.1inch.io/0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee.png",
            decimals: 18,
            symbol: "ETH",
            name: "Ethereum",
        },
    }
}
