use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Networks the generator produces catalogs for. Serialized names double as
/// output file names, so their exact casing matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NetworkName {
    #[serde(rename = "ETH")]
    Ethereum,
    #[serde(rename = "ETC")]
    EthereumClassic,
    #[serde(rename = "BNB")]
    Binance,
    #[serde(rename = "MATIC")]
    Matic,
    #[serde(rename = "OP")]
    Optimism,
    #[serde(rename = "ARB")]
    Arbitrum,
    #[serde(rename = "GNO")]
    Gnosis,
    #[serde(rename = "AVAX")]
    Avalanche,
    #[serde(rename = "FTM")]
    Fantom,
    #[serde(rename = "KAIA")]
    Kaia,
    #[serde(rename = "AURORA")]
    Aurora,
    #[serde(rename = "GLMR")]
    Moonbeam,
    #[serde(rename = "zkSync")]
    ZkSync,
    #[serde(rename = "BASE")]
    Base,
    #[serde(rename = "MATICZK")]
    MaticZk,
    #[serde(rename = "SOLANA")]
    Solana,
    #[serde(rename = "Rootstock")]
    Rootstock,
    #[serde(rename = "TLOS")]
    Telos,
    #[serde(rename = "blast")]
    Blast,
}

impl NetworkName {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkName::Ethereum => "ETH",
            NetworkName::EthereumClassic => "ETC",
            NetworkName::Binance => "BNB",
            NetworkName::Matic => "MATIC",
            NetworkName::Optimism => "OP",
            NetworkName::Arbitrum => "ARB",
            NetworkName::Gnosis => "GNO",
            NetworkName::Avalanche => "AVAX",
            NetworkName::Fantom => "FTM",
            NetworkName::Kaia => "KAIA",
            NetworkName::Aurora => "AURORA",
            NetworkName::Moonbeam => "GLMR",
            NetworkName::ZkSync => "zkSync",
            NetworkName::Base => "BASE",
            NetworkName::MaticZk => "MATICZK",
            NetworkName::Solana => "SOLANA",
            NetworkName::Rootstock => "Rootstock",
            NetworkName::Telos => "TLOS",
            NetworkName::Blast => "blast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|n| n.as_str() == s)
    }

    /// Every supported network, in a stable order.
    pub fn all() -> &'static [NetworkName] {
        &[
            NetworkName::Ethereum,
            NetworkName::EthereumClassic,
            NetworkName::Binance,
            NetworkName::Matic,
            NetworkName::Optimism,
            NetworkName::Arbitrum,
            NetworkName::Gnosis,
            NetworkName::Avalanche,
            NetworkName::Fantom,
            NetworkName::Kaia,
            NetworkName::Aurora,
            NetworkName::Moonbeam,
            NetworkName::ZkSync,
            NetworkName::Base,
            NetworkName::MaticZk,
            NetworkName::Solana,
            NetworkName::Rootstock,
            NetworkName::Telos,
            NetworkName::Blast,
        ]
    }
}

impl std::fmt::Display for NetworkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Evm,
    Substrate,
    Bitcoin,
    Solana,
}

/// A catalog entry. Optional fields are dropped from the JSON entirely when
/// unset, matching what downstream consumers expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: NetworkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(rename = "cgId", skip_serializing_if = "Option::is_none")]
    pub cg_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Per-network output: the full list plus the two curated orderings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkCatalog {
    pub all: Vec<Token>,
    pub trending: Vec<Token>,
    pub top: Vec<Token>,
}

/// Market standing of a coin in the top-250 snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketStanding {
    pub rank: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Global canonical-coin index fetched once per run. Ordered maps keep the
/// serialized snapshot stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinIndex {
    #[serde(rename = "contractsToId")]
    pub contracts_to_id: BTreeMap<String, String>,
    #[serde(rename = "topTokens")]
    pub top_tokens: BTreeMap<String, MarketStanding>,
    #[serde(rename = "trendingTokens")]
    pub trending_tokens: BTreeMap<String, u32>,
}

impl CoinIndex {
    /// Canonical id for a lowercased contract address, if the index knows it.
    pub fn id_for_contract(&self, address: &str) -> Option<&str> {
        self.contracts_to_id.get(address).map(|s| s.as_str())
    }
}

/// CoinGecko-hosted icons come in thumb and large renditions at the same
/// path. Lists serve the thumb variant; swap it for the large one. Other
/// hosts pass through untouched.
pub fn upgrade_logo_uri(uri: &str) -> String {
    if uri.contains("assets.coingecko.com") {
        uri.replacen("/thumb/", "/large/", 1)
    } else {
        uri.to_string()
    }
}
