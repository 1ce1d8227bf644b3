use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{get_json, insert_lowercased, RetryPolicy, SourceError, TokenMap, TokenSource};
use crate::chains::{chain_config, NATIVE_ADDRESS};
use crate::types::{upgrade_logo_uri, CoinIndex, MarketStanding, NetworkName, Token};

const CG_BASE: &str = "https://tokens.coingecko.com/";
const CG_API_BASE: &str = "https://partners.mewapi.io/coingecko/api/v3/";

/// Known-broken contracts that must never reach the output lists.
const EXCLUDED_ADDRESSES: [&str; 1] = ["0x0000000000000000000000000000000000001010"];

const SUPPORTED: [NetworkName; 18] = [
    NetworkName::Ethereum,
    NetworkName::Binance,
    NetworkName::Matic,
    NetworkName::Optimism,
    NetworkName::Arbitrum,
    NetworkName::Gnosis,
    NetworkName::Avalanche,
    NetworkName::Fantom,
    NetworkName::Kaia,
    NetworkName::Aurora,
    NetworkName::EthereumClassic,
    NetworkName::Moonbeam,
    NetworkName::Base,
    NetworkName::MaticZk,
    NetworkName::Rootstock,
    NetworkName::Solana,
    NetworkName::Telos,
    NetworkName::Blast,
];

fn platform_slug(network: NetworkName) -> &'static str {
    match network {
        NetworkName::Ethereum => "ethereum",
        NetworkName::Matic => "polygon-pos",
        NetworkName::Binance => "binance-smart-chain",
        NetworkName::Arbitrum => "arbitrum-one",
        NetworkName::Avalanche => "avalanche",
        NetworkName::Aurora => "aurora",
        NetworkName::Fantom => "fantom",
        NetworkName::Gnosis => "xdai",
        NetworkName::Kaia => "klay-token",
        NetworkName::Optimism => "optimistic-ethereum",
        NetworkName::EthereumClassic => "ethereum-classic",
        NetworkName::Moonbeam => "moonbeam",
        NetworkName::ZkSync => "zksync",
        NetworkName::Base => "base",
        NetworkName::MaticZk => "polygon-zkevm",
        NetworkName::Rootstock => "rootstock",
        NetworkName::Solana => "solana",
        NetworkName::Telos => "telos",
        NetworkName::Blast => "blast",
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    tokens: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ListToken {
    address: String,
    symbol: String,
    decimals: u8,
    name: String,
    #[serde(rename = "logoURI")]
    logo_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    coins: Vec<TrendingCoin>,
}

#[derive(Debug, Deserialize)]
struct TrendingCoin {
    item: TrendingItem,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    id: String,
    score: u32,
}

#[derive(Debug, Deserialize)]
struct MarketCoin {
    id: String,
    market_cap_rank: Option<u32>,
    current_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CoinListEntry {
    id: String,
    #[serde(default)]
    platforms: std::collections::HashMap<String, Option<String>>,
}

/// Token lists hosted by CoinGecko, plus the global canonical-coin index
/// (contract-to-id mapping, top-250 market standings, trending search).
pub struct CoinGeckoSource {
    client: Client,
}

impl CoinGeckoSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The three index fetches are independent, so they run concurrently.
    /// Any of them failing fails the index as a whole.
    pub async fn fetch_coin_index(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CoinIndex, SourceError> {
        let (trending_tokens, top_tokens, contracts_to_id) = tokio::try_join!(
            self.fetch_trending(cancel),
            self.fetch_top_markets(cancel),
            self.fetch_contract_ids(cancel),
        )?;
        info!(
            "fetched CoinGecko index: {} trending, {} top, {} contract mappings",
            trending_tokens.len(),
            top_tokens.len(),
            contracts_to_id.len()
        );
        Ok(CoinIndex {
            contracts_to_id,
            top_tokens,
            trending_tokens,
        })
    }

    async fn fetch_trending(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, u32>, SourceError> {
        let url = format!("{CG_API_BASE}search/trending");
        let response: TrendingResponse =
            get_json(&self.client, &url, RetryPolicy::default(), cancel).await?;
        let mut map = BTreeMap::new();
        for coin in response.coins {
            map.insert(coin.item.id, coin.item.score);
        }
        Ok(map)
    }

    async fn fetch_top_markets(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, MarketStanding>, SourceError> {
        let url = format!(
            "{CG_API_BASE}coins/markets?vs_currency=usd&order=market_cap_desc&per_page=250&page=1&sparkline=false"
        );
        let coins: Vec<MarketCoin> =
            get_json(&self.client, &url, RetryPolicy::default(), cancel).await?;
        let mut map = BTreeMap::new();
        for coin in coins {
            let Some(rank) = coin.market_cap_rank else {
                debug!("top-250 coin {} has no market cap rank, skipping", coin.id);
                continue;
            };
            map.insert(
                coin.id,
                MarketStanding {
                    rank,
                    price: coin.current_price,
                },
            );
        }
        Ok(map)
    }

    /// CoinGecko cases base58 addresses (eg Solana) but not EVM addresses.
    /// All addresses are lowercased so joins elsewhere stay simple; we do not
    /// expect collisions.
    async fn fetch_contract_ids(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, String>, SourceError> {
        let url = format!("{CG_API_BASE}coins/list?include_platform=true");
        let coins: Vec<CoinListEntry> =
            get_json(&self.client, &url, RetryPolicy::default(), cancel).await?;
        let mut map = BTreeMap::new();
        for coin in coins {
            for address in coin.platforms.into_values().flatten() {
                if address.is_empty() {
                    continue;
                }
                map.insert(address.to_lowercase(), coin.id.clone());
            }
        }
        Ok(map)
    }
}

fn build_token_map(network: NetworkName, response: ListResponse) -> TokenMap {
    let config = chain_config(network);
    let mut map = TokenMap::new();
    for raw in response.tokens {
        let token: ListToken = match serde_json::from_value(raw) {
            Ok(token) => token,
            Err(err) => {
                warn!("CoinGecko: skipping malformed {network} list entry: {err}");
                continue;
            }
        };
        if EXCLUDED_ADDRESSES
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(&token.address))
        {
            continue;
        }
        insert_lowercased(
            &mut map,
            "CoinGecko",
            Token {
                // Original casing kept, some networks are case sensitive.
                address: token.address,
                decimals: token.decimals,
                logo_uri: token.logo_uri.map(|uri| upgrade_logo_uri(&uri)),
                name: token.name,
                symbol: token.symbol,
                kind: config.kind,
                rank: None,
                cg_id: None,
                price: None,
            },
        );
    }
    map.insert(
        NATIVE_ADDRESS.to_string(),
        Token {
            address: NATIVE_ADDRESS.to_string(),
            decimals: config.decimals,
            logo_uri: Some(upgrade_logo_uri(config.logo_uri)),
            name: config.name.to_string(),
            symbol: config.symbol.to_string(),
            kind: config.kind,
            rank: None,
            cg_id: Some(config.cg_id.to_string()),
            price: None,
        },
    );
    map
}

#[async_trait]
impl TokenSource for CoinGeckoSource {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    fn supported_networks(&self) -> &'static [NetworkName] {
        &SUPPORTED
    }

    async fn fetch_tokens(
        &self,
        network: NetworkName,
        cancel: &CancellationToken,
    ) -> Result<TokenMap, SourceError> {
        let url = format!("{CG_BASE}{}/all.json", platform_slug(network));
        let response: ListResponse =
            get_json(&self.client, &url, RetryPolicy::default(), cancel).await?;
        let map = build_token_map(network, response);
        info!("fetched {} CoinGecko tokens for {network}", map.len());
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NetworkType;

    #[test]
    fn list_entries_are_keyed_lowercase_with_casing_preserved() {
        let response: ListResponse = serde_json::from_str(
            r#"{"tokens":[
                {"chainId":1,"address":"0xC581b735A1688071A1746c968e0798D642EDE491","symbol":"EURT","decimals":6,"name":"Tether EURt","logoURI":"https://assets.coingecko.com/coins/images/17043/thumb/eurt.png"}
            ]}"#,
        )
        .unwrap();
        let map = build_token_map(NetworkName::Ethereum, response);
        let token = &map["0xc581b735a1688071a1746c968e0798d642ede491"];
        assert_eq!(token.address, "0xC581b735A1688071A1746c968e0798D642EDE491");
        assert_eq!(token.kind, NetworkType::Evm);
        assert_eq!(
            token.logo_uri.as_deref(),
            Some("https://assets.coingecko.com/coins/images/17043/large/eurt.png")
        );
    }

    #[test]
    fn excluded_and_malformed_entries_are_dropped() {
        let response: ListResponse = serde_json::from_str(
            r#"{"tokens":[
                {"address":"0x0000000000000000000000000000000000001010","symbol":"MATIC","decimals":18,"name":"Matic"},
                {"address":"0x1","symbol":"BROKEN","decimals":"not-a-number","name":"Broken"},
                {"address":"0x2222222222222222222222222222222222222222","symbol":"OK","decimals":18,"name":"Fine"}
            ]}"#,
        )
        .unwrap();
        let map = build_token_map(NetworkName::Matic, response);
        assert!(!map.contains_key("0x0000000000000000000000000000000000001010"));
        assert!(!map.contains_key("0x1"));
        assert!(map.contains_key("0x2222222222222222222222222222222222222222"));
    }

    #[test]
    fn native_entry_is_injected_from_chain_config() {
        let response: ListResponse = serde_json::from_str(r#"{"tokens":[]}"#).unwrap();
        let map = build_token_map(NetworkName::Moonbeam, response);
        let native = &map[NATIVE_ADDRESS];
        assert_eq!(native.symbol, "GLMR");
        assert_eq!(native.cg_id.as_deref(), Some("moonbeam"));
        assert_eq!(native.decimals, 18);
        assert_eq!(
            native.logo_uri.as_deref(),
            Some("https://assets.coingecko.com/coins/images/22459/large/glmr.png")
        );
    }

    #[test]
    fn zksync_is_not_list_supported() {
        assert!(!SUPPORTED.contains(&NetworkName::ZkSync));
        assert_eq!(SUPPORTED.len(), 18);
    }
}
