use std::collections::{BTreeMap, HashMap, HashSet};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{get_json, RetryPolicy, SourceError};
use crate::chains::NATIVE_ADDRESS;
use crate::types::{NetworkName, Token};

const RANGO_BASE: &str = "https://api.rango.exchange/";

/// Rango's view of a chain. `chain_id` is the id Rango puts on its tokens
/// ("mainnet-beta" for Solana, decimal strings for EVM), `standard_chain_id`
/// the EIP-155 / SLIP-44 number everyone else uses.
#[derive(Debug, Clone, Copy)]
pub struct RangoPlatform {
    pub standard_chain_id: u64,
    pub chain_id: &'static str,
    pub name: &'static str,
}

pub fn rango_platform(network: NetworkName) -> Option<RangoPlatform> {
    let platform = |standard_chain_id, chain_id, name| RangoPlatform {
        standard_chain_id,
        chain_id,
        name,
    };
    match network {
        NetworkName::Ethereum => Some(platform(1, "1", "ETH")),
        NetworkName::Binance => Some(platform(56, "56", "BSC")),
        NetworkName::Base => Some(platform(8453, "8453", "BASE")),
        NetworkName::Matic => Some(platform(137, "137", "POLYGON")),
        NetworkName::Optimism => Some(platform(10, "10", "OPTIMISM")),
        NetworkName::Avalanche => Some(platform(43114, "43114", "AVAX_CCHAIN")),
        NetworkName::Fantom => Some(platform(250, "250", "FANTOM")),
        NetworkName::Aurora => Some(platform(1313161554, "1313161554", "AURORA")),
        NetworkName::Gnosis => Some(platform(100, "100", "GNOSIS")),
        NetworkName::Arbitrum => Some(platform(42161, "42161", "ARBITRUM")),
        NetworkName::Moonbeam => Some(platform(1284, "1284", "MOONBEAM")),
        NetworkName::Solana => Some(platform(900, "mainnet-beta", "SOLANA")),
        NetworkName::Blast => Some(platform(81457, "81457", "BLAST")),
        NetworkName::Telos => Some(platform(40, "40", "TELOS")),
        _ => None,
    }
}

/// One token from Rango's `basic/meta` catalog, carried through to the
/// output verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangoToken {
    pub blockchain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub decimals: u8,
    pub image: String,
    pub blockchain_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_price: Option<f64>,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub supported_swappers: Vec<String>,
    /// Wire fields we do not model, carried through to rango.json verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A Rango catalog entry joined against a network's merged token list. The
/// join is Rango-supply-driven: every fetched Rango token on the network is
/// emitted, matched or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangoRecord {
    #[serde(rename = "rangoMeta")]
    pub rango_meta: RangoToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    tokens: Vec<serde_json::Value>,
}

/// Rango multi-chain swap aggregator. The client owns its API key, built
/// once at startup and passed to where it is used.
pub struct RangoClient {
    client: Client,
    api_key: String,
}

impl RangoClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Fetch Rango's token catalog, keeping only tokens on chains we can map
    /// back to a supported network, name-sorted.
    pub async fn fetch_meta(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<RangoToken>, SourceError> {
        let url = format!(
            "{RANGO_BASE}basic/meta?excludeNonPopulars=true&transactionTypes=EVM&transactionTypes=SOLANA&apiKey={}",
            self.api_key
        );
        let response: MetaResponse =
            get_json(&self.client, &url, RetryPolicy::default(), cancel).await?;

        let known_chain_ids: Vec<&str> = NetworkName::all()
            .iter()
            .filter_map(|network| rango_platform(*network))
            .map(|platform| platform.chain_id)
            .collect();

        let mut tokens: Vec<RangoToken> = Vec::with_capacity(response.tokens.len());
        for raw in response.tokens {
            let token: RangoToken = match serde_json::from_value(raw) {
                Ok(token) => token,
                Err(err) => {
                    warn!("Rango: skipping malformed meta entry: {err}");
                    continue;
                }
            };
            let Some(chain_id) = token.chain_id.as_deref() else {
                continue;
            };
            if known_chain_ids.contains(&chain_id) {
                tokens.push(token);
            }
        }
        tokens.sort_by(|a, b| sort_name(a).cmp(sort_name(b)));
        info!("fetched {} Rango tokens on supported chains", tokens.len());
        Ok(tokens)
    }
}

fn sort_name(token: &RangoToken) -> &str {
    match token.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ if !token.blockchain.is_empty() => &token.blockchain,
        _ => "aaa",
    }
}

/// Join the fetched Rango catalog against one network's merged tokens. A
/// Rango token with no address is the chain's native currency. Networks
/// without a Rango platform yield nothing.
pub fn merge_rango_network(
    network: NetworkName,
    rango_tokens: &[RangoToken],
    tokens: &[Token],
) -> Vec<RangoRecord> {
    let Some(platform) = rango_platform(network) else {
        return Vec::new();
    };

    let mut by_address: HashMap<String, &Token> = HashMap::with_capacity(tokens.len());
    for token in tokens {
        if let Some(previous) = by_address.insert(token.address.to_lowercase(), token) {
            warn!(
                "Rango merge: duplicate catalog address {} on {network}",
                previous.address
            );
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    for rango_token in rango_tokens {
        if rango_token.chain_id.as_deref() != Some(platform.chain_id) {
            continue;
        }
        let address = rango_token
            .address
            .as_deref()
            .unwrap_or(NATIVE_ADDRESS)
            .to_lowercase();
        if !seen.insert(address.clone()) {
            warn!("Rango merge: duplicate Rango address {address} on {network}");
        }
        records.push(RangoRecord {
            rango_meta: rango_token.clone(),
            token: by_address.get(&address).map(|token| (*token).clone()),
        });
    }
    records
}
