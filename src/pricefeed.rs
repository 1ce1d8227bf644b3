use std::collections::HashMap;

use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chains::chain_config;
use crate::sources::{get_json, RetryPolicy, SourceError};
use crate::types::NetworkName;

const FIAT_PRICES_BASE: &str = "https://api.paraswap.io/fiat/prices/";

/// Networks ParaSwap serves DEX-derived fiat prices for.
const SUPPORTED: [NetworkName; 6] = [
    NetworkName::Ethereum,
    NetworkName::Binance,
    NetworkName::Matic,
    NetworkName::Avalanche,
    NetworkName::Arbitrum,
    NetworkName::Optimism,
];

#[derive(Debug, Deserialize)]
struct FiatPrices {
    prices: HashMap<String, FiatPrice>,
}

#[derive(Debug, Deserialize)]
struct FiatPrice {
    price: f64,
    address: String,
}

/// DEX spot prices per network, keyed by lowercased address. These reflect
/// actual tradable liquidity, so the merge cascade consults them before the
/// market index. Networks outside the feed's coverage resolve nothing.
#[derive(Debug, Default)]
pub struct PriceFeed {
    prices: HashMap<NetworkName, HashMap<String, f64>>,
}

impl PriceFeed {
    pub fn price_for(&self, network: NetworkName, lowercase_address: &str) -> Option<f64> {
        self.prices.get(&network)?.get(lowercase_address).copied()
    }

    pub fn insert_network(&mut self, network: NetworkName, prices: HashMap<String, f64>) {
        self.prices.insert(network, prices);
    }
}

/// Fetch all supported networks concurrently. A failed network degrades to
/// an empty map with a warning; the merge cascade falls through to the
/// market index for those tokens.
pub async fn fetch_price_feed(client: &Client, cancel: &CancellationToken) -> PriceFeed {
    let fetches = SUPPORTED
        .iter()
        .map(|network| fetch_network_prices(client, *network, cancel));
    let mut feed = PriceFeed::default();
    for (network, result) in SUPPORTED.iter().zip(join_all(fetches).await) {
        match result {
            Ok(prices) => {
                info!("fetched {} DEX prices for {network}", prices.len());
                feed.prices.insert(*network, prices);
            }
            Err(err) => {
                warn!("DEX price feed failed for {network}, continuing without: {err}");
                feed.prices.insert(*network, HashMap::new());
            }
        }
    }
    feed
}

async fn fetch_network_prices(
    client: &Client,
    network: NetworkName,
    cancel: &CancellationToken,
) -> Result<HashMap<String, f64>, SourceError> {
    let url = format!("{FIAT_PRICES_BASE}{}", chain_config(network).chain_id);
    let response: FiatPrices = get_json(client, &url, RetryPolicy::default(), cancel).await?;
    Ok(response
        .prices
        .into_values()
        .map(|entry| (entry.address.to_lowercase(), entry.price))
        .collect())
}
