use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{post_json, RetryPolicy, SourceError};
use crate::chains::NATIVE_ADDRESS;
use crate::types::{upgrade_logo_uri, CoinIndex, NetworkName, NetworkType, Token};

// JSON-RPC endpoint. Full currency list:
// curl https://partners.mewapi.io/changelly-v2 -X POST -H Content-Type:application/json \
//   --data '{"id":"1","jsonrpc":"2.0","method":"getCurrenciesFull","params":{}}'
const CHANGELLY_BASE: &str = "https://partners.mewapi.io/changelly-v2";

/// One Changelly currency as served by `getCurrenciesFull`, plus the catalog
/// token it joins to once the per-network hydration has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangellyCurrency {
    pub name: String,
    pub ticker: String,
    pub full_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub enabled_from: bool,
    #[serde(default)]
    pub enabled_to: bool,
    #[serde(default)]
    pub fix_rate_enabled: bool,
    #[serde(default)]
    pub payin_confirmations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub blockchain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_id_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_time: Option<u64>,
    /// Wire fields we do not model. Carried through so the output keeps
    /// everything Changelly serves.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Vec<serde_json::Value>,
}

/// Changelly blockchain identifier per network, for the networks swaps run
/// on. Networks outside this map keep their currencies unhydrated.
fn platform_blockchain(network: NetworkName) -> Option<&'static str> {
    match network {
        NetworkName::Ethereum => Some("ethereum"),
        NetworkName::Matic => Some("polygon"),
        NetworkName::Binance => Some("binance_smart_chain"),
        NetworkName::EthereumClassic => Some("ethereum_classic"),
        NetworkName::Avalanche => Some("avaxc"),
        NetworkName::Kaia => Some("kaia"),
        NetworkName::Optimism => Some("optimism"),
        NetworkName::Moonbeam => Some("glmr"),
        NetworkName::Base => Some("BASE"),
        NetworkName::Rootstock => Some("rootstock"),
        NetworkName::Solana => Some("solana"),
        _ => None,
    }
}

/// Tickers whose Changelly records point at the wrong or missing contract,
/// pinned to the address we know they live at on the given network.
fn contract_overrides(network: NetworkName) -> &'static [(&'static str, &'static str)] {
    match network {
        NetworkName::Avalanche => &[
            ("gmx", "0x62edc0692bd897d2295872a9ffcac5425011c661"),
            ("joe", "0x6e84a6216ea6dacc71ee8e6b0a5b7322eebc0fdd"),
            ("usdtavac", "0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7"),
            ("usdcavac", "0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e"),
            ("qi", "0x8729438eb15e2c8b576fcc6aecda6a148776c0f5"),
        ],
        NetworkName::Moonbeam => &[("glmr", NATIVE_ADDRESS)],
        NetworkName::Optimism => &[("op", "0x4200000000000000000000000000000000000042")],
        _ => &[],
    }
}

/// Hardcoded native-currency tokens for chains we have no catalog for.
/// Attached at fetch time; hydration may later replace them on networks we
/// do produce catalogs for.
static NATIVE_OVERRIDES: Lazy<HashMap<&'static str, Token>> = Lazy::new(|| {
    let native = |decimals: u8, logo: &str, name: &str, symbol: &str, kind, cg_id: &str| Token {
        address: NATIVE_ADDRESS.to_string(),
        decimals,
        logo_uri: Some(upgrade_logo_uri(logo)),
        name: name.to_string(),
        symbol: symbol.to_string(),
        kind,
        rank: None,
        cg_id: Some(cg_id.to_string()),
        price: None,
    };
    HashMap::from([
        (
            "dot",
            native(
                10,
                "https://assets.coingecko.com/coins/images/12171/thumb/polkadot.png",
                "Polkadot",
                "DOT",
                NetworkType::Substrate,
                "polkadot",
            ),
        ),
        (
            "ksm",
            native(
                12,
                "https://assets.coingecko.com/coins/images/9568/thumb/m4zRhP5e_400x400.jpg",
                "Kusama",
                "ksm",
                NetworkType::Substrate,
                "kusama",
            ),
        ),
        (
            "btc",
            native(
                8,
                "https://assets.coingecko.com/coins/images/1/thumb/bitcoin.png",
                "Bitcoin",
                "BTC",
                NetworkType::Bitcoin,
                "bitcoin",
            ),
        ),
        (
            "ltc",
            native(
                8,
                "https://assets.coingecko.com/coins/images/2/thumb/litecoin.png",
                "Litecoin",
                "LTC",
                NetworkType::Bitcoin,
                "litecoin",
            ),
        ),
        (
            "doge",
            native(
                8,
                "https://assets.coingecko.com/coins/images/5/thumb/dogecoin.png",
                "Dogecoin",
                "DOGE",
                NetworkType::Bitcoin,
                "dogecoin",
            ),
        ),
        (
            "rbtc",
            native(
                18,
                "https://assets.coingecko.com/coins/images/5070/thumb/rsk-logo.jpg",
                "Rootstock RSK",
                "RBTC",
                NetworkType::Evm,
                "rootstock",
            ),
        ),
    ])
});

/// Cross-chain swap partner. Its currency list spans far more chains than
/// the catalogs do, so records only join where a platform mapping exists.
pub struct ChangellySource {
    client: Client,
}

impl ChangellySource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch every swappable currency, keeping only those enabled in both
    /// directions, sorted by full name.
    pub async fn fetch_currencies(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ChangellyCurrency>, SourceError> {
        let body = serde_json::json!({
            "id": "1",
            "jsonrpc": "2.0",
            "method": "getCurrenciesFull",
            "params": {},
        });
        let response: RpcResponse = post_json(
            &self.client,
            CHANGELLY_BASE,
            body,
            RetryPolicy::default(),
            cancel,
        )
        .await?;

        let mut currencies: Vec<ChangellyCurrency> = Vec::with_capacity(response.result.len());
        for raw in response.result {
            match serde_json::from_value::<ChangellyCurrency>(raw) {
                Ok(currency) => currencies.push(currency),
                Err(err) => warn!("Changelly: skipping malformed currency: {err}"),
            }
        }
        currencies.retain(|cur| cur.enabled && cur.enabled_from && cur.enabled_to);

        for currency in currencies.iter_mut() {
            if let Some(native) = NATIVE_OVERRIDES.get(currency.ticker.as_str()) {
                currency.token = Some(native.clone());
            }
        }

        currencies.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        info!("fetched {} enabled Changelly currencies", currencies.len());
        Ok(currencies)
    }
}

/// Attach catalog tokens to the currencies living on `network`. Joins run in
/// order: pinned ticker override, then native (no contract address), then
/// lowercased contract address. Currencies failing all three keep whatever
/// token they already carry.
pub fn hydrate_currencies(
    currencies: &mut [ChangellyCurrency],
    tokens: &[Token],
    network: NetworkName,
) {
    let Some(platform) = platform_blockchain(network) else {
        return;
    };
    let overrides = contract_overrides(network);

    let by_address: HashMap<String, &Token> = tokens
        .iter()
        .map(|token| (token.address.to_lowercase(), token))
        .collect();

    for currency in currencies.iter_mut() {
        if currency.blockchain != platform {
            continue;
        }
        let pinned = overrides
            .iter()
            .find(|(ticker, _)| *ticker == currency.ticker)
            .and_then(|(_, address)| by_address.get(*address));
        if let Some(token) = pinned {
            currency.token = Some((*token).clone());
            continue;
        }
        let contract = currency
            .contract_address
            .as_deref()
            .filter(|address| !address.is_empty());
        match contract {
            // No contract address means the chain's native currency.
            None => {
                if let Some(native) = by_address.get(NATIVE_ADDRESS) {
                    currency.token = Some((*native).clone());
                }
            }
            Some(address) => {
                if let Some(token) = by_address.get(&address.to_lowercase()) {
                    currency.token = Some((*token).clone());
                }
            }
        }
    }
}

/// Price attached tokens from the market index where the merge left them
/// unpriced, collecting ids the index cannot answer for the deferred oracle.
pub fn enrich_currency_prices(
    currencies: &mut [ChangellyCurrency],
    index: &CoinIndex,
) -> BTreeSet<String> {
    let mut missing = BTreeSet::new();
    for currency in currencies.iter_mut() {
        let Some(token) = currency.token.as_mut() else {
            continue;
        };
        if token.price.is_some() {
            continue;
        }
        let Some(cg_id) = token.cg_id.clone() else {
            continue;
        };
        match index.top_tokens.get(&cg_id).and_then(|standing| standing.price) {
            Some(price) => token.price = Some(price),
            None => {
                missing.insert(cg_id);
            }
        }
    }
    missing
}
