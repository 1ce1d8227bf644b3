use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::sources::{post_json, RetryPolicy, SourceError};

const ETHVM_BASE: &str = "https://api-v3.ethvm.dev/";
const CHUNK_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: GraphqlData,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    #[serde(rename = "getCoinGeckoTokenMarketDataByIds")]
    market_data: Vec<Option<MarketDataEntry>>,
}

#[derive(Debug, Deserialize)]
struct MarketDataEntry {
    current_price: Option<f64>,
}

/// Batch price lookup against the ethvm GraphQL API, the last rung of the
/// price cascade. Ids are chunked to keep request sizes sane; response
/// entries are positional with the requested ids. Ids the oracle does not
/// know come back null and stay unpriced for the run.
pub async fn fetch_prices(
    client: &Client,
    cg_ids: &[String],
    cancel: &CancellationToken,
) -> Result<BTreeMap<String, f64>, SourceError> {
    let mut prices = BTreeMap::new();
    for chunk in cg_ids.chunks(CHUNK_SIZE) {
        let quoted: Vec<String> = chunk.iter().map(|id| format!("{id:?}")).collect();
        let query = format!(
            "query {{ getCoinGeckoTokenMarketDataByIds(coinGeckoTokenIds: [{}]) {{ current_price }} }}",
            quoted.join(", ")
        );
        let body = serde_json::json!({ "query": query });
        let response: GraphqlResponse =
            post_json(client, ETHVM_BASE, body, RetryPolicy::default(), cancel).await?;

        if response.data.market_data.len() != chunk.len() {
            return Err(SourceError::InvalidResponse(format!(
                "oracle returned {} entries for {} requested ids",
                response.data.market_data.len(),
                chunk.len()
            )));
        }
        for (id, entry) in chunk.iter().zip(response.data.market_data) {
            let Some(price) = entry.and_then(|entry| entry.current_price) else {
                continue;
            };
            if let Some(previous) = prices.insert(id.clone(), price) {
                warn!("oracle returned {id} twice ({previous} then {price}), keeping the later");
            }
        }
    }
    info!(
        "oracle resolved {} of {} missing prices",
        prices.len(),
        cg_ids.len()
    );
    Ok(prices)
}
