use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{
    get_json, insert_lowercased, FailurePolicy, RetryPolicy, SourceError, TokenMap, TokenSource,
};
use crate::chains::chain_config;
use crate::types::{upgrade_logo_uri, NetworkName, Token};

const PARASWAP_BASE: &str = "https://apiv5.paraswap.io/";

/// Generic fallback icon ParaSwap serves for tokens it has no artwork for.
/// Entries carrying it are dropped, a list token without a real image is not
/// worth surfacing.
const PLACEHOLDER_IMG: &str = "https://cdn.paraswap.io/token/token.png";

const SUPPORTED: [NetworkName; 8] = [
    NetworkName::Ethereum,
    NetworkName::Binance,
    NetworkName::Matic,
    NetworkName::Avalanche,
    // Fantom support dropped upstream
    NetworkName::Arbitrum,
    NetworkName::Base,
    NetworkName::Optimism,
    NetworkName::MaticZk,
];

#[derive(Debug, Deserialize)]
struct ParaswapResponse {
    tokens: Vec<ParaswapToken>,
}

#[derive(Debug, Deserialize)]
struct ParaswapToken {
    symbol: String,
    address: String,
    decimals: u8,
    img: Option<String>,
}

/// ParaSwap token lists. The API exposes no display name, so the symbol
/// stands in for it.
pub struct ParaswapSource {
    client: Client,
}

impl ParaswapSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn build_token_map(network: NetworkName, response: ParaswapResponse) -> TokenMap {
    let kind = chain_config(network).kind;
    let mut map = TokenMap::new();
    for token in response.tokens {
        if token.img.as_deref() == Some(PLACEHOLDER_IMG) {
            continue;
        }
        insert_lowercased(
            &mut map,
            "Paraswap",
            Token {
                address: token.address,
                decimals: token.decimals,
                logo_uri: token.img.map(|uri| upgrade_logo_uri(&uri)),
                name: token.symbol.clone(),
                symbol: token.symbol,
                kind,
                rank: None,
                cg_id: None,
                price: None,
            },
        );
    }
    map
}

#[async_trait]
impl TokenSource for ParaswapSource {
    fn name(&self) -> &'static str {
        "Paraswap"
    }

    fn supported_networks(&self) -> &'static [NetworkName] {
        &SUPPORTED
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Majority
    }

    async fn fetch_tokens(
        &self,
        network: NetworkName,
        cancel: &CancellationToken,
    ) -> Result<TokenMap, SourceError> {
        let url = format!("{PARASWAP_BASE}tokens/{}", chain_config(network).chain_id);
        let response: ParaswapResponse =
            get_json(&self.client, &url, RetryPolicy::default(), cancel).await?;
        let map = build_token_map(network, response);
        info!("fetched {} Paraswap tokens for {network}", map.len());
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_image_tokens_are_dropped() {
        let response: ParaswapResponse = serde_json::from_str(
            r#"{"tokens":[
                {"symbol":"WETH","address":"0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2","decimals":18,"img":"https://img.paraswap.network/WETH.png"},
                {"symbol":"JUNK","address":"0x1111111111111111111111111111111111111111","decimals":18,"img":"https://cdn.paraswap.io/token/token.png"}
            ]}"#,
        )
        .unwrap();
        let map = build_token_map(NetworkName::Ethereum, response);
        assert_eq!(map.len(), 1);
        let weth = &map["0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"];
        assert_eq!(weth.name, "WETH");
        assert_eq!(weth.symbol, "WETH");
        assert_eq!(
            weth.logo_uri.as_deref(),
            Some("https://img.paraswap.network/WETH.png")
        );
    }

    #[test]
    fn missing_image_keeps_the_token_without_a_logo() {
        let response: ParaswapResponse = serde_json::from_str(
            r#"{"tokens":[{"symbol":"BARE","address":"0x2222222222222222222222222222222222222222","decimals":8}]}"#,
        )
        .unwrap();
        let map = build_token_map(NetworkName::Matic, response);
        assert_eq!(map["0x2222222222222222222222222222222222222222"].logo_uri, None);
    }
}
