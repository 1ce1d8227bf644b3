use std::collections::HashMap;

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

const ONEINCH_BASE: &str = "https://partners.mewapi.io/oneinch/v6.0/";

// This endpoint flakes far more than the others, so it gets a deeper retry
// budget.
const MAX_ATTEMPTS: u32 = 10;

const SUPPORTED: [NetworkName; 9] = [
    NetworkName::Ethereum,
    NetworkName::Binance,
    NetworkName::Matic,
    NetworkName::Optimism,
    NetworkName::Arbitrum,
    NetworkName::Gnosis,
    NetworkName::Avalanche,
    // Fantom support dropped upstream
    NetworkName::ZkSync,
    NetworkName::Base,
];

#[derive(Debug, Deserialize)]
struct OneInchResponse {
    tokens: HashMap<String, OneInchToken>,
}

#[derive(Debug, Deserialize)]
struct OneInchToken {
    address: String,
    symbol: String,
    decimals: u8,
    name: String,
    #[serde(rename = "logoURI")]
    logo_uri: Option<String>,
}

/// 1inch aggregator token lists. The responses already include the native
/// currency under the sentinel address.
pub struct OneInchSource {
    client: Client,
}

impl OneInchSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn build_token_map(network: NetworkName, response: OneInchResponse) -> TokenMap {
    let kind = chain_config(network).kind;
    let mut map = TokenMap::new();
    for token in response.tokens.into_values() {
        insert_lowercased(
            &mut map,
            "OneInch",
            Token {
                address: token.address,
                decimals: token.decimals,
                logo_uri: token.logo_uri.map(|uri| upgrade_logo_uri(&uri)),
                name: token.name,
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
impl TokenSource for OneInchSource {
    fn name(&self) -> &'static str {
        "OneInch"
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
        let url = format!("{ONEINCH_BASE}{}/tokens", chain_config(network).chain_id);
        let response: OneInchResponse = get_json(
            &self.client,
            &url,
            RetryPolicy::with_attempts(MAX_ATTEMPTS),
            cancel,
        )
        .await?;
        let map = build_token_map(network, response);
        info!("fetched {} OneInch tokens for {network}", map.len());
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::NATIVE_ADDRESS;

    #[test]
    fn response_map_is_rekeyed_lowercase() {
        let response: OneInchResponse = serde_json::from_str(
            r#"{"tokens":{
                "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee":{"address":"0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee","symbol":"ETH","decimals":18,"name":"Ether","logoURI":"https://tokens.1inch.io/0xeee.png"},
                "0xDAC17F958D2ee523a2206206994597C13D831ec7":{"address":"0xDAC17F958D2ee523a2206206994597C13D831ec7","symbol":"USDT","decimals":6,"name":"Tether USD"}
            }}"#,
        )
        .unwrap();
        let map = build_token_map(NetworkName::Ethereum, response);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(NATIVE_ADDRESS));
        let usdt = &map["0xdac17f958d2ee523a2206206994597c13d831ec7"];
        assert_eq!(usdt.address, "0xDAC17F958D2ee523a2206206994597C13D831ec7");
        assert_eq!(usdt.logo_uri, None);
    }

    #[test]
    fn missing_tokens_field_is_a_schema_violation() {
        let parsed: Result<OneInchResponse, _> =
            serde_json::from_str(r#"{"statusCode":500,"message":"borked"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn supported_list_tracks_upstream_coverage() {
        assert!(SUPPORTED.contains(&NetworkName::ZkSync));
        assert!(!SUPPORTED.contains(&NetworkName::Fantom));
        assert!(!SUPPORTED.contains(&NetworkName::Solana));
    }
}
