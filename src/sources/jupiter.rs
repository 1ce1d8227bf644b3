use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{get_json, insert_lowercased, RetryPolicy, SourceError, TokenMap, TokenSource};
use crate::types::{upgrade_logo_uri, NetworkName, NetworkType, Token};

const JUPITER_BASE: &str = "https://lite-api.jup.ag/";

const SUPPORTED: [NetworkName; 1] = [NetworkName::Solana];

#[derive(Debug, Deserialize)]
struct JupiterToken {
    /// The token's mint address.
    id: String,
    name: String,
    symbol: String,
    icon: Option<String>,
    decimals: u8,
}

/// Jupiter's verified token list, the only Solana list provider. The feed is
/// community curated, so individual records can be garbage; those are
/// skipped rather than failing the fetch.
pub struct JupiterSource {
    client: Client,
}

impl JupiterSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn build_token_map(records: Vec<serde_json::Value>) -> TokenMap {
    let mut map = TokenMap::new();
    for raw in records {
        let token: JupiterToken = match serde_json::from_value(raw) {
            Ok(token) => token,
            Err(err) => {
                warn!("Jupiter: skipping malformed verified-list entry: {err}");
                continue;
            }
        };
        insert_lowercased(
            &mut map,
            "Jupiter",
            Token {
                // Mint addresses are base58. Keys are lowercased for joining
                // anyway; collisions should be vanishingly rare.
                address: token.id,
                decimals: token.decimals,
                logo_uri: token
                    .icon
                    .filter(|icon| !icon.is_empty())
                    .map(|icon| upgrade_logo_uri(&icon)),
                name: token.name,
                symbol: token.symbol,
                kind: NetworkType::Solana,
                rank: None,
                cg_id: None,
                price: None,
            },
        );
    }
    map
}

#[async_trait]
impl TokenSource for JupiterSource {
    fn name(&self) -> &'static str {
        "Jupiter"
    }

    fn supported_networks(&self) -> &'static [NetworkName] {
        &SUPPORTED
    }

    async fn fetch_tokens(
        &self,
        network: NetworkName,
        cancel: &CancellationToken,
    ) -> Result<TokenMap, SourceError> {
        let url = format!("{JUPITER_BASE}tokens/v2/tag?query=verified");
        let records: Vec<serde_json::Value> =
            get_json(&self.client, &url, RetryPolicy::default(), cancel).await?;
        let map = build_token_map(records);
        info!("fetched {} Jupiter tokens for {network}", map.len());
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_key_lowercase_and_keep_mint_casing() {
        let records: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"id":"CLoUDKc4Ane7HeQcPpE3YHnznRxhMimJ4MyaUqyHFzAu","name":"Cloud","symbol":"CLOUD","icon":"https://arweave.net/cloud.png","decimals":9,"tokenProgram":"TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"}
            ]"#,
        )
        .unwrap();
        let map = build_token_map(records);
        let token = &map["cloudkc4ane7heqcppe3yhnznrxhmimj4myauqyhfzau"];
        assert_eq!(token.address, "CLoUDKc4Ane7HeQcPpE3YHnznRxhMimJ4MyaUqyHFzAu");
        assert_eq!(token.kind, NetworkType::Solana);
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let records: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"id":"GoodMint1111111111111111111111111111111111","name":"Good","symbol":"GOOD","decimals":6},
                {"name":"NoMint","symbol":"BAD","decimals":6},
                {"id":"AlsoGood111111111111111111111111111111111","name":"Also","symbol":"ALSO","icon":null,"decimals":0}
            ]"#,
        )
        .unwrap();
        let map = build_token_map(records);
        assert_eq!(map.len(), 2);
        assert_eq!(map["alsogood111111111111111111111111111111111"].logo_uri, None);
    }

    #[test]
    fn empty_icons_do_not_become_logos() {
        let records: Vec<serde_json::Value> = serde_json::from_str(
            r#"[{"id":"Mint","name":"X","symbol":"X","icon":"","decimals":2}]"#,
        )
        .unwrap();
        let map = build_token_map(records);
        assert_eq!(map["mint"].logo_uri, None);
    }
}
