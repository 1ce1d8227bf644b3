use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, info};

use crate::chains::{chain_config, NATIVE_ADDRESS};
use crate::pricefeed::PriceFeed;
use crate::sources::changelly::ChangellyCurrency;
use crate::sources::rango::RangoRecord;
use crate::sources::TokenMap;
use crate::types::{CoinIndex, NetworkCatalog, NetworkName, Token};

/// One network's merge result: the catalog plus the canonical ids of tokens
/// the price cascade could not answer for, destined for the deferred oracle.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub catalog: NetworkCatalog,
    pub missing_price_ids: BTreeSet<String>,
}

/// Canonical coin id for a lowercased address. The native sentinel maps to
/// the chain's statically configured id unconditionally; the contract index
/// sometimes carries wrapped-asset ids under the sentinel, which must never
/// win.
pub fn resolve_cg_id(
    network: NetworkName,
    lowercase_address: &str,
    index: &CoinIndex,
) -> Option<String> {
    if lowercase_address == NATIVE_ADDRESS {
        return Some(chain_config(network).cg_id.to_string());
    }
    index.id_for_contract(lowercase_address).map(str::to_string)
}

/// Price cascade, most to least trusted: DEX feed (actual tradable
/// liquidity), then the market index standing for the canonical id. Each
/// resolver is tried in order; the first hit wins. A miss across the board
/// is a candidate for the deferred oracle.
pub fn resolve_price(
    network: NetworkName,
    lowercase_address: &str,
    cg_id: Option<&str>,
    index: &CoinIndex,
    feed: &PriceFeed,
) -> Option<f64> {
    let from_feed = || feed.price_for(network, lowercase_address);
    let from_index = || {
        index
            .top_tokens
            .get(cg_id?)
            .and_then(|standing| standing.price)
    };
    let resolvers: [&dyn Fn() -> Option<f64>; 2] = [&from_feed, &from_index];
    resolvers.iter().find_map(|resolve| resolve())
}

/// Rank comes solely from the top-250 standings; there is no fallback.
pub fn resolve_rank(cg_id: Option<&str>, index: &CoinIndex) -> Option<u32> {
    index.top_tokens.get(cg_id?).map(|standing| standing.rank)
}

/// Merge one network's provider maps into its catalog.
///
/// Providers are consumed in the precedence order they are passed in; the
/// first provider supplying an address (case-insensitive) wins entirely,
/// later providers' entries for the same address are ignored. Every accepted
/// token is enriched through the id and price/rank cascades, and joins the
/// top/trending lists when its id appears in the respective index tables.
pub fn merge_network(
    network: NetworkName,
    provider_maps: &[&TokenMap],
    index: &CoinIndex,
    feed: &PriceFeed,
) -> MergeOutcome {
    let mut seen: HashSet<String> = HashSet::new();
    let mut all: Vec<Token> = Vec::new();
    let mut top: Vec<(u32, Token)> = Vec::new();
    let mut trending: Vec<(u32, Token)> = Vec::new();
    let mut missing_price_ids = BTreeSet::new();

    for map in provider_maps {
        for (lowercase_address, raw) in map.iter() {
            if !seen.insert(lowercase_address.clone()) {
                continue;
            }

            let cg_id = resolve_cg_id(network, lowercase_address, index);
            let price = resolve_price(network, lowercase_address, cg_id.as_deref(), index, feed);
            let rank = resolve_rank(cg_id.as_deref(), index);
            if price.is_none() {
                if let Some(id) = &cg_id {
                    missing_price_ids.insert(id.clone());
                }
            }

            let token = Token {
                rank,
                cg_id: cg_id.clone(),
                price,
                ..raw.clone()
            };

            if let Some(id) = &cg_id {
                if let Some(standing) = index.top_tokens.get(id) {
                    top.push((standing.rank, token.clone()));
                }
                if let Some(score) = index.trending_tokens.get(id) {
                    trending.push((*score, token.clone()));
                }
            }
            all.push(token);
        }
    }

    // Native first, the rest name-ascending. Address is the tie-break
    // everywhere so reruns over identical inputs are byte-identical.
    all.sort_by(|a, b| {
        let a_native = a.address.eq_ignore_ascii_case(NATIVE_ADDRESS);
        let b_native = b.address.eq_ignore_ascii_case(NATIVE_ADDRESS);
        b_native
            .cmp(&a_native)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.address.cmp(&b.address))
    });
    top.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.address.cmp(&b.1.address)));
    trending.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.address.cmp(&b.1.address)));

    debug!(
        "merged {network}: {} tokens, {} top, {} trending, {} unpriced ids",
        all.len(),
        top.len(),
        trending.len(),
        missing_price_ids.len()
    );
    MergeOutcome {
        catalog: NetworkCatalog {
            all,
            trending: trending.into_iter().map(|(_, token)| token).collect(),
            top: top.into_iter().map(|(_, token)| token).collect(),
        },
        missing_price_ids,
    }
}

fn backfill_token(token: &mut Token, prices: &BTreeMap<String, f64>) {
    if token.price.is_some() {
        return;
    }
    let Some(cg_id) = token.cg_id.as_deref() else {
        return;
    };
    if let Some(price) = prices.get(cg_id) {
        token.price = Some(*price);
    }
}

/// Final patch pass: apply the oracle's id-to-price map to every structure
/// that embeds a token, wherever the price is still unset. Records whose id
/// the oracle did not return stay unpriced for this run.
pub fn apply_price_backfill(
    prices: &BTreeMap<String, f64>,
    catalogs: &mut BTreeMap<NetworkName, NetworkCatalog>,
    currencies: &mut [ChangellyCurrency],
    rango: &mut BTreeMap<NetworkName, Vec<RangoRecord>>,
) {
    let mut patched = 0usize;
    let mut patch = |token: &mut Token| {
        let before = token.price;
        backfill_token(token, prices);
        if before.is_none() && token.price.is_some() {
            patched += 1;
        }
    };

    for catalog in catalogs.values_mut() {
        for token in catalog
            .all
            .iter_mut()
            .chain(catalog.top.iter_mut())
            .chain(catalog.trending.iter_mut())
        {
            patch(token);
        }
    }
    for currency in currencies.iter_mut() {
        if let Some(token) = currency.token.as_mut() {
            patch(token);
        }
    }
    for records in rango.values_mut() {
        for record in records.iter_mut() {
            if let Some(token) = record.token.as_mut() {
                patch(token);
            }
        }
    }
    info!("backfilled {patched} token prices from the oracle");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketStanding, NetworkType};

    fn token(address: &str, name: &str, decimals: u8) -> Token {
        Token {
            address: address.to_string(),
            decimals,
            logo_uri: None,
            name: name.to_string(),
            symbol: name.to_uppercase(),
            kind: NetworkType::Evm,
            rank: None,
            cg_id: None,
            price: None,
        }
    }

    fn map_of(tokens: &[Token]) -> TokenMap {
        tokens
            .iter()
            .map(|token| (token.address.to_lowercase(), token.clone()))
            .collect()
    }

    fn index_with(entries: &[(&str, &str)], standings: &[(&str, u32, Option<f64>)]) -> CoinIndex {
        let mut index = CoinIndex::default();
        for (address, id) in entries {
            index
                .contracts_to_id
                .insert(address.to_string(), id.to_string());
        }
        for (id, rank, price) in standings {
            index.top_tokens.insert(
                id.to_string(),
                MarketStanding {
                    rank: *rank,
                    price: *price,
                },
            );
        }
        index
    }

    #[test]
    fn native_sentinel_overrides_the_contract_index() {
        let index = index_with(&[(NATIVE_ADDRESS, "weth")], &[]);
        assert_eq!(
            resolve_cg_id(NetworkName::Ethereum, NATIVE_ADDRESS, &index),
            Some("ethereum".to_string())
        );
        assert_eq!(
            resolve_cg_id(NetworkName::Matic, NATIVE_ADDRESS, &index),
            Some("matic-network".to_string())
        );
        assert_eq!(resolve_cg_id(NetworkName::Ethereum, "0xunknown", &index), None);
    }

    #[test]
    fn price_prefers_the_dex_feed_over_the_index() {
        let index = index_with(&[], &[("foo-coin", 5, Some(2.5))]);
        let mut feed = PriceFeed::default();
        feed.insert_network(
            NetworkName::Ethereum,
            std::collections::HashMap::from([("0xabc".to_string(), 9.0)]),
        );
        assert_eq!(
            resolve_price(NetworkName::Ethereum, "0xabc", Some("foo-coin"), &index, &feed),
            Some(9.0)
        );
        assert_eq!(
            resolve_price(NetworkName::Ethereum, "0xdef", Some("foo-coin"), &index, &feed),
            Some(2.5)
        );
        assert_eq!(
            resolve_price(NetworkName::Ethereum, "0xdef", None, &index, &feed),
            None
        );
    }

    #[test]
    fn first_provider_wins_per_address() {
        let provider_a = map_of(&[token("0xAbC", "Foo", 18)]);
        let provider_b = map_of(&[token("0xabc", "Bar", 6), token(NATIVE_ADDRESS, "Ethereum", 18)]);
        let outcome = merge_network(
            NetworkName::Ethereum,
            &[&provider_a, &provider_b],
            &CoinIndex::default(),
            &PriceFeed::default(),
        );
        assert_eq!(outcome.catalog.all.len(), 2);
        // Native first even though the lower-priority provider supplied it.
        assert_eq!(outcome.catalog.all[0].address, NATIVE_ADDRESS);
        let merged = &outcome.catalog.all[1];
        assert_eq!(merged.name, "Foo");
        assert_eq!(merged.decimals, 18);
        assert_eq!(merged.address, "0xAbC");
    }

    #[test]
    fn canonical_index_supplies_id_rank_and_price() {
        let provider = map_of(&[token("0xabc", "Foo", 18)]);
        let index = index_with(&[("0xabc", "foo-coin")], &[("foo-coin", 5, Some(2.5))]);
        let outcome = merge_network(
            NetworkName::Ethereum,
            &[&provider],
            &index,
            &PriceFeed::default(),
        );
        let merged = &outcome.catalog.all[0];
        assert_eq!(merged.cg_id.as_deref(), Some("foo-coin"));
        assert_eq!(merged.rank, Some(5));
        assert_eq!(merged.price, Some(2.5));
        assert_eq!(outcome.catalog.top.len(), 1);
        assert!(outcome.missing_price_ids.is_empty());
    }

    #[test]
    fn all_is_name_sorted_after_native() {
        let provider = map_of(&[
            token("0x3", "Charlie", 18),
            token("0x1", "Alpha", 18),
            token(NATIVE_ADDRESS, "Zeta Native", 18),
            token("0x2", "Bravo", 18),
        ]);
        let outcome = merge_network(
            NetworkName::Ethereum,
            &[&provider],
            &CoinIndex::default(),
            &PriceFeed::default(),
        );
        let names: Vec<&str> = outcome
            .catalog
            .all
            .iter()
            .map(|token| token.name.as_str())
            .collect();
        assert_eq!(names, vec!["Zeta Native", "Alpha", "Bravo", "Charlie"]);
    }

    #[test]
    fn name_ties_break_on_address() {
        let provider = map_of(&[token("0xbb", "Same", 18), token("0xaa", "Same", 18)]);
        let outcome = merge_network(
            NetworkName::Ethereum,
            &[&provider],
            &CoinIndex::default(),
            &PriceFeed::default(),
        );
        assert_eq!(outcome.catalog.all[0].address, "0xaa");
        assert_eq!(outcome.catalog.all[1].address, "0xbb");
    }

    #[test]
    fn top_sorts_by_rank_and_trending_by_score() {
        let provider = map_of(&[
            token("0x1", "First", 18),
            token("0x2", "Second", 18),
            token("0x3", "Third", 18),
        ]);
        let mut index = index_with(
            &[("0x1", "one"), ("0x2", "two"), ("0x3", "three")],
            &[("one", 30, None), ("two", 10, None), ("three", 20, None)],
        );
        index.trending_tokens.insert("one".to_string(), 2);
        index.trending_tokens.insert("three".to_string(), 1);
        let outcome = merge_network(
            NetworkName::Ethereum,
            &[&provider],
            &index,
            &PriceFeed::default(),
        );
        let top_ranks: Vec<Option<u32>> = outcome.catalog.top.iter().map(|t| t.rank).collect();
        assert_eq!(top_ranks, vec![Some(10), Some(20), Some(30)]);
        let trending: Vec<&str> = outcome
            .catalog
            .trending
            .iter()
            .map(|t| t.cg_id.as_deref().unwrap())
            .collect();
        assert_eq!(trending, vec!["three", "one"]);
    }

    #[test]
    fn unpriced_ids_are_collected_for_the_oracle() {
        let provider = map_of(&[token("0x1", "Mapped", 18), token("0x2", "Unmapped", 18)]);
        let index = index_with(&[("0x1", "mapped-coin")], &[]);
        let outcome = merge_network(
            NetworkName::Ethereum,
            &[&provider],
            &index,
            &PriceFeed::default(),
        );
        // Only ids the index knows can be deferred; unmapped tokens cannot
        // be priced by the oracle at all.
        assert_eq!(
            outcome.missing_price_ids.iter().collect::<Vec<_>>(),
            vec!["mapped-coin"]
        );
    }

    #[test]
    fn merge_is_deterministic_across_reruns() {
        let provider_a = map_of(&[
            token("0x5", "Echo", 18),
            token("0x4", "Delta", 18),
            token("0x3", "Charlie", 18),
        ]);
        let provider_b = map_of(&[
            token("0x3", "Shadowed", 6),
            token("0x2", "Bravo", 18),
            token(NATIVE_ADDRESS, "Native", 18),
        ]);
        let index = index_with(
            &[("0x2", "bravo"), ("0x4", "delta")],
            &[("bravo", 7, Some(1.0)), ("delta", 3, Some(2.0))],
        );
        let run = || {
            let outcome = merge_network(
                NetworkName::Ethereum,
                &[&provider_a, &provider_b],
                &index,
                &PriceFeed::default(),
            );
            serde_json::to_string(&outcome.catalog).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn merged_addresses_are_unique_case_insensitively() {
        let provider_a = map_of(&[token("0xAbC", "Upper", 18)]);
        let provider_b = map_of(&[token("0xabc", "Lower", 18)]);
        let outcome = merge_network(
            NetworkName::Ethereum,
            &[&provider_a, &provider_b],
            &CoinIndex::default(),
            &PriceFeed::default(),
        );
        let mut seen = HashSet::new();
        for token in &outcome.catalog.all {
            assert!(seen.insert(token.address.to_lowercase()));
        }
        assert_eq!(outcome.catalog.all.len(), 1);
    }

    #[test]
    fn backfill_patches_only_unpriced_tokens_with_known_ids() {
        let prices = BTreeMap::from([("foo".to_string(), 1.23)]);
        let mut unpriced = token("0x1", "Unpriced", 18);
        unpriced.cg_id = Some("foo".to_string());
        let mut priced = token("0x2", "Priced", 18);
        priced.cg_id = Some("foo".to_string());
        priced.price = Some(9.9);
        let mut idless = token("0x3", "NoId", 18);
        let mut unknown = token("0x4", "Unknown", 18);
        unknown.cg_id = Some("bar".to_string());

        for token in [&mut unpriced, &mut priced, &mut idless, &mut unknown] {
            backfill_token(token, &prices);
        }

        assert_eq!(unpriced.price, Some(1.23));
        assert_eq!(priced.price, Some(9.9));
        assert_eq!(idless.price, None);
        assert_eq!(unknown.price, None);
    }

    #[test]
    fn backfill_reaches_every_embedded_token() {
        let prices = BTreeMap::from([("foo".to_string(), 4.2)]);
        let mut merged = token("0x1", "Foo", 18);
        merged.cg_id = Some("foo".to_string());

        let mut catalogs = BTreeMap::new();
        catalogs.insert(
            NetworkName::Ethereum,
            NetworkCatalog {
                all: vec![merged.clone()],
                trending: vec![],
                top: vec![merged.clone()],
            },
        );
        let mut currencies = vec![ChangellyCurrency {
            name: "FOO".to_string(),
            ticker: "foo".to_string(),
            full_name: "Foo".to_string(),
            enabled: true,
            enabled_from: true,
            enabled_to: true,
            fix_rate_enabled: false,
            payin_confirmations: 1,
            address_url: None,
            transaction_url: None,
            image: None,
            protocol: None,
            blockchain: "ethereum".to_string(),
            contract_address: Some("0x1".to_string()),
            extra_id_name: None,
            fixed_time: None,
            extra: BTreeMap::new(),
            token: Some(merged.clone()),
        }];
        let mut rango = BTreeMap::new();
        rango.insert(
            NetworkName::Ethereum,
            vec![RangoRecord {
                rango_meta: crate::sources::rango::RangoToken {
                    blockchain: "ETH".to_string(),
                    chain_id: Some("1".to_string()),
                    address: Some("0x1".to_string()),
                    symbol: "FOO".to_string(),
                    name: Some("Foo".to_string()),
                    decimals: 18,
                    image: String::new(),
                    blockchain_image: String::new(),
                    usd_price: None,
                    is_popular: false,
                    supported_swappers: Vec::new(),
                    extra: BTreeMap::new(),
                },
                token: Some(merged),
            }],
        );

        apply_price_backfill(&prices, &mut catalogs, &mut currencies, &mut rango);

        let catalog = &catalogs[&NetworkName::Ethereum];
        assert_eq!(catalog.all[0].price, Some(4.2));
        assert_eq!(catalog.top[0].price, Some(4.2));
        assert_eq!(currencies[0].token.as_ref().unwrap().price, Some(4.2));
        assert_eq!(
            rango[&NetworkName::Ethereum][0].token.as_ref().unwrap().price,
            Some(4.2)
        );
    }
}
