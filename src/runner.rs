use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregator::{apply_price_backfill, merge_network};
use crate::oracle;
use crate::output::ArtifactWriter;
use crate::pricefeed::fetch_price_feed;
use crate::sources::changelly::{enrich_currency_prices, hydrate_currencies};
use crate::sources::rango::merge_rango_network;
use crate::sources::{
    http_client, ChangellySource, CoinGeckoSource, FailurePolicy, JupiterSource, OneInchSource,
    ParaswapSource, RangoClient, SourceError, TokenMap, TokenSource,
};
use crate::types::{NetworkCatalog, NetworkName};

const DEFAULT_OUTPUT_DIR: &str = "./dist/lists";
const DEFAULT_RANGO_API_KEY: &str = "ee7da377-0ed8-4d42-aaf9-fa978a32b18d";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub output_dir: PathBuf,
    pub rango_api_key: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            rango_api_key: DEFAULT_RANGO_API_KEY.to_string(),
        }
    }
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("TOKEN_LISTS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            rango_api_key: std::env::var("RANGO_API_KEY").unwrap_or(defaults.rango_api_key),
        }
    }
}

/// One full generation pass: fetch everything, merge per network, hydrate
/// the partner datasets, backfill prices, write artifacts.
pub async fn run(config: RunnerConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    let started = Instant::now();
    let client = http_client();

    let coingecko = CoinGeckoSource::new(client.clone());
    let index = coingecko
        .fetch_coin_index(&cancel)
        .await
        .context("fetching the CoinGecko coin index")?;

    // Declaration order here is the merge precedence.
    let sources: Vec<Box<dyn TokenSource>> = vec![
        Box::new(coingecko),
        Box::new(OneInchSource::new(client.clone())),
        Box::new(ParaswapSource::new(client.clone())),
        Box::new(JupiterSource::new(client.clone())),
    ];
    let mut source_maps: Vec<HashMap<NetworkName, TokenMap>> =
        Vec::with_capacity(sources.len());
    for source in &sources {
        source_maps.push(fetch_source_maps(source.as_ref(), &cancel).await?);
    }

    let feed = fetch_price_feed(&client, &cancel).await;

    let mut currencies = ChangellySource::new(client.clone())
        .fetch_currencies(&cancel)
        .await
        .context("fetching Changelly currencies")?;
    let rango_tokens = RangoClient::new(client.clone(), config.rango_api_key.clone())
        .fetch_meta(&cancel)
        .await
        .context("fetching Rango meta")?;

    let mut catalogs: BTreeMap<NetworkName, NetworkCatalog> = BTreeMap::new();
    let mut rango_records = BTreeMap::new();
    let mut missing_price_ids: BTreeSet<String> = BTreeSet::new();
    for network in NetworkName::all() {
        let provider_maps: Vec<&TokenMap> = source_maps
            .iter()
            .filter_map(|maps| maps.get(network))
            .collect();
        let outcome = merge_network(*network, &provider_maps, &index, &feed);
        missing_price_ids.extend(outcome.missing_price_ids);

        hydrate_currencies(&mut currencies, &outcome.catalog.all, *network);
        let records = merge_rango_network(*network, &rango_tokens, &outcome.catalog.all);
        if !records.is_empty() {
            rango_records.insert(*network, records);
        }
        catalogs.insert(*network, outcome.catalog);
    }
    missing_price_ids.extend(enrich_currency_prices(&mut currencies, &index));

    if !missing_price_ids.is_empty() {
        let ids: Vec<String> = missing_price_ids.into_iter().collect();
        info!("querying the price oracle for {} unpriced ids", ids.len());
        let prices = oracle::fetch_prices(&client, &ids, &cancel)
            .await
            .context("backfilling prices from the oracle")?;
        apply_price_backfill(&prices, &mut catalogs, &mut currencies, &mut rango_records);
    }

    let writer = ArtifactWriter::new(config.output_dir);
    for (network, catalog) in &catalogs {
        writer
            .write_catalog(*network, catalog)
            .with_context(|| format!("writing the {network} catalog"))?;
    }
    writer
        .write_global("changelly.json", &currencies)
        .context("writing changelly.json")?;
    writer
        .write_global("rango.json", &rango_records)
        .context("writing rango.json")?;
    writer
        .write_global("top-tokens.json", &index)
        .context("writing top-tokens.json")?;

    for (network, catalog) in &catalogs {
        info!(
            "{network}: {} tokens ({} top, {} trending)",
            catalog.all.len(),
            catalog.top.len(),
            catalog.trending.len()
        );
    }
    info!(
        "generated {} catalogs into {} in {:.1}s",
        catalogs.len(),
        writer.dir().display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Fetch one source's networks sequentially, applying its failure policy.
/// Abort sources fail the run on the first network failure; Majority sources
/// tolerate failures until they exceed half of the source's network count.
/// Cancellation aborts regardless of policy.
async fn fetch_source_maps(
    source: &dyn TokenSource,
    cancel: &CancellationToken,
) -> anyhow::Result<HashMap<NetworkName, TokenMap>> {
    let networks = source.supported_networks();
    let mut maps = HashMap::with_capacity(networks.len());
    let mut failed = 0usize;
    for network in networks {
        match source.fetch_tokens(*network, cancel).await {
            Ok(map) => {
                maps.insert(*network, map);
            }
            Err(SourceError::Cancelled) => bail!("cancelled while fetching {}", source.name()),
            Err(err) => match source.failure_policy() {
                FailurePolicy::Abort => {
                    return Err(err)
                        .with_context(|| format!("fetching {} for {network}", source.name()));
                }
                FailurePolicy::Majority => {
                    failed += 1;
                    warn!("{} failed for {network}: {err}", source.name());
                    if failed * 2 > networks.len() {
                        bail!(
                            "{} failed for {failed} of {} networks, likely systemic, aborting",
                            source.name(),
                            networks.len()
                        );
                    }
                }
            },
        }
    }
    Ok(maps)
}
