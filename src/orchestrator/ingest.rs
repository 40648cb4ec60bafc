//! Listing ingestion from scraper JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::models::{Listing, ListingFeatures};
use crate::storage::ListingStore;

/// One listing as produced by the scraper. Only `address` is needed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingInput {
    pub url: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(deserialize_with = "lenient_price")]
    pub price: Option<u64>,
    pub description: String,
    pub image_urls: Vec<String>,
    pub features: ListingFeatures,
}

/// Prices arrive as numbers or as display strings like `"$450,000"`.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
        Some(Value::String(s)) => {
            let digits: String = s.chars().take_while(|c| *c != '.').filter(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

impl ListingInput {
    pub fn into_listing(self, id: String) -> Listing {
        let mut listing = Listing::new(id, self.address)
            .with_url(self.url)
            .with_price(self.price)
            .with_images(self.image_urls)
            .with_description(self.description);
        listing.city = self.city;
        listing.state = self.state;
        listing.zip_code = self.zip_code;
        listing.features = self.features;
        listing
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ListingInput>),
    One(ListingInput),
}

/// Parse a single listing object or an array of them.
pub fn parse_listing_inputs(json: &str) -> Result<Vec<ListingInput>> {
    let parsed: OneOrMany =
        serde_json::from_str(json).context("Listing data must be a JSON object or array")?;
    Ok(match parsed {
        OneOrMany::Many(inputs) => inputs,
        OneOrMany::One(input) => vec![input],
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub imported_ids: Vec<String>,
}

/// Save new listings, skipping inputs without an address and addresses that
/// are already known. At most `limit` inputs are considered.
pub async fn import_listings(
    store: &ListingStore,
    inputs: Vec<ListingInput>,
    limit: Option<usize>,
) -> Result<ImportSummary> {
    let limit = limit.unwrap_or(inputs.len());
    let mut known: HashSet<String> = store
        .list()
        .await?
        .iter()
        .map(|l| ListingStore::normalize_address(&l.address))
        .collect();

    let mut summary = ImportSummary::default();
    for input in inputs.into_iter().take(limit) {
        if input.address.trim().is_empty() {
            warn!("Skipping listing with no address");
            summary.skipped += 1;
            continue;
        }
        let key = ListingStore::normalize_address(&input.address);
        if known.contains(&key) {
            info!("{} already exists, skipped", input.address);
            summary.skipped += 1;
            continue;
        }

        let id = store.allocate_id(&input.address).await?;
        let listing = input.into_listing(id.clone());
        store.save(&listing).await?;
        info!("Imported {} as {}", listing.address, id);
        known.insert(key);
        summary.imported_ids.push(id);
        summary.imported += 1;
    }

    info!("Import complete: {} new, {} skipped", summary.imported, summary.skipped);
    Ok(summary)
}
