use anyhow::{Context, Result};
use chrono::Local;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{write_atomic, TEMP_SUFFIX};
use crate::models::{Listing, Verdict};

/// Longest slug kept in a generated listing id.
const MAX_SLUG_LEN: usize = 50;

/// Street-type abbreviations expanded during address normalization.
const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("st", "street"),
    ("dr", "drive"),
    ("ave", "avenue"),
    ("rd", "road"),
    ("ln", "lane"),
    ("ct", "court"),
    ("cir", "circle"),
    ("blvd", "boulevard"),
    ("pl", "place"),
];

/// One pretty-printed JSON document per listing under `<data_dir>/houses`.
#[derive(Debug, Clone)]
pub struct ListingStore {
    houses_dir: PathBuf,
}

impl ListingStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            houses_dir: data_dir.as_ref().join("houses"),
        }
    }

    pub fn houses_dir(&self) -> &Path {
        &self.houses_dir
    }

    /// Ids are single file-name components; anything that could escape
    /// `houses/` is rejected.
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && !id.contains(['/', '\\', '\0'])
            && !id.contains("..")
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        Self::is_valid_id(id).then(|| self.houses_dir.join(format!("{}.json", id)))
    }

    /// Persist the whole record, replacing any previous version.
    pub async fn save(&self, listing: &Listing) -> Result<PathBuf> {
        let path = self
            .path_for(&listing.id)
            .with_context(|| format!("Invalid listing id {:?}", listing.id))?;
        let json = serde_json::to_string_pretty(listing)
            .with_context(|| format!("Failed to serialize listing {}", listing.id))?;
        write_atomic(&path, json.as_bytes()).await?;
        Ok(path)
    }

    pub async fn load(&self, id: &str) -> Result<Option<Listing>> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let listing = serde_json::from_str(&json)
            .with_context(|| format!("Failed to deserialize {}", path.display()))?;
        Ok(Some(listing))
    }

    /// Every stored listing, newest ingestion first.
    pub async fn list(&self) -> Result<Vec<Listing>> {
        let mut entries = match fs::read_dir(&self.houses_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.houses_dir.display()))
            }
        };

        let mut listings = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || name.ends_with(TEMP_SUFFIX) || !name.ends_with(".json") {
                continue;
            }
            let path = entry.path();
            let json = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let listing: Listing = serde_json::from_str(&json)
                .with_context(|| format!("Failed to deserialize {}", path.display()))?;
            listings.push(listing);
        }

        listings.sort_by(|a, b| b.ingested_at.cmp(&a.ingested_at));
        Ok(listings)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let Some(path) = self.path_for(id) else {
            return Ok(false);
        };
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete listing {}", id)),
        }
    }

    /// Canonical form of an address used as the natural key.
    pub fn normalize_address(address: &str) -> String {
        let lowered: String = address
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();

        lowered
            .split_whitespace()
            .map(|token| {
                STREET_ABBREVIATIONS
                    .iter()
                    .find(|(abbr, _)| *abbr == token)
                    .map(|(_, full)| *full)
                    .unwrap_or(token)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub async fn find_by_address(&self, address: &str) -> Result<Option<Listing>> {
        let key = Self::normalize_address(address);
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|l| Self::normalize_address(&l.address) == key))
    }

    pub async fn exists_by_address(&self, address: &str) -> Result<bool> {
        Ok(self.find_by_address(address).await?.is_some())
    }

    /// Slug of the address plus a second-resolution local timestamp.
    pub fn generate_id(address: &str) -> String {
        let cleaned: String = address
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == ' ')
            .collect();
        let slug: String = cleaned
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .chars()
            .take(MAX_SLUG_LEN)
            .collect();

        let timestamp = Local::now().format("%Y%m%d%H%M%S");
        if slug.is_empty() {
            format!("house-{}", timestamp)
        } else {
            format!("{}-{}", slug, timestamp)
        }
    }

    /// First id derived from `base` that no stored listing uses:
    /// `base`, then `base-2`, `base-3`, ...
    pub async fn unused_id(&self, base: &str) -> Result<String> {
        let mut candidate = base.to_string();
        let mut n = 1;
        loop {
            let path = self
                .path_for(&candidate)
                .with_context(|| format!("Invalid listing id {:?}", candidate))?;
            if !fs::try_exists(&path)
                .await
                .with_context(|| format!("Failed to check {}", path.display()))?
            {
                return Ok(candidate);
            }
            n += 1;
            candidate = format!("{}-{}", base, n);
        }
    }

    /// [`generate_id`](Self::generate_id) made unique against the store.
    pub async fn allocate_id(&self, address: &str) -> Result<String> {
        self.unused_id(&Self::generate_id(address)).await
    }

    /// Listings without a primary score, in [`list`](Self::list) order.
    pub async fn get_unscored(&self) -> Result<Vec<Listing>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|l| !l.is_scored())
            .collect())
    }

    /// Listings with a primary score, best first.
    pub async fn get_scored(&self) -> Result<Vec<Listing>> {
        let mut scored: Vec<Listing> = self
            .list()
            .await?
            .into_iter()
            .filter(|l| l.is_scored())
            .collect();
        scored.sort_by(|a, b| {
            let a = a.primary_score().unwrap_or(0.0);
            let b = b.primary_score().unwrap_or(0.0);
            b.total_cmp(&a)
        });
        Ok(scored)
    }

    /// Save every listing whose address is not already known. Returns
    /// `(saved, skipped)`.
    pub async fn bulk_save(&self, listings: Vec<Listing>) -> Result<(usize, usize)> {
        let mut known: HashSet<String> = self
            .list()
            .await?
            .iter()
            .map(|l| Self::normalize_address(&l.address))
            .collect();

        let mut saved = 0;
        let mut skipped = 0;
        for mut listing in listings {
            let key = Self::normalize_address(&listing.address);
            if known.contains(&key) {
                debug!("Skipping duplicate listing: {}", listing.address);
                skipped += 1;
                continue;
            }
            let id = self.unused_id(&listing.id).await?;
            if id != listing.id {
                debug!("Id {} already taken, saving {} as {}", listing.id, listing.address, id);
                listing.id = id;
            }
            self.save(&listing).await?;
            known.insert(key);
            saved += 1;
        }
        Ok((saved, skipped))
    }

    pub async fn annotate(&self, id: &str, note: &str) -> Result<Option<Listing>> {
        let Some(mut listing) = self.load(id).await? else {
            return Ok(None);
        };
        listing.annotations.push(note.to_string());
        self.save(&listing).await?;
        Ok(Some(listing))
    }

    pub async fn set_verdict(&self, id: &str, verdict: Verdict) -> Result<Option<Listing>> {
        let Some(mut listing) = self.load(id).await? else {
            return Ok(None);
        };
        listing.user_verdict = Some(verdict);
        self.save(&listing).await?;
        Ok(Some(listing))
    }
}
