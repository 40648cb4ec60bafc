use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scores::{PotentialScore, PresentFitScore, VisionAnalysis};

/// Structured facts scraped from a listing page.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ListingFeatures {
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f32>,
    pub sqft: Option<u32>,
    pub lot_sqft: Option<u32>,
    pub year_built: Option<u32>,
    /// single family, condo, townhouse
    pub property_type: String,
    /// garage, carport, street
    pub parking: String,
    pub hoa_fee: Option<u32>,
    pub heating: String,
    pub cooling: String,
    pub flooring: Vec<String>,
    pub appliances: Vec<String>,
}

/// The user's own call on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Liked,
    Disliked,
    Shortlisted,
}

impl std::str::FromStr for Verdict {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "liked" | "like" => Ok(Verdict::Liked),
            "disliked" | "dislike" => Ok(Verdict::Disliked),
            "shortlisted" | "shortlist" => Ok(Verdict::Shortlisted),
            other => anyhow::bail!("Unknown verdict '{}'", other),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Liked => write!(f, "liked"),
            Verdict::Disliked => write!(f, "disliked"),
            Verdict::Shortlisted => write!(f, "shortlisted"),
        }
    }
}

/// A listing under evaluation, together with everything the pipeline has
/// learned about it.
///
/// The four enrichment slots stay `None` until their stage has produced a
/// complete value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: String,
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,

    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Listing price in dollars
    #[serde(default)]
    pub price: Option<u64>,

    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: ListingFeatures,
    #[serde(default)]
    pub image_urls: Vec<String>,

    #[serde(default)]
    pub vision_analysis: Option<VisionAnalysis>,
    #[serde(default)]
    pub present_fit_score: Option<PresentFitScore>,
    #[serde(default)]
    pub potential_score: Option<PotentialScore>,
    #[serde(default)]
    pub brief: Option<String>,

    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub user_verdict: Option<Verdict>,

    pub ingested_at: DateTime<Utc>,
    #[serde(default)]
    pub scored_at: Option<DateTime<Utc>>,
}

impl Listing {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: String::new(),
            address: address.into(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            latitude: None,
            longitude: None,
            price: None,
            description: String::new(),
            features: ListingFeatures::default(),
            image_urls: Vec::new(),
            vision_analysis: None,
            present_fit_score: None,
            potential_score: None,
            brief: None,
            annotations: Vec::new(),
            user_verdict: None,
            ingested_at: Utc::now(),
            scored_at: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_price(mut self, price: Option<u64>) -> Self {
        self.price = price;
        self
    }

    pub fn with_images(mut self, image_urls: Vec<String>) -> Self {
        self.image_urls = image_urls;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn primary_score(&self) -> Option<f64> {
        self.present_fit_score.as_ref().map(|s| s.score)
    }

    pub fn secondary_score(&self) -> Option<f64> {
        self.potential_score.as_ref().map(|s| s.score)
    }

    pub fn is_scored(&self) -> bool {
        self.present_fit_score.is_some()
    }

    /// Human-readable price, `N/A` when unknown.
    pub fn price_label(&self) -> String {
        match self.price {
            Some(price) => format!("${}", group_thousands(price)),
            None => "N/A".to_string(),
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
