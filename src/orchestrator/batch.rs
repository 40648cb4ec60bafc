//! Batch Runner
//!
//! Applies the pipeline to many listings. Each listing succeeds or fails on
//! its own; one bad listing never stops the rest.

use anyhow::Result;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::pipeline::Pipeline;
use super::stage::RunReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    pub success: bool,
    /// Why the listing failed, when it did
    pub error: Option<String>,
    pub report: Option<RunReport>,
}

/// Outcomes in the order the ids were given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.success).count()
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn as_map(&self) -> BTreeMap<String, bool> {
        self.items
            .iter()
            .map(|item| (item.id.clone(), item.success))
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().filter(|item| !item.success)
    }
}

impl Pipeline {
    /// Evaluate `ids`, or every unscored listing when `None`.
    pub async fn run_batch(&self, ids: Option<Vec<String>>) -> Result<BatchReport> {
        let ids = match ids {
            Some(ids) => ids,
            None => self
                .store
                .get_unscored()
                .await?
                .into_iter()
                .map(|l| l.id)
                .collect(),
        };
        let total = ids.len();
        info!("Evaluating {} listing(s), {} at a time", total, self.batch_concurrency);

        let items: Vec<BatchItem> = stream::iter(ids)
            .map(|id| async move {
                match self.run_detailed(&id).await {
                    Ok(report) => BatchItem {
                        success: report.succeeded(),
                        error: report.failure_reason(),
                        report: Some(report),
                        id,
                    },
                    Err(e) => BatchItem {
                        id,
                        success: false,
                        error: Some(format!("{:#}", e)),
                        report: None,
                    },
                }
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await;

        let report = BatchReport { items };
        info!("Batch complete: {}/{} succeeded", report.succeeded(), report.total());
        Ok(report)
    }
}
