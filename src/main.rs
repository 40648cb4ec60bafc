//! House Evaluator
//!
//! Command loop over the listing store: import scraper output, run the
//! evaluation pipeline, rank results and maintain the taste model.
//! Passing a command as arguments runs it once and exits.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;

use house_evaluator::agent::{DistillerAgent, TasteCurator};
use house_evaluator::models::Verdict;
use house_evaluator::orchestrator::{import_listings, parse_listing_inputs, StageOutcome};
use house_evaluator::services::HttpImageFetcher;
use house_evaluator::utils::init_logging;
use house_evaluator::{
    AgentRole, EvaluatorConfig, LLMProvider, ListingStore, OpenAICompatibleProvider, Pipeline,
    TasteStore,
};

// ──────────────────────────────────────────────────────────────────────────────
// APPLICATION
// ──────────────────────────────────────────────────────────────────────────────

struct App {
    config: EvaluatorConfig,
    store: ListingStore,
    taste: TasteStore,
    provider: Arc<dyn LLMProvider>,
    pipeline: Pipeline,
}

impl App {
    fn new(config: EvaluatorConfig) -> Result<Self> {
        let provider: Arc<dyn LLMProvider> = Arc::new(OpenAICompatibleProvider::new(
            config.base_url.clone(),
            Some(config.require_api_key()?.to_string()),
        )?);
        let fetcher = Arc::new(HttpImageFetcher::new(config.fetch_timeout)?);
        let pipeline = Pipeline::from_config(&config, provider.clone(), fetcher);

        Ok(Self {
            store: ListingStore::new(&config.data_dir),
            taste: TasteStore::new(&config.data_dir),
            config,
            provider,
            pipeline,
        })
    }

    fn curator(&self) -> TasteCurator {
        TasteCurator::new(self.provider.clone(), self.store.clone(), self.taste.clone())
            .with_model(self.config.models.for_role(AgentRole::Curator))
    }

    /// Returns false when the loop should stop.
    async fn dispatch(&self, line: &str) -> Result<bool> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(true);
        };
        let args: Vec<&str> = parts.collect();

        match command.to_lowercase().as_str() {
            "quit" | "exit" | "q" => return Ok(false),
            "help" => print_help(),
            "list" => {
                for listing in self.store.list().await? {
                    let score = listing
                        .primary_score()
                        .map(|s| format!("{:.0}", s))
                        .unwrap_or_else(|| "-".to_string());
                    println!("{:<48} {:>5}  {:>12}  {}", listing.id, score, listing.price_label(), listing.address);
                }
            }
            "show" => {
                let id = args.first().context("usage: show <id>")?;
                match self.store.load(id).await? {
                    Some(listing) => println!("{}", serde_json::to_string_pretty(&listing)?),
                    None => println!("No listing {}", id),
                }
            }
            "import" => {
                let path = args.first().context("usage: import <file.json> [limit]")?;
                let limit = args.get(1).map(|l| l.parse::<usize>()).transpose()?;
                let json = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path))?;
                let inputs = parse_listing_inputs(&json)?;
                let summary = import_listings(&self.store, inputs, limit).await?;
                println!("Import complete: {} new, {} skipped", summary.imported, summary.skipped);
            }
            "score" => {
                let ids = if args.is_empty() {
                    None
                } else {
                    Some(args.iter().map(|s| s.to_string()).collect())
                };
                let report = self.pipeline.run_batch(ids).await?;
                for item in &report.items {
                    let mark = if item.success { "✓" } else { "✗" };
                    println!("{} {}", mark, item.id);
                    if let Some(ref run) = item.report {
                        for record in &run.stages {
                            if let StageOutcome::Failed(ref reason) = record.outcome {
                                println!("    {} failed: {}", record.stage, reason);
                            }
                        }
                    }
                    if let Some(ref error) = item.error {
                        println!("    {}", error);
                    }
                }
                println!("{}/{} succeeded", report.succeeded(), report.total());
            }
            "rank" => {
                for (i, (id, primary, secondary)) in self.pipeline.rankings().await?.iter().enumerate() {
                    println!("{:>3}. {:<48} fit {:>5.1}  potential {:>5.1}", i + 1, id, primary, secondary);
                }
            }
            "annotate" => {
                let (id, note) = args.split_first().context("usage: annotate <id> <note>")?;
                match self.store.annotate(id, &note.join(" ")).await? {
                    Some(_) => println!("Noted."),
                    None => println!("No listing {}", id),
                }
            }
            "verdict" => {
                let (id, verdict) = match args.as_slice() {
                    [id, verdict] => (*id, verdict.parse::<Verdict>()?),
                    _ => anyhow::bail!("usage: verdict <id> <liked|disliked|shortlisted>"),
                };
                match self.store.set_verdict(id, verdict).await? {
                    Some(_) => println!("{} marked {}", id, verdict),
                    None => println!("No listing {}", id),
                }
            }
            "review" => {
                let proposals = self.curator().review_recent_decisions().await?;
                if proposals.is_empty() {
                    println!("Not enough scored decisions to review yet.");
                }
                for (i, proposal) in proposals.iter().enumerate() {
                    println!("{}. {}", i + 1, proposal);
                }
            }
            "apply" => {
                anyhow::ensure!(!args.is_empty(), "usage: apply <proposal>");
                let taste = self.curator().apply_proposal(&args.join(" ")).await?;
                println!("Taste model now at version {}", taste.version);
            }
            "distill" => {
                let distiller = DistillerAgent::new(self.provider.clone(), self.taste.clone())
                    .with_model(self.config.models.for_role(AgentRole::Distiller));
                println!("{}", distiller.distill().await?);
            }
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
        Ok(true)
    }
}

fn print_help() {
    println!("Commands:");
    println!("  list                         all listings, newest first");
    println!("  show <id>                    full listing record");
    println!("  import <file.json> [limit]   import scraper output");
    println!("  score [id ...]               evaluate listings (default: all unscored)");
    println!("  rank                         scored listings, best first");
    println!("  annotate <id> <note>         attach a note");
    println!("  verdict <id> <verdict>       liked | disliked | shortlisted");
    println!("  review                       propose taste updates from verdicts");
    println!("  apply <proposal>             apply a taste update");
    println!("  distill                      regenerate aesthetics.md");
    println!("  quit");
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let config = EvaluatorConfig::from_env()?;
    init_logging()?;

    let app = App::new(config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        app.dispatch(&args.join(" ")).await?;
        return Ok(());
    }

    println!("House Evaluator (data: {})", app.config.data_dir.display());
    println!("Type 'help' for commands.\n");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        match app.dispatch(input.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("Error: {:#}", e),
        }
    }

    Ok(())
}
