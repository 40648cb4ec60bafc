#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use house_evaluator::agent::LLMProvider;
use house_evaluator::models::Listing;
use house_evaluator::services::{CompositeOptions, ImageCompositor, ImageFetcher};
use house_evaluator::{ListingStore, Pipeline, TasteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Vision,
    PresentFit,
    Potential,
    Brief,
    Other,
}

fn classify(prompt: &str) -> Call {
    if prompt.starts_with("Score this house for present-fit") {
        Call::PresentFit
    } else if prompt.starts_with("Evaluate this house's renovation potential") {
        Call::Potential
    } else if prompt.starts_with("Generate a house brief") {
        Call::Brief
    } else {
        Call::Other
    }
}

pub const VISION_REPLY: &str = r#"```json
{"rooms": [{"room_type": "kitchen", "aesthetic_quality": 8, "materials": ["oak"]}],
 "overall_aesthetic": 7, "architectural_style": "craftsman", "red_flags": [], "positive_signals": ["light"],
 "renovation_state": "original"}
```"#;

pub fn present_fit_reply(score: f64) -> String {
    format!(
        r#"{{"score": {}, "passed": true, "violations": [], "dimension_scores": [{{"dimension": "natural_light", "score": 8, "weight": 0.15}}], "justification": "fits", "deal_breakers": []}}"#,
        score
    )
}

pub fn potential_reply(score: f64) -> String {
    format!(
        r#"{{"score": {}, "renovation_ideas": [], "feasibility": "light", "cost_class": "<$50k", "risk_notes": [], "upside_narrative": "nice"}}"#,
        score
    )
}

/// Replies per kind of call. Queued replies are used first, then the default
/// for that kind. Every call is recorded.
pub struct ScriptedProvider {
    queued: Mutex<HashMap<Call, VecDeque<Result<String, String>>>>,
    defaults: Mutex<HashMap<Call, Result<String, String>>>,
    pub calls: Mutex<Vec<(Call, String, usize)>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        let mut defaults = HashMap::new();
        defaults.insert(Call::Vision, Ok(VISION_REPLY.to_string()));
        defaults.insert(Call::PresentFit, Ok(present_fit_reply(70.0)));
        defaults.insert(Call::Potential, Ok(potential_reply(60.0)));
        defaults.insert(Call::Brief, Ok("# Brief\n\nWorth a visit.".to_string()));
        defaults.insert(Call::Other, Ok(String::new()));
        Arc::new(Self {
            queued: Mutex::new(HashMap::new()),
            defaults: Mutex::new(defaults),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub async fn push(&self, call: Call, reply: &str) {
        self.queued.lock().await.entry(call).or_default().push_back(Ok(reply.to_string()));
    }

    pub async fn push_error(&self, call: Call, message: &str) {
        self.queued.lock().await.entry(call).or_default().push_back(Err(message.to_string()));
    }

    pub async fn set_default(&self, call: Call, reply: Result<&str, &str>) {
        self.defaults
            .lock()
            .await
            .insert(call, reply.map(str::to_string).map_err(str::to_string));
    }

    pub async fn count(&self, call: Call) -> usize {
        self.calls.lock().await.iter().filter(|(c, _, _)| *c == call).count()
    }

    pub async fn prompts(&self, call: Call) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(c, _, _)| *c == call)
            .map(|(_, p, _)| p.clone())
            .collect()
    }

    async fn reply(&self, call: Call, prompt: String, image_len: usize) -> Result<String> {
        self.calls.lock().await.push((call, prompt, image_len));
        let queued = self.queued.lock().await.get_mut(&call).and_then(|q| q.pop_front());
        let reply = match queued {
            Some(reply) => reply,
            None => self.defaults.lock().await.get(&call).cloned().unwrap_or(Ok(String::new())),
        };
        reply.map_err(|e| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate(&self, _model: &str, prompt: String, _system: Option<String>) -> Result<String> {
        let call = classify(&prompt);
        self.reply(call, prompt, 0).await
    }

    async fn generate_with_image(
        &self,
        _model: &str,
        prompt: String,
        image_png: &[u8],
        _system: Option<String>,
    ) -> Result<String> {
        self.reply(Call::Vision, prompt, image_png.len()).await
    }
}

/// Serves a tiny PNG for every url except those containing `broken`.
pub struct MemoryFetcher;

#[async_trait]
impl ImageFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if url.contains("broken") {
            anyhow::bail!("404 Not Found for {}", url);
        }
        let img = image::RgbImage::from_pixel(16, 12, image::Rgb([120, 80, 40]));
        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)?;
        Ok(buffer)
    }
}

pub struct Harness {
    pub _dir: tempfile::TempDir,
    pub store: ListingStore,
    pub taste: TasteStore,
    pub provider: Arc<ScriptedProvider>,
    pub pipeline: Pipeline,
}

pub fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = ListingStore::new(dir.path());
    let taste = TasteStore::new(dir.path());
    let provider = ScriptedProvider::new();
    let compositor = Arc::new(ImageCompositor::new(Arc::new(MemoryFetcher)).with_options(
        CompositeOptions {
            cell_width: 16,
            cell_height: 12,
            ..CompositeOptions::default()
        },
    ));
    let pipeline = Pipeline::new(store.clone(), taste.clone(), provider.clone(), compositor);
    Harness {
        _dir: dir,
        store,
        taste,
        provider,
        pipeline,
    }
}

pub fn listing_with_images(id: &str, address: &str, images: &[&str]) -> Listing {
    Listing::new(id, address).with_images(images.iter().map(|s| s.to_string()).collect())
}
