//! Image Compositor
//!
//! Fetches a listing's photos with bounded fan-out and lays them out on a
//! single grid image for the vision stage.

use anyhow::{Context, Result};
use futures_util::future::join_all;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::images::ImageFetcher;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const PLACEHOLDER: Rgb<u8> = Rgb([200, 200, 200]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Only the first `max_images` references are used
    pub max_images: Option<usize>,
    pub cell_width: u32,
    pub cell_height: u32,
    pub padding: u32,
    /// Maximum fetches in flight
    pub concurrency: usize,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            max_images: Some(36),
            cell_width: 400,
            cell_height: 300,
            padding: 2,
            concurrency: 10,
        }
    }
}

/// `(cols, rows)` for `n` images.
pub fn grid_dimensions(n: usize) -> (u32, u32) {
    match n {
        0 => (0, 0),
        1..=2 => (n as u32, 1),
        3..=4 => (2, 2),
        5..=6 => (3, 2),
        7..=9 => (3, 3),
        _ => {
            let cols = ((n as f64).sqrt().ceil() as usize).min(5);
            let rows = n.div_ceil(cols);
            (cols as u32, rows as u32)
        }
    }
}

pub struct ImageCompositor {
    fetcher: Arc<dyn ImageFetcher>,
    options: CompositeOptions,
}

impl ImageCompositor {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            options: CompositeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompositeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompositeOptions {
        &self.options
    }

    /// Fetch, lay out and PNG-encode the given images. Unfetchable images are
    /// dropped; when none survive the result is a grey placeholder cell.
    pub async fn create_composite(&self, urls: &[String]) -> Result<Vec<u8>> {
        let limit = self.options.max_images.unwrap_or(urls.len());
        let urls: Vec<&String> = urls.iter().take(limit).collect();

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let fetches = urls.iter().map(|url| {
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            async move {
                let _permit = semaphore.acquire().await.ok();
                fetcher.fetch(url).await
            }
        });
        let results = join_all(fetches).await;

        let mut payloads = Vec::with_capacity(results.len());
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(bytes) => payloads.push(bytes),
                Err(e) => debug!("Dropping image {}: {:#}", url, e),
            }
        }
        if payloads.len() < urls.len() {
            warn!("Fetched {}/{} images", payloads.len(), urls.len());
        }

        let options = self.options;
        tokio::task::spawn_blocking(move || {
            let images: Vec<DynamicImage> = payloads
                .iter()
                .filter_map(|bytes| match image::load_from_memory(bytes) {
                    Ok(img) => Some(img),
                    Err(e) => {
                        debug!("Dropping undecodable image: {}", e);
                        None
                    }
                })
                .collect();

            let canvas = if images.is_empty() {
                RgbImage::from_pixel(options.cell_width.max(1), options.cell_height.max(1), PLACEHOLDER)
            } else {
                compose_grid(&images, options.cell_width, options.cell_height, options.padding)
            };
            encode_png(canvas)
        })
        .await
        .context("Composite task panicked")?
    }
}

/// Place `images` row-major on a white canvas, each scaled to fit its cell
/// and centered within it.
/// Zero cell sizes are treated as 1.
pub fn compose_grid(images: &[DynamicImage], cell_width: u32, cell_height: u32, padding: u32) -> RgbImage {
    let (cell_width, cell_height) = (cell_width.max(1), cell_height.max(1));
    let (cols, rows) = grid_dimensions(images.len());
    let width = cols * cell_width + (cols + 1) * padding;
    let height = rows * cell_height + (rows + 1) * padding;
    let mut canvas = RgbImage::from_pixel(width.max(1), height.max(1), BACKGROUND);

    for (i, img) in images.iter().enumerate() {
        let col = i as u32 % cols;
        let row = i as u32 / cols;
        let (w, h) = fit_within(img.width(), img.height(), cell_width, cell_height);
        let resized = img.resize_exact(w, h, FilterType::Lanczos3).to_rgb8();

        let x = col * (cell_width + padding) + padding + (cell_width - w) / 2;
        let y = row * (cell_height + padding) + padding + (cell_height - h) / 2;
        imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    }
    canvas
}

/// Largest size with the source aspect ratio that fits inside the cell.
fn fit_within(width: u32, height: u32, cell_width: u32, cell_height: u32) -> (u32, u32) {
    let (cell_width, cell_height) = (cell_width.max(1), cell_height.max(1));
    if width == 0 || height == 0 {
        return (cell_width, cell_height);
    }
    let img_ratio = width as f64 / height as f64;
    let cell_ratio = cell_width as f64 / cell_height as f64;
    let (w, h) = if img_ratio > cell_ratio {
        (cell_width, (cell_width as f64 / img_ratio) as u32)
    } else {
        ((cell_height as f64 * img_ratio) as u32, cell_height)
    };
    (w.clamp(1, cell_width), h.clamp(1, cell_height))
}

fn encode_png(canvas: RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .context("Failed to encode composite PNG")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn assert_near(pixel: &Rgb<u8>, expected: [u8; 3]) {
        for (got, want) in pixel.0.iter().zip(expected) {
            assert!((*got as i16 - want as i16).abs() <= 3, "{:?} vs {:?}", pixel, expected);
        }
    }

    fn png_of(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        encode_png(RgbImage::from_pixel(width, height, Rgb(color))).unwrap()
    }

    struct MemoryFetcher {
        images: HashMap<String, Vec<u8>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MemoryFetcher {
        fn new(images: HashMap<String, Vec<u8>>) -> Self {
            Self { images, in_flight: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ImageFetcher for MemoryFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.images
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 for {}", url))
        }
    }

    #[test]
    fn test_grid_dimensions() {
        assert_eq!(grid_dimensions(0), (0, 0));
        assert_eq!(grid_dimensions(1), (1, 1));
        assert_eq!(grid_dimensions(2), (2, 1));
        assert_eq!(grid_dimensions(4), (2, 2));
        assert_eq!(grid_dimensions(5), (3, 2));
        assert_eq!(grid_dimensions(7), (3, 3));
        assert_eq!(grid_dimensions(10), (4, 3));
        assert_eq!(grid_dimensions(20), (5, 4));
        assert_eq!(grid_dimensions(36), (5, 8));
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        assert_eq!(fit_within(800, 200, 400, 300), (400, 100));
        assert_eq!(fit_within(300, 600, 400, 300), (150, 300));
    }

    #[test]
    fn test_compose_grid_centers_images() {
        let wide = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 20, Rgb([255, 0, 0])));
        let canvas = compose_grid(&[wide], 40, 30, 2);
        assert_eq!(canvas.dimensions(), (44, 34));
        // 40x10 image centered vertically in the cell
        assert_eq!(*canvas.get_pixel(2, 2), BACKGROUND);
        assert_near(canvas.get_pixel(22, 17), [255, 0, 0]);
    }

    #[tokio::test]
    async fn test_zero_cell_size_does_not_panic() {
        let tall = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 40, Rgb([255, 0, 0])));
        assert_eq!(fit_within(10, 40, 0, 0), (1, 1));
        assert_eq!(compose_grid(&[tall], 0, 0, 1).dimensions(), (3, 3));

        let mut images = HashMap::new();
        images.insert("a".to_string(), png_of(8, 6, [0, 0, 255]));
        let zero = CompositeOptions { cell_width: 0, cell_height: 0, padding: 0, ..CompositeOptions::default() };
        let compositor = ImageCompositor::new(Arc::new(MemoryFetcher::new(images))).with_options(zero);

        let png = compositor.create_composite(&["a".to_string()]).await.unwrap();
        assert_eq!(image::load_from_memory(&png).unwrap().to_rgb8().dimensions(), (1, 1));
        let png = compositor.create_composite(&["missing".to_string()]).await.unwrap();
        assert_eq!(image::load_from_memory(&png).unwrap().to_rgb8().dimensions(), (1, 1));
    }

    #[tokio::test]
    async fn test_partial_failures_are_dropped() {
        let mut images = HashMap::new();
        images.insert("a".to_string(), png_of(40, 30, [0, 0, 255]));
        images.insert("c".to_string(), png_of(40, 30, [0, 255, 0]));
        images.insert("bad".to_string(), b"not an image".to_vec());
        let compositor = ImageCompositor::new(Arc::new(MemoryFetcher::new(images))).with_options(
            CompositeOptions { cell_width: 40, cell_height: 30, ..CompositeOptions::default() },
        );

        let urls: Vec<String> = ["a", "missing", "bad", "c"].iter().map(|s| s.to_string()).collect();
        let png = compositor.create_composite(&urls).await.unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgb8();

        // two survivors -> 2x1 grid
        assert_eq!(img.dimensions(), (2 * 40 + 3 * 2, 30 + 2 * 2));
        assert_near(img.get_pixel(20, 17), [0, 0, 255]);
        assert_near(img.get_pixel(62, 17), [0, 255, 0]);
    }

    #[tokio::test]
    async fn test_all_failures_yield_placeholder() {
        let compositor = ImageCompositor::new(Arc::new(MemoryFetcher::new(HashMap::new())));
        let urls = vec!["x".to_string(), "y".to_string()];
        let png = compositor.create_composite(&urls).await.unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (400, 300));
        assert_eq!(*img.get_pixel(10, 10), PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_fetch_concurrency_and_truncation() {
        let mut images = HashMap::new();
        for i in 0..12 {
            images.insert(format!("img{}", i), png_of(8, 6, [10, 10, 10]));
        }
        let fetcher = Arc::new(MemoryFetcher::new(images));
        let compositor = ImageCompositor::new(fetcher.clone()).with_options(CompositeOptions {
            max_images: Some(9),
            cell_width: 8,
            cell_height: 6,
            padding: 1,
            concurrency: 3,
        });

        let urls: Vec<String> = (0..12).map(|i| format!("img{}", i)).collect();
        let png = compositor.create_composite(&urls).await.unwrap();
        let img = image::load_from_memory(&png).unwrap();

        assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
        // nine images -> 3x3 grid
        assert_eq!((img.width(), img.height()), (3 * 8 + 4, 3 * 6 + 4));
    }
}
