//! Kroki rendering client
//!
//! Posts Mermaid source to a Kroki-compatible endpoint and flattens the
//! returned PNG onto an opaque white background.

use super::{DiagramRenderer, RenderError};
use crate::config::DiagramConfig;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the Kroki diagram service
#[derive(Debug, Clone)]
pub struct KrokiRenderer {
    client: reqwest::Client,
    endpoint: String,
}

impl KrokiRenderer {
    pub fn new(config: &DiagramConfig) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.render_url.clone(),
        })
    }
}

impl DiagramRenderer for KrokiRenderer {
    async fn render(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        debug!("Rendering diagram ({} bytes) via {}", source.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "diagram_source": source }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Diagram service rejected request with {}", status);
            return Err(RenderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        flatten_onto_white(&bytes)
    }
}

/// Composite an image onto a white background using its alpha channel and
/// re-encode it as PNG
pub fn flatten_onto_white(bytes: &[u8]) -> Result<Vec<u8>, RenderError> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| RenderError::InvalidImage {
            reason: e.to_string(),
            response: String::from_utf8_lossy(bytes).into_owned(),
        })?
        .to_rgba8();

    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u32::from(a);
        let blend = |channel: u8| ((u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        flattened.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(flattened)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    Ok(png)
}
