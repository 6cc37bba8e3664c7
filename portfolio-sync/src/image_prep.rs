//! Shrink images before they are uploaded
//!
//! Downscale so the longest edge fits, then re-encode as JPEG, lowering the
//! quality step by step until the output fits the byte target or the quality
//! floor is reached.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, RgbImage};
use tracing::debug;

use crate::error::{Result, SyncError};

#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub max_edge: u32,
    pub target_bytes: usize,
    pub initial_quality: u8,
    pub quality_step: u8,
    pub min_quality: u8,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            max_edge: 800,
            target_bytes: 300 * 1024,
            initial_quality: 70,
            quality_step: 10,
            min_quality: 10,
        }
    }
}

/// Decode `bytes`, downscale and re-encode as JPEG
pub fn prepare_image(bytes: &[u8], opts: &PrepareOptions) -> Result<Vec<u8>> {
    if opts.quality_step == 0 {
        return Err(SyncError::Image("quality_step must be at least 1".to_string()));
    }

    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();
    let img = if width.max(height) > opts.max_edge {
        img.resize(opts.max_edge, opts.max_edge, FilterType::Triangle)
    } else {
        img
    };
    let rgb = img.to_rgb8();

    let mut quality = opts.initial_quality.clamp(1, 100);
    loop {
        let encoded = encode_jpeg(&rgb, quality)?;
        if encoded.len() <= opts.target_bytes || quality <= opts.min_quality {
            debug!(
                original = bytes.len(),
                prepared = encoded.len(),
                quality,
                width = rgb.width(),
                height = rgb.height(),
                "Prepared image for upload"
            );
            return Ok(encoded);
        }
        let next = quality.saturating_sub(opts.quality_step).max(opts.min_quality).max(1);
        if next == quality {
            return Ok(encoded);
        }
        quality = next;
    }
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(img)?;
    Ok(out)
}
