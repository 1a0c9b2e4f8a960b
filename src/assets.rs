use std::{path::Path, sync::Arc};

use fontdue::{Font, FontSettings};
use image::{RgbaImage, imageops};

use crate::{
    config::GaugeConfig,
    error::{GaugeError, GaugeResult},
};

/// Decoded icon, straight-alpha RGBA8, row-major, tightly packed.
#[derive(Clone, Debug)]
pub struct PreparedIcon {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PreparedIcon {
    fn from_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            rgba: img.into_raw(),
        }
    }

    /// Uniformly scaled copy (Lanczos3). Dimensions floor at 1px.
    pub fn scaled(&self, scale: f64) -> Self {
        let w = ((f64::from(self.width) * scale) as u32).max(1);
        let h = ((f64::from(self.height) * scale) as u32).max(1);
        if w == self.width && h == self.height {
            return self.clone();
        }
        let img = RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .expect("icon buffer matches its dimensions");
        Self::from_image(imageops::resize(&img, w, h, imageops::FilterType::Lanczos3))
    }
}

/// Font and icons for one generation run, loaded once at pipeline start and
/// never mutated afterwards. Any missing or undecodable file is fatal here,
/// before any frame work happens.
pub struct GaugeAssets {
    pub font: Arc<Font>,
    pub lightning: PreparedIcon,
    pub heart: PreparedIcon,
}

impl GaugeAssets {
    pub fn load(config: &GaugeConfig) -> GaugeResult<Self> {
        Ok(Self {
            font: load_font(&config.font_path)?,
            lightning: load_icon(&config.lightning_icon_path, config.layout.icon_height)?,
            heart: load_icon(&config.heart_icon_path, config.layout.icon_height)?,
        })
    }
}

fn load_font(path: &Path) -> GaugeResult<Arc<Font>> {
    let bytes = std::fs::read(path)
        .map_err(|e| GaugeError::missing_asset(format!("font '{}': {e}", path.display())))?;
    let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| {
        GaugeError::missing_asset(format!("font '{}' could not be parsed: {e}", path.display()))
    })?;
    Ok(Arc::new(font))
}

fn load_icon(path: &Path, target_height: u32) -> GaugeResult<PreparedIcon> {
    let bytes = std::fs::read(path)
        .map_err(|e| GaugeError::missing_asset(format!("icon '{}': {e}", path.display())))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| {
            GaugeError::missing_asset(format!(
                "icon '{}' could not be decoded: {e}",
                path.display()
            ))
        })?
        .to_rgba8();

    // Scale to the configured gauge height, preserving aspect ratio.
    let (w, h) = img.dimensions();
    let target_height = target_height.max(1);
    let target_width = ((f64::from(target_height) * f64::from(w) / f64::from(h)) as u32).max(1);
    let resized = if (target_width, target_height) == (w, h) {
        img
    } else {
        imageops::resize(
            &img,
            target_width,
            target_height,
            imageops::FilterType::Lanczos3,
        )
    };
    Ok(PreparedIcon::from_image(resized))
}
