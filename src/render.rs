use std::collections::HashMap;

use crate::{
    assets::GaugeAssets,
    composite::overlay_rgba,
    config::GaugeConfig,
    core::{FrameIndex, Fps},
    error::GaugeResult,
    resample::ResampledFrame,
    text::TextPainter,
};

/// One fully composited frame, straight-alpha RGBA8 (always opaque),
/// row-major, tightly packed.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Quantized metric state identifying one static gauge raster.
///
/// Rounding to the nearest integer collapses the continuous metric space
/// into a finite, reusable set of visual states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GaugeKey {
    pub power: i64,
    pub heart_rate: i64,
}

impl GaugeKey {
    pub fn quantize(power: f64, heart_rate: f64) -> Self {
        Self {
            power: power.round() as i64,
            heart_rate: heart_rate.round() as i64,
        }
    }
}

/// Heart pulse scale factor for a frame.
///
/// The visual beat frequency is `heart_rate / 60` Hz of output video time
/// regardless of frame rate, so the animation tracks wall-clock-equivalent
/// elapsed time rather than frame count.
pub fn heart_scale(heart_rate_bpm: f64, frame: FrameIndex, fps: Fps, strength: f64) -> f64 {
    let elapsed = frame.0 as f64 * fps.frame_duration_secs();
    let beat_hz = heart_rate_bpm / 60.0;
    1.0 + strength * (0.5 + 0.5 * (std::f64::consts::TAU * beat_hz * elapsed).sin())
}

struct BaseFrame {
    pixels: FrameRGBA,
    /// Width of the heart-rate text tile; the animated heart is placed
    /// against it, so cache hits need it without re-rasterizing the text.
    hr_text_width: u32,
}

/// Turns per-frame metric values into composited gauge frames.
///
/// The static layers (background, texts, lightning icon) are cached per
/// quantized [`GaugeKey`]; the pulsing heart icon is recomputed every frame
/// because its size varies continuously. Both the base-frame cache and the
/// text tile caches live on the renderer instance and die with the run.
pub struct GaugeRenderer {
    config: GaugeConfig,
    assets: GaugeAssets,
    painter: TextPainter,
    base_cache: HashMap<GaugeKey, BaseFrame>,
}

impl GaugeRenderer {
    /// Load assets per `config` and build a renderer. A missing font or
    /// icon fails here, before any frame is produced.
    pub fn load(config: GaugeConfig) -> GaugeResult<Self> {
        let assets = GaugeAssets::load(&config)?;
        Ok(Self::with_assets(config, assets))
    }

    pub fn with_assets(config: GaugeConfig, assets: GaugeAssets) -> Self {
        let painter = TextPainter::new(
            std::sync::Arc::clone(&assets.font),
            config.text_fill,
            config.text_outline,
            config.outline_width,
        );
        Self {
            config,
            assets,
            painter,
            base_cache: HashMap::new(),
        }
    }

    /// Number of distinct quantized states rendered so far.
    pub fn cached_base_frames(&self) -> usize {
        self.base_cache.len()
    }

    pub fn render_frame(&mut self, frame: &ResampledFrame) -> GaugeResult<FrameRGBA> {
        let key = GaugeKey::quantize(frame.power, frame.heart_rate);

        if !self.base_cache.contains_key(&key) {
            let base = self.render_base(key)?;
            tracing::debug!(power = key.power, heart_rate = key.heart_rate, "rendered base frame");
            self.base_cache.insert(key, base);
        }
        let base = &self.base_cache[&key];
        let mut canvas = base.pixels.clone();
        let hr_text_width = base.hr_text_width;

        // The pulsing heart is re-laid every frame, cache hit or not.
        let scale = heart_scale(
            key.heart_rate as f64,
            frame.frame_index,
            self.config.fps,
            self.config.heart_animation_strength,
        );
        let heart = self.assets.heart.scaled(scale);
        let layout = self.config.layout;
        let heart_x = layout.start_x + i64::from(hr_text_width) + layout.icon_spacing;
        let hr_line_y =
            layout.start_y + layout.line_height_xl + layout.line_spacing + layout.line_height_l
                + layout.line_spacing;
        let heart_y = hr_line_y + (layout.line_height_l - i64::from(heart.height)) / 2;
        overlay_rgba(
            &mut canvas.data,
            canvas.width,
            canvas.height,
            &heart.rgba,
            heart.width,
            heart.height,
            heart_x,
            heart_y,
        )?;

        Ok(canvas)
    }

    // Background fill plus every static text/icon layer except the heart.
    fn render_base(&mut self, key: GaugeKey) -> GaugeResult<BaseFrame> {
        let canvas_dims = self.config.canvas;
        let layout = self.config.layout;
        let [bg_r, bg_g, bg_b, _] = self.config.background;

        let data =
            [bg_r, bg_g, bg_b, 255].repeat((canvas_dims.width * canvas_dims.height) as usize);
        let mut pixels = FrameRGBA {
            width: canvas_dims.width,
            height: canvas_dims.height,
            data,
        };

        let mut current_y = layout.start_y;

        // Power line: XL text plus the lightning bolt beside it.
        let power_tile = self.painter.tile(&format!("{}W", key.power), self.config.font_px_xl);
        let text_y = current_y + (layout.line_height_xl - i64::from(power_tile.height)) / 2;
        overlay_rgba(
            &mut pixels.data,
            pixels.width,
            pixels.height,
            &power_tile.rgba,
            power_tile.width,
            power_tile.height,
            layout.start_x,
            text_y,
        )?;
        let bolt = &self.assets.lightning;
        let bolt_x = layout.start_x + i64::from(power_tile.width) + layout.icon_spacing;
        let bolt_y = current_y + (layout.line_height_xl - i64::from(bolt.height)) / 2;
        overlay_rgba(
            &mut pixels.data,
            pixels.width,
            pixels.height,
            &bolt.rgba,
            bolt.width,
            bolt.height,
            bolt_x,
            bolt_y,
        )?;
        current_y += layout.line_height_xl + layout.line_spacing;

        // Watts-per-kilogram line. Derived from the quantized power so that
        // equal keys always produce byte-identical base rasters.
        let wkg = if self.config.body_weight_kg > 0.0 {
            key.power as f64 / self.config.body_weight_kg
        } else {
            0.0
        };
        let wkg_tile = self
            .painter
            .tile(&format!("{wkg:.1} W/kg"), self.config.font_px_l);
        let text_y = current_y + (layout.line_height_l - i64::from(wkg_tile.height)) / 2;
        overlay_rgba(
            &mut pixels.data,
            pixels.width,
            pixels.height,
            &wkg_tile.rgba,
            wkg_tile.width,
            wkg_tile.height,
            layout.start_x,
            text_y,
        )?;
        current_y += layout.line_height_l + layout.line_spacing;

        // Heart-rate line, static text only; the icon is animated per frame.
        let hr_tile = self
            .painter
            .tile(&format!("{} bpm", key.heart_rate), self.config.font_px_l);
        let text_y = current_y + (layout.line_height_l - i64::from(hr_tile.height)) / 2;
        overlay_rgba(
            &mut pixels.data,
            pixels.width,
            pixels.height,
            &hr_tile.rgba,
            hr_tile.width,
            hr_tile.height,
            layout.start_x,
            text_y,
        )?;

        Ok(BaseFrame {
            pixels,
            hr_text_width: hr_tile.width,
        })
    }
}
