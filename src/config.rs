use std::path::PathBuf;

use crate::core::{Canvas, Fps};

/// Straight-alpha RGBA color.
pub type Rgba = [u8; 4];

/// Pixel offsets and spacing for the gauge block.
///
/// All values are in canvas pixels. The gauge stacks three lines from
/// `start_y` downward: power (XL), watts-per-kilogram (L), heart rate (L),
/// with icons placed `icon_spacing` to the right of their line's text.
#[derive(Clone, Copy, Debug)]
pub struct GaugeLayout {
    pub start_x: i64,
    pub start_y: i64,
    pub line_spacing: i64,
    pub icon_spacing: i64,
    pub icon_height: u32,
    pub line_height_xl: i64,
    pub line_height_l: i64,
}

impl Default for GaugeLayout {
    fn default() -> Self {
        Self {
            start_x: 100,
            start_y: 100,
            line_spacing: 30,
            icon_spacing: 20,
            icon_height: 90,
            line_height_xl: 130,
            line_height_l: 100,
        }
    }
}

/// Fixed configuration for one generation run.
///
/// These are build-time product constants, not runtime flags; `Default`
/// carries the shipped values. Tests construct variants directly.
#[derive(Clone, Debug)]
pub struct GaugeConfig {
    pub fps: Fps,
    pub canvas: Canvas,
    pub body_weight_kg: f64,
    /// Opaque background fill, RGB (alpha ignored).
    pub background: Rgba,
    pub text_fill: Rgba,
    pub text_outline: Rgba,
    pub outline_width: u32,
    /// Font pixel size for the power line.
    pub font_px_xl: u32,
    /// Font pixel size for the W/kg and heart-rate lines.
    pub font_px_l: u32,
    pub layout: GaugeLayout,
    /// Amplitude of the heart pulse animation (0 disables it).
    pub heart_animation_strength: f64,
    pub font_path: PathBuf,
    pub lightning_icon_path: PathBuf,
    pub heart_icon_path: PathBuf,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            fps: Fps { num: 30, den: 1 },
            canvas: Canvas {
                width: 1280,
                height: 720,
            },
            body_weight_kg: 65.0,
            background: [0, 0, 255, 255],
            text_fill: [255, 255, 255, 255],
            text_outline: [0, 0, 0, 255],
            outline_width: 5,
            font_px_xl: 120,
            font_px_l: 90,
            layout: GaugeLayout::default(),
            heart_animation_strength: 0.15,
            font_path: PathBuf::from("assets/fonts/gauge.ttf"),
            lightning_icon_path: PathBuf::from("assets/icons/lightning.png"),
            heart_icon_path: PathBuf::from("assets/icons/heart.png"),
        }
    }
}
