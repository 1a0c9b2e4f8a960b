use std::{collections::HashMap, sync::Arc};

use fontdue::{
    Font,
    layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle},
};

use crate::config::Rgba;

/// A rasterized text run with outline, straight-alpha RGBA, tightly packed.
#[derive(Clone, Debug)]
pub struct TextTile {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TileKey {
    text: String,
    px: u32,
}

#[derive(Clone, Debug)]
struct GlyphBitmap {
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

/// Rasterizes outlined text runs, caching at two levels: per glyph
/// (keyed by fontdue's raster config) and per finished string tile
/// (structured `(text, px)` key), so recurring numeric strings across
/// different gauge states are never re-rasterized.
///
/// Caches are scoped to the painter instance, i.e. to one generation run.
pub struct TextPainter {
    font: Arc<Font>,
    fill: Rgba,
    outline: Rgba,
    stroke: u32,
    glyph_cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
    tile_cache: HashMap<TileKey, Arc<TextTile>>,
}

impl TextPainter {
    pub fn new(font: Arc<Font>, fill: Rgba, outline: Rgba, stroke: u32) -> Self {
        Self {
            font,
            fill,
            outline,
            stroke,
            glyph_cache: HashMap::new(),
            tile_cache: HashMap::new(),
        }
    }

    /// Number of distinct string tiles rendered so far.
    pub fn cached_tiles(&self) -> usize {
        self.tile_cache.len()
    }

    /// Get or rasterize the tile for `text` at `px` pixels.
    pub fn tile(&mut self, text: &str, px: u32) -> Arc<TextTile> {
        let key = TileKey {
            text: text.to_string(),
            px,
        };
        if let Some(tile) = self.tile_cache.get(&key) {
            return Arc::clone(tile);
        }
        let tile = Arc::new(self.rasterize(text, px));
        self.tile_cache.insert(key, Arc::clone(&tile));
        tile
    }

    fn rasterize(&mut self, text: &str, px: u32) -> TextTile {
        let (mask, mask_w, mask_h) = self.coverage_mask(text, px as f32);

        let stroke = self.stroke as usize;
        let tile_w = mask_w + 2 * stroke;
        let tile_h = mask_h + 2 * stroke;

        // Outline = fill coverage dilated by every offset inside the stroke
        // disc (offsets with dx^2 + dy^2 >= stroke^2 excluded), max-blended.
        let mut outline_cov = vec![0u8; tile_w * tile_h];
        let r2 = (stroke * stroke) as i64;
        for dy in -(stroke as i64)..=(stroke as i64) {
            for dx in -(stroke as i64)..=(stroke as i64) {
                if dx * dx + dy * dy >= r2 {
                    continue;
                }
                for my in 0..mask_h {
                    let ty = (my as i64 + stroke as i64 + dy) as usize;
                    let row_src = my * mask_w;
                    let row_dst = ty * tile_w + (stroke as i64 + dx) as usize;
                    for mx in 0..mask_w {
                        let cov = mask[row_src + mx];
                        if cov > 0 {
                            let dst = &mut outline_cov[row_dst + mx];
                            *dst = (*dst).max(cov);
                        }
                    }
                }
            }
        }

        let mut rgba = vec![0u8; tile_w * tile_h * 4];
        for ty in 0..tile_h {
            for tx in 0..tile_w {
                let idx = ty * tile_w + tx;
                let mut px_out = [0u8; 4];
                let oc = outline_cov[idx];
                if oc > 0 {
                    px_out = weighted(self.outline, oc);
                }
                if ty >= stroke && ty < stroke + mask_h && tx >= stroke && tx < stroke + mask_w {
                    let fc = mask[(ty - stroke) * mask_w + (tx - stroke)];
                    if fc > 0 {
                        px_out = over_straight(px_out, weighted(self.fill, fc));
                    }
                }
                rgba[idx * 4..idx * 4 + 4].copy_from_slice(&px_out);
            }
        }

        TextTile {
            width: tile_w as u32,
            height: tile_h as u32,
            rgba,
        }
    }

    // Rasterize `text` into a tightly-bounded alpha coverage mask.
    fn coverage_mask(&mut self, text: &str, px: f32) -> (Vec<u8>, usize, usize) {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: 0.0,
            y: 0.0,
            ..LayoutSettings::default()
        });
        layout.append(
            std::slice::from_ref(self.font.as_ref()),
            &TextStyle::new(text, px, 0),
        );

        let mut min_x = i64::MAX;
        let mut min_y = i64::MAX;
        let mut max_x = i64::MIN;
        let mut max_y = i64::MIN;
        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let gx = glyph.x.floor() as i64;
            let gy = glyph.y.floor() as i64;
            min_x = min_x.min(gx);
            min_y = min_y.min(gy);
            max_x = max_x.max(gx + glyph.width as i64);
            max_y = max_y.max(gy + glyph.height as i64);
        }
        if min_x > max_x {
            return (vec![0u8; 1], 1, 1);
        }

        let mask_w = (max_x - min_x) as usize;
        let mask_h = (max_y - min_y) as usize;
        let mut mask = vec![0u8; mask_w * mask_h];

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let bitmap = self.glyph_cache.entry(glyph.key).or_insert_with(|| {
                let (_, coverage) = self.font.rasterize_config(glyph.key);
                GlyphBitmap {
                    width: glyph.width,
                    height: glyph.height,
                    coverage,
                }
            });
            let gx = (glyph.x.floor() as i64 - min_x) as usize;
            let gy = (glyph.y.floor() as i64 - min_y) as usize;
            for row in 0..bitmap.height {
                let dst_row = (gy + row) * mask_w + gx;
                let src_row = row * bitmap.width;
                for col in 0..bitmap.width {
                    let dst = &mut mask[dst_row + col];
                    *dst = (*dst).max(bitmap.coverage[src_row + col]);
                }
            }
        }
        (mask, mask_w, mask_h)
    }
}

fn weighted(color: Rgba, coverage: u8) -> Rgba {
    let a = (u16::from(color[3]) * u16::from(coverage) + 127) / 255;
    [color[0], color[1], color[2], a as u8]
}

// Straight-alpha source-over for tile composition.
fn over_straight(dst: Rgba, src: Rgba) -> Rgba {
    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let sc = f32::from(src[c]);
        let dc = f32::from(dst[c]);
        out[c] = ((sc * sa + dc * da * (1.0 - sa)) / oa).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (oa * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}
