use std::path::{Path, PathBuf};

use gaugecast::{GaugeAssets, GaugeConfig};

/// Write a small opaque test PNG with a transparent border.
pub fn write_icon(path: &Path, size: u32) {
    let img = image::RgbaImage::from_fn(size, size, |x, y| {
        if x == 0 || y == 0 {
            image::Rgba([0, 0, 0, 0])
        } else {
            image::Rgba([220, 40, 40, 255])
        }
    });
    img.save(path).unwrap();
}

fn font_candidates() -> Vec<PathBuf> {
    let roots = [
        "/usr/share/fonts",
        "/usr/local/share/fonts",
        "/System/Library/Fonts",
        "C:\\Windows\\Fonts",
    ];
    let mut found = Vec::new();
    for root in roots {
        let mut stack = vec![PathBuf::from(root)];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase);
                if matches!(ext.as_deref(), Some("ttf" | "otf")) {
                    found.push(path);
                }
            }
        }
    }
    found
}

/// Build a config whose assets actually load: synthetic icons in `dir` plus
/// the first usable system font. `None` when the host has no fonts, in which
/// case the caller should skip.
pub fn gauge_config(dir: &Path) -> Option<GaugeConfig> {
    std::fs::create_dir_all(dir).unwrap();
    let lightning = dir.join("lightning.png");
    let heart = dir.join("heart.png");
    write_icon(&lightning, 32);
    write_icon(&heart, 32);

    for font in font_candidates() {
        let config = GaugeConfig {
            font_path: font,
            lightning_icon_path: lightning.clone(),
            heart_icon_path: heart.clone(),
            ..GaugeConfig::default()
        };
        if GaugeAssets::load(&config).is_ok() {
            return Some(config);
        }
    }
    None
}
