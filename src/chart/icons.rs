use std::collections::HashMap;

use anyhow::Context as _;
use image::{RgbaImage, imageops::FilterType};

use crate::{foundation::error::RaceResult, regions::RegionTable};

pub fn decode_icon(bytes: &[u8]) -> RaceResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode icon from memory")?;
    Ok(dyn_img.to_rgba8())
}

/// Scale `img` to fit inside `max_w` x `max_h`, keeping its aspect ratio.
pub fn fit_icon(img: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let scale = (f64::from(max_w) / f64::from(w)).min(f64::from(max_h) / f64::from(h));
    let nw = ((f64::from(w) * scale).round() as u32).max(1);
    let nh = ((f64::from(h) * scale).round() as u32).max(1);
    if (nw, nh) == (w, h) {
        return img.clone();
    }
    image::imageops::resize(img, nw, nh, FilterType::Triangle)
}

/// Region icons, read from disk on first use and kept at their drawn size.
///
/// A missing or undecodable icon is an error for the frame that needs it.
pub struct IconStore {
    regions: RegionTable,
    max_w: u32,
    max_h: u32,
    cache: HashMap<String, RgbaImage>,
}

impl IconStore {
    pub fn new(regions: RegionTable, max_w: u32, max_h: u32) -> Self {
        Self {
            regions,
            max_w: max_w.max(1),
            max_h: max_h.max(1),
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, code: &str) -> RaceResult<&RgbaImage> {
        if !self.cache.contains_key(code) {
            let path = self.regions.icon_path(code);
            let bytes = std::fs::read(&path).with_context(|| {
                format!("read icon for region '{code}' from '{}'", path.display())
            })?;
            let icon = decode_icon(&bytes)
                .with_context(|| format!("decode icon '{}'", path.display()))?;
            let icon = fit_icon(&icon, self.max_w, self.max_h);
            tracing::debug!(code, path = %path.display(), w = icon.width(), h = icon.height(), "loaded icon");
            self.cache.insert(code.to_owned(), icon);
        }
        Ok(&self.cache[code])
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_icon_png_dimensions() {
        let icon = decode_icon(&png_bytes(3, 2)).unwrap();
        assert_eq!(icon.dimensions(), (3, 2));
        assert_eq!(icon.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert!(decode_icon(b"not a png").is_err());
    }

    #[test]
    fn fit_icon_keeps_aspect() {
        let img = RgbaImage::new(100, 70);
        assert_eq!(fit_icon(&img, 40, 14).dimensions(), (20, 14));
        assert_eq!(fit_icon(&img, 10, 100).dimensions(), (10, 7));
    }

    #[test]
    fn store_loads_once_and_reports_missing_icons() {
        let dir = std::path::PathBuf::from("target").join("icon_store_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("SP.png"), png_bytes(10, 7)).unwrap();
        let _ = std::fs::remove_file(dir.join("RJ.png"));

        let mut store = IconStore::new(RegionTable::brazil(&dir, "png"), 100, 14);
        assert_eq!(store.get("SP").unwrap().dimensions(), (20, 14));
        store.get("SP").unwrap();
        assert_eq!(store.cached(), 1);

        let err = store.get("RJ").unwrap_err();
        assert!(format!("{err:#}").contains("RJ"));
    }
}
