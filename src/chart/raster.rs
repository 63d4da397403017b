use std::{path::Path, sync::Arc};

use anyhow::Context as _;
use image::RgbaImage;

use crate::{
    chart::{
        icons::IconStore,
        layout::ChartLayout,
        svg::{IconSlot, build_frame_svg},
    },
    config::{Labels, RunConfig},
    foundation::{
        core::FrameSize,
        error::{RaceError, RaceResult},
    },
    regions::RegionTable,
    scene::FrameScene,
};

/// Draws [`FrameScene`]s into RGBA images: SVG for bars and text via `usvg`/`resvg`, region
/// icons composited on top with `image`.
pub struct FrameRenderer {
    size: FrameSize,
    rows: usize,
    headroom: f64,
    labels: Labels,
    icons: IconStore,
    svg_opts: usvg::Options<'static>,
}

impl FrameRenderer {
    pub fn new(cfg: &RunConfig, regions: RegionTable) -> RaceResult<Self> {
        cfg.frame_size.validate()?;

        // Icon bounds depend only on the frame size and row count, not on the data.
        let probe = ChartLayout::new(cfg.frame_size, cfg.top_n, 1.0, cfg.x_headroom);
        let icons = IconStore::new(regions, probe.icon_max_width(), probe.icon_max_height());

        let svg_opts = usvg::Options {
            fontdb: build_fontdb(cfg.fonts_dir.as_deref()),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };

        Ok(Self {
            size: cfg.frame_size,
            rows: cfg.top_n,
            headroom: cfg.x_headroom,
            labels: cfg.labels.clone(),
            icons,
            svg_opts,
        })
    }

    pub fn layout_for(&self, scene: &FrameScene) -> ChartLayout {
        ChartLayout::new(self.size, self.rows, scene.data_max, self.headroom)
    }

    #[tracing::instrument(skip(self, scene), fields(date = %scene.date))]
    pub fn render(&mut self, scene: &FrameScene) -> RaceResult<RgbaImage> {
        let layout = self.layout_for(scene);

        let mut slots = Vec::with_capacity(scene.entries.len());
        for (j, e) in scene.entries.iter().enumerate() {
            let icon = self.icons.get(&e.region)?;
            slots.push(IconSlot::for_row(&layout, j, icon.width(), icon.height()));
        }

        let svg = build_frame_svg(scene, &layout, &self.labels, &slots)?;
        let mut frame = rasterize_svg(&svg, &self.svg_opts, self.size)?;

        for (e, slot) in scene.entries.iter().zip(&slots) {
            let icon = self.icons.get(&e.region)?;
            image::imageops::overlay(&mut frame, icon, slot.x, slot.y);
        }

        Ok(frame)
    }
}

pub fn rasterize_svg(svg: &str, opts: &usvg::Options<'_>, size: FrameSize) -> RaceResult<RgbaImage> {
    let tree = usvg::Tree::from_str(svg, opts).context("parse frame svg")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width, size.height)
        .ok_or_else(|| RaceError::render("failed to allocate frame pixmap"))?;

    let sx = size.width as f32 / tree.size().width();
    let sy = size.height as f32 / tree.size().height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    let mut straight = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        straight.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    RgbaImage::from_raw(size.width, size.height, straight)
        .ok_or_else(|| RaceError::render("frame buffer size mismatch"))
}

pub fn save_png(img: &RgbaImage, path: &Path) -> RaceResult<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn build_fontdb(fonts_dir: Option<&Path>) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if let Some(dir) = fonts_dir {
        load_fonts_from_dir(&mut db, dir);
    }
    tracing::debug!(faces = db.len(), "font database ready");
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "fonts directory is not readable");
        return;
    };

    for path in rd.flatten().map(|e| e.path()) {
        let is_font = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"));
        if !is_font {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::debug!(path = %path.display(), error = %e, "skipped font file");
        }
    }
}

/// Chart text is serif: try the requested families, then serif, then any face at all.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let named: Vec<&str> = font
                .families()
                .iter()
                .filter_map(|f| match f {
                    usvg::FontFamily::Named(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect();
            let mut families: Vec<Family<'_>> = named.into_iter().map(Family::Name).collect();
            families.push(Family::Serif);

            let query = Query {
                families: &families,
                weight: Weight(font.weight()),
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterize_fills_the_frame() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="2" height="2" fill="rgb(255,0,0)"/><rect x="2" width="2" height="2" fill="rgb(0,0,255)"/></svg>"#;
        let size = FrameSize {
            width: 4,
            height: 2,
        };
        let img = rasterize_svg(svg, &usvg::Options::default(), size).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(3, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn rasterize_rejects_bad_svg() {
        let size = FrameSize {
            width: 4,
            height: 4,
        };
        assert!(rasterize_svg("<svg", &usvg::Options::default(), size).is_err());
    }

    #[test]
    fn fonts_dir_only_loads_font_files() {
        let dir = std::path::PathBuf::from("target").join("fonts_dir_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("notes.txt"), b"not a font").unwrap();
        std::fs::write(dir.join("broken.TTF"), b"not a font either").unwrap();

        let mut db = usvg::fontdb::Database::new();
        load_fonts_from_dir(&mut db, &dir);
        assert_eq!(db.len(), 0);

        load_fonts_from_dir(&mut db, &dir.join("missing"));
        assert_eq!(db.len(), 0);
    }
}
