//! SVG document for one frame. Icons are not embedded; the rasterizer composites them into the
//! boxes listed in [`IconSlot`].

use std::fmt::Write as _;

use crate::{
    chart::layout::{ChartLayout, format_tick, nice_ticks, nonsingular},
    config::Labels,
    foundation::{
        core::Rgb8,
        error::{RaceError, RaceResult},
    },
    scene::FrameScene,
};

const AXIS_COLOR: &str = "#000000";
const TRACE_COLOR: &str = "#1F77B4";

const TITLE_PX: f64 = 22.0;
const DATE_PX: f64 = 30.0;
const NOTE_PX: f64 = 16.0;
const TICK_PX: f64 = 14.0;
const CODE_PX: f64 = 13.0;
const VALUE_PX: f64 = 11.0;

/// Where an icon of `w` x `h` pixels goes, top-left at (`x`, `y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconSlot {
    pub x: i64,
    pub y: i64,
    pub w: u32,
    pub h: u32,
}

impl IconSlot {
    /// Centre an icon of the given size on the icon column of row `j`.
    pub fn for_row(layout: &ChartLayout, j: usize, w: u32, h: u32) -> Self {
        Self {
            x: (layout.icon_x() - f64::from(w) / 2.0).round() as i64,
            y: (layout.row_center(j) - f64::from(h) / 2.0).round() as i64,
            w,
            h,
        }
    }
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Value label text beside a bar: one decimal.
pub fn value_label(v: f64) -> String {
    format!("{v:.1}")
}

pub fn growth_label(prefix: &str, percent: f64) -> String {
    format!("{prefix}: {percent:.2} %")
}

pub fn build_frame_svg(
    scene: &FrameScene,
    layout: &ChartLayout,
    labels: &Labels,
    icons: &[IconSlot],
) -> RaceResult<String> {
    write_frame_svg(scene, layout, labels, icons)
        .map_err(|_| RaceError::render("failed to format frame svg"))
}

fn write_frame_svg(
    scene: &FrameScene,
    layout: &ChartLayout,
    labels: &Labels,
    icons: &[IconSlot],
) -> Result<String, std::fmt::Error> {
    let w = layout.size.width;
    let h = layout.size.height;
    let p = layout.plot;
    let font = escape_xml(&labels.font_family);
    let mut s = String::with_capacity(16 * 1024);

    writeln!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#
    )?;
    writeln!(s, r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}"/>"#, Rgb8::WHITE)?;

    let inset = layout.inset();
    writeln!(
        s,
        r#"<defs><clipPath id="plot-clip"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath><clipPath id="inset-clip"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>"#,
        p.x0,
        p.y0,
        p.width(),
        p.height(),
        inset.x0,
        inset.y0,
        inset.width(),
        inset.height()
    )?;

    writeln!(
        s,
        r#"<text x="{:.2}" y="{:.2}" font-size="{TITLE_PX}" text-anchor="middle">{}</text>"#,
        (p.x0 + p.x1) / 2.0,
        p.y0 - 0.5 * TITLE_PX,
        escape_xml(&labels.title)
    )?;

    // bars
    writeln!(s, r#"<g clip-path="url(#plot-clip)">"#)?;
    let row_h = layout.row_height();
    for (j, e) in scene.entries.iter().enumerate() {
        let top = layout.row_center(j) - row_h / 2.0;
        let right = layout.x_px(e.incidence_per_thousand);
        writeln!(
            s,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            p.x0,
            top,
            (right - p.x0).max(0.0),
            row_h,
            e.color
        )?;
    }
    writeln!(s, "</g>")?;

    // value labels
    for (j, e) in scene.entries.iter().enumerate() {
        let v = e.incidence_per_thousand;
        writeln!(
            s,
            r#"<text x="{:.2}" y="{:.2}" font-size="{VALUE_PX}" font-weight="bold" fill="{AXIS_COLOR}">{}</text>"#,
            layout.x_px(v * 1.025),
            layout.y_px(j as f64 + 0.25),
            value_label(v)
        )?;
    }

    // axes frame + x ticks
    writeln!(
        s,
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{AXIS_COLOR}" stroke-width="1"/>"#,
        p.x0,
        p.y0,
        p.width(),
        p.height()
    )?;
    for t in nice_ticks(layout.axis_max, 4) {
        let x = layout.x_px(t);
        writeln!(
            s,
            r#"<line x1="{x:.2}" y1="{:.2}" x2="{x:.2}" y2="{:.2}" stroke="{AXIS_COLOR}" stroke-width="1"/>"#,
            p.y1,
            p.y1 + 5.0
        )?;
        writeln!(
            s,
            r#"<text x="{x:.2}" y="{:.2}" font-size="{TICK_PX}" text-anchor="middle">{}</text>"#,
            p.y1 + 7.0 + TICK_PX,
            format_tick(t)
        )?;
    }

    // row decorations: tick, code, rank, icon frame
    for (j, e) in scene.entries.iter().enumerate() {
        let y = layout.row_center(j);
        writeln!(
            s,
            r#"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{AXIS_COLOR}" stroke-width="1"/>"#,
            p.x0 - 5.0,
            p.x0
        )?;
        writeln!(
            s,
            r#"<text x="{:.2}" y="{:.2}" font-size="{CODE_PX}" text-anchor="end">{}</text>"#,
            layout.code_label_x(),
            y + 0.35 * CODE_PX,
            escape_xml(&e.region)
        )?;
        writeln!(
            s,
            r#"<text x="{:.2}" y="{:.2}" font-size="{VALUE_PX}" text-anchor="middle">{:02}</text>"#,
            layout.rank_x(),
            y + 0.35 * VALUE_PX,
            e.rank
        )?;
    }
    for slot in icons {
        writeln!(
            s,
            r#"<rect x="{:.1}" y="{:.1}" width="{}" height="{}" fill="none" stroke="{AXIS_COLOR}" stroke-width="1"/>"#,
            slot.x as f64 - 0.5,
            slot.y as f64 - 0.5,
            slot.w + 1,
            slot.h + 1
        )?;
    }

    // annotations, anchored in data coordinates like the bars
    let text_x = layout.x_px(1.12 * layout.data_max);
    let rows = layout.rows as f64;
    writeln!(
        s,
        r#"<text x="{text_x:.2}" y="{:.2}" font-size="{DATE_PX}" text-anchor="end">{}</text>"#,
        layout.y_px(0.86 * rows),
        scene.display_date()
    )?;
    writeln!(
        s,
        r#"<text x="{text_x:.2}" y="{:.2}" font-size="{NOTE_PX}" text-anchor="end">{}</text>"#,
        layout.y_px(0.92 * rows),
        escape_xml(&growth_label(&labels.growth, scene.growth_percent()))
    )?;
    writeln!(
        s,
        r#"<text x="{text_x:.2}" y="{:.2}" font-size="{NOTE_PX}" text-anchor="end">{}</text>"#,
        layout.y_px(0.97 * rows),
        escape_xml(&labels.attribution)
    )?;

    // growth sparkline
    writeln!(
        s,
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" stroke="{AXIS_COLOR}" stroke-width="1"/>"#,
        inset.x0,
        inset.y0,
        inset.width(),
        inset.height(),
        Rgb8::WHITE
    )?;
    let (lo, hi) = nonsingular(scene.inset_range.0, scene.inset_range.1);
    let span = (scene.trace.len().max(2) - 1) as f64;
    let mut points = String::new();
    for (k, v) in scene.trace.iter().enumerate() {
        let x = inset.x0 + (k as f64 / span) * inset.width();
        let y = inset.y1 - ((v - lo) / (hi - lo)) * inset.height();
        // keep far-off values finite so the polyline still parses
        let y = y.clamp(inset.y0 - 1e4, inset.y1 + 1e4);
        write!(points, "{x:.2},{y:.2} ")?;
    }
    writeln!(
        s,
        r#"<polyline points="{}" fill="none" stroke="{TRACE_COLOR}" stroke-width="1.5" clip-path="url(#inset-clip)"/>"#,
        points.trim_end()
    )?;

    writeln!(s, "</svg>")?;
    Ok(s)
}
