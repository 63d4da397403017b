//! Pixel geometry of a frame.
//!
//! The bar area uses data coordinates like a plotting axis: x runs from 0 to
//! `headroom * data_max`, y runs from -1 (top) to `rows` (bottom) so row `j` is centred on `y = j`
//! and each bar is one unit tall.

use crate::foundation::core::FrameSize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartLayout {
    pub size: FrameSize,
    pub plot: Rect,
    pub rows: usize,
    /// Largest value in the data; text annotations are placed relative to it.
    pub data_max: f64,
    /// Right edge of the x axis in data units.
    pub axis_max: f64,
}

impl ChartLayout {
    pub fn new(size: FrameSize, rows: usize, data_max: f64, headroom: f64) -> Self {
        let w = f64::from(size.width);
        let h = f64::from(size.height);

        let plot = Rect {
            x0: (w * 0.145).round(),
            y0: (h * 0.075).round(),
            x1: (w * 0.975).round(),
            y1: (h * 0.93).round(),
        };

        // An all-zero table still needs a non-empty axis.
        let data_max = if data_max > 0.0 && data_max.is_finite() {
            data_max
        } else {
            1.0
        };

        Self {
            size,
            plot,
            rows: rows.max(1),
            data_max,
            axis_max: data_max * headroom,
        }
    }

    /// Height of one row (= one bar) in pixels.
    pub fn row_height(&self) -> f64 {
        self.plot.height() / (self.rows as f64 + 1.0)
    }

    pub fn x_px(&self, v: f64) -> f64 {
        self.plot.x0 + (v / self.axis_max).clamp(0.0, 1.0) * self.plot.width()
    }

    pub fn y_px(&self, y: f64) -> f64 {
        self.plot.y0 + (y + 1.0) * self.row_height()
    }

    pub fn row_center(&self, j: usize) -> f64 {
        self.y_px(j as f64)
    }

    /// Sparkline box, anchored to the bar area at fractions `[0.66, 0.23, 0.3, 0.27]`
    /// (left, bottom, width, height; bottom measured upward).
    pub fn inset(&self) -> Rect {
        let p = self.plot;
        let x0 = p.x0 + 0.66 * p.width();
        let y1 = p.y1 - 0.23 * p.height();
        Rect {
            x0,
            y0: y1 - 0.27 * p.height(),
            x1: x0 + 0.3 * p.width(),
            y1,
        }
    }

    /// Horizontal centre of the rank number, left of the axis.
    pub fn rank_x(&self) -> f64 {
        self.plot.x0 - 0.025 * f64::from(self.size.width)
    }

    /// Horizontal centre of the region icon.
    pub fn icon_x(&self) -> f64 {
        self.plot.x0 - 0.066 * f64::from(self.size.width)
    }

    /// Right edge of the region code label.
    pub fn code_label_x(&self) -> f64 {
        self.plot.x0 - 0.092 * f64::from(self.size.width)
    }

    /// Largest icon height that still leaves a gap between rows.
    pub fn icon_max_height(&self) -> u32 {
        (self.row_height() * 0.8).floor().max(1.0) as u32
    }

    /// Largest icon width, so icons stay between the code label and the rank number.
    pub fn icon_max_width(&self) -> u32 {
        ((self.rank_x() - self.code_label_x()) * 0.9).floor().max(1.0) as u32
    }
}

/// Up to `max_intervals` evenly spaced ticks from 0 with a step of 1, 2, 2.5 or 5 times a power
/// of ten.
pub fn nice_ticks(axis_max: f64, max_intervals: usize) -> Vec<f64> {
    if !axis_max.is_finite() || axis_max <= 0.0 || max_intervals == 0 {
        return vec![0.0];
    }

    let raw = axis_max / max_intervals as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw * (1.0 - 1e-9))
        .unwrap_or(10.0 * magnitude);

    let mut ticks = Vec::with_capacity(max_intervals + 1);
    let mut k = 0usize;
    loop {
        let t = step * k as f64;
        if t > axis_max * (1.0 + 1e-9) {
            break;
        }
        ticks.push(t);
        k += 1;
    }
    ticks
}

/// Plain decimal tick label without trailing zeros.
pub fn format_tick(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

/// Widen an empty or inverted range so it can be drawn. Zero expands to ±0.05, anything else by
/// 5% of its magnitude.
pub fn nonsingular(lo: f64, hi: f64) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (-0.05, 0.05);
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if hi - lo > f64::EPSILON * hi.abs().max(lo.abs()).max(1.0) {
        return (lo, hi);
    }
    if lo == 0.0 && hi == 0.0 {
        return (-0.05, 0.05);
    }
    (lo - 0.05 * lo.abs(), hi + 0.05 * hi.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ChartLayout {
        ChartLayout::new(
            FrameSize {
                width: 694,
                height: 694,
            },
            27,
            40.0,
            1.15,
        )
    }

    #[test]
    fn rows_are_one_unit_tall_and_ordered_top_down() {
        let l = layout();
        let h = l.row_height();
        assert!((l.row_center(1) - l.row_center(0) - h).abs() < 1e-9);
        assert!((l.y_px(-1.0) - l.plot.y0).abs() < 1e-9);
        assert!((l.y_px(27.0) - l.plot.y1).abs() < 1e-9);
    }

    #[test]
    fn x_axis_spans_headroom() {
        let l = layout();
        assert_eq!(l.x_px(0.0), l.plot.x0);
        assert!((l.x_px(46.0) - l.plot.x1).abs() < 1e-9);
        assert!(l.x_px(40.0) < l.plot.x1);
        assert_eq!(l.x_px(1e9), l.plot.x1);
    }

    #[test]
    fn zero_data_max_still_yields_an_axis() {
        let l = ChartLayout::new(
            FrameSize {
                width: 100,
                height: 100,
            },
            3,
            0.0,
            1.15,
        );
        assert!(l.axis_max > 0.0);
    }

    #[test]
    fn inset_sits_inside_plot() {
        let l = layout();
        let i = l.inset();
        assert!(i.x0 > l.plot.x0 && i.x1 < l.plot.x1);
        assert!(i.y0 > l.plot.y0 && i.y1 < l.plot.y1);
    }

    #[test]
    fn left_decorations_are_ordered() {
        let l = layout();
        assert!(l.code_label_x() < l.icon_x());
        assert!(l.icon_x() < l.rank_x());
        assert!(l.rank_x() < l.plot.x0);
        assert!(l.icon_max_height() >= 1);
    }

    #[test]
    fn nice_ticks_use_at_most_four_intervals() {
        assert_eq!(nice_ticks(46.0, 4), [0.0, 20.0, 40.0]);
        assert_eq!(nice_ticks(10.0, 4), [0.0, 2.5, 5.0, 7.5, 10.0]);
        let small = nice_ticks(1.15, 4);
        assert_eq!(small.len(), 3);
        assert!((small[1] - 0.5).abs() < 1e-12 && (small[2] - 1.0).abs() < 1e-12);
        assert_eq!(nice_ticks(0.0, 4), [0.0]);
    }

    #[test]
    fn tick_labels_are_plain() {
        assert_eq!(format_tick(20.0), "20");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(0.0), "0");
    }

    #[test]
    fn nonsingular_widens_empty_ranges() {
        assert_eq!(nonsingular(0.0, 0.0), (-0.05, 0.05));
        let (lo, hi) = nonsingular(2.0, 2.0);
        assert!((lo - 1.9).abs() < 1e-12 && (hi - 2.1).abs() < 1e-12);
        assert_eq!(nonsingular(1.0, 3.0), (1.0, 3.0));
        assert_eq!(nonsingular(3.0, 1.0), (1.0, 3.0));
    }
}
