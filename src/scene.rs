//! Per-date chart content.
//!
//! [`ScenePlanner`] walks the date list in ascending order and yields one [`FrameScene`] per
//! date, carrying the [`GrowthTrace`] from one date to the next. Scenes are plain data; drawing
//! happens in [`crate::chart`].

use chrono::NaiveDate;

use crate::{
    config::RunConfig,
    foundation::{
        core::Rgb8,
        error::{RaceError, RaceResult},
    },
    ranking::{growth_ratio, previous_index, rank_by_incidence, ranked_subset},
    trace::GrowthTrace,
    transform::{Dataset, Record},
};

#[derive(Clone, Debug, PartialEq)]
pub struct BarEntry {
    /// 1-based position, top of the chart first.
    pub rank: usize,
    pub region: String,
    pub incidence_per_thousand: f64,
    pub color: Rgb8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameScene {
    /// Index of `date` in [`Dataset::dates`].
    pub date_index: usize,
    pub date: NaiveDate,
    pub previous_date: NaiveDate,
    pub entries: Vec<BarEntry>,
    pub growth_ratio: f64,
    /// Snapshot of the growth trace after this date's ratio was appended.
    pub trace: Vec<f64>,
    pub inset_range: (f64, f64),
    /// Largest incidence across the whole dataset; bars share this scale on every frame.
    pub data_max: f64,
}

impl FrameScene {
    /// `(ratio - 1) * 100`
    pub fn growth_percent(&self) -> f64 {
        (self.growth_ratio - 1.0) * 100.0
    }

    /// Frame file stem, `yyyy-mm-dd`.
    pub fn file_stem(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Date as drawn on the frame, `dd/mm/yyyy`.
    pub fn display_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }
}

pub struct ScenePlanner<'a> {
    dataset: &'a Dataset,
    ranked: Vec<&'a Record>,
    trace: GrowthTrace,
    top_n: usize,
    trace_window: usize,
    inset_zoom: f64,
    data_max: f64,
    next: usize,
}

impl<'a> ScenePlanner<'a> {
    pub fn new(dataset: &'a Dataset, cfg: &RunConfig) -> RaceResult<Self> {
        if dataset.dates.is_empty() {
            return Err(RaceError::data("no region rows left after filtering"));
        }
        if cfg.start_day >= dataset.dates.len() {
            return Err(RaceError::config(format!(
                "start_day {} is past the last date (dataset has {} dates)",
                cfg.start_day,
                dataset.dates.len()
            )));
        }

        Ok(Self {
            dataset,
            ranked: rank_by_incidence(&dataset.records),
            trace: GrowthTrace::new(cfg.trace_len)?,
            top_n: cfg.top_n,
            trace_window: cfg.trace_window,
            inset_zoom: cfg.inset_zoom,
            data_max: dataset.max_incidence(),
            next: cfg.start_day,
        })
    }

    pub fn trace(&self) -> &GrowthTrace {
        &self.trace
    }

    /// Number of scenes left to yield.
    pub fn remaining(&self) -> usize {
        self.dataset.dates.len().saturating_sub(self.next)
    }
}

impl Iterator for ScenePlanner<'_> {
    type Item = FrameScene;

    fn next(&mut self) -> Option<FrameScene> {
        let dates = &self.dataset.dates;
        let i = self.next;
        let date = *dates.get(i)?;
        self.next += 1;

        let previous_date = dates[previous_index(i, dates.len())];
        let current = ranked_subset(&self.ranked, date, self.top_n);
        let previous = ranked_subset(&self.ranked, previous_date, self.top_n);

        let ratio = growth_ratio(&current, &previous);
        self.trace.push(ratio);

        let entries = current
            .iter()
            .enumerate()
            .map(|(j, r)| BarEntry {
                rank: j + 1,
                region: r.region.clone(),
                incidence_per_thousand: r.incidence_per_thousand,
                color: r.color,
            })
            .collect();

        Some(FrameScene {
            date_index: i,
            date,
            previous_date,
            entries,
            growth_ratio: ratio,
            trace: self.trace.values().to_vec(),
            inset_range: self.trace.inset_range(self.trace_window, self.inset_zoom),
            data_max: self.data_max,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}
