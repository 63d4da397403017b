//! Ranked per-capita incidence bar-chart frames from regional case counts.
//!
//! # Pipeline overview
//!
//! 1. **Load**: delimited text file -> [`Table`]
//! 2. **Transform**: `Table -> Dataset` (filter region rows, incidence per thousand, colors, dates)
//! 3. **Plan**: `Dataset -> FrameScene` per date, carrying the [`GrowthTrace`] forward
//! 4. **Render**: `FrameScene -> PNG` (SVG via `resvg`, region icons composited with `image`)
//! 5. **Encode**: all frames -> looping GIF through an [`AnimationEncoder`]
//!
//! Everything runs on one thread; the growth trace is the only state carried between dates.
#![forbid(unsafe_code)]

pub mod chart;
pub mod config;
pub mod encode;
mod foundation;
pub mod loader;
pub mod pipeline;
pub mod ranking;
pub mod regions;
pub mod scene;
pub mod trace;
pub mod transform;

pub use chart::{ChartLayout, FrameRenderer, IconStore};
pub use config::{ColumnNames, EncoderKind, Labels, RunConfig};
pub use encode::{
    AnimationEncoder, AnimationJob, GifEncoderBackend, ImageMagickEncoder, NullEncoder,
    encoder_for,
};
pub use foundation::core::{FrameSize, Rgb8};
pub use foundation::error::{RaceError, RaceResult};
pub use loader::{Table, load_csv, read_csv};
pub use pipeline::{
    RunSummary, assemble_animation, collect_frames, load_dataset, render_frames,
    render_single_frame, run, run_with_encoder, write_table,
};
pub use ranking::{growth_ratio, rank_by_incidence, ranked_subset};
pub use regions::RegionTable;
pub use scene::{BarEntry, FrameScene, ScenePlanner};
pub use trace::GrowthTrace;
pub use transform::{Dataset, Record, is_missing, parse_day_first, transform};
