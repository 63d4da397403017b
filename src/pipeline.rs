//! End-to-end runs: load, transform, render every date, assemble the animation.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;

use crate::{
    chart::{FrameRenderer, save_png},
    config::RunConfig,
    encode::{AnimationEncoder, AnimationJob, encoder_for, ensure_parent_dir},
    foundation::error::{RaceError, RaceResult},
    loader::load_csv,
    regions::RegionTable,
    scene::{FrameScene, ScenePlanner},
    transform::{Dataset, transform},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames written by this run, in date order.
    pub frames_written: Vec<PathBuf>,
    /// Distinct dates in the cleaned table.
    pub dates_total: usize,
    /// The animation file, when the encoder produced one.
    pub animation: Option<PathBuf>,
}

/// Load and clean the input table named by `cfg`.
pub fn load_dataset(cfg: &RunConfig) -> RaceResult<(Dataset, RegionTable)> {
    cfg.validate()?;
    let regions = RegionTable::brazil(&cfg.icon_dir, cfg.icon_ext.as_str());
    let table = load_csv(&cfg.input, cfg.delimiter as u8)?;
    let dataset = transform(table, cfg, &regions)?;
    Ok((dataset, regions))
}

pub fn frame_path(frames_dir: &Path, scene: &FrameScene) -> PathBuf {
    frames_dir.join(format!("{}.png", scene.file_stem()))
}

/// Render one PNG per date from `cfg.start_day` on. Stops at the first failing frame; frames
/// already written stay on disk.
pub fn render_frames(
    cfg: &RunConfig,
    dataset: &Dataset,
    regions: RegionTable,
) -> RaceResult<Vec<PathBuf>> {
    std::fs::create_dir_all(&cfg.frames_dir).with_context(|| {
        format!(
            "create frames directory '{}'",
            cfg.frames_dir.display()
        )
    })?;

    let planner = ScenePlanner::new(dataset, cfg)?;
    let mut renderer = FrameRenderer::new(cfg, regions)?;
    let mut written = Vec::with_capacity(planner.remaining());

    for scene in planner {
        let img = renderer.render(&scene)?;
        let path = frame_path(&cfg.frames_dir, &scene);
        save_png(&img, &path)?;
        tracing::info!(
            date = %scene.date,
            growth_ratio = scene.growth_ratio,
            path = %path.display(),
            "rendered frame"
        );
        written.push(path);
    }

    Ok(written)
}

/// Every `*.png` in `dir`, sorted by file name.
pub fn collect_frames(dir: &Path) -> RaceResult<Vec<PathBuf>> {
    let rd = std::fs::read_dir(dir)
        .with_context(|| format!("list frames directory '{}'", dir.display()))?;

    let mut frames = Vec::new();
    for entry in rd {
        let path = entry
            .with_context(|| format!("list frames directory '{}'", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|e| e == "png") {
            frames.push(path);
        }
    }
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

/// Hand every frame in the frames directory to `encoder`.
///
/// Encoder failures are logged and swallowed unless `cfg.strict_encode` is set.
pub fn assemble_animation(
    cfg: &RunConfig,
    encoder: &dyn AnimationEncoder,
) -> RaceResult<Option<PathBuf>> {
    let frames = collect_frames(&cfg.frames_dir)?;
    let job = AnimationJob::from_config(cfg, frames);

    match encoder.encode(&job) {
        Ok(()) if encoder.writes_output() => {
            tracing::info!(
                encoder = encoder.name(),
                frames = job.frames.len(),
                path = %job.out_path.display(),
                "wrote animation"
            );
            Ok(Some(job.out_path))
        }
        Ok(()) => Ok(None),
        Err(e) if !cfg.strict_encode => {
            tracing::warn!(encoder = encoder.name(), error = %e, "animation encoding failed");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub fn run(cfg: &RunConfig) -> RaceResult<RunSummary> {
    let encoder = encoder_for(cfg.encoder);
    run_with_encoder(cfg, encoder.as_ref())
}

pub fn run_with_encoder(
    cfg: &RunConfig,
    encoder: &dyn AnimationEncoder,
) -> RaceResult<RunSummary> {
    let (dataset, regions) = load_dataset(cfg)?;
    let frames_written = render_frames(cfg, &dataset, regions)?;
    let animation = assemble_animation(cfg, encoder)?;

    Ok(RunSummary {
        frames_written,
        dates_total: dataset.dates.len(),
        animation,
    })
}

/// Render only `date`'s frame to `out`. The growth trace still runs through every earlier date
/// from `cfg.start_day`, so the sparkline matches a full run.
pub fn render_single_frame(cfg: &RunConfig, date: NaiveDate, out: &Path) -> RaceResult<()> {
    let (dataset, regions) = load_dataset(cfg)?;

    let Some(index) = dataset.date_index(date) else {
        return Err(RaceError::validation(format!("no data for {date}")));
    };
    if index < cfg.start_day {
        return Err(RaceError::validation(format!(
            "{date} comes before start_day {}",
            cfg.start_day
        )));
    }

    let scene = ScenePlanner::new(&dataset, cfg)?
        .find(|s| s.date == date)
        .ok_or_else(|| RaceError::validation(format!("no data for {date}")))?;

    let mut renderer = FrameRenderer::new(cfg, regions)?;
    let img = renderer.render(&scene)?;
    ensure_parent_dir(out)?;
    save_png(&img, out)?;
    tracing::info!(date = %date, path = %out.display(), "rendered frame");
    Ok(())
}

/// Write the cleaned table as CSV: surviving columns, then the typed fields, the incidence and
/// the assigned color.
pub fn write_table(cfg: &RunConfig, dataset: &Dataset, out: &Path) -> RaceResult<()> {
    ensure_parent_dir(out)?;
    let mut w = csv::WriterBuilder::new()
        .delimiter(cfg.delimiter as u8)
        .from_path(out)
        .with_context(|| format!("create table '{}'", out.display()))?;

    let cols = &cfg.columns;
    let mut header: Vec<&str> = dataset.extra_columns.iter().map(String::as_str).collect();
    header.extend([
        cols.region_code.as_str(),
        cols.date.as_str(),
        cols.cases.as_str(),
        cols.population.as_str(),
        "incidence_per_thousand",
        "color",
    ]);
    w.write_record(&header).context("write table header")?;

    for r in &dataset.records {
        let mut row: Vec<String> = r.extras.clone();
        row.extend([
            r.region.clone(),
            r.date.format("%Y-%m-%d").to_string(),
            r.cases.to_string(),
            r.population.to_string(),
            r.incidence_per_thousand.to_string(),
            r.color.to_hex(),
        ]);
        w.write_record(&row).context("write table row")?;
    }

    w.flush()
        .with_context(|| format!("flush table '{}'", out.display()))?;
    tracing::info!(rows = dataset.records.len(), path = %out.display(), "wrote table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_frames_sorts_by_name_and_skips_other_files() {
        let dir = PathBuf::from("target").join("collect_frames_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["2020-04-02.png", "2020-04-01.png", "covid.gif", "notes.txt"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let frames = collect_frames(&dir).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["2020-04-01.png", "2020-04-02.png"]);
    }

    #[test]
    fn collect_frames_on_missing_dir_fails() {
        assert!(collect_frames(Path::new("target/no_such_frames_dir")).is_err());
    }
}
