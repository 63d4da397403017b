//! Run configuration.
//!
//! Every field has a default reproducing the historical fixed constants, so an empty JSON object
//! (or no config file at all) describes the classic run: `arquivo_geral.csv` in, `figs/*.png` and
//! `figs/covid.gif` out.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::{
    core::FrameSize,
    error::{RaceError, RaceResult},
};

/// Which animation encoder assembles the frames after rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// ImageMagick `convert`, the historical default.
    #[default]
    Magick,
    /// In-process GIF encoding through the `image` crate.
    Builtin,
    /// Frames only; no animation is produced.
    None,
}

/// Column names of the input file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub scope: String,
    pub sub_region: String,
    pub region_code: String,
    pub date: String,
    pub cases: String,
    pub population: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            scope: "regiao".to_owned(),
            sub_region: "municipio".to_owned(),
            region_code: "estado".to_owned(),
            date: "data".to_owned(),
            cases: "casosAcumulado".to_owned(),
            population: "populacaoTCU2019".to_owned(),
        }
    }
}

/// Fixed text drawn on every frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub title: String,
    pub growth: String,
    pub attribution: String,
    pub font_family: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            title: "COVID-19: casos por mil habitantes".to_owned(),
            growth: "Taxa de crescimento".to_owned(),
            attribution: "por Daniel Marostica".to_owned(),
            font_family: "serif".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input: PathBuf,
    pub delimiter: char,
    pub columns: ColumnNames,
    /// Scope value marking the nationwide aggregate rows.
    pub national_scope: String,
    /// Columns dropped after the derived column is computed.
    pub pruned_columns: Vec<String>,

    pub icon_dir: PathBuf,
    pub icon_ext: String,
    pub fonts_dir: Option<PathBuf>,

    pub frames_dir: PathBuf,
    pub animation_out: PathBuf,

    /// Index into the ascending date list where rendering starts.
    pub start_day: usize,
    pub top_n: usize,
    pub trace_len: usize,
    /// Number of most recent trace values averaged to center the inset.
    pub trace_window: usize,
    /// Fractional half-height of the inset's vertical range around the trace mean.
    pub inset_zoom: f64,
    /// Bars are scaled against `x_headroom * max incidence`.
    pub x_headroom: f64,

    pub frame_size: FrameSize,
    pub labels: Labels,

    pub encoder: EncoderKind,
    /// Inter-frame delay, in hundredths of a second.
    pub frame_delay_cs: u32,
    /// Delay of the repeated last frame, in hundredths of a second.
    pub final_delay_cs: u32,
    pub loop_forever: bool,
    /// Turn encoder failures into run failures instead of warnings.
    pub strict_encode: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("arquivo_geral.csv"),
            delimiter: ',',
            columns: ColumnNames::default(),
            national_scope: "Brasil".to_owned(),
            pruned_columns: [
                "municipio",
                "coduf",
                "codmun",
                "codRegiaoSaude",
                "semanaEpi",
                "casosNovos",
                "obitosNovos",
                "emAcompanhamentoNovos",
                "nomeRegiaoSaude",
                "interior/metropolitana",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            icon_dir: PathBuf::from("estados"),
            icon_ext: "png".to_owned(),
            fonts_dir: None,
            frames_dir: PathBuf::from("figs"),
            animation_out: PathBuf::from("figs").join("covid.gif"),
            start_day: 0,
            top_n: 27,
            trace_len: 40,
            trace_window: 20,
            inset_zoom: 0.25,
            x_headroom: 1.15,
            frame_size: FrameSize {
                width: 694,
                height: 694,
            },
            labels: Labels::default(),
            encoder: EncoderKind::Magick,
            frame_delay_cs: 14,
            final_delay_cs: 700,
            loop_forever: true,
            strict_encode: false,
        }
    }
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> RaceResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config JSON '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> RaceResult<()> {
        self.frame_size.validate()?;
        if !self.delimiter.is_ascii() {
            return Err(RaceError::config("delimiter must be a single ASCII character"));
        }
        if self.top_n == 0 {
            return Err(RaceError::config("top_n must be > 0"));
        }
        if self.trace_len == 0 {
            return Err(RaceError::config("trace_len must be > 0"));
        }
        if self.trace_window == 0 || self.trace_window > self.trace_len {
            return Err(RaceError::config(format!(
                "trace_window must be in 1..={} (got {})",
                self.trace_len, self.trace_window
            )));
        }
        if !self.inset_zoom.is_finite() || self.inset_zoom < 0.0 {
            return Err(RaceError::config("inset_zoom must be finite and >= 0"));
        }
        if !self.x_headroom.is_finite() || self.x_headroom < 1.0 {
            return Err(RaceError::config("x_headroom must be finite and >= 1"));
        }
        if self.icon_ext.trim().is_empty() {
            return Err(RaceError::config("icon_ext must be non-empty"));
        }
        Ok(())
    }
}
