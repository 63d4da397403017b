//! Fixed per-region presentation table: bar color and icon path for each region code.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::foundation::{
    core::Rgb8,
    error::{RaceError, RaceResult},
};

/// The 27 federative units and their bar colors.
const DEFAULT_COLORS: [(&str, Rgb8); 27] = [
    ("RO", Rgb8::new(0x00, 0x64, 0x00)),
    ("AC", Rgb8::new(0x00, 0x80, 0x00)),
    ("AM", Rgb8::new(0x22, 0x8B, 0x22)),
    ("RR", Rgb8::new(0x32, 0xCD, 0x32)),
    ("PA", Rgb8::new(0x7F, 0xFF, 0x00)),
    ("AP", Rgb8::new(0x7C, 0xFC, 0x00)),
    ("TO", Rgb8::new(0x00, 0xFF, 0x00)),
    ("MA", Rgb8::new(0x99, 0x99, 0x00)),
    ("PI", Rgb8::new(0x66, 0x66, 0x00)),
    ("CE", Rgb8::new(0x99, 0x99, 0x00)),
    ("RN", Rgb8::new(0xCC, 0xCC, 0x00)),
    ("PB", Rgb8::new(0xFF, 0xFF, 0x00)),
    ("PE", Rgb8::new(0xFF, 0xFF, 0x33)),
    ("AL", Rgb8::new(0xFF, 0xFF, 0x66)),
    ("SE", Rgb8::new(0xFF, 0xFF, 0x33)),
    ("BA", Rgb8::new(0xCC, 0xCC, 0x00)),
    ("MG", Rgb8::new(0xFF, 0x00, 0x00)),
    ("ES", Rgb8::new(0x8B, 0x00, 0x00)),
    ("RJ", Rgb8::new(0xB2, 0x22, 0x22)),
    ("SP", Rgb8::new(0xDC, 0x14, 0x3C)),
    ("PR", Rgb8::new(0x00, 0x00, 0x8B)),
    ("SC", Rgb8::new(0x00, 0x00, 0xCD)),
    ("RS", Rgb8::new(0x41, 0x69, 0xE1)),
    ("MS", Rgb8::new(0x69, 0x69, 0x69)),
    ("MT", Rgb8::new(0x80, 0x80, 0x80)),
    ("GO", Rgb8::new(0xA9, 0xA9, 0xA9)),
    ("DF", Rgb8::new(0xC0, 0xC0, 0xC0)),
];

#[derive(Clone, Debug)]
pub struct RegionTable {
    colors: BTreeMap<String, Rgb8>,
    icon_dir: PathBuf,
    icon_ext: String,
}

impl RegionTable {
    pub fn new(
        colors: impl IntoIterator<Item = (String, Rgb8)>,
        icon_dir: impl Into<PathBuf>,
        icon_ext: impl Into<String>,
    ) -> Self {
        Self {
            colors: colors.into_iter().collect(),
            icon_dir: icon_dir.into(),
            icon_ext: icon_ext.into(),
        }
    }

    /// The standard 27-region table with icons under `icon_dir`.
    pub fn brazil(icon_dir: impl Into<PathBuf>, icon_ext: impl Into<String>) -> Self {
        Self::new(
            DEFAULT_COLORS
                .iter()
                .map(|(code, color)| ((*code).to_owned(), *color)),
            icon_dir,
            icon_ext,
        )
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.colors.contains_key(code)
    }

    pub fn color(&self, code: &str) -> RaceResult<Rgb8> {
        self.colors.get(code).copied().ok_or_else(|| {
            RaceError::config(format!("region code '{code}' has no assigned color"))
        })
    }

    /// `<icon_dir>/<CODE_UPPERCASE>.<ext>`
    pub fn icon_path(&self, code: &str) -> PathBuf {
        self.icon_dir
            .join(format!("{}.{}", code.to_uppercase(), self.icon_ext))
    }

    pub fn icon_dir(&self) -> &Path {
        &self.icon_dir
    }

    /// Fails if any code has no color; the error lists every unknown code.
    pub fn validate_codes<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> RaceResult<()> {
        let mut unknown: Vec<&str> = codes.into_iter().filter(|c| !self.contains(c)).collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        unknown.dedup();
        Err(RaceError::config(format!(
            "region codes missing from the color table: {}",
            unknown.join(", ")
        )))
    }
}
