//! Animation encoders.
//!
//! After all frames are on disk, an [`AnimationEncoder`] assembles them into one looping
//! animation. The last frame is shown a second time with a longer delay so the animation rests on
//! the final date.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    config::{EncoderKind, RunConfig},
    foundation::error::{RaceError, RaceResult},
};

/// GIF output through `image`'s encoder.
pub mod gif;
/// GIF output through ImageMagick `convert`.
pub mod magick;

pub use gif::GifEncoderBackend;
pub use magick::ImageMagickEncoder;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationJob {
    /// Frame images in display order.
    pub frames: Vec<PathBuf>,
    /// Delay after each frame, in hundredths of a second.
    pub frame_delay_cs: u32,
    /// Delay of the repeated last frame, in hundredths of a second.
    pub final_delay_cs: u32,
    pub loop_forever: bool,
    pub out_path: PathBuf,
}

impl AnimationJob {
    pub fn from_config(cfg: &RunConfig, frames: Vec<PathBuf>) -> Self {
        Self {
            frames,
            frame_delay_cs: cfg.frame_delay_cs,
            final_delay_cs: cfg.final_delay_cs,
            loop_forever: cfg.loop_forever,
            out_path: cfg.animation_out.clone(),
        }
    }

    pub fn validate(&self) -> RaceResult<()> {
        if self.frames.is_empty() {
            return Err(RaceError::encode("animation needs at least one frame"));
        }
        if self.out_path.as_os_str().is_empty() {
            return Err(RaceError::encode("animation output path must be non-empty"));
        }
        Ok(())
    }

    pub fn last_frame(&self) -> RaceResult<&Path> {
        self.frames
            .last()
            .map(PathBuf::as_path)
            .ok_or_else(|| RaceError::encode("animation needs at least one frame"))
    }
}

/// Assembles rendered frames into an animation file.
pub trait AnimationEncoder {
    fn name(&self) -> &'static str;

    /// Whether a successful [`encode`](Self::encode) leaves a file at `job.out_path`.
    fn writes_output(&self) -> bool {
        true
    }

    fn encode(&self, job: &AnimationJob) -> RaceResult<()>;
}

/// Skips encoding; frames stay on disk as the only output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEncoder;

impl AnimationEncoder for NullEncoder {
    fn name(&self) -> &'static str {
        "none"
    }

    fn writes_output(&self) -> bool {
        false
    }

    fn encode(&self, _job: &AnimationJob) -> RaceResult<()> {
        Ok(())
    }
}

pub fn encoder_for(kind: EncoderKind) -> Box<dyn AnimationEncoder> {
    match kind {
        EncoderKind::Magick => Box::new(ImageMagickEncoder::default()),
        EncoderKind::Builtin => Box::new(GifEncoderBackend::default()),
        EncoderKind::None => Box::new(NullEncoder),
    }
}

pub fn ensure_parent_dir(path: &Path) -> RaceResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}
