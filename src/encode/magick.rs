use std::{
    ffi::OsString,
    process::{Command, Stdio},
};

use crate::{
    encode::{AnimationEncoder, AnimationJob, ensure_parent_dir},
    foundation::error::{RaceError, RaceResult},
};

/// Runs ImageMagick's `convert` once over the whole frame list.
///
/// The command line is `convert -delay D -loop L <frames…> -delay F <last> <out>`; the program is
/// spawned directly, without a shell.
#[derive(Clone, Debug)]
pub struct ImageMagickEncoder {
    pub program: String,
}

impl Default for ImageMagickEncoder {
    fn default() -> Self {
        Self {
            program: "convert".to_owned(),
        }
    }
}

impl ImageMagickEncoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    pub fn command_args(job: &AnimationJob) -> RaceResult<Vec<OsString>> {
        let last = job.last_frame()?;
        // ImageMagick: 0 loops forever, N plays N times in total; 1 writes no loop extension.
        let loops = if job.loop_forever { "0" } else { "1" };

        let mut args: Vec<OsString> = vec![
            "-delay".into(),
            job.frame_delay_cs.to_string().into(),
            "-loop".into(),
            loops.into(),
        ];
        args.extend(job.frames.iter().map(|p| p.as_os_str().to_owned()));
        args.push("-delay".into());
        args.push(job.final_delay_cs.to_string().into());
        args.push(last.as_os_str().to_owned());
        args.push(job.out_path.as_os_str().to_owned());
        Ok(args)
    }
}

impl AnimationEncoder for ImageMagickEncoder {
    fn name(&self) -> &'static str {
        "magick"
    }

    fn encode(&self, job: &AnimationJob) -> RaceResult<()> {
        job.validate()?;
        ensure_parent_dir(&job.out_path)?;
        let args = Self::command_args(job)?;

        tracing::debug!(program = %self.program, frames = job.frames.len(), "spawning encoder");
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                RaceError::encode(format!(
                    "failed to spawn {} (is ImageMagick installed and on PATH?): {e}",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RaceError::encode(format!(
                "{} exited with status {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
