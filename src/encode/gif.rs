use std::{fs::File, io::BufWriter, path::Path};

use anyhow::Context as _;
use image::{
    Delay, Frame, RgbaImage,
    codecs::gif::{GifEncoder, Repeat},
};

use crate::{
    encode::{AnimationEncoder, AnimationJob, ensure_parent_dir},
    foundation::error::{RaceError, RaceResult},
};

/// Encodes the GIF in process. Slower than ImageMagick but needs no external binary.
#[derive(Clone, Debug)]
pub struct GifEncoderBackend {
    /// NeuQuant speed, 1 (best) ..= 30 (fastest).
    pub speed: i32,
}

impl Default for GifEncoderBackend {
    fn default() -> Self {
        Self { speed: 10 }
    }
}

fn centis(cs: u32) -> Delay {
    Delay::from_numer_denom_ms(cs.saturating_mul(10), 1)
}

fn load_frame(path: &Path) -> RaceResult<RgbaImage> {
    let img = image::open(path).with_context(|| format!("read frame '{}'", path.display()))?;
    Ok(img.to_rgba8())
}

impl AnimationEncoder for GifEncoderBackend {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn encode(&self, job: &AnimationJob) -> RaceResult<()> {
        job.validate()?;
        ensure_parent_dir(&job.out_path)?;

        let f = File::create(&job.out_path)
            .with_context(|| format!("create animation '{}'", job.out_path.display()))?;
        let mut enc = GifEncoder::new_with_speed(BufWriter::new(f), self.speed.clamp(1, 30));
        let repeat = if job.loop_forever {
            Repeat::Infinite
        } else {
            Repeat::Finite(0)
        };
        enc.set_repeat(repeat)
            .map_err(|e| RaceError::encode(format!("set gif repeat: {e}")))?;

        let mut size = None;
        let last = job.last_frame()?;
        let delays = job
            .frames
            .iter()
            .map(|p| (p.as_path(), job.frame_delay_cs))
            .chain(std::iter::once((last, job.final_delay_cs)));

        for (path, delay_cs) in delays {
            let img = load_frame(path)?;
            match size {
                None => size = Some(img.dimensions()),
                Some(dim) if dim != img.dimensions() => {
                    return Err(RaceError::encode(format!(
                        "frame '{}' is {}x{}, expected {}x{}",
                        path.display(),
                        img.width(),
                        img.height(),
                        dim.0,
                        dim.1
                    )));
                }
                Some(_) => {}
            }
            enc.encode_frame(Frame::from_parts(img, 0, 0, centis(delay_cs)))
                .map_err(|e| RaceError::encode(format!("encode '{}': {e}", path.display())))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn write_frame(dir: &Path, name: &str, rgba: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(8, 8, image::Rgba(rgba))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn encodes_frames_plus_repeated_last_frame() {
        let dir = PathBuf::from("target").join("gif_backend_test");
        std::fs::create_dir_all(&dir).unwrap();
        let frames = vec![
            write_frame(&dir, "a.png", [255, 0, 0, 255]),
            write_frame(&dir, "b.png", [0, 0, 255, 255]),
        ];
        let out = dir.join("out.gif");
        let _ = std::fs::remove_file(&out);

        let job = AnimationJob {
            frames,
            frame_delay_cs: 14,
            final_delay_cs: 700,
            loop_forever: true,
            out_path: out.clone(),
        };
        GifEncoderBackend::default().encode(&job).unwrap();

        use image::AnimationDecoder as _;
        let decoder =
            image::codecs::gif::GifDecoder::new(std::io::BufReader::new(File::open(&out).unwrap()))
                .unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 3);
        let delay = |i: usize| std::time::Duration::from(frames[i].delay());
        assert_eq!(delay(0), std::time::Duration::from_millis(140));
        assert_eq!(delay(1), std::time::Duration::from_millis(140));
        assert_eq!(delay(2), std::time::Duration::from_millis(7000));
    }

    #[test]
    fn mismatched_frame_sizes_fail() {
        let dir = PathBuf::from("target").join("gif_backend_mismatch");
        std::fs::create_dir_all(&dir).unwrap();
        let a = write_frame(&dir, "a.png", [0, 0, 0, 255]);
        let b = dir.join("b.png");
        RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .save_with_format(&b, image::ImageFormat::Png)
            .unwrap();

        let job = AnimationJob {
            frames: vec![a, b],
            frame_delay_cs: 14,
            final_delay_cs: 700,
            loop_forever: true,
            out_path: dir.join("out.gif"),
        };
        assert!(GifEncoderBackend::default().encode(&job).is_err());
    }

    #[test]
    fn loop_extension_only_when_looping_forever() {
        let dir = PathBuf::from("target").join("gif_backend_loop");
        std::fs::create_dir_all(&dir).unwrap();
        let frames = vec![
            write_frame(&dir, "a.png", [255, 0, 0, 255]),
            write_frame(&dir, "b.png", [0, 255, 0, 255]),
        ];

        let has_loop_block = |loop_forever: bool| {
            let out = dir.join(format!("loop_{loop_forever}.gif"));
            let job = AnimationJob {
                frames: frames.clone(),
                frame_delay_cs: 14,
                final_delay_cs: 700,
                loop_forever,
                out_path: out.clone(),
            };
            GifEncoderBackend::default().encode(&job).unwrap();
            let bytes = std::fs::read(&out).unwrap();
            bytes.windows(11).any(|w| w == b"NETSCAPE2.0")
        };

        assert!(has_loop_block(true));
        // played once, same as `convert -loop 1`
        assert!(!has_loop_block(false));
    }
}

