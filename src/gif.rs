use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// NeuQuant sampling factor; 1 is the slowest and finest, 30 the fastest
pub const GIF_ENCODER_SPEED: i32 = 10;

/// Encode `frames` as an endlessly looping animated GIF at `path`
///
/// An existing file at `path` is truncated. The parent directory must exist.
pub fn export_to_gif(frames: &[RgbImage], path: &Path, frame_delay: Duration) -> Result<()> {
    if frames.is_empty() {
        return Err(Error::EmptyOutput);
    }

    log::debug!(
        "Encoding {} frames ({}x{}) to {}",
        frames.len(),
        frames[0].width(),
        frames[0].height(),
        path.display()
    );

    let file = File::create(path).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let encode_error = |source| Error::Encode {
        path: path.to_path_buf(),
        source,
    };

    {
        // The trailer is written when the encoder drops
        let mut encoder = GifEncoder::new_with_speed(&mut writer, GIF_ENCODER_SPEED);
        encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;

        let delay = Delay::from_saturating_duration(frame_delay);
        let gif_frames = frames.iter().map(|frame| {
            let rgba = DynamicImage::ImageRgb8(frame.clone()).into_rgba8();
            Frame::from_parts(rgba, 0, 0, delay)
        });
        encoder.encode_frames(gif_frames).map_err(encode_error)?;
    }

    writer.flush().map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
