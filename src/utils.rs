use env_logger::{Builder, Env};
use image::{DynamicImage, ImageError, ImageReader, ImageResult};
use log::LevelFilter;
use std::path::Path;
use std::time::Duration;

/// Initialize the global logger
///
/// Filters come from `RUST_LOG` (default `info`); `verbose` raises the
/// default level to `debug`.
pub fn init_logger(verbose: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }

    // A second init (tests, embedding) is not an error worth surfacing
    let _ = builder.try_init();
}

/// Decode an image, picking the format from its contents
///
/// The extension is only a fallback, so a PNG saved as `.jpg` or without an
/// extension still loads.
pub fn open_image(path: &Path) -> ImageResult<DynamicImage> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::IoError)?
        .decode()
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_millis(2250)), "2.250s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_duration(Duration::from_secs(3 * 60 + 59)), "3m 59s");
    }

    #[test]
    fn test_open_image_sniffs_contents() {
        let dir = std::env::temp_dir().join(format!("i2v-gif-utils-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let png = dir.join("source.png");
        image::RgbImage::from_pixel(5, 3, image::Rgb([10, 20, 30]))
            .save(&png)
            .unwrap();
        let misnamed = dir.join("cat.jpg");
        let bare = dir.join("cat");
        std::fs::copy(&png, &misnamed).unwrap();
        std::fs::copy(&png, &bare).unwrap();

        for path in [&misnamed, &bare] {
            let img = open_image(path).unwrap().to_rgb8();
            assert_eq!(img.dimensions(), (5, 3));
            assert_eq!(img.get_pixel(4, 2), &image::Rgb([10, 20, 30]));
        }

        let err = open_image(&dir.join("missing.png")).unwrap_err();
        assert!(matches!(err, ImageError::IoError(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger(false);
        init_logger(true);
    }
}
