use std::io::Cursor;

use anyhow::{Context, Result};
use il_core::ports::ImageDecoderPort;
use il_core::{Bitmap, Dimensions};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};

/// Decoder backed by the `image` crate (PNG, JPEG, WebP, GIF).
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoderPort for ImageCrateDecoder {
    fn probe_bounds(&self, bytes: &[u8]) -> Result<Option<Dimensions>> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .context("guess image format")?;
        if reader.format().is_none() {
            return Ok(None);
        }
        // A truncated header is "not yet known", not a failure.
        Ok(reader
            .into_dimensions()
            .ok()
            .map(|(width, height)| Dimensions::new(width, height)))
    }

    fn decode(&self, bytes: &[u8], sample_size: u32) -> Result<Bitmap> {
        let decoded = image::load_from_memory(bytes).context("decode image bytes")?;
        let sample_size = sample_size.max(1);

        let sampled = if sample_size == 1 {
            decoded
        } else {
            let width = (decoded.width() / sample_size).max(1);
            let height = (decoded.height() / sample_size).max(1);
            decoded.resize_exact(width, height, FilterType::Triangle)
        };

        into_bitmap(sampled)
    }

    fn correct_orientation(&self, bitmap: Bitmap, metadata: &[u8]) -> Result<Bitmap> {
        let orientation = match read_orientation(metadata) {
            Ok(orientation) => orientation,
            Err(err) => {
                tracing::debug!(error = %err, "No orientation metadata, keeping bitmap as is");
                return Ok(bitmap);
            }
        };
        if orientation == Orientation::NoTransforms {
            return Ok(bitmap);
        }

        let pixels = bitmap
            .pixels()
            .context("bitmap was released before orientation")?
            .to_vec();
        let rgba = RgbaImage::from_raw(bitmap.width(), bitmap.height(), pixels)
            .context("bitmap buffer does not match its dimensions")?;

        let mut image = DynamicImage::ImageRgba8(rgba);
        image.apply_orientation(orientation);
        let rotated = into_bitmap(image)?;

        tracing::debug!(?orientation, "Applied orientation from metadata");
        bitmap.release();
        Ok(rotated)
    }
}

fn read_orientation(bytes: &[u8]) -> Result<Orientation> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess image format")?
        .into_decoder()
        .context("open image decoder")?;
    decoder.orientation().context("read orientation")
}

fn into_bitmap(image: DynamicImage) -> Result<Bitmap> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Bitmap::from_rgba(width, height, rgba.into_raw())
        .context("decoded buffer does not match its dimensions")
}
