use image::{DynamicImage, ImageBuffer, Rgb};
use log::debug;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RawError {
    #[error("Failed to decode RAW file: {0}")]
    DecodeError(String),
    #[error("Unsupported RAW layout: {0}")]
    UnsupportedLayout(String),
}

/// Decode a RAW image file to a DynamicImage
pub fn decode_raw_to_dynamic_image(path: &Path) -> Result<DynamicImage, RawError> {
    debug!("Decoding RAW file: {}", path.display());

    let raw_image =
        rawloader::decode_file(path).map_err(|e| RawError::DecodeError(format!("{:?}", e)))?;

    let (width, height, cpp) = (raw_image.width, raw_image.height, raw_image.cpp);
    let data: Vec<u16> = match raw_image.data {
        rawloader::RawImageData::Integer(data) => data,
        rawloader::RawImageData::Float(data) => {
            data.iter().map(|&f| (f * 65535.0).clamp(0.0, 65535.0) as u16).collect()
        }
    };

    debug!(
        "RAW image decoded: {}x{}, {} component(s) per pixel",
        width, height, cpp
    );

    let levels = Levels {
        black: raw_image.blacklevels[0],
        white: raw_image.whitelevels[0],
    };

    let (out_width, out_height, rgb8_data) = match cpp {
        1 => {
            let (w, h, rgb) = superpixel_demosaic(&data, width, height, &levels, |row, col| {
                raw_image.cfa.color_at(row, col)
            });
            (w, h, rgb)
        }
        3 => (width, height, data.iter().map(|&v| levels.to_u8(v)).collect()),
        other => {
            return Err(RawError::UnsupportedLayout(format!(
                "{} components per pixel",
                other
            )))
        }
    };

    let img_buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(out_width as u32, out_height as u32, rgb8_data).ok_or_else(|| {
            RawError::DecodeError("Buffer conversion failed: invalid dimensions".to_string())
        })?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}

/// Sensor black and white points, used to stretch samples to 8 bits
struct Levels {
    black: u16,
    white: u16,
}

impl Levels {
    fn to_u8(&self, value: u16) -> u8 {
        let range = self.white.saturating_sub(self.black).max(1) as u32;
        let v = value.saturating_sub(self.black) as u32;
        ((v.min(range) * 255) / range) as u8
    }
}

/// Collapses every 2x2 CFA block into one RGB pixel.
///
/// Produces a half-size image, which is plenty for thumbnails and needs no
/// interpolation. `color_at` maps a sensor position to 0 = red, 1 = green,
/// 2 = blue (anything else counts as green).
fn superpixel_demosaic<F>(
    data: &[u16],
    width: usize,
    height: usize,
    levels: &Levels,
    color_at: F,
) -> (usize, usize, Vec<u8>)
where
    F: Fn(usize, usize) -> usize,
{
    let out_width = (width / 2).max(1);
    let out_height = (height / 2).max(1);
    let mut rgb_data = Vec::with_capacity(out_width * out_height * 3);

    for by in 0..out_height {
        for bx in 0..out_width {
            let mut sums = [0u32; 3];
            let mut counts = [0u32; 3];

            for dy in 0..2 {
                for dx in 0..2 {
                    let (row, col) = (by * 2 + dy, bx * 2 + dx);
                    if row >= height || col >= width {
                        continue;
                    }
                    let channel = match color_at(row, col) {
                        0 => 0,
                        2 => 2,
                        _ => 1,
                    };
                    sums[channel] += data[row * width + col] as u32;
                    counts[channel] += 1;
                }
            }

            for channel in 0..3 {
                let value = if counts[channel] > 0 {
                    (sums[channel] / counts[channel]) as u16
                } else {
                    0
                };
                rgb_data.push(levels.to_u8(value));
            }
        }
    }

    (out_width, out_height, rgb_data)
}
