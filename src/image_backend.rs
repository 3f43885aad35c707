//! Pixel rendering on top of the `image` crate, with `imageproc` for shapes
//! and text.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use exif::{In, Reader, Tag, Value};
use image::buffer::ConvertBuffer;
use image::{imageops, DynamicImage, ImageFormat, Pixel, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size, Blend,
};
use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::file_classifier::{self, ImageKind};
use crate::layout::{Point, Rect, TextExtent};
use crate::raw_processor;
use crate::sheet_renderer::{RectStyle, RenderBackend, RenderError};

pub const DEFAULT_FONT_SIZE: f32 = 14.0;

const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Font files tried after any user-supplied ones, in order
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Ordered font preference list: the given paths first, then the defaults
pub fn font_candidates(preferred: &[PathBuf]) -> Vec<PathBuf> {
    preferred
        .iter()
        .cloned()
        .chain(DEFAULT_FONT_PATHS.iter().map(PathBuf::from))
        .collect()
}

/// Loads the first font in `candidates` that parses
pub fn load_first_font(candidates: &[PathBuf]) -> Option<(PathBuf, FontVec)> {
    candidates.iter().find_map(|path| {
        let bytes = std::fs::read(path).ok()?;
        match FontVec::try_from_vec(bytes) {
            Ok(font) => Some((path.clone(), font)),
            Err(e) => {
                debug!("Not a usable font file {}: {}", path.display(), e);
                None
            }
        }
    })
}

/// `RenderBackend` drawing into an in-memory RGBA canvas
pub struct ImageBackend {
    font: Option<FontVec>,
    scale: PxScale,
}

impl ImageBackend {
    pub fn new(font: Option<FontVec>, font_size: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(font_size),
        }
    }

    /// Resolves the first loadable font from the preference list
    pub fn from_font_candidates(candidates: &[PathBuf], font_size: f32) -> Self {
        match load_first_font(candidates) {
            Some((path, font)) => {
                info!("Using caption font: {}", path.display());
                Self::new(Some(font), font_size)
            }
            None => {
                warn!("No usable font found, index sheets will have no captions");
                Self::new(None, font_size)
            }
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, RenderError> {
        match file_classifier::classify(path) {
            Some(ImageKind::Raw) => Ok(raw_processor::decode_raw_to_dynamic_image(path)?),
            _ => {
                let img = image::open(path).map_err(|e| RenderError::Load {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
                Ok(apply_orientation(img, read_orientation(path)))
            }
        }
    }
}

impl RenderBackend for ImageBackend {
    type Canvas = RgbaImage;
    type Thumbnail = RgbaImage;

    fn new_canvas(&self, width: u32, height: u32, background: Rgb<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, background.to_rgba())
    }

    fn load_thumbnail(
        &self,
        path: &Path,
        max_width: u32,
        max_height: u32,
    ) -> Result<RgbaImage, RenderError> {
        let img = self.decode(path)?;
        Ok(img.thumbnail(max_width, max_height).to_rgba8())
    }

    fn composite(
        &self,
        canvas: &mut RgbaImage,
        thumbnail: &RgbaImage,
        x: i64,
        y: i64,
    ) -> Result<(), RenderError> {
        imageops::overlay(canvas, thumbnail, x, y);
        Ok(())
    }

    fn draw_rect(&self, canvas: &mut RgbaImage, rect: Rect, style: RectStyle) {
        let Some(rect) = to_imageproc_rect(rect) else {
            return;
        };

        if let Some(fill) = style.fill {
            // Blend needs to own the buffer; the empty stand-in never allocates
            let mut blended = Blend(std::mem::replace(canvas, RgbaImage::new(0, 0)));
            draw_filled_rect_mut(&mut blended, rect, fill);
            *canvas = blended.0;
        }
        if let Some(stroke) = style.stroke {
            draw_hollow_rect_mut(canvas, rect, stroke);
        }
    }

    fn measure_text(&self, text: &str) -> TextExtent {
        let Some(font) = &self.font else {
            return TextExtent::default();
        };
        let (width, _) = text_size(self.scale, font, text);
        let scaled = font.as_scaled(self.scale);

        TextExtent {
            width,
            height: (scaled.ascent() - scaled.descent()).ceil() as u32,
        }
    }

    fn draw_text(&self, canvas: &mut RgbaImage, anchor: Point, text: &str) {
        let Some(font) = &self.font else {
            return;
        };

        let (width, _) = text_size(self.scale, font, text);
        let ascent = font.as_scaled(self.scale).ascent();
        // draw_text_mut takes the top of the line, the anchor is the baseline
        let left = anchor.x - (width / 2) as i64;
        let top = anchor.y - ascent.round() as i64;

        draw_text_mut(
            canvas,
            TEXT_COLOR,
            clamp_i32(left),
            clamp_i32(top),
            self.scale,
            font,
            text,
        );
    }

    fn save(&self, canvas: &RgbaImage, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
        // JPEG has no alpha channel
        let rgb: RgbImage = canvas.convert();
        rgb.save_with_format(path, format)
            .map_err(|e| RenderError::Save {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// `None` for empty rectangles, which imageproc cannot represent
fn to_imageproc_rect(rect: Rect) -> Option<imageproc::rect::Rect> {
    if rect.width == 0 || rect.height == 0 {
        return None;
    }
    Some(
        imageproc::rect::Rect::at(clamp_i32(rect.x), clamp_i32(rect.y))
            .of_size(rect.width, rect.height),
    )
}

/// EXIF orientation tag, if the file carries one
fn read_orientation(path: &Path) -> Option<u32> {
    let file = File::open(path).ok()?;
    let exif = Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;

    match field.value {
        Value::Short(ref v) if !v.is_empty() => Some(v[0] as u32),
        _ => None,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Option<u32>) -> DynamicImage {
    match orientation {
        Some(2) => img.fliph(),
        Some(3) => img.rotate180(),
        Some(4) => img.flipv(),
        Some(5) => img.fliph().rotate270(),
        Some(6) => img.rotate90(),
        Some(7) => img.fliph().rotate90(),
        Some(8) => img.rotate270(),
        _ => img,
    }
}
