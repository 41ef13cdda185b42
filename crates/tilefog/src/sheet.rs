//! Autotile sheet loading.
//!
//! Both fog layers are drawn from one autotile image: a 3 × 4 block of
//! 32-pixel tiles (96 × 128 px) that the renderer expands into the 48
//! sub-tiles addressed by [`SpriteIndex`]. Each layer keeps its own copy of
//! the sheet with that layer's opacity baked into the alpha channel.
//!
//! [`SpriteIndex`]: crate::autotile::SpriteIndex

use std::fmt;
use std::path::Path;

use image::RgbaImage;

/// Required sheet width in pixels.
pub const SHEET_WIDTH: u32 = 96;
/// Required sheet height in pixels.
pub const SHEET_HEIGHT: u32 = 128;

/// Error type for sheet loading.
#[derive(Debug)]
pub enum SheetError {
    /// The image data could not be decoded.
    Decode(image::ImageError),
    /// The image is not 96 × 128 pixels.
    Dimensions { width: u32, height: u32 },
    /// The sheet file could not be read.
    Io(std::io::Error),
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::Decode(e) => write!(f, "cannot decode autotile sheet: {e}"),
            SheetError::Dimensions { width, height } => write!(
                f,
                "autotile sheet is {width}x{height}, expected {SHEET_WIDTH}x{SHEET_HEIGHT}"
            ),
            SheetError::Io(e) => write!(f, "cannot read autotile sheet: {e}"),
        }
    }
}

impl std::error::Error for SheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetError::Decode(e) => Some(e),
            SheetError::Io(e) => Some(e),
            SheetError::Dimensions { .. } => None,
        }
    }
}

impl From<image::ImageError> for SheetError {
    fn from(e: image::ImageError) -> Self {
        SheetError::Decode(e)
    }
}

impl From<std::io::Error> for SheetError {
    fn from(e: std::io::Error) -> Self {
        SheetError::Io(e)
    }
}

/// A validated autotile image, optionally faded to a layer opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct AutotileSheet {
    image: RgbaImage,
    opacity: u8,
}

impl AutotileSheet {
    /// Wrap an already decoded image at full opacity.
    pub fn from_image(image: RgbaImage) -> Result<Self, SheetError> {
        let (width, height) = image.dimensions();
        if (width, height) != (SHEET_WIDTH, SHEET_HEIGHT) {
            return Err(SheetError::Dimensions { width, height });
        }
        Ok(Self { image, opacity: 255 })
    }

    /// Decode an encoded image (PNG) at full opacity.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SheetError> {
        let image = image::load_from_memory(data)?.to_rgba8();
        Self::from_image(image)
    }

    /// Read and decode a sheet file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// A copy with every pixel's alpha scaled by `opacity / 255`.
    ///
    /// Opacities compound: fading an already faded sheet fades it further.
    pub fn with_opacity(&self, opacity: u8) -> Self {
        let mut image = self.image.clone();
        for px in image.pixels_mut() {
            px.0[3] = scale_alpha(px.0[3], opacity);
        }
        Self {
            image,
            opacity: scale_alpha(self.opacity, opacity),
        }
    }

    /// The pixel data.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// The opacity baked into this copy.
    pub fn opacity(&self) -> u8 {
        self.opacity
    }
}

/// `a * opacity / 255`, rounded to nearest.
fn scale_alpha(a: u8, opacity: u8) -> u8 {
    ((a as u16 * opacity as u16 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(width: u32, height: u32, px: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, px);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_valid_sheet() {
        let data = png(SHEET_WIDTH, SHEET_HEIGHT, Rgba([10, 20, 30, 255]));
        let sheet = AutotileSheet::from_bytes(&data).unwrap();
        assert_eq!(sheet.image().dimensions(), (96, 128));
        assert_eq!(sheet.opacity(), 255);
        assert_eq!(sheet.image().get_pixel(5, 7), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn rejects_wrong_size() {
        let data = png(32, 32, Rgba([0, 0, 0, 255]));
        match AutotileSheet::from_bytes(&data) {
            Err(SheetError::Dimensions { width, height }) => assert_eq!((width, height), (32, 32)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_garbage() {
        let err = AutotileSheet::from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, SheetError::Decode(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AutotileSheet::open("/nonexistent/fow_default.png").unwrap_err();
        assert!(matches!(err, SheetError::Io(_)));
        assert!(err.to_string().starts_with("cannot read autotile sheet"));
    }

    #[test]
    fn opacity_scales_alpha() {
        let mut img = RgbaImage::from_pixel(SHEET_WIDTH, SHEET_HEIGHT, Rgba([1, 2, 3, 255]));
        img.put_pixel(0, 0, Rgba([1, 2, 3, 128]));
        img.put_pixel(1, 0, Rgba([1, 2, 3, 0]));
        let sheet = AutotileSheet::from_image(img).unwrap();

        let faded = sheet.with_opacity(100);
        assert_eq!(faded.opacity(), 100);
        assert_eq!(faded.image().get_pixel(2, 2), &Rgba([1, 2, 3, 100]));
        assert_eq!(faded.image().get_pixel(0, 0).0[3], 50);
        assert_eq!(faded.image().get_pixel(1, 0).0[3], 0);

        assert_eq!(sheet.with_opacity(255), sheet);
    }
}
