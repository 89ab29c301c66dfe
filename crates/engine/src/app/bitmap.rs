use std::fmt;
use std::path::Path;
use std::rc::Rc;

use image::{Rgba, RgbaImage};

pub const DEFAULT_IMAGE_SIZE: u32 = 16;

/// Palette index. 0 is transparent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u8);

impl Color {
    pub const TRANSPARENT: Self = Self(0);
    pub const WHITE: Self = Self(1);
    pub const RED: Self = Self(2);
    pub const PINK: Self = Self(3);
    pub const ORANGE: Self = Self(4);
    pub const YELLOW: Self = Self(5);
    pub const TEAL: Self = Self(6);
    pub const GREEN: Self = Self(7);
    pub const BLUE: Self = Self(8);
    pub const LIGHT_BLUE: Self = Self(9);
    pub const PURPLE: Self = Self(10);
    pub const BLACK: Self = Self(15);

    pub fn rgba(self) -> Rgba<u8> {
        let [r, g, b] = PALETTE[(self.0 & 0x0f) as usize];
        let alpha = if self == Self::TRANSPARENT { 0 } else { 255 };
        Rgba([r, g, b, alpha])
    }
}

const PALETTE: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00],
    [0xff, 0xff, 0xff],
    [0xff, 0x21, 0x21],
    [0xff, 0x93, 0xc4],
    [0xff, 0x81, 0x35],
    [0xff, 0xf6, 0x09],
    [0x24, 0x9c, 0xa3],
    [0x78, 0xdc, 0x52],
    [0x00, 0x3f, 0xad],
    [0x87, 0xf2, 0xff],
    [0x8e, 0x2e, 0xc4],
    [0xa4, 0x83, 0x9f],
    [0x5c, 0x40, 0x6c],
    [0xe5, 0xcd, 0xc4],
    [0x91, 0x46, 0x3d],
    [0x00, 0x00, 0x00],
];

/// Shared, immutable pixel buffer used for sprite frames and overlays.
///
/// Cloning is cheap: clones share the same buffer.
#[derive(Clone)]
pub struct Image {
    pixels: Rc<RgbaImage>,
}

impl Image {
    pub fn blank(width: u32, height: u32) -> Self {
        Self::from_rgba(RgbaImage::new(width, height))
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self::from_rgba(RgbaImage::from_pixel(width, height, color.rgba()))
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels: Rc::new(pixels),
        }
    }

    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        let decoded = image::open(path)?;
        Ok(Self::from_rgba(decoded.into_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Owned copy of the pixels for drawing.
    pub fn to_rgba(&self) -> RgbaImage {
        self.pixels.as_ref().clone()
    }

    pub fn same_buffer(&self, other: &Image) -> bool {
        Rc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::blank(DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE)
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.same_buffer(other)
            || (self.pixels.dimensions() == other.pixels.dimensions()
                && self.pixels.as_raw() == other.pixels.as_raw())
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image({}x{})", self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_buffer() {
        let image = Image::filled(4, 4, Color::RED);
        let clone = image.clone();
        assert!(image.same_buffer(&clone));
        assert_eq!(image, clone);
    }

    #[test]
    fn equal_pixels_compare_equal_across_buffers() {
        let a = Image::filled(2, 3, Color::GREEN);
        let b = Image::filled(2, 3, Color::GREEN);
        let c = Image::filled(2, 3, Color::BLUE);
        assert!(!a.same_buffer(&b));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn transparent_color_has_zero_alpha() {
        assert_eq!(Color::TRANSPARENT.rgba().0[3], 0);
        assert_eq!(Color::WHITE.rgba(), Rgba([0xff, 0xff, 0xff, 0xff]));
    }

    #[test]
    fn default_image_is_sixteen_square() {
        let image = Image::default();
        assert_eq!((image.width(), image.height()), (16, 16));
    }
}
