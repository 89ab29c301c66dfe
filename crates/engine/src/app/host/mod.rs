//! Boundary to the host runtime.
//!
//! The engine never owns rendering, physics, audio or input. It drives the
//! host through [`Host`]: sprites are created and addressed by
//! [`SpriteHandle`], animations are started and stopped per sprite, and the
//! host supplies the runtime clock and button state.

mod headless;

use bitflags::bitflags;
use image::RgbaImage;
use thiserror::Error;

use super::bitmap::{Color, Image};
use super::input::Button;
use super::named_values::SpriteKind;

pub use headless::{HeadlessHost, MusicEvent, PlayingAnimation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationCategory {
    Image,
    Movement,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    UntilDone,
    InBackground,
    LoopingInBackground,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicTrack {
    pub name: String,
}

impl MusicTrack {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub char_width: u32,
    pub char_height: u32,
}

impl FontMetrics {
    pub const FONT8: Self = Self {
        char_width: 6,
        char_height: 8,
    };

    pub fn scaled(self, scale: u32) -> Self {
        let scale = scale.max(1);
        Self {
            char_width: self.char_width * scale,
            char_height: self.char_height * scale,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SpriteFlags: u32 {
        const GHOST              = 1 << 0;
        const AUTO_DESTROY       = 1 << 1;
        const STAY_IN_SCREEN     = 1 << 2;
        const DESTROY_ON_WALL    = 1 << 3;
        const BOUNCE_ON_WALL     = 1 << 4;
        const SHOW_PHYSICS       = 1 << 5;
        const INVISIBLE          = 1 << 6;
        const RELATIVE_TO_CAMERA = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Host-side sprite state. Positions are the sprite centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub ax: f32,
    pub ay: f32,
    pub fx: f32,
    pub fy: f32,
    pub sx: f32,
    pub sy: f32,
    pub lifespan: Option<f32>,
    pub z: i32,
    pub layer: u32,
    pub flags: SpriteFlags,
    pub id: u32,
    pub kind: SpriteKind,
    image: Image,
}

impl Sprite {
    pub fn new(image: Image, kind: SpriteKind, id: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            ax: 0.0,
            ay: 0.0,
            fx: 0.0,
            fy: 0.0,
            sx: 1.0,
            sy: 1.0,
            lifespan: None,
            z: 0,
            layer: 1,
            flags: SpriteFlags::empty(),
            id,
            kind,
            image,
        }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn set_image(&mut self, image: Image) {
        self.image = image;
    }

    pub fn width(&self) -> f32 {
        self.image.width() as f32 * self.sx
    }

    pub fn height(&self) -> f32 {
        self.image.height() as f32 * self.sy
    }

    pub fn scale(&self) -> f32 {
        self.sx.max(self.sy)
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.sx = scale;
        self.sy = scale;
    }

    pub fn left(&self) -> f32 {
        self.x - self.width() / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y - self.height() / 2.0
    }

    pub fn right(&self) -> f32 {
        self.left() + self.width()
    }

    pub fn bottom(&self) -> f32 {
        self.top() + self.height()
    }

    pub fn set_left(&mut self, left: f32) {
        self.x = left + self.width() / 2.0;
    }

    pub fn set_top(&mut self, top: f32) {
        self.y = top + self.height() / 2.0;
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            left: self.left(),
            top: self.top(),
            right: self.right(),
            bottom: self.bottom(),
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn set_velocity(&mut self, vx: f32, vy: f32) {
        self.vx = vx;
        self.vy = vy;
    }
}

/// Row-major tile indices. `tile_size` is in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_size: u32,
    tiles: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: u32,
        tiles: Vec<u16>,
    ) -> Result<Self, TilemapError> {
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            tiles,
        })
    }

    /// The map a suspended screen leaves behind.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            tile_size: 16,
            tiles: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u16> {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
    }
}

/// Services the engine consumes from the host runtime.
pub trait Host {
    /// Monotonic runtime clock in milliseconds.
    fn runtime_ms(&self) -> f64;

    fn create_sprite(&mut self, image: Image, kind: SpriteKind) -> SpriteHandle;
    fn destroy_sprite(&mut self, sprite: SpriteHandle);
    fn sprite(&self, sprite: SpriteHandle) -> Option<&Sprite>;
    fn sprite_mut(&mut self, sprite: SpriteHandle) -> Option<&mut Sprite>;

    fn overlaps(&self, a: SpriteHandle, b: SpriteHandle) -> bool {
        match (self.sprite(a), self.sprite(b)) {
            (Some(a), Some(b)) => a.bounds().intersects(&b.bounds()),
            _ => false,
        }
    }

    fn start_animation(
        &mut self,
        sprite: SpriteHandle,
        frames: &[Image],
        interval_ms: f32,
        looping: bool,
    ) -> AnimationHandle;
    fn stop_animation(&mut self, sprite: SpriteHandle, category: AnimationCategory);

    fn set_tilemap(&mut self, tilemap: &Tilemap);

    fn play_music(&mut self, track: &MusicTrack, mode: PlaybackMode);
    fn stop_all_sounds(&mut self);
    fn volume(&self) -> u8;
    fn set_volume(&mut self, volume: u8);

    fn is_pressed(&self, button: Button) -> bool;
    fn set_user_events_enabled(&mut self, enabled: bool);

    /// Visible screen size in pixels.
    fn screen_size(&self) -> (u32, u32);
    fn font(&self) -> FontMetrics {
        FontMetrics::FONT8
    }
    /// Draws `text` with its top-left corner at `(x, y)`.
    fn print(
        &mut self,
        target: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        color: Color,
        font: FontMetrics,
    );
}
