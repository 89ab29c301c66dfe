use image::RgbaImage;

use super::{
    AnimationCategory, AnimationHandle, FontMetrics, Host, MusicTrack, PlaybackMode, Sprite,
    SpriteHandle, Tilemap,
};
use crate::app::bitmap::{Color, Image};
use crate::app::input::{Button, ButtonStates};
use crate::app::named_values::SpriteKind;

const DEFAULT_SCREEN_WIDTH: u32 = 160;
const DEFAULT_SCREEN_HEIGHT: u32 = 120;
const DEFAULT_VOLUME: u8 = 128;

#[derive(Debug, Clone)]
pub struct PlayingAnimation {
    pub handle: AnimationHandle,
    pub sprite: SpriteHandle,
    pub frames: Vec<Image>,
    pub interval_ms: f32,
    pub looping: bool,
    elapsed_ms: f32,
}

/// A sprite slot. The generation is bumped on every destroy so stale
/// handles to a reused slot resolve to nothing.
#[derive(Debug, Default)]
struct SpriteSlot {
    generation: u32,
    sprite: Option<Sprite>,
}

fn slot_index(handle: SpriteHandle) -> usize {
    (handle.0 & u64::from(u32::MAX)) as usize
}

fn slot_generation(handle: SpriteHandle) -> u32 {
    (handle.0 >> 32) as u32
}

fn live_slot_mut(slots: &mut [SpriteSlot], handle: SpriteHandle) -> Option<&mut SpriteSlot> {
    slots
        .get_mut(slot_index(handle))
        .filter(|slot| slot.generation == slot_generation(handle) && slot.sprite.is_some())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicEvent {
    Played {
        track: MusicTrack,
        mode: PlaybackMode,
        volume: u8,
    },
    StoppedAll,
}

/// In-memory host: keeps sprite state, steps image animations and applies
/// velocity/acceleration when advanced. Used by the demo binary and tests.
#[derive(Debug)]
pub struct HeadlessHost {
    now_ms: f64,
    sprites: Vec<SpriteSlot>,
    free_slots: Vec<usize>,
    next_sprite_id: u32,
    animations: Vec<PlayingAnimation>,
    next_animation: u64,
    tilemap: Option<Tilemap>,
    music_log: Vec<MusicEvent>,
    volume: u8,
    buttons: ButtonStates,
    user_events_enabled: bool,
    screen_size: (u32, u32),
    printed: Vec<String>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self {
            now_ms: 0.0,
            sprites: Vec::new(),
            free_slots: Vec::new(),
            next_sprite_id: 1,
            animations: Vec::new(),
            next_animation: 0,
            tilemap: None,
            music_log: Vec::new(),
            volume: DEFAULT_VOLUME,
            buttons: ButtonStates::default(),
            user_events_enabled: true,
            screen_size: (DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT),
            printed: Vec::new(),
        }
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_size = (width, height);
        self
    }

    pub fn set_runtime_ms(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
    }

    /// Moves the clock forward, integrates sprite motion and steps
    /// animations.
    pub fn advance(&mut self, dt_ms: f64) {
        self.now_ms += dt_ms;
        let dt_seconds = (dt_ms / 1000.0) as f32;
        for sprite in self.sprites.iter_mut().filter_map(|slot| slot.sprite.as_mut()) {
            sprite.vx += sprite.ax * dt_seconds;
            sprite.vy += sprite.ay * dt_seconds;
            sprite.x += sprite.vx * dt_seconds;
            sprite.y += sprite.vy * dt_seconds;
        }

        let sprites = &mut self.sprites;
        self.animations.retain_mut(|animation| {
            animation.elapsed_ms += dt_ms as f32;
            let step = if animation.interval_ms > 0.0 {
                (animation.elapsed_ms / animation.interval_ms) as usize
            } else {
                0
            };
            let len = animation.frames.len();
            let (frame, finished) = if animation.looping {
                (step % len, false)
            } else {
                (step.min(len - 1), step >= len)
            };
            if let Some(sprite) =
                live_slot_mut(sprites, animation.sprite).and_then(|slot| slot.sprite.as_mut())
            {
                sprite.set_image(animation.frames[frame].clone());
            }
            !finished
        });
    }

    pub fn press(&mut self, button: Button) {
        self.buttons.set(button, true);
    }

    pub fn release(&mut self, button: Button) {
        self.buttons.set(button, false);
    }

    pub fn live_sprite_count(&self) -> usize {
        self.live_sprites().count()
    }

    pub fn sprites_of_kind(&self, kind: SpriteKind) -> usize {
        self.live_sprites()
            .filter(|sprite| sprite.kind == kind)
            .count()
    }

    fn live_sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter().filter_map(|slot| slot.sprite.as_ref())
    }

    pub fn animation_on(&self, sprite: SpriteHandle) -> Option<&PlayingAnimation> {
        self.animations
            .iter()
            .find(|animation| animation.sprite == sprite)
    }

    pub fn current_tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn music_log(&self) -> &[MusicEvent] {
        &self.music_log
    }

    pub fn user_events_enabled(&self) -> bool {
        self.user_events_enabled
    }

    pub fn printed(&self) -> &[String] {
        &self.printed
    }
}

impl Host for HeadlessHost {
    fn runtime_ms(&self) -> f64 {
        self.now_ms
    }

    fn create_sprite(&mut self, image: Image, kind: SpriteKind) -> SpriteHandle {
        let id = self.next_sprite_id;
        self.next_sprite_id = self.next_sprite_id.saturating_add(1);
        let index = match self.free_slots.pop() {
            Some(index) => index,
            None => {
                self.sprites.push(SpriteSlot::default());
                self.sprites.len() - 1
            }
        };
        let slot = &mut self.sprites[index];
        slot.sprite = Some(Sprite::new(image, kind, id));
        SpriteHandle((u64::from(slot.generation) << 32) | index as u64)
    }

    fn destroy_sprite(&mut self, sprite: SpriteHandle) {
        if let Some(slot) = live_slot_mut(&mut self.sprites, sprite) {
            slot.sprite = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_slots.push(slot_index(sprite));
        }
        self.animations
            .retain(|animation| animation.sprite != sprite);
    }

    fn sprite(&self, sprite: SpriteHandle) -> Option<&Sprite> {
        self.sprites
            .get(slot_index(sprite))
            .filter(|slot| slot.generation == slot_generation(sprite))
            .and_then(|slot| slot.sprite.as_ref())
    }

    fn sprite_mut(&mut self, sprite: SpriteHandle) -> Option<&mut Sprite> {
        live_slot_mut(&mut self.sprites, sprite).and_then(|slot| slot.sprite.as_mut())
    }

    fn start_animation(
        &mut self,
        sprite: SpriteHandle,
        frames: &[Image],
        interval_ms: f32,
        looping: bool,
    ) -> AnimationHandle {
        let handle = AnimationHandle(self.next_animation);
        self.next_animation = self.next_animation.saturating_add(1);
        // One image animation per sprite.
        self.animations
            .retain(|animation| animation.sprite != sprite);
        if let (Some(first), Some(target)) = (frames.first(), self.sprite_mut(sprite)) {
            target.set_image(first.clone());
        }
        if !frames.is_empty() {
            self.animations.push(PlayingAnimation {
                handle,
                sprite,
                frames: frames.to_vec(),
                interval_ms,
                looping,
                elapsed_ms: 0.0,
            });
        }
        handle
    }

    fn stop_animation(&mut self, sprite: SpriteHandle, category: AnimationCategory) {
        match category {
            AnimationCategory::Image | AnimationCategory::All => self
                .animations
                .retain(|animation| animation.sprite != sprite),
            AnimationCategory::Movement => {}
        }
    }

    fn set_tilemap(&mut self, tilemap: &Tilemap) {
        self.tilemap = Some(tilemap.clone());
    }

    fn play_music(&mut self, track: &MusicTrack, mode: PlaybackMode) {
        self.music_log.push(MusicEvent::Played {
            track: track.clone(),
            mode,
            volume: self.volume,
        });
    }

    fn stop_all_sounds(&mut self) {
        self.music_log.push(MusicEvent::StoppedAll);
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
    }

    fn is_pressed(&self, button: Button) -> bool {
        self.buttons.is_down(button)
    }

    fn set_user_events_enabled(&mut self, enabled: bool) {
        self.user_events_enabled = enabled;
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen_size
    }

    fn print(
        &mut self,
        target: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        color: Color,
        font: FontMetrics,
    ) {
        // Glyphs are stand-in blocks: one pixel per character cell.
        let rgba = color.rgba();
        for (idx, ch) in text.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let px = x + (idx as u32 * font.char_width) as i32;
            if px >= 0 && y >= 0 && (px as u32) < target.width() && (y as u32) < target.height() {
                target.put_pixel(px as u32, y as u32, rgba);
            }
        }
        self.printed.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reused_sprite_slot_gets_a_fresh_handle() {
        let mut host = HeadlessHost::new();
        let first = host.create_sprite(Image::default(), SpriteKind(1));
        host.destroy_sprite(first);
        let second = host.create_sprite(Image::default(), SpriteKind(1));

        assert_ne!(first, second);
        assert!(host.sprite(first).is_none());
        assert!(host.sprite(second).is_some());
        host.destroy_sprite(first);
        assert!(host.sprite(second).is_some());
        assert_eq!(host.live_sprite_count(), 1);
    }

    #[test]
    fn create_destroy_cycles_do_not_grow_the_slot_list() {
        let mut host = HeadlessHost::new();
        let keep = host.create_sprite(Image::default(), SpriteKind(1));
        for _ in 0..100 {
            let sprite = host.create_sprite(Image::default(), SpriteKind(2));
            host.destroy_sprite(sprite);
        }

        assert_eq!(host.sprites.len(), 2);
        assert!(host.sprite(keep).is_some());
        assert_eq!(host.live_sprite_count(), 1);
    }

    #[test]
    fn advance_integrates_velocity() {
        let mut host = HeadlessHost::new();
        let sprite = host.create_sprite(Image::default(), SpriteKind(0));
        host.sprite_mut(sprite).expect("sprite").set_velocity(10.0, -20.0);

        host.advance(500.0);

        let state = host.sprite(sprite).expect("sprite");
        assert_eq!((state.x, state.y), (5.0, -10.0));
        assert_eq!(host.runtime_ms(), 500.0);
    }

    #[test]
    fn looping_animation_cycles_frames() {
        let mut host = HeadlessHost::new();
        let sprite = host.create_sprite(Image::default(), SpriteKind(0));
        let frames = vec![
            Image::filled(4, 4, Color::RED),
            Image::filled(4, 4, Color::GREEN),
        ];
        host.start_animation(sprite, &frames, 100.0, true);

        host.advance(150.0);
        assert_eq!(host.sprite(sprite).expect("sprite").image(), &frames[1]);
        host.advance(100.0);
        assert_eq!(host.sprite(sprite).expect("sprite").image(), &frames[0]);
    }

    #[test]
    fn one_shot_animation_finishes_on_last_frame() {
        let mut host = HeadlessHost::new();
        let sprite = host.create_sprite(Image::default(), SpriteKind(0));
        let frames = vec![
            Image::filled(4, 4, Color::RED),
            Image::filled(4, 4, Color::BLUE),
        ];
        host.start_animation(sprite, &frames, 50.0, false);

        host.advance(500.0);

        assert!(host.animation_on(sprite).is_none());
        assert_eq!(host.sprite(sprite).expect("sprite").image(), &frames[1]);
    }

    #[test]
    fn stopping_movement_keeps_image_animation() {
        let mut host = HeadlessHost::new();
        let sprite = host.create_sprite(Image::default(), SpriteKind(0));
        host.start_animation(sprite, &[Image::default()], 100.0, true);

        host.stop_animation(sprite, AnimationCategory::Movement);
        assert!(host.animation_on(sprite).is_some());
        host.stop_animation(sprite, AnimationCategory::All);
        assert!(host.animation_on(sprite).is_none());
    }
}
