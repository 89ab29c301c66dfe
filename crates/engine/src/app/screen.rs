use tracing::{debug, info};

use super::bitmap::Image;
use super::context::{ScreenCallback, ScreenCallbacks, ScreenContext, Services};
use super::host::{Host, MusicTrack, PlaybackMode, Rect, Sprite, SpriteFlags, SpriteHandle, Tilemap};
use super::keyed_table::KeyedTable;
use super::game_object::ObjectHandle;
use super::named_values::SpriteKind;
use super::object_store::ObjectStore;

pub const DEFAULT_MUSIC_VOLUME: u8 = 128;
const BACKGROUND_Z: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Uninitialized,
    Active,
    Suspended,
}

/// Transient sprite state captured when a screen is suspended.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSnapshot {
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
    pub bounds: Rect,
    pub z: i32,
    pub image: Image,
    pub layer: u32,
    pub flags: SpriteFlags,
    pub id: u32,
}

impl SpriteSnapshot {
    pub fn capture(sprite: &Sprite) -> Self {
        Self {
            x: sprite.x,
            y: sprite.y,
            vx: sprite.vx,
            vy: sprite.vy,
            ax: sprite.ax,
            ay: sprite.ay,
            fx: sprite.fx,
            fy: sprite.fy,
            sx: sprite.sx,
            sy: sprite.sy,
            lifespan: sprite.lifespan,
            bounds: sprite.bounds(),
            z: sprite.z,
            image: sprite.image().clone(),
            layer: sprite.layer,
            flags: sprite.flags,
            id: sprite.id,
        }
    }

    /// Writes every captured field onto `sprite`. Position goes last so the
    /// centre comes back exactly even if the bounds were rounded.
    pub fn restore(&self, sprite: &mut Sprite) {
        sprite.set_image(self.image.clone());
        sprite.vx = self.vx;
        sprite.vy = self.vy;
        sprite.ax = self.ax;
        sprite.ay = self.ay;
        sprite.fx = self.fx;
        sprite.fy = self.fy;
        sprite.sx = self.sx;
        sprite.sy = self.sy;
        sprite.lifespan = self.lifespan;
        sprite.set_left(self.bounds.left);
        sprite.set_top(self.bounds.top);
        sprite.z = self.z;
        sprite.layer = self.layer;
        sprite.flags = self.flags;
        sprite.id = self.id;
        sprite.x = self.x;
        sprite.y = self.y;
    }
}

/// A named set of game objects with its own background, music and tilemap.
#[derive(Debug)]
pub struct GameScreen {
    name: String,
    objects: ObjectStore,
    initialized: bool,
    suspended: bool,
    background_image: Option<Image>,
    background_music: Option<MusicTrack>,
    music_volume: u8,
    tilemap: Option<Tilemap>,
    background_sprite: Option<SpriteHandle>,
    sprite_kind: SpriteKind,
    snapshots: KeyedTable<ObjectHandle, SpriteSnapshot>,
    callbacks: ScreenCallbacks,
}

impl GameScreen {
    /// `sprite_kind` tags the background sprite.
    pub fn new(name: impl Into<String>, sprite_kind: SpriteKind) -> Self {
        Self {
            name: name.into(),
            objects: ObjectStore::new(),
            initialized: false,
            suspended: false,
            background_image: None,
            background_music: None,
            music_volume: DEFAULT_MUSIC_VOLUME,
            tilemap: None,
            background_sprite: None,
            sprite_kind,
            snapshots: KeyedTable::new(),
            callbacks: ScreenCallbacks::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ScreenState {
        if self.suspended {
            ScreenState::Suspended
        } else if self.initialized {
            ScreenState::Active
        } else {
            ScreenState::Uninitialized
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectStore {
        &mut self.objects
    }

    pub fn sprite_kind(&self) -> SpriteKind {
        self.sprite_kind
    }

    pub fn background_image(&self) -> Option<&Image> {
        self.background_image.as_ref()
    }

    pub fn set_background_image(&mut self, image: Image) {
        self.background_image = Some(image);
    }

    pub fn background_sprite(&self) -> Option<SpriteHandle> {
        self.background_sprite
    }

    pub fn background_music(&self) -> Option<&MusicTrack> {
        self.background_music.as_ref()
    }

    pub fn set_background_music(&mut self, track: MusicTrack) {
        self.background_music = Some(track);
    }

    pub fn music_volume(&self) -> u8 {
        self.music_volume
    }

    pub fn set_music_volume(&mut self, volume: u8) {
        self.music_volume = volume;
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    pub fn snapshot(&self, handle: ObjectHandle) -> Option<&SpriteSnapshot> {
        self.snapshots.get(&handle)
    }

    pub fn on_load(&mut self, callback: impl Fn(&mut ScreenContext<'_>) + 'static) {
        self.callbacks.on_load = Some(ScreenCallback::new(callback));
    }

    pub fn on_show(&mut self, callback: impl Fn(&mut ScreenContext<'_>) + 'static) {
        self.callbacks.on_show = Some(ScreenCallback::new(callback));
    }

    pub fn on_suspend(&mut self, callback: impl Fn(&mut ScreenContext<'_>) + 'static) {
        self.callbacks.on_suspend = Some(ScreenCallback::new(callback));
    }

    pub fn on_game_update(&mut self, callback: impl Fn(&mut ScreenContext<'_>) + 'static) {
        self.callbacks.on_game_update = Some(ScreenCallback::new(callback));
    }

    /// Runs a screen callback. `shared` replaces the screen's own objects
    /// when the engine keeps one collection for every screen.
    fn fire(
        &mut self,
        callback: Option<ScreenCallback>,
        services: &mut Services<'_>,
        shared: Option<&mut ObjectStore>,
    ) {
        let Some(callback) = callback else {
            return;
        };
        let objects = match shared {
            Some(objects) => objects,
            None => &mut self.objects,
        };
        let mut ctx = ScreenContext::new(&self.name, objects, services.reborrow());
        callback.call(&mut ctx);
    }

    pub(crate) fn game_update(
        &mut self,
        services: &mut Services<'_>,
        shared: Option<&mut ObjectStore>,
    ) {
        let callback = self.callbacks.on_game_update.clone();
        self.fire(callback, services, shared);
    }

    /// Tears the screen down to data. A no-op when already suspended.
    pub(crate) fn suspend(
        &mut self,
        services: &mut Services<'_>,
        mut shared: Option<&mut ObjectStore>,
    ) -> bool {
        if self.suspended {
            return false;
        }
        let callback = self.callbacks.on_suspend.clone();
        self.fire(callback, services, shared.as_deref_mut());
        match shared {
            Some(objects) => objects.flush_destroy_requests(services),
            None => self.objects.flush_destroy_requests(services),
        };

        if self.background_music.is_some() {
            services.host.stop_all_sounds();
        }
        if self.tilemap.is_some() {
            services.host.set_tilemap(&Tilemap::empty());
        }
        if let Some(sprite) = self.background_sprite.take() {
            services.host.destroy_sprite(sprite);
        }
        let swept = self.objects.sweep(&mut *services.host);

        let mut captured = 0;
        for object in self.objects.iter_mut() {
            let Some(sprite) = object.sprite.take() else {
                continue;
            };
            if let Some(state) = services.host.sprite(sprite) {
                self.snapshots
                    .set(object.handle(), SpriteSnapshot::capture(state));
                captured += 1;
            }
            services.host.destroy_sprite(sprite);
        }
        self.suspended = true;
        info!(
            screen = %self.name,
            captured,
            swept,
            "screen_suspended"
        );
        true
    }

    /// Brings the screen (back) up. onLoad fires once over the screen's
    /// lifetime, onShow on every call.
    pub(crate) fn resume(
        &mut self,
        services: &mut Services<'_>,
        mut shared: Option<&mut ObjectStore>,
    ) {
        if let Some(image) = &self.background_image {
            if self.background_sprite.is_none() {
                let sprite = services.host.create_sprite(image.clone(), self.sprite_kind);
                if let Some(state) = services.host.sprite_mut(sprite) {
                    state.z = BACKGROUND_Z;
                }
                self.background_sprite = Some(sprite);
            }
        }
        if let Some(tilemap) = &self.tilemap {
            services.host.set_tilemap(tilemap);
        }
        if !self.initialized {
            let callback = self.callbacks.on_load.clone();
            self.fire(callback, services, shared.as_deref_mut());
            self.initialized = true;
        }
        if self.suspended {
            self.restore_sprites(services);
            self.suspended = false;
        }
        self.play_background(&mut *services.host);

        let callback = self.callbacks.on_show.clone();
        self.fire(callback, services, shared);
        info!(
            screen = %self.name,
            objects = self.objects.len(),
            "screen_resumed"
        );
    }

    fn restore_sprites(&mut self, services: &mut Services<'_>) {
        let blueprints = services.blueprints;
        for object in self.objects.iter_mut() {
            if object.sprite.is_some() {
                continue;
            }
            let blueprint = blueprints.get(object.blueprint_id());
            let sprite = match self.snapshots.get(&object.handle()) {
                Some(snapshot) => {
                    let sprite = services
                        .host
                        .create_sprite(snapshot.image.clone(), blueprint.kind());
                    if let Some(state) = services.host.sprite_mut(sprite) {
                        snapshot.restore(state);
                    }
                    sprite
                }
                None => {
                    debug!(
                        screen = %self.name,
                        object = object.handle().0,
                        "no_snapshot_for_object"
                    );
                    services
                        .host
                        .create_sprite(blueprint.default_image(), blueprint.kind())
                }
            };
            object.sprite = Some(sprite);
            // The old animation played on a sprite that no longer exists.
            object.animation = None;
        }
        self.snapshots.clear();
    }

    fn play_background(&self, host: &mut dyn Host) {
        let Some(track) = &self.background_music else {
            return;
        };
        let previous = host.volume();
        host.set_volume(self.music_volume);
        host.play_music(track, PlaybackMode::LoopingInBackground);
        host.set_volume(previous);
    }
}
