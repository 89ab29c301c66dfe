//! Two-screen demo built on the blueprints from `assets/blueprints`.
//!
//! The hero patrols the meadow and fights the slimes it runs into. Once the
//! meadow is clear the game moves to the cave, which greets the player with a
//! short conversation and then sends them back to the meadow.

use std::cell::Cell;
use std::rc::Rc;

use engine::app::dialog::{DialogLayout, DialogSequence, DialogStep, SequencePrompt};
use engine::app::host::MusicTrack;
use engine::app::{
    Button, Color, DataKey, Engine, GameObject, HeadlessHost, Host, Image, ModalDialog,
    ObjectContext, ObjectHandle, ScreenContext, SpriteKind, Tilemap,
};
use thiserror::Error;
use tracing::info;

pub(crate) const MEADOW: &str = "meadow";
pub(crate) const CAVE: &str = "cave";

const HERO_SPEED: f32 = 40.0;
const LEFT_EDGE: f32 = 10.0;
const RIGHT_EDGE: f32 = 150.0;
const GROUND_Y: f32 = 60.0;
const SLIME_XS: [f32; 3] = [60.0, 100.0, 140.0];
const SLIME_REWARD: f32 = 1.0;
const CAVE_TILES: (u32, u32) = (10, 8);
const TILE_SIZE: u32 = 16;
/// The autopilot taps A for one frame out of every this many.
const TAP_PERIOD: u32 = 20;

#[derive(Debug, Error)]
pub(crate) enum DemoError {
    #[error("demo needs blueprint '{0}' but it was not loaded")]
    MissingBlueprint(&'static str),
    #[error("demo needs sprite kind '{0}' but no blueprint declares it")]
    MissingKind(&'static str),
    #[error("cave tilemap: {0}")]
    Tilemap(#[from] engine::app::host::TilemapError),
}

/// Handles the demo keeps after setup.
#[derive(Debug, Clone)]
pub(crate) struct DemoState {
    pub(crate) player: SpriteKind,
    pub(crate) enemy: SpriteKind,
    pub(crate) cave_cleared: Rc<Cell<bool>>,
}

pub(crate) fn install(engine: &mut Engine, host: &mut dyn Host) -> Result<DemoState, DemoError> {
    for name in ["hero", "slime", "coin"] {
        if engine.get_blueprint(name).is_none() {
            return Err(DemoError::MissingBlueprint(name));
        }
    }
    let player = kind(engine, "Player")?;
    let enemy = kind(engine, "Enemy")?;
    let cave_cleared = Rc::new(Cell::new(false));

    wire_blueprints(engine, enemy)?;
    build_meadow(engine, enemy, Rc::clone(&cave_cleared));
    build_cave(engine, Rc::clone(&cave_cleared))?;
    engine.set_current_screen(MEADOW, host);

    Ok(DemoState {
        player,
        enemy,
        cave_cleared,
    })
}

/// Scripted input: a short tap on A every [`TAP_PERIOD`] frames, enough to
/// page through dialogs.
pub(crate) fn autopilot(frame: u32, host: &mut HeadlessHost) {
    if frame % TAP_PERIOD == TAP_PERIOD / 2 {
        host.press(Button::A);
    } else {
        host.release(Button::A);
    }
}

fn kind(engine: &Engine, name: &'static str) -> Result<SpriteKind, DemoError> {
    engine
        .sprite_kinds()
        .lookup(name)
        .ok_or(DemoError::MissingKind(name))
}

fn wire_blueprints(engine: &mut Engine, enemy: SpriteKind) -> Result<(), DemoError> {
    let hero = engine
        .get_blueprint_mut("hero")
        .ok_or(DemoError::MissingBlueprint("hero"))?;
    hero.on_load(|ctx| {
        if let Some(sprite) = ctx.sprite_mut() {
            sprite.set_velocity(HERO_SPEED, 0.0);
        }
    });
    hero.on_update(move |ctx| {
        patrol(ctx);
        fight(ctx, enemy);
    });

    let slime = engine
        .get_blueprint_mut("slime")
        .ok_or(DemoError::MissingBlueprint("slime"))?;
    slime.on_destroy(|ctx| {
        info!(object = ctx.handle().0, "slime_defeated");
    });
    Ok(())
}

fn patrol(ctx: &mut ObjectContext<'_>) {
    let Some(sprite) = ctx.sprite_mut() else {
        return;
    };
    if sprite.x > RIGHT_EDGE && sprite.vx > 0.0 {
        sprite.vx = -HERO_SPEED;
    } else if sprite.x < LEFT_EDGE && sprite.vx < 0.0 {
        sprite.vx = HERO_SPEED;
    }
}

/// Swings at the first touching enemy that can take a hit.
fn fight(ctx: &mut ObjectContext<'_>, enemy: SpriteKind) {
    let target = ctx.overlapping(Some(enemy)).into_iter().find(|target| {
        ctx.find(*target)
            .is_some_and(|object| object.data_value(DataKey::DAMAGE_COOLDOWN) <= 0.0)
    });
    let Some(target) = target else {
        return;
    };
    if !ctx.perform_attack() || !ctx.apply_damage_to(target) {
        return;
    }
    let defeated = ctx
        .find(target)
        .is_some_and(|object| object.data_value(DataKey::LIFE) <= 0.0);
    if defeated && ctx.destroy(target) {
        let score = ctx.object().data_value(DataKey::SCORE) + SLIME_REWARD;
        ctx.object_mut().set_data_value(DataKey::SCORE, score);
    }
}

fn place(ctx: &mut ScreenContext<'_>, handle: Option<ObjectHandle>, x: f32, y: f32) {
    let Some(sprite) = handle
        .and_then(|handle| ctx.find(handle))
        .and_then(GameObject::sprite)
    else {
        return;
    };
    if let Some(state) = ctx.host().sprite_mut(sprite) {
        state.set_position(x, y);
    }
}

fn build_meadow(engine: &mut Engine, enemy: SpriteKind, cave_cleared: Rc<Cell<bool>>) {
    let (width, height) = engine.screen_size();
    let meadow = engine.create_screen(MEADOW);
    meadow.set_background_image(Image::filled(width, height, Color::GREEN));
    meadow.set_background_music(MusicTrack::new("meadow_theme"));

    meadow.on_load(|ctx| {
        let hero = ctx.spawn("hero");
        place(ctx, hero, LEFT_EDGE * 2.0, GROUND_Y);
        for x in SLIME_XS {
            let slime = ctx.spawn("slime");
            place(ctx, slime, x, GROUND_Y);
        }
        info!(objects = ctx.objects().len(), "meadow_populated");
    });
    meadow.on_show(|ctx| {
        info!(screen = ctx.screen_name(), "screen_shown");
    });
    meadow.on_game_update(move |ctx| {
        if cave_cleared.get() {
            return;
        }
        let enemies_left = ctx.objects().of_kind(enemy, ctx.blueprints()).count();
        if enemies_left == 0 {
            ctx.switch_screen(CAVE);
        }
    });
}

fn build_cave(engine: &mut Engine, cave_cleared: Rc<Cell<bool>>) -> Result<(), DemoError> {
    let (columns, rows) = CAVE_TILES;
    let tiles = (0..columns * rows)
        .map(|index| if index < columns { 1 } else { 0 })
        .collect();
    let tilemap = Tilemap::new(columns, rows, TILE_SIZE, tiles)?;

    let cave = engine.create_screen(CAVE);
    cave.set_tilemap(tilemap);
    cave.set_background_music(MusicTrack::new("cave_drip"));
    cave.set_music_volume(64);

    cave.on_load(|ctx| {
        let coin = ctx.spawn("coin");
        place(ctx, coin, 80.0, 90.0);
    });
    let on_show_flag = Rc::clone(&cave_cleared);
    cave.on_show(move |ctx| {
        if on_show_flag.get() {
            return;
        }
        let (width, height) = ctx.host().screen_size();
        let font = ctx.host().font();
        let done = Rc::clone(&on_show_flag);
        let prompt = SequencePrompt::new(
            greeting(),
            DialogLayout::Bottom.frame(width, height),
            font,
        );
        ctx.open_dialog(ModalDialog::new(prompt).on_complete(move |result| {
            info!(?result, "cave_greeting_finished");
            done.set(true);
        }));
    });
    cave.on_game_update(move |ctx| {
        if cave_cleared.get() {
            ctx.switch_screen(MEADOW);
        }
    });
    Ok(())
}

fn greeting() -> DialogSequence {
    DialogSequence::new(vec![
        DialogStep::new("Welcome to the cave.").respond(
            DialogStep::new("Grab the coin and head back.").then(|| info!("cave_quest_given")),
        ),
    ])
}
