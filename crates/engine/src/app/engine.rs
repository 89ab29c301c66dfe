//! Top-level application state.
//!
//! [`Engine`] owns every registry the lifecycle callbacks used to reach as
//! globals: blueprints, screens, the shared object collection, the named
//! value registries, the frame clock and the open dialog. The host drives it
//! by calling [`Engine::update_frame`] once per frame.

use tracing::{info, warn};

use super::blueprint::{Blueprint, BlueprintId, BlueprintRegistry};
use super::context::{PendingChanges, Services};
use super::dialog::{DialogResult, ModalDialog};
use super::game_object::{self, GameObject, ObjectHandle};
use super::host::Host;
use super::keyed_table::KeyedTable;
use super::loop_runner::{EngineConfig, FrameClock, FrameReport, ObjectScope};
use super::metrics::{LoopMetricsSnapshot, MetricsAccumulator};
use super::named_values::{ActionNames, DataKey, DataNames, SpriteKind, SpriteKindRegistry};
use super::object_store::ObjectStore;
use super::screen::GameScreen;

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    sprite_kinds: SpriteKindRegistry,
    data_names: DataNames,
    action_names: ActionNames,
    blueprints: BlueprintRegistry,
    objects: ObjectStore,
    screens: KeyedTable<String, GameScreen>,
    current_screen: Option<String>,
    pending: PendingChanges,
    clock: FrameClock,
    dialog: Option<ModalDialog>,
    last_dialog_result: Option<DialogResult>,
    metrics: MetricsAccumulator,
    last_metrics: Option<LoopMetricsSnapshot>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// The collection the update pass walks under `scope`.
fn active_store<'a>(
    scope: ObjectScope,
    objects: &'a mut ObjectStore,
    screens: &'a mut KeyedTable<String, GameScreen>,
    current: Option<&String>,
) -> Option<&'a mut ObjectStore> {
    match scope {
        ObjectScope::Global => Some(objects),
        ObjectScope::PerScreen => {
            let screen = screens.get_mut(current?)?;
            Some(screen.objects_mut())
        }
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        info!(
            scope = ?config.object_scope,
            max_frame_delta_ms = ?config.max_frame_delta_ms,
            metrics_log_interval_ms = config.metrics_log_interval_ms,
            screen_width = config.screen_width,
            screen_height = config.screen_height,
            "engine_config"
        );
        Self {
            clock: FrameClock::new(config.max_frame_delta_ms),
            metrics: MetricsAccumulator::new(config.metrics_log_interval_ms),
            config,
            sprite_kinds: SpriteKindRegistry::default(),
            data_names: DataNames::default(),
            action_names: ActionNames::default(),
            blueprints: BlueprintRegistry::new(),
            objects: ObjectStore::new(),
            screens: KeyedTable::new(),
            current_screen: None,
            pending: PendingChanges::default(),
            dialog: None,
            last_dialog_result: None,
            last_metrics: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.config.screen_width, self.config.screen_height)
    }

    /// Milliseconds between the last two frames. 0 on the first frame.
    pub fn frame_time(&self) -> f32 {
        self.clock.frame_time_ms()
    }

    pub fn last_metrics(&self) -> Option<LoopMetricsSnapshot> {
        self.last_metrics
    }

    pub fn sprite_kinds(&self) -> &SpriteKindRegistry {
        &self.sprite_kinds
    }

    pub fn sprite_kinds_mut(&mut self) -> &mut SpriteKindRegistry {
        &mut self.sprite_kinds
    }

    pub fn data_names(&self) -> &DataNames {
        &self.data_names
    }

    pub fn data_names_mut(&mut self) -> &mut DataNames {
        &mut self.data_names
    }

    pub fn action_names(&self) -> &ActionNames {
        &self.action_names
    }

    pub fn action_names_mut(&mut self) -> &mut ActionNames {
        &mut self.action_names
    }

    // Blueprints.

    pub fn blueprints(&self) -> &BlueprintRegistry {
        &self.blueprints
    }

    /// Registers a blueprint, replacing any previous one with the same name.
    pub fn create_blueprint(&mut self, name: &str, kind: SpriteKind) -> &mut Blueprint {
        let id = self.blueprints.insert(Blueprint::new(name, kind));
        self.blueprints.get_mut(id)
    }

    /// Like [`Self::create_blueprint`] with a freshly issued sprite kind.
    pub fn create_blueprint_generic(&mut self, name: &str) -> &mut Blueprint {
        let kind = self.sprite_kinds.issue();
        self.create_blueprint(name, kind)
    }

    pub fn insert_blueprint(&mut self, blueprint: Blueprint) -> BlueprintId {
        self.blueprints.insert(blueprint)
    }

    pub fn get_blueprint(&self, name: &str) -> Option<&Blueprint> {
        self.blueprints.by_name(name)
    }

    pub fn get_blueprint_mut(&mut self, name: &str) -> Option<&mut Blueprint> {
        self.blueprints.by_name_mut(name)
    }

    // Screens.

    /// Registers an empty screen, replacing any previous one with that name.
    pub fn create_screen(&mut self, name: &str) -> &mut GameScreen {
        let mut screen = GameScreen::new(name, self.sprite_kinds.issue());
        screen.set_music_volume(self.config.default_music_volume);
        self.add_screen(screen)
    }

    pub fn add_screen(&mut self, screen: GameScreen) -> &mut GameScreen {
        let key = screen.name().to_string();
        if self.screens.contains(&key) {
            warn!(screen = %key, "screen_replaced");
        }
        self.screens.set(key, screen)
    }

    pub fn get_screen(&self, name: &str) -> Option<&GameScreen> {
        self.screens.get(&name.to_string())
    }

    pub fn get_screen_mut(&mut self, name: &str) -> Option<&mut GameScreen> {
        self.screens.get_mut(&name.to_string())
    }

    pub fn screen_names(&self) -> impl Iterator<Item = &str> {
        self.screens.keys().map(String::as_str)
    }

    pub fn current_screen_name(&self) -> Option<&str> {
        self.current_screen.as_deref()
    }

    pub fn current_screen_is(&self, name: &str) -> bool {
        self.current_screen.as_deref() == Some(name)
    }

    pub fn current_screen(&self) -> Option<&GameScreen> {
        self.current_screen
            .as_ref()
            .and_then(|name| self.screens.get(name))
    }

    /// Suspends the current screen and resumes `name`. Unknown names and the
    /// already-current screen are no-ops.
    pub fn set_current_screen(&mut self, name: &str, host: &mut dyn Host) -> bool {
        let key = name.to_string();
        if !self.screens.contains(&key) {
            warn!(screen = name, "unknown_screen");
            return false;
        }
        if self.current_screen.as_ref() == Some(&key) {
            return false;
        }
        self.settle_pending(host);
        let previous = self.current_screen.replace(key.clone());

        let Self {
            config,
            blueprints,
            objects,
            screens,
            pending,
            clock,
            ..
        } = self;
        let mut services = Services {
            blueprints,
            host,
            pending,
            frame_time_ms: clock.frame_time_ms(),
        };
        let mut shared = (config.object_scope == ObjectScope::Global).then_some(objects);

        if let Some(previous) = &previous {
            if let Some(screen) = screens.get_mut(previous) {
                screen.suspend(&mut services, shared.as_deref_mut());
            }
        }
        if let Some(screen) = screens.get_mut(&key) {
            screen.resume(&mut services, shared.as_deref_mut());
        }
        info!(from = ?previous, to = name, "screen_switched");
        true
    }

    pub fn pause_screen(&mut self, name: &str, host: &mut dyn Host) -> bool {
        let Self {
            config,
            blueprints,
            objects,
            screens,
            pending,
            clock,
            ..
        } = self;
        let Some(screen) = screens.get_mut(&name.to_string()) else {
            return false;
        };
        let mut services = Services {
            blueprints,
            host,
            pending,
            frame_time_ms: clock.frame_time_ms(),
        };
        let shared = (config.object_scope == ObjectScope::Global).then_some(objects);
        screen.suspend(&mut services, shared)
    }

    pub fn resume_screen(&mut self, name: &str, host: &mut dyn Host) -> bool {
        let Self {
            config,
            blueprints,
            objects,
            screens,
            pending,
            clock,
            ..
        } = self;
        let Some(screen) = screens.get_mut(&name.to_string()) else {
            return false;
        };
        let mut services = Services {
            blueprints,
            host,
            pending,
            frame_time_ms: clock.frame_time_ms(),
        };
        let shared = (config.object_scope == ObjectScope::Global).then_some(objects);
        screen.resume(&mut services, shared);
        true
    }

    // Objects.

    fn store(&self) -> Option<&ObjectStore> {
        match self.config.object_scope {
            ObjectScope::Global => Some(&self.objects),
            ObjectScope::PerScreen => self.current_screen().map(GameScreen::objects),
        }
    }

    fn with_store<R>(
        &mut self,
        host: &mut dyn Host,
        run: impl FnOnce(&mut ObjectStore, &mut Services<'_>) -> R,
    ) -> Option<R> {
        let Self {
            config,
            blueprints,
            objects,
            screens,
            current_screen,
            pending,
            clock,
            ..
        } = self;
        let store = active_store(
            config.object_scope,
            objects,
            screens,
            current_screen.as_ref(),
        )?;
        let mut services = Services {
            blueprints,
            host,
            pending,
            frame_time_ms: clock.frame_time_ms(),
        };
        Some(run(store, &mut services))
    }

    /// Hands spawns and destroy requests raised outside the update pass to
    /// the active collection, so they are not applied to another screen's.
    fn settle_pending(&mut self, host: &mut dyn Host) {
        self.with_store(host, |store, services| {
            for object in std::mem::take(&mut services.pending.spawns) {
                store.push(object);
            }
            store.flush_destroy_requests(services);
        });
    }

    /// Live objects of the active collection in update order.
    pub fn game_objects(&self) -> impl Iterator<Item = &GameObject> {
        self.store().into_iter().flat_map(ObjectStore::iter)
    }

    pub fn game_objects_of(&self, kind: SpriteKind) -> Vec<&GameObject> {
        self.game_objects()
            .filter(|object| self.blueprints.get(object.blueprint_id()).kind() == kind)
            .collect()
    }

    pub fn game_object(&self, handle: ObjectHandle) -> Option<&GameObject> {
        self.store()?.get(handle)
    }

    pub fn game_object_mut(&mut self, handle: ObjectHandle) -> Option<&mut GameObject> {
        let Self {
            config,
            objects,
            screens,
            current_screen,
            ..
        } = self;
        active_store(
            config.object_scope,
            objects,
            screens,
            current_screen.as_ref(),
        )?
        .get_mut(handle)
    }

    /// Spawns into the active collection. `None` for unknown blueprints, or
    /// when objects are per screen and no screen is current.
    pub fn create_game_object(
        &mut self,
        blueprint_name: &str,
        host: &mut dyn Host,
    ) -> Option<ObjectHandle> {
        if self.blueprints.id_of(blueprint_name).is_none() {
            warn!(blueprint = blueprint_name, "unknown_blueprint");
            return None;
        }
        let spawned =
            self.with_store(host, |store, services| store.spawn(blueprint_name, services));
        if spawned.is_none() {
            warn!(blueprint = blueprint_name, "no_current_screen_for_spawn");
        }
        spawned.flatten()
    }

    /// Fires the destroy callbacks now; the object is removed at the next
    /// sweep. Repeat calls are no-ops.
    pub fn destroy_game_object(&mut self, handle: ObjectHandle, host: &mut dyn Host) -> bool {
        self.with_store(host, |store, services| {
            let destroyed = store.destroy(handle, services);
            store.flush_destroy_requests(services);
            destroyed
        })
        .unwrap_or(false)
    }

    pub fn destroy_all_game_objects(&mut self, host: &mut dyn Host) -> usize {
        self.with_store(host, |store, services| {
            let destroyed = store.destroy_all(services);
            store.flush_destroy_requests(services);
            destroyed
        })
        .unwrap_or(0)
    }

    pub fn can_attack(&self, handle: ObjectHandle) -> bool {
        self.game_object(handle).is_some_and(game_object::can_attack)
    }

    pub fn perform_attack(&mut self, handle: ObjectHandle) -> bool {
        let Self {
            config,
            blueprints,
            objects,
            screens,
            current_screen,
            ..
        } = self;
        let Some(object) = active_store(
            config.object_scope,
            objects,
            screens,
            current_screen.as_ref(),
        )
        .and_then(|store| store.get_mut(handle)) else {
            return false;
        };
        let blueprint = blueprints.get(object.blueprint_id());
        game_object::perform_attack(object, blueprint)
    }

    /// `source` damages `target`. False when either is missing or the
    /// target is still cooling down.
    pub fn apply_damage(&mut self, source: ObjectHandle, target: ObjectHandle) -> bool {
        let Some(damage) = self
            .game_object(source)
            .map(|object| object.data_value(DataKey::DAMAGE))
        else {
            return false;
        };
        let Self {
            config,
            blueprints,
            objects,
            screens,
            current_screen,
            ..
        } = self;
        let Some(target) = active_store(
            config.object_scope,
            objects,
            screens,
            current_screen.as_ref(),
        )
        .and_then(|store| store.get_mut(target)) else {
            return false;
        };
        let blueprint = blueprints.get(target.blueprint_id());
        game_object::receive_damage(target, damage, blueprint)
    }

    // Dialogs.

    /// Opens `dialog` unless one is already open.
    pub fn open_dialog(&mut self, mut dialog: ModalDialog, host: &mut dyn Host) -> bool {
        if self.dialog.is_some() {
            warn!("dialog_already_open");
            return false;
        }
        dialog.open(host);
        self.dialog = Some(dialog);
        true
    }

    pub fn dialog_open(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn last_dialog_result(&self) -> Option<DialogResult> {
        self.last_dialog_result
    }

    // Frame loop.

    /// One host frame: clock, dialog or screen hook plus update pass, the
    /// destroy sweep, then deferred screen switches and dialogs.
    pub fn update_frame(&mut self, host: &mut dyn Host) -> FrameReport {
        let now_ms = host.runtime_ms();
        let frame_time_ms = self.clock.tick(now_ms);
        let mut report = FrameReport {
            frame_time_ms,
            ..FrameReport::default()
        };

        if let Some(dialog) = self.dialog.as_mut() {
            report.dialog_open = true;
            if let Some(result) = dialog.poll(host) {
                self.dialog = None;
                self.last_dialog_result = Some(result);
                info!(?result, "dialog_closed");
            }
            self.record_metrics(now_ms, &report);
            return report;
        }

        self.run_update_pass(host, &mut report);

        if let Some(target) = self.pending.switch_to.take() {
            report.switched_screen = self.set_current_screen(&target, host);
        }
        if let Some(dialog) = self.pending.dialog.take() {
            report.dialog_open = self.open_dialog(dialog, host);
        }
        self.record_metrics(now_ms, &report);
        report
    }

    fn run_update_pass(&mut self, host: &mut dyn Host, report: &mut FrameReport) {
        let Self {
            config,
            blueprints,
            objects,
            screens,
            current_screen,
            pending,
            clock,
            ..
        } = self;
        let mut services = Services {
            blueprints,
            host,
            pending,
            frame_time_ms: clock.frame_time_ms(),
        };
        let global = config.object_scope == ObjectScope::Global;

        if let Some(name) = current_screen.as_ref() {
            if let Some(screen) = screens.get_mut(name) {
                let shared = if global { Some(&mut *objects) } else { None };
                screen.game_update(&mut services, shared);
            }
        }

        let Some(store) = active_store(
            config.object_scope,
            objects,
            screens,
            current_screen.as_ref(),
        ) else {
            for mut orphan in services.pending.spawns.drain(..) {
                orphan.release_sprite(&mut *services.host);
            }
            return;
        };

        report.objects_updated = store.update_all(&mut services);
        let spawns = std::mem::take(&mut services.pending.spawns);
        report.spawned = spawns.len();
        for object in spawns {
            store.push(object);
        }
        store.flush_destroy_requests(&mut services);
        report.destroyed = store.sweep(&mut *services.host);
        if report.destroyed > 0 {
            info!(
                destroyed = report.destroyed,
                remaining = store.len(),
                "objects_swept"
            );
        }
    }

    fn record_metrics(&mut self, now_ms: f64, report: &FrameReport) {
        self.metrics
            .record_frame(report.frame_time_ms, report.objects_updated, report.destroyed);
        if let Some(snapshot) = self.metrics.maybe_snapshot(now_ms) {
            info!(
                fps = snapshot.fps,
                frame_time_ms = snapshot.frame_time_ms,
                objects_per_frame = snapshot.objects_per_frame,
                destroyed = snapshot.destroyed,
                "loop_metrics"
            );
            self.last_metrics = Some(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::app::dialog::{ConfirmPrompt, DialogLayout};
    use crate::app::host::HeadlessHost;
    use crate::app::input::Button;
    use crate::app::named_values::ActionKind;

    type Log = Rc<RefCell<Vec<String>>>;

    fn push(log: &Log, entry: impl Into<String>) {
        log.borrow_mut().push(entry.into());
    }

    fn level_engine(config: EngineConfig) -> (Engine, HeadlessHost) {
        let mut engine = Engine::new(config);
        let mut host = HeadlessHost::new();
        engine.create_screen("level");
        engine.set_current_screen("level", &mut host);
        (engine, host)
    }

    fn logged_screen(engine: &mut Engine, name: &'static str, log: &Log) {
        let screen = engine.create_screen(name);
        let on_load = Rc::clone(log);
        screen.on_load(move |_| push(&on_load, format!("{name}:load")));
        let on_show = Rc::clone(log);
        screen.on_show(move |_| push(&on_show, format!("{name}:show")));
        let on_suspend = Rc::clone(log);
        screen.on_suspend(move |_| push(&on_suspend, format!("{name}:suspend")));
    }

    #[test]
    fn first_frame_runs_load_and_update_with_zero_delta() {
        let log = Log::default();
        let (mut engine, mut host) = level_engine(EngineConfig::default());
        let bat = engine.create_blueprint_generic("bat");
        let on_load = Rc::clone(&log);
        bat.on_load(move |_| push(&on_load, "load"));
        let on_update = Rc::clone(&log);
        bat.on_update(move |ctx| push(&on_update, format!("update {}", ctx.frame_time_ms())));
        engine.create_game_object("bat", &mut host).expect("bat");

        host.set_runtime_ms(1000.0);
        let first = engine.update_frame(&mut host);
        host.advance(16.0);
        let second = engine.update_frame(&mut host);

        assert_eq!(first.frame_time_ms, 0.0);
        assert_eq!(first.objects_updated, 1);
        assert_eq!(second.frame_time_ms, 16.0);
        assert_eq!(engine.frame_time(), 16.0);
        assert_eq!(*log.borrow(), ["load", "update 0", "update 16"]);
    }

    #[test]
    fn destroying_twice_fires_callbacks_once() {
        let log = Log::default();
        let (mut engine, mut host) = level_engine(EngineConfig::default());
        let rock = engine.create_blueprint_generic("rock");
        let on_destroy = Rc::clone(&log);
        rock.on_destroy(move |_| push(&on_destroy, "destroyed"));
        let handle = engine.create_game_object("rock", &mut host).expect("rock");

        assert!(engine.destroy_game_object(handle, &mut host));
        assert!(!engine.destroy_game_object(handle, &mut host));
        let report = engine.update_frame(&mut host);

        assert_eq!(report.objects_updated, 0);
        assert_eq!(report.destroyed, 1);
        assert!(engine.game_object(handle).is_none());
        assert!(!engine.destroy_game_object(handle, &mut host));
        assert_eq!(*log.borrow(), ["destroyed"]);
        assert_eq!(host.live_sprite_count(), 0);
    }

    #[test]
    fn destroys_raised_by_destroy_callbacks_finish_before_a_switch() {
        let log = Log::default();
        let mut engine = Engine::default();
        let mut host = HeadlessHost::new();
        engine.create_screen("a");
        engine.create_screen("b");
        engine.set_current_screen("a", &mut host);

        let rock = engine.create_blueprint_generic("rock");
        let on_rock_destroy = Rc::clone(&log);
        rock.on_destroy(move |_| push(&on_rock_destroy, "rock destroyed"));
        let rock = engine.create_game_object("rock", &mut host).expect("rock");
        let boss = engine.create_blueprint_generic("boss");
        let on_boss_destroy = Rc::clone(&log);
        boss.on_destroy(move |ctx| {
            push(&on_boss_destroy, "boss destroyed");
            ctx.destroy(rock);
        });
        let boss = engine.create_game_object("boss", &mut host).expect("boss");

        assert!(engine.destroy_game_object(boss, &mut host));
        assert!(engine.set_current_screen("b", &mut host));
        engine.update_frame(&mut host);
        assert!(engine.set_current_screen("a", &mut host));
        for _ in 0..3 {
            engine.update_frame(&mut host);
        }

        assert!(engine.game_object(rock).is_none());
        assert!(engine.game_object(boss).is_none());
        assert_eq!(*log.borrow(), ["boss destroyed", "rock destroyed"]);
        assert_eq!(host.live_sprite_count(), 0);
    }

    #[test]
    fn attack_pose_ends_the_pass_after_the_duration_runs_out() {
        let (mut engine, mut host) = level_engine(EngineConfig::default());
        engine.create_blueprint_generic("knight");
        let knight = engine.create_game_object("knight", &mut host).expect("knight");

        assert!(engine.can_attack(knight));
        assert!(engine.perform_attack(knight));
        let duration = |engine: &Engine| {
            engine
                .game_object(knight)
                .map(|object| object.data_value(DataKey::ATTACK_DURATION))
        };
        assert_eq!(duration(&engine), Some(300.0));

        for _ in 0..4 {
            engine.update_frame(&mut host);
            host.advance(100.0);
        }
        assert_eq!(duration(&engine), Some(0.0));
        let action = |engine: &Engine| engine.game_object(knight).map(GameObject::action);
        assert_eq!(action(&engine), Some(ActionKind::ATTACK));

        engine.update_frame(&mut host);
        assert_eq!(action(&engine), Some(ActionKind::NONE));
    }

    #[test]
    fn switching_a_to_b_and_back_fires_callbacks_in_order() {
        let log = Log::default();
        let mut engine = Engine::default();
        let mut host = HeadlessHost::new();
        logged_screen(&mut engine, "a", &log);
        logged_screen(&mut engine, "b", &log);

        assert!(engine.set_current_screen("a", &mut host));
        assert!(engine.set_current_screen("b", &mut host));
        assert!(engine.set_current_screen("a", &mut host));
        assert!(!engine.set_current_screen("a", &mut host));
        assert!(!engine.set_current_screen("missing", &mut host));

        assert_eq!(
            *log.borrow(),
            ["a:load", "a:show", "a:suspend", "b:load", "b:show", "b:suspend", "a:show"]
        );
        assert!(engine.current_screen_is("a"));
        assert_eq!(engine.get_screen("b").map(GameScreen::is_suspended), Some(true));
    }

    #[test]
    fn per_screen_spawn_needs_a_current_screen() {
        let mut engine = Engine::default();
        let mut host = HeadlessHost::new();
        engine.create_blueprint_generic("bat");
        engine.create_screen("level");

        assert!(engine.create_game_object("bat", &mut host).is_none());
        engine.set_current_screen("level", &mut host);
        assert!(engine.create_game_object("bat", &mut host).is_some());
        assert!(engine.create_game_object("ghost", &mut host).is_none());
        assert_eq!(host.live_sprite_count(), 1);
    }

    #[test]
    fn per_screen_objects_sleep_while_their_screen_is_away() {
        let mut engine = Engine::default();
        let mut host = HeadlessHost::new();
        engine.create_blueprint_generic("bat");
        engine.create_screen("a");
        engine.create_screen("b");
        engine.set_current_screen("a", &mut host);
        let bat = engine.create_game_object("bat", &mut host).expect("bat");

        engine.set_current_screen("b", &mut host);
        assert_eq!(engine.game_objects().count(), 0);
        assert_eq!(host.live_sprite_count(), 0);
        assert_eq!(engine.update_frame(&mut host).objects_updated, 0);

        engine.set_current_screen("a", &mut host);
        assert!(engine.game_object(bat).is_some_and(|o| o.sprite().is_some()));
        assert_eq!(host.live_sprite_count(), 1);
    }

    #[test]
    fn global_objects_survive_screen_switches() {
        let config = EngineConfig {
            object_scope: ObjectScope::Global,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config);
        let mut host = HeadlessHost::new();
        engine.create_blueprint_generic("bat");
        engine
            .create_screen("a")
            .on_load(|ctx| {
                ctx.spawn("bat");
            });
        engine.create_screen("b");

        engine.set_current_screen("a", &mut host);
        assert_eq!(engine.game_objects().count(), 1);
        engine.set_current_screen("b", &mut host);
        engine.update_frame(&mut host);

        assert_eq!(engine.game_objects().count(), 1);
        assert!(engine.game_objects().all(GameObject::is_initialized));
        assert_eq!(host.live_sprite_count(), 1);
    }

    #[test]
    fn callback_spawns_and_switches_apply_after_the_pass() {
        let mut engine = Engine::default();
        let mut host = HeadlessHost::new();
        engine.create_screen("a");
        engine.create_screen("b");
        engine.set_current_screen("a", &mut host);
        engine.create_blueprint_generic("bat");
        let fired = Rc::new(Cell::new(false));
        let once = Rc::clone(&fired);
        engine
            .create_blueprint_generic("spawner")
            .on_update(move |ctx| {
                if once.replace(true) {
                    return;
                }
                let bat = ctx.spawn("bat").expect("bat blueprint");
                assert!(ctx.find(bat).is_some());
                ctx.switch_screen("b");
            });
        engine.create_game_object("spawner", &mut host);

        let report = engine.update_frame(&mut host);

        assert_eq!(report.objects_updated, 1);
        assert_eq!(report.spawned, 1);
        assert!(report.switched_screen);
        assert!(engine.current_screen_is("b"));
        let a = engine.get_screen("a").expect("screen a");
        assert_eq!(a.objects().len(), 2);
        assert!(a.objects().iter().any(|object| !object.is_initialized()));
    }

    #[test]
    fn open_dialog_holds_object_updates_back() {
        let (mut engine, mut host) = level_engine(EngineConfig::default());
        engine.create_blueprint_generic("bat");
        engine.create_game_object("bat", &mut host);
        let frame = DialogLayout::Full.frame(160, 120);
        let dialog = ModalDialog::new(ConfirmPrompt::new("continue?", frame));
        assert!(engine.open_dialog(dialog, &mut host));
        assert!(!engine.open_dialog(
            ModalDialog::new(ConfirmPrompt::new("again?", frame)),
            &mut host
        ));

        let waiting = engine.update_frame(&mut host);
        host.advance(20.0);
        host.press(Button::A);
        let closing = engine.update_frame(&mut host);
        host.release(Button::A);
        host.advance(20.0);
        let resumed = engine.update_frame(&mut host);

        assert!(waiting.dialog_open && waiting.objects_updated == 0);
        assert!(closing.dialog_open && closing.objects_updated == 0);
        assert_eq!(engine.last_dialog_result(), Some(DialogResult::Confirmed));
        assert!(!engine.dialog_open());
        assert_eq!(resumed.objects_updated, 1);
        assert_eq!(resumed.frame_time_ms, 20.0);
        assert!(host.user_events_enabled());
    }

    #[test]
    fn damage_cooldown_resets_from_the_target_blueprint() {
        let (mut engine, mut host) = level_engine(EngineConfig::default());
        engine
            .create_blueprint_generic("hero")
            .set_data_value(DataKey::DAMAGE, 2.0);
        engine.create_blueprint_generic("slime");
        let hero = engine.create_game_object("hero", &mut host).expect("hero");
        let slime = engine.create_game_object("slime", &mut host).expect("slime");

        assert!(!engine.apply_damage(hero, slime));
        engine
            .game_object_mut(slime)
            .expect("slime")
            .set_data_value(DataKey::DAMAGE_COOLDOWN, 0.0);
        engine
            .get_blueprint_mut("slime")
            .expect("slime blueprint")
            .set_data_value(DataKey::DAMAGE_COOLDOWN, 250.0);

        assert!(engine.apply_damage(hero, slime));
        let slime = engine.game_object(slime).expect("slime");
        assert_eq!(slime.data_value(DataKey::LIFE), 1.0);
        assert_eq!(slime.data_value(DataKey::DAMAGE_COOLDOWN), 250.0);
    }

    #[test]
    fn metrics_snapshot_after_the_interval() {
        let config = EngineConfig {
            metrics_log_interval_ms: 100.0,
            ..EngineConfig::default()
        };
        let (mut engine, mut host) = level_engine(config);
        for _ in 0..4 {
            engine.update_frame(&mut host);
            host.advance(50.0);
        }
        let snapshot = engine.last_metrics().expect("metrics");
        assert!(snapshot.fps > 0.0);
    }
}
