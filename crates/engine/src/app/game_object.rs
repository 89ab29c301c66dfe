use super::blueprint::{Blueprint, BlueprintId};
use super::context::{ObjectCallback, ObjectCallbacks, ObjectContext};
use super::data_bank::DataBank;
use super::host::{AnimationCategory, AnimationHandle, Host, Sprite, SpriteHandle};
use super::named_values::{ActionKind, DataKey, Facing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

#[derive(Debug, Default)]
pub struct ObjectHandleAllocator {
    next: u64,
}

impl ObjectHandleAllocator {
    pub fn allocate(&mut self) -> ObjectHandle {
        let handle = ObjectHandle(self.next);
        self.next = self.next.saturating_add(1);
        handle
    }
}

/// Live instance of a [`Blueprint`].
///
/// Owns its host sprite while alive and not suspended. Destruction is
/// deferred: a destroyed object stays in its store, skipped by updates,
/// until the destroy queue is swept.
#[derive(Debug)]
pub struct GameObject {
    handle: ObjectHandle,
    id: String,
    blueprint: BlueprintId,
    pub(crate) sprite: Option<SpriteHandle>,
    pub(crate) animation: Option<AnimationHandle>,
    facing: Facing,
    was_facing: Facing,
    action: ActionKind,
    was_action: ActionKind,
    action_changed: bool,
    was_attack_animated: bool,
    data: DataBank,
    is_moving: bool,
    pub(crate) initialized: bool,
    animate_when_idle: bool,
    auto_walk: bool,
    pub(crate) destroy_requested: bool,
    callbacks: ObjectCallbacks,
}

impl GameObject {
    /// Creates the object and its sprite, showing the blueprint's default
    /// image under the blueprint's kind.
    pub fn spawn(
        handle: ObjectHandle,
        blueprint_id: BlueprintId,
        blueprint: &Blueprint,
        host: &mut dyn Host,
    ) -> Self {
        let sprite = host.create_sprite(blueprint.default_image(), blueprint.kind());
        Self {
            handle,
            id: blueprint.name().to_string(),
            blueprint: blueprint_id,
            sprite: Some(sprite),
            animation: None,
            facing: blueprint.default_facing(),
            was_facing: blueprint.default_facing(),
            action: blueprint.default_action(),
            was_action: blueprint.default_action(),
            action_changed: false,
            was_attack_animated: false,
            data: blueprint.data_bank().clone(),
            is_moving: false,
            initialized: false,
            animate_when_idle: blueprint.animate_when_idle(),
            auto_walk: true,
            destroy_requested: false,
            callbacks: ObjectCallbacks::default(),
        }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn blueprint_id(&self) -> BlueprintId {
        self.blueprint
    }

    pub fn sprite(&self) -> Option<SpriteHandle> {
        self.sprite
    }

    pub fn animation(&self) -> Option<AnimationHandle> {
        self.animation
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn set_action(&mut self, action: ActionKind) {
        self.action = action;
    }

    /// Whether the action differed from the previous animation step.
    pub fn action_changed(&self) -> bool {
        self.action_changed
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_destroy_requested(&self) -> bool {
        self.destroy_requested
    }

    pub fn animate_when_idle(&self) -> bool {
        self.animate_when_idle
    }

    pub fn set_animate_when_idle(&mut self, value: bool) {
        self.animate_when_idle = value;
    }

    pub fn auto_walk(&self) -> bool {
        self.auto_walk
    }

    pub fn set_auto_walk(&mut self, value: bool) {
        self.auto_walk = value;
    }

    pub fn data_bank(&self) -> &DataBank {
        &self.data
    }

    pub fn data_bank_mut(&mut self) -> &mut DataBank {
        &mut self.data
    }

    pub fn data_value(&self, key: DataKey) -> f32 {
        self.data.number(key)
    }

    pub fn set_data_value(&mut self, key: DataKey, value: f32) {
        self.data.set_number(key, value);
    }

    pub fn text_value(&self, key: DataKey) -> &str {
        self.data.text(key)
    }

    pub fn set_text_value(&mut self, key: DataKey, value: impl Into<String>) {
        self.data.set_text(key, value);
    }

    pub fn flag_value(&self, key: DataKey) -> bool {
        self.data.flag(key)
    }

    pub fn set_flag_value(&mut self, key: DataKey, value: bool) {
        self.data.set_flag(key, value);
    }

    pub fn callbacks(&self) -> &ObjectCallbacks {
        &self.callbacks
    }

    pub fn on_load(&mut self, callback: impl Fn(&mut ObjectContext<'_>) + 'static) {
        self.callbacks.on_load = Some(ObjectCallback::new(callback));
    }

    pub fn on_update(&mut self, callback: impl Fn(&mut ObjectContext<'_>) + 'static) {
        self.callbacks.on_update = Some(ObjectCallback::new(callback));
    }

    pub fn on_destroy(&mut self, callback: impl Fn(&mut ObjectContext<'_>) + 'static) {
        self.callbacks.on_destroy = Some(ObjectCallback::new(callback));
    }

    pub fn host_sprite<'h>(&self, host: &'h dyn Host) -> Option<&'h Sprite> {
        self.sprite.and_then(|sprite| host.sprite(sprite))
    }

    pub fn overlaps(&self, other: &GameObject, host: &dyn Host) -> bool {
        match (self.sprite, other.sprite) {
            (Some(a), Some(b)) => host.overlaps(a, b),
            _ => false,
        }
    }

    /// Objects whose blueprint registers no action for any facing are pure
    /// logic actors: facing and animation are never touched.
    pub fn is_visible(&self, blueprint: &Blueprint) -> bool {
        !blueprint.frames().is_empty()
    }

    /// Counts the timer values down by `frame_time_ms`. An expired attack
    /// duration ends the attack pose on the following pass.
    pub fn update_cooldowns(&mut self, frame_time_ms: f32) {
        for key in DataKey::TIMERS {
            let Some(remaining) = self.data.numbers.get(&key).copied() else {
                continue;
            };
            if remaining > 0.0 {
                let next = remaining - frame_time_ms;
                // NaN fails the comparison and lands on zero.
                let next = if next > 0.0 { next } else { 0.0 };
                self.data.set_number(key, next);
                continue;
            }
            if remaining.is_nan() {
                self.data.set_number(key, 0.0);
            }
            if key == DataKey::ATTACK_DURATION && self.action == ActionKind::ATTACK {
                self.action = ActionKind::NONE;
            }
        }
    }

    /// Derives facing from the sprite velocity. Horizontal wins over
    /// vertical; standing still keeps the last facing.
    pub fn update_facing(&mut self, host: &dyn Host) {
        self.was_facing = self.facing;
        self.is_moving = false;
        let Some(sprite) = self.host_sprite(host) else {
            return;
        };
        let (vx, vy) = (sprite.vx, sprite.vy);
        let facing = if vx > 0.0 {
            Some(Facing::Right)
        } else if vx < 0.0 {
            Some(Facing::Left)
        } else if vy < 0.0 {
            Some(Facing::Up)
        } else if vy > 0.0 {
            Some(Facing::Down)
        } else {
            None
        };
        if let Some(facing) = facing {
            self.facing = facing;
            self.is_moving = true;
        }
    }

    pub fn update_animation(&mut self, blueprint: &Blueprint, host: &mut dyn Host) {
        let Some(sprite) = self.sprite else {
            return;
        };
        let attack_animated = self.action == ActionKind::ATTACK
            && blueprint.has_frames(self.facing, ActionKind::ATTACK);
        if self.auto_walk && !attack_animated {
            self.action = if self.is_moving {
                ActionKind::WALK
            } else {
                ActionKind::NONE
            };
        }

        self.action_changed = self.action != self.was_action;
        let facing_changed = self.facing != self.was_facing;
        let should_animate = self.animate_when_idle || self.is_moving || attack_animated;
        let restart = should_animate
            && (self.animation.is_none()
                || facing_changed
                || (self.action_changed && attack_animated));
        let attack_ended_in_walk = self.was_attack_animated
            && !attack_animated
            && self.action == ActionKind::WALK;

        if restart {
            self.start_animation(sprite, blueprint, host);
        } else if (!should_animate && self.animation.is_some()) || attack_ended_in_walk {
            self.stop_animation(sprite, host);
            if let Some(first) = blueprint.images(self.facing, self.action).first() {
                if let Some(state) = host.sprite_mut(sprite) {
                    state.set_image(first.clone());
                }
            }
        }

        self.was_action = self.action;
        self.was_attack_animated = attack_animated;
    }

    fn start_animation(
        &mut self,
        sprite: SpriteHandle,
        blueprint: &Blueprint,
        host: &mut dyn Host,
    ) {
        self.stop_animation(sprite, host);
        let frames = blueprint.images(self.facing, self.action);
        if frames.is_empty() {
            return;
        }
        let interval = frame_interval_ms(
            frames.len(),
            self.data_value(DataKey::ANIMATE_RATE),
            self.data_value(DataKey::SPEED),
        );
        self.animation = Some(host.start_animation(sprite, frames, interval, true));
    }

    fn stop_animation(&mut self, sprite: SpriteHandle, host: &mut dyn Host) {
        if self.animation.take().is_some() {
            host.stop_animation(sprite, AnimationCategory::Image);
        }
    }

    /// Stops everything running on the sprite and hands it back to the host.
    pub(crate) fn release_sprite(&mut self, host: &mut dyn Host) {
        if let Some(sprite) = self.sprite.take() {
            host.stop_animation(sprite, AnimationCategory::All);
            host.destroy_sprite(sprite);
        }
        self.animation = None;
    }
}

/// Base frame duration `1000 / frame_count` scaled by `animate_rate / speed`.
/// Falls back to the base duration when speed is not positive or the scaled
/// value is unusable.
pub fn frame_interval_ms(frame_count: usize, animate_rate: f32, speed: f32) -> f32 {
    let base = 1000.0 / frame_count.max(1) as f32;
    if speed <= 0.0 {
        return base;
    }
    let scaled = base * (animate_rate / speed);
    if scaled.is_finite() && scaled > 0.0 {
        scaled
    } else {
        base
    }
}

pub fn can_attack(object: &GameObject) -> bool {
    object.data_value(DataKey::ATTACK_COOLDOWN) <= 0.0
}

/// Starts an attack if the cooldown allows it. The duration comes from the
/// blueprint and shrinks as speed grows.
pub fn perform_attack(object: &mut GameObject, blueprint: &Blueprint) -> bool {
    if !can_attack(object) {
        return false;
    }
    object.action = ActionKind::ATTACK;
    object.set_data_value(
        DataKey::ATTACK_COOLDOWN,
        blueprint.data_value(DataKey::ATTACK_COOLDOWN),
    );
    let duration = blueprint.data_value(DataKey::ATTACK_DURATION);
    let speed = object.data_value(DataKey::SPEED);
    let duration = if speed > 0.0 {
        duration * (100.0 / speed)
    } else {
        duration
    };
    object.set_data_value(DataKey::ATTACK_DURATION, duration);
    true
}

/// Subtracts `source`'s Damage from `target`'s Life unless the target is
/// still cooling down. The cooldown is reset from the target's blueprint.
pub fn apply_damage(
    source: &GameObject,
    target: &mut GameObject,
    target_blueprint: &Blueprint,
) -> bool {
    receive_damage(target, source.data_value(DataKey::DAMAGE), target_blueprint)
}

pub(crate) fn receive_damage(
    target: &mut GameObject,
    damage: f32,
    target_blueprint: &Blueprint,
) -> bool {
    if target.data_value(DataKey::DAMAGE_COOLDOWN) > 0.0 {
        return false;
    }
    let life = target.data_value(DataKey::LIFE);
    target.set_data_value(DataKey::LIFE, life - damage);
    target.set_data_value(
        DataKey::DAMAGE_COOLDOWN,
        target_blueprint.data_value(DataKey::DAMAGE_COOLDOWN),
    );
    true
}
