use super::bitmap::Image;
use super::context::{ObjectCallback, ObjectCallbacks, ObjectContext};
use super::data_bank::DataBank;
use super::keyed_table::KeyedTable;
use super::named_values::{ActionKind, DataKey, Facing, SpriteKind};

/// Frame lists per facing and action. Every facing always has a table, so
/// lookups never fail structurally.
#[derive(Debug, Clone, Default)]
pub struct FrameTable {
    by_facing: [KeyedTable<ActionKind, Vec<Image>>; 4],
}

impl FrameTable {
    pub fn get(&self, facing: Facing, action: ActionKind) -> Option<&[Image]> {
        self.by_facing[facing.index()]
            .get(&action)
            .map(Vec::as_slice)
    }

    pub fn set(&mut self, facing: Facing, action: ActionKind, frames: Vec<Image>) {
        self.by_facing[facing.index()].set(action, frames);
    }

    pub fn contains(&self, facing: Facing, action: ActionKind) -> bool {
        self.by_facing[facing.index()].contains(&action)
    }

    pub fn action_count(&self, facing: Facing) -> usize {
        self.by_facing[facing.index()].len()
    }

    /// True when no facing has any registered action.
    pub fn is_empty(&self) -> bool {
        Facing::ALL
            .iter()
            .all(|facing| self.action_count(*facing) == 0)
    }

    /// Picks the pair whose frames should play for `(facing, action)`:
    /// the exact pair, else `(facing, default_action)`, else
    /// `(default_facing, default_action)`. `None` only when the default pair
    /// itself was never registered.
    pub fn resolve(
        &self,
        facing: Facing,
        action: ActionKind,
        default_facing: Facing,
        default_action: ActionKind,
    ) -> Option<(Facing, ActionKind)> {
        if self.contains(facing, action) {
            return Some((facing, action));
        }
        if self.contains(facing, default_action) {
            return Some((facing, default_action));
        }
        if self.contains(default_facing, default_action) {
            return Some((default_facing, default_action));
        }
        None
    }
}

/// Template a game object is spawned from.
///
/// The data bank holds the initial stat values; objects clone it at spawn, so
/// later edits here only reach objects spawned afterwards.
#[derive(Debug, Clone)]
pub struct Blueprint {
    name: String,
    kind: SpriteKind,
    default_facing: Facing,
    default_action: ActionKind,
    animate_when_idle: bool,
    frames: FrameTable,
    data: DataBank,
    callbacks: ObjectCallbacks,
}

impl Blueprint {
    pub fn new(name: impl Into<String>, kind: SpriteKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default_facing: Facing::Down,
            default_action: ActionKind::NONE,
            animate_when_idle: false,
            frames: FrameTable::default(),
            data: DataBank::with_default_stats(),
            callbacks: ObjectCallbacks::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn kind(&self) -> SpriteKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: SpriteKind) {
        self.kind = kind;
    }

    pub fn default_facing(&self) -> Facing {
        self.default_facing
    }

    pub fn set_default_facing(&mut self, facing: Facing) {
        self.default_facing = facing;
    }

    pub fn default_action(&self) -> ActionKind {
        self.default_action
    }

    pub fn set_default_action(&mut self, action: ActionKind) {
        self.default_action = action;
    }

    pub fn animate_when_idle(&self) -> bool {
        self.animate_when_idle
    }

    pub fn set_animate_when_idle(&mut self, value: bool) {
        self.animate_when_idle = value;
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    /// Frames for `(facing, action)` after fallback. Empty when even the
    /// default pair has nothing registered.
    pub fn images(&self, facing: Facing, action: ActionKind) -> &[Image] {
        self.facing_action_used(facing, action)
            .and_then(|(facing, action)| self.frames.get(facing, action))
            .unwrap_or(&[])
    }

    pub fn facing_action_used(
        &self,
        facing: Facing,
        action: ActionKind,
    ) -> Option<(Facing, ActionKind)> {
        self.frames
            .resolve(facing, action, self.default_facing, self.default_action)
    }

    /// Empty frame lists are accepted; objects treat them as having nothing
    /// to show.
    pub fn set_images(&mut self, facing: Facing, action: ActionKind, frames: Vec<Image>) {
        self.frames.set(facing, action, frames);
    }

    pub fn has_frames(&self, facing: Facing, action: ActionKind) -> bool {
        self.frames.contains(facing, action)
    }

    pub fn default_image(&self) -> Image {
        self.frames
            .get(self.default_facing, self.default_action)
            .and_then(|frames| frames.first())
            .cloned()
            .unwrap_or_default()
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
}

/// Index into a [`BlueprintRegistry`]. Only the registry issues these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlueprintId(usize);

/// Blueprints by name.
///
/// Entries are never removed. Registering a name again points the name at
/// the new blueprint while objects already spawned keep the old one.
#[derive(Debug, Default)]
pub struct BlueprintRegistry {
    by_name: KeyedTable<String, BlueprintId>,
    blueprints: Vec<Blueprint>,
}

impl BlueprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, blueprint: Blueprint) -> BlueprintId {
        let id = BlueprintId(self.blueprints.len());
        self.by_name.set(blueprint.name.clone(), id);
        self.blueprints.push(blueprint);
        id
    }

    pub fn id_of(&self, name: &str) -> Option<BlueprintId> {
        self.by_name
            .iter()
            .find(|(candidate, _)| candidate.as_str() == name)
            .map(|(_, id)| *id)
    }

    pub fn get(&self, id: BlueprintId) -> &Blueprint {
        &self.blueprints[id.0]
    }

    pub fn get_mut(&mut self, id: BlueprintId) -> &mut Blueprint {
        &mut self.blueprints[id.0]
    }

    pub fn by_name(&self, name: &str) -> Option<&Blueprint> {
        self.id_of(name).map(|id| self.get(id))
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Blueprint> {
        let id = self.id_of(name)?;
        Some(self.get_mut(id))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Number of names currently registered.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::bitmap::Color;

    const JUMP: ActionKind = ActionKind(9);

    fn frames(color: Color) -> Vec<Image> {
        vec![Image::filled(8, 8, color), Image::filled(8, 8, Color::BLACK)]
    }

    fn knight() -> Blueprint {
        let mut blueprint = Blueprint::new("knight", SpriteKind(3));
        blueprint.set_images(Facing::Down, ActionKind::NONE, frames(Color::RED));
        blueprint.set_images(Facing::Left, ActionKind::NONE, frames(Color::GREEN));
        blueprint.set_images(Facing::Left, ActionKind::WALK, frames(Color::BLUE));
        blueprint
    }

    #[test]
    fn exact_pair_is_preferred() {
        let blueprint = knight();
        assert_eq!(
            blueprint.facing_action_used(Facing::Left, ActionKind::WALK),
            Some((Facing::Left, ActionKind::WALK))
        );
        assert_eq!(
            blueprint.images(Facing::Left, ActionKind::WALK)[0],
            Image::filled(8, 8, Color::BLUE)
        );
    }

    #[test]
    fn missing_action_falls_back_to_default_action_on_same_facing() {
        let blueprint = knight();
        assert_eq!(
            blueprint.facing_action_used(Facing::Left, JUMP),
            Some((Facing::Left, ActionKind::NONE))
        );
    }

    #[test]
    fn missing_facing_falls_back_to_default_pair() {
        let blueprint = knight();
        assert_eq!(
            blueprint.facing_action_used(Facing::Up, ActionKind::WALK),
            Some((Facing::Down, ActionKind::NONE))
        );
        // Right has no table entries at all, Walk exists only on Left.
        assert_eq!(
            blueprint.facing_action_used(Facing::Right, ActionKind::WALK),
            Some((Facing::Down, ActionKind::NONE))
        );
    }

    #[test]
    fn every_pair_resolves_to_frames_when_default_pair_is_populated() {
        let blueprint = knight();
        for facing in Facing::ALL {
            for (_, action) in ActionKind::BUILTIN {
                assert!(!blueprint.images(facing, action).is_empty());
            }
            assert!(!blueprint.images(facing, JUMP).is_empty());
        }
    }

    #[test]
    fn unresolvable_lookup_yields_empty_slice() {
        let mut blueprint = Blueprint::new("ghost", SpriteKind(0));
        blueprint.set_images(Facing::Up, ActionKind::WALK, frames(Color::WHITE));
        assert!(blueprint.images(Facing::Down, ActionKind::NONE).is_empty());
        assert_eq!(
            blueprint.facing_action_used(Facing::Down, ActionKind::NONE),
            None
        );
    }

    #[test]
    fn empty_frame_list_is_registered_but_has_no_default_image() {
        let mut blueprint = Blueprint::new("logic", SpriteKind(0));
        blueprint.set_images(Facing::Down, ActionKind::NONE, Vec::new());
        assert!(blueprint.has_frames(Facing::Down, ActionKind::NONE));
        assert_eq!(blueprint.default_image(), Image::default());
    }

    #[test]
    fn new_blueprint_starts_with_template_stats() {
        let blueprint = Blueprint::new("slime", SpriteKind(1));
        assert_eq!(blueprint.data_value(DataKey::LIFE), 3.0);
        assert_eq!(blueprint.data_value(DataKey::DAMAGE_COOLDOWN), 1000.0);
        assert_eq!(blueprint.text_value(DataKey(40)), "");
        assert!(!blueprint.flag_value(DataKey(41)));
        assert!(blueprint.frames().is_empty());
    }

    #[test]
    fn registry_reinsert_points_name_at_new_blueprint() {
        let mut registry = BlueprintRegistry::new();
        let first = registry.insert(Blueprint::new("bat", SpriteKind(1)));
        let second = registry.insert(Blueprint::new("bat", SpriteKind(2)));

        assert_ne!(first, second);
        assert_eq!(registry.id_of("bat"), Some(second));
        assert_eq!(registry.get(first).kind(), SpriteKind(1));
        assert_eq!(registry.len(), 1);
        assert!(registry.by_name("owl").is_none());
    }
}
