//! What lifecycle callbacks get to work with.
//!
//! Object callbacks run with the object borrowed mutably next to the rest of
//! its collection. Spawns made from inside a pass join the collection after
//! the pass; destroy requests are honoured before the sweep; screen switches
//! wait for the end of the frame.

use std::fmt;
use std::rc::Rc;

use super::blueprint::{Blueprint, BlueprintRegistry};
use super::dialog::ModalDialog;
use super::game_object::{
    can_attack, perform_attack, receive_damage, GameObject, ObjectHandle, ObjectHandleAllocator,
};
use super::host::{Host, Sprite};
use super::named_values::{DataKey, SpriteKind};
use super::object_store::ObjectStore;

#[derive(Clone)]
pub struct ObjectCallback(Rc<dyn Fn(&mut ObjectContext<'_>)>);

impl ObjectCallback {
    pub fn new(callback: impl Fn(&mut ObjectContext<'_>) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, ctx: &mut ObjectContext<'_>) {
        (self.0)(ctx)
    }
}

impl fmt::Debug for ObjectCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObjectCallback")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectCallbacks {
    pub on_load: Option<ObjectCallback>,
    pub on_update: Option<ObjectCallback>,
    pub on_destroy: Option<ObjectCallback>,
}

#[derive(Clone)]
pub struct ScreenCallback(Rc<dyn Fn(&mut ScreenContext<'_>)>);

impl ScreenCallback {
    pub fn new(callback: impl Fn(&mut ScreenContext<'_>) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, ctx: &mut ScreenContext<'_>) {
        (self.0)(ctx)
    }
}

impl fmt::Debug for ScreenCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScreenCallback")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScreenCallbacks {
    pub on_load: Option<ScreenCallback>,
    pub on_show: Option<ScreenCallback>,
    pub on_suspend: Option<ScreenCallback>,
    pub on_game_update: Option<ScreenCallback>,
}

/// Work deferred until the engine is free to apply it.
#[derive(Debug, Default)]
pub(crate) struct PendingChanges {
    pub(crate) handles: ObjectHandleAllocator,
    pub(crate) spawns: Vec<GameObject>,
    pub(crate) destroys: Vec<ObjectHandle>,
    pub(crate) switch_to: Option<String>,
    pub(crate) dialog: Option<ModalDialog>,
}

/// Engine state every callback may reach.
pub(crate) struct Services<'a> {
    pub(crate) blueprints: &'a BlueprintRegistry,
    pub(crate) host: &'a mut dyn Host,
    pub(crate) pending: &'a mut PendingChanges,
    pub(crate) frame_time_ms: f32,
}

impl<'a> Services<'a> {
    pub(crate) fn reborrow(&mut self) -> Services<'_> {
        Services {
            blueprints: self.blueprints,
            host: &mut *self.host,
            pending: &mut *self.pending,
            frame_time_ms: self.frame_time_ms,
        }
    }
}

/// Runs `callbacks` in order against `objects[index]`.
pub(crate) fn dispatch(
    objects: &mut [GameObject],
    index: usize,
    services: &mut Services<'_>,
    callbacks: &[Option<ObjectCallback>],
) {
    if callbacks.iter().all(Option::is_none) {
        return;
    }
    let Some(mut ctx) = ObjectContext::split(objects, index, services.reborrow()) else {
        return;
    };
    for callback in callbacks.iter().flatten() {
        callback.call(&mut ctx);
    }
}

pub struct ObjectContext<'a> {
    object: &'a mut GameObject,
    before: &'a mut [GameObject],
    after: &'a mut [GameObject],
    services: Services<'a>,
}

impl<'a> ObjectContext<'a> {
    pub(crate) fn split(
        objects: &'a mut [GameObject],
        index: usize,
        services: Services<'a>,
    ) -> Option<Self> {
        if index >= objects.len() {
            return None;
        }
        let (before, rest) = objects.split_at_mut(index);
        let (object, after) = rest.split_first_mut()?;
        Some(Self {
            object,
            before,
            after,
            services,
        })
    }

    pub fn object(&self) -> &GameObject {
        &*self.object
    }

    pub fn object_mut(&mut self) -> &mut GameObject {
        &mut *self.object
    }

    pub fn handle(&self) -> ObjectHandle {
        self.object.handle()
    }

    pub fn blueprint(&self) -> &Blueprint {
        self.services.blueprints.get(self.object.blueprint_id())
    }

    pub fn blueprints(&self) -> &BlueprintRegistry {
        self.services.blueprints
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.services.host
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.object.host_sprite(&*self.services.host)
    }

    pub fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        let sprite = self.object.sprite()?;
        self.services.host.sprite_mut(sprite)
    }

    /// Milliseconds since the previous frame.
    pub fn frame_time_ms(&self) -> f32 {
        self.services.frame_time_ms
    }

    /// Every other object of the collection, in update order.
    pub fn others(&self) -> impl Iterator<Item = &GameObject> {
        self.before.iter().chain(self.after.iter())
    }

    /// Looks up another object, including ones spawned earlier in this pass.
    /// The object being updated is reached through [`Self::object`].
    pub fn find(&self, handle: ObjectHandle) -> Option<&GameObject> {
        self.before
            .iter()
            .chain(self.after.iter())
            .chain(self.services.pending.spawns.iter())
            .find(|object| object.handle() == handle)
    }

    pub fn find_mut(&mut self, handle: ObjectHandle) -> Option<&mut GameObject> {
        self.before
            .iter_mut()
            .chain(self.after.iter_mut())
            .chain(self.services.pending.spawns.iter_mut())
            .find(|object| object.handle() == handle)
    }

    /// Live objects whose sprite overlaps this object's sprite, optionally
    /// restricted to one sprite kind.
    pub fn overlapping(&self, kind: Option<SpriteKind>) -> Vec<ObjectHandle> {
        let host: &dyn Host = &*self.services.host;
        let blueprints = self.services.blueprints;
        self.others()
            .filter(|other| !other.is_destroy_requested())
            .filter(|other| {
                kind.map_or(true, |kind| blueprints.get(other.blueprint_id()).kind() == kind)
            })
            .filter(|other| self.object.overlaps(other, host))
            .map(GameObject::handle)
            .collect()
    }

    pub fn spawn(&mut self, blueprint_name: &str) -> Option<ObjectHandle> {
        let blueprints = self.services.blueprints;
        let id = blueprints.id_of(blueprint_name)?;
        let handle = self.services.pending.handles.allocate();
        let object = GameObject::spawn(handle, id, blueprints.get(id), &mut *self.services.host);
        self.services.pending.spawns.push(object);
        Some(handle)
    }

    pub fn destroy_self(&mut self) -> bool {
        request_destroy(self.object, self.services.pending)
    }

    pub fn destroy(&mut self, handle: ObjectHandle) -> bool {
        if handle == self.object.handle() {
            return self.destroy_self();
        }
        let pending = &mut *self.services.pending;
        let target = self
            .before
            .iter_mut()
            .chain(self.after.iter_mut())
            .chain(pending.spawns.iter_mut())
            .find(|object| object.handle() == handle);
        match target {
            Some(target) if !target.destroy_requested => {
                target.destroy_requested = true;
                pending.destroys.push(handle);
                true
            }
            _ => false,
        }
    }

    pub fn can_attack(&self) -> bool {
        can_attack(&*self.object)
    }

    pub fn perform_attack(&mut self) -> bool {
        let blueprints = self.services.blueprints;
        let blueprint = blueprints.get(self.object.blueprint_id());
        perform_attack(self.object, blueprint)
    }

    /// This object damages `target`.
    pub fn apply_damage_to(&mut self, target: ObjectHandle) -> bool {
        let damage = self.object.data_value(DataKey::DAMAGE);
        let blueprints = self.services.blueprints;
        match self.find_mut(target) {
            Some(target) => {
                let blueprint = blueprints.get(target.blueprint_id());
                receive_damage(target, damage, blueprint)
            }
            None => false,
        }
    }

    /// `source` damages this object.
    pub fn take_damage_from(&mut self, source: ObjectHandle) -> bool {
        let Some(damage) = self
            .find(source)
            .map(|source| source.data_value(DataKey::DAMAGE))
        else {
            return false;
        };
        let blueprints = self.services.blueprints;
        let blueprint = blueprints.get(self.object.blueprint_id());
        receive_damage(self.object, damage, blueprint)
    }

    /// Applied at the end of the frame.
    pub fn switch_screen(&mut self, name: impl Into<String>) {
        self.services.pending.switch_to = Some(name.into());
    }

    /// Opens at the end of the frame unless another dialog is already up.
    pub fn open_dialog(&mut self, dialog: ModalDialog) {
        self.services.pending.dialog = Some(dialog);
    }
}

fn request_destroy(object: &mut GameObject, pending: &mut PendingChanges) -> bool {
    if object.destroy_requested {
        return false;
    }
    object.destroy_requested = true;
    pending.destroys.push(object.handle());
    true
}

pub struct ScreenContext<'a> {
    screen: &'a str,
    objects: &'a mut ObjectStore,
    services: Services<'a>,
}

impl<'a> ScreenContext<'a> {
    pub(crate) fn new(
        screen: &'a str,
        objects: &'a mut ObjectStore,
        services: Services<'a>,
    ) -> Self {
        Self {
            screen,
            objects,
            services,
        }
    }

    pub fn screen_name(&self) -> &str {
        self.screen
    }

    pub fn objects(&self) -> &ObjectStore {
        &*self.objects
    }

    pub fn find(&self, handle: ObjectHandle) -> Option<&GameObject> {
        self.objects.get(handle)
    }

    pub fn find_mut(&mut self, handle: ObjectHandle) -> Option<&mut GameObject> {
        self.objects.get_mut(handle)
    }

    pub fn blueprints(&self) -> &BlueprintRegistry {
        self.services.blueprints
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.services.host
    }

    /// Spawns straight into this screen.
    pub fn spawn(&mut self, blueprint_name: &str) -> Option<ObjectHandle> {
        self.objects.spawn(blueprint_name, &mut self.services)
    }

    /// Fires the object's destroy callbacks now and queues it for the sweep.
    pub fn destroy(&mut self, handle: ObjectHandle) -> bool {
        self.objects.destroy(handle, &mut self.services)
    }

    pub fn destroy_all(&mut self) -> usize {
        self.objects.destroy_all(&mut self.services)
    }

    /// Applied at the end of the frame.
    pub fn switch_screen(&mut self, name: impl Into<String>) {
        self.services.pending.switch_to = Some(name.into());
    }

    /// Opens at the end of the frame unless another dialog is already up.
    pub fn open_dialog(&mut self, dialog: ModalDialog) {
        self.services.pending.dialog = Some(dialog);
    }
}
