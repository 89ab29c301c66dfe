use super::blueprint::BlueprintRegistry;
use super::context::{dispatch, Services};
use super::game_object::{GameObject, ObjectHandle};
use super::host::Host;
use super::named_values::SpriteKind;

/// Live objects in registration order plus their pending destroy queue.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: Vec<GameObject>,
    destroy_queue: Vec<ObjectHandle>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.iter_mut()
    }

    pub fn handles(&self) -> Vec<ObjectHandle> {
        self.objects.iter().map(GameObject::handle).collect()
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&GameObject> {
        self.objects.iter().find(|object| object.handle() == handle)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut GameObject> {
        self.objects
            .iter_mut()
            .find(|object| object.handle() == handle)
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.index_of(handle).is_some()
    }

    /// Objects whose blueprint carries `kind`.
    pub fn of_kind<'a>(
        &'a self,
        kind: SpriteKind,
        blueprints: &'a BlueprintRegistry,
    ) -> impl Iterator<Item = &'a GameObject> {
        self.objects
            .iter()
            .filter(move |object| blueprints.get(object.blueprint_id()).kind() == kind)
    }

    pub fn queued_for_destroy(&self) -> usize {
        self.destroy_queue.len()
    }

    fn index_of(&self, handle: ObjectHandle) -> Option<usize> {
        self.objects
            .iter()
            .position(|object| object.handle() == handle)
    }

    pub(crate) fn push(&mut self, object: GameObject) {
        self.objects.push(object);
    }

    pub(crate) fn objects_mut(&mut self) -> &mut [GameObject] {
        &mut self.objects
    }

    pub(crate) fn spawn(
        &mut self,
        blueprint_name: &str,
        services: &mut Services<'_>,
    ) -> Option<ObjectHandle> {
        let blueprints = services.blueprints;
        let id = blueprints.id_of(blueprint_name)?;
        let handle = services.pending.handles.allocate();
        self.objects.push(GameObject::spawn(
            handle,
            id,
            blueprints.get(id),
            &mut *services.host,
        ));
        Some(handle)
    }

    /// Fires the destroy callbacks (instance, then blueprint) and queues the
    /// object. Returns false for unknown objects and repeat requests.
    pub(crate) fn destroy(&mut self, handle: ObjectHandle, services: &mut Services<'_>) -> bool {
        let Some(index) = self.index_of(handle) else {
            return false;
        };
        if self.objects[index].destroy_requested {
            return false;
        }
        self.objects[index].destroy_requested = true;
        self.finish_destroy(index, services);
        true
    }

    pub(crate) fn destroy_all(&mut self, services: &mut Services<'_>) -> usize {
        self.handles()
            .into_iter()
            .filter(|handle| self.destroy(*handle, services))
            .count()
    }

    /// Handles destroy requests made through object contexts. Requests
    /// raised by the callbacks themselves are handled in the same call.
    pub(crate) fn flush_destroy_requests(&mut self, services: &mut Services<'_>) -> usize {
        let mut handled = 0;
        loop {
            let batch = std::mem::take(&mut services.pending.destroys);
            if batch.is_empty() {
                return handled;
            }
            for handle in batch {
                if let Some(index) = self.index_of(handle) {
                    self.finish_destroy(index, services);
                    handled += 1;
                }
            }
        }
    }

    fn finish_destroy(&mut self, index: usize, services: &mut Services<'_>) {
        let object = &self.objects[index];
        let handle = object.handle();
        let blueprint = services.blueprints.get(object.blueprint_id());
        let callbacks = [
            object.callbacks().on_destroy.clone(),
            blueprint.callbacks().on_destroy.clone(),
        ];
        dispatch(&mut self.objects, index, services, &callbacks);
        self.destroy_queue.push(handle);
    }

    /// One update pass in registration order. Objects already flagged for
    /// destruction are skipped. Returns how many objects were updated.
    pub(crate) fn update_all(&mut self, services: &mut Services<'_>) -> usize {
        let blueprints = services.blueprints;
        let mut updated = 0;
        for index in 0..self.objects.len() {
            let object = &mut self.objects[index];
            if object.destroy_requested {
                continue;
            }
            let blueprint = blueprints.get(object.blueprint_id());
            object.update_cooldowns(services.frame_time_ms);
            if object.is_visible(blueprint) {
                object.update_facing(&*services.host);
                object.update_animation(blueprint, &mut *services.host);
            }

            if !object.initialized {
                let on_load = [
                    blueprint.callbacks().on_load.clone(),
                    object.callbacks().on_load.clone(),
                ];
                dispatch(&mut self.objects, index, services, &on_load);
            }
            // Load callbacks may install the instance update hook.
            let on_update = [
                blueprint.callbacks().on_update.clone(),
                self.objects[index].callbacks().on_update.clone(),
            ];
            dispatch(&mut self.objects, index, services, &on_update);

            self.objects[index].initialized = true;
            updated += 1;
        }
        updated
    }

    /// Removes queued objects, last queued first, releasing their sprites.
    pub(crate) fn sweep(&mut self, host: &mut dyn Host) -> usize {
        let mut swept = 0;
        while let Some(handle) = self.destroy_queue.pop() {
            let Some(index) = self.index_of(handle) else {
                continue;
            };
            let mut object = self.objects.remove(index);
            object.release_sprite(host);
            swept += 1;
        }
        swept
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::bitmap::{Color, Image};
    use crate::app::blueprint::Blueprint;
    use crate::app::context::PendingChanges;
    use crate::app::host::HeadlessHost;
    use crate::app::named_values::{ActionKind, Facing};

    type Log = Rc<RefCell<Vec<String>>>;

    fn registry(log: &Log) -> BlueprintRegistry {
        let mut registry = BlueprintRegistry::new();
        let mut bat = Blueprint::new("bat", SpriteKind(1));
        bat.set_images(
            Facing::Down,
            ActionKind::NONE,
            vec![Image::filled(4, 4, Color::PURPLE)],
        );
        let on_load = Rc::clone(log);
        bat.on_load(move |ctx| on_load.borrow_mut().push(format!("load {}", ctx.handle().0)));
        let on_update = Rc::clone(log);
        bat.on_update(move |ctx| {
            on_update
                .borrow_mut()
                .push(format!("update {}", ctx.handle().0))
        });
        let on_destroy = Rc::clone(log);
        bat.on_destroy(move |ctx| {
            on_destroy
                .borrow_mut()
                .push(format!("bp destroy {}", ctx.handle().0))
        });
        registry.insert(bat);
        registry.insert(Blueprint::new("rock", SpriteKind(2)));
        registry
    }

    fn services<'a>(
        blueprints: &'a BlueprintRegistry,
        host: &'a mut HeadlessHost,
        pending: &'a mut PendingChanges,
    ) -> Services<'a> {
        Services {
            blueprints,
            host,
            pending,
            frame_time_ms: 16.0,
        }
    }

    #[test]
    fn first_pass_fires_load_before_update() {
        let log = Log::default();
        let blueprints = registry(&log);
        let mut host = HeadlessHost::new();
        let mut pending = PendingChanges::default();
        let mut store = ObjectStore::new();
        let mut services = services(&blueprints, &mut host, &mut pending);
        let handle = store.spawn("bat", &mut services).expect("bat");

        store.update_all(&mut services);
        store.update_all(&mut services);

        assert!(store.get(handle).expect("bat").is_initialized());
        assert_eq!(
            *log.borrow(),
            vec!["load 0", "update 0", "update 0"]
        );
    }

    #[test]
    fn update_hook_installed_on_load_runs_in_the_same_pass() {
        let log = Log::default();
        let mut blueprints = BlueprintRegistry::new();
        let mut imp = Blueprint::new("imp", SpriteKind(3));
        let hook_log = Rc::clone(&log);
        imp.on_load(move |ctx| {
            let log = Rc::clone(&hook_log);
            ctx.object_mut()
                .on_update(move |ctx| log.borrow_mut().push(format!("hook {}", ctx.handle().0)));
        });
        blueprints.insert(imp);
        let mut host = HeadlessHost::new();
        let mut pending = PendingChanges::default();
        let mut store = ObjectStore::new();
        let mut services = services(&blueprints, &mut host, &mut pending);
        store.spawn("imp", &mut services).expect("imp");

        store.update_all(&mut services);

        assert_eq!(*log.borrow(), vec!["hook 0"]);
    }

    #[test]
    fn destroy_twice_fires_callbacks_once() {
        let log = Log::default();
        let blueprints = registry(&log);
        let mut host = HeadlessHost::new();
        let mut pending = PendingChanges::default();
        let mut store = ObjectStore::new();
        let mut services = services(&blueprints, &mut host, &mut pending);
        let handle = store.spawn("bat", &mut services).expect("bat");
        let instance_log = Rc::clone(&log);
        store
            .get_mut(handle)
            .expect("bat")
            .on_destroy(move |_| instance_log.borrow_mut().push("instance destroy".into()));

        assert!(store.destroy(handle, &mut services));
        assert!(!store.destroy(handle, &mut services));

        assert_eq!(*log.borrow(), vec!["instance destroy", "bp destroy 0"]);
        assert_eq!(store.queued_for_destroy(), 1);
    }

    #[test]
    fn destroyed_object_is_skipped_then_swept() {
        let log = Log::default();
        let blueprints = registry(&log);
        let mut host = HeadlessHost::new();
        let mut pending = PendingChanges::default();
        let mut store = ObjectStore::new();
        let mut services = services(&blueprints, &mut host, &mut pending);
        let first = store.spawn("bat", &mut services).expect("bat");
        let second = store.spawn("rock", &mut services).expect("rock");

        store.destroy(first, &mut services);
        assert_eq!(store.update_all(&mut services), 1);
        assert_eq!(store.sweep(&mut *services.host), 1);

        assert!(!store.contains(first));
        assert!(store.contains(second));
        assert_eq!(host.live_sprite_count(), 1);
    }

    #[test]
    fn sweep_pops_last_queued_first() {
        let log = Log::default();
        let blueprints = registry(&log);
        let mut host = HeadlessHost::new();
        let mut pending = PendingChanges::default();
        let mut store = ObjectStore::new();
        let mut services = services(&blueprints, &mut host, &mut pending);
        for _ in 0..3 {
            store.spawn("rock", &mut services);
        }

        assert_eq!(store.destroy_all(&mut services), 3);
        assert_eq!(store.sweep(&mut *services.host), 3);
        assert!(store.is_empty());
        assert_eq!(store.sweep(&mut *services.host), 0);
    }

    #[test]
    fn of_kind_filters_by_blueprint_kind() {
        let log = Log::default();
        let blueprints = registry(&log);
        let mut host = HeadlessHost::new();
        let mut pending = PendingChanges::default();
        let mut store = ObjectStore::new();
        let mut services = services(&blueprints, &mut host, &mut pending);
        store.spawn("bat", &mut services);
        store.spawn("rock", &mut services);
        store.spawn("bat", &mut services);

        assert_eq!(store.of_kind(SpriteKind(1), &blueprints).count(), 2);
        assert_eq!(store.of_kind(SpriteKind(7), &blueprints).count(), 0);
        assert!(store.spawn("missing", &mut services).is_none());
    }

    #[test]
    fn context_destroy_requests_flush_through_callbacks() {
        let log = Log::default();
        let mut blueprints = registry(&log);
        let mut hunter = Blueprint::new("hunter", SpriteKind(3));
        hunter.on_update(|ctx| {
            let targets: Vec<_> = ctx.others().map(GameObject::handle).collect();
            for target in targets {
                ctx.destroy(target);
                ctx.destroy(target);
            }
        });
        blueprints.insert(hunter);
        let mut host = HeadlessHost::new();
        let mut pending = PendingChanges::default();
        let mut store = ObjectStore::new();
        let mut services = services(&blueprints, &mut host, &mut pending);
        store.spawn("hunter", &mut services);
        let bat = store.spawn("bat", &mut services).expect("bat");

        store.update_all(&mut services);

        assert!(store.get(bat).expect("bat").is_destroy_requested());
        assert_eq!(store.flush_destroy_requests(&mut services), 1);
        assert_eq!(store.sweep(&mut *services.host), 1);
        assert_eq!(*log.borrow(), vec!["bp destroy 1"]);
    }
}
