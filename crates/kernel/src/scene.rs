use crate::entity::{DEATH_COLOR, Entity};
use crate::physics::{SimConfig, integrate, is_colliding};
use crate::trigger::{ListenerId, TriggerListeners};
use scenecore_common::EntityId;

/// An event record produced by every mutation of the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Entity was added (or re-inserted by an undo).
    Added { id: EntityId },
    /// Entity was removed.
    Removed { id: EntityId },
    /// Physics advanced one frame.
    Stepped { tick: u64, dt: f32 },
    /// `other` overlapped `trigger` during a step. Repeats every frame the
    /// overlap persists.
    TriggerEntered {
        trigger: EntityId,
        other: EntityId,
        trigger_type: String,
    },
}

/// The mutable scene: placed entities in insertion order plus the trigger
/// listener registry.
///
/// Entities are added and removed by the editor between frames; `update`
/// mutates positions, velocities and colors. Renderers only ever borrow the
/// scene immutably.
#[derive(Debug, Default)]
pub struct Scene {
    entities: Vec<Entity>,
    listeners: TriggerListeners,
    config: SimConfig,
    tick: u64,
    /// Append-only log of mutations, drained by the driver.
    event_log: Vec<SceneEvent>,
}

impl Scene {
    /// Empty scene with default gravity and a floor at y = 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of completed `update` calls.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Read-only, insertion-ordered view of the entities.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Append an entity. Returns its id.
    pub fn add_object(&mut self, entity: Entity) -> EntityId {
        let index = self.entities.len();
        self.insert_object_at(index, entity)
    }

    /// Insert an entity at a position in the list; `index` past the end appends.
    pub fn insert_object_at(&mut self, index: usize, entity: Entity) -> EntityId {
        let id = entity.id;
        tracing::debug!("adding {} {}", entity.object_type, id);
        let index = index.min(self.entities.len());
        self.entities.insert(index, entity);
        self.event_log.push(SceneEvent::Added { id });
        id
    }

    /// Remove an entity and every trigger listener attached to it.
    pub fn remove_object(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        let entity = self.entities.remove(index);
        let dropped = self.listeners.remove_trigger(id);
        tracing::debug!(
            "removed {} {} ({dropped} listeners dropped)",
            entity.object_type,
            id
        );
        self.event_log.push(SceneEvent::Removed { id });
        Some(entity)
    }

    /// Register a callback fired with `(trigger, other)` on every overlap.
    pub fn on_enter_trigger(
        &mut self,
        trigger: EntityId,
        callback: impl FnMut(&Entity, &Entity) + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(trigger, Box::new(callback))
    }

    pub fn remove_listener(&mut self, listener: ListenerId) -> bool {
        self.listeners.unsubscribe(listener)
    }

    pub fn listener_count(&self, trigger: EntityId) -> usize {
        self.listeners.count(trigger)
    }

    /// Advance one frame: integrate physics entities, then run trigger
    /// detection. Returns the number of trigger overlaps found.
    pub fn update(&mut self, dt: f32) -> usize {
        if dt.is_finite() && dt > 0.0 {
            for entity in &mut self.entities {
                integrate(entity, &self.config, dt);
            }
        } else {
            tracing::warn!("skipping integration for dt={dt}");
        }

        let hits = self.detect_triggers();

        self.tick += 1;
        self.event_log.push(SceneEvent::Stepped {
            tick: self.tick,
            dt,
        });
        hits
    }

    /// Exhaustive triggers x non-triggers overlap test, both in insertion order.
    fn detect_triggers(&mut self) -> usize {
        let triggers: Vec<usize> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_trigger())
            .map(|(i, _)| i)
            .collect();
        if triggers.is_empty() {
            return 0;
        }

        let mut hits = 0;
        for other_index in 0..self.entities.len() {
            if self.entities[other_index].is_trigger() {
                continue;
            }
            for &trigger_index in &triggers {
                let trigger = &self.entities[trigger_index];
                let other = &self.entities[other_index];
                if !is_colliding(trigger, other) {
                    continue;
                }
                hits += 1;
                tracing::trace!(
                    "{} entered trigger {} ({})",
                    other.id,
                    trigger.id,
                    trigger.trigger_type
                );
                self.listeners.invoke(trigger, other);
                self.event_log.push(SceneEvent::TriggerEntered {
                    trigger: trigger.id,
                    other: other.id,
                    trigger_type: trigger.trigger_type.clone(),
                });
                if trigger.is_death_trigger() {
                    self.entities[other_index].color = DEATH_COLOR;
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use scenecore_common::ObjectType;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn falling_box(y: f32) -> Entity {
        Entity::new(ObjectType::Box)
            .with_position(Vec3::new(0.0, y, 0.0))
            .with_physics(Vec3::ZERO)
    }

    #[test]
    fn scene_starts_empty() {
        let s = Scene::new();
        assert_eq!(s.tick(), 0);
        assert_eq!(s.entity_count(), 0);
        assert!(s.events().is_empty());
    }

    #[test]
    fn add_and_remove() {
        let mut s = Scene::new();
        let id = s.add_object(Entity::new(ObjectType::Box));
        assert_eq!(s.entity_count(), 1);
        assert!(s.get(id).is_some());

        let removed = s.remove_object(id);
        assert_eq!(removed.map(|e| e.id), Some(id));
        assert_eq!(s.entity_count(), 0);
        assert!(s.remove_object(id).is_none());
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut s = Scene::new();
        let a = s.add_object(Entity::new(ObjectType::Box));
        let b = s.add_object(Entity::new(ObjectType::Sphere));
        let c = s.insert_object_at(1, Entity::new(ObjectType::Triangle));
        let ids: Vec<EntityId> = s.entities().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c, b]);

        let d = s.insert_object_at(99, Entity::new(ObjectType::Circle));
        assert_eq!(s.index_of(d), Some(3));
    }

    #[test]
    fn events_are_recorded() {
        let mut s = Scene::new();
        let id = s.add_object(Entity::new(ObjectType::Box));
        s.update(0.016);
        s.remove_object(id);
        assert_eq!(s.events().len(), 3);
        assert!(matches!(s.events()[1], SceneEvent::Stepped { tick: 1, .. }));

        let drained = s.drain_events();
        assert_eq!(drained.len(), 3);
        assert!(s.events().is_empty());
    }

    #[test]
    fn physics_converges_to_floor() {
        let mut s = Scene::new();
        let id = s.add_object(falling_box(5.0).with_size(Vec3::new(1.0, 2.0, 1.0)));
        for _ in 0..600 {
            s.update(1.0 / 60.0);
            let e = s.get(id).unwrap();
            assert!(e.position.y >= 1.0);
        }
        let e = s.get(id).unwrap();
        assert_eq!(e.position.y, 1.0);
        assert_eq!(e.velocity.y, 0.0);

        // Resting stays resting.
        s.update(1.0 / 60.0);
        let e = s.get(id).unwrap();
        assert_eq!(e.position.y, 1.0);
        assert_eq!(e.velocity.y, 0.0);
    }

    #[test]
    fn floor_height_comes_from_config() {
        let mut s = Scene::with_config(SimConfig {
            gravity: -20.0,
            floor_y: 4.0,
        });
        let id = s.add_object(falling_box(10.0));
        for _ in 0..300 {
            s.update(0.02);
        }
        assert_eq!(s.get(id).unwrap().position.y, 4.5);
    }

    #[test]
    fn non_positive_dt_skips_integration() {
        let mut s = Scene::new();
        let id = s.add_object(falling_box(5.0));
        s.update(0.0);
        s.update(-1.0);
        s.update(f32::NAN);
        assert_eq!(s.get(id).unwrap().position.y, 5.0);
        assert_eq!(s.tick(), 3);
    }

    #[test]
    fn death_trigger_paints_entity_after_one_update() {
        let mut s = Scene::new();
        let victim = s.add_object(
            Entity::new(ObjectType::Box)
                .with_position(Vec3::new(0.0, 0.5, 0.0))
                .with_color(Vec3::new(0.1, 0.9, 0.1)),
        );
        s.add_object(
            Entity::trigger("Death")
                .with_position(Vec3::new(0.5, 0.5, 0.0))
                .with_size(Vec3::ONE),
        );
        let hits = s.update(0.016);
        assert_eq!(hits, 1);
        assert_eq!(s.get(victim).unwrap().color, Vec3::new(0.8, 0.0, 0.0));
    }

    #[test]
    fn other_trigger_types_keep_color() {
        let mut s = Scene::new();
        let color = Vec3::new(0.1, 0.2, 0.3);
        let id = s.add_object(Entity::new(ObjectType::Box).with_color(color));
        s.add_object(Entity::trigger("Checkpoint"));
        assert_eq!(s.update(0.016), 1);
        assert_eq!(s.get(id).unwrap().color, color);
    }

    #[test]
    fn triggers_do_not_trigger_each_other() {
        let mut s = Scene::new();
        let a = s.add_object(Entity::trigger("Death"));
        s.add_object(Entity::trigger("Death"));
        let fired = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&fired);
        s.on_enter_trigger(a, move |_, _| *sink.borrow_mut() += 1);
        assert_eq!(s.update(0.016), 0);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn listener_refires_every_frame_while_overlapping() {
        let mut s = Scene::new();
        s.add_object(Entity::new(ObjectType::PlayerSpawn));
        let t = s.add_object(Entity::trigger("Goal").with_size(Vec3::splat(4.0)));
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        s.on_enter_trigger(t, move |trigger, other| {
            sink.borrow_mut().push((trigger.id, other.object_type));
        });

        for _ in 0..3 {
            s.update(0.016);
        }
        assert_eq!(fired.borrow().len(), 3);
        assert!(fired.borrow().iter().all(|(id, ty)| *id == t && *ty == ObjectType::PlayerSpawn));
    }

    #[test]
    fn trigger_order_is_insertion_order() {
        let mut s = Scene::new();
        let first = s.add_object(Entity::new(ObjectType::Box));
        let t1 = s.add_object(Entity::trigger("A").with_size(Vec3::splat(10.0)));
        let second = s.add_object(Entity::new(ObjectType::Sphere));
        let t2 = s.add_object(Entity::trigger("B").with_size(Vec3::splat(10.0)));

        let order = Rc::new(RefCell::new(Vec::new()));
        for t in [t1, t2] {
            let sink = Rc::clone(&order);
            s.on_enter_trigger(t, move |trigger, other| sink.borrow_mut().push((other.id, trigger.id)));
        }
        s.update(0.016);
        assert_eq!(
            *order.borrow(),
            vec![(first, t1), (first, t2), (second, t1), (second, t2)]
        );
    }

    #[test]
    fn trigger_event_is_logged() {
        let mut s = Scene::new();
        let other = s.add_object(Entity::new(ObjectType::Box));
        let trigger = s.add_object(Entity::trigger("Death"));
        s.drain_events();
        s.update(0.016);
        let expected = SceneEvent::TriggerEntered {
            trigger,
            other,
            trigger_type: "Death".into(),
        };
        assert_eq!(s.events()[0], expected);
    }

    #[test]
    fn falling_body_enters_trigger_on_floor() {
        let mut s = Scene::new();
        let body = s.add_object(falling_box(6.0));
        s.add_object(
            Entity::trigger("death")
                .with_position(Vec3::new(0.0, 0.25, 0.0))
                .with_size(Vec3::new(2.0, 0.5, 2.0)),
        );
        let mut first_hit = None;
        for frame in 0..240 {
            if s.update(1.0 / 60.0) > 0 && first_hit.is_none() {
                first_hit = Some(frame);
            }
        }
        assert!(first_hit.is_some());
        assert_eq!(s.get(body).unwrap().color, DEATH_COLOR);
    }

    #[test]
    fn removing_trigger_drops_listeners() {
        let mut s = Scene::new();
        let t = s.add_object(Entity::trigger("Goal"));
        let listener = s.on_enter_trigger(t, |_, _| {});
        assert_eq!(s.listener_count(t), 1);
        s.remove_object(t);
        assert_eq!(s.listener_count(t), 0);
        assert!(!s.remove_listener(listener));
    }
}
