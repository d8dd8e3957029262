use crate::entity::Entity;
use scenecore_common::EntityId;
use std::collections::HashMap;
use std::fmt;

/// Callback invoked with `(trigger, other)` each frame their bounds overlap.
pub type TriggerCallback = Box<dyn FnMut(&Entity, &Entity)>;

/// Handle returned when a listener is registered; used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

struct Listener {
    id: ListenerId,
    callback: TriggerCallback,
}

/// Per-trigger listener lists, invoked in registration order.
///
/// A trigger with no entry simply has nothing to invoke.
#[derive(Default)]
pub struct TriggerListeners {
    by_trigger: HashMap<EntityId, Vec<Listener>>,
    next_id: u64,
}

impl TriggerListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, trigger: EntityId, callback: TriggerCallback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.by_trigger
            .entry(trigger)
            .or_default()
            .push(Listener { id, callback });
        id
    }

    /// Remove one listener. Returns false if the handle is unknown.
    pub fn unsubscribe(&mut self, listener: ListenerId) -> bool {
        let mut emptied = None;
        let mut found = false;
        for (trigger, list) in self.by_trigger.iter_mut() {
            if let Some(pos) = list.iter().position(|l| l.id == listener) {
                list.remove(pos);
                found = true;
                if list.is_empty() {
                    emptied = Some(*trigger);
                }
                break;
            }
        }
        if let Some(trigger) = emptied {
            self.by_trigger.remove(&trigger);
        }
        found
    }

    /// Drop every listener of a trigger (the trigger left the scene).
    pub fn remove_trigger(&mut self, trigger: EntityId) -> usize {
        self.by_trigger.remove(&trigger).map_or(0, |l| l.len())
    }

    pub fn count(&self, trigger: EntityId) -> usize {
        self.by_trigger.get(&trigger).map_or(0, Vec::len)
    }

    pub fn invoke(&mut self, trigger: &Entity, other: &Entity) {
        let Some(list) = self.by_trigger.get_mut(&trigger.id) else {
            return;
        };
        for listener in list.iter_mut() {
            (listener.callback)(trigger, other);
        }
    }
}

impl fmt::Debug for TriggerListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total: usize = self.by_trigger.values().map(Vec::len).sum();
        f.debug_struct("TriggerListeners")
            .field("triggers", &self.by_trigger.len())
            .field("listeners", &total)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenecore_common::ObjectType;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn invoke_without_listeners_is_noop() {
        let mut listeners = TriggerListeners::new();
        let t = Entity::trigger("Death");
        let other = Entity::new(ObjectType::Box);
        listeners.invoke(&t, &other);
        assert_eq!(listeners.count(t.id), 0);
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let mut listeners = TriggerListeners::new();
        let t = Entity::trigger("Goal");
        let other = Entity::new(ObjectType::Sphere);
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            listeners.subscribe(t.id, Box::new(move |_: &Entity, _: &Entity| log.borrow_mut().push(tag)));
        }
        listeners.invoke(&t, &other);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn callback_receives_trigger_then_other() {
        let mut listeners = TriggerListeners::new();
        let t = Entity::trigger("Goal");
        let other = Entity::new(ObjectType::Box);
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        listeners.subscribe(
            t.id,
            Box::new(move |trigger: &Entity, hit: &Entity| {
                *sink.borrow_mut() = Some((trigger.id, hit.id))
            }),
        );
        listeners.invoke(&t, &other);
        assert_eq!(*seen.borrow(), Some((t.id, other.id)));
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let mut listeners = TriggerListeners::new();
        let t = Entity::trigger("Goal");
        let hits = Rc::new(RefCell::new(0));
        let h1 = Rc::clone(&hits);
        let h2 = Rc::clone(&hits);
        let first = listeners.subscribe(t.id, Box::new(move |_: &Entity, _: &Entity| *h1.borrow_mut() += 1));
        listeners.subscribe(t.id, Box::new(move |_: &Entity, _: &Entity| *h2.borrow_mut() += 10));

        assert!(listeners.unsubscribe(first));
        assert!(!listeners.unsubscribe(first));
        listeners.invoke(&t, &Entity::new(ObjectType::Box));
        assert_eq!(*hits.borrow(), 10);
    }

    #[test]
    fn remove_trigger_drops_its_listeners() {
        let mut listeners = TriggerListeners::new();
        let t = Entity::trigger("Goal");
        listeners.subscribe(t.id, Box::new(|_: &Entity, _: &Entity| {}));
        listeners.subscribe(t.id, Box::new(|_: &Entity, _: &Entity| {}));
        assert_eq!(listeners.remove_trigger(t.id), 2);
        assert_eq!(listeners.count(t.id), 0);
    }
}
