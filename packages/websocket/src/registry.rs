use std::{
    ptr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use slotmap::{new_key_type, SlotMap};

use crate::{Callback, Error, Event, EventKind};

new_key_type! {
    /// Identifies a bound callback, so it can be unbound.
    pub struct CallbackId;
}

#[derive(Default)]
pub(crate) struct Registry {
    callbacks: SlotMap<CallbackId, (EventKind, Callback)>,
    // Slots get reused, so keep binding order separately.
    order: Vec<CallbackId>,
}

impl Registry {
    pub(crate) fn bind(&mut self, kind: EventKind, callback: Callback) -> Result<CallbackId, Error> {
        let duplicate = self
            .callbacks
            .values()
            .any(|(bound_kind, bound)| *bound_kind == kind && same_callback(bound, &callback));

        if duplicate {
            return Err(Error::DuplicateCallback(kind));
        }

        Ok(self.insert(kind, callback))
    }

    pub(crate) fn insert(&mut self, kind: EventKind, callback: Callback) -> CallbackId {
        let id = self.callbacks.insert((kind, callback));
        self.order.push(id);
        id
    }

    pub(crate) fn unbind(&mut self, id: CallbackId) -> bool {
        self.order.retain(|bound| *bound != id);
        self.callbacks.remove(id).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.callbacks.clear();
        self.order.clear();
    }

    pub(crate) fn is_bound(&self, kind: EventKind) -> bool {
        self.callbacks.values().any(|(bound_kind, _)| *bound_kind == kind)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }

    fn bound(&self, kind: EventKind) -> Vec<Callback> {
        self.order
            .iter()
            .filter_map(|id| self.callbacks.get(*id))
            .filter(|(bound_kind, _)| *bound_kind == kind)
            .map(|(_, callback)| callback.clone())
            .collect()
    }
}

fn same_callback(a: &Callback, b: &Callback) -> bool {
    ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A [`Registry`] shared between a service and its socket task.
#[derive(Clone, Default)]
pub(crate) struct SharedRegistry(Arc<Mutex<Registry>>);

impl SharedRegistry {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Registry> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Call the callbacks bound to the event's kind.
    ///
    /// The lock is released first, so callbacks may bind or unbind.
    pub(crate) fn dispatch(&self, event: &Event) {
        let callbacks = self.lock().bound(event.kind());

        for callback in callbacks {
            callback(event);
        }
    }
}
