//! Weak watcher registrations.
//!
//! Views register a `Weak` handle and get back a [`WatcherId`]. Dropping the view is enough to stop
//! notifications; dead entries are pruned on the next broadcast. Ids carry a generation so a
//! recycled slot never answers to a stale id.

use std::rc::{Rc, Weak};

use core_text::Point;
use tracing::trace;

/// Change callbacks. Both fire synchronously after the mutating call finished; implementations
/// must not mutate the document from inside them.
pub trait DocumentWatcher {
    /// Text between `left` and `old_right` was replaced by text ending at `new_right`.
    /// `origin` is the watcher that caused the change, if any.
    fn on_text_changed(&self, origin: Option<WatcherId>, left: Point, old_right: Point, new_right: Point);

    fn on_bookmark_changed(&self, origin: Option<WatcherId>, line: usize, tag: u8) {
        let _ = (origin, line, tag);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId {
    slot: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    watcher: Option<Weak<dyn DocumentWatcher>>,
}

#[derive(Default)]
pub struct WatcherRegistry {
    slots: Vec<Slot>,
}

impl WatcherRegistry {
    pub fn attach(&mut self, watcher: Weak<dyn DocumentWatcher>) -> WatcherId {
        if let Some((idx, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.watcher.is_none())
        {
            slot.generation = slot.generation.wrapping_add(1);
            slot.watcher = Some(watcher);
            return WatcherId {
                slot: idx as u32,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            watcher: Some(watcher),
        });
        WatcherId {
            slot: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Returns `false` when `id` was already gone.
    pub fn detach(&mut self, id: WatcherId) -> bool {
        match self.slots.get_mut(id.slot as usize) {
            Some(slot) if slot.generation == id.generation && slot.watcher.is_some() => {
                slot.watcher = None;
                true
            }
            _ => false,
        }
    }

    /// Number of registrations whose watcher is still alive.
    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|s| s.watcher.as_ref())
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    fn live(&mut self) -> Vec<Rc<dyn DocumentWatcher>> {
        let mut out = Vec::with_capacity(self.slots.len());
        let mut pruned = 0usize;
        for slot in &mut self.slots {
            let Some(weak) = &slot.watcher else { continue };
            match weak.upgrade() {
                Some(rc) => out.push(rc),
                None => {
                    slot.watcher = None;
                    pruned += 1;
                }
            }
        }
        if pruned > 0 {
            trace!(target: "state.edit", pruned, "watchers_pruned");
        }
        out
    }

    pub fn notify_text(&mut self, origin: Option<WatcherId>, left: Point, old_right: Point, new_right: Point) {
        for watcher in self.live() {
            watcher.on_text_changed(origin, left, old_right, new_right);
        }
    }

    pub fn notify_bookmark(&mut self, origin: Option<WatcherId>, line: usize, tag: u8) {
        for watcher in self.live() {
            watcher.on_bookmark_changed(origin, line, tag);
        }
    }
}
