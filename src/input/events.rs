use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::mpsc;

use crate::assets::manifest::Slot;
use crate::foundation::core::{Placement, Vec2};

/// Named input events produced by the UI collaborators around the core.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Key pressed (DOM `code`, e.g. `ArrowUp`, `KeyW`).
    KeyDown {
        /// Key code.
        code: String,
        /// Auto-repeat press.
        repeat: bool,
    },
    /// Key released.
    KeyUp {
        /// Key code.
        code: String,
    },
    /// View lost focus; every key counts as released.
    Blur,
    /// View regained focus or visibility.
    Focus,
    /// Pointer moved, in device (viewport) pixels.
    PointerMove(Vec2),
    /// Primary action.
    Click,
    /// Outline color changed (`#RRGGBB[AA]`).
    OutlineColor(String),
    /// Outline thickness changed.
    OutlineThickness(f64),
    /// Body color changed (`#RRGGBB[AA]`).
    BodyColor(String),
    /// Slot selection changed.
    Equip {
        /// Slot.
        slot: Slot,
        /// Asset key, `None` to clear the slot.
        key: Option<String>,
    },
    /// Display name changed.
    Name(String),
    /// User picked a file for a slot.
    Upload {
        /// Slot the file goes into.
        slot: Slot,
        /// Original file name.
        file_name: String,
        /// Reported MIME type.
        mime: String,
        /// File contents.
        bytes: Arc<[u8]>,
    },
    /// Externally edited placement for an attachment.
    SetPlacement {
        /// Asset key.
        key: String,
        /// New placement.
        placement: Placement,
    },
    /// Pick random equipment and body color.
    Randomize,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    senders: Vec<(u64, mpsc::Sender<InputEvent>)>,
}

/// Single-threaded broadcast of [`InputEvent`]s to scoped subscribers.
#[derive(Clone, Debug, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    /// Bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; it is removed again when the returned handle drops.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let mut reg = self.registry.borrow_mut();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.senders.push((id, tx));
        tracing::debug!(id, "input subscriber added");
        Subscription {
            id,
            rx,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every live subscriber; returns how many received it.
    pub fn publish(&self, event: InputEvent) -> usize {
        let mut reg = self.registry.borrow_mut();
        reg.senders.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        reg.senders.len()
    }

    /// Live subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().senders.len()
    }
}

/// Receiving end of an [`EventBus`] subscription; unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<InputEvent>,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    /// Subscriber id, unique per bus.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Take every event published since the last call, oldest first.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.rx.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .senders
                .retain(|(id, _)| *id != self.id);
            tracing::debug!(id = self.id, "input subscriber removed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/events.rs"]
mod tests;
