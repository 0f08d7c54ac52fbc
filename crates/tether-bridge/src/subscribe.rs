//! Event subscriptions - wiring foreign signals into script slots
//!
//! The foreign system's process-wide connection table is modeled as an
//! explicit [`EventBus`] service object so hosts and tests can construct
//! and swap it freely. Each subscription runs unconnected -> connected ->
//! disposed: "unconnected" is the transient window between the `connect`
//! member access and the subscribe call, "connected" is an occupied
//! connection record on the bus, and disposal vacates the record. Records
//! are identified by a generation-tagged id, so disposing twice (or
//! disposing after the slot index was reused) is a safe no-op.
//!
//! The slot callable is retained by its reference count from connect until
//! disposal, independent of whatever script scope produced it.

use std::cell::RefCell;
use std::rc::Rc;

use tether_sdk::{
    BridgeError, BridgeResult, ObjectId, ScriptCallable, ScriptStack, ScriptValue,
};

use crate::dispatch::validate;
use crate::resolve;

/// Identity of one connection record on the bus.
///
/// The generation tag distinguishes a live record from a later reuse of
/// the same arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    index: usize,
    generation: u64,
}

struct Connection {
    object: ObjectId,
    signal: usize,
    slot: ScriptCallable,
}

struct ArenaSlot {
    generation: u64,
    record: Option<Connection>,
}

/// Connection table between foreign signals and retained script slots.
#[derive(Default)]
pub struct EventBus {
    slots: RefCell<Vec<ArenaSlot>>,
    free: RefCell<Vec<usize>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection from (`object`, signal table index) to `slot`.
    ///
    /// The slot callable is retained until the connection is disposed.
    pub fn connect(
        &self,
        object: ObjectId,
        signal: usize,
        slot: ScriptCallable,
    ) -> ConnectionId {
        let record = Connection {
            object,
            signal,
            slot,
        };
        let mut slots = self.slots.borrow_mut();
        if let Some(index) = self.free.borrow_mut().pop() {
            let arena_slot = &mut slots[index];
            arena_slot.record = Some(record);
            ConnectionId {
                index,
                generation: arena_slot.generation,
            }
        } else {
            slots.push(ArenaSlot {
                generation: 0,
                record: Some(record),
            });
            ConnectionId {
                index: slots.len() - 1,
                generation: 0,
            }
        }
    }

    /// Dispose a connection, releasing the retained slot callable.
    ///
    /// Returns false if the connection was already disposed; disposal is
    /// idempotent and never double-releases.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.get_mut(id.index) {
            Some(slot) if slot.generation == id.generation && slot.record.is_some() => {
                slot.record = None;
                slot.generation += 1;
                self.free.borrow_mut().push(id.index);
                true
            }
            _ => false,
        }
    }

    /// Check if a connection is still live
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.slots
            .borrow()
            .get(id.index)
            .is_some_and(|s| s.generation == id.generation && s.record.is_some())
    }

    /// Fire a signal: invoke every slot connected to (`object`, `signal`),
    /// each on a fresh stack holding the emission arguments.
    pub fn emit(
        &self,
        object: ObjectId,
        signal: usize,
        args: &[ScriptValue],
    ) -> BridgeResult<()> {
        // Snapshot targets first; a slot may connect or dispose reentrantly.
        let targets: Vec<ScriptCallable> = self
            .slots
            .borrow()
            .iter()
            .filter_map(|s| s.record.as_ref())
            .filter(|c| c.object == object && c.signal == signal)
            .map(|c| c.slot.clone())
            .collect();

        for slot in targets {
            let mut stack = ScriptStack::from_values(args.iter().cloned());
            slot(&mut stack)?;
        }
        Ok(())
    }

    /// Dispose every connection belonging to a destroyed object.
    ///
    /// Returns the number of connections torn down.
    pub fn drop_object(&self, object: ObjectId) -> usize {
        let mut slots = self.slots.borrow_mut();
        let mut free = self.free.borrow_mut();
        let mut dropped = 0;
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.record.as_ref().is_some_and(|c| c.object == object) {
                slot.record = None;
                slot.generation += 1;
                free.push(index);
                dropped += 1;
            }
        }
        dropped
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|s| s.record.is_some())
            .count()
    }
}

/// Build the subscribe callable returned for a `connect` member access.
///
/// The callable expects `[userdata, signal, slot]` on the stack: it
/// validates the receiver against the captured identity, resolves the
/// signal from the receiver's metadata, retains the slot, registers the
/// connection, and leaves a disposer callable on the stack.
pub fn make_connector(
    expected: ObjectId,
    expected_tag: String,
    bus: Rc<EventBus>,
) -> ScriptCallable {
    Rc::new(move |stack: &mut ScriptStack| connect_slot(expected, &expected_tag, &bus, stack))
}

fn connect_slot(
    expected: ObjectId,
    expected_tag: &str,
    bus: &Rc<EventBus>,
    stack: &mut ScriptStack,
) -> BridgeResult<()> {
    let ud = stack.shift_userdata()?;
    let object = validate(&ud, expected, expected_tag)?;

    if stack.len() != 2 {
        return Err(BridgeError::ArgumentCount {
            expected: 2,
            got: stack.len(),
        });
    }
    let signal_name = stack.shift_str()?;
    let slot = stack.shift_callable()?;

    let signal_index = {
        let object = object.borrow();
        resolve::find_signal(object.meta_object(), &signal_name)?.index()
    };

    let id = bus.connect(expected, signal_index, slot);

    stack.clear();
    let bus = bus.clone();
    stack.push(ScriptValue::Callable(Rc::new(
        move |_stack: &mut ScriptStack| {
            bus.disconnect(id);
            Ok(())
        },
    )));
    Ok(())
}
