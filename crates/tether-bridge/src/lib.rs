//! Tether bridge - dynamic dispatch between scripts and foreign objects
//!
//! This crate is the core of the bridge:
//! - Member-access interception and receiver-validated dispatch closures
//! - Tiered runtime member resolution against live method tables, with a
//!   per-handle thunk cache
//! - Argument marshalling for both generic reflective calls and direct
//!   stack-handoff calls
//! - Dynamic property access
//! - Signal subscriptions with retained script slots and idempotent
//!   disposal, over an explicit [`EventBus`]
//!
//! Hosts implement [`tether_sdk::ForeignObject`] per class (mechanical,
//! usually generated) and call [`bind`] once per object; the returned
//! accessor callables plug into the script runtime's member-access
//! protocol. Everything runs on the single thread owning the script
//! interpreter; no call here blocks or suspends.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod dispatch;
pub mod marshal;
pub mod property;
pub mod resolve;
pub mod subscribe;

// Re-export SDK types (canonical definitions live in tether-sdk)
pub use tether_sdk::{
    BoxedCtor, BoxedValue, BridgeError, BridgeResult, ForeignObject, ForeignRef, ForeignWeak,
    MetaMethod, MetaObject, MethodKind, ObjectId, ScriptCallable, ScriptStack, ScriptValue,
    TypeRegistry, Userdata, STACK_PARAM,
};

pub use dispatch::{bind, Binding};
pub use resolve::Resolved;
pub use subscribe::{ConnectionId, EventBus};
