//! Tether SDK - value model and host contracts for the object bridge
//!
//! This crate provides the minimal types and traits needed to host foreign
//! objects behind the Tether bridge without depending on the bridge engine:
//! the script value model and stack, the boxed foreign value container and
//! its type registry, method table metadata, the [`ForeignObject`] trait,
//! the script-visible [`Userdata`] wrapper, and the uniform error type.
//!
//! # Example
//!
//! ```ignore
//! use tether_sdk::{BoxedValue, ForeignObject, MetaObject};
//!
//! struct Counter {
//!     meta: MetaObject,
//!     value: i64,
//! }
//!
//! impl ForeignObject for Counter {
//!     fn type_name(&self) -> &str { "Counter" }
//!     fn meta_object(&self) -> &MetaObject { &self.meta }
//!     fn property(&self, name: &str) -> BoxedValue {
//!         match name {
//!             "value" => BoxedValue::Int(self.value),
//!             _ => BoxedValue::Invalid,
//!         }
//!     }
//!     // ...
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod boxed;
pub mod error;
pub mod meta;
pub mod object;
pub mod stack;
pub mod userdata;
pub mod value;

pub use boxed::{BoxedCtor, BoxedValue, TypeRegistry};
pub use error::{BridgeError, BridgeResult};
pub use meta::{normalize_signature, MetaMethod, MetaObject, MethodKind, STACK_PARAM};
pub use object::{ForeignObject, ForeignRef, ForeignWeak, ObjectId};
pub use stack::ScriptStack;
pub use userdata::Userdata;
pub use value::{ScriptCallable, ScriptValue};
