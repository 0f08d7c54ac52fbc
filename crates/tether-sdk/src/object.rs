//! ForeignObject - the reflective object a host exposes to scripts
//!
//! The bridge never owns foreign objects. Hosts keep them alive in an
//! [`ForeignRef`] and hand the bridge weak references; when the host drops
//! an object, every outstanding script handle reports a dead object instead
//! of dangling.
//!
//! Identity is an explicit [`ObjectId`] token allocated at bind time rather
//! than a raw address, so receiver validation stays meaningful under any
//! ownership model the host picks.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::boxed::BoxedValue;
use crate::error::BridgeResult;
use crate::meta::MetaObject;
use crate::stack::ScriptStack;

/// Shared handle to a foreign object; ownership stays with the host
pub type ForeignRef = Rc<RefCell<dyn ForeignObject>>;

/// Non-owning handle to a foreign object
pub type ForeignWeak = Weak<RefCell<dyn ForeignObject>>;

/// Identity token for one script binding of a foreign object.
///
/// Dispatch closures capture the token of the receiver they were created
/// for; a call through a handle carrying a different token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh, process-unique identity token
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ObjectId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A foreign, reflective object reachable from scripts.
///
/// Implementations expose live type metadata, a dynamic property store, and
/// two invocation paths: generic indexed invocation over boxed arguments and
/// direct stack-handoff invocation. Per-class implementations are mechanical;
/// the bridge only ever talks to this trait.
pub trait ForeignObject {
    /// Runtime type name of this object
    fn type_name(&self) -> &str;

    /// Live method table for this object's runtime type
    fn meta_object(&self) -> &MetaObject;

    /// Read a dynamic property by exact name.
    ///
    /// Returns an invalid boxed value if no such property exists; the
    /// container's validity flag is the existence check.
    fn property(&self, name: &str) -> BoxedValue;

    /// Write a dynamic property by exact name.
    ///
    /// Only called for names `property` reported valid; the supplied value
    /// has already been coerced to the property's existing type.
    fn set_property(&mut self, name: &str, value: BoxedValue);

    /// Invoke the method table entry at `index` with boxed arguments.
    ///
    /// `args[0]` is the return slot (invalid for void methods); declared
    /// parameters follow in order, already coerced to their declared types.
    fn meta_invoke(&mut self, index: usize, args: &mut [BoxedValue]) -> BridgeResult<()>;

    /// Invoke the stack-handoff method table entry at `index`.
    ///
    /// The method consumes its arguments from `stack` directly and may push
    /// results there; `ret`, if set valid, is pushed back by the bridge
    /// after the stack is cleared.
    fn stack_invoke(
        &mut self,
        index: usize,
        ret: &mut BoxedValue,
        stack: &mut ScriptStack,
    ) -> BridgeResult<()>;
}
