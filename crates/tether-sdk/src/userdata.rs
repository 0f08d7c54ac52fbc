//! Userdata - the script-visible handle to a foreign object
//!
//! A userdata binds a weak foreign-object reference, its bind-time identity
//! token, a runtime type tag, and the per-handle method cache. The cache
//! maps member names to resolved call thunks so repeat invocations skip
//! metadata search entirely; it lives and dies with the handle.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{BridgeError, BridgeResult};
use crate::object::{ForeignRef, ForeignWeak, ObjectId};
use crate::stack::ScriptStack;
use crate::value::ScriptCallable;

/// Script-visible wrapper for one binding of a foreign object.
pub struct Userdata {
    object: ForeignWeak,
    id: ObjectId,
    type_tag: String,
    methods: RefCell<FxHashMap<String, ScriptCallable>>,
}

impl Userdata {
    /// Create a wrapper for `object` under the given identity token and
    /// runtime type tag.
    pub fn new(object: ForeignWeak, id: ObjectId, type_tag: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            object,
            id,
            type_tag: type_tag.into(),
            methods: RefCell::new(FxHashMap::default()),
        })
    }

    /// Identity token assigned when the object was bound
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Runtime type tag recorded at bind time
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Upgrade to the foreign object, if the host still owns it
    pub fn object(&self) -> Option<ForeignRef> {
        self.object.upgrade()
    }

    /// Check if a call thunk is cached under `name`
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.borrow().contains_key(name)
    }

    /// Cache a call thunk under `name`, replacing any previous entry
    pub fn add_method(&self, name: impl Into<String>, callable: ScriptCallable) {
        self.methods.borrow_mut().insert(name.into(), callable);
    }

    /// Get the cached thunk under `name`
    pub fn cached_method(&self, name: &str) -> Option<ScriptCallable> {
        self.methods.borrow().get(name).cloned()
    }

    /// Invoke the cached thunk under `name` on the given stack.
    ///
    /// It is an error to invoke a name that was never cached.
    pub fn invoke(&self, name: &str, stack: &mut ScriptStack) -> BridgeResult<()> {
        let callable = self
            .cached_method(name)
            .ok_or_else(|| BridgeError::NoSuchMethod(name.to_string()))?;
        callable(stack)
    }
}

impl std::fmt::Debug for Userdata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Userdata")
            .field("id", &self.id)
            .field("type_tag", &self.type_tag)
            .field("cached_methods", &self.methods.borrow().len())
            .finish()
    }
}
