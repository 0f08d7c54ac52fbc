//! Member-access interception and method dispatch
//!
//! [`bind`] installs the bridge on one foreign object: it mints the
//! object's identity token, wraps it in a script-visible userdata, and
//! returns the two accessor callables the script runtime hooks into its
//! member-access protocol. Every callable produced here captures that
//! identity token and refuses any receiver that does not carry it; the
//! object itself is always reached back through the validated userdata, so
//! nothing in the bridge keeps the object alive.
//!
//! Method dispatch walks the resolution tiers once, then caches the
//! winning thunk on the userdata; later calls for the same name go
//! straight to the thunk without touching metadata.

use std::rc::Rc;

use tether_sdk::{
    BridgeError, BridgeResult, ForeignRef, ForeignWeak, MetaMethod, ObjectId, ScriptCallable,
    ScriptStack, ScriptValue, TypeRegistry, Userdata,
};

use crate::subscribe::{make_connector, EventBus};
use crate::{marshal, property, resolve};

/// One bound foreign object: its script handle and accessor callables.
pub struct Binding {
    /// Script-visible handle carrying the identity token and method cache
    pub userdata: Rc<Userdata>,
    /// Member-access intercept; stack `[userdata, name]` -> `[value]`
    pub index: ScriptCallable,
    /// Member-assignment intercept; stack `[userdata, name, value]` -> `[]`
    pub newindex: ScriptCallable,
}

/// Bind a foreign object for script access.
///
/// The host keeps ownership of `object`; the binding holds only a weak
/// reference. Signal subscriptions made through this binding register on
/// `bus`; generic calls marshal through `types`.
pub fn bind(object: &ForeignRef, bus: &Rc<EventBus>, types: &Rc<TypeRegistry>) -> Binding {
    let id = ObjectId::fresh();
    let type_tag = object.borrow().type_name().to_string();
    let userdata = Userdata::new(Rc::downgrade(object), id, &type_tag);

    let index = {
        let tag = type_tag.clone();
        let bus = bus.clone();
        let types = types.clone();
        Rc::new(move |stack: &mut ScriptStack| index_member(id, &tag, &bus, &types, stack))
            as ScriptCallable
    };
    let newindex = {
        let tag = type_tag;
        Rc::new(move |stack: &mut ScriptStack| assign_member(id, &tag, stack)) as ScriptCallable
    };

    Binding {
        userdata,
        index,
        newindex,
    }
}

/// Check that `ud` is the receiver a closure was created for, and upgrade
/// to the live object.
///
/// Diagnostics are graduated: a dead internal object and a wrong runtime
/// type are reported as such before the plain identity mismatch.
pub(crate) fn validate(
    ud: &Userdata,
    expected: ObjectId,
    expected_tag: &str,
) -> BridgeResult<ForeignRef> {
    let object = ud.object();
    if ud.id() == expected {
        return object.ok_or(BridgeError::DeadObject);
    }
    if object.is_none() {
        return Err(BridgeError::DeadObject);
    }
    if ud.type_tag() != expected_tag {
        return Err(BridgeError::ReceiverType {
            expected: expected_tag.to_string(),
            got: ud.type_tag().to_string(),
        });
    }
    Err(BridgeError::ReceiverMismatch)
}

/// The member-access intercept body. Stack: `[userdata, name]` -> `[value]`.
fn index_member(
    expected: ObjectId,
    expected_tag: &str,
    bus: &Rc<EventBus>,
    types: &Rc<TypeRegistry>,
    stack: &mut ScriptStack,
) -> BridgeResult<()> {
    let ud = stack.shift_userdata()?;
    let name = stack.shift_str()?;
    let object = validate(&ud, expected, expected_tag)?;

    // Registered custom callables win outright.
    if ud.has_method(&name) {
        stack.push(dispatcher_value(expected, expected_tag, &name, types));
        return Ok(());
    }

    let object_ref = object.borrow();
    match resolve::resolve_member(&*object_ref, &name) {
        // Properties shadow method names.
        resolve::Resolved::Property(value) => stack.push(value),
        // The subscription entry point shadows everything but properties.
        _ if name == "connect" => {
            stack.push(ScriptValue::Callable(make_connector(
                expected,
                expected_tag.to_string(),
                bus.clone(),
            )));
        }
        resolve::Resolved::Method(_) | resolve::Resolved::Signal(_) => {
            stack.push(dispatcher_value(expected, expected_tag, &name, types));
        }
        // Member read misses degrade to the absent sentinel.
        resolve::Resolved::NotFound => stack.push(ScriptValue::Null),
    }
    Ok(())
}

/// The member-assignment intercept body. Stack: `[userdata, name, value]`.
fn assign_member(expected: ObjectId, expected_tag: &str, stack: &mut ScriptStack) -> BridgeResult<()> {
    let ud = stack.shift_userdata()?;
    let name = stack.shift_str()?;
    let value = stack.shift().unwrap_or(ScriptValue::Null);
    let object = validate(&ud, expected, expected_tag)?;

    let mut object = object.borrow_mut();
    property::write(&mut *object, &name, &value)
}

/// Wrap a dispatch closure for `name` as a script value.
fn dispatcher_value(
    expected: ObjectId,
    expected_tag: &str,
    name: &str,
    types: &Rc<TypeRegistry>,
) -> ScriptValue {
    let tag = expected_tag.to_string();
    let name = name.to_string();
    let types = types.clone();
    ScriptValue::Callable(Rc::new(move |stack: &mut ScriptStack| {
        call_method(expected, &tag, &name, &types, stack)
    }))
}

/// Method invocation body. Stack: `[userdata, args...]`.
///
/// Resolution order: userdata-cached thunk, stack-handoff signature scan
/// (case-sensitive then insensitive), generic signature scan (same two
/// tiers). The first resolution through either metadata path caches its
/// thunk on the userdata.
fn call_method(
    expected: ObjectId,
    expected_tag: &str,
    name: &str,
    types: &Rc<TypeRegistry>,
    stack: &mut ScriptStack,
) -> BridgeResult<()> {
    let ud = stack.shift_userdata()?;
    let object = validate(&ud, expected, expected_tag)?;

    if let Some(cached) = ud.cached_method(name) {
        return cached(stack);
    }

    // Prefer methods that handle the stack directly.
    let handoff = resolve::find_stack_method(object.borrow().meta_object(), name).cloned();
    if let Some(method) = handoff {
        let thunk = stack_thunk(Rc::downgrade(&object), method);
        thunk(stack)?;
        ud.add_method(name, thunk);
        return Ok(());
    }

    let generic = resolve::find_method(object.borrow().meta_object(), name).cloned();
    if let Some(method) = generic {
        let thunk = boxed_thunk(Rc::downgrade(&object), method, types.clone());
        thunk(stack)?;
        ud.add_method(name, thunk);
        return Ok(());
    }

    Err(BridgeError::NoSuchMethod(name.to_string()))
}

fn stack_thunk(object: ForeignWeak, method: MetaMethod) -> ScriptCallable {
    Rc::new(move |stack: &mut ScriptStack| {
        let object = object.upgrade().ok_or(BridgeError::DeadObject)?;
        let mut object = object.borrow_mut();
        marshal::invoke_stack(&mut *object, &method, stack)
    })
}

fn boxed_thunk(object: ForeignWeak, method: MetaMethod, types: Rc<TypeRegistry>) -> ScriptCallable {
    Rc::new(move |stack: &mut ScriptStack| {
        let object = object.upgrade().ok_or(BridgeError::DeadObject)?;
        let mut object = object.borrow_mut();
        marshal::invoke_boxed(&mut *object, &method, &types, stack)
    })
}
