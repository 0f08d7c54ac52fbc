//! End-to-end bridge tests against a scripted mock foreign class.
//!
//! `Counter` plays the foreign object: dynamic properties, overloaded and
//! case-colliding methods, a stack-handoff method, and two signals sharing
//! a name prefix. Tests drive the same accessor callables a script runtime
//! would install for member access.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tether_bridge::{
    bind, resolve, Binding, BoxedValue, BridgeError, BridgeResult, EventBus, ForeignObject,
    ForeignRef, MetaObject, ScriptCallable, ScriptStack, ScriptValue, TypeRegistry,
};

struct Counter {
    meta: MetaObject,
    value: i64,
    label: String,
    last_reset: Option<&'static str>,
    stack_filled: bool,
    generic_filled: bool,
}

impl Counter {
    fn new(value: i64) -> Self {
        let mut meta = MetaObject::new("Counter");
        meta.add_method("increment", &["int"], "int"); // 0
        meta.add_method("Reset", &[], ""); // 1
        meta.add_method("reset", &[], ""); // 2
        meta.add_method("fill", &["int"], ""); // 3
        meta.add_method("fill", &["ScriptStack"], ""); // 4
        meta.add_method("opaque", &["Widget"], ""); // 5
        meta.add_method("describe", &[], "string"); // 6
        meta.add_signal("valueChanged", &["int"]); // 7
        meta.add_signal("valueCleared", &[]); // 8
        Self {
            meta,
            value,
            label: "counter".to_string(),
            last_reset: None,
            stack_filled: false,
            generic_filled: false,
        }
    }
}

impl ForeignObject for Counter {
    fn type_name(&self) -> &str {
        "Counter"
    }

    fn meta_object(&self) -> &MetaObject {
        &self.meta
    }

    fn property(&self, name: &str) -> BoxedValue {
        match name {
            "value" => BoxedValue::Int(self.value),
            "label" => BoxedValue::Str(self.label.clone()),
            _ => BoxedValue::Invalid,
        }
    }

    fn set_property(&mut self, name: &str, value: BoxedValue) {
        match (name, value) {
            ("value", BoxedValue::Int(i)) => self.value = i,
            ("label", BoxedValue::Str(s)) => self.label = s,
            _ => {}
        }
    }

    fn meta_invoke(&mut self, index: usize, args: &mut [BoxedValue]) -> BridgeResult<()> {
        match index {
            0 => {
                let by = match args[1] {
                    BoxedValue::Int(i) => i,
                    _ => 0,
                };
                self.value += by;
                args[0] = BoxedValue::Int(self.value);
                Ok(())
            }
            1 => {
                self.last_reset = Some("Reset");
                self.value = 0;
                Ok(())
            }
            2 => {
                self.last_reset = Some("reset");
                self.value = 0;
                Ok(())
            }
            3 => {
                self.generic_filled = true;
                Ok(())
            }
            6 => {
                args[0] = BoxedValue::Str(self.label.clone());
                Ok(())
            }
            other => Err(BridgeError::Invocation(format!(
                "no generic method at index {}",
                other
            ))),
        }
    }

    fn stack_invoke(
        &mut self,
        index: usize,
        _ret: &mut BoxedValue,
        stack: &mut ScriptStack,
    ) -> BridgeResult<()> {
        match index {
            4 => {
                self.stack_filled = true;
                while let Some(v) = stack.shift() {
                    self.value += v.as_int().unwrap_or(0);
                }
                Ok(())
            }
            other => Err(BridgeError::Invocation(format!(
                "no stack method at index {}",
                other
            ))),
        }
    }
}

struct Fixture {
    counter: Rc<RefCell<Counter>>,
    bus: Rc<EventBus>,
    binding: Binding,
}

fn fixture(value: i64) -> Fixture {
    let counter = Rc::new(RefCell::new(Counter::new(value)));
    let object: ForeignRef = counter.clone();
    let bus = Rc::new(EventBus::new());
    let types = Rc::new(TypeRegistry::with_builtins());
    let binding = bind(&object, &bus, &types);
    Fixture {
        counter,
        bus,
        binding,
    }
}

/// Member access through the index intercept: `obj.name`
fn get_member(binding: &Binding, name: &str) -> ScriptValue {
    let mut stack = ScriptStack::from_values([
        ScriptValue::Userdata(binding.userdata.clone()),
        ScriptValue::from(name),
    ]);
    (binding.index)(&mut stack).expect("member access");
    stack.pop().expect("member access leaves a value")
}

/// Member assignment through the newindex intercept: `obj.name = value`
fn set_member(binding: &Binding, name: &str, value: ScriptValue) -> BridgeResult<()> {
    let mut stack = ScriptStack::from_values([
        ScriptValue::Userdata(binding.userdata.clone()),
        ScriptValue::from(name),
        value,
    ]);
    (binding.newindex)(&mut stack)
}

/// Member invocation: `obj:name(args...)`
fn call_member(
    binding: &Binding,
    name: &str,
    args: impl IntoIterator<Item = ScriptValue>,
) -> BridgeResult<Option<ScriptValue>> {
    let member = get_member(binding, name);
    let callable = member.as_callable().expect("member is callable").clone();
    call_dispatcher(
        &callable,
        &ScriptValue::Userdata(binding.userdata.clone()),
        args,
    )
}

fn call_dispatcher(
    callable: &ScriptCallable,
    receiver: &ScriptValue,
    args: impl IntoIterator<Item = ScriptValue>,
) -> BridgeResult<Option<ScriptValue>> {
    let mut stack = ScriptStack::new();
    stack.push(receiver.clone());
    for arg in args {
        stack.push(arg);
    }
    callable(&mut stack)?;
    Ok(stack.pop())
}

/// Subscribe `slot` to `signal` through the bridge: `obj:connect(signal, slot)`
fn subscribe(
    binding: &Binding,
    signal: &str,
    slot: ScriptCallable,
) -> BridgeResult<ScriptCallable> {
    let connect = get_member(binding, "connect");
    let connect = connect.as_callable().expect("connect is callable").clone();
    let mut stack = ScriptStack::from_values([
        ScriptValue::Userdata(binding.userdata.clone()),
        ScriptValue::from(signal),
        ScriptValue::Callable(slot),
    ]);
    connect(&mut stack)?;
    Ok(stack
        .pop()
        .and_then(|v| v.as_callable().cloned())
        .expect("connect leaves a disposer"))
}

fn counting_slot(hits: &Rc<Cell<u32>>) -> ScriptCallable {
    let hits = hits.clone();
    Rc::new(move |_stack: &mut ScriptStack| {
        hits.set(hits.get() + 1);
        Ok(())
    })
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_property_get_set_end_to_end() {
    let fx = fixture(5);

    assert_eq!(get_member(&fx.binding, "value"), ScriptValue::Int(5));

    set_member(&fx.binding, "value", ScriptValue::Int(10)).unwrap();
    assert_eq!(get_member(&fx.binding, "value"), ScriptValue::Int(10));

    let err = set_member(&fx.binding, "unknownProp", ScriptValue::Int(1)).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidMutation(_)));
}

#[test]
fn test_property_write_back_is_idempotent() {
    let fx = fixture(7);
    let read = get_member(&fx.binding, "value");
    set_member(&fx.binding, "value", read.clone()).unwrap();
    assert_eq!(get_member(&fx.binding, "value"), read);
}

#[test]
fn test_property_shadows_method_name() {
    let fx = fixture(1);
    // Give the class a method named like the property; the property wins.
    fx.counter
        .borrow_mut()
        .meta
        .add_method("value", &[], "int");
    assert_eq!(get_member(&fx.binding, "value"), ScriptValue::Int(1));
}

// ============================================================================
// Member resolution
// ============================================================================

#[test]
fn test_unknown_member_reads_as_null() {
    let fx = fixture(0);
    assert_eq!(get_member(&fx.binding, "nothingHere"), ScriptValue::Null);
}

#[test]
fn test_unresolvable_invocation_raises() {
    let fx = fixture(0);
    // Resolve a dispatcher while the method exists, then pull the table out
    // from under it before the first (uncached) call.
    let member = get_member(&fx.binding, "increment");
    let dispatcher = member.as_callable().unwrap().clone();

    fx.counter.borrow_mut().meta = MetaObject::new("Counter");

    let err = call_dispatcher(
        &dispatcher,
        &ScriptValue::Userdata(fx.binding.userdata.clone()),
        [ScriptValue::Int(1)],
    )
    .unwrap_err();
    assert!(matches!(err, BridgeError::NoSuchMethod(_)));
}

#[test]
fn test_case_sensitive_tier_wins() {
    let fx = fixture(9);

    call_member(&fx.binding, "reset", []).unwrap();
    assert_eq!(fx.counter.borrow().last_reset, Some("reset"));

    call_member(&fx.binding, "Reset", []).unwrap();
    assert_eq!(fx.counter.borrow().last_reset, Some("Reset"));
}

#[test]
fn test_case_insensitive_fallback_first_declared() {
    let fx = fixture(9);
    // No exact match for `RESET`; the insensitive tier takes the first
    // declared candidate, which is `Reset()`.
    call_member(&fx.binding, "RESET", []).unwrap();
    assert_eq!(fx.counter.borrow().last_reset, Some("Reset"));
}

#[test]
fn test_generic_call_marshals_and_returns() {
    let fx = fixture(5);
    let result = call_member(&fx.binding, "increment", [ScriptValue::Int(3)]).unwrap();
    assert_eq!(result, Some(ScriptValue::Int(8)));
    assert_eq!(fx.counter.borrow().value, 8);

    // Return path converts foreign strings too
    let result = call_member(&fx.binding, "describe", []).unwrap();
    assert_eq!(result, Some(ScriptValue::from("counter")));
}

#[test]
fn test_stack_handoff_preferred_over_generic() {
    let fx = fixture(0);
    call_member(
        &fx.binding,
        "fill",
        [ScriptValue::Int(2), ScriptValue::Int(3)],
    )
    .unwrap();

    let counter = fx.counter.borrow();
    assert!(counter.stack_filled);
    assert!(!counter.generic_filled);
    assert_eq!(counter.value, 5);
}

#[test]
fn test_unknown_parameter_type_is_unconvertible() {
    let fx = fixture(0);
    let err = call_member(&fx.binding, "opaque", [ScriptValue::Int(1)]).unwrap_err();
    match err {
        BridgeError::Unconvertible {
            type_name,
            signature,
        } => {
            assert_eq!(type_name, "Widget");
            assert_eq!(signature, "opaque(Widget)");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Method cache
// ============================================================================

#[test]
fn test_second_call_bypasses_metadata() {
    let fx = fixture(0);

    assert!(!fx.binding.userdata.has_method("increment"));
    call_member(&fx.binding, "increment", [ScriptValue::Int(1)]).unwrap();
    assert!(fx.binding.userdata.has_method("increment"));

    // Remove the metadata; the cached thunk must keep working.
    fx.counter.borrow_mut().meta = MetaObject::new("Counter");
    let result = call_member_cached(&fx, "increment", [ScriptValue::Int(2)]).unwrap();
    assert_eq!(result, Some(ScriptValue::Int(3)));
}

/// Invoke through a fresh dispatcher without re-reading the member, so the
/// only resolution source left is the userdata cache.
fn call_member_cached(
    fx: &Fixture,
    name: &str,
    args: impl IntoIterator<Item = ScriptValue>,
) -> BridgeResult<Option<ScriptValue>> {
    let mut stack = ScriptStack::new();
    stack.push(ScriptValue::Userdata(fx.binding.userdata.clone()));
    for arg in args {
        stack.push(arg);
    }
    fx.binding.userdata.invoke(name, &mut stack)?;
    Ok(stack.pop())
}

// ============================================================================
// Receiver validation
// ============================================================================

#[test]
fn test_dispatcher_rejects_foreign_receiver() {
    let a = fixture(1);
    let b = fixture(2);

    let member = get_member(&a.binding, "increment");
    let dispatcher = member.as_callable().unwrap().clone();

    // B has the same-named member, but the closure was minted for A.
    let err = call_dispatcher(
        &dispatcher,
        &ScriptValue::Userdata(b.binding.userdata.clone()),
        [ScriptValue::Int(1)],
    )
    .unwrap_err();
    assert!(matches!(err, BridgeError::ReceiverMismatch));
    assert_eq!(b.counter.borrow().value, 2);
}

#[test]
fn test_dispatcher_reports_dead_object() {
    let fx = fixture(1);
    let member = get_member(&fx.binding, "increment");
    let dispatcher = member.as_callable().unwrap().clone();

    drop(fx.counter);

    let err = call_dispatcher(
        &dispatcher,
        &ScriptValue::Userdata(fx.binding.userdata.clone()),
        [ScriptValue::Int(1)],
    )
    .unwrap_err();
    assert!(matches!(err, BridgeError::DeadObject));
}

// ============================================================================
// Signals
// ============================================================================

#[test]
fn test_subscribe_emit_dispose_end_to_end() {
    let fx = fixture(0);
    let hits = Rc::new(Cell::new(0));

    let disposer = subscribe(&fx.binding, "valueChanged", counting_slot(&hits)).unwrap();

    let signal = {
        let counter = fx.counter.borrow();
        resolve::find_signal(counter.meta_object(), "valueChanged")
            .unwrap()
            .index()
    };
    let id = fx.binding.userdata.id();

    fx.bus.emit(id, signal, &[ScriptValue::Int(1)]).unwrap();
    fx.bus.emit(id, signal, &[ScriptValue::Int(2)]).unwrap();
    assert_eq!(hits.get(), 2);

    let mut stack = ScriptStack::new();
    disposer(&mut stack).unwrap();

    fx.bus.emit(id, signal, &[ScriptValue::Int(3)]).unwrap();
    assert_eq!(hits.get(), 2);
}

#[test]
fn test_disposer_is_idempotent() {
    let fx = fixture(0);
    let hits = Rc::new(Cell::new(0));
    let disposer = subscribe(&fx.binding, "valueCleared", counting_slot(&hits)).unwrap();

    let mut stack = ScriptStack::new();
    disposer(&mut stack).unwrap();
    disposer(&mut stack).unwrap();
    assert_eq!(fx.bus.connection_count(), 0);
}

#[test]
fn test_ambiguous_signal_name_rejected() {
    let fx = fixture(0);
    let err = subscribe(&fx.binding, "value", Rc::new(|_| Ok(()))).err().unwrap();
    assert!(matches!(err, BridgeError::AmbiguousSignal(_)));
    assert_eq!(fx.bus.connection_count(), 0);
}

#[test]
fn test_exact_signature_resolves_ambiguous_prefix() {
    let fx = fixture(0);
    let hits = Rc::new(Cell::new(0));
    subscribe(&fx.binding, "valueChanged( int )", counting_slot(&hits)).unwrap();
    assert_eq!(fx.bus.connection_count(), 1);
}

#[test]
fn test_subscribe_argument_errors() {
    let fx = fixture(0);

    // Wrong count
    let connect = get_member(&fx.binding, "connect");
    let connect = connect.as_callable().unwrap().clone();
    let mut stack = ScriptStack::from_values([
        ScriptValue::Userdata(fx.binding.userdata.clone()),
        ScriptValue::from("valueChanged"),
    ]);
    let err = connect(&mut stack).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::ArgumentCount {
            expected: 2,
            got: 1
        }
    ));

    // Signal identifier must be a string
    let mut stack = ScriptStack::from_values([
        ScriptValue::Userdata(fx.binding.userdata.clone()),
        ScriptValue::Int(7),
        ScriptValue::Callable(Rc::new(|_| Ok(()))),
    ]);
    let err = connect(&mut stack).unwrap_err();
    assert!(matches!(err, BridgeError::TypeMismatch { .. }));

    // Slot must be a callable
    let mut stack = ScriptStack::from_values([
        ScriptValue::Userdata(fx.binding.userdata.clone()),
        ScriptValue::from("valueChanged"),
        ScriptValue::Int(7),
    ]);
    let err = connect(&mut stack).unwrap_err();
    assert!(matches!(err, BridgeError::TypeMismatch { .. }));
}

#[test]
fn test_subscribe_unknown_signal() {
    let fx = fixture(0);
    let err = subscribe(&fx.binding, "noSuchSignal", Rc::new(|_| Ok(()))).err().unwrap();
    assert!(matches!(err, BridgeError::NoSuchSignal(_)));
}

#[test]
fn test_object_teardown_drops_subscriptions() {
    let fx = fixture(0);
    let hits = Rc::new(Cell::new(0));
    subscribe(&fx.binding, "valueChanged", counting_slot(&hits)).unwrap();

    let signal = {
        let counter = fx.counter.borrow();
        resolve::find_signal(counter.meta_object(), "valueChanged")
            .unwrap()
            .index()
    };
    let id = fx.binding.userdata.id();

    // Host destroys the object and tears down its connections.
    assert_eq!(fx.bus.drop_object(id), 1);
    fx.bus.emit(id, signal, &[]).unwrap();
    assert_eq!(hits.get(), 0);
}

#[test]
fn test_slot_receives_emission_arguments() {
    let fx = fixture(0);
    let seen = Rc::new(Cell::new(0i64));
    let seen_in_slot = seen.clone();

    subscribe(
        &fx.binding,
        "valueChanged",
        Rc::new(move |stack: &mut ScriptStack| {
            seen_in_slot.set(stack.shift().and_then(|v| v.as_int()).unwrap_or(-1));
            Ok(())
        }),
    )
    .unwrap();

    let signal = {
        let counter = fx.counter.borrow();
        resolve::find_signal(counter.meta_object(), "valueChanged")
            .unwrap()
            .index()
    };
    fx.bus
        .emit(fx.binding.userdata.id(), signal, &[ScriptValue::Int(41)])
        .unwrap();
    assert_eq!(seen.get(), 41);
}
