//! Argument marshalling between the script stack and foreign invocations
//!
//! Two call shapes exist. The generic reflective call boxes one container
//! per declared parameter type and hands the foreign side a flat argument
//! array with the return slot at index 0. The direct stack-handoff call
//! skips boxing entirely: the method reads and writes the script stack
//! itself. Resolution prefers the handoff shape; this module only executes
//! whichever shape the dispatcher picked.

use tether_sdk::{
    BoxedValue, BridgeError, BridgeResult, ForeignObject, MetaMethod, ScriptStack, TypeRegistry,
};

/// Invoke `method` through the generic reflective path.
///
/// Consumes the method's arguments from the front of `stack` (missing
/// trailing arguments marshal as the parameter type's default value) and
/// leaves the converted return value, if any, as the sole stack content.
///
/// Fails before invoking if any declared parameter type is unknown to the
/// registry; an unknown return type is treated as void.
pub fn invoke_boxed(
    obj: &mut dyn ForeignObject,
    method: &MetaMethod,
    types: &TypeRegistry,
    stack: &mut ScriptStack,
) -> BridgeResult<()> {
    let mut args = Vec::with_capacity(method.param_types().len() + 1);

    // Return slot rides at index 0; invalid means void.
    let ret = if method.has_return() {
        types
            .construct(method.return_type())
            .unwrap_or(BoxedValue::Invalid)
    } else {
        BoxedValue::Invalid
    };
    args.push(ret);

    for (i, param) in method.param_types().iter().enumerate() {
        let mut boxed = types
            .construct(param)
            .ok_or_else(|| BridgeError::Unconvertible {
                type_name: param.clone(),
                signature: method.signature().to_string(),
            })?;
        if let Some(value) = stack.at(i) {
            boxed.store(value)?;
        }
        args.push(boxed);
    }

    stack.clear();
    obj.meta_invoke(method.index(), &mut args)?;

    if args[0].is_valid() {
        stack.push(args[0].to_script());
    }
    Ok(())
}

/// Invoke `method` through the direct stack-handoff path.
///
/// No per-argument boxing: the method consumes `stack` itself. If the
/// method sets its return slot, the stack is cleared and the converted
/// return value pushed; otherwise whatever the method left on the stack
/// stands.
pub fn invoke_stack(
    obj: &mut dyn ForeignObject,
    method: &MetaMethod,
    stack: &mut ScriptStack,
) -> BridgeResult<()> {
    let mut ret = BoxedValue::Invalid;
    obj.stack_invoke(method.index(), &mut ret, stack)?;

    if ret.is_valid() {
        stack.clear();
        stack.push(ret.to_script());
    }
    Ok(())
}
