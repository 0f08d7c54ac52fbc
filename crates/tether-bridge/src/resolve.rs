//! Metadata resolver - tiered member-name search over live method tables
//!
//! Foreign reflection stores full call signatures, not bare names, so a
//! member lookup is a prefix scan: the requested name must be followed
//! immediately by the parameter-list opening delimiter (`foo` never matches
//! `foo2(int)`). The case-sensitive tier runs before the case-insensitive
//! one, and within a tier the first declared entry wins; downstream callers
//! may depend on declaration order, so no arity- or type-based
//! disambiguation is attempted for methods.
//!
//! Signal resolution is stricter: a prefix scan that matches more than one
//! signal is an error rather than a silent first pick.

use tether_sdk::{
    normalize_signature, BridgeError, BridgeResult, ForeignObject, MetaMethod, MetaObject,
    MethodKind, ScriptValue,
};

/// Classification of a member-access lookup against one object.
#[derive(Debug)]
pub enum Resolved<'m> {
    /// A valid dynamic property, already converted; properties shadow
    /// method names
    Property(ScriptValue),
    /// A method table entry
    Method(&'m MetaMethod),
    /// A signal table entry
    Signal(&'m MetaMethod),
    /// Nothing matched under any tier
    NotFound,
}

/// Check whether `signature` starts with `name` immediately followed by
/// the parameter-list opening delimiter.
fn sig_matches(signature: &str, name: &str, ignore_case: bool) -> bool {
    let split = name.len();
    if signature.len() <= split || !signature.is_char_boundary(split) {
        return false;
    }
    if signature.as_bytes()[split] != b'(' {
        return false;
    }
    let head = &signature[..split];
    if ignore_case {
        head.eq_ignore_ascii_case(name)
    } else {
        head == name
    }
}

/// Find a method table entry by name: case-sensitive signature-prefix scan
/// first, case-insensitive second, first declared match wins.
pub fn find_method<'m>(meta: &'m MetaObject, name: &str) -> Option<&'m MetaMethod> {
    meta.methods()
        .iter()
        .find(|m| sig_matches(m.signature(), name, false))
        .or_else(|| {
            meta.methods()
                .iter()
                .find(|m| sig_matches(m.signature(), name, true))
        })
}

/// Find a stack-handoff method table entry by name, using the same two
/// case tiers as [`find_method`] but restricted to entries declared with
/// the direct stack-handoff signature shape.
pub fn find_stack_method<'m>(meta: &'m MetaObject, name: &str) -> Option<&'m MetaMethod> {
    let handoff = || meta.methods().iter().filter(|m| m.is_stack_handoff());
    handoff()
        .find(|m| sig_matches(m.signature(), name, false))
        .or_else(|| handoff().find(|m| sig_matches(m.signature(), name, true)))
}

/// Resolve a signal by name from the signal subset of the method table.
///
/// An identifier containing the parameter-list delimiter is normalized and
/// matched as an exact signature. A bare name is a prefix scan over the
/// signal subset; more than one candidate is ambiguous and zero is an
/// error, unlike method resolution's silent first match.
pub fn find_signal<'m>(meta: &'m MetaObject, name: &str) -> BridgeResult<&'m MetaMethod> {
    if name.contains('(') {
        let wanted = normalize_signature(name);
        return meta
            .signals()
            .find(|s| s.signature() == wanted)
            .ok_or_else(|| BridgeError::NoSuchSignal(name.to_string()));
    }

    let mut found: Option<&MetaMethod> = None;
    for signal in meta.signals() {
        if signal.signature().starts_with(name) {
            if found.is_some() {
                return Err(BridgeError::AmbiguousSignal(name.to_string()));
            }
            found = Some(signal);
        }
    }
    found.ok_or_else(|| BridgeError::NoSuchSignal(name.to_string()))
}

/// Classify a member access against an object's property store and method
/// table. The custom-callable cache tier lives on the userdata and is
/// checked by the dispatcher before this runs.
pub fn resolve_member<'m>(obj: &'m dyn ForeignObject, name: &str) -> Resolved<'m> {
    // Properties shadow method names
    if let Some(value) = crate::property::read(obj, name) {
        return Resolved::Property(value);
    }
    match find_method(obj.meta_object(), name) {
        Some(m) if m.kind() == MethodKind::Signal => Resolved::Signal(m),
        Some(m) => Resolved::Method(m),
        None => Resolved::NotFound,
    }
}
