//! Method table metadata for foreign runtime types
//!
//! A foreign type exposes its callable surface as an ordered table of
//! [`MetaMethod`] entries. Each entry carries the full normalized call
//! signature, not just the bare name; the bridge's tiered resolver matches
//! requested names against these signatures. Signals live in the same table,
//! distinguished only by [`MethodKind`], so declaration order is shared and
//! stable across both.

/// Parameter type name designating the direct stack-handoff calling
/// convention: a method declared as `name(ScriptStack)` reads and writes the
/// script value stack itself instead of receiving boxed arguments.
pub const STACK_PARAM: &str = "ScriptStack";

/// Kind of a method table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Ordinary invocable method
    Method,
    /// Notification signal; subscribable, resolved from the signal subset
    Signal,
}

/// One resolved entry of a foreign type's method table.
#[derive(Debug, Clone)]
pub struct MetaMethod {
    name: String,
    param_types: Vec<String>,
    return_type: String,
    kind: MethodKind,
    index: usize,
    signature: String,
}

impl MetaMethod {
    fn new(
        name: impl Into<String>,
        param_types: Vec<String>,
        return_type: impl Into<String>,
        kind: MethodKind,
        index: usize,
    ) -> Self {
        let name = name.into();
        let signature = format!("{}({})", name, param_types.join(","));
        Self {
            name,
            param_types,
            return_type: return_type.into(),
            kind,
            index,
            signature,
        }
    }

    /// Bare method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered parameter type names
    pub fn param_types(&self) -> &[String] {
        &self.param_types
    }

    /// Return type name; empty means none
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// Check if the method returns a value
    pub fn has_return(&self) -> bool {
        !self.return_type.is_empty()
    }

    /// Entry kind (method or signal)
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Stable index into the owning method table
    pub fn index(&self) -> usize {
        self.index
    }

    /// Normalized signature string, `name(type,type)`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Check if this method uses the direct stack-handoff convention
    pub fn is_stack_handoff(&self) -> bool {
        self.param_types.len() == 1 && self.param_types[0] == STACK_PARAM
    }
}

/// Ordered method table for one foreign runtime type.
///
/// Entry indices are stable for the lifetime of the table; dispatch thunks
/// and signal connections refer to entries by index.
#[derive(Debug, Clone, Default)]
pub struct MetaObject {
    class_name: String,
    methods: Vec<MetaMethod>,
}

impl MetaObject {
    /// Create an empty table for the named type
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            methods: Vec::new(),
        }
    }

    /// Runtime type name this table describes
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Append a method entry, returning its stable index
    pub fn add_method(
        &mut self,
        name: impl Into<String>,
        param_types: &[&str],
        return_type: &str,
    ) -> usize {
        self.add(name, param_types, return_type, MethodKind::Method)
    }

    /// Append a signal entry, returning its stable index
    pub fn add_signal(&mut self, name: impl Into<String>, param_types: &[&str]) -> usize {
        // Signals notify; they do not return
        self.add(name, param_types, "", MethodKind::Signal)
    }

    fn add(
        &mut self,
        name: impl Into<String>,
        param_types: &[&str],
        return_type: &str,
        kind: MethodKind,
    ) -> usize {
        let index = self.methods.len();
        let params = param_types.iter().map(|s| (*s).to_string()).collect();
        self.methods
            .push(MetaMethod::new(name, params, return_type, kind, index));
        index
    }

    /// All entries in declaration order
    pub fn methods(&self) -> &[MetaMethod] {
        &self.methods
    }

    /// Entry at a stable index
    pub fn method(&self, index: usize) -> Option<&MetaMethod> {
        self.methods.get(index)
    }

    /// The signal subset of the table, in declaration order
    pub fn signals(&self) -> impl Iterator<Item = &MetaMethod> {
        self.methods
            .iter()
            .filter(|m| m.kind() == MethodKind::Signal)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Normalize a signature string by stripping whitespace, so that
/// `changed( int )` and `changed(int)` compare equal.
pub fn normalize_signature(signature: &str) -> String {
    signature.chars().filter(|c| !c.is_whitespace()).collect()
}
