//! ScriptValue - the dynamically-typed script value model
//!
//! Values travel between the script runtime and the bridge exclusively
//! through the [`ScriptStack`](crate::stack::ScriptStack). Callables and
//! userdata are reference-counted so the bridge can retain them past the
//! script scope that produced them (slot callables in particular must
//! outlive their connect call).

use std::rc::Rc;

use crate::error::BridgeResult;
use crate::stack::ScriptStack;
use crate::userdata::Userdata;

/// A script-side callable invoked with the value stack as its sole channel.
///
/// Arguments arrive on the stack; results are left on the stack. The
/// reference count is the retention mechanism for slots and cached thunks.
pub type ScriptCallable = Rc<dyn Fn(&mut ScriptStack) -> BridgeResult<()>>;

/// A dynamically-typed script value.
#[derive(Clone)]
pub enum ScriptValue {
    /// Absent-value sentinel
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating-point number
    Float(f64),
    /// String
    Str(String),
    /// Callable (function/closure)
    Callable(ScriptCallable),
    /// Opaque userdata handle wrapping a foreign object
    Userdata(Rc<Userdata>),
}

impl ScriptValue {
    /// Runtime type name, as reported to scripts and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Int(_) => "integer",
            ScriptValue::Float(_) => "number",
            ScriptValue::Str(_) => "string",
            ScriptValue::Callable(_) => "function",
            ScriptValue::Userdata(_) => "userdata",
        }
    }

    /// Check if this is the absent-value sentinel
    pub fn is_null(&self) -> bool {
        matches!(self, ScriptValue::Null)
    }

    /// Get as boolean if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScriptValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float if this is a number (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ScriptValue::Float(f) => Some(*f),
            ScriptValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the callable if this is a function
    pub fn as_callable(&self) -> Option<&ScriptCallable> {
        match self {
            ScriptValue::Callable(f) => Some(f),
            _ => None,
        }
    }

    /// Get the userdata handle if this is a userdata
    pub fn as_userdata(&self) -> Option<&Rc<Userdata>> {
        match self {
            ScriptValue::Userdata(u) => Some(u),
            _ => None,
        }
    }
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScriptValue::Null, ScriptValue::Null) => true,
            (ScriptValue::Bool(a), ScriptValue::Bool(b)) => a == b,
            (ScriptValue::Int(a), ScriptValue::Int(b)) => a == b,
            (ScriptValue::Float(a), ScriptValue::Float(b)) => a == b,
            (ScriptValue::Str(a), ScriptValue::Str(b)) => a == b,
            // Reference identity for callables and userdata
            (ScriptValue::Callable(a), ScriptValue::Callable(b)) => Rc::ptr_eq(a, b),
            (ScriptValue::Userdata(a), ScriptValue::Userdata(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptValue::Null => write!(f, "Null"),
            ScriptValue::Bool(b) => write!(f, "Bool({})", b),
            ScriptValue::Int(i) => write!(f, "Int({})", i),
            ScriptValue::Float(x) => write!(f, "Float({})", x),
            ScriptValue::Str(s) => write!(f, "Str({:?})", s),
            ScriptValue::Callable(c) => write!(f, "Callable({:p})", Rc::as_ptr(c)),
            ScriptValue::Userdata(u) => write!(f, "Userdata({:?})", u.id()),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<i64> for ScriptValue {
    fn from(i: i64) -> Self {
        ScriptValue::Int(i)
    }
}

impl From<f64> for ScriptValue {
    fn from(f: f64) -> Self {
        ScriptValue::Float(f)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::Str(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::Str(s)
    }
}
