//! BoxedValue - the foreign system's dynamic value container
//!
//! A boxed value is a typed container capable of holding any of the foreign
//! system's value types. Generic reflective calls build one boxed container
//! per declared parameter type and coerce script arguments into them; the
//! invalid state doubles as the "no value" flag for return slots and absent
//! properties.
//!
//! The [`TypeRegistry`] maps a foreign type name to a constructor for a
//! default container of that type. A type name absent from the registry
//! cannot be marshalled generically.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::error::{BridgeError, BridgeResult};
use crate::value::ScriptValue;

/// A dynamically-typed foreign value container.
///
/// `Invalid` is the absent state: an invalid return slot means a void call,
/// an invalid property read means the property does not exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BoxedValue {
    /// No value
    #[default]
    Invalid,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating-point number
    Float(f64),
    /// String
    Str(String),
}

impl BoxedValue {
    /// Check if this container holds a value
    pub fn is_valid(&self) -> bool {
        !matches!(self, BoxedValue::Invalid)
    }

    /// Foreign type name of the contained value
    pub fn type_name(&self) -> &'static str {
        match self {
            BoxedValue::Invalid => "invalid",
            BoxedValue::Bool(_) => "bool",
            BoxedValue::Int(_) => "int",
            BoxedValue::UInt(_) => "uint",
            BoxedValue::Float(_) => "float",
            BoxedValue::Str(_) => "string",
        }
    }

    /// Coerce a script value into this container, keeping the container's
    /// type. A null (or missing) argument leaves the container at its
    /// default value for the type; an incompatible value is an error.
    pub fn store(&mut self, value: &ScriptValue) -> BridgeResult<()> {
        if value.is_null() {
            *self = Self::default_of(self.type_name());
            return Ok(());
        }
        let coerced = match (&*self, value) {
            (BoxedValue::Bool(_), ScriptValue::Bool(b)) => BoxedValue::Bool(*b),
            (BoxedValue::Bool(_), ScriptValue::Int(i)) => BoxedValue::Bool(*i != 0),
            (BoxedValue::Bool(_), ScriptValue::Float(f)) => BoxedValue::Bool(*f != 0.0),

            (BoxedValue::Int(_), ScriptValue::Int(i)) => BoxedValue::Int(*i),
            (BoxedValue::Int(_), ScriptValue::Float(f)) => BoxedValue::Int(*f as i64),
            (BoxedValue::Int(_), ScriptValue::Bool(b)) => BoxedValue::Int(*b as i64),

            (BoxedValue::UInt(_), ScriptValue::Int(i)) if *i >= 0 => BoxedValue::UInt(*i as u64),
            (BoxedValue::UInt(_), ScriptValue::Float(f)) if *f >= 0.0 => {
                BoxedValue::UInt(*f as u64)
            }
            (BoxedValue::UInt(_), ScriptValue::Bool(b)) => BoxedValue::UInt(*b as u64),

            (BoxedValue::Float(_), ScriptValue::Float(f)) => BoxedValue::Float(*f),
            (BoxedValue::Float(_), ScriptValue::Int(i)) => BoxedValue::Float(*i as f64),
            (BoxedValue::Float(_), ScriptValue::Bool(b)) => {
                BoxedValue::Float(if *b { 1.0 } else { 0.0 })
            }

            (BoxedValue::Str(_), ScriptValue::Str(s)) => BoxedValue::Str(s.clone()),
            (BoxedValue::Str(_), ScriptValue::Int(i)) => BoxedValue::Str(i.to_string()),
            (BoxedValue::Str(_), ScriptValue::Float(f)) => BoxedValue::Str(f.to_string()),
            (BoxedValue::Str(_), ScriptValue::Bool(b)) => BoxedValue::Str(b.to_string()),

            _ => {
                return Err(BridgeError::TypeMismatch {
                    expected: self.type_name().to_string(),
                    got: value.type_name().to_string(),
                })
            }
        };
        *self = coerced;
        Ok(())
    }

    /// Convert back to a script value. Invalid converts to null.
    pub fn to_script(&self) -> ScriptValue {
        match self {
            BoxedValue::Invalid => ScriptValue::Null,
            BoxedValue::Bool(b) => ScriptValue::Bool(*b),
            BoxedValue::Int(i) => ScriptValue::Int(*i),
            BoxedValue::UInt(u) => match i64::try_from(*u) {
                Ok(i) => ScriptValue::Int(i),
                Err(_) => ScriptValue::Float(*u as f64),
            },
            BoxedValue::Float(f) => ScriptValue::Float(*f),
            BoxedValue::Str(s) => ScriptValue::Str(s.clone()),
        }
    }

    fn default_of(type_name: &str) -> BoxedValue {
        BUILTIN_TYPES
            .get(type_name)
            .map(|ctor| ctor())
            .unwrap_or(BoxedValue::Invalid)
    }
}

/// Constructor for a default boxed container of some foreign type
pub type BoxedCtor = fn() -> BoxedValue;

static BUILTIN_TYPES: Lazy<FxHashMap<&'static str, BoxedCtor>> = Lazy::new(|| {
    let mut map: FxHashMap<&'static str, BoxedCtor> = FxHashMap::default();
    map.insert("bool", || BoxedValue::Bool(false));
    map.insert("int", || BoxedValue::Int(0));
    map.insert("uint", || BoxedValue::UInt(0));
    map.insert("float", || BoxedValue::Float(0.0));
    map.insert("string", || BoxedValue::Str(String::new()));
    map
});

/// Registry of constructible foreign value types.
///
/// Maps a type name to a constructor producing a default boxed container of
/// that type. Only names present here can be marshalled by the generic
/// reflective call path.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    constructors: FxHashMap<String, BoxedCtor>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in scalar types
    /// (bool, int, uint, float, string)
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, ctor) in BUILTIN_TYPES.iter() {
            registry.constructors.insert((*name).to_string(), *ctor);
        }
        registry
    }

    /// Register a constructor for a type name
    pub fn register(&mut self, name: impl Into<String>, ctor: BoxedCtor) {
        self.constructors.insert(name.into(), ctor);
    }

    /// Check if a type name is known
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Construct a default container for a type name
    pub fn construct(&self, name: &str) -> Option<BoxedValue> {
        self.constructors.get(name).map(|ctor| ctor())
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
