//! Property accessor - get/set bridge for dynamic foreign properties
//!
//! Reads go through the dynamic property store before any method
//! resolution, so a valid property shadows a same-named method. Writes may
//! only mutate properties that already exist; the bridge never creates new
//! dynamic state on a foreign object.

use tether_sdk::{BridgeError, BridgeResult, ForeignObject, ScriptValue};

/// Read a dynamic property by exact name.
///
/// Returns the converted value, or `None` when the object has no valid
/// property under that name (the caller falls through to method
/// resolution).
pub fn read(obj: &dyn ForeignObject, name: &str) -> Option<ScriptValue> {
    let value = obj.property(name);
    value.is_valid().then(|| value.to_script())
}

/// Assign to an existing dynamic property by exact name.
///
/// The new value is coerced to the property's current type before the
/// write. Assigning to a name with no valid property is an invalid
/// mutation, not a definition.
pub fn write(obj: &mut dyn ForeignObject, name: &str, value: &ScriptValue) -> BridgeResult<()> {
    let mut slot = obj.property(name);
    if !slot.is_valid() {
        return Err(BridgeError::InvalidMutation(name.to_string()));
    }
    slot.store(value)?;
    obj.set_property(name, slot);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_sdk::{BoxedValue, MetaObject, ScriptStack};

    struct PropObject {
        meta: MetaObject,
        value: i64,
    }

    impl ForeignObject for PropObject {
        fn type_name(&self) -> &str {
            "PropObject"
        }
        fn meta_object(&self) -> &MetaObject {
            &self.meta
        }
        fn property(&self, name: &str) -> BoxedValue {
            match name {
                "value" => BoxedValue::Int(self.value),
                _ => BoxedValue::Invalid,
            }
        }
        fn set_property(&mut self, name: &str, value: BoxedValue) {
            if name == "value" {
                if let BoxedValue::Int(i) = value {
                    self.value = i;
                }
            }
        }
        fn meta_invoke(&mut self, _index: usize, _args: &mut [BoxedValue]) -> BridgeResult<()> {
            Ok(())
        }
        fn stack_invoke(
            &mut self,
            _index: usize,
            _ret: &mut BoxedValue,
            _stack: &mut ScriptStack,
        ) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn prop_object(value: i64) -> PropObject {
        PropObject {
            meta: MetaObject::new("PropObject"),
            value,
        }
    }

    #[test]
    fn test_read_existing() {
        let obj = prop_object(5);
        assert_eq!(read(&obj, "value"), Some(ScriptValue::Int(5)));
        assert_eq!(read(&obj, "missing"), None);
    }

    #[test]
    fn test_write_read_idempotent() {
        let mut obj = prop_object(5);
        let current = read(&obj, "value").unwrap();
        write(&mut obj, "value", &current).unwrap();
        assert_eq!(read(&obj, "value"), Some(ScriptValue::Int(5)));
    }

    #[test]
    fn test_write_coerces_to_existing_type() {
        let mut obj = prop_object(5);
        write(&mut obj, "value", &ScriptValue::Float(10.0)).unwrap();
        assert_eq!(read(&obj, "value"), Some(ScriptValue::Int(10)));
    }

    #[test]
    fn test_write_unknown_property_rejected() {
        let mut obj = prop_object(5);
        let err = write(&mut obj, "unknownProp", &ScriptValue::Int(1)).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidMutation(_)));
        assert!(err.to_string().contains("unknownProp"));
    }
}
