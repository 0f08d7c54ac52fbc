//! Error types for the bridge boundary
//!
//! Every failure the bridge can produce is surfaced to the script as a
//! single uniform error condition carrying a human-readable message. The
//! variants below are internal taxonomy; nothing on the script side of the
//! boundary dispatches on them.

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// Receiver userdata does not match the object the accessor was created for
    #[error("Userdata provided with member call must match the userdata used to access that member")]
    ReceiverMismatch,

    /// Receiver's foreign object is gone
    #[error("Userdata must have an associated internal object")]
    DeadObject,

    /// Receiver wraps an object of the wrong runtime type
    #[error("Userdata must be of type {expected}, but was given: '{got}'")]
    ReceiverType {
        /// Runtime type tag the accessor was created for
        expected: String,
        /// Runtime type tag of the userdata actually supplied
        got: String,
    },

    /// No method matched the requested name under the tiered search
    #[error("No method found with name '{0}'")]
    NoSuchMethod(String),

    /// No signal matched the requested name
    #[error("No signal for name: {0}")]
    NoSuchSignal(String),

    /// More than one signal candidate matched a name-prefix search
    #[error("Ambiguous signal name: {0}")]
    AmbiguousSignal(String),

    /// Fixed-arity operation given the wrong argument count
    #[error("Exactly {expected} arguments must be provided. Given {got}")]
    ArgumentCount {
        /// Required argument count
        expected: usize,
        /// Argument count actually supplied
        got: usize,
    },

    /// Type mismatch during value extraction or coercion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// A declared parameter type has no known boxed representation
    #[error("No boxed representation for type '{type_name}'; cannot invoke method: {signature}")]
    Unconvertible {
        /// The unregistered parameter type name
        type_name: String,
        /// Full signature of the method that could not be invoked
        signature: String,
    },

    /// Assignment to a property that does not exist on the object
    #[error("New properties must not be added to this userdata: '{0}'")]
    InvalidMutation(String),

    /// Foreign-side invocation failed
    #[error("Invocation error: {0}")]
    Invocation(String),
}
