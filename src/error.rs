use std::fmt;

use thiserror::Error;

use crate::ast::Location;
use crate::interpreter::ObjectClass;
use crate::types::{JsString, JsValue};

/// Script-visible error classes raised by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Type,
    Range,
    Reference,
    Syntax,
    /// A lexical redeclaration. Materialized as a `TypeError`.
    Redeclaration,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Type | ErrorKind::Redeclaration => "TypeError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Syntax => "SyntaxError",
        }
    }
}

/// Conditions that are bugs or host-level aborts rather than script errors.
/// None of these can be caught by a script `try`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
    #[error("lazy property '{0}' was read while its resolver was running")]
    LazyReentrancy(String),
    #[error("execution interrupted by host")]
    Interrupted,
}

#[derive(Debug, Error)]
pub enum JsError {
    /// A thrown script value, catchable by `try`.
    #[error("{}", describe_thrown(.0))]
    Throw(JsValue),
    /// A throw that escaped the script, with the location of the throwing statement.
    #[error("Uncaught {} at {location}", describe_thrown(.value))]
    Uncaught { value: JsValue, location: Location },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type JsResult<T> = Result<T, JsError>;

impl JsError {
    pub fn thrown_value(&self) -> Option<&JsValue> {
        match self {
            JsError::Throw(value) | JsError::Uncaught { value, .. } => Some(value),
            JsError::Engine(_) => None,
        }
    }

    /// The class of a thrown error object created by the runtime.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.thrown_value()? {
            JsValue::Object(o) => match o.borrow().class {
                ObjectClass::Error(kind) => Some(kind),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_catchable(&self) -> bool {
        matches!(self, JsError::Throw(_))
    }
}

// Error objects are described from their own/inherited data properties only,
// so formatting never runs script code.
fn describe_thrown(value: &JsValue) -> String {
    let JsValue::Object(obj) = value else {
        return value.to_string();
    };
    let read = |key: &str| -> Option<JsString> {
        match obj.borrow().find_data_property(&JsString::from_str(key)) {
            Some(JsValue::String(s)) => Some(s),
            _ => None,
        }
    };
    match (read("name"), read("message")) {
        (Some(name), Some(msg)) if msg.is_empty() => name.to_rust_string(),
        (Some(name), Some(msg)) if !name.is_empty() => format!("{name}: {msg}"),
        (_, Some(msg)) => msg.to_rust_string(),
        (Some(name), None) => name.to_rust_string(),
        (None, None) => value.to_string(),
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
