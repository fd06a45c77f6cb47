//! Tree-walking runtime core for ECMAScript: the value model, coercions,
//! property descriptors, environment records and statement execution.
//!
//! Source parsing and the built-in library are left to the host. A host
//! builds (or parses into) an [`ast::Program`] and runs it:
//!
//! ```
//! use jsse_core::ast::build::*;
//! use jsse_core::ast::BinaryOp;
//! use jsse_core::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! let program = program(vec![
//!     var("x", Some(num(20.0))),
//!     expr(binary(BinaryOp::Add, ident("x"), num(22.0))),
//! ]);
//! let result = interp.run(&program).unwrap();
//! assert_eq!(result.to_string(), "42");
//! ```

pub mod ast;
pub mod dtoa;
pub mod error;
pub mod interpreter;
pub mod options;
mod stack;
pub mod types;

pub use error::{EngineError, ErrorKind, JsError, JsResult};
pub use interpreter::{Completion, Interpreter, PropertyDescriptor, PropertyKey};
pub use options::Options;
pub use types::{JsObject, JsString, JsSymbol, JsValue, WellKnownSymbol};
