use std::cell::Cell;
use std::rc::Rc;

use crate::ast::{Location, Program};
use crate::error::{EngineError, ErrorKind, JsError, JsResult};
use crate::options::Options;
use crate::types::{FIRST_USER_SYMBOL_ID, JsObject, JsString, JsSymbol, JsValue, WellKnownSymbol};

mod types;
pub use types::*;

mod conversions;
pub use conversions::{
    PreferredType, is_strictly_equal, same_value, same_value_zero, string_to_number, type_of,
};
mod environment;
pub use environment::{
    DeclarativeRecord, EnvRef, Environment, EnvironmentRecord, GlobalRecord, ObjectRecord,
};
mod property;
pub use property::{
    DescriptorKind, HostBinding, LazyValue, PropertyDescriptor, PropertyFlags, PropertyKey,
};
mod property_store;
mod object;
pub use object::ForInIterator;
mod realm;
use realm::Realm;
mod function;
mod exec;
mod eval;
pub use eval::Reference;

/// One realm plus the state of the running script.
pub struct Interpreter {
    pub(crate) realm: Realm,
    pub(crate) options: Options,
    next_symbol_id: u64,
    call_depth: usize,
    /// Location of the statement that threw inside the innermost call that
    /// ended in a throw, consumed when the throw is re-attached to a statement.
    throw_location: Option<Location>,
    interrupt: Rc<Cell<bool>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            realm: Realm::new(options.property_list_cutover),
            options,
            next_symbol_id: FIRST_USER_SYMBOL_ID,
            call_depth: 0,
            throw_location: None,
            interrupt: Rc::new(Cell::new(false)),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn global_env(&self) -> EnvRef {
        self.realm.global_env.clone()
    }

    pub fn global_object(&self) -> JsObject {
        self.realm.global_object.clone()
    }

    /// Setting the returned flag aborts the running script at the next
    /// statement boundary with [`EngineError::Interrupted`].
    pub fn interrupt_handle(&self) -> Rc<Cell<bool>> {
        self.interrupt.clone()
    }

    pub(crate) fn alloc_object(&self, class: ObjectClass, prototype: Option<JsObject>) -> JsObject {
        JsObject::new(ObjectData::new(
            class,
            prototype,
            self.options.property_list_cutover,
        ))
    }

    /// An ordinary object inheriting from `%Object.prototype%`.
    pub fn create_object(&self) -> JsObject {
        self.alloc_object(
            ObjectClass::Object,
            Some(self.realm.intrinsics.object_prototype.clone()),
        )
    }

    pub fn create_object_with_proto(&self, prototype: Option<JsObject>) -> JsObject {
        self.alloc_object(ObjectClass::Object, prototype)
    }

    pub fn create_native_function(
        &mut self,
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
    ) -> JsValue {
        let func = JsFunction::native(name, arity, f);
        JsValue::Object(self.create_function_object(func, name, arity))
    }

    pub fn new_symbol(&mut self, description: Option<&str>) -> JsSymbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        JsSymbol::new(id, description.map(JsString::from_str))
    }

    pub fn well_known_symbol(&self, symbol: WellKnownSymbol) -> JsSymbol {
        symbol.symbol()
    }

    /// A fresh error object of `kind` with an own, non-enumerable `message`.
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> JsValue {
        let proto = self.realm.intrinsics.error_prototype_for(kind).clone();
        let obj = self.alloc_object(ObjectClass::Error(kind), Some(proto));
        obj.borrow_mut().store(
            PropertyKey::from("message"),
            PropertyDescriptor::data(JsValue::string(message), true, false, true),
        );
        JsValue::Object(obj)
    }

    pub fn throw_error<T>(&mut self, kind: ErrorKind, message: impl Into<String>) -> JsResult<T> {
        let message = message.into();
        tracing::trace!(kind = kind.name(), %message, "throw");
        self.throw_location = None;
        Err(JsError::Throw(self.create_error(kind, &message)))
    }

    /// Runs a script in the global environment and returns its completion value.
    ///
    /// A throw that escapes the script is reported as [`JsError::Uncaught`]
    /// with the location of the throwing statement.
    pub fn run(&mut self, program: &Program) -> JsResult<JsValue> {
        let strict = self.options.strict || program.body.declarations().strict_directive;
        let env = self.global_env();
        env.set_strict(strict);
        self.call_depth = 0;
        let completion = match self.exec_script(&program.body, &env) {
            Ok(completion) => completion,
            Err(e) => {
                tracing::warn!(error = %e, "script aborted");
                return Err(e.into());
            }
        };
        match completion {
            Completion::Normal(value) => Ok(value.unwrap_or(JsValue::Undefined)),
            Completion::Return(value, _) => Ok(value),
            Completion::Throw(value, location) => Err(JsError::Uncaught { value, location }),
            Completion::Break(..) | Completion::Continue(..) => {
                let e = EngineError::Invariant("break or continue escaped the script");
                tracing::warn!(error = %e, "script aborted");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_objects_carry_kind_and_message() {
        let mut interp = Interpreter::new();
        let err = interp.create_error(ErrorKind::Range, "too deep");
        let obj = err.as_object().unwrap().clone();
        assert_eq!(obj.borrow().class, ObjectClass::Error(ErrorKind::Range));
        let message = obj.borrow().own(&PropertyKey::from("message")).cloned().unwrap();
        assert_eq!(message.enumerable(), Some(false));
        let thrown = JsError::Throw(err);
        assert_eq!(thrown.to_string(), "RangeError: too deep");
    }

    #[test]
    fn redeclaration_errors_are_type_errors() {
        let mut interp = Interpreter::new();
        let err = interp.create_error(ErrorKind::Redeclaration, "x");
        let name = err
            .as_object()
            .and_then(|o| o.borrow().find_data_property(&JsString::from_str("name")));
        assert_eq!(name.map(|v| v.to_string()), Some("TypeError".to_string()));
    }

    #[test]
    fn user_symbols_never_collide_with_well_known() {
        let mut interp = Interpreter::new();
        let a = interp.new_symbol(Some("a"));
        let b = interp.new_symbol(Some("a"));
        assert_ne!(a, b);
        for wk in WellKnownSymbol::ALL {
            assert_ne!(a, interp.well_known_symbol(wk));
        }
    }

    #[test]
    fn global_value_properties_are_frozen() {
        let interp = Interpreter::new();
        let global = interp.global_object();
        for name in ["undefined", "NaN", "Infinity"] {
            let desc = global.borrow().own(&PropertyKey::from(name)).cloned().unwrap();
            assert_eq!(desc.writable(), Some(false));
            assert_eq!(desc.configurable(), Some(false));
        }
    }

    #[test]
    fn options_reach_property_storage() {
        let interp = Interpreter::with_options(Options::default().with_property_list_cutover(2));
        let obj = interp.create_object();
        for k in ["a", "b", "c"] {
            obj.borrow_mut()
                .store(PropertyKey::from(k), PropertyDescriptor::data_default(JsValue::Null));
        }
        assert!(obj.borrow().properties.is_hashed());
    }
}
