use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::Interpreter;
use super::property::{PropertyDescriptor, PropertyKey};
use crate::error::{EngineError, ErrorKind, JsResult};
use crate::types::{JsObject, JsValue, WellKnownSymbol};

pub type EnvRef = Rc<Environment>;

/// One scope in the chain.
pub struct Environment {
    pub(crate) record: EnvironmentRecord,
    pub(crate) outer: Option<EnvRef>,
    strict: Cell<bool>,
}

pub enum EnvironmentRecord {
    Declarative(DeclarativeRecord),
    Object(ObjectRecord),
    Global(GlobalRecord),
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    /// `None` while in the temporal dead zone.
    pub(crate) value: Option<JsValue>,
    pub(crate) can_delete: bool,
    pub(crate) mutable: bool,
    pub(crate) strict: bool,
}

#[derive(Default)]
pub struct DeclarativeRecord {
    bindings: RefCell<FxHashMap<Rc<str>, Binding>>,
    /// Present for function scopes of non-arrow functions.
    this_value: Option<JsValue>,
}

pub struct ObjectRecord {
    pub(crate) binding_object: JsObject,
    /// Set for `with` scopes: `@@unscopables` applies and the object is the
    /// implicit `this` of calls resolved through it.
    pub(crate) with_environment: bool,
}

pub struct GlobalRecord {
    pub(crate) object: ObjectRecord,
    pub(crate) declarative: DeclarativeRecord,
    var_names: RefCell<FxHashSet<Rc<str>>>,
}

fn key(name: &str) -> PropertyKey {
    PropertyKey::from(name)
}

impl DeclarativeRecord {
    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    fn create_binding(
        &self,
        interp: &mut Interpreter,
        name: Rc<str>,
        binding: Binding,
    ) -> JsResult<()> {
        if self.has_binding(&name) {
            return interp.throw_error(
                ErrorKind::Redeclaration,
                format!("Identifier '{name}' has already been declared"),
            );
        }
        tracing::trace!(name = %name, mutable = binding.mutable, "create binding");
        self.bindings.borrow_mut().insert(name, binding);
        Ok(())
    }

    pub fn create_mutable_binding(
        &self,
        interp: &mut Interpreter,
        name: Rc<str>,
        can_delete: bool,
    ) -> JsResult<()> {
        let binding = Binding {
            value: None,
            can_delete,
            mutable: true,
            strict: false,
        };
        self.create_binding(interp, name, binding)
    }

    pub fn create_immutable_binding(
        &self,
        interp: &mut Interpreter,
        name: Rc<str>,
        strict: bool,
    ) -> JsResult<()> {
        let binding = Binding {
            value: None,
            can_delete: false,
            mutable: false,
            strict,
        };
        self.create_binding(interp, name, binding)
    }

    pub fn initialize_binding(&self, name: &str, value: JsValue) -> JsResult<()> {
        match self.bindings.borrow_mut().get_mut(name) {
            Some(binding) => {
                binding.value = Some(value);
                Ok(())
            }
            None => Err(EngineError::Invariant("initializing a binding that was never created").into()),
        }
    }

    pub fn set_mutable_binding(
        &self,
        interp: &mut Interpreter,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> JsResult<()> {
        let existing = self.bindings.borrow().get(name).cloned();
        let Some(binding) = existing else {
            if strict {
                return interp.throw_error(ErrorKind::Reference, format!("{name} is not defined"));
            }
            self.create_mutable_binding(interp, Rc::from(name), true)?;
            return self.initialize_binding(name, value);
        };
        let strict = strict || binding.strict;
        if binding.value.is_none() {
            return interp.throw_error(
                ErrorKind::Reference,
                format!("Cannot access '{name}' before initialization"),
            );
        }
        if binding.mutable {
            if let Some(slot) = self.bindings.borrow_mut().get_mut(name) {
                slot.value = Some(value);
            }
            Ok(())
        } else if strict {
            interp.throw_error(ErrorKind::Type, "Assignment to constant variable.")
        } else {
            Ok(())
        }
    }

    pub fn get_binding_value(&self, interp: &mut Interpreter, name: &str) -> JsResult<JsValue> {
        let value = self.bindings.borrow().get(name).map(|b| b.value.clone());
        match value {
            Some(Some(value)) => Ok(value),
            Some(None) => interp.throw_error(
                ErrorKind::Reference,
                format!("Cannot access '{name}' before initialization"),
            ),
            None => interp.throw_error(ErrorKind::Reference, format!("{name} is not defined")),
        }
    }

    pub fn delete_binding(&self, name: &str) -> bool {
        let mut bindings = self.bindings.borrow_mut();
        match bindings.get(name) {
            None => true,
            Some(b) if b.can_delete => {
                bindings.remove(name);
                true
            }
            Some(_) => false,
        }
    }
}

impl ObjectRecord {
    fn has_binding(&self, interp: &mut Interpreter, name: &str) -> JsResult<bool> {
        let obj = self.binding_object.clone();
        if !interp.has_property(&obj, &key(name))? {
            return Ok(false);
        }
        if !self.with_environment {
            return Ok(true);
        }
        let unscopables_key = PropertyKey::Symbol(WellKnownSymbol::Unscopables.symbol());
        let unscopables = interp.get(&obj, &unscopables_key, &JsValue::Object(obj.clone()))?;
        if let JsValue::Object(unscopables) = unscopables {
            let receiver = JsValue::Object(unscopables.clone());
            let blocked = interp.get(&unscopables, &key(name), &receiver)?;
            if Interpreter::to_boolean(&blocked) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn create_mutable_binding(
        &self,
        interp: &mut Interpreter,
        name: &str,
        can_delete: bool,
    ) -> JsResult<()> {
        let desc = PropertyDescriptor::data(JsValue::Undefined, true, true, can_delete);
        interp.define_property_or_throw(&self.binding_object, key(name), desc)
    }

    fn set_mutable_binding(
        &self,
        interp: &mut Interpreter,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> JsResult<()> {
        let obj = self.binding_object.clone();
        let k = key(name);
        let still_exists = interp.has_property(&obj, &k)?;
        if !still_exists && strict {
            return interp.throw_error(ErrorKind::Reference, format!("{name} is not defined"));
        }
        let ok = interp.set(&obj, k, value, &JsValue::Object(obj.clone()))?;
        if !ok && strict {
            return interp.throw_error(
                ErrorKind::Type,
                format!("Cannot assign to read only property '{name}'"),
            );
        }
        Ok(())
    }

    fn get_binding_value(
        &self,
        interp: &mut Interpreter,
        name: &str,
        strict: bool,
    ) -> JsResult<JsValue> {
        let obj = self.binding_object.clone();
        let k = key(name);
        if !interp.has_property(&obj, &k)? {
            if strict {
                return interp.throw_error(ErrorKind::Reference, format!("{name} is not defined"));
            }
            return Ok(JsValue::Undefined);
        }
        interp.get(&obj, &k, &JsValue::Object(obj.clone()))
    }
}

impl GlobalRecord {
    pub fn global_object(&self) -> &JsObject {
        &self.object.binding_object
    }

    pub fn has_var_declaration(&self, name: &str) -> bool {
        self.var_names.borrow().contains(name)
    }

    pub fn has_lexical_declaration(&self, name: &str) -> bool {
        self.declarative.has_binding(name)
    }

    /// True when the global object owns a non-configurable property `name`.
    pub fn has_restricted_global_property(
        &self,
        interp: &mut Interpreter,
        name: &str,
    ) -> JsResult<bool> {
        let existing = interp.get_own_property(self.global_object(), &key(name))?;
        Ok(existing.is_some_and(|d| !d.is_configurable()))
    }

    pub fn can_declare_global_var(&self, interp: &mut Interpreter, name: &str) -> JsResult<bool> {
        let global = self.global_object().clone();
        if interp.has_own_property(&global, &key(name))? {
            return Ok(true);
        }
        Ok(interp.is_extensible(&global))
    }

    pub fn can_declare_global_function(
        &self,
        interp: &mut Interpreter,
        name: &str,
    ) -> JsResult<bool> {
        let global = self.global_object().clone();
        let Some(existing) = interp.get_own_property(&global, &key(name))? else {
            return Ok(interp.is_extensible(&global));
        };
        if existing.is_configurable() {
            return Ok(true);
        }
        Ok(existing.is_data_descriptor() && existing.is_writable() && existing.is_enumerable())
    }

    pub fn create_global_var_binding(
        &self,
        interp: &mut Interpreter,
        name: Rc<str>,
        can_delete: bool,
    ) -> JsResult<()> {
        let global = self.global_object().clone();
        let has_own = interp.has_own_property(&global, &key(&name))?;
        if !has_own && interp.is_extensible(&global) {
            self.object.create_mutable_binding(interp, &name, can_delete)?;
            self.object
                .set_mutable_binding(interp, &name, JsValue::Undefined, false)?;
        }
        self.var_names.borrow_mut().insert(name);
        Ok(())
    }

    pub fn create_global_function_binding(
        &self,
        interp: &mut Interpreter,
        name: Rc<str>,
        value: JsValue,
        can_delete: bool,
    ) -> JsResult<()> {
        let global = self.global_object().clone();
        let k = key(&name);
        let existing = interp.get_own_property(&global, &k)?;
        let desc = match existing {
            Some(d) if !d.is_configurable() => PropertyDescriptor::generic().with_value(value.clone()),
            _ => PropertyDescriptor::data(value.clone(), true, true, can_delete),
        };
        interp.define_property_or_throw(&global, k.clone(), desc)?;
        interp.set(&global, k, value, &JsValue::Object(global.clone()))?;
        self.var_names.borrow_mut().insert(name);
        Ok(())
    }
}

impl Environment {
    fn with_record(record: EnvironmentRecord, outer: Option<EnvRef>, strict: bool) -> EnvRef {
        Rc::new(Environment {
            record,
            outer,
            strict: Cell::new(strict),
        })
    }

    /// A block scope inheriting strictness from `outer`.
    pub fn declarative(outer: &EnvRef) -> EnvRef {
        tracing::trace!("push declarative scope");
        Self::with_record(
            EnvironmentRecord::Declarative(DeclarativeRecord::default()),
            Some(outer.clone()),
            outer.is_strict(),
        )
    }

    /// A function scope; `this_value` is `None` for arrow functions.
    pub fn function(outer: EnvRef, this_value: Option<JsValue>, strict: bool) -> EnvRef {
        tracing::trace!(strict, "push function scope");
        let record = DeclarativeRecord {
            bindings: RefCell::default(),
            this_value,
        };
        Self::with_record(EnvironmentRecord::Declarative(record), Some(outer), strict)
    }

    pub fn object(binding_object: JsObject, with_environment: bool, outer: &EnvRef) -> EnvRef {
        tracing::trace!(with_environment, "push object scope");
        let record = ObjectRecord {
            binding_object,
            with_environment,
        };
        Self::with_record(EnvironmentRecord::Object(record), Some(outer.clone()), outer.is_strict())
    }

    pub fn global(global_object: JsObject) -> EnvRef {
        let record = GlobalRecord {
            object: ObjectRecord {
                binding_object: global_object.clone(),
                with_environment: false,
            },
            declarative: DeclarativeRecord {
                bindings: RefCell::default(),
                this_value: Some(JsValue::Object(global_object)),
            },
            var_names: RefCell::default(),
        };
        Self::with_record(EnvironmentRecord::Global(record), None, false)
    }

    pub fn outer(&self) -> Option<&EnvRef> {
        self.outer.as_ref()
    }

    pub fn is_strict(&self) -> bool {
        self.strict.get()
    }

    pub(crate) fn set_strict(&self, strict: bool) {
        self.strict.set(strict);
    }

    pub fn global_record(&self) -> Option<&GlobalRecord> {
        match &self.record {
            EnvironmentRecord::Global(g) => Some(g),
            _ => None,
        }
    }

    pub fn has_binding(&self, interp: &mut Interpreter, name: &str) -> JsResult<bool> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => Ok(d.has_binding(name)),
            EnvironmentRecord::Object(o) => o.has_binding(interp, name),
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    return Ok(true);
                }
                g.object.has_binding(interp, name)
            }
        }
    }

    pub fn create_mutable_binding(
        &self,
        interp: &mut Interpreter,
        name: Rc<str>,
        can_delete: bool,
    ) -> JsResult<()> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => d.create_mutable_binding(interp, name, can_delete),
            EnvironmentRecord::Object(o) => o.create_mutable_binding(interp, &name, can_delete),
            EnvironmentRecord::Global(g) => {
                g.declarative.create_mutable_binding(interp, name, can_delete)
            }
        }
    }

    pub fn create_immutable_binding(
        &self,
        interp: &mut Interpreter,
        name: Rc<str>,
        strict: bool,
    ) -> JsResult<()> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => d.create_immutable_binding(interp, name, strict),
            EnvironmentRecord::Global(g) => g.declarative.create_immutable_binding(interp, name, strict),
            EnvironmentRecord::Object(_) => {
                Err(EngineError::Invariant("object environments have no immutable bindings").into())
            }
        }
    }

    pub fn initialize_binding(
        &self,
        interp: &mut Interpreter,
        name: &str,
        value: JsValue,
    ) -> JsResult<()> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => d.initialize_binding(name, value),
            EnvironmentRecord::Object(o) => o.set_mutable_binding(interp, name, value, false),
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    g.declarative.initialize_binding(name, value)
                } else {
                    g.object.set_mutable_binding(interp, name, value, false)
                }
            }
        }
    }

    pub fn set_mutable_binding(
        &self,
        interp: &mut Interpreter,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> JsResult<()> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => d.set_mutable_binding(interp, name, value, strict),
            EnvironmentRecord::Object(o) => o.set_mutable_binding(interp, name, value, strict),
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    g.declarative.set_mutable_binding(interp, name, value, strict)
                } else {
                    g.object.set_mutable_binding(interp, name, value, strict)
                }
            }
        }
    }

    pub fn get_binding_value(
        &self,
        interp: &mut Interpreter,
        name: &str,
        strict: bool,
    ) -> JsResult<JsValue> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => d.get_binding_value(interp, name),
            EnvironmentRecord::Object(o) => o.get_binding_value(interp, name, strict),
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    g.declarative.get_binding_value(interp, name)
                } else {
                    g.object.get_binding_value(interp, name, strict)
                }
            }
        }
    }

    pub fn delete_binding(&self, interp: &mut Interpreter, name: &str) -> JsResult<bool> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => Ok(d.delete_binding(name)),
            EnvironmentRecord::Object(o) => interp.delete(&o.binding_object.clone(), &key(name)),
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    return Ok(g.declarative.delete_binding(name));
                }
                let global = g.global_object().clone();
                if interp.has_own_property(&global, &key(name))? {
                    let status = interp.delete(&global, &key(name))?;
                    if status {
                        g.var_names.borrow_mut().remove(name);
                    }
                    return Ok(status);
                }
                Ok(true)
            }
        }
    }

    pub fn has_this_binding(&self) -> bool {
        match &self.record {
            EnvironmentRecord::Declarative(d) => d.this_value.is_some(),
            EnvironmentRecord::Object(_) => false,
            EnvironmentRecord::Global(_) => true,
        }
    }

    pub fn this_value(&self) -> Option<JsValue> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => d.this_value.clone(),
            EnvironmentRecord::Object(_) => None,
            EnvironmentRecord::Global(g) => Some(JsValue::Object(g.global_object().clone())),
        }
    }

    pub fn with_base_object(&self) -> Option<JsObject> {
        match &self.record {
            EnvironmentRecord::Object(o) if o.with_environment => Some(o.binding_object.clone()),
            _ => None,
        }
    }

    /// Direct binding read for host-bound properties: absent or uninitialized reads as `None`.
    pub(crate) fn declarative_value(&self, name: &str) -> Option<JsValue> {
        let record = match &self.record {
            EnvironmentRecord::Declarative(d) => d,
            EnvironmentRecord::Global(g) => &g.declarative,
            EnvironmentRecord::Object(_) => return None,
        };
        record.bindings.borrow().get(name).and_then(|b| b.value.clone())
    }

    /// Direct binding write for host-bound properties. Immutable or missing
    /// bindings are left untouched.
    pub(crate) fn declarative_store(&self, name: &str, value: JsValue) {
        let record = match &self.record {
            EnvironmentRecord::Declarative(d) => d,
            EnvironmentRecord::Global(g) => &g.declarative,
            EnvironmentRecord::Object(_) => return,
        };
        if let Some(binding) = record.bindings.borrow_mut().get_mut(name)
            && binding.mutable
        {
            binding.value = Some(value);
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.record {
            EnvironmentRecord::Declarative(_) => "Declarative",
            EnvironmentRecord::Object(_) => "Object",
            EnvironmentRecord::Global(_) => "Global",
        };
        f.debug_struct("Environment")
            .field("kind", &kind)
            .field("strict", &self.is_strict())
            .field("has_outer", &self.outer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsError;

    fn name(s: &str) -> Rc<str> {
        Rc::from(s)
    }

    #[test]
    fn binding_lifecycle() {
        let mut interp = Interpreter::new();
        let env = Environment::declarative(&interp.global_env());
        env.create_mutable_binding(&mut interp, name("x"), false).unwrap();
        let err = env.get_binding_value(&mut interp, "x", false).unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Reference));

        env.initialize_binding(&mut interp, "x", JsValue::integer(1)).unwrap();
        env.set_mutable_binding(&mut interp, "x", JsValue::integer(2), true).unwrap();
        let v = env.get_binding_value(&mut interp, "x", false).unwrap();
        assert_eq!(v.as_number(), Some(2.0));
        assert!(!env.delete_binding(&mut interp, "x").unwrap());
    }

    #[test]
    fn redeclaration_is_a_type_error() {
        let mut interp = Interpreter::new();
        let env = Environment::declarative(&interp.global_env());
        env.create_mutable_binding(&mut interp, name("a"), false).unwrap();
        let err = env
            .create_immutable_binding(&mut interp, name("a"), true)
            .unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Redeclaration));
        assert!(err.to_string().contains("TypeError"));
    }

    #[test]
    fn immutable_assignment_depends_on_strictness() {
        let mut interp = Interpreter::new();
        let env = Environment::declarative(&interp.global_env());
        env.create_immutable_binding(&mut interp, name("c"), false).unwrap();
        env.initialize_binding(&mut interp, "c", JsValue::integer(1)).unwrap();
        env.set_mutable_binding(&mut interp, "c", JsValue::integer(2), false).unwrap();
        let err = env
            .set_mutable_binding(&mut interp, "c", JsValue::integer(3), true)
            .unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Type));
        let v = env.get_binding_value(&mut interp, "c", false).unwrap();
        assert_eq!(v.as_number(), Some(1.0));
    }

    #[test]
    fn missing_binding_assignment() {
        let mut interp = Interpreter::new();
        let env = Environment::declarative(&interp.global_env());
        let err = env
            .set_mutable_binding(&mut interp, "nope", JsValue::Null, true)
            .unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Reference));
        env.set_mutable_binding(&mut interp, "nope", JsValue::Null, false).unwrap();
        assert!(env.has_binding(&mut interp, "nope").unwrap());
        assert!(env.delete_binding(&mut interp, "nope").unwrap());
    }

    #[test]
    fn global_lexical_shadows_object_layer() {
        let mut interp = Interpreter::new();
        let global_env = interp.global_env();
        let global = global_env.global_record().unwrap();
        global
            .create_global_var_binding(&mut interp, name("v"), false)
            .unwrap();
        assert!(global.has_var_declaration("v"));
        assert!(interp.global_object().borrow().own(&key("v")).is_some());

        global_env
            .create_mutable_binding(&mut interp, name("l"), false)
            .unwrap();
        global_env
            .initialize_binding(&mut interp, "l", JsValue::integer(5))
            .unwrap();
        assert!(global.has_lexical_declaration("l"));
        assert!(interp.global_object().borrow().own(&key("l")).is_none());

        let err = global_env
            .create_mutable_binding(&mut interp, name("l"), false)
            .unwrap_err();
        assert!(matches!(err, JsError::Throw(_)));
    }

    #[test]
    fn global_reads_fall_back_through_prototype_chain() {
        let mut interp = Interpreter::new();
        let grandparent = interp.create_object();
        interp
            .create_data_property_or_throw(&grandparent, key("inherited"), JsValue::integer(9))
            .unwrap();
        let parent = interp.create_object_with_proto(Some(grandparent));
        interp.set_prototype_of(&interp.global_object(), Some(parent));

        let env = interp.global_env();
        assert!(env.has_binding(&mut interp, "inherited").unwrap());
        let v = env.get_binding_value(&mut interp, "inherited", true).unwrap();
        assert_eq!(v.as_number(), Some(9.0));

        env.set_mutable_binding(&mut interp, "inherited", JsValue::integer(1), false)
            .unwrap();
        let own = interp.global_object().borrow().own(&key("inherited")).cloned();
        assert!(own.is_some_and(|d| d.value().and_then(JsValue::as_number) == Some(1.0)));
    }

    #[test]
    fn can_declare_global_function_respects_non_configurable() {
        let mut interp = Interpreter::new();
        let global_env = interp.global_env();
        let global = global_env.global_record().unwrap();
        // `undefined` is installed non-writable and non-configurable.
        assert!(!global.can_declare_global_function(&mut interp, "undefined").unwrap());
        assert!(global.has_restricted_global_property(&mut interp, "undefined").unwrap());
        assert!(global.can_declare_global_function(&mut interp, "fresh").unwrap());
        assert!(global.can_declare_global_var(&mut interp, "fresh").unwrap());

        interp.prevent_extensions(&interp.global_object());
        assert!(!global.can_declare_global_var(&mut interp, "other").unwrap());
    }

    #[test]
    fn host_binding_reads_are_lenient() {
        let mut interp = Interpreter::new();
        let env = Environment::declarative(&interp.global_env());
        env.create_mutable_binding(&mut interp, name("p"), false).unwrap();
        assert!(env.declarative_value("p").is_none());
        assert!(env.declarative_value("absent").is_none());
        env.initialize_binding(&mut interp, "p", JsValue::integer(3)).unwrap();
        env.declarative_store("p", JsValue::integer(4));
        assert_eq!(env.declarative_value("p").and_then(|v| v.as_number()), Some(4.0));
    }
}
