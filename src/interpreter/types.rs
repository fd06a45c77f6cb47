use std::fmt;
use std::rc::Rc;

use super::Interpreter;
use super::environment::EnvRef;
use super::property::{DescriptorKind, PropertyDescriptor, PropertyKey};
use super::property_store::PropertyDictionary;
use crate::ast::{Function, Location};
use crate::error::{ErrorKind, JsResult};
use crate::types::{JsObject, JsString, JsSymbol, JsValue};

/// Outcome of executing one statement.
#[derive(Debug, Clone)]
pub enum Completion {
    /// `None` is the empty completion value.
    Normal(Option<JsValue>),
    Return(JsValue, Location),
    Throw(JsValue, Location),
    Break(Option<String>, Option<JsValue>, Location),
    Continue(Option<String>, Option<JsValue>, Location),
}

impl Completion {
    pub fn empty() -> Self {
        Completion::Normal(None)
    }

    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Completion::Normal(v) | Completion::Break(_, v, _) | Completion::Continue(_, v, _) => {
                v.as_ref()
            }
            Completion::Return(v, _) | Completion::Throw(v, _) => Some(v),
        }
    }

    /// Where an abrupt completion was produced. Normal completions have none.
    pub fn location(&self) -> Option<Location> {
        match self {
            Completion::Normal(_) => None,
            Completion::Return(_, loc)
            | Completion::Throw(_, loc)
            | Completion::Break(_, _, loc)
            | Completion::Continue(_, _, loc) => Some(*loc),
        }
    }

    /// UpdateEmpty(completion, value): fills in an empty completion value.
    pub(crate) fn update_empty(self, value: Option<JsValue>) -> Self {
        match self {
            Completion::Normal(None) => Completion::Normal(value),
            Completion::Break(label, None, loc) => Completion::Break(label, value, loc),
            Completion::Continue(label, None, loc) => Completion::Continue(label, value, loc),
            other => other,
        }
    }
}

pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue>>;

#[derive(Clone)]
pub enum JsFunction {
    User {
        function: Rc<Function>,
        closure: EnvRef,
        strict: bool,
    },
    Native(Rc<str>, usize, NativeFn),
}

impl JsFunction {
    pub fn native(
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
    ) -> Self {
        JsFunction::Native(Rc::from(name), arity, Rc::new(f))
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, JsFunction::User { function, .. } if !function.is_arrow())
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsFunction::User { function, strict, .. } => {
                write!(f, "JsFunction::User({:?}, strict: {strict})", function.name)
            }
            JsFunction::Native(name, arity, _) => {
                write!(f, "JsFunction::Native({name:?}, {arity})")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Object,
    Function,
    Arguments,
    Error(ErrorKind),
    Boolean,
    Number,
    String,
    Symbol,
}

pub struct ObjectData {
    pub class: ObjectClass,
    pub prototype: Option<JsObject>,
    pub extensible: bool,
    pub(crate) properties: PropertyDictionary<JsString>,
    pub(crate) symbols: PropertyDictionary<JsSymbol>,
    pub callable: Option<JsFunction>,
    pub primitive_value: Option<JsValue>,
}

impl ObjectData {
    pub(crate) fn new(class: ObjectClass, prototype: Option<JsObject>, cutover: usize) -> Self {
        Self {
            class,
            prototype,
            extensible: true,
            properties: PropertyDictionary::new(cutover),
            symbols: PropertyDictionary::new(cutover),
            callable: None,
            primitive_value: None,
        }
    }

    /// Raw own-property lookup. Lazy and host-bound entries are returned as stored.
    pub fn own(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        match key {
            PropertyKey::String(s) => self.properties.get(s),
            PropertyKey::Symbol(s) => self.symbols.get(s),
        }
    }

    pub(crate) fn own_mut(&mut self, key: &PropertyKey) -> Option<&mut PropertyDescriptor> {
        match key {
            PropertyKey::String(s) => self.properties.get_mut(s),
            PropertyKey::Symbol(s) => self.symbols.get_mut(s),
        }
    }

    pub(crate) fn store(&mut self, key: PropertyKey, desc: PropertyDescriptor) {
        match key {
            PropertyKey::String(s) => self.properties.set(s, desc),
            PropertyKey::Symbol(s) => self.symbols.set(s, desc),
        }
    }

    pub(crate) fn remove(&mut self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        match key {
            PropertyKey::String(s) => self.properties.remove(s),
            PropertyKey::Symbol(s) => self.symbols.remove(s),
        }
    }

    pub fn property_count(&self) -> usize {
        self.properties.len() + self.symbols.len()
    }

    /// Plain data value of `key` on this object or its prototypes, without
    /// running accessors or resolvers.
    pub fn find_data_property(&self, key: &JsString) -> Option<JsValue> {
        match self.properties.get(key) {
            Some(PropertyDescriptor {
                kind: DescriptorKind::Data(value),
                ..
            }) => value.clone(),
            Some(_) => None,
            None => self.prototype.as_ref()?.borrow().find_data_property(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_empty_fills_only_empty_values() {
        let filled = Completion::empty().update_empty(Some(JsValue::integer(1)));
        assert_eq!(filled.value().and_then(JsValue::as_number), Some(1.0));

        let kept = Completion::Normal(Some(JsValue::integer(2))).update_empty(Some(JsValue::Null));
        assert_eq!(kept.value().and_then(JsValue::as_number), Some(2.0));

        let at = Location::new(4, 9);
        let brk = Completion::Break(Some("L".into()), None, at).update_empty(Some(JsValue::Null));
        assert!(matches!(brk, Completion::Break(Some(ref l), Some(JsValue::Null), _) if l == "L"));
        assert_eq!(brk.location(), Some(at));

        let ret = Completion::Return(JsValue::Undefined, at).update_empty(Some(JsValue::Null));
        assert!(matches!(ret, Completion::Return(JsValue::Undefined, _)));
        assert_eq!(Completion::empty().location(), None);
    }

    #[test]
    fn data_lookup_walks_prototypes() {
        let proto = JsObject::new(ObjectData::new(ObjectClass::Object, None, 9));
        proto.borrow_mut().store(
            PropertyKey::from("name"),
            PropertyDescriptor::data(JsValue::string("Base"), true, false, true),
        );
        let obj = JsObject::new(ObjectData::new(ObjectClass::Object, Some(proto), 9));
        let found = obj.borrow().find_data_property(&JsString::from_str("name"));
        assert_eq!(found.map(|v| v.to_string()), Some("Base".to_string()));
        assert!(obj.borrow().find_data_property(&JsString::from_str("x")).is_none());
    }
}
