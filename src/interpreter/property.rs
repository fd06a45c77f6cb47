use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use super::environment::EnvRef;
use crate::error::EngineError;
use crate::types::{JsString, JsSymbol, JsValue, number_ops};

/// A property key: string-keyed and symbol-keyed properties live in separate stores.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Symbol(JsSymbol),
}

impl PropertyKey {
    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }

    /// Canonical key for an array index.
    pub fn index(i: u32) -> Self {
        PropertyKey::String(number_ops::to_js_string(f64::from(i).into()))
    }

    pub fn to_value(&self) -> JsValue {
        match self {
            PropertyKey::String(s) => JsValue::String(s.clone()),
            PropertyKey::Symbol(s) => JsValue::Symbol(s.clone()),
        }
    }

    pub(crate) fn display_name(&self) -> String {
        match self {
            PropertyKey::String(s) => s.to_rust_string(),
            PropertyKey::Symbol(s) => format!("[{}]", s.descriptive_string()),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(JsString::from_str(s))
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        PropertyKey::String(s)
    }
}

impl From<JsSymbol> for PropertyKey {
    fn from(s: JsSymbol) -> Self {
        PropertyKey::Symbol(s)
    }
}

bitflags! {
    /// Attribute bits; each attribute has a value bit and a "was specified" bit,
    /// giving the unset/true/false states a descriptor patch needs.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        const ENUMERABLE = 1;
        const ENUMERABLE_SET = 1 << 1;
        const WRITABLE = 1 << 2;
        const WRITABLE_SET = 1 << 3;
        const CONFIGURABLE = 1 << 4;
        const CONFIGURABLE_SET = 1 << 5;

        const ALL_SET = Self::ENUMERABLE_SET.bits()
            | Self::WRITABLE_SET.bits()
            | Self::CONFIGURABLE_SET.bits();
    }
}

impl PropertyFlags {
    fn from_bools(writable: Option<bool>, enumerable: Option<bool>, configurable: Option<bool>) -> Self {
        let mut flags = PropertyFlags::empty();
        flags.put(PropertyFlags::WRITABLE, PropertyFlags::WRITABLE_SET, writable);
        flags.put(PropertyFlags::ENUMERABLE, PropertyFlags::ENUMERABLE_SET, enumerable);
        flags.put(PropertyFlags::CONFIGURABLE, PropertyFlags::CONFIGURABLE_SET, configurable);
        flags
    }

    fn put(&mut self, value: PropertyFlags, set: PropertyFlags, state: Option<bool>) {
        self.remove(value | set);
        if let Some(b) = state {
            self.insert(set);
            self.set(value, b);
        }
    }

    fn read(self, value: PropertyFlags, set: PropertyFlags) -> Option<bool> {
        self.contains(set).then(|| self.contains(value))
    }
}

#[derive(Clone)]
pub enum DescriptorKind {
    /// Only attribute flags, neither data nor accessor fields.
    Generic,
    /// `None` when a patch leaves the value unspecified.
    Data(Option<JsValue>),
    /// `None` for an unspecified field; stored descriptors always have both.
    Accessor {
        get: Option<JsValue>,
        set: Option<JsValue>,
    },
    /// A data property whose value is produced on first read.
    Lazy(Rc<LazyValue>),
    /// A data property whose value lives in an environment binding.
    HostBinding(HostBinding),
}

#[derive(Clone)]
pub struct PropertyDescriptor {
    pub flags: PropertyFlags,
    pub kind: DescriptorKind,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            flags: PropertyFlags::from_bools(Some(writable), Some(enumerable), Some(configurable)),
            kind: DescriptorKind::Data(Some(value)),
        }
    }

    /// Writable, enumerable, configurable: what plain assignment creates.
    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }

    pub fn accessor(
        get: Option<JsValue>,
        set: Option<JsValue>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            flags: PropertyFlags::from_bools(None, Some(enumerable), Some(configurable)),
            kind: DescriptorKind::Accessor {
                get: Some(get.unwrap_or(JsValue::Undefined)),
                set: Some(set.unwrap_or(JsValue::Undefined)),
            },
        }
    }

    pub fn lazy(
        resolver: impl FnOnce() -> JsValue + 'static,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            flags: PropertyFlags::from_bools(Some(writable), Some(enumerable), Some(configurable)),
            kind: DescriptorKind::Lazy(Rc::new(LazyValue::new(resolver))),
        }
    }

    pub fn host_binding(env: EnvRef, name: Rc<str>, enumerable: bool, configurable: bool) -> Self {
        Self {
            flags: PropertyFlags::from_bools(Some(true), Some(enumerable), Some(configurable)),
            kind: DescriptorKind::HostBinding(HostBinding { env, name }),
        }
    }

    /// An empty patch: every field unspecified.
    pub fn generic() -> Self {
        Self {
            flags: PropertyFlags::empty(),
            kind: DescriptorKind::Generic,
        }
    }

    pub fn with_value(mut self, value: JsValue) -> Self {
        self.kind = DescriptorKind::Data(Some(value));
        self
    }

    pub fn with_writable(mut self, writable: bool) -> Self {
        if matches!(self.kind, DescriptorKind::Generic) {
            self.kind = DescriptorKind::Data(None);
        }
        self.flags.put(PropertyFlags::WRITABLE, PropertyFlags::WRITABLE_SET, Some(writable));
        self
    }

    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.flags.put(PropertyFlags::ENUMERABLE, PropertyFlags::ENUMERABLE_SET, Some(enumerable));
        self
    }

    pub fn with_configurable(mut self, configurable: bool) -> Self {
        self.flags.put(
            PropertyFlags::CONFIGURABLE,
            PropertyFlags::CONFIGURABLE_SET,
            Some(configurable),
        );
        self
    }

    pub fn with_get(mut self, get: JsValue) -> Self {
        self.kind = match self.kind {
            DescriptorKind::Accessor { set, .. } => DescriptorKind::Accessor { get: Some(get), set },
            _ => DescriptorKind::Accessor { get: Some(get), set: None },
        };
        self.flags.remove(PropertyFlags::WRITABLE | PropertyFlags::WRITABLE_SET);
        self
    }

    pub fn with_set(mut self, set: JsValue) -> Self {
        self.kind = match self.kind {
            DescriptorKind::Accessor { get, .. } => DescriptorKind::Accessor { get, set: Some(set) },
            _ => DescriptorKind::Accessor { get: None, set: Some(set) },
        };
        self.flags.remove(PropertyFlags::WRITABLE | PropertyFlags::WRITABLE_SET);
        self
    }

    pub fn writable(&self) -> Option<bool> {
        self.flags.read(PropertyFlags::WRITABLE, PropertyFlags::WRITABLE_SET)
    }

    pub fn enumerable(&self) -> Option<bool> {
        self.flags.read(PropertyFlags::ENUMERABLE, PropertyFlags::ENUMERABLE_SET)
    }

    pub fn configurable(&self) -> Option<bool> {
        self.flags.read(PropertyFlags::CONFIGURABLE, PropertyFlags::CONFIGURABLE_SET)
    }

    /// Attribute test for stored descriptors, where unset reads as false.
    pub fn is_enumerable(&self) -> bool {
        self.enumerable() == Some(true)
    }

    pub fn is_configurable(&self) -> bool {
        self.configurable() == Some(true)
    }

    pub fn is_writable(&self) -> bool {
        self.writable() == Some(true)
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        matches!(self.kind, DescriptorKind::Accessor { .. })
    }

    pub fn is_data_descriptor(&self) -> bool {
        matches!(
            self.kind,
            DescriptorKind::Data(_) | DescriptorKind::Lazy(_) | DescriptorKind::HostBinding(_)
        ) || self.flags.contains(PropertyFlags::WRITABLE_SET)
    }

    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    /// The stored value of a plain data descriptor.
    pub fn value(&self) -> Option<&JsValue> {
        match &self.kind {
            DescriptorKind::Data(value) => value.as_ref(),
            _ => None,
        }
    }

    pub fn getter(&self) -> Option<&JsValue> {
        match &self.kind {
            DescriptorKind::Accessor { get, .. } => get.as_ref(),
            _ => None,
        }
    }

    pub fn setter(&self) -> Option<&JsValue> {
        match &self.kind {
            DescriptorKind::Accessor { set, .. } => set.as_ref(),
            _ => None,
        }
    }

    /// Fills unspecified fields with their defaults (§6.2.6.6).
    pub(crate) fn complete(mut self) -> Self {
        match &mut self.kind {
            DescriptorKind::Generic => {
                self.kind = DescriptorKind::Data(Some(JsValue::Undefined));
                self.flags.insert(PropertyFlags::WRITABLE_SET);
            }
            DescriptorKind::Data(value) => {
                value.get_or_insert(JsValue::Undefined);
                self.flags.insert(PropertyFlags::WRITABLE_SET);
            }
            DescriptorKind::Accessor { get, set } => {
                get.get_or_insert(JsValue::Undefined);
                set.get_or_insert(JsValue::Undefined);
            }
            DescriptorKind::Lazy(_) | DescriptorKind::HostBinding(_) => {
                self.flags.insert(PropertyFlags::WRITABLE_SET);
            }
        }
        self.flags.insert(PropertyFlags::ENUMERABLE_SET | PropertyFlags::CONFIGURABLE_SET);
        self
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PropertyDescriptor");
        match &self.kind {
            DescriptorKind::Generic => {}
            DescriptorKind::Data(value) => {
                s.field("value", value);
            }
            DescriptorKind::Accessor { get, set } => {
                s.field("get", get).field("set", set);
            }
            DescriptorKind::Lazy(lazy) => {
                s.field("lazy", &lazy.is_resolved());
            }
            DescriptorKind::HostBinding(binding) => {
                s.field("binding", &binding.name);
            }
        }
        s.field("writable", &self.writable())
            .field("enumerable", &self.enumerable())
            .field("configurable", &self.configurable())
            .finish()
    }
}

enum LazyState {
    Unresolved(Box<dyn FnOnce() -> JsValue>),
    Resolving,
    Resolved(JsValue),
}

/// A value computed by its resolver at most once.
pub struct LazyValue {
    state: RefCell<LazyState>,
}

impl LazyValue {
    pub fn new(resolver: impl FnOnce() -> JsValue + 'static) -> Self {
        Self {
            state: RefCell::new(LazyState::Unresolved(Box::new(resolver))),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.borrow(), LazyState::Resolved(_))
    }

    /// Runs the resolver on first call. A read issued while the resolver is
    /// still running fails instead of recursing.
    pub fn resolve(&self, key: &str) -> Result<JsValue, EngineError> {
        let previous = std::mem::replace(&mut *self.state.borrow_mut(), LazyState::Resolving);
        match previous {
            LazyState::Resolved(value) => {
                *self.state.borrow_mut() = LazyState::Resolved(value.clone());
                Ok(value)
            }
            LazyState::Resolving => {
                tracing::warn!(key, "lazy property read during its own resolution");
                Err(EngineError::LazyReentrancy(key.to_string()))
            }
            LazyState::Unresolved(resolver) => {
                let value = resolver();
                *self.state.borrow_mut() = LazyState::Resolved(value.clone());
                Ok(value)
            }
        }
    }
}

/// Reads and writes a named binding of a captured declarative environment.
#[derive(Clone)]
pub struct HostBinding {
    pub env: EnvRef,
    pub name: Rc<str>,
}

impl HostBinding {
    /// Missing or uninitialized bindings read as `undefined`.
    pub fn get(&self) -> JsValue {
        self.env
            .declarative_value(&self.name)
            .unwrap_or(JsValue::Undefined)
    }

    pub fn set(&self, value: JsValue) {
        self.env.declarative_store(&self.name, value);
    }
}
