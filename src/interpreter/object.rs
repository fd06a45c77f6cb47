use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::Interpreter;
use super::conversions::same_value;
use super::property::{DescriptorKind, HostBinding, PropertyDescriptor, PropertyFlags, PropertyKey};
use crate::error::{ErrorKind, JsResult};
use crate::types::{JsObject, JsString, JsValue};

const ATTRIBUTE_PAIRS: [(PropertyFlags, PropertyFlags); 3] = [
    (PropertyFlags::WRITABLE, PropertyFlags::WRITABLE_SET),
    (PropertyFlags::ENUMERABLE, PropertyFlags::ENUMERABLE_SET),
    (PropertyFlags::CONFIGURABLE, PropertyFlags::CONFIGURABLE_SET),
];

fn same_optional(patch: Option<&JsValue>, current: Option<&JsValue>) -> bool {
    match patch {
        None => true,
        Some(v) => same_value(v, current.unwrap_or(&JsValue::Undefined)),
    }
}

// Array index keys sort numerically ahead of other string keys.
fn array_index(key: &JsString) -> Option<u32> {
    let units = key.code_units();
    if units.is_empty() || units.len() > 10 || (units.len() > 1 && units[0] == u16::from(b'0')) {
        return None;
    }
    let mut n: u64 = 0;
    for &u in units {
        let digit = (u as u32).checked_sub(u32::from(b'0')).filter(|d| *d < 10)?;
        n = n * 10 + u64::from(digit);
    }
    (n < u64::from(u32::MAX)).then_some(n as u32)
}

impl Interpreter {
    pub fn get_prototype_of(&self, obj: &JsObject) -> Option<JsObject> {
        obj.borrow().prototype.clone()
    }

    /// OrdinarySetPrototypeOf (§10.1.2.1).
    pub fn set_prototype_of(&self, obj: &JsObject, proto: Option<JsObject>) -> bool {
        let current = obj.borrow().prototype.clone();
        if current == proto {
            return true;
        }
        if !obj.borrow().extensible {
            return false;
        }
        let mut p = proto.clone();
        while let Some(candidate) = p {
            if candidate.ptr_eq(obj) {
                return false;
            }
            p = candidate.borrow().prototype.clone();
        }
        obj.borrow_mut().prototype = proto;
        true
    }

    pub fn is_extensible(&self, obj: &JsObject) -> bool {
        obj.borrow().extensible
    }

    pub fn prevent_extensions(&self, obj: &JsObject) -> bool {
        obj.borrow_mut().extensible = false;
        true
    }

    /// OrdinaryGetOwnProperty (§10.1.5.1). Lazy entries are resolved and
    /// memoized; host-bound entries are reported as data properties holding
    /// the binding's current value.
    pub fn get_own_property(
        &mut self,
        obj: &JsObject,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        let stored = obj.borrow().own(key).cloned();
        let Some(desc) = stored else {
            return Ok(None);
        };
        match desc.kind {
            DescriptorKind::Lazy(lazy) => {
                let value = lazy.resolve(&key.display_name())?;
                if let Some(slot) = obj.borrow_mut().own_mut(key)
                    && matches!(&slot.kind, DescriptorKind::Lazy(l) if Rc::ptr_eq(l, &lazy))
                {
                    slot.kind = DescriptorKind::Data(Some(value.clone()));
                }
                Ok(Some(PropertyDescriptor {
                    flags: desc.flags,
                    kind: DescriptorKind::Data(Some(value)),
                }))
            }
            DescriptorKind::HostBinding(binding) => Ok(Some(PropertyDescriptor {
                flags: desc.flags,
                kind: DescriptorKind::Data(Some(binding.get())),
            })),
            _ => Ok(Some(desc)),
        }
    }

    /// OrdinaryDefineOwnProperty with ValidateAndApplyPropertyDescriptor (§10.1.6.3).
    pub fn define_own_property(
        &mut self,
        obj: &JsObject,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        let current = self.get_own_property(obj, &key)?;
        let Some(current) = current else {
            if !obj.borrow().extensible {
                return Ok(false);
            }
            obj.borrow_mut().store(key, desc.complete());
            return Ok(true);
        };

        let kind_changes =
            !desc.is_generic_descriptor() && desc.is_accessor_descriptor() != current.is_accessor_descriptor();
        if !current.is_configurable() {
            if desc.configurable() == Some(true) {
                return Ok(false);
            }
            if desc.enumerable().is_some_and(|e| e != current.is_enumerable()) {
                return Ok(false);
            }
            if kind_changes {
                return Ok(false);
            }
            if current.is_accessor_descriptor() {
                if !same_optional(desc.getter(), current.getter())
                    || !same_optional(desc.setter(), current.setter())
                {
                    return Ok(false);
                }
            } else if !current.is_writable() {
                if desc.writable() == Some(true) {
                    return Ok(false);
                }
                if !same_optional(desc.value(), current.value()) {
                    return Ok(false);
                }
            }
        }

        let host = match obj.borrow().own(&key).map(|d| &d.kind) {
            Some(DescriptorKind::HostBinding(binding)) => Some(binding.clone()),
            _ => None,
        };

        let mut flags = current.flags;
        let mut kind = if kind_changes {
            flags.remove(PropertyFlags::WRITABLE | PropertyFlags::WRITABLE_SET);
            match desc.kind.clone() {
                DescriptorKind::Accessor { get, set } => DescriptorKind::Accessor {
                    get: Some(get.unwrap_or(JsValue::Undefined)),
                    set: Some(set.unwrap_or(JsValue::Undefined)),
                },
                DescriptorKind::Data(value) => {
                    flags.insert(PropertyFlags::WRITABLE_SET);
                    DescriptorKind::Data(Some(value.unwrap_or(JsValue::Undefined)))
                }
                other => {
                    flags.insert(PropertyFlags::WRITABLE_SET);
                    other
                }
            }
        } else {
            match (current.kind, desc.kind.clone()) {
                (DescriptorKind::Accessor { get: cg, set: cs }, DescriptorKind::Accessor { get, set }) => {
                    DescriptorKind::Accessor {
                        get: get.or(cg),
                        set: set.or(cs),
                    }
                }
                (_, DescriptorKind::Data(Some(value))) => DescriptorKind::Data(Some(value)),
                (_, new @ (DescriptorKind::Lazy(_) | DescriptorKind::HostBinding(_))) => new,
                (cur, _) => cur,
            }
        };
        for (value_bit, set_bit) in ATTRIBUTE_PAIRS {
            if desc.flags.contains(set_bit) {
                flags.insert(set_bit);
                flags.set(value_bit, desc.flags.contains(value_bit));
            }
        }

        if let Some(binding) = host {
            kind = self.apply_to_host_binding(binding, kind, &desc, flags);
        }

        obj.borrow_mut().store(key, PropertyDescriptor { flags, kind });
        Ok(true)
    }

    // Mapped arguments: a value write goes to the binding; making the
    // property an accessor or read-only unmaps it.
    fn apply_to_host_binding(
        &mut self,
        binding: HostBinding,
        kind: DescriptorKind,
        desc: &PropertyDescriptor,
        flags: PropertyFlags,
    ) -> DescriptorKind {
        let DescriptorKind::Data(Some(value)) = &kind else {
            return kind;
        };
        if desc.value().is_some() {
            binding.set(value.clone());
        }
        if flags.contains(PropertyFlags::WRITABLE) {
            DescriptorKind::HostBinding(binding)
        } else {
            kind
        }
    }

    pub fn has_own_property(&mut self, obj: &JsObject, key: &PropertyKey) -> JsResult<bool> {
        Ok(obj.borrow().own(key).is_some())
    }

    /// OrdinaryHasProperty (§10.1.7.1).
    pub fn has_property(&mut self, obj: &JsObject, key: &PropertyKey) -> JsResult<bool> {
        let mut current = obj.clone();
        loop {
            if current.borrow().own(key).is_some() {
                return Ok(true);
            }
            let parent = current.borrow().prototype.clone();
            match parent {
                Some(p) => current = p,
                None => return Ok(false),
            }
        }
    }

    /// OrdinaryGet (§10.1.8.1).
    pub fn get(&mut self, obj: &JsObject, key: &PropertyKey, receiver: &JsValue) -> JsResult<JsValue> {
        let mut current = obj.clone();
        loop {
            match self.get_own_property(&current, key)? {
                Some(desc) if desc.is_accessor_descriptor() => {
                    let getter = desc.getter().cloned().unwrap_or(JsValue::Undefined);
                    if getter.is_undefined() {
                        return Ok(JsValue::Undefined);
                    }
                    return self.call(&getter, receiver, &[]);
                }
                Some(desc) => return Ok(desc.value().cloned().unwrap_or(JsValue::Undefined)),
                None => {
                    let parent = current.borrow().prototype.clone();
                    match parent {
                        Some(p) => current = p,
                        None => return Ok(JsValue::Undefined),
                    }
                }
            }
        }
    }

    /// OrdinarySet (§10.1.9.2).
    pub fn set(
        &mut self,
        obj: &JsObject,
        key: PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        let mut current = obj.clone();
        let own_desc = loop {
            if let Some(desc) = self.get_own_property(&current, &key)? {
                break desc;
            }
            let parent = current.borrow().prototype.clone();
            match parent {
                Some(p) => current = p,
                None => break PropertyDescriptor::data_default(JsValue::Undefined),
            }
        };

        if own_desc.is_data_descriptor() {
            if !own_desc.is_writable() {
                return Ok(false);
            }
            let JsValue::Object(receiver) = receiver else {
                return Ok(false);
            };
            return match self.get_own_property(receiver, &key)? {
                Some(existing) => {
                    if existing.is_accessor_descriptor() || !existing.is_writable() {
                        return Ok(false);
                    }
                    let patch = PropertyDescriptor::generic().with_value(value);
                    self.define_own_property(receiver, key, patch)
                }
                None => self.create_data_property(receiver, key, value),
            };
        }

        let setter = own_desc.setter().cloned().unwrap_or(JsValue::Undefined);
        if !setter.is_callable() {
            return Ok(false);
        }
        self.call(&setter, receiver, &[value])?;
        Ok(true)
    }

    /// OrdinaryDelete (§10.1.10.1).
    pub fn delete(&mut self, obj: &JsObject, key: &PropertyKey) -> JsResult<bool> {
        let configurable = match obj.borrow().own(key) {
            None => return Ok(true),
            Some(desc) => desc.is_configurable(),
        };
        if configurable {
            obj.borrow_mut().remove(key);
        }
        Ok(configurable)
    }

    /// OrdinaryOwnPropertyKeys (§10.1.11.1): array indices ascending, then
    /// other strings, then symbols, each group in insertion order.
    pub fn own_property_keys(&self, obj: &JsObject) -> Vec<PropertyKey> {
        let data = obj.borrow();
        let mut indices = Vec::new();
        let mut strings = Vec::new();
        for key in data.properties.keys() {
            match array_index(&key) {
                Some(i) => indices.push((i, key)),
                None => strings.push(key),
            }
        }
        indices.sort_by_key(|(i, _)| *i);
        indices
            .into_iter()
            .map(|(_, k)| PropertyKey::String(k))
            .chain(strings.into_iter().map(PropertyKey::String))
            .chain(data.symbols.keys().into_iter().map(PropertyKey::Symbol))
            .collect()
    }

    /// Own enumerable string keys, in own-property-key order.
    pub fn enumerable_own_keys(&mut self, obj: &JsObject) -> JsResult<Vec<JsString>> {
        let mut keys = Vec::new();
        for key in self.own_property_keys(obj) {
            let PropertyKey::String(s) = &key else {
                continue;
            };
            if let Some(desc) = self.get_own_property(obj, &key)?
                && desc.is_enumerable()
            {
                keys.push(s.clone());
            }
        }
        Ok(keys)
    }

    pub fn define_property_or_throw(
        &mut self,
        obj: &JsObject,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<()> {
        let name = key.display_name();
        if !self.define_own_property(obj, key, desc)? {
            return self.throw_error(ErrorKind::Type, format!("Cannot redefine property: {name}"));
        }
        Ok(())
    }

    pub fn create_data_property(
        &mut self,
        obj: &JsObject,
        key: PropertyKey,
        value: JsValue,
    ) -> JsResult<bool> {
        self.define_own_property(obj, key, PropertyDescriptor::data_default(value))
    }

    pub fn create_data_property_or_throw(
        &mut self,
        obj: &JsObject,
        key: PropertyKey,
        value: JsValue,
    ) -> JsResult<()> {
        self.define_property_or_throw(obj, key, PropertyDescriptor::data_default(value))
    }

    /// GetV (§7.3.3): property read on any value, boxing primitives.
    pub fn get_v(&mut self, value: &JsValue, key: &PropertyKey) -> JsResult<JsValue> {
        let obj = self.to_object(value)?;
        self.get(&obj, key, value)
    }

    /// GetMethod (§7.3.10).
    pub fn get_method(&mut self, value: &JsValue, key: &PropertyKey) -> JsResult<Option<JsValue>> {
        let func = self.get_v(value, key)?;
        if func.is_nullish() {
            return Ok(None);
        }
        if !func.is_callable() {
            return self.throw_error(
                ErrorKind::Type,
                format!("{} is not a function", key.display_name()),
            );
        }
        Ok(Some(func))
    }
}

/// Enumerates the for-in keys of an object and its prototypes.
///
/// Keys are produced lazily per object: a key deleted before it is reached
/// is skipped, and a key seen on an object shadows the same key further up
/// the chain whether or not it was enumerable.
pub struct ForInIterator {
    object: Option<JsObject>,
    object_visited: bool,
    visited: FxHashSet<JsString>,
    remaining: VecDeque<JsString>,
}

impl ForInIterator {
    pub fn new(object: JsObject) -> Self {
        Self {
            object: Some(object),
            object_visited: false,
            visited: FxHashSet::default(),
            remaining: VecDeque::new(),
        }
    }

    pub fn next_key(&mut self, interp: &mut Interpreter) -> JsResult<Option<JsString>> {
        loop {
            let Some(obj) = self.object.clone() else {
                return Ok(None);
            };
            if !self.object_visited {
                self.remaining = interp
                    .own_property_keys(&obj)
                    .into_iter()
                    .filter_map(|k| k.as_string().cloned())
                    .collect();
                self.object_visited = true;
            }
            while let Some(key) = self.remaining.pop_front() {
                if self.visited.contains(&key) {
                    continue;
                }
                let desc = interp.get_own_property(&obj, &PropertyKey::String(key.clone()))?;
                if let Some(desc) = desc {
                    self.visited.insert(key.clone());
                    if desc.is_enumerable() {
                        return Ok(Some(key));
                    }
                }
            }
            self.object = interp.get_prototype_of(&obj);
            self.object_visited = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WellKnownSymbol;

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from(s)
    }

    fn get_number(interp: &mut Interpreter, obj: &JsObject, k: &str) -> Option<f64> {
        interp
            .get(obj, &key(k), &JsValue::Object(obj.clone()))
            .ok()
            .and_then(|v| v.as_number())
    }

    #[test]
    fn frozen_data_property_accepts_only_identical_value() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        let frozen = PropertyDescriptor::data(JsValue::integer(1), false, false, false);
        assert!(interp.define_own_property(&obj, key("k"), frozen).unwrap());

        let same = PropertyDescriptor::generic().with_value(JsValue::integer(1));
        assert!(interp.define_own_property(&obj, key("k"), same).unwrap());
        let different = PropertyDescriptor::generic().with_value(JsValue::integer(2));
        assert!(!interp.define_own_property(&obj, key("k"), different).unwrap());
        let widen = PropertyDescriptor::generic().with_writable(true);
        assert!(!interp.define_own_property(&obj, key("k"), widen).unwrap());
        let to_accessor = PropertyDescriptor::generic().with_get(JsValue::Undefined);
        assert!(!interp.define_own_property(&obj, key("k"), to_accessor).unwrap());
        assert_eq!(get_number(&mut interp, &obj, "k"), Some(1.0));
    }

    #[test]
    fn nan_value_is_same_value_for_frozen_property() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        let frozen = PropertyDescriptor::data(JsValue::number(f64::NAN), false, false, false);
        interp.define_own_property(&obj, key("n"), frozen).unwrap();
        let same = PropertyDescriptor::generic().with_value(JsValue::number(f64::NAN));
        assert!(interp.define_own_property(&obj, key("n"), same).unwrap());
        let zero = PropertyDescriptor::data(JsValue::number(0.0), false, false, false);
        interp.define_own_property(&obj, key("z"), zero).unwrap();
        let neg = PropertyDescriptor::generic().with_value(JsValue::number(-0.0));
        assert!(!interp.define_own_property(&obj, key("z"), neg).unwrap());
    }

    #[test]
    fn configurable_property_converts_between_kinds() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        let data = PropertyDescriptor::data(JsValue::integer(1), true, true, true);
        interp.define_own_property(&obj, key("p"), data).unwrap();
        let getter = interp.create_native_function("get", 0, |_, _, _| Ok(JsValue::integer(5)));
        let patch = PropertyDescriptor::generic().with_get(getter);
        assert!(interp.define_own_property(&obj, key("p"), patch).unwrap());

        let desc = interp.get_own_property(&obj, &key("p")).unwrap().unwrap();
        assert!(desc.is_accessor_descriptor());
        assert_eq!(desc.enumerable(), Some(true));
        assert!(desc.setter().is_some_and(JsValue::is_undefined));
        assert_eq!(get_number(&mut interp, &obj, "p"), Some(5.0));
    }

    #[test]
    fn writable_only_patch_keeps_value() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        interp
            .create_data_property_or_throw(&obj, key("w"), JsValue::integer(3))
            .unwrap();
        let patch = PropertyDescriptor::generic().with_writable(false);
        assert!(interp.define_own_property(&obj, key("w"), patch).unwrap());
        let desc = interp.get_own_property(&obj, &key("w")).unwrap().unwrap();
        assert_eq!(desc.writable(), Some(false));
        assert_eq!(desc.value().and_then(JsValue::as_number), Some(3.0));
    }

    #[test]
    fn non_extensible_rejects_new_properties() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        interp.prevent_extensions(&obj);
        assert!(!interp.create_data_property(&obj, key("x"), JsValue::Null).unwrap());
        let err = interp
            .create_data_property_or_throw(&obj, key("x"), JsValue::Null)
            .unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Type));
    }

    #[test]
    fn delete_respects_configurable() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        let fixed = PropertyDescriptor::data(JsValue::Null, true, true, false);
        interp.define_own_property(&obj, key("fixed"), fixed).unwrap();
        interp
            .create_data_property_or_throw(&obj, key("loose"), JsValue::Null)
            .unwrap();
        assert!(!interp.delete(&obj, &key("fixed")).unwrap());
        assert!(interp.delete(&obj, &key("loose")).unwrap());
        assert!(interp.delete(&obj, &key("missing")).unwrap());
        assert!(!interp.has_own_property(&obj, &key("loose")).unwrap());
    }

    #[test]
    fn set_through_prototype_chain() {
        let mut interp = Interpreter::new();
        let proto = interp.create_object();
        let readonly = PropertyDescriptor::data(JsValue::integer(1), false, true, true);
        interp.define_own_property(&proto, key("ro"), readonly).unwrap();
        interp
            .create_data_property_or_throw(&proto, key("rw"), JsValue::integer(2))
            .unwrap();
        let child = interp.create_object_with_proto(Some(proto.clone()));
        let receiver = JsValue::Object(child.clone());

        assert!(!interp.set(&child, key("ro"), JsValue::integer(9), &receiver).unwrap());
        assert!(interp.set(&child, key("rw"), JsValue::integer(9), &receiver).unwrap());
        assert_eq!(get_number(&mut interp, &child, "rw"), Some(9.0));
        assert_eq!(get_number(&mut interp, &proto, "rw"), Some(2.0));
    }

    #[test]
    fn accessor_receives_receiver() {
        let mut interp = Interpreter::new();
        let proto = interp.create_object();
        let setter = interp.create_native_function("set", 1, |interp, this, args| {
            let JsValue::Object(target) = this else {
                return Ok(JsValue::Undefined);
            };
            let v = args.first().cloned().unwrap_or(JsValue::Undefined);
            interp.create_data_property_or_throw(target, PropertyKey::from("seen"), v)?;
            Ok(JsValue::Undefined)
        });
        let accessor = PropertyDescriptor::accessor(None, Some(setter), false, true);
        interp.define_own_property(&proto, key("x"), accessor).unwrap();
        let child = interp.create_object_with_proto(Some(proto.clone()));
        let receiver = JsValue::Object(child.clone());
        assert!(interp.set(&child, key("x"), JsValue::integer(4), &receiver).unwrap());
        assert_eq!(get_number(&mut interp, &child, "seen"), Some(4.0));
        assert!(!interp.has_own_property(&proto, &key("seen")).unwrap());
        assert!(interp.get(&child, &key("x"), &receiver).unwrap().is_undefined());
    }

    #[test]
    fn own_keys_order_indices_strings_symbols() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        let sym = WellKnownSymbol::Iterator.symbol();
        interp
            .create_data_property_or_throw(&obj, PropertyKey::Symbol(sym.clone()), JsValue::Null)
            .unwrap();
        for k in ["b", "10", "a", "2", "01"] {
            interp.create_data_property_or_throw(&obj, key(k), JsValue::Null).unwrap();
        }
        let keys: Vec<String> = interp
            .own_property_keys(&obj)
            .iter()
            .map(PropertyKey::display_name)
            .collect();
        assert_eq!(keys, ["2", "10", "b", "a", "01", "[Symbol(Symbol.iterator)]"]);
    }

    #[test]
    fn enumerable_own_keys_skip_hidden() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        interp.create_data_property_or_throw(&obj, key("a"), JsValue::Null).unwrap();
        let hidden = PropertyDescriptor::data(JsValue::Null, true, false, true);
        interp.define_own_property(&obj, key("h"), hidden).unwrap();
        let keys = interp.enumerable_own_keys(&obj).unwrap();
        assert_eq!(keys, vec![JsString::from_str("a")]);
        assert_eq!(interp.own_property_keys(&obj).len(), 2);
    }

    #[test]
    fn for_in_shadows_and_skips_deleted() {
        let mut interp = Interpreter::new();
        let proto = interp.create_object();
        for k in ["shadowed", "inherited", "hidden"] {
            interp.create_data_property_or_throw(&proto, key(k), JsValue::Null).unwrap();
        }
        let child = interp.create_object_with_proto(Some(proto.clone()));
        interp.create_data_property_or_throw(&child, key("own"), JsValue::Null).unwrap();
        interp.create_data_property_or_throw(&child, key("gone"), JsValue::Null).unwrap();
        let shadow = PropertyDescriptor::data(JsValue::Null, true, false, true);
        interp.define_own_property(&child, key("shadowed"), shadow).unwrap();

        let mut iter = ForInIterator::new(child.clone());
        let mut seen = Vec::new();
        while let Some(k) = iter.next_key(&mut interp).unwrap() {
            let name = k.to_rust_string();
            if name == "own" {
                interp.delete(&child, &key("gone")).unwrap();
                interp.delete(&proto, &key("hidden")).unwrap();
            }
            seen.push(name);
        }
        assert_eq!(seen, ["own", "inherited"]);
    }

    #[test]
    fn lazy_property_is_memoized_into_data() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        let lazy = PropertyDescriptor::lazy(|| JsValue::integer(11), true, true, true);
        interp.define_own_property(&obj, key("l"), lazy).unwrap();
        assert!(matches!(
            obj.borrow().own(&key("l")).map(|d| &d.kind),
            Some(DescriptorKind::Lazy(_))
        ));
        assert_eq!(get_number(&mut interp, &obj, "l"), Some(11.0));
        assert!(matches!(
            obj.borrow().own(&key("l")).map(|d| &d.kind),
            Some(DescriptorKind::Data(Some(_)))
        ));
    }

    #[test]
    fn prototype_cycles_are_rejected() {
        let interp = Interpreter::new();
        let a = interp.create_object_with_proto(None);
        let b = interp.create_object_with_proto(Some(a.clone()));
        assert!(!interp.set_prototype_of(&a, Some(b.clone())));
        assert!(interp.set_prototype_of(&a, None));
        interp.prevent_extensions(&a);
        assert!(!interp.set_prototype_of(&a, Some(b)));
    }

    #[test]
    fn array_index_parsing() {
        let idx = |s: &str| array_index(&JsString::from_str(s));
        assert_eq!(idx("0"), Some(0));
        assert_eq!(idx("4294967294"), Some(4294967294));
        assert_eq!(idx("4294967295"), None);
        assert_eq!(idx("00"), None);
        assert_eq!(idx("-1"), None);
        assert_eq!(idx(""), None);
    }
}
