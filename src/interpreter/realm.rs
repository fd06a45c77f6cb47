use super::environment::{EnvRef, Environment};
use super::property::{PropertyDescriptor, PropertyKey};
use super::types::{JsFunction, ObjectClass, ObjectData};
use crate::error::ErrorKind;
use crate::types::{JsObject, JsValue};

/// Prototype objects every realm starts with. Built-in methods are left to
/// the host; these exist so wrappers, functions and errors have a chain.
pub(crate) struct Intrinsics {
    pub(crate) object_prototype: JsObject,
    pub(crate) function_prototype: JsObject,
    pub(crate) boolean_prototype: JsObject,
    pub(crate) number_prototype: JsObject,
    pub(crate) string_prototype: JsObject,
    pub(crate) symbol_prototype: JsObject,
    type_error_prototype: JsObject,
    range_error_prototype: JsObject,
    reference_error_prototype: JsObject,
    syntax_error_prototype: JsObject,
}

impl Intrinsics {
    pub(crate) fn error_prototype_for(&self, kind: ErrorKind) -> &JsObject {
        match kind {
            ErrorKind::Type | ErrorKind::Redeclaration => &self.type_error_prototype,
            ErrorKind::Range => &self.range_error_prototype,
            ErrorKind::Reference => &self.reference_error_prototype,
            ErrorKind::Syntax => &self.syntax_error_prototype,
        }
    }
}

pub(crate) struct Realm {
    pub(crate) global_object: JsObject,
    pub(crate) global_env: EnvRef,
    pub(crate) intrinsics: Intrinsics,
}

fn hidden(obj: &JsObject, name: &str, value: JsValue) {
    obj.borrow_mut().store(
        PropertyKey::from(name),
        PropertyDescriptor::data(value, true, false, true),
    );
}

impl Realm {
    pub(crate) fn new(cutover: usize) -> Self {
        let alloc = |class: ObjectClass, proto: Option<&JsObject>| {
            JsObject::new(ObjectData::new(class, proto.cloned(), cutover))
        };

        let object_prototype = alloc(ObjectClass::Object, None);
        // %Function.prototype% is itself callable and returns undefined.
        let function_prototype = alloc(ObjectClass::Function, Some(&object_prototype));
        function_prototype.borrow_mut().callable =
            Some(JsFunction::native("", 0, |_, _, _| Ok(JsValue::Undefined)));

        let wrapper_prototype = |class: ObjectClass, primitive: JsValue| {
            let proto = alloc(class, Some(&object_prototype));
            proto.borrow_mut().primitive_value = Some(primitive);
            proto
        };
        let boolean_prototype = wrapper_prototype(ObjectClass::Boolean, JsValue::Boolean(false));
        let number_prototype = wrapper_prototype(ObjectClass::Number, JsValue::integer(0));
        let string_prototype = wrapper_prototype(ObjectClass::String, JsValue::string(""));
        let symbol_prototype = alloc(ObjectClass::Object, Some(&object_prototype));

        let error_prototype = alloc(ObjectClass::Object, Some(&object_prototype));
        hidden(&error_prototype, "name", JsValue::string("Error"));
        hidden(&error_prototype, "message", JsValue::string(""));
        let native_error = |kind: ErrorKind| {
            let proto = alloc(ObjectClass::Object, Some(&error_prototype));
            hidden(&proto, "name", JsValue::string(kind.name()));
            hidden(&proto, "message", JsValue::string(""));
            proto
        };
        let type_error_prototype = native_error(ErrorKind::Type);
        let range_error_prototype = native_error(ErrorKind::Range);
        let reference_error_prototype = native_error(ErrorKind::Reference);
        let syntax_error_prototype = native_error(ErrorKind::Syntax);

        let global_object = alloc(ObjectClass::Object, Some(&object_prototype));
        // §19.1 Value properties of the global object
        for (name, value) in [
            ("undefined", JsValue::Undefined),
            ("NaN", JsValue::number(f64::NAN)),
            ("Infinity", JsValue::number(f64::INFINITY)),
        ] {
            global_object.borrow_mut().store(
                PropertyKey::from(name),
                PropertyDescriptor::data(value, false, false, false),
            );
        }
        hidden(&global_object, "globalThis", JsValue::Object(global_object.clone()));

        let global_env = Environment::global(global_object.clone());
        tracing::debug!(cutover, "realm created");

        Self {
            global_object,
            global_env,
            intrinsics: Intrinsics {
                object_prototype,
                function_prototype,
                boolean_prototype,
                number_prototype,
                string_prototype,
                symbol_prototype,
                type_error_prototype,
                range_error_prototype,
                reference_error_prototype,
                syntax_error_prototype,
            },
        }
    }
}
