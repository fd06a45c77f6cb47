use num_bigint::BigUint;
use num_traits::ToPrimitive;

use super::Interpreter;
use super::property::{PropertyDescriptor, PropertyKey};
use super::types::ObjectClass;
use crate::error::{ErrorKind, JsResult};
use crate::types::{JsNumber, JsObject, JsString, JsValue, WellKnownSymbol, number_ops};

/// Hint passed to ToPrimitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    String,
    Number,
}

impl PreferredType {
    fn as_str(self) -> &'static str {
        match self {
            PreferredType::Default => "default",
            PreferredType::String => "string",
            PreferredType::Number => "number",
        }
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// WhiteSpace and LineTerminator code points (§12.2, §12.3)
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

// StrDecimalLiteral without the Infinity forms
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return f64::NAN;
    }
    match BigUint::parse_bytes(digits.as_bytes(), radix) {
        Some(n) => n.to_f64().unwrap_or(f64::INFINITY),
        None => f64::NAN,
    }
}

/// StringToNumber (§7.1.4.1.1).
pub fn string_to_number(s: &JsString) -> f64 {
    let text = s.to_rust_string();
    let trimmed = text.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if trimmed.len() > 2 && trimmed.as_bytes()[0] == b'0' {
        let radix = match trimmed.as_bytes()[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return parse_radix(&trimmed[2..], radix);
        }
    }
    if !is_decimal_literal(trimmed) {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// IsStrictlyEqual (§7.2.15).
pub fn is_strictly_equal(x: &JsValue, y: &JsValue) -> bool {
    match (x, y) {
        (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::equal(a.value(), b.value()),
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Symbol(a), JsValue::Symbol(b)) => a == b,
        (JsValue::Object(a), JsValue::Object(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// SameValue (§7.2.10): like strict equality, but NaN equals NaN and +0 differs from -0.
pub fn same_value(x: &JsValue, y: &JsValue) -> bool {
    match (x, y) {
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::same_value(a.value(), b.value()),
        _ => is_strictly_equal(x, y),
    }
}

pub fn same_value_zero(x: &JsValue, y: &JsValue) -> bool {
    match (x, y) {
        (JsValue::Number(a), JsValue::Number(b)) => {
            number_ops::same_value_zero(a.value(), b.value())
        }
        _ => is_strictly_equal(x, y),
    }
}

/// The `typeof` operator's result.
pub fn type_of(value: &JsValue) -> &'static str {
    match value {
        JsValue::Undefined => "undefined",
        JsValue::Null => "object",
        JsValue::Boolean(_) => "boolean",
        JsValue::Number(_) => "number",
        JsValue::String(_) => "string",
        JsValue::Symbol(_) => "symbol",
        JsValue::Object(o) if o.is_callable() => "function",
        JsValue::Object(_) => "object",
    }
}

// Code units past the largest array index (2^32 - 2) get no index property.
fn string_index_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl Interpreter {
    /// ToPrimitive (§7.1.1).
    pub fn to_primitive(&mut self, value: &JsValue, hint: PreferredType) -> JsResult<JsValue> {
        let JsValue::Object(obj) = value else {
            return Ok(value.clone());
        };
        let key = PropertyKey::Symbol(WellKnownSymbol::ToPrimitive.symbol());
        if let Some(exotic) = self.get_method(value, &key)? {
            let hint = JsValue::string(hint.as_str());
            let result = self.call(&exotic, value, &[hint])?;
            if result.is_object() {
                return self.throw_error(ErrorKind::Type, "Cannot convert object to primitive value");
            }
            return Ok(result);
        }
        let hint = match hint {
            PreferredType::Default => PreferredType::Number,
            other => other,
        };
        self.ordinary_to_primitive(obj, hint)
    }

    /// OrdinaryToPrimitive (§7.1.1.1).
    pub fn ordinary_to_primitive(
        &mut self,
        obj: &JsObject,
        hint: PreferredType,
    ) -> JsResult<JsValue> {
        let order = if hint == PreferredType::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        let receiver = JsValue::Object(obj.clone());
        for name in order {
            let method = self.get(obj, &PropertyKey::from(name), &receiver)?;
            if method.is_callable() {
                let result = self.call(&method, &receiver, &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        self.throw_error(ErrorKind::Type, "Cannot convert object to primitive value")
    }

    /// ToBoolean (§7.1.2).
    pub fn to_boolean(value: &JsValue) -> bool {
        match value {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => {
                let v = n.value();
                !(v == 0.0 || v.is_nan())
            }
            JsValue::String(s) => !s.is_empty(),
            JsValue::Symbol(_) | JsValue::Object(_) => true,
        }
    }

    /// ToNumber (§7.1.4), keeping the integer tag of number inputs.
    pub fn to_number_value(&mut self, value: &JsValue) -> JsResult<JsNumber> {
        match value {
            JsValue::Number(n) => Ok(*n),
            JsValue::Undefined => Ok(JsNumber::new(f64::NAN)),
            JsValue::Null => Ok(JsNumber::from_i32(0)),
            JsValue::Boolean(b) => Ok(JsNumber::from_i32(i32::from(*b))),
            JsValue::String(s) => Ok(JsNumber::new(string_to_number(s))),
            JsValue::Symbol(_) => {
                self.throw_error(ErrorKind::Type, "Cannot convert a Symbol value to a number")
            }
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::Number)?;
                self.to_number_value(&prim)
            }
        }
    }

    pub fn to_number(&mut self, value: &JsValue) -> JsResult<f64> {
        Ok(self.to_number_value(value)?.value())
    }

    /// ToInteger: NaN becomes 0; infinities and signed zeros pass through.
    pub fn to_integer(&mut self, value: &JsValue) -> JsResult<f64> {
        let n = self.to_number(value)?;
        if n.is_nan() {
            return Ok(0.0);
        }
        if n.is_infinite() || n == 0.0 {
            return Ok(n);
        }
        Ok(n.trunc())
    }

    /// ToIntegerOrInfinity (§7.1.5): like ToInteger, with -0 normalized to +0.
    pub fn to_integer_or_infinity(&mut self, value: &JsValue) -> JsResult<f64> {
        let n = self.to_integer(value)?;
        Ok(if n == 0.0 { 0.0 } else { n })
    }

    /// ToLength (§7.1.20).
    pub fn to_length(&mut self, value: &JsValue) -> JsResult<f64> {
        let len = self.to_integer_or_infinity(value)?;
        if len <= 0.0 {
            return Ok(0.0);
        }
        Ok(len.min(MAX_SAFE_INTEGER))
    }

    pub fn to_int32(&mut self, value: &JsValue) -> JsResult<i32> {
        Ok(number_ops::number_to_int32(self.to_number_value(value)?))
    }

    pub fn to_uint32(&mut self, value: &JsValue) -> JsResult<u32> {
        Ok(number_ops::number_to_uint32(self.to_number_value(value)?))
    }

    pub fn to_uint16(&mut self, value: &JsValue) -> JsResult<u16> {
        Ok(number_ops::number_to_uint16(self.to_number_value(value)?))
    }

    /// ToString (§7.1.17).
    pub fn to_string(&mut self, value: &JsValue) -> JsResult<JsString> {
        match value {
            JsValue::String(s) => Ok(s.clone()),
            JsValue::Number(n) => Ok(number_ops::to_js_string(*n)),
            JsValue::Undefined => Ok(JsString::from_str("undefined")),
            JsValue::Null => Ok(JsString::from_str("null")),
            JsValue::Boolean(true) => Ok(JsString::from_str("true")),
            JsValue::Boolean(false) => Ok(JsString::from_str("false")),
            JsValue::Symbol(_) => {
                self.throw_error(ErrorKind::Type, "Cannot convert a Symbol value to a string")
            }
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                self.to_string(&prim)
            }
        }
    }

    /// ToPropertyKey (§7.1.19).
    pub fn to_property_key(&mut self, value: &JsValue) -> JsResult<PropertyKey> {
        match value {
            JsValue::String(s) => Ok(PropertyKey::String(s.clone())),
            JsValue::Symbol(s) => Ok(PropertyKey::Symbol(s.clone())),
            JsValue::Number(n) => Ok(PropertyKey::String(number_ops::to_js_string(*n))),
            _ => match self.to_primitive(value, PreferredType::String)? {
                JsValue::Symbol(s) => Ok(PropertyKey::Symbol(s)),
                prim => Ok(PropertyKey::String(self.to_string(&prim)?)),
            },
        }
    }

    /// ToObject (§7.1.18): primitives are wrapped with their intrinsic prototype.
    pub fn to_object(&mut self, value: &JsValue) -> JsResult<JsObject> {
        let (class, proto) = match value {
            JsValue::Object(o) => return Ok(o.clone()),
            JsValue::Undefined | JsValue::Null => {
                return self.throw_error(
                    ErrorKind::Type,
                    format!("Cannot convert {value} to object"),
                );
            }
            JsValue::Boolean(_) => (ObjectClass::Boolean, self.realm.intrinsics.boolean_prototype.clone()),
            JsValue::Number(_) => (ObjectClass::Number, self.realm.intrinsics.number_prototype.clone()),
            JsValue::String(_) => (ObjectClass::String, self.realm.intrinsics.string_prototype.clone()),
            JsValue::Symbol(_) => (ObjectClass::Symbol, self.realm.intrinsics.symbol_prototype.clone()),
        };
        let wrapper = self.alloc_object(class, Some(proto));
        wrapper.borrow_mut().primitive_value = Some(value.clone());
        if let JsValue::String(s) = value {
            self.install_string_indices(&wrapper, s);
        }
        Ok(wrapper)
    }

    // String exotic objects expose each code unit as a read-only index.
    fn install_string_indices(&mut self, wrapper: &JsObject, s: &JsString) {
        let mut data = wrapper.borrow_mut();
        let units = s.code_units().iter().copied();
        for (index, unit) in (0..string_index_count(s.len())).zip(units) {
            let resolver = move || JsValue::String(JsString::from_code_units(vec![unit]));
            data.store(
                PropertyKey::index(index),
                PropertyDescriptor::lazy(resolver, false, true, false),
            );
        }
        data.store(
            PropertyKey::from("length"),
            PropertyDescriptor::data(JsValue::number(s.len() as f64), false, false, false),
        );
    }

    pub fn require_object_coercible(&mut self, value: &JsValue) -> JsResult<()> {
        if value.is_nullish() {
            return self.throw_error(ErrorKind::Type, format!("Cannot convert {value} to object"));
        }
        Ok(())
    }

    /// IsLooselyEqual (§7.2.14).
    pub fn is_loosely_equal(&mut self, x: &JsValue, y: &JsValue) -> JsResult<bool> {
        if std::mem::discriminant(x) == std::mem::discriminant(y) {
            return Ok(is_strictly_equal(x, y));
        }
        match (x, y) {
            (a, b) if a.is_nullish() && b.is_nullish() => Ok(true),
            (JsValue::Number(_), JsValue::String(s)) => {
                let n = string_to_number(s);
                Ok(number_ops::equal(x.as_number().unwrap_or(f64::NAN), n))
            }
            (JsValue::String(s), JsValue::Number(_)) => {
                let n = string_to_number(s);
                Ok(number_ops::equal(n, y.as_number().unwrap_or(f64::NAN)))
            }
            (JsValue::Boolean(b), _) => {
                let n = JsValue::integer(i32::from(*b));
                self.is_loosely_equal(&n, y)
            }
            (_, JsValue::Boolean(b)) => {
                let n = JsValue::integer(i32::from(*b));
                self.is_loosely_equal(x, &n)
            }
            (JsValue::Number(_) | JsValue::String(_) | JsValue::Symbol(_), JsValue::Object(_)) => {
                let prim = self.to_primitive(y, PreferredType::Default)?;
                self.is_loosely_equal(x, &prim)
            }
            (JsValue::Object(_), JsValue::Number(_) | JsValue::String(_) | JsValue::Symbol(_)) => {
                let prim = self.to_primitive(x, PreferredType::Default)?;
                self.is_loosely_equal(&prim, y)
            }
            _ => Ok(false),
        }
    }

    /// IsLessThan (§7.2.13). `None` stands for undefined (a NaN operand).
    pub fn is_less_than(
        &mut self,
        x: &JsValue,
        y: &JsValue,
        left_first: bool,
    ) -> JsResult<Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, PreferredType::Number)?;
            let py = self.to_primitive(y, PreferredType::Number)?;
            (px, py)
        } else {
            let py = self.to_primitive(y, PreferredType::Number)?;
            let px = self.to_primitive(x, PreferredType::Number)?;
            (px, py)
        };
        if let (JsValue::String(a), JsValue::String(b)) = (&px, &py) {
            return Ok(Some(a.code_units() < b.code_units()));
        }
        let nx = self.to_number(&px)?;
        let ny = self.to_number(&py)?;
        Ok(number_ops::less_than(nx, ny))
    }
}
