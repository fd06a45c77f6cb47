use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use bitflags::bitflags;

use crate::interpreter::ObjectData;

bitflags! {
    /// Type tag carried by every value. Numbers that are exact `i32` values
    /// carry `INTEGER` on top of `NUMBER`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct InternalTypes: u16 {
        const UNDEFINED = 1;
        const NULL = 1 << 1;
        const BOOLEAN = 1 << 2;
        const STRING = 1 << 3;
        const NUMBER = 1 << 4;
        const INTEGER = 1 << 5;
        const SYMBOL = 1 << 6;
        const OBJECT = 1 << 7;

        const NULLISH = Self::UNDEFINED.bits() | Self::NULL.bits();
        const PRIMITIVE = Self::UNDEFINED.bits()
            | Self::NULL.bits()
            | Self::BOOLEAN.bits()
            | Self::STRING.bits()
            | Self::NUMBER.bits()
            | Self::INTEGER.bits()
            | Self::SYMBOL.bits();
    }
}

#[derive(Clone, Debug)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(JsNumber),
    String(JsString),
    Symbol(JsSymbol),
    Object(JsObject),
}

/// An IEEE-754 double, tagged when it holds an exact `i32` (never `-0`).
#[derive(Clone, Copy, Debug)]
pub struct JsNumber {
    value: f64,
    integer: bool,
}

impl JsNumber {
    pub fn new(value: f64) -> Self {
        let integer = value as i32 as f64 == value && !(value == 0.0 && value.is_sign_negative());
        Self { value, integer }
    }

    pub const fn from_i32(value: i32) -> Self {
        Self {
            value: value as f64,
            integer: true,
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.value
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        self.integer
    }

    #[inline]
    pub fn as_i32(self) -> Option<i32> {
        self.integer.then_some(self.value as i32)
    }
}

impl From<f64> for JsNumber {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<i32> for JsNumber {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

// UTF-16 code unit string per §6.1.4
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString {
    code_units: Rc<[u16]>,
}

impl JsString {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self {
            code_units: s.encode_utf16().collect::<Vec<_>>().into(),
        }
    }

    pub fn from_code_units(units: Vec<u16>) -> Self {
        Self {
            code_units: units.into(),
        }
    }

    pub fn empty() -> Self {
        Self::from_code_units(Vec::new())
    }

    pub fn code_units(&self) -> &[u16] {
        &self.code_units
    }

    pub fn is_empty(&self) -> bool {
        self.code_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.code_units.len()
    }

    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.code_units)
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut units = Vec::with_capacity(self.len() + other.len());
        units.extend_from_slice(&self.code_units);
        units.extend_from_slice(&other.code_units);
        Self::from_code_units(units)
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rust_string())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_rust_string())
    }
}

/// Symbols compare by identity; the description is informational only.
#[derive(Clone, Debug)]
pub struct JsSymbol {
    id: u64,
    description: Option<JsString>,
}

impl JsSymbol {
    pub(crate) fn new(id: u64, description: Option<JsString>) -> Self {
        Self { id, description }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> Option<&JsString> {
        self.description.as_ref()
    }

    /// `SymbolDescriptiveString` (§20.4.3.3.1).
    pub fn descriptive_string(&self) -> String {
        match &self.description {
            Some(desc) => format!("Symbol({desc})"),
            None => "Symbol()".to_string(),
        }
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JsSymbol {}

impl Hash for JsSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// Well-known symbols (§6.1.5.1)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WellKnownSymbol {
    AsyncIterator,
    HasInstance,
    IsConcatSpreadable,
    Iterator,
    Match,
    MatchAll,
    Replace,
    Search,
    Species,
    Split,
    ToPrimitive,
    ToStringTag,
    Unscopables,
}

impl WellKnownSymbol {
    pub const ALL: [WellKnownSymbol; 13] = [
        WellKnownSymbol::AsyncIterator,
        WellKnownSymbol::HasInstance,
        WellKnownSymbol::IsConcatSpreadable,
        WellKnownSymbol::Iterator,
        WellKnownSymbol::Match,
        WellKnownSymbol::MatchAll,
        WellKnownSymbol::Replace,
        WellKnownSymbol::Search,
        WellKnownSymbol::Species,
        WellKnownSymbol::Split,
        WellKnownSymbol::ToPrimitive,
        WellKnownSymbol::ToStringTag,
        WellKnownSymbol::Unscopables,
    ];

    pub fn description(self) -> &'static str {
        match self {
            WellKnownSymbol::AsyncIterator => "Symbol.asyncIterator",
            WellKnownSymbol::HasInstance => "Symbol.hasInstance",
            WellKnownSymbol::IsConcatSpreadable => "Symbol.isConcatSpreadable",
            WellKnownSymbol::Iterator => "Symbol.iterator",
            WellKnownSymbol::Match => "Symbol.match",
            WellKnownSymbol::MatchAll => "Symbol.matchAll",
            WellKnownSymbol::Replace => "Symbol.replace",
            WellKnownSymbol::Search => "Symbol.search",
            WellKnownSymbol::Species => "Symbol.species",
            WellKnownSymbol::Split => "Symbol.split",
            WellKnownSymbol::ToPrimitive => "Symbol.toPrimitive",
            WellKnownSymbol::ToStringTag => "Symbol.toStringTag",
            WellKnownSymbol::Unscopables => "Symbol.unscopables",
        }
    }

    /// Well-known symbols are engine-global: ids `1..=13` are reserved for them
    /// and user symbols are allocated above that range.
    pub fn symbol(self) -> JsSymbol {
        JsSymbol::new(self as u64 + 1, Some(JsString::from_str(self.description())))
    }
}

pub(crate) const FIRST_USER_SYMBOL_ID: u64 = WellKnownSymbol::ALL.len() as u64 + 1;

/// Shared handle to a heap object. Equality is identity.
#[derive(Clone)]
pub struct JsObject(Rc<RefCell<ObjectData>>);

impl JsObject {
    pub fn new(data: ObjectData) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    pub fn borrow(&self) -> Ref<'_, ObjectData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ObjectData> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_callable(&self) -> bool {
        self.borrow().callable.is_some()
    }
}

impl PartialEq for JsObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for JsObject {}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(data) => write!(f, "JsObject({:?} @ {:p})", data.class, Rc::as_ptr(&self.0)),
            Err(_) => write!(f, "JsObject(<borrowed> @ {:p})", Rc::as_ptr(&self.0)),
        }
    }
}

impl JsValue {
    pub fn number(n: f64) -> Self {
        JsValue::Number(JsNumber::new(n))
    }

    pub fn integer(n: i32) -> Self {
        JsValue::Number(JsNumber::from_i32(n))
    }

    pub fn string(s: &str) -> Self {
        JsValue::String(JsString::from_str(s))
    }

    pub fn tag(&self) -> InternalTypes {
        match self {
            JsValue::Undefined => InternalTypes::UNDEFINED,
            JsValue::Null => InternalTypes::NULL,
            JsValue::Boolean(_) => InternalTypes::BOOLEAN,
            JsValue::Number(n) if n.is_integer() => InternalTypes::NUMBER | InternalTypes::INTEGER,
            JsValue::Number(_) => InternalTypes::NUMBER,
            JsValue::String(_) => InternalTypes::STRING,
            JsValue::Symbol(_) => InternalTypes::SYMBOL,
            JsValue::Object(_) => InternalTypes::OBJECT,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsValue::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, JsValue::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JsValue::Number(_))
    }

    pub fn is_integer(&self) -> bool {
        self.tag().contains(InternalTypes::INTEGER)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, JsValue::Symbol(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_primitive(&self) -> bool {
        self.tag().intersects(InternalTypes::PRIMITIVE)
    }

    pub fn is_nullish(&self) -> bool {
        self.tag().intersects(InternalTypes::NULLISH)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, JsValue::Number(n) if n.value().is_nan())
    }

    pub fn is_negative_zero(&self) -> bool {
        matches!(self, JsValue::Number(n) if n.value() == 0.0 && n.value().is_sign_negative())
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, JsValue::Object(o) if o.is_callable())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(n.value()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::integer(n)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::string(s)
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsSymbol> for JsValue {
    fn from(s: JsSymbol) -> Self {
        JsValue::Symbol(s)
    }
}

impl From<JsObject> for JsValue {
    fn from(o: JsObject) -> Self {
        JsValue::Object(o)
    }
}

// §6.1.6.1 Number type operations
pub mod number_ops {
    use std::cell::RefCell;

    use super::{JsNumber, JsString};
    use crate::dtoa;

    const INT_STRING_CACHE_SIZE: usize = 1024;

    thread_local! {
        static INT_STRINGS: RefCell<Vec<Option<JsString>>> =
            RefCell::new(vec![None; INT_STRING_CACHE_SIZE]);
    }

    pub fn unary_minus(x: f64) -> f64 {
        if x.is_nan() { f64::NAN } else { -x }
    }

    pub fn bitwise_not(x: f64) -> f64 {
        let n = to_int32(x);
        f64::from(!n)
    }

    // §6.1.6.1.3 Number::exponentiate
    pub fn exponentiate(base: f64, exp: f64) -> f64 {
        if exp.is_nan() {
            return f64::NAN;
        }
        if exp == 0.0 {
            return 1.0;
        }
        if base.abs() == 1.0 && exp.is_infinite() {
            return f64::NAN;
        }
        base.powf(exp)
    }

    pub fn multiply(x: f64, y: f64) -> f64 {
        x * y
    }

    pub fn divide(x: f64, y: f64) -> f64 {
        x / y
    }

    pub fn remainder(x: f64, y: f64) -> f64 {
        // truncating remainder, same as fmod
        x % y
    }

    pub fn add(x: f64, y: f64) -> f64 {
        x + y
    }

    pub fn subtract(x: f64, y: f64) -> f64 {
        x - y
    }

    pub fn left_shift(x: f64, y: f64) -> f64 {
        let lnum = to_int32(x);
        let shift = to_uint32(y) & 0x1F;
        f64::from(lnum.wrapping_shl(shift))
    }

    pub fn signed_right_shift(x: f64, y: f64) -> f64 {
        let lnum = to_int32(x);
        let shift = to_uint32(y) & 0x1F;
        f64::from(lnum.wrapping_shr(shift))
    }

    pub fn unsigned_right_shift(x: f64, y: f64) -> f64 {
        let lnum = to_uint32(x);
        let shift = to_uint32(y) & 0x1F;
        f64::from(lnum.wrapping_shr(shift))
    }

    pub fn less_than(x: f64, y: f64) -> Option<bool> {
        if x.is_nan() || y.is_nan() {
            None // undefined
        } else {
            Some(x < y)
        }
    }

    pub fn equal(x: f64, y: f64) -> bool {
        if x.is_nan() || y.is_nan() {
            return false;
        }
        x == y
    }

    pub fn same_value(x: f64, y: f64) -> bool {
        if x.is_nan() && y.is_nan() {
            return true;
        }
        if x == 0.0 && y == 0.0 {
            return x.is_sign_positive() == y.is_sign_positive();
        }
        x == y
    }

    pub fn same_value_zero(x: f64, y: f64) -> bool {
        if x.is_nan() && y.is_nan() {
            return true;
        }
        x == y
    }

    pub fn bitwise_and(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) & to_int32(y))
    }

    pub fn bitwise_xor(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) ^ to_int32(y))
    }

    pub fn bitwise_or(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) | to_int32(y))
    }

    /// §6.1.6.1.20 Number::toString with radix 10.
    pub fn to_string(x: f64) -> String {
        dtoa::number_to_string(x)
    }

    /// Number to `JsString`, with interned strings for small non-negative integers.
    pub fn to_js_string(n: JsNumber) -> JsString {
        match n.as_i32() {
            Some(i) if (0..INT_STRING_CACHE_SIZE as i32).contains(&i) => {
                INT_STRINGS.with(|cache| {
                    cache.borrow_mut()[i as usize]
                        .get_or_insert_with(|| JsString::from_str(&i.to_string()))
                        .clone()
                })
            }
            Some(i) => JsString::from_str(&i.to_string()),
            None => JsString::from_str(&dtoa::number_to_string(n.value())),
        }
    }

    // Integer part reduced modulo 2^32 into [0, 2^32).
    fn modulo_2_32(x: f64) -> u32 {
        if !x.is_finite() || x == 0.0 {
            return 0;
        }
        x.trunc().rem_euclid(4_294_967_296.0) as u32
    }

    // §7.1.6 ToInt32
    pub fn to_int32(x: f64) -> i32 {
        modulo_2_32(x) as i32
    }

    // §7.1.7 ToUint32
    pub fn to_uint32(x: f64) -> u32 {
        modulo_2_32(x)
    }

    // §7.1.9 ToUint16
    pub fn to_uint16(x: f64) -> u16 {
        modulo_2_32(x) as u16
    }

    /// `ToInt32` with the integer-tag fast path.
    pub fn number_to_int32(n: JsNumber) -> i32 {
        match n.as_i32() {
            Some(i) => i,
            None => to_int32(n.value()),
        }
    }

    pub fn number_to_uint32(n: JsNumber) -> u32 {
        match n.as_i32() {
            Some(i) => i as u32,
            None => to_uint32(n.value()),
        }
    }

    pub fn number_to_uint16(n: JsNumber) -> u16 {
        match n.as_i32() {
            Some(i) => i as u16,
            None => to_uint16(n.value()),
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => write!(f, "{}", number_ops::to_js_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Symbol(s) => write!(f, "{}", s.descriptive_string()),
            JsValue::Object(o) if o.is_callable() => write!(f, "[object Function]"),
            JsValue::Object(_) => write!(f, "[object Object]"),
        }
    }
}
