use std::rc::Rc;

use super::conversions::{PreferredType, is_strictly_equal, type_of};
use super::environment::{EnvRef, Environment};
use super::property::{PropertyDescriptor, PropertyKey};
use super::{Interpreter, JsFunction};
use crate::ast::*;
use crate::error::{EngineError, ErrorKind, JsError, JsResult};
use crate::stack::ensure_sufficient_stack;
use crate::types::{JsNumber, JsValue, WellKnownSymbol, number_ops};

/// What an identifier or member expression evaluates to before it is read
/// or written.
#[derive(Debug, Clone)]
pub enum Reference {
    Binding {
        env: EnvRef,
        name: Rc<str>,
        strict: bool,
    },
    Property {
        base: JsValue,
        key: PropertyKey,
        strict: bool,
    },
    Unresolvable {
        name: Rc<str>,
        strict: bool,
    },
}

fn function_name_for(key: &PropertyKey) -> String {
    match key {
        PropertyKey::String(s) => s.to_rust_string(),
        PropertyKey::Symbol(sym) => sym
            .description()
            .map(|d| format!("[{d}]"))
            .unwrap_or_default(),
    }
}

fn unsupported(what: &'static str) -> JsError {
    let e = EngineError::Unsupported(what);
    tracing::warn!(error = %e, "fatal engine error");
    e.into()
}

// Best-effort source text of a callee for "x is not a function" messages.
fn callee_text(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.to_string(),
        Expression::This => "this".to_string(),
        Expression::Member(object, MemberProperty::Dot(name)) => {
            format!("{}.{name}", callee_text(object))
        }
        Expression::Member(object, MemberProperty::Computed(_)) => {
            format!("{}[...]", callee_text(object))
        }
        _ => "expression".to_string(),
    }
}

impl Interpreter {
    /// ResolveBinding (§9.4.2).
    pub fn resolve_binding(&mut self, name: &Rc<str>, env: &EnvRef) -> JsResult<Reference> {
        let strict = env.is_strict();
        let mut current = Some(env);
        while let Some(scope) = current {
            if scope.has_binding(self, name)? {
                return Ok(Reference::Binding {
                    env: scope.clone(),
                    name: name.clone(),
                    strict,
                });
            }
            current = scope.outer();
        }
        Ok(Reference::Unresolvable {
            name: name.clone(),
            strict,
        })
    }

    /// ResolveThisBinding (§9.4.4).
    fn resolve_this(&self, env: &EnvRef) -> JsValue {
        let mut current = Some(env);
        while let Some(scope) = current {
            if scope.has_this_binding() {
                return scope.this_value().unwrap_or(JsValue::Undefined);
            }
            current = scope.outer();
        }
        JsValue::Undefined
    }

    /// GetValue (§6.2.5.5).
    pub fn get_value(&mut self, reference: &Reference) -> JsResult<JsValue> {
        match reference {
            Reference::Binding { env, name, strict } => env.get_binding_value(self, name, *strict),
            Reference::Property { base, key, .. } => {
                if base.is_nullish() {
                    return self.throw_error(
                        ErrorKind::Type,
                        format!(
                            "Cannot read properties of {base} (reading '{}')",
                            key.display_name()
                        ),
                    );
                }
                match base {
                    JsValue::Object(obj) => self.get(obj, key, base),
                    _ => self.get_v(base, key),
                }
            }
            Reference::Unresolvable { name, .. } => {
                self.throw_error(ErrorKind::Reference, format!("{name} is not defined"))
            }
        }
    }

    /// PutValue (§6.2.5.6).
    pub fn put_value(&mut self, reference: &Reference, value: JsValue) -> JsResult<()> {
        match reference {
            Reference::Binding { env, name, strict } => {
                env.set_mutable_binding(self, name, value, *strict)
            }
            Reference::Property { base, key, strict } => {
                if base.is_nullish() {
                    return self.throw_error(
                        ErrorKind::Type,
                        format!(
                            "Cannot set properties of {base} (setting '{}')",
                            key.display_name()
                        ),
                    );
                }
                let obj = self.to_object(base)?;
                let succeeded = self.set(&obj, key.clone(), value, base)?;
                if !succeeded && *strict {
                    return self.throw_error(
                        ErrorKind::Type,
                        format!(
                            "Cannot assign to read only property '{}' of object",
                            key.display_name()
                        ),
                    );
                }
                Ok(())
            }
            Reference::Unresolvable { name, strict } => {
                if *strict {
                    return self.throw_error(ErrorKind::Reference, format!("{name} is not defined"));
                }
                let global = self.global_object();
                self.set(
                    &global,
                    PropertyKey::from(&**name),
                    value,
                    &JsValue::Object(global.clone()),
                )?;
                Ok(())
            }
        }
    }

    pub(crate) fn eval_reference(&mut self, expr: &Expression, env: &EnvRef) -> JsResult<Reference> {
        match expr {
            Expression::Identifier(name) => self.resolve_binding(name, env),
            Expression::Member(object, property) => {
                let (base, key) = self.eval_member_target(object, property, env)?;
                Ok(Reference::Property {
                    base,
                    key,
                    strict: env.is_strict(),
                })
            }
            _ => self.throw_error(ErrorKind::Syntax, "Invalid left-hand side in assignment"),
        }
    }

    fn eval_member_target(
        &mut self,
        object: &Expression,
        property: &MemberProperty,
        env: &EnvRef,
    ) -> JsResult<(JsValue, PropertyKey)> {
        if matches!(object, Expression::Super) {
            return Err(unsupported("super property access"));
        }
        let base = self.eval_expression(object, env)?;
        let key = match property {
            MemberProperty::Dot(name) => PropertyKey::from(&**name),
            MemberProperty::Computed(expr) => {
                let value = self.eval_expression(expr, env)?;
                self.to_property_key(&value)?
            }
        };
        Ok((base, key))
    }

    /// Evaluates `expr`; anonymous function definitions take `name`.
    pub(crate) fn eval_named(
        &mut self,
        expr: &Expression,
        env: &EnvRef,
        name: &str,
    ) -> JsResult<JsValue> {
        match expr {
            Expression::Function(f) if expr.is_anonymous_function_definition() => {
                self.eval_function_expression(f, env, Some(name))
            }
            _ => self.eval_expression(expr, env),
        }
    }

    pub fn eval_expression(&mut self, expr: &Expression, env: &EnvRef) -> JsResult<JsValue> {
        ensure_sufficient_stack(|| self.eval_expr(expr, env))
    }

    fn eval_expr(&mut self, expr: &Expression, env: &EnvRef) -> JsResult<JsValue> {
        match expr {
            Expression::Literal(lit) => Ok(match lit {
                Literal::Null => JsValue::Null,
                Literal::Boolean(b) => JsValue::Boolean(*b),
                Literal::Number(n) => JsValue::number(*n),
                Literal::String(s) => JsValue::string(s),
            }),
            Expression::Identifier(_) | Expression::Member(..) => {
                let reference = self.eval_reference(expr, env)?;
                self.get_value(&reference)
            }
            Expression::This => Ok(self.resolve_this(env)),
            Expression::Super => Err(unsupported("super")),
            Expression::Object(props) => self.eval_object_literal(props, env),
            Expression::Function(f) => self.eval_function_expression(f, env, None),
            Expression::Unary(op, operand) => {
                let value = self.eval_expression(operand, env)?;
                self.eval_unary(*op, &value)
            }
            Expression::Typeof(operand) => {
                let value = match operand.as_ref() {
                    Expression::Identifier(name) => match self.resolve_binding(name, env)? {
                        Reference::Unresolvable { .. } => JsValue::Undefined,
                        reference => self.get_value(&reference)?,
                    },
                    other => self.eval_expression(other, env)?,
                };
                Ok(JsValue::string(type_of(&value)))
            }
            Expression::Void(operand) => {
                self.eval_expression(operand, env)?;
                Ok(JsValue::Undefined)
            }
            Expression::Delete(operand) => self.eval_delete(operand, env),
            Expression::Binary(op, left, right) => {
                let lval = self.eval_expression(left, env)?;
                let rval = self.eval_expression(right, env)?;
                self.eval_binary(*op, &lval, &rval)
            }
            Expression::Logical(op, left, right) => self.eval_logical(*op, left, right, env),
            Expression::Update(op, prefix, target) => self.eval_update(*op, *prefix, target, env),
            Expression::Assign(op, target, value) => self.eval_assign(*op, target, value, env),
            Expression::Conditional(test, consequent, alternate) => {
                let test = self.eval_expression(test, env)?;
                if Self::to_boolean(&test) {
                    self.eval_expression(consequent, env)
                } else {
                    self.eval_expression(alternate, env)
                }
            }
            Expression::Call(callee, args) => self.eval_call(callee, args, env),
            Expression::New(callee, args) => {
                let ctor = self.eval_expression(callee, env)?;
                let args = self.eval_arguments(args, env)?;
                let is_constructor = ctor
                    .as_object()
                    .is_some_and(|o| o.borrow().callable.as_ref().is_some_and(JsFunction::is_constructor));
                if !is_constructor {
                    return self.throw_error(
                        ErrorKind::Type,
                        format!("{} is not a constructor", callee_text(callee)),
                    );
                }
                self.construct(&ctor, &args)
            }
            Expression::Sequence(exprs) => {
                let mut last = JsValue::Undefined;
                for e in exprs {
                    last = self.eval_expression(e, env)?;
                }
                Ok(last)
            }
        }
    }

    /// Function expressions with their own name close over a scope holding
    /// an immutable binding of that name.
    fn eval_function_expression(
        &mut self,
        f: &Rc<Function>,
        env: &EnvRef,
        name: Option<&str>,
    ) -> JsResult<JsValue> {
        if !f.is_arrow()
            && let Some(own) = f.name.as_ref().filter(|n| !n.is_empty())
        {
            let func_env = Environment::declarative(env);
            func_env.create_immutable_binding(self, own.clone(), false)?;
            let closure = self.instantiate_function(f, &func_env, None);
            func_env.initialize_binding(self, own, closure.clone())?;
            return Ok(closure);
        }
        Ok(self.instantiate_function(f, env, name))
    }

    fn eval_property_name(&mut self, name: &PropertyName, env: &EnvRef) -> JsResult<PropertyKey> {
        Ok(match name {
            PropertyName::Identifier(id) => PropertyKey::from(&**id),
            PropertyName::String(s) => PropertyKey::from(s.as_str()),
            PropertyName::Number(n) => {
                PropertyKey::String(number_ops::to_js_string(JsNumber::new(*n)))
            }
            PropertyName::Computed(expr) => {
                let value = self.eval_expression(expr, env)?;
                self.to_property_key(&value)?
            }
        })
    }

    fn eval_object_literal(&mut self, props: &[Property], env: &EnvRef) -> JsResult<JsValue> {
        let obj = self.create_object();
        for prop in props {
            let key = self.eval_property_name(&prop.key, env)?;
            match prop.kind {
                PropertyKind::Init => {
                    let value = self.eval_named(&prop.value, env, &function_name_for(&key))?;
                    self.create_data_property_or_throw(&obj, key, value)?;
                }
                PropertyKind::Get | PropertyKind::Set => {
                    let Expression::Function(f) = &prop.value else {
                        return Err(EngineError::Invariant("accessor property without a function").into());
                    };
                    let is_getter = prop.kind == PropertyKind::Get;
                    let prefix = if is_getter { "get" } else { "set" };
                    let name = format!("{prefix} {}", function_name_for(&key));
                    let closure = self.instantiate_function(f, env, Some(&name));
                    let desc = if is_getter {
                        PropertyDescriptor::generic().with_get(closure)
                    } else {
                        PropertyDescriptor::generic().with_set(closure)
                    };
                    self.define_property_or_throw(
                        &obj,
                        key,
                        desc.with_enumerable(true).with_configurable(true),
                    )?;
                }
            }
        }
        Ok(JsValue::Object(obj))
    }

    fn eval_unary(&mut self, op: UnaryOp, value: &JsValue) -> JsResult<JsValue> {
        Ok(match op {
            UnaryOp::Minus => {
                let n = self.to_number(value)?;
                JsValue::number(number_ops::unary_minus(n))
            }
            UnaryOp::Plus => JsValue::number(self.to_number(value)?),
            UnaryOp::Not => JsValue::Boolean(!Self::to_boolean(value)),
            UnaryOp::BitNot => {
                let n = self.to_number(value)?;
                JsValue::number(number_ops::bitwise_not(n))
            }
        })
    }

    fn eval_delete(&mut self, operand: &Expression, env: &EnvRef) -> JsResult<JsValue> {
        match operand {
            Expression::Member(object, property) => {
                let (base, key) = self.eval_member_target(object, property, env)?;
                let obj = self.to_object(&base)?;
                let deleted = self.delete(&obj, &key)?;
                if !deleted && env.is_strict() {
                    return self.throw_error(
                        ErrorKind::Type,
                        format!("Cannot delete property '{}' of {base}", key.display_name()),
                    );
                }
                Ok(JsValue::Boolean(deleted))
            }
            Expression::Identifier(name) => {
                if env.is_strict() {
                    return self.throw_error(
                        ErrorKind::Syntax,
                        "Delete of an unqualified identifier in strict mode.",
                    );
                }
                match self.resolve_binding(name, env)? {
                    Reference::Binding { env: scope, name, .. } => {
                        Ok(JsValue::Boolean(scope.delete_binding(self, &name)?))
                    }
                    _ => Ok(JsValue::Boolean(true)),
                }
            }
            other => {
                self.eval_expression(other, env)?;
                Ok(JsValue::Boolean(true))
            }
        }
    }

    /// Applies a binary operator to already-evaluated operands.
    pub(crate) fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &JsValue,
        right: &JsValue,
    ) -> JsResult<JsValue> {
        let numeric: fn(f64, f64) -> f64 = match op {
            BinaryOp::Add => return self.eval_add(left, right),
            BinaryOp::Eq => return Ok(JsValue::Boolean(self.is_loosely_equal(left, right)?)),
            BinaryOp::NotEq => return Ok(JsValue::Boolean(!self.is_loosely_equal(left, right)?)),
            BinaryOp::StrictEq => return Ok(JsValue::Boolean(is_strictly_equal(left, right))),
            BinaryOp::StrictNotEq => return Ok(JsValue::Boolean(!is_strictly_equal(left, right))),
            // §13.10.1 Relational operators
            BinaryOp::Lt => {
                let r = self.is_less_than(left, right, true)?;
                return Ok(JsValue::Boolean(r == Some(true)));
            }
            BinaryOp::Gt => {
                let r = self.is_less_than(right, left, false)?;
                return Ok(JsValue::Boolean(r == Some(true)));
            }
            BinaryOp::LtEq => {
                let r = self.is_less_than(right, left, false)?;
                return Ok(JsValue::Boolean(r == Some(false)));
            }
            BinaryOp::GtEq => {
                let r = self.is_less_than(left, right, true)?;
                return Ok(JsValue::Boolean(r == Some(false)));
            }
            BinaryOp::In => {
                let JsValue::Object(obj) = right else {
                    return self.throw_error(
                        ErrorKind::Type,
                        format!("Cannot use 'in' operator to search for '{left}' in {right}"),
                    );
                };
                let key = self.to_property_key(left)?;
                return Ok(JsValue::Boolean(self.has_property(obj, &key)?));
            }
            BinaryOp::Instanceof => return self.instance_of(left, right),
            BinaryOp::Sub => number_ops::subtract,
            BinaryOp::Mul => number_ops::multiply,
            BinaryOp::Div => number_ops::divide,
            BinaryOp::Mod => number_ops::remainder,
            BinaryOp::Exp => number_ops::exponentiate,
            BinaryOp::LShift => number_ops::left_shift,
            BinaryOp::RShift => number_ops::signed_right_shift,
            BinaryOp::URShift => number_ops::unsigned_right_shift,
            BinaryOp::BitAnd => number_ops::bitwise_and,
            BinaryOp::BitOr => number_ops::bitwise_or,
            BinaryOp::BitXor => number_ops::bitwise_xor,
        };
        let x = self.to_number(left)?;
        let y = self.to_number(right)?;
        Ok(JsValue::number(numeric(x, y)))
    }

    // §13.15.3 ApplyStringOrNumericBinaryOperator for `+`
    fn eval_add(&mut self, left: &JsValue, right: &JsValue) -> JsResult<JsValue> {
        let lprim = self.to_primitive(left, PreferredType::Default)?;
        let rprim = self.to_primitive(right, PreferredType::Default)?;
        if lprim.is_string() || rprim.is_string() {
            let ls = self.to_string(&lprim)?;
            let rs = self.to_string(&rprim)?;
            return Ok(JsValue::String(ls.concat(&rs)));
        }
        let x = self.to_number(&lprim)?;
        let y = self.to_number(&rprim)?;
        Ok(JsValue::number(number_ops::add(x, y)))
    }

    /// InstanceofOperator (§13.10.2).
    fn instance_of(&mut self, value: &JsValue, target: &JsValue) -> JsResult<JsValue> {
        if !target.is_object() {
            return self.throw_error(
                ErrorKind::Type,
                "Right-hand side of 'instanceof' is not an object",
            );
        }
        let has_instance = PropertyKey::Symbol(WellKnownSymbol::HasInstance.symbol());
        if let Some(handler) = self.get_method(target, &has_instance)? {
            let result = self.call(&handler, target, std::slice::from_ref(value))?;
            return Ok(JsValue::Boolean(Self::to_boolean(&result)));
        }
        if !target.is_callable() {
            return self.throw_error(
                ErrorKind::Type,
                "Right-hand side of 'instanceof' is not callable",
            );
        }
        self.ordinary_has_instance(target, value)
    }

    /// OrdinaryHasInstance (§7.3.21).
    fn ordinary_has_instance(&mut self, ctor: &JsValue, value: &JsValue) -> JsResult<JsValue> {
        let (JsValue::Object(ctor_obj), JsValue::Object(obj)) = (ctor, value) else {
            return Ok(JsValue::Boolean(false));
        };
        let proto = self.get(ctor_obj, &PropertyKey::from("prototype"), ctor)?;
        let JsValue::Object(proto) = proto else {
            return self.throw_error(
                ErrorKind::Type,
                "Function has non-object prototype in instanceof check",
            );
        };
        let mut current = self.get_prototype_of(obj);
        while let Some(p) = current {
            if p.ptr_eq(&proto) {
                return Ok(JsValue::Boolean(true));
            }
            current = self.get_prototype_of(&p);
        }
        Ok(JsValue::Boolean(false))
    }

    fn eval_logical(
        &mut self,
        op: LogicalOp,
        left: &Expression,
        right: &Expression,
        env: &EnvRef,
    ) -> JsResult<JsValue> {
        let lval = self.eval_expression(left, env)?;
        let short_circuit = match op {
            LogicalOp::And => !Self::to_boolean(&lval),
            LogicalOp::Or => Self::to_boolean(&lval),
            LogicalOp::NullishCoalescing => !lval.is_nullish(),
        };
        if short_circuit {
            return Ok(lval);
        }
        self.eval_expression(right, env)
    }

    // `eval` and `arguments` cannot be assigned in strict code.
    fn check_strict_target(&mut self, target: &Expression, env: &EnvRef) -> JsResult<()> {
        if env.is_strict()
            && let Expression::Identifier(name) = target
            && matches!(&**name, "eval" | "arguments")
        {
            return self.throw_error(
                ErrorKind::Syntax,
                format!("Unexpected {name} in strict mode"),
            );
        }
        Ok(())
    }

    fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expression,
        env: &EnvRef,
    ) -> JsResult<JsValue> {
        self.check_strict_target(target, env)?;
        let reference = self.eval_reference(target, env)?;
        let old = self.get_value(&reference)?;
        let old = self.to_number(&old)?;
        let new = match op {
            UpdateOp::Increment => number_ops::add(old, 1.0),
            UpdateOp::Decrement => number_ops::subtract(old, 1.0),
        };
        self.put_value(&reference, JsValue::number(new))?;
        Ok(JsValue::number(if prefix { new } else { old }))
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expression,
        value: &Expression,
        env: &EnvRef,
    ) -> JsResult<JsValue> {
        self.check_strict_target(target, env)?;
        let reference = self.eval_reference(target, env)?;
        let named_rhs = |interp: &mut Self| match target {
            Expression::Identifier(name) => interp.eval_named(value, env, name),
            _ => interp.eval_expression(value, env),
        };
        let result = match op {
            AssignOp::Assign => named_rhs(self)?,
            AssignOp::LogicalAndAssign | AssignOp::LogicalOrAssign | AssignOp::NullishAssign => {
                let current = self.get_value(&reference)?;
                let short_circuit = match op {
                    AssignOp::LogicalAndAssign => !Self::to_boolean(&current),
                    AssignOp::LogicalOrAssign => Self::to_boolean(&current),
                    _ => !current.is_nullish(),
                };
                if short_circuit {
                    return Ok(current);
                }
                named_rhs(self)?
            }
            compound => {
                let current = self.get_value(&reference)?;
                let rval = self.eval_expression(value, env)?;
                let binary = compound
                    .binary_op()
                    .ok_or(EngineError::Invariant("compound assignment without an operator"))?;
                self.eval_binary(binary, &current, &rval)?
            }
        };
        self.put_value(&reference, result.clone())?;
        Ok(result)
    }

    fn eval_arguments(&mut self, args: &[Expression], env: &EnvRef) -> JsResult<Vec<JsValue>> {
        args.iter().map(|a| self.eval_expression(a, env)).collect()
    }

    fn eval_call(&mut self, callee: &Expression, args: &[Expression], env: &EnvRef) -> JsResult<JsValue> {
        let (func, this) = match callee {
            Expression::Identifier(_) | Expression::Member(..) => {
                let reference = self.eval_reference(callee, env)?;
                let func = self.get_value(&reference)?;
                let this = match &reference {
                    Reference::Property { base, .. } => base.clone(),
                    Reference::Binding { env: scope, .. } => scope
                        .with_base_object()
                        .map_or(JsValue::Undefined, JsValue::Object),
                    Reference::Unresolvable { .. } => JsValue::Undefined,
                };
                (func, this)
            }
            Expression::Super => return Err(unsupported("super call")),
            other => (self.eval_expression(other, env)?, JsValue::Undefined),
        };
        let args = self.eval_arguments(args, env)?;
        if !func.is_callable() {
            return self.throw_error(
                ErrorKind::Type,
                format!("{} is not a function", callee_text(callee)),
            );
        }
        self.call(&func, &this, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::interpreter::same_value;
    use crate::types::JsString;

    fn eval(body: Vec<Statement>) -> JsResult<JsValue> {
        Interpreter::new().run(&Program::new(body))
    }

    fn eval_expr(e: Expression) -> JsValue {
        eval(vec![expr(e)]).unwrap()
    }

    #[test]
    fn addition_prefers_strings() {
        let v = eval_expr(binary(BinaryOp::Add, string("a"), num(1.0)));
        assert_eq!(v.to_string(), "a1");
        let v = eval_expr(binary(BinaryOp::Add, boolean(true), num(1.0)));
        assert_eq!(v.as_number(), Some(2.0));
        let v = eval_expr(binary(BinaryOp::Add, num(0.1), num(0.2)));
        assert_eq!(v.to_string(), "0.30000000000000004");
    }

    #[test]
    fn relational_operators_handle_nan_and_strings() {
        let nan = || binary(BinaryOp::Div, num(0.0), num(0.0));
        assert!(same_value(&eval_expr(binary(BinaryOp::LtEq, nan(), num(1.0))), &JsValue::Boolean(false)));
        assert!(same_value(&eval_expr(binary(BinaryOp::GtEq, nan(), nan())), &JsValue::Boolean(false)));
        assert!(same_value(
            &eval_expr(binary(BinaryOp::Lt, string("10"), string("9"))),
            &JsValue::Boolean(true)
        ));
        assert!(same_value(
            &eval_expr(binary(BinaryOp::Lt, string("10"), num(9.0))),
            &JsValue::Boolean(false)
        ));
    }

    #[test]
    fn shifts_and_bitwise_use_int32() {
        let v = eval_expr(binary(BinaryOp::URShift, num(-1.0), num(0.0)));
        assert_eq!(v.as_number(), Some(4294967295.0));
        let v = eval_expr(binary(BinaryOp::LShift, num(1.0), num(33.0)));
        assert_eq!(v.as_number(), Some(2.0));
        let v = eval_expr(unary(UnaryOp::BitNot, num(0.0)));
        assert_eq!(v.as_number(), Some(-1.0));
    }

    #[test]
    fn typeof_unresolvable_is_undefined() {
        let v = eval_expr(typeof_(ident("nowhere")));
        assert_eq!(v.to_string(), "undefined");
    }

    #[test]
    fn reading_unresolvable_is_reference_error() {
        let err = eval(vec![expr(ident("nowhere"))]).unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Reference));
        assert!(err.to_string().contains("nowhere is not defined"));
    }

    #[test]
    fn sloppy_assignment_creates_global_property() {
        let mut interp = Interpreter::new();
        interp
            .run(&Program::new(vec![expr(assign(ident("fresh"), num(4.0)))]))
            .unwrap();
        let global = interp.global_object();
        let desc = global.borrow().own(&PropertyKey::from("fresh")).cloned().unwrap();
        assert!(desc.is_enumerable() && desc.is_configurable());
    }

    #[test]
    fn strict_assignment_to_unresolvable_throws() {
        let err = eval(vec![use_strict(), expr(assign(ident("fresh"), num(4.0)))]).unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Reference));
    }

    #[test]
    fn strict_assignment_to_eval_is_syntax_error() {
        let err = eval(vec![use_strict(), expr(assign(ident("eval"), num(1.0)))]).unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Syntax));
    }

    #[test]
    fn reading_property_of_null_names_the_key() {
        let err = eval(vec![expr(member(null(), "foo"))]).unwrap_err();
        assert!(err.to_string().contains("Cannot read properties of null (reading 'foo')"));
    }

    #[test]
    fn delete_reports_configurability() {
        let v = eval(vec![
            var("o", Some(object(vec![("a", num(1.0))]))),
            expr(delete(member(ident("o"), "a"))),
        ])
        .unwrap();
        assert!(same_value(&v, &JsValue::Boolean(true)));
        let v = eval_expr(delete(ident("undefined")));
        assert!(same_value(&v, &JsValue::Boolean(false)));
        let err = eval(vec![use_strict(), expr(delete(member(ident("globalThis"), "NaN")))])
            .unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Type));
    }

    #[test]
    fn delete_of_identifier_in_strict_code_is_syntax_error() {
        let err = eval(vec![use_strict(), var("x", None), expr(delete(ident("x")))]).unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Syntax));
    }

    #[test]
    fn accessors_in_object_literals() {
        // var o = { _v: 1, get v() { return this._v * 10 }, set v(x) { this._v = x } }; o.v = 4; o.v
        let v = eval(vec![
            var(
                "o",
                Some(object_with(vec![
                    Property {
                        key: PropertyName::Identifier(Rc::from("_v")),
                        value: num(1.0),
                        kind: PropertyKind::Init,
                    },
                    getter(
                        "v",
                        vec![ret(Some(binary(BinaryOp::Mul, member(this(), "_v"), num(10.0))))],
                    ),
                    setter("v", "x", vec![expr(assign(member(this(), "_v"), ident("x")))]),
                ])),
            ),
            expr(assign(member(ident("o"), "v"), num(4.0))),
            expr(member(ident("o"), "v")),
        ])
        .unwrap();
        assert_eq!(v.as_number(), Some(40.0));
    }

    #[test]
    fn anonymous_functions_take_binding_name() {
        let v = eval(vec![
            var("f", Some(function_expr(None, &[], vec![]))),
            expr(member(ident("f"), "name")),
        ])
        .unwrap();
        assert_eq!(v.to_string(), "f");
    }

    #[test]
    fn named_function_expression_sees_itself() {
        // var fact = function me(n) { return n <= 1 ? 1 : n * me(n - 1) }; fact(5)
        let body = vec![ret(Some(conditional(
            binary(BinaryOp::LtEq, ident("n"), num(1.0)),
            num(1.0),
            binary(
                BinaryOp::Mul,
                ident("n"),
                call(ident("me"), vec![binary(BinaryOp::Sub, ident("n"), num(1.0))]),
            ),
        )))];
        let v = eval(vec![
            var("fact", Some(function_expr(Some("me"), &["n"], body))),
            expr(call(ident("fact"), vec![num(5.0)])),
        ])
        .unwrap();
        assert_eq!(v.as_number(), Some(120.0));
    }

    #[test]
    fn instanceof_walks_prototype_chain() {
        let v = eval(vec![
            function_decl("F", &[], vec![]),
            expr(binary(BinaryOp::Instanceof, new_(ident("F"), vec![]), ident("F"))),
        ])
        .unwrap();
        assert!(same_value(&v, &JsValue::Boolean(true)));
        let err = eval(vec![expr(binary(BinaryOp::Instanceof, num(1.0), num(1.0)))]).unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Type));
    }

    #[test]
    fn in_requires_object() {
        let v = eval_expr(binary(BinaryOp::In, string("a"), object(vec![("a", null())])));
        assert!(same_value(&v, &JsValue::Boolean(true)));
        let err = eval(vec![expr(binary(BinaryOp::In, string("a"), string("abc")))]).unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Type));
    }

    #[test]
    fn logical_assignment_short_circuits() {
        let v = eval(vec![
            var("a", Some(num(0.0))),
            var("b", Some(num(5.0))),
            expr(compound(AssignOp::LogicalOrAssign, ident("a"), num(3.0))),
            expr(compound(AssignOp::NullishAssign, ident("b"), ident("missing"))),
            expr(binary(BinaryOp::Add, ident("a"), ident("b"))),
        ])
        .unwrap();
        assert_eq!(v.as_number(), Some(8.0));
    }

    #[test]
    fn postfix_update_returns_old_value() {
        let v = eval(vec![
            var("i", Some(string("5"))),
            expr(binary(
                BinaryOp::Mul,
                update(UpdateOp::Increment, false, ident("i")),
                update(UpdateOp::Decrement, true, ident("i")),
            )),
        ])
        .unwrap();
        assert_eq!(v.as_number(), Some(25.0));
    }

    #[test]
    fn calling_non_function_names_callee() {
        let err = eval(vec![
            var("o", Some(object(vec![]))),
            expr(call(member(ident("o"), "missing"), vec![])),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("o.missing is not a function"));
    }

    #[test]
    fn with_scope_supplies_this_for_calls() {
        // var o = { f: function () { return this === o } }; with (o) { f() }
        let v = eval(vec![
            var(
                "o",
                Some(object(vec![(
                    "f",
                    function_expr(
                        None,
                        &[],
                        vec![ret(Some(binary(BinaryOp::StrictEq, this(), ident("o"))))],
                    ),
                )])),
            ),
            with(ident("o"), block(vec![expr(call(ident("f"), vec![]))])),
        ])
        .unwrap();
        assert!(same_value(&v, &JsValue::Boolean(true)));
    }

    #[test]
    fn super_is_unsupported() {
        let err = eval(vec![expr(Expression::Super)]).unwrap_err();
        assert!(matches!(err, JsError::Engine(EngineError::Unsupported("super"))));
    }

    #[test]
    fn string_concat_keeps_code_units() {
        let v = eval_expr(binary(BinaryOp::Add, string("é"), string("\u{1F600}")));
        let JsValue::String(s) = v else {
            panic!("expected a string");
        };
        assert_eq!(s.len(), 3);
        assert_eq!(s, JsString::from_str("é\u{1F600}"));
    }
}
