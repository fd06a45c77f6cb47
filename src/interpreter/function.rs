use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::environment::{EnvRef, Environment};
use super::property::{PropertyDescriptor, PropertyKey};
use super::{Completion, Interpreter, JsFunction, ObjectClass};
use crate::ast::Function;
use crate::error::{EngineError, ErrorKind, JsError, JsResult};
use crate::stack::ensure_sufficient_stack;
use crate::types::{JsObject, JsValue};

impl Interpreter {
    /// OrdinaryFunctionCreate + SetFunctionName + MakeConstructor.
    pub(crate) fn create_function_object(
        &mut self,
        func: JsFunction,
        name: &str,
        length: usize,
    ) -> JsObject {
        let proto = self.realm.intrinsics.function_prototype.clone();
        let obj = self.alloc_object(ObjectClass::Function, Some(proto));
        let is_constructor = func.is_constructor();
        {
            let mut data = obj.borrow_mut();
            data.store(
                PropertyKey::from("length"),
                PropertyDescriptor::data(JsValue::number(length as f64), false, false, true),
            );
            data.store(
                PropertyKey::from("name"),
                PropertyDescriptor::data(JsValue::string(name), false, false, true),
            );
            data.callable = Some(func);
        }
        if is_constructor {
            let prototype = self.create_object();
            prototype.borrow_mut().store(
                PropertyKey::from("constructor"),
                PropertyDescriptor::data(JsValue::Object(obj.clone()), true, false, true),
            );
            obj.borrow_mut().store(
                PropertyKey::from("prototype"),
                PropertyDescriptor::data(JsValue::Object(prototype), true, false, false),
            );
        }
        obj
    }

    /// InstantiateFunctionObject: a closure over `env`. `name` overrides the
    /// function's own name for anonymous definitions.
    pub(crate) fn instantiate_function(
        &mut self,
        function: &Rc<Function>,
        env: &EnvRef,
        name: Option<&str>,
    ) -> JsValue {
        let strict = env.is_strict() || function.body.declarations().strict_directive;
        let func = JsFunction::User {
            function: function.clone(),
            closure: env.clone(),
            strict,
        };
        let name = name.or(function.name.as_deref()).unwrap_or("");
        JsValue::Object(self.create_function_object(func, name, function.params.len()))
    }

    /// Call (§7.3.14).
    pub fn call(&mut self, f: &JsValue, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let callable = match f {
            JsValue::Object(obj) => obj.borrow().callable.clone(),
            _ => None,
        };
        let (Some(func), JsValue::Object(fobj)) = (callable, f) else {
            return self.throw_error(ErrorKind::Type, format!("{f} is not a function"));
        };
        if self.call_depth >= self.options.max_call_depth {
            return self.throw_error(ErrorKind::Range, "Maximum call stack size exceeded");
        }
        self.call_depth += 1;
        let result = ensure_sufficient_stack(|| self.call_function(fobj, &func, this, args));
        self.call_depth -= 1;
        result
    }

    fn call_function(
        &mut self,
        fobj: &JsObject,
        func: &JsFunction,
        this: &JsValue,
        args: &[JsValue],
    ) -> JsResult<JsValue> {
        let (function, closure, strict) = match func {
            JsFunction::Native(_, _, f) => return f(self, this, args),
            JsFunction::User {
                function,
                closure,
                strict,
            } => (function, closure, *strict),
        };

        // OrdinaryCallBindThis (§10.2.1.2)
        let this_binding = if function.is_arrow() {
            None
        } else if strict {
            Some(this.clone())
        } else if this.is_nullish() {
            Some(JsValue::Object(self.global_object()))
        } else {
            Some(JsValue::Object(self.to_object(this)?))
        };
        let env = Environment::function(closure.clone(), this_binding, strict);
        self.function_declaration_instantiation(fobj, function, &env, args)?;

        match self.exec_statements(&function.body.body, &env)? {
            Completion::Return(value, _) => Ok(value),
            Completion::Normal(_) => Ok(JsValue::Undefined),
            Completion::Throw(value, location) => {
                self.throw_location = Some(location);
                Err(JsError::Throw(value))
            }
            Completion::Break(..) | Completion::Continue(..) => {
                Err(EngineError::Invariant("break or continue escaped a function body").into())
            }
        }
    }

    /// Construct (§7.3.15) for ordinary functions.
    pub fn construct(&mut self, f: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let fobj = match f {
            JsValue::Object(obj) if obj.borrow().callable.as_ref().is_some_and(JsFunction::is_constructor) => {
                obj.clone()
            }
            _ => return self.throw_error(ErrorKind::Type, format!("{f} is not a constructor")),
        };
        // OrdinaryCreateFromConstructor (§10.1.13)
        let proto = match self.get(&fobj, &PropertyKey::from("prototype"), f)? {
            JsValue::Object(proto) => proto,
            _ => self.realm.intrinsics.object_prototype.clone(),
        };
        let this_obj = JsValue::Object(self.create_object_with_proto(Some(proto)));
        let result = self.call(f, &this_obj, args)?;
        if result.is_object() {
            return Ok(result);
        }
        Ok(this_obj)
    }

    /// FunctionDeclarationInstantiation (§10.2.11) for simple parameter lists.
    fn function_declaration_instantiation(
        &mut self,
        fobj: &JsObject,
        function: &Function,
        env: &EnvRef,
        args: &[JsValue],
    ) -> JsResult<()> {
        let strict = env.is_strict();
        let decls = function.body.declarations();
        tracing::debug!(
            name = function.name.as_deref().unwrap_or(""),
            params = function.params.len(),
            vars = decls.var_names.len(),
            functions = decls.functions.len(),
            "function declaration instantiation"
        );

        let mut instantiated: FxHashSet<Rc<str>> = FxHashSet::default();
        for name in &function.params {
            if instantiated.insert(name.clone()) {
                env.create_mutable_binding(self, name.clone(), false)?;
            }
        }

        let arguments: Rc<str> = Rc::from("arguments");
        let arguments_needed = !function.is_arrow()
            && !instantiated.contains(&arguments)
            && !decls.function_names().any(|n| *n == arguments)
            && !decls.lexical.iter().any(|l| l.name == arguments);
        if arguments_needed {
            let ao = if strict {
                self.create_unmapped_arguments_object(args)
            } else {
                self.create_mapped_arguments_object(fobj, &function.params, args, env)
            };
            if strict {
                env.create_immutable_binding(self, arguments.clone(), false)?;
            } else {
                env.create_mutable_binding(self, arguments.clone(), false)?;
            }
            env.initialize_binding(self, &arguments, JsValue::Object(ao))?;
            instantiated.insert(arguments);
        }

        // IteratorBindingInitialization: later duplicates overwrite earlier ones.
        let mut bound: FxHashSet<&str> = FxHashSet::default();
        for (i, name) in function.params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(JsValue::Undefined);
            if bound.insert(&**name) {
                env.initialize_binding(self, name, value)?;
            } else {
                env.set_mutable_binding(self, name, value, strict)?;
            }
        }

        for name in &decls.var_names {
            if instantiated.insert(name.clone()) {
                env.create_mutable_binding(self, name.clone(), false)?;
                env.initialize_binding(self, name, JsValue::Undefined)?;
            }
        }

        for lexical in &decls.lexical {
            if lexical.is_const {
                env.create_immutable_binding(self, lexical.name.clone(), true)?;
            } else {
                env.create_mutable_binding(self, lexical.name.clone(), false)?;
            }
        }

        for f in &decls.functions {
            let Some(name) = f.name.clone() else {
                continue;
            };
            let closure = self.instantiate_function(f, env, None);
            if instantiated.insert(name.clone()) {
                env.create_mutable_binding(self, name.clone(), false)?;
                env.initialize_binding(self, &name, closure)?;
            } else {
                env.set_mutable_binding(self, &name, closure, false)?;
            }
        }
        Ok(())
    }

    fn create_arguments_base(&mut self, args: &[JsValue]) -> JsObject {
        let proto = self.realm.intrinsics.object_prototype.clone();
        let obj = self.alloc_object(ObjectClass::Arguments, Some(proto));
        {
            let mut data = obj.borrow_mut();
            for (i, arg) in args.iter().enumerate() {
                data.store(
                    PropertyKey::index(i as u32),
                    PropertyDescriptor::data_default(arg.clone()),
                );
            }
            data.store(
                PropertyKey::from("length"),
                PropertyDescriptor::data(JsValue::number(args.len() as f64), true, false, true),
            );
        }
        obj
    }

    /// CreateUnmappedArgumentsObject (§10.4.4.6).
    fn create_unmapped_arguments_object(&mut self, args: &[JsValue]) -> JsObject {
        let obj = self.create_arguments_base(args);
        let thrower = self.create_native_function("", 0, |interp, _, _| {
            interp.throw_error(
                ErrorKind::Type,
                "'callee' may not be accessed on strict mode arguments objects",
            )
        });
        obj.borrow_mut().store(
            PropertyKey::from("callee"),
            PropertyDescriptor::accessor(Some(thrower.clone()), Some(thrower), false, false),
        );
        obj
    }

    /// CreateMappedArgumentsObject (§10.4.4.7): each index backed by a
    /// parameter binding reads and writes that binding until it is unmapped.
    fn create_mapped_arguments_object(
        &mut self,
        fobj: &JsObject,
        params: &[Rc<str>],
        args: &[JsValue],
        env: &EnvRef,
    ) -> JsObject {
        let obj = self.create_arguments_base(args);
        let mut mapped: FxHashSet<&str> = FxHashSet::default();
        for (index, name) in params.iter().enumerate().rev() {
            if !mapped.insert(&**name) || index >= args.len() {
                continue;
            }
            obj.borrow_mut().store(
                PropertyKey::index(index as u32),
                PropertyDescriptor::host_binding(env.clone(), name.clone(), true, true),
            );
        }
        obj.borrow_mut().store(
            PropertyKey::from("callee"),
            PropertyDescriptor::data(JsValue::Object(fobj.clone()), true, false, true),
        );
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::interpreter::same_value;
    use crate::ast::{BinaryOp, Program};
    use crate::options::Options;

    fn run(interp: &mut Interpreter, body: Vec<crate::ast::Statement>) -> JsResult<JsValue> {
        interp.run(&Program::new(body))
    }

    #[test]
    fn function_objects_have_name_length_and_prototype() {
        let mut interp = Interpreter::new();
        let f = run(&mut interp, vec![expr(function_expr(Some("f"), &["a", "b"], vec![]))]).unwrap();
        let obj = f.as_object().unwrap().clone();
        let get = |interp: &mut Interpreter, k: &str| interp.get(&obj, &PropertyKey::from(k), &f).unwrap();
        assert_eq!(get(&mut interp, "length").as_number(), Some(2.0));
        assert_eq!(get(&mut interp, "name").to_string(), "f");
        let proto = get(&mut interp, "prototype");
        let back = interp
            .get(proto.as_object().unwrap(), &PropertyKey::from("constructor"), &proto)
            .unwrap();
        assert!(same_value(&back, &f));
    }

    #[test]
    fn arrows_are_not_constructors() {
        let mut interp = Interpreter::new();
        let err = run(
            &mut interp,
            vec![
                var("f", Some(arrow(&[], num(1.0)))),
                expr(new_(ident("f"), vec![])),
            ],
        )
        .unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Type));
    }

    #[test]
    fn constructing_uses_prototype_property() {
        let mut interp = Interpreter::new();
        let result = run(
            &mut interp,
            vec![
                function_decl("P", &["x"], vec![expr(assign(member(this(), "x"), ident("x")))]),
                expr(assign(member(member(ident("P"), "prototype"), "tag"), string("p"))),
                var("p", Some(new_(ident("P"), vec![num(3.0)]))),
                expr(binary(BinaryOp::Add, member(ident("p"), "tag"), member(ident("p"), "x"))),
            ],
        )
        .unwrap();
        assert_eq!(result.to_string(), "p3");
    }

    #[test]
    fn call_depth_limit_throws_range_error() {
        let mut interp = Interpreter::with_options(Options::default().with_max_call_depth(32));
        let err = run(
            &mut interp,
            vec![
                function_decl("r", &[], vec![ret(Some(call(ident("r"), vec![])))]),
                expr(call(ident("r"), vec![])),
            ],
        )
        .unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Range));
        assert!(err.to_string().contains("Maximum call stack size exceeded"));
    }

    #[test]
    fn sloppy_this_is_global_and_strict_this_is_undefined() {
        let mut interp = Interpreter::new();
        let sloppy = run(
            &mut interp,
            vec![
                function_decl("f", &[], vec![ret(Some(this()))]),
                expr(call(ident("f"), vec![])),
            ],
        )
        .unwrap();
        assert!(same_value(&sloppy, &JsValue::Object(interp.global_object())));

        let strict = run(
            &mut interp,
            vec![
                function_decl("g", &[], vec![use_strict(), ret(Some(this()))]),
                expr(call(ident("g"), vec![])),
            ],
        )
        .unwrap();
        assert!(strict.is_undefined());
    }

    #[test]
    fn mapped_arguments_track_parameters() {
        let mut interp = Interpreter::new();
        // function f(a) { arguments[0] = 5; var before = a; a = 7; return before * 10 + arguments[0]; }
        let result = run(
            &mut interp,
            vec![
                function_decl(
                    "f",
                    &["a"],
                    vec![
                        expr(assign(index(ident("arguments"), num(0.0)), num(5.0))),
                        var("before", Some(ident("a"))),
                        expr(assign(ident("a"), num(7.0))),
                        ret(Some(binary(
                            BinaryOp::Add,
                            binary(BinaryOp::Mul, ident("before"), num(10.0)),
                            index(ident("arguments"), num(0.0)),
                        ))),
                    ],
                ),
                expr(call(ident("f"), vec![num(1.0)])),
            ],
        )
        .unwrap();
        assert_eq!(result.as_number(), Some(57.0));
    }

    #[test]
    fn deleting_an_argument_unmaps_it() {
        let mut interp = Interpreter::new();
        // function f(a) { delete arguments[0]; arguments[0] = 2; return a; }
        let result = run(
            &mut interp,
            vec![
                function_decl(
                    "f",
                    &["a"],
                    vec![
                        expr(delete(index(ident("arguments"), num(0.0)))),
                        expr(assign(index(ident("arguments"), num(0.0)), num(2.0))),
                        ret(Some(ident("a"))),
                    ],
                ),
                expr(call(ident("f"), vec![num(1.0)])),
            ],
        )
        .unwrap();
        assert_eq!(result.as_number(), Some(1.0));
    }

    #[test]
    fn strict_arguments_are_unmapped() {
        let mut interp = Interpreter::new();
        let result = run(
            &mut interp,
            vec![
                function_decl(
                    "f",
                    &["a"],
                    vec![
                        use_strict(),
                        expr(assign(ident("a"), num(9.0))),
                        ret(Some(index(ident("arguments"), num(0.0)))),
                    ],
                ),
                expr(call(ident("f"), vec![num(1.0)])),
            ],
        )
        .unwrap();
        assert_eq!(result.as_number(), Some(1.0));
    }

    #[test]
    fn hoisted_functions_see_later_vars() {
        let mut interp = Interpreter::new();
        let result = run(
            &mut interp,
            vec![
                expr(call(ident("f"), vec![])),
                function_decl("f", &[], vec![ret(Some(typeof_(ident("v"))))]),
                var("v", Some(num(1.0))),
            ],
        )
        .unwrap();
        assert!(result.is_string());
        assert_eq!(result.to_string(), "undefined");
    }
}
