use std::rc::Rc;

use super::conversions::is_strictly_equal;
use super::environment::{EnvRef, Environment};
use super::object::ForInIterator;
use super::property::PropertyKey;
use super::{Completion, Interpreter};
use crate::ast::*;
use crate::error::{EngineError, ErrorKind, JsError, JsResult};
use crate::stack::ensure_sufficient_stack;
use crate::types::{JsValue, WellKnownSymbol};

type ExecResult = Result<Completion, EngineError>;

/// Unwraps a `JsResult`; a script throw becomes a Throw completion at `$loc`.
macro_rules! js_try {
    ($interp:ident, $expr:expr, $loc:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => return $interp.throw_completion(e, $loc),
        }
    };
}

/// LoopContinues (§14.7.1.2).
fn loop_continues(completion: &Completion, labels: &[&str]) -> bool {
    match completion {
        Completion::Normal(_) | Completion::Continue(None, ..) => true,
        Completion::Continue(Some(label), ..) => labels.contains(&label.as_str()),
        _ => false,
    }
}

// An unlabelled break ends the innermost breakable statement normally.
fn exit_breakable(completion: Completion) -> Completion {
    match completion {
        Completion::Break(None, value, _) => {
            Completion::Normal(Some(value.unwrap_or(JsValue::Undefined)))
        }
        other => other,
    }
}

fn first_location(list: &StatementList) -> Location {
    list.body.first().map(|s| s.location).unwrap_or_default()
}

pub(crate) struct IteratorRecord {
    iterator: JsValue,
    next_method: JsValue,
}

impl Interpreter {
    pub(crate) fn throw_completion(&mut self, err: JsError, location: Location) -> ExecResult {
        match err {
            JsError::Throw(value) => {
                let location = self.throw_location.take().unwrap_or(location);
                Ok(Completion::Throw(value, location))
            }
            JsError::Uncaught { value, location } => Ok(Completion::Throw(value, location)),
            JsError::Engine(e) => Err(e),
        }
    }

    fn throw_new_error(&mut self, kind: ErrorKind, message: &str, location: Location) -> ExecResult {
        let error = self.create_error(kind, message);
        Ok(Completion::Throw(error, location))
    }

    pub(crate) fn exec_script(&mut self, script: &StatementList, env: &EnvRef) -> ExecResult {
        if let Err(e) = self.global_declaration_instantiation(script.declarations(), env) {
            return self.throw_completion(e, first_location(script));
        }
        self.exec_statements(&script.body, env)
    }

    /// Runs a statement list, keeping the value of the last value-producing statement.
    pub(crate) fn exec_statements(&mut self, stmts: &[Statement], env: &EnvRef) -> ExecResult {
        let mut last = None;
        for stmt in stmts {
            match self.exec_statement(stmt, env)? {
                Completion::Normal(value) => {
                    if value.is_some() {
                        last = value;
                    }
                }
                abrupt => return Ok(abrupt.update_empty(last)),
            }
        }
        Ok(Completion::Normal(last))
    }

    pub fn exec_statement(&mut self, stmt: &Statement, env: &EnvRef) -> ExecResult {
        self.exec_labelled(stmt, env, &[])
    }

    fn exec_labelled(&mut self, stmt: &Statement, env: &EnvRef, labels: &[&str]) -> ExecResult {
        if self.interrupt.replace(false) {
            tracing::warn!(line = stmt.location.line, "execution interrupted by host");
            return Err(EngineError::Interrupted);
        }
        ensure_sufficient_stack(|| self.exec_statement_kind(stmt, env, labels))
    }

    fn exec_statement_kind(
        &mut self,
        stmt: &Statement,
        env: &EnvRef,
        labels: &[&str],
    ) -> ExecResult {
        let loc = stmt.location;
        match &stmt.kind {
            StatementKind::Empty
            | StatementKind::Debugger
            | StatementKind::FunctionDeclaration(_) => Ok(Completion::empty()),
            StatementKind::Expression(expr) => {
                let value = js_try!(self, self.eval_expression(expr, env), loc);
                Ok(Completion::Normal(Some(value)))
            }
            StatementKind::Block(list) => self.exec_block(list, env),
            StatementKind::Variable(decl) => self.exec_variable_declaration(decl, env, loc),
            StatementKind::If(s) => {
                let test = js_try!(self, self.eval_expression(&s.test, env), loc);
                let completion = if Self::to_boolean(&test) {
                    self.exec_statement(&s.consequent, env)?
                } else if let Some(alt) = &s.alternate {
                    self.exec_statement(alt, env)?
                } else {
                    Completion::empty()
                };
                Ok(completion.update_empty(Some(JsValue::Undefined)))
            }
            StatementKind::While(s) => Ok(exit_breakable(self.exec_while(s, env, labels, loc)?)),
            StatementKind::DoWhile(s) => {
                Ok(exit_breakable(self.exec_do_while(s, env, labels, loc)?))
            }
            StatementKind::For(s) => Ok(exit_breakable(self.exec_for(s, env, labels, loc)?)),
            StatementKind::ForIn(s) => Ok(exit_breakable(self.exec_for_in(s, env, labels, loc)?)),
            StatementKind::ForOf(s) => Ok(exit_breakable(self.exec_for_of(s, env, labels, loc)?)),
            StatementKind::Return(arg) => {
                let value = match arg {
                    Some(expr) => js_try!(self, self.eval_expression(expr, env), loc),
                    None => JsValue::Undefined,
                };
                Ok(Completion::Return(value, loc))
            }
            StatementKind::Break(label) => Ok(Completion::Break(label.clone(), None, loc)),
            StatementKind::Continue(label) => Ok(Completion::Continue(label.clone(), None, loc)),
            StatementKind::Throw(expr) => {
                let value = js_try!(self, self.eval_expression(expr, env), loc);
                Ok(Completion::Throw(value, loc))
            }
            StatementKind::Try(t) => self.exec_try(t, env),
            StatementKind::Switch(s) => Ok(exit_breakable(self.exec_switch(s, env, loc)?)),
            StatementKind::Labeled(label, body) => {
                let mut label_set = labels.to_vec();
                label_set.push(label.as_str());
                match self.exec_labelled(body, env, &label_set)? {
                    Completion::Break(Some(target), value, _) if target == *label => {
                        Ok(Completion::Normal(value))
                    }
                    other => Ok(other),
                }
            }
            StatementKind::With(object, body) => self.exec_with(object, body, env, loc),
            StatementKind::ClassDeclaration(_) => {
                let e = EngineError::Unsupported("class declaration");
                tracing::warn!(error = %e, line = loc.line, "fatal engine error");
                Err(e)
            }
        }
    }

    /// Block evaluation: a fresh declarative scope only when the block
    /// declares lexical names or functions.
    pub(crate) fn exec_block(&mut self, list: &StatementList, env: &EnvRef) -> ExecResult {
        let decls = list.declarations();
        if !decls.has_lexical() {
            return self.exec_statements(&list.body, env);
        }
        let block_env = Environment::declarative(env);
        if let Err(e) = self.block_declaration_instantiation(decls, &block_env) {
            return self.throw_completion(e, first_location(list));
        }
        let result = self.exec_statements(&list.body, &block_env);
        tracing::trace!("pop declarative scope");
        result
    }

    /// BlockDeclarationInstantiation (§14.2.3). Block-level functions are
    /// lexical to the block.
    fn block_declaration_instantiation(&mut self, decls: &Declarations, env: &EnvRef) -> JsResult<()> {
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
            env.create_mutable_binding(self, name.clone(), false)?;
            env.initialize_binding(self, &name, closure)?;
        }
        Ok(())
    }

    /// GlobalDeclarationInstantiation (§16.1.7).
    fn global_declaration_instantiation(&mut self, decls: &Declarations, env: &EnvRef) -> JsResult<()> {
        let Some(global) = env.global_record() else {
            return Err(EngineError::Invariant("script environment is not global").into());
        };
        tracing::debug!(
            vars = decls.var_names.len(),
            lexical = decls.lexical.len(),
            functions = decls.functions.len(),
            "global declaration instantiation"
        );

        for lexical in &decls.lexical {
            let name = &lexical.name;
            let clashes_in_script = decls.var_names.contains(name)
                || decls.function_names().any(|f| f == name);
            if clashes_in_script
                || global.has_var_declaration(name)
                || global.has_lexical_declaration(name)
                || global.has_restricted_global_property(self, name)?
            {
                return self.throw_error(
                    ErrorKind::Redeclaration,
                    format!("Identifier '{name}' has already been declared"),
                );
            }
        }
        for name in decls.var_names.iter().chain(decls.function_names()) {
            if global.has_lexical_declaration(name) {
                return self.throw_error(
                    ErrorKind::Redeclaration,
                    format!("Identifier '{name}' has already been declared"),
                );
            }
        }
        for name in decls.function_names() {
            if !global.can_declare_global_function(self, name)? {
                return self.throw_error(
                    ErrorKind::Type,
                    format!("Cannot declare global function '{name}'"),
                );
            }
        }
        let declared_vars: Vec<&Rc<str>> = decls
            .var_names
            .iter()
            .filter(|v| !decls.function_names().any(|f| f == *v))
            .collect();
        for name in &declared_vars {
            if !global.can_declare_global_var(self, name)? {
                return self.throw_error(
                    ErrorKind::Type,
                    format!("Cannot declare global variable '{name}'"),
                );
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
            global.create_global_function_binding(self, name, closure, false)?;
        }
        for name in declared_vars {
            global.create_global_var_binding(self, name.clone(), false)?;
        }
        Ok(())
    }

    fn exec_variable_declaration(
        &mut self,
        decl: &VariableDeclaration,
        env: &EnvRef,
        loc: Location,
    ) -> ExecResult {
        for d in &decl.declarations {
            match decl.kind {
                VarKind::Var => {
                    let Some(init) = &d.init else {
                        continue;
                    };
                    let reference = js_try!(self, self.resolve_binding(&d.name, env), loc);
                    let value = js_try!(self, self.eval_named(init, env, &d.name), loc);
                    js_try!(self, self.put_value(&reference, value), loc);
                }
                VarKind::Let | VarKind::Const => {
                    let value = match &d.init {
                        Some(init) => js_try!(self, self.eval_named(init, env, &d.name), loc),
                        None => JsValue::Undefined,
                    };
                    js_try!(self, env.initialize_binding(self, &d.name, value), loc);
                }
            }
        }
        Ok(Completion::empty())
    }

    fn exec_while(
        &mut self,
        s: &WhileStatement,
        env: &EnvRef,
        labels: &[&str],
        loc: Location,
    ) -> ExecResult {
        let mut v = JsValue::Undefined;
        loop {
            let test = js_try!(self, self.eval_expression(&s.test, env), loc);
            if !Self::to_boolean(&test) {
                return Ok(Completion::Normal(Some(v)));
            }
            let completion = self.exec_statement(&s.body, env)?;
            if !loop_continues(&completion, labels) {
                return Ok(completion.update_empty(Some(v)));
            }
            if let Some(value) = completion.value() {
                v = value.clone();
            }
        }
    }

    fn exec_do_while(
        &mut self,
        s: &DoWhileStatement,
        env: &EnvRef,
        labels: &[&str],
        loc: Location,
    ) -> ExecResult {
        let mut v = JsValue::Undefined;
        loop {
            let completion = self.exec_statement(&s.body, env)?;
            if !loop_continues(&completion, labels) {
                return Ok(completion.update_empty(Some(v)));
            }
            if let Some(value) = completion.value() {
                v = value.clone();
            }
            let test = js_try!(self, self.eval_expression(&s.test, env), loc);
            if !Self::to_boolean(&test) {
                return Ok(Completion::Normal(Some(v)));
            }
        }
    }

    fn exec_for(
        &mut self,
        s: &ForStatement,
        env: &EnvRef,
        labels: &[&str],
        loc: Location,
    ) -> ExecResult {
        match &s.init {
            Some(ForInit::Variable(decl)) if decl.kind != VarKind::Var => {
                let loop_env = Environment::declarative(env);
                let is_const = decl.kind == VarKind::Const;
                for d in &decl.declarations {
                    let created = if is_const {
                        loop_env.create_immutable_binding(self, d.name.clone(), true)
                    } else {
                        loop_env.create_mutable_binding(self, d.name.clone(), false)
                    };
                    js_try!(self, created, loc);
                }
                let init = self.exec_variable_declaration(decl, &loop_env, loc)?;
                if init.is_abrupt() {
                    return Ok(init);
                }
                let per_iteration: Vec<Rc<str>> = if is_const {
                    Vec::new()
                } else {
                    decl.declarations.iter().map(|d| d.name.clone()).collect()
                };
                self.for_body(s, &loop_env, &per_iteration, labels, loc)
            }
            Some(ForInit::Variable(decl)) => {
                let init = self.exec_variable_declaration(decl, env, loc)?;
                if init.is_abrupt() {
                    return Ok(init);
                }
                self.for_body(s, env, &[], labels, loc)
            }
            Some(ForInit::Expression(expr)) => {
                js_try!(self, self.eval_expression(expr, env), loc);
                self.for_body(s, env, &[], labels, loc)
            }
            None => self.for_body(s, env, &[], labels, loc),
        }
    }

    /// ForBodyEvaluation (§14.7.4.3).
    fn for_body(
        &mut self,
        s: &ForStatement,
        env: &EnvRef,
        per_iteration: &[Rc<str>],
        labels: &[&str],
        loc: Location,
    ) -> ExecResult {
        let mut v = JsValue::Undefined;
        let mut iteration_env = js_try!(
            self,
            self.create_per_iteration_environment(env, per_iteration),
            loc
        );
        loop {
            if let Some(test) = &s.test {
                let test = js_try!(self, self.eval_expression(test, &iteration_env), loc);
                if !Self::to_boolean(&test) {
                    return Ok(Completion::Normal(Some(v)));
                }
            }
            let completion = self.exec_statement(&s.body, &iteration_env)?;
            if !loop_continues(&completion, labels) {
                return Ok(completion.update_empty(Some(v)));
            }
            if let Some(value) = completion.value() {
                v = value.clone();
            }
            iteration_env = js_try!(
                self,
                self.create_per_iteration_environment(&iteration_env, per_iteration),
                loc
            );
            if let Some(update) = &s.update {
                js_try!(self, self.eval_expression(update, &iteration_env), loc);
            }
        }
    }

    /// CreatePerIterationEnvironment (§14.7.4.4): copies the loop's `let`
    /// bindings into a fresh scope so closures capture one iteration each.
    fn create_per_iteration_environment(
        &mut self,
        last: &EnvRef,
        names: &[Rc<str>],
    ) -> JsResult<EnvRef> {
        if names.is_empty() {
            return Ok(last.clone());
        }
        let outer = last
            .outer()
            .cloned()
            .ok_or(EngineError::Invariant("iteration scope without an outer scope"))?;
        let this_iteration = Environment::declarative(&outer);
        for name in names {
            this_iteration.create_mutable_binding(self, name.clone(), false)?;
            let value = last.get_binding_value(self, name, true)?;
            this_iteration.initialize_binding(self, name, value)?;
        }
        Ok(this_iteration)
    }

    /// ForIn/OfHeadEvaluation (§14.7.5.6): a lexical loop variable is in its
    /// TDZ while the right-hand side runs.
    fn for_in_of_head(&mut self, left: &ForInOfLeft, right: &Expression, env: &EnvRef) -> JsResult<JsValue> {
        match left {
            ForInOfLeft::Variable(VarKind::Let | VarKind::Const, name) => {
                let tdz_env = Environment::declarative(env);
                tdz_env.create_mutable_binding(self, name.clone(), false)?;
                self.eval_expression(right, &tdz_env)
            }
            _ => self.eval_expression(right, env),
        }
    }

    fn for_in_of_iteration(
        &mut self,
        left: &ForInOfLeft,
        value: JsValue,
        body: &Statement,
        env: &EnvRef,
        loc: Location,
    ) -> ExecResult {
        let iteration_env = match left {
            ForInOfLeft::Target(target) => {
                let reference = js_try!(self, self.eval_reference(target, env), loc);
                js_try!(self, self.put_value(&reference, value), loc);
                env.clone()
            }
            ForInOfLeft::Variable(VarKind::Var, name) => {
                let reference = js_try!(self, self.resolve_binding(name, env), loc);
                js_try!(self, self.put_value(&reference, value), loc);
                env.clone()
            }
            ForInOfLeft::Variable(kind, name) => {
                let iteration_env = Environment::declarative(env);
                let created = if *kind == VarKind::Const {
                    iteration_env.create_immutable_binding(self, name.clone(), true)
                } else {
                    iteration_env.create_mutable_binding(self, name.clone(), false)
                };
                js_try!(self, created, loc);
                js_try!(self, iteration_env.initialize_binding(self, name, value), loc);
                iteration_env
            }
        };
        self.exec_statement(body, &iteration_env)
    }

    fn exec_for_in(
        &mut self,
        s: &ForInStatement,
        env: &EnvRef,
        labels: &[&str],
        loc: Location,
    ) -> ExecResult {
        let value = js_try!(self, self.for_in_of_head(&s.left, &s.right, env), loc);
        if value.is_nullish() {
            return Ok(Completion::Break(None, None, loc));
        }
        let object = js_try!(self, self.to_object(&value), loc);
        let mut keys = ForInIterator::new(object);
        let mut v = JsValue::Undefined;
        loop {
            let Some(key) = js_try!(self, keys.next_key(self), loc) else {
                return Ok(Completion::Normal(Some(v)));
            };
            let completion =
                self.for_in_of_iteration(&s.left, JsValue::String(key), &s.body, env, loc)?;
            if !loop_continues(&completion, labels) {
                return Ok(completion.update_empty(Some(v)));
            }
            if let Some(value) = completion.value() {
                v = value.clone();
            }
        }
    }

    fn exec_for_of(
        &mut self,
        s: &ForOfStatement,
        env: &EnvRef,
        labels: &[&str],
        loc: Location,
    ) -> ExecResult {
        let value = js_try!(self, self.for_in_of_head(&s.left, &s.right, env), loc);
        let iterator = js_try!(self, self.get_iterator(&value), loc);
        let mut v = JsValue::Undefined;
        loop {
            let Some(next) = js_try!(self, self.iterator_step(&iterator), loc) else {
                return Ok(Completion::Normal(Some(v)));
            };
            let completion = self.for_in_of_iteration(&s.left, next, &s.body, env, loc)?;
            if !loop_continues(&completion, labels) {
                let status = completion.update_empty(Some(v));
                return self.iterator_close(&iterator, status, loc);
            }
            if let Some(value) = completion.value() {
                v = value.clone();
            }
        }
    }

    /// GetIterator (§7.4.2), sync flavour.
    fn get_iterator(&mut self, value: &JsValue) -> JsResult<IteratorRecord> {
        let key = PropertyKey::Symbol(WellKnownSymbol::Iterator.symbol());
        let Some(method) = self.get_method(value, &key)? else {
            return self.throw_error(ErrorKind::Type, format!("{value} is not iterable"));
        };
        let iterator = self.call(&method, value, &[])?;
        if !iterator.is_object() {
            return self.throw_error(
                ErrorKind::Type,
                "Result of the Symbol.iterator method is not an object",
            );
        }
        let next_method = self.get_v(&iterator, &PropertyKey::from("next"))?;
        Ok(IteratorRecord {
            iterator,
            next_method,
        })
    }

    /// IteratorStepValue: `None` once the iterator reports `done`.
    fn iterator_step(&mut self, record: &IteratorRecord) -> JsResult<Option<JsValue>> {
        let result = self.call(&record.next_method, &record.iterator, &[])?;
        let JsValue::Object(result_obj) = &result else {
            return self.throw_error(
                ErrorKind::Type,
                format!("Iterator result {result} is not an object"),
            );
        };
        let done = self.get(result_obj, &PropertyKey::from("done"), &result)?;
        if Self::to_boolean(&done) {
            return Ok(None);
        }
        Ok(Some(self.get(result_obj, &PropertyKey::from("value"), &result)?))
    }

    /// IteratorClose (§7.4.11). A throw completion wins over anything the
    /// `return` method does, short of a fatal engine error.
    fn iterator_close(
        &mut self,
        record: &IteratorRecord,
        completion: Completion,
        loc: Location,
    ) -> ExecResult {
        let inner = match self.get_method(&record.iterator, &PropertyKey::from("return")) {
            Ok(Some(method)) => self.call(&method, &record.iterator, &[]),
            Ok(None) => return Ok(completion),
            Err(e) => Err(e),
        };
        if matches!(completion, Completion::Throw(..)) {
            if let Err(JsError::Engine(e)) = inner {
                return Err(e);
            }
            self.throw_location = None;
            return Ok(completion);
        }
        match inner {
            Err(e) => self.throw_completion(e, loc),
            Ok(result) if !result.is_object() => {
                self.throw_new_error(ErrorKind::Type, "Iterator result is not an object", loc)
            }
            Ok(_) => Ok(completion),
        }
    }

    fn exec_try(&mut self, t: &TryStatement, env: &EnvRef) -> ExecResult {
        let block = self.exec_block(&t.block, env)?;
        let mut result = match (block, &t.handler) {
            (Completion::Throw(value, _), Some(handler)) => self.exec_catch(handler, value, env)?,
            (other, _) => other,
        };
        if let Some(finalizer) = &t.finalizer {
            let finally = self.exec_block(finalizer, env)?;
            if finally.is_abrupt() {
                result = finally;
            }
        }
        Ok(result.update_empty(Some(JsValue::Undefined)))
    }

    fn exec_catch(&mut self, handler: &CatchClause, thrown: JsValue, env: &EnvRef) -> ExecResult {
        let Some(param) = &handler.param else {
            return self.exec_block(&handler.body, env);
        };
        let loc = first_location(&handler.body);
        let catch_env = Environment::declarative(env);
        js_try!(self, catch_env.create_mutable_binding(self, param.clone(), false), loc);
        js_try!(self, catch_env.initialize_binding(self, param, thrown), loc);
        self.exec_block(&handler.body, &catch_env)
    }

    /// Tests run top to bottom, skipping `default`; execution falls through
    /// from the first match, or from the default clause when nothing matched.
    fn exec_switch(&mut self, s: &SwitchStatement, env: &EnvRef, loc: Location) -> ExecResult {
        let input = js_try!(self, self.eval_expression(&s.discriminant, env), loc);
        let mut start = None;
        for (i, case) in s.cases.iter().enumerate() {
            let Some(test) = &case.test else {
                continue;
            };
            let value = js_try!(self, self.eval_expression(test, env), loc);
            if is_strictly_equal(&input, &value) {
                start = Some(i);
                break;
            }
        }
        let Some(start) = start.or_else(|| s.cases.iter().position(|c| c.test.is_none())) else {
            return Ok(Completion::Normal(Some(JsValue::Undefined)));
        };

        let mut v = JsValue::Undefined;
        for case in &s.cases[start..] {
            let completion = self.exec_block(&case.consequent, env)?;
            if let Some(value) = completion.value() {
                v = value.clone();
            }
            if completion.is_abrupt() {
                return Ok(completion.update_empty(Some(v)));
            }
        }
        Ok(Completion::Normal(Some(v)))
    }

    fn exec_with(
        &mut self,
        object: &Expression,
        body: &Statement,
        env: &EnvRef,
        loc: Location,
    ) -> ExecResult {
        if env.is_strict() {
            return self.throw_new_error(
                ErrorKind::Syntax,
                "Strict mode code may not include a with statement",
                loc,
            );
        }
        let value = js_try!(self, self.eval_expression(object, env), loc);
        let object = js_try!(self, self.to_object(&value), loc);
        let with_env = Environment::object(object, true, env);
        let completion = self.exec_statement(body, &with_env)?;
        Ok(completion.update_empty(Some(JsValue::Undefined)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::interpreter::PropertyDescriptor;

    fn run(body: Vec<Statement>) -> JsResult<JsValue> {
        Interpreter::new().run(&Program::new(body))
    }

    fn append(name: &str, s: &str) -> Statement {
        expr(compound(AssignOp::AddAssign, ident(name), string(s)))
    }

    #[test]
    fn switch_falls_through_default() {
        let result = run(vec![
            var("log", Some(string(""))),
            switch(
                num(1.0),
                vec![
                    case(Some(num(1.0)), vec![append("log", "A")]),
                    case(Some(num(2.0)), vec![append("log", "B")]),
                    case(None, vec![append("log", "C")]),
                ],
            ),
            expr(ident("log")),
        ])
        .unwrap();
        assert_eq!(result.to_string(), "ABC");
    }

    #[test]
    fn switch_default_in_middle_runs_from_its_position() {
        let result = run(vec![
            var("log", Some(string(""))),
            switch(
                num(9.0),
                vec![
                    case(Some(num(1.0)), vec![append("log", "A")]),
                    case(None, vec![append("log", "D")]),
                    case(Some(num(2.0)), vec![append("log", "B"), break_(None)]),
                    case(Some(num(3.0)), vec![append("log", "C")]),
                ],
            ),
            expr(ident("log")),
        ])
        .unwrap();
        assert_eq!(result.to_string(), "DB");
    }

    #[test]
    fn switch_clause_lexicals_are_private() {
        let result = run(vec![
            let_("x", Some(string("outer"))),
            switch(
                num(1.0),
                vec![
                    case(Some(num(1.0)), vec![let_("x", Some(string("inner")))]),
                    case(Some(num(2.0)), vec![]),
                ],
            ),
            expr(ident("x")),
        ])
        .unwrap();
        assert_eq!(result.to_string(), "outer");
    }

    #[test]
    fn abrupt_completions_record_their_statement() {
        let mut interp = Interpreter::new();
        let env = interp.global_env();
        let brk = Statement::at(StatementKind::Break(Some("L".into())), 2, 7);
        let completion = interp.exec_statement(&brk, &env).unwrap();
        assert!(matches!(completion, Completion::Break(Some(ref l), None, _) if l == "L"));
        assert_eq!(completion.location(), Some(Location::new(2, 7)));

        let cont = Statement::at(StatementKind::Continue(None), 5, 3);
        let completion = interp.exec_statement(&cont, &env).unwrap();
        assert_eq!(completion.location(), Some(Location::new(5, 3)));

        let ret = Statement::at(StatementKind::Return(Some(num(1.0))), 8, 1);
        let completion = interp.exec_statement(&ret, &env).unwrap();
        assert!(matches!(completion, Completion::Return(ref v, _) if v.as_number() == Some(1.0)));
        assert_eq!(completion.location(), Some(Location::new(8, 1)));
    }

    #[test]
    fn completion_value_is_last_value_producing_statement() {
        let result = run(vec![
            expr(num(1.0)),
            Statement::from(StatementKind::Empty),
            var("x", Some(num(2.0))),
        ])
        .unwrap();
        assert_eq!(result.as_number(), Some(1.0));
        let result = run(vec![expr(num(1.0)), if_(boolean(false), expr(num(2.0)), None)]).unwrap();
        assert!(result.is_undefined());
    }

    #[test]
    fn labelled_continue_targets_outer_loop() {
        // var n = 0; outer: for (var i = 0; i < 3; i++) { for (var j = 0; j < 3; j++) { if (j == 1) continue outer; n++; } }
        let inner = for_(
            for_var("j", num(0.0)),
            Some(binary(BinaryOp::Lt, ident("j"), num(3.0))),
            Some(update(UpdateOp::Increment, false, ident("j"))),
            block(vec![
                if_(
                    binary(BinaryOp::Eq, ident("j"), num(1.0)),
                    continue_(Some("outer")),
                    None,
                ),
                expr(update(UpdateOp::Increment, false, ident("n"))),
            ]),
        );
        let result = run(vec![
            var("n", Some(num(0.0))),
            labeled(
                "outer",
                for_(
                    for_var("i", num(0.0)),
                    Some(binary(BinaryOp::Lt, ident("i"), num(3.0))),
                    Some(update(UpdateOp::Increment, false, ident("i"))),
                    block(vec![inner]),
                ),
            ),
            expr(ident("n")),
        ])
        .unwrap();
        assert_eq!(result.as_number(), Some(3.0));
    }

    #[test]
    fn labelled_break_leaves_block() {
        let result = run(vec![
            var("x", Some(num(0.0))),
            labeled(
                "done",
                block(vec![
                    expr(assign(ident("x"), num(1.0))),
                    break_(Some("done")),
                    expr(assign(ident("x"), num(2.0))),
                ]),
            ),
            expr(ident("x")),
        ])
        .unwrap();
        assert_eq!(result.as_number(), Some(1.0));
    }

    #[test]
    fn for_let_closures_capture_each_iteration() {
        // var fs = {}; for (let i = 0; i < 3; i++) { fs[i] = () => i; } fs[0]() + fs[2]()
        let result = run(vec![
            var("fs", Some(object(vec![]))),
            for_(
                for_let("i", num(0.0)),
                Some(binary(BinaryOp::Lt, ident("i"), num(3.0))),
                Some(update(UpdateOp::Increment, false, ident("i"))),
                block(vec![expr(assign(index(ident("fs"), ident("i")), arrow(&[], ident("i"))))]),
            ),
            expr(binary(
                BinaryOp::Add,
                call(index(ident("fs"), num(0.0)), vec![]),
                call(index(ident("fs"), num(2.0)), vec![]),
            )),
        ])
        .unwrap();
        assert_eq!(result.as_number(), Some(2.0));
    }

    #[test]
    fn try_finally_overrides_only_when_abrupt() {
        let result = run(vec![
            function_decl(
                "f",
                &[],
                vec![try_(vec![ret(Some(num(1.0)))], None, Some(vec![expr(num(2.0))]))],
            ),
            function_decl(
                "g",
                &[],
                vec![try_(vec![ret(Some(num(1.0)))], None, Some(vec![ret(Some(num(2.0)))]))],
            ),
            expr(binary(
                BinaryOp::Add,
                binary(BinaryOp::Mul, call(ident("f"), vec![]), num(10.0)),
                call(ident("g"), vec![]),
            )),
        ])
        .unwrap();
        assert_eq!(result.as_number(), Some(12.0));
    }

    #[test]
    fn catch_binds_thrown_value() {
        let result = run(vec![try_(
            vec![throw(num(7.0))],
            Some((Some("e"), vec![expr(binary(BinaryOp::Mul, ident("e"), num(2.0)))])),
            None,
        )])
        .unwrap();
        assert_eq!(result.as_number(), Some(14.0));
    }

    #[test]
    fn uncaught_throw_reports_statement_location() {
        let err = run(vec![
            expr(num(1.0)),
            Statement::at(StatementKind::Throw(string("boom")), 3, 5),
        ])
        .unwrap_err();
        match err {
            JsError::Uncaught { value, location } => {
                assert_eq!(value.to_string(), "boom");
                assert_eq!(location, Location::new(3, 5));
            }
            other => panic!("expected uncaught throw, got {other:?}"),
        }
    }

    #[test]
    fn throw_inside_call_keeps_inner_location() {
        let err = run(vec![
            function_decl(
                "f",
                &[],
                vec![Statement::at(StatementKind::Throw(num(1.0)), 7, 3)],
            ),
            Statement::at(StatementKind::Expression(call(ident("f"), vec![])), 9, 1),
        ])
        .unwrap_err();
        assert!(matches!(err, JsError::Uncaught { location, .. } if location == Location::new(7, 3)));
    }

    #[test]
    fn for_in_visits_enumerable_keys_in_order() {
        let result = run(vec![
            var("out", Some(string(""))),
            var("o", Some(object(vec![("b", num(1.0)), ("a", num(2.0)), ("1", num(3.0))]))),
            for_in(
                VarKind::Var,
                "k",
                ident("o"),
                expr(compound(AssignOp::AddAssign, ident("out"), ident("k"))),
            ),
            expr(ident("out")),
        ])
        .unwrap();
        assert_eq!(result.to_string(), "1ba");
    }

    #[test]
    fn for_in_over_null_does_nothing() {
        let result = run(vec![
            expr(num(5.0)),
            for_in(VarKind::Let, "k", null(), expr(num(1.0))),
        ])
        .unwrap();
        assert!(result.is_undefined());
    }

    #[test]
    fn class_declarations_are_unsupported() {
        let err = run(vec![class_decl("C")]).unwrap_err();
        assert!(matches!(
            err,
            JsError::Engine(EngineError::Unsupported("class declaration"))
        ));
    }

    #[test]
    fn with_statement_is_a_syntax_error_in_strict_code() {
        let err = run(vec![use_strict(), with(object(vec![]), expr(num(1.0)))]).unwrap_err();
        assert_eq!(err.error_kind(), Some(ErrorKind::Syntax));
    }

    #[test]
    fn interrupt_aborts_at_next_statement() {
        let mut interp = Interpreter::new();
        let flag = interp.interrupt_handle();
        let stop = interp.create_native_function("stop", 0, move |_, _, _| {
            flag.set(true);
            Ok(JsValue::Undefined)
        });
        interp
            .global_object()
            .borrow_mut()
            .store(PropertyKey::from("stop"), PropertyDescriptor::data_default(stop));
        let err = interp
            .run(&Program::new(vec![
                while_(boolean(true), block(vec![expr(call(ident("stop"), vec![]))])),
            ]))
            .unwrap_err();
        assert!(matches!(err, JsError::Engine(EngineError::Interrupted)));
        assert!(!interp.interrupt_handle().get());
    }
}
