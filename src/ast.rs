//! Syntax tree consumed by the interpreter.
//!
//! Trees are produced by an external parser (or by the [`build`] helpers).
//! Block-like nodes carry a [`StatementList`] whose declaration analysis is
//! computed on first execution and cached on the node.

use std::cell::OnceCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Clone, Debug)]
pub struct Program {
    pub body: StatementList,
}

impl Program {
    pub fn new(body: Vec<Statement>) -> Self {
        Self {
            body: StatementList::new(body),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: Location,
}

impl Statement {
    pub fn at(kind: StatementKind, line: u32, column: u32) -> Self {
        Self {
            kind,
            location: Location::new(line, column),
        }
    }
}

impl From<StatementKind> for Statement {
    fn from(kind: StatementKind) -> Self {
        Self {
            kind,
            location: Location::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum StatementKind {
    Empty,
    Expression(Expression),
    Block(StatementList),
    Variable(VariableDeclaration),
    If(IfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    Return(Option<Expression>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expression),
    Try(TryStatement),
    Switch(SwitchStatement),
    Labeled(String, Box<Statement>),
    With(Expression, Box<Statement>),
    Debugger,
    FunctionDeclaration(Rc<Function>),
    ClassDeclaration(ClassDecl),
}

/// A statement sequence plus its lazily computed declarations.
#[derive(Clone, Debug, Default)]
pub struct StatementList {
    pub body: Vec<Statement>,
    declarations: OnceCell<Declarations>,
}

impl StatementList {
    pub fn new(body: Vec<Statement>) -> Self {
        Self {
            body,
            declarations: OnceCell::new(),
        }
    }

    /// Declaration analysis, computed on first use.
    pub fn declarations(&self) -> &Declarations {
        self.declarations
            .get_or_init(|| Declarations::analyze(&self.body))
    }

    #[cfg(test)]
    pub(crate) fn is_initialized(&self) -> bool {
        self.declarations.get().is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexicalName {
    pub name: Rc<str>,
    pub is_const: bool,
}

/// Names declared directly by a statement list.
#[derive(Clone, Debug, Default)]
pub struct Declarations {
    /// `var` names anywhere below this list, not crossing function boundaries.
    pub var_names: Vec<Rc<str>>,
    /// `let`/`const`/class names declared at this level.
    pub lexical: Vec<LexicalName>,
    /// Function declarations at this level, last declaration of a name wins.
    pub functions: Vec<Rc<Function>>,
    /// The list starts with a `"use strict"` directive.
    pub strict_directive: bool,
}

impl Declarations {
    fn analyze(body: &[Statement]) -> Self {
        let mut decls = Declarations {
            strict_directive: has_use_strict(body),
            ..Default::default()
        };
        for stmt in body {
            collect_var_names(stmt, &mut decls.var_names);
            decls.collect_top_level(stmt);
        }
        let mut seen = Vec::<Rc<str>>::new();
        decls.functions.reverse();
        decls.functions.retain(|f| {
            let name = f.name.clone().unwrap_or_else(|| Rc::from(""));
            if seen.contains(&name) {
                false
            } else {
                seen.push(name);
                true
            }
        });
        decls.functions.reverse();
        decls
    }

    fn collect_top_level(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::Variable(decl) if decl.kind != VarKind::Var => {
                for d in &decl.declarations {
                    self.lexical.push(LexicalName {
                        name: d.name.clone(),
                        is_const: decl.kind == VarKind::Const,
                    });
                }
            }
            StatementKind::ClassDeclaration(class) => self.lexical.push(LexicalName {
                name: class.name.clone(),
                is_const: false,
            }),
            StatementKind::FunctionDeclaration(f) => self.functions.push(f.clone()),
            StatementKind::Labeled(_, inner) => self.collect_top_level(inner),
            _ => {}
        }
    }

    /// Function names hoisted from this list.
    pub fn function_names(&self) -> impl Iterator<Item = &Rc<str>> {
        self.functions.iter().filter_map(|f| f.name.as_ref())
    }

    pub fn has_lexical(&self) -> bool {
        !self.lexical.is_empty() || !self.functions.is_empty()
    }
}

fn has_use_strict(body: &[Statement]) -> bool {
    for stmt in body {
        match &stmt.kind {
            StatementKind::Expression(Expression::Literal(Literal::String(s))) => {
                if s == "use strict" {
                    return true;
                }
            }
            _ => return false,
        }
    }
    false
}

fn push_unique(out: &mut Vec<Rc<str>>, name: &Rc<str>) {
    if !out.contains(name) {
        out.push(name.clone());
    }
}

fn collect_var_names(stmt: &Statement, out: &mut Vec<Rc<str>>) {
    match &stmt.kind {
        StatementKind::Variable(decl) if decl.kind == VarKind::Var => {
            for d in &decl.declarations {
                push_unique(out, &d.name);
            }
        }
        StatementKind::Block(list) => {
            for s in &list.body {
                collect_var_names(s, out);
            }
        }
        StatementKind::If(s) => {
            collect_var_names(&s.consequent, out);
            if let Some(alt) = &s.alternate {
                collect_var_names(alt, out);
            }
        }
        StatementKind::While(s) => collect_var_names(&s.body, out),
        StatementKind::DoWhile(s) => collect_var_names(&s.body, out),
        StatementKind::For(s) => {
            if let Some(ForInit::Variable(decl)) = &s.init
                && decl.kind == VarKind::Var
            {
                for d in &decl.declarations {
                    push_unique(out, &d.name);
                }
            }
            collect_var_names(&s.body, out);
        }
        StatementKind::ForIn(ForInStatement { left, body, .. })
        | StatementKind::ForOf(ForOfStatement { left, body, .. }) => {
            if let ForInOfLeft::Variable(VarKind::Var, name) = left {
                push_unique(out, name);
            }
            collect_var_names(body, out);
        }
        StatementKind::Try(t) => {
            for s in &t.block.body {
                collect_var_names(s, out);
            }
            if let Some(handler) = &t.handler {
                for s in &handler.body.body {
                    collect_var_names(s, out);
                }
            }
            if let Some(finalizer) = &t.finalizer {
                for s in &finalizer.body {
                    collect_var_names(s, out);
                }
            }
        }
        StatementKind::Switch(s) => {
            for case in &s.cases {
                for st in &case.consequent.body {
                    collect_var_names(st, out);
                }
            }
        }
        StatementKind::Labeled(_, body) | StatementKind::With(_, body) => {
            collect_var_names(body, out)
        }
        _ => {}
    }
}

#[derive(Clone, Debug)]
pub struct VariableDeclaration {
    pub kind: VarKind,
    pub declarations: Vec<VariableDeclarator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Debug)]
pub struct VariableDeclarator {
    pub name: Rc<str>,
    pub init: Option<Expression>,
}

#[derive(Clone, Debug)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
}

#[derive(Clone, Debug)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct DoWhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Clone, Debug)]
pub struct ForInStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct ForOfStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInOfLeft {
    Variable(VarKind, Rc<str>),
    /// An identifier or member expression assigned on each iteration.
    Target(Expression),
}

#[derive(Clone, Debug)]
pub struct TryStatement {
    pub block: StatementList,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<StatementList>,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub param: Option<Rc<str>>,
    pub body: StatementList,
}

#[derive(Clone, Debug)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    /// `None` for the `default` clause.
    pub test: Option<Expression>,
    pub consequent: StatementList,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Arrow,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub body: StatementList,
    pub kind: FunctionKind,
}

impl Function {
    pub fn is_arrow(&self) -> bool {
        self.kind == FunctionKind::Arrow
    }
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub name: Rc<str>,
}

#[derive(Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(Rc<str>),
    This,
    Super,
    Object(Vec<Property>),
    Function(Rc<Function>),
    Unary(UnaryOp, Box<Expression>),
    Typeof(Box<Expression>),
    Void(Box<Expression>),
    Delete(Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Logical(LogicalOp, Box<Expression>, Box<Expression>),
    Update(UpdateOp, bool, Box<Expression>), // op, prefix, argument
    Assign(AssignOp, Box<Expression>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    New(Box<Expression>, Vec<Expression>),
    Member(Box<Expression>, MemberProperty),
    Sequence(Vec<Expression>),
}

impl Expression {
    /// True for function expressions with no binding name of their own.
    pub fn is_anonymous_function_definition(&self) -> bool {
        matches!(self, Expression::Function(f) if f.name.as_ref().is_none_or(|n| n.is_empty()))
    }
}

#[derive(Clone, Debug)]
pub enum MemberProperty {
    Dot(Rc<str>),
    Computed(Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    LShift,
    RShift,
    URShift,
    BitAnd,
    BitOr,
    BitXor,
    In,
    Instanceof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ExpAssign,
    LShiftAssign,
    RShiftAssign,
    URShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LogicalAndAssign,
    LogicalOrAssign,
    NullishAssign,
}

impl AssignOp {
    /// The binary operator a compound assignment applies.
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::AddAssign => BinaryOp::Add,
            AssignOp::SubAssign => BinaryOp::Sub,
            AssignOp::MulAssign => BinaryOp::Mul,
            AssignOp::DivAssign => BinaryOp::Div,
            AssignOp::ModAssign => BinaryOp::Mod,
            AssignOp::ExpAssign => BinaryOp::Exp,
            AssignOp::LShiftAssign => BinaryOp::LShift,
            AssignOp::RShiftAssign => BinaryOp::RShift,
            AssignOp::URShiftAssign => BinaryOp::URShift,
            AssignOp::BitAndAssign => BinaryOp::BitAnd,
            AssignOp::BitOrAssign => BinaryOp::BitOr,
            AssignOp::BitXorAssign => BinaryOp::BitXor,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Property {
    pub key: PropertyName,
    pub value: Expression,
    pub kind: PropertyKind,
}

#[derive(Clone, Debug)]
pub enum PropertyName {
    Identifier(Rc<str>),
    String(String),
    Number(f64),
    Computed(Box<Expression>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

/// Constructors for building trees by hand.
pub mod build {
    use std::rc::Rc;

    use super::*;

    pub fn program(body: Vec<Statement>) -> Program {
        Program::new(body)
    }

    pub fn list(body: Vec<Statement>) -> StatementList {
        StatementList::new(body)
    }

    pub fn ident(name: &str) -> Expression {
        Expression::Identifier(Rc::from(name))
    }

    pub fn num(n: f64) -> Expression {
        Expression::Literal(Literal::Number(n))
    }

    pub fn string(s: &str) -> Expression {
        Expression::Literal(Literal::String(s.to_string()))
    }

    pub fn boolean(b: bool) -> Expression {
        Expression::Literal(Literal::Boolean(b))
    }

    pub fn null() -> Expression {
        Expression::Literal(Literal::Null)
    }

    pub fn this() -> Expression {
        Expression::This
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
        Expression::Binary(op, Box::new(left), Box::new(right))
    }

    pub fn logical(op: LogicalOp, left: Expression, right: Expression) -> Expression {
        Expression::Logical(op, Box::new(left), Box::new(right))
    }

    pub fn unary(op: UnaryOp, arg: Expression) -> Expression {
        Expression::Unary(op, Box::new(arg))
    }

    pub fn typeof_(arg: Expression) -> Expression {
        Expression::Typeof(Box::new(arg))
    }

    pub fn delete(arg: Expression) -> Expression {
        Expression::Delete(Box::new(arg))
    }

    pub fn assign(target: Expression, value: Expression) -> Expression {
        Expression::Assign(AssignOp::Assign, Box::new(target), Box::new(value))
    }

    pub fn compound(op: AssignOp, target: Expression, value: Expression) -> Expression {
        Expression::Assign(op, Box::new(target), Box::new(value))
    }

    pub fn update(op: UpdateOp, prefix: bool, target: Expression) -> Expression {
        Expression::Update(op, prefix, Box::new(target))
    }

    pub fn conditional(test: Expression, then: Expression, otherwise: Expression) -> Expression {
        Expression::Conditional(Box::new(test), Box::new(then), Box::new(otherwise))
    }

    pub fn call(callee: Expression, args: Vec<Expression>) -> Expression {
        Expression::Call(Box::new(callee), args)
    }

    pub fn new_(callee: Expression, args: Vec<Expression>) -> Expression {
        Expression::New(Box::new(callee), args)
    }

    pub fn member(object: Expression, name: &str) -> Expression {
        Expression::Member(Box::new(object), MemberProperty::Dot(Rc::from(name)))
    }

    pub fn index(object: Expression, key: Expression) -> Expression {
        Expression::Member(Box::new(object), MemberProperty::Computed(Box::new(key)))
    }

    pub fn sequence(exprs: Vec<Expression>) -> Expression {
        Expression::Sequence(exprs)
    }

    pub fn object(props: Vec<(&str, Expression)>) -> Expression {
        Expression::Object(
            props
                .into_iter()
                .map(|(key, value)| Property {
                    key: PropertyName::Identifier(Rc::from(key)),
                    value,
                    kind: PropertyKind::Init,
                })
                .collect(),
        )
    }

    pub fn object_with(props: Vec<Property>) -> Expression {
        Expression::Object(props)
    }

    pub fn getter(key: &str, body: Vec<Statement>) -> Property {
        Property {
            key: PropertyName::Identifier(Rc::from(key)),
            value: function_expr(None, &[], body),
            kind: PropertyKind::Get,
        }
    }

    pub fn setter(key: &str, param: &str, body: Vec<Statement>) -> Property {
        Property {
            key: PropertyName::Identifier(Rc::from(key)),
            value: function_expr(None, &[param], body),
            kind: PropertyKind::Set,
        }
    }

    fn function(
        name: Option<&str>,
        params: &[&str],
        body: Vec<Statement>,
        kind: FunctionKind,
    ) -> Rc<Function> {
        Rc::new(Function {
            name: name.map(Rc::from),
            params: params.iter().map(|p| Rc::from(*p)).collect(),
            body: StatementList::new(body),
            kind,
        })
    }

    pub fn function_expr(name: Option<&str>, params: &[&str], body: Vec<Statement>) -> Expression {
        Expression::Function(function(name, params, body, FunctionKind::Normal))
    }

    /// An arrow function; an expression body becomes a `return`.
    pub fn arrow(params: &[&str], body: Expression) -> Expression {
        Expression::Function(function(None, params, vec![ret(Some(body))], FunctionKind::Arrow))
    }

    pub fn function_decl(name: &str, params: &[&str], body: Vec<Statement>) -> Statement {
        StatementKind::FunctionDeclaration(function(Some(name), params, body, FunctionKind::Normal))
            .into()
    }

    pub fn class_decl(name: &str) -> Statement {
        StatementKind::ClassDeclaration(ClassDecl {
            name: Rc::from(name),
        })
        .into()
    }

    pub fn expr(e: Expression) -> Statement {
        StatementKind::Expression(e).into()
    }

    fn declaration(kind: VarKind, name: &str, init: Option<Expression>) -> Statement {
        StatementKind::Variable(VariableDeclaration {
            kind,
            declarations: vec![VariableDeclarator {
                name: Rc::from(name),
                init,
            }],
        })
        .into()
    }

    pub fn var(name: &str, init: Option<Expression>) -> Statement {
        declaration(VarKind::Var, name, init)
    }

    pub fn let_(name: &str, init: Option<Expression>) -> Statement {
        declaration(VarKind::Let, name, init)
    }

    pub fn const_(name: &str, init: Expression) -> Statement {
        declaration(VarKind::Const, name, Some(init))
    }

    pub fn block(body: Vec<Statement>) -> Statement {
        StatementKind::Block(StatementList::new(body)).into()
    }

    pub fn if_(test: Expression, then: Statement, otherwise: Option<Statement>) -> Statement {
        StatementKind::If(IfStatement {
            test,
            consequent: Box::new(then),
            alternate: otherwise.map(Box::new),
        })
        .into()
    }

    pub fn while_(test: Expression, body: Statement) -> Statement {
        StatementKind::While(WhileStatement {
            test,
            body: Box::new(body),
        })
        .into()
    }

    pub fn do_while(body: Statement, test: Expression) -> Statement {
        StatementKind::DoWhile(DoWhileStatement {
            test,
            body: Box::new(body),
        })
        .into()
    }

    pub fn for_(
        init: Option<ForInit>,
        test: Option<Expression>,
        update: Option<Expression>,
        body: Statement,
    ) -> Statement {
        StatementKind::For(ForStatement {
            init,
            test,
            update,
            body: Box::new(body),
        })
        .into()
    }

    pub fn for_let(name: &str, init: Expression) -> Option<ForInit> {
        Some(ForInit::Variable(VariableDeclaration {
            kind: VarKind::Let,
            declarations: vec![VariableDeclarator {
                name: Rc::from(name),
                init: Some(init),
            }],
        }))
    }

    pub fn for_var(name: &str, init: Expression) -> Option<ForInit> {
        Some(ForInit::Variable(VariableDeclaration {
            kind: VarKind::Var,
            declarations: vec![VariableDeclarator {
                name: Rc::from(name),
                init: Some(init),
            }],
        }))
    }

    pub fn for_in(kind: VarKind, name: &str, right: Expression, body: Statement) -> Statement {
        StatementKind::ForIn(ForInStatement {
            left: ForInOfLeft::Variable(kind, Rc::from(name)),
            right,
            body: Box::new(body),
        })
        .into()
    }

    pub fn for_of(kind: VarKind, name: &str, right: Expression, body: Statement) -> Statement {
        StatementKind::ForOf(ForOfStatement {
            left: ForInOfLeft::Variable(kind, Rc::from(name)),
            right,
            body: Box::new(body),
        })
        .into()
    }

    pub fn ret(value: Option<Expression>) -> Statement {
        StatementKind::Return(value).into()
    }

    pub fn break_(label: Option<&str>) -> Statement {
        StatementKind::Break(label.map(str::to_string)).into()
    }

    pub fn continue_(label: Option<&str>) -> Statement {
        StatementKind::Continue(label.map(str::to_string)).into()
    }

    pub fn throw(value: Expression) -> Statement {
        StatementKind::Throw(value).into()
    }

    pub fn try_(
        block: Vec<Statement>,
        handler: Option<(Option<&str>, Vec<Statement>)>,
        finalizer: Option<Vec<Statement>>,
    ) -> Statement {
        StatementKind::Try(TryStatement {
            block: StatementList::new(block),
            handler: handler.map(|(param, body)| CatchClause {
                param: param.map(Rc::from),
                body: StatementList::new(body),
            }),
            finalizer: finalizer.map(StatementList::new),
        })
        .into()
    }

    pub fn case(test: Option<Expression>, body: Vec<Statement>) -> SwitchCase {
        SwitchCase {
            test,
            consequent: StatementList::new(body),
        }
    }

    pub fn switch(discriminant: Expression, cases: Vec<SwitchCase>) -> Statement {
        StatementKind::Switch(SwitchStatement {
            discriminant,
            cases,
        })
        .into()
    }

    pub fn labeled(label: &str, body: Statement) -> Statement {
        StatementKind::Labeled(label.to_string(), Box::new(body)).into()
    }

    pub fn with(object: Expression, body: Statement) -> Statement {
        StatementKind::With(object, Box::new(body)).into()
    }

    pub fn use_strict() -> Statement {
        expr(string("use strict"))
    }
}

#[cfg(test)]
mod tests {
    use super::build::*;
    use super::*;

    #[test]
    fn declarations_are_computed_once_on_demand() {
        let list = list(vec![var("a", None), let_("b", None)]);
        assert!(!list.is_initialized());
        let first = list.declarations() as *const Declarations;
        assert!(list.is_initialized());
        assert_eq!(first, list.declarations() as *const Declarations);
    }

    #[test]
    fn var_names_cross_blocks_but_not_functions() {
        let list = list(vec![
            var("a", None),
            block(vec![var("b", None), let_("c", None)]),
            if_(boolean(true), var("d", None), Some(var("a", None))),
            function_decl("f", &[], vec![var("inner", None)]),
            switch(num(1.0), vec![case(None, vec![var("e", None)])]),
        ]);
        let decls = list.declarations();
        let names: Vec<&str> = decls.var_names.iter().map(|n| &**n).collect();
        assert_eq!(names, ["a", "b", "d", "e"]);
        assert!(decls.lexical.is_empty());
        assert_eq!(decls.function_names().map(|n| &**n).collect::<Vec<_>>(), ["f"]);
    }

    #[test]
    fn lexical_names_record_constness() {
        let list = list(vec![let_("x", None), const_("y", num(1.0)), class_decl("C")]);
        let lexical = &list.declarations().lexical;
        assert_eq!(lexical.len(), 3);
        assert!(!lexical[0].is_const);
        assert!(lexical[1].is_const);
        assert_eq!(&*lexical[2].name, "C");
    }

    #[test]
    fn later_function_declaration_wins() {
        let list = list(vec![
            function_decl("f", &[], vec![ret(Some(num(1.0)))]),
            function_decl("g", &[], vec![]),
            function_decl("f", &[], vec![ret(Some(num(2.0)))]),
        ]);
        let fns = &list.declarations().functions;
        assert_eq!(fns.len(), 2);
        assert_eq!(fns[0].name.as_deref(), Some("g"));
        assert_eq!(fns[1].body.body.len(), 1);
    }

    #[test]
    fn use_strict_directive_must_lead() {
        assert!(list(vec![use_strict(), var("x", None)]).declarations().strict_directive);
        assert!(!list(vec![var("x", None), use_strict()]).declarations().strict_directive);
    }
}
