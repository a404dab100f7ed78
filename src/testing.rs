//! AST builders for unit tests.
use crate::ast::{
    AssignStmt, BaseRef, CallArg, CallExpr, ClassDef, Decorated, EllipsisExpr, Expr, FuncDef, IntExpr, Module, NameExpr,
    ListExpr, Param, Span, Stmt, StrExpr, TupleExpr, UnaryExpr, UnboundType,
};
use crate::host::program::Program;
use crate::types::BUILTINS_OBJECT;

pub const FIELD: &str = "graphene.types.field.Field";
pub const ARGUMENT: &str = "graphene.types.argument.Argument";
pub const LIST: &str = "graphene.types.structures.List";
pub const NON_NULL: &str = "graphene.types.structures.NonNull";
pub const SCALAR: &str = "graphene.types.scalars.Scalar";
pub const STRING: &str = "graphene.types.scalars.String";
pub const INT: &str = "graphene.types.scalars.Int";
pub const ENUM: &str = "graphene.types.enum.Enum";
pub const OBJECT_TYPE: &str = "graphene.types.objecttype.ObjectType";
pub const INTERFACE: &str = "graphene.types.interface.Interface";

#[derive(Default)]
pub struct ProgramBuilder {
    modules: Vec<Module>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, name: &str, defs: Vec<Stmt>) -> Self {
        self.modules.push(Module { name: name.into(), path: None, defs });
        self
    }

    /// Program with the prelude where every class is already analyzed.
    pub fn build_ready(self) -> Program {
        let mut program = Program::new(&self.modules, true).unwrap();
        program.settle();
        program
    }
}

fn short(fullname: &str) -> &str {
    fullname.rsplit('.').next().unwrap_or(fullname)
}

// ------------------------------- Classes ---------------------------------- //

/// Nested classes built with an empty fullname get `<fullname>.<name>`.
pub fn class(fullname: &str, bases: Vec<BaseRef>, body: Vec<Stmt>) -> Stmt {
    let body = body
        .into_iter()
        .map(|stmt| match stmt {
            Stmt::Class(mut nested) if nested.fullname.is_empty() => {
                nested.fullname = format!("{fullname}.{}", nested.name);
                Stmt::Class(nested)
            }
            other => other,
        })
        .collect();
    Stmt::Class(ClassDef {
        name: short(fullname).into(),
        fullname: fullname.into(),
        bases,
        body,
        span: Span::default(),
    })
}

pub fn plain_class(fullname: &str, body: Vec<Stmt>) -> Stmt {
    class(fullname, vec![base(BUILTINS_OBJECT)], body)
}

pub fn base(fullname: &str) -> BaseRef {
    generic_base(fullname, Vec::new())
}

pub fn generic_base(fullname: &str, args: Vec<UnboundType>) -> BaseRef {
    BaseRef { fullname: fullname.into(), args }
}

pub fn object_type_base(payload: Option<UnboundType>) -> BaseRef {
    generic_base(OBJECT_TYPE, payload.into_iter().collect())
}

pub fn interface_base(payload: Option<UnboundType>) -> BaseRef {
    generic_base(INTERFACE, payload.into_iter().collect())
}

/// `class Meta: interfaces = <value>`
pub fn meta(interfaces: Expr) -> Stmt {
    Stmt::Class(ClassDef {
        name: "Meta".into(),
        fullname: String::new(),
        bases: vec![base(BUILTINS_OBJECT)],
        body: vec![assign("interfaces", interfaces)],
        span: Span::new(2, 4),
    })
}

// ------------------------------ Statements -------------------------------- //

pub fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::Assign(AssignStmt {
        targets: vec![name_ref(name)],
        value: Some(value),
        annotation: None,
        span: Span::default(),
    })
}

/// `name = Field(type_expr, **keywords)`
pub fn field(name: &str, type_expr: Expr, keywords: Vec<(&str, Expr)>) -> Stmt {
    assign(name, call(FIELD, vec![type_expr], keywords))
}

/// `name = ...`, as found in stubs.
pub fn field_stub(name: &str) -> Stmt {
    assign(name, Expr::Ellipsis(EllipsisExpr { span: Span::default() }))
}

/// `name: annotation`
pub fn attr(name: &str, annotation: UnboundType) -> Stmt {
    Stmt::Assign(AssignStmt {
        targets: vec![name_ref(name)],
        value: None,
        annotation: Some(annotation),
        span: Span::default(),
    })
}

pub fn resolver(name: &str, params: Vec<(&str, Option<UnboundType>)>, returns: Option<UnboundType>) -> Stmt {
    Stmt::Func(func(name, params, returns))
}

pub fn static_method(name: &str, params: Vec<&str>, returns: Option<UnboundType>) -> Stmt {
    decorated("builtins.staticmethod", func(name, params.into_iter().map(|p| (p, None)).collect(), returns))
}

pub fn property(name: &str, returns: Option<UnboundType>) -> Stmt {
    decorated("builtins.property", func(name, vec![("self", None)], returns))
}

fn func(name: &str, params: Vec<(&str, Option<UnboundType>)>, returns: Option<UnboundType>) -> FuncDef {
    FuncDef {
        name: name.into(),
        params: params
            .into_iter()
            .map(|(name, annotation)| Param { name: name.into(), annotation, span: Span::default() })
            .collect(),
        returns,
        span: Span::default(),
    }
}

fn decorated(decorator: &str, func: FuncDef) -> Stmt {
    Stmt::Decorated(Decorated { decorators: vec![name(decorator)], func })
}

// ------------------------------ Expressions ------------------------------- //

/// A reference the host resolved to `fullname`.
pub fn name(fullname: &str) -> Expr {
    Expr::Name(NameExpr { name: short(fullname).into(), fullname: Some(fullname.into()), span: Span::default() })
}

/// A reference the host could not resolve.
pub fn name_ref(name: &str) -> Expr {
    Expr::Name(NameExpr { name: name.into(), fullname: None, span: Span::default() })
}

pub fn call(callee: &str, positional: Vec<Expr>, keywords: Vec<(&str, Expr)>) -> Expr {
    let args = positional
        .into_iter()
        .map(|value| CallArg { name: None, value })
        .chain(keywords.into_iter().map(|(keyword, value)| CallArg { name: Some(keyword.into()), value }))
        .collect();
    Expr::Call(CallExpr { callee: Box::new(name(callee)), args, span: Span::default() })
}

pub fn tuple(items: Vec<Expr>) -> Expr {
    Expr::Tuple(TupleExpr { items, span: Span::default() })
}

pub fn list(items: Vec<Expr>) -> Expr {
    Expr::List(ListExpr { items, span: Span::default() })
}

pub fn unary(op: &str, operand: Expr) -> Expr {
    Expr::Unary(UnaryExpr { op: op.into(), operand: Box::new(operand), span: Span::default() })
}

pub fn str_lit(value: &str) -> Expr {
    Expr::Str(StrExpr { value: value.into(), span: Span::default() })
}

pub fn int_lit(value: i64) -> Expr {
    Expr::Int(IntExpr { value, span: Span::default() })
}

// ------------------------------ Annotations ------------------------------- //

pub fn ann(fullname: &str) -> UnboundType {
    UnboundType { name: short(fullname).into(), fullname: Some(fullname.into()), args: Vec::new() }
}

pub fn optional(inner: UnboundType) -> UnboundType {
    ann("typing.Optional").with_args(vec![inner])
}
