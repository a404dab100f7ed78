//! Typed-AST node model handed to us by the host front-end.
//!
//! This is the subset of a semantically analyzed Python module that the
//! resolver checks need: class definitions with ordered bodies, assignment,
//! call and function-definition shapes, and name references that the host
//! has already bound to fully-qualified symbols. Every node is
//! serde-deserializable so dumps can be fed in as JSON.
use serde::{Deserialize, Serialize};

// ------------------------------- Locations -------------------------------- //

/// Position of a node inside its module (1-based line, 0-based column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

// -------------------------------- Modules --------------------------------- //

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Dotted module name, e.g. `app.schema`.
    pub name: String,
    /// Source path used when reporting; defaults to the module name.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub defs: Vec<Stmt>,
}

impl Module {
    pub fn display_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

// ------------------------------- Statements ------------------------------- //

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Class(ClassDef),
    Assign(AssignStmt),
    Func(FuncDef),
    Decorated(Decorated),
    /// Anything the checks never look at (`pass`, expression statements, ...).
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub fullname: String,
    #[serde(default)]
    pub bases: Vec<BaseRef>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

impl ClassDef {
    /// Nested class named `name` (e.g. `Meta`), first one wins.
    pub fn nested_class(&self, name: &str) -> Option<&ClassDef> {
        self.body.iter().find_map(|stmt| match stmt {
            Stmt::Class(class) if class.name == name => Some(class),
            _ => None,
        })
    }

    /// Function defined directly in the body, unwrapping decorators.
    pub fn method(&self, name: &str) -> Option<&FuncDef> {
        self.body.iter().find_map(|stmt| stmt.as_func().filter(|func| func.name == name))
    }
}

/// A base class as written in the class header, e.g. `ObjectType[User]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseRef {
    pub fullname: String,
    #[serde(default)]
    pub args: Vec<UnboundType>,
}

/// `target = value`, `target: annotation = value` or a bare `target: annotation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignStmt {
    pub targets: Vec<Expr>,
    #[serde(default)]
    pub value: Option<Expr>,
    #[serde(default)]
    pub annotation: Option<UnboundType>,
    #[serde(default)]
    pub span: Span,
}

impl AssignStmt {
    /// The assigned name when there is exactly one plain-name target.
    pub fn single_name_target(&self) -> Option<&NameExpr> {
        match self.targets.as_slice() {
            [Expr::Name(name)] => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub returns: Option<UnboundType>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub annotation: Option<UnboundType>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decorated {
    pub decorators: Vec<Expr>,
    pub func: FuncDef,
}

impl Stmt {
    pub fn as_func(&self) -> Option<&FuncDef> {
        match self {
            Stmt::Func(func) => Some(func),
            Stmt::Decorated(decorated) => Some(&decorated.func),
            _ => None,
        }
    }
}

// ------------------------------ Expressions ------------------------------- //

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Name(NameExpr),
    Member(MemberExpr),
    Call(CallExpr),
    Tuple(TupleExpr),
    List(ListExpr),
    Unary(UnaryExpr),
    Str(StrExpr),
    Int(IntExpr),
    Float(FloatExpr),
    Ellipsis(EllipsisExpr),
    #[serde(other)]
    Other,
}

/// A name the host bound to a symbol. `True`/`False`/`None` arrive as names
/// bound to `builtins.True`/`builtins.False`/`builtins.None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameExpr {
    pub name: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub span: Span,
}

/// `expr.name`, e.g. `graphene.String`; `fullname` is set when the host
/// resolved the whole dotted reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberExpr {
    pub expr: Box<Expr>,
    pub name: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    #[serde(default)]
    pub args: Vec<CallArg>,
    #[serde(default)]
    pub span: Span,
}

/// One call argument; `name` is `None` for positional arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallArg {
    #[serde(default)]
    pub name: Option<String>,
    pub value: Expr,
}

impl CallExpr {
    pub fn callee_fullname(&self) -> Option<&str> {
        self.callee.fullname()
    }

    /// First positional argument.
    pub fn first_positional(&self) -> Option<&Expr> {
        self.args.first().filter(|arg| arg.name.is_none()).map(|arg| &arg.value)
    }

    pub fn keyword(&self, name: &str) -> Option<&Expr> {
        self.args
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
            .map(|arg| &arg.value)
    }

    pub fn keywords(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.args
            .iter()
            .filter_map(|arg| arg.name.as_deref().map(|name| (name, &arg.value)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TupleExpr {
    #[serde(default)]
    pub items: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListExpr {
    #[serde(default)]
    pub items: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
}

/// A prefix operator, e.g. `-1`; `op` is the operator as written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: String,
    pub operand: Box<Expr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrExpr {
    pub value: String,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntExpr {
    pub value: i64,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatExpr {
    pub value: f64,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EllipsisExpr {
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    /// Fully-qualified symbol for name and member references.
    pub fn fullname(&self) -> Option<&str> {
        match self {
            Expr::Name(name) => name.fullname.as_deref(),
            Expr::Member(member) => member.fullname.as_deref(),
            _ => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Name(name) => name.span,
            Expr::Member(member) => member.span,
            Expr::Call(call) => call.span,
            Expr::Tuple(tuple) => tuple.span,
            Expr::List(list) => list.span,
            Expr::Unary(unary) => unary.span,
            Expr::Str(lit) => lit.span,
            Expr::Int(lit) => lit.span,
            Expr::Float(lit) => lit.span,
            Expr::Ellipsis(lit) => lit.span,
            Expr::Other => Span::default(),
        }
    }

    /// Name as written in source, used in messages.
    pub fn display_name(&self) -> String {
        match self {
            Expr::Name(name) => name.name.clone(),
            Expr::Member(member) => format!("{}.{}", member.expr.display_name(), member.name),
            Expr::Call(call) => format!("{}(...)", call.callee.display_name()),
            Expr::Tuple(_) => "tuple".to_string(),
            Expr::List(_) => "list".to_string(),
            Expr::Unary(unary) => format!("{}{}", unary.op, unary.operand.display_name()),
            Expr::Str(lit) => format!("{:?}", lit.value),
            Expr::Int(lit) => lit.value.to_string(),
            Expr::Float(lit) => lit.value.to_string(),
            Expr::Ellipsis(_) => "...".to_string(),
            Expr::Other => "<expression>".to_string(),
        }
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn is_named_constant(&self, constant: &str) -> bool {
        self.fullname() == Some(constant)
    }
}

pub const BUILTINS_TRUE: &str = "builtins.True";
pub const BUILTINS_FALSE: &str = "builtins.False";
pub const BUILTINS_NONE: &str = "builtins.None";

// ---------------------------- Type annotations ---------------------------- //

/// A type annotation before the host resolved it, e.g. `Optional[List[int]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnboundType {
    pub name: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub args: Vec<UnboundType>,
}

impl UnboundType {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), fullname: None, args: Vec::new() }
    }

    pub fn with_args(mut self, args: Vec<UnboundType>) -> Self {
        self.args = args;
        self
    }
}
