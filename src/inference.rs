//! Type-expression resolution.
//!
//! Maps a declarative field/argument type expression (`String`,
//! `NonNull(List(User))`, ...) to the runtime type a resolver must produce
//! or receive. Works in two steps:
//!
//! 1. [`TypeResolver::classify`] reads the AST fragment and asks the host
//!    what each referenced declaration is, producing a [`TypeExpression`].
//! 2. [`TypeExpression::lower`] folds the wrapper chain into a
//!    [`RuntimeType`], threading covariance and nullability top-down.
//!
//! Nullability: every level is nullable unless wrapped in `NonNull`; list
//! elements start out nullable again regardless of the list's own
//! nullability. Unknown is never wrapped.
pub mod kwargs;

use crate::ast::{CallExpr, Expr};
use crate::config::CheckerConfig;
use crate::host::{ClassSymbol, SemanticContext};
use crate::types::{BUILTINS_STR, RuntimeType};

const PARSE_VALUE: &str = "parse_value";

// ------------------------------- Algebra ---------------------------------- //

/// What a declarative type expression denotes, before lowering.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpression {
    /// A scalar, carrying the return type of its `parse_value`.
    Scalar(RuntimeType),
    /// An object type or interface, carrying its declared type parameter.
    ObjectTypeRef(RuntimeType),
    /// Enum members serialize as their string value.
    EnumRef,
    ListOf(Box<TypeExpression>),
    NonNullOf(Box<TypeExpression>),
    Unknown,
}

/// Where a type expression is being lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Model lists as read-only `Sequence`s so narrower resolver return types
    /// are accepted.
    pub covariant: bool,
    pub nullable: bool,
}

impl Position {
    pub fn field(nullable: bool) -> Self {
        Self { covariant: true, nullable }
    }

    pub fn argument(nullable: bool) -> Self {
        Self { covariant: false, nullable }
    }
}

impl TypeExpression {
    pub fn lower(&self, position: Position) -> RuntimeType {
        let resolved = match self {
            TypeExpression::Scalar(parsed) | TypeExpression::ObjectTypeRef(parsed) => parsed.clone(),
            TypeExpression::EnumRef => RuntimeType::named(BUILTINS_STR),
            TypeExpression::ListOf(item) => {
                let item = item.lower(Position { nullable: true, ..position });
                if position.covariant {
                    RuntimeType::sequence_of(item)
                } else {
                    RuntimeType::list_of(item)
                }
            }
            TypeExpression::NonNullOf(inner) => {
                return inner.lower(Position { nullable: false, ..position });
            }
            TypeExpression::Unknown => RuntimeType::Unknown,
        };
        if position.nullable { resolved.nullable() } else { resolved }
    }
}

// ------------------------------ Classifier -------------------------------- //

/// Classifies expressions against the host's symbol table. Unresolved
/// symbols request a deferral through the context and classify as unknown.
pub struct TypeResolver<'c, 'a> {
    pub ctx: &'c mut SemanticContext<'a>,
    pub config: &'c CheckerConfig,
}

impl<'c, 'a> TypeResolver<'c, 'a> {
    pub fn new(ctx: &'c mut SemanticContext<'a>, config: &'c CheckerConfig) -> Self {
        Self { ctx, config }
    }

    /// `resolve(expr, covariant, nullable)`.
    pub fn resolve(&mut self, expr: &Expr, position: Position) -> RuntimeType {
        self.classify(expr).lower(position)
    }

    pub fn classify(&mut self, expr: &Expr) -> TypeExpression {
        match expr {
            Expr::Name(_) | Expr::Member(_) => match expr.fullname() {
                Some(fullname) => self.classify_reference(fullname),
                None => TypeExpression::Unknown,
            },
            Expr::Call(call) => self.classify_structure(call),
            // String forward references, lambdas, ...
            _ => TypeExpression::Unknown,
        }
    }

    fn classify_structure(&mut self, call: &CallExpr) -> TypeExpression {
        let config = self.config;
        let symbols = &config.symbols;
        let (Some(callee), Some(inner)) = (call.callee_fullname(), call.first_positional()) else {
            return TypeExpression::Unknown;
        };
        if callee == symbols.list {
            TypeExpression::ListOf(Box::new(self.classify(inner)))
        } else if callee == symbols.non_null {
            TypeExpression::NonNullOf(Box::new(self.classify(inner)))
        } else {
            TypeExpression::Unknown
        }
    }

    fn classify_reference(&mut self, fullname: &str) -> TypeExpression {
        let Some(class) = self.ctx.class(fullname) else {
            return TypeExpression::Unknown;
        };
        let config = self.config;
        let symbols = &config.symbols;
        if class.is_a(&symbols.scalar) {
            TypeExpression::Scalar(self.scalar_runtime_type(class))
        } else if class.is_any_of(&[symbols.object_type.as_str(), symbols.interface.as_str()]) {
            TypeExpression::ObjectTypeRef(self.payload_type(class))
        } else if class.is_a(&symbols.enum_) {
            TypeExpression::EnumRef
        } else {
            TypeExpression::Unknown
        }
    }

    /// Declared return type of the nearest `parse_value` along the MRO.
    fn scalar_runtime_type(&mut self, class: &ClassSymbol) -> RuntimeType {
        for ancestor in &class.mro {
            let Some(symbol) = self.ctx.class(ancestor) else { continue };
            if let Some(parse_value) = symbol.defn.method(PARSE_VALUE) {
                return self.ctx.annotation(parse_value.returns.as_ref(), &symbol.module);
            }
        }
        RuntimeType::Unknown
    }

    /// The type argument given where `class` (or its nearest ancestor that
    /// names the capability) subclasses `ObjectType[...]`/`Interface[...]`.
    /// No argument means unknown, never an error.
    pub fn payload_type(&mut self, class: &ClassSymbol) -> RuntimeType {
        let config = self.config;
        let symbols = &config.symbols;
        for ancestor in &class.mro {
            let symbol = if *ancestor == class.fullname {
                class
            } else {
                match self.ctx.class(ancestor) {
                    Some(symbol) => symbol,
                    None => continue,
                }
            };
            let capability = symbol
                .defn
                .bases
                .iter()
                .find(|base| base.fullname == symbols.object_type || base.fullname == symbols.interface);
            if let Some(base) = capability {
                return self.ctx.annotation(base.args.first(), &symbol.module);
            }
        }
        RuntimeType::Unknown
    }
}
