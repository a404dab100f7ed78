//! Declaration extractors: fields and resolvers out of a class body.
//!
//! Neither walk ever fails. Statements of an unrecognized shape are
//! skipped and types that cannot be derived come out as `Unknown`.
use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{CallExpr, Expr, FuncDef, Param, Stmt};
use crate::diagnostics::Location;
use crate::host::ClassSymbol;
use crate::inference::{Position, TypeResolver, kwargs};
use crate::types::RuntimeType;

// ------------------------------ Descriptors ------------------------------- //

/// A named argument, on either side: declared on a field or accepted by a
/// resolver.
///
/// Two descriptors are the same argument iff their names match. Types are
/// compared separately, after matching.
#[derive(Debug, Clone, Serialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RuntimeType,
    pub location: Location,
}

impl PartialEq for ArgumentDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ArgumentDescriptor {}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// What a resolver must produce, or the payload attribute must have.
    #[serde(rename = "type")]
    pub ty: RuntimeType,
    pub arguments: IndexMap<String, ArgumentDescriptor>,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolverDescriptor {
    /// Method name minus the resolver prefix.
    pub field_name: String,
    pub return_type: RuntimeType,
    /// The parent payload parameter.
    pub previous_argument: ArgumentDescriptor,
    pub keyword_arguments: IndexMap<String, ArgumentDescriptor>,
    pub location: Location,
}

// -------------------------------- Fields ---------------------------------- //

/// Fields declared in `statements`, in declaration order. `owner` is the
/// class the statements belong to; its module scopes annotations and its
/// path anchors locations.
pub fn fields_from(types: &mut TypeResolver<'_, '_>, owner: &ClassSymbol, statements: &[Stmt]) -> Vec<FieldDescriptor> {
    statements
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Assign(assign) => {
                let target = assign.single_name_target()?;
                let call = assign.value.as_ref()?.as_call()?;
                if !is_call_to(types, call, Entry::Field) {
                    return None;
                }
                // `Field()` without a type is not a declaration we can check.
                let type_expr = call.first_positional()?;
                let position = Position::field(!kwargs::forces_non_null(call));
                Some(FieldDescriptor {
                    name: target.name.clone(),
                    ty: types.resolve(type_expr, position),
                    arguments: field_arguments(types, owner, call),
                    location: owner.location(assign.span),
                })
            }
            _ => None,
        })
        .collect()
}

fn field_arguments(
    types: &mut TypeResolver<'_, '_>,
    owner: &ClassSymbol,
    field: &CallExpr,
) -> IndexMap<String, ArgumentDescriptor> {
    let mut arguments = IndexMap::new();
    for (name, value) in field.keywords() {
        if types.config.is_reserved_keyword(name) {
            continue;
        }
        let Some(ty) = argument_type(types, value) else { continue };
        let descriptor = ArgumentDescriptor {
            name: name.to_string(),
            ty,
            location: owner.location(value.span()),
        };
        arguments.insert(descriptor.name.clone(), descriptor);
    }
    arguments
}

/// Type of a keyword value declaring a field argument, or `None` when the
/// value declares nothing:
///
/// - `Argument(T, ...)`: `T`, nullability from the `Argument` call;
/// - `List(T)`/`NonNull(T)`: the whole call, nullability from the call;
/// - `String(required=True)`: the callee, nullability from the call;
/// - `String`: the reference itself.
fn argument_type(types: &mut TypeResolver<'_, '_>, value: &Expr) -> Option<RuntimeType> {
    match value {
        Expr::Call(call) if is_call_to(types, call, Entry::Argument) => {
            let position = Position::argument(!kwargs::forces_non_null(call));
            Some(match call.first_positional() {
                Some(type_expr) => types.resolve(type_expr, position),
                None => RuntimeType::Unknown,
            })
        }
        Expr::Call(call) if is_call_to(types, call, Entry::Structure) => {
            Some(types.resolve(value, Position::argument(!kwargs::forces_non_null(call))))
        }
        Expr::Call(call) if is_call_to(types, call, Entry::Unmounted) => {
            let position = Position::argument(!kwargs::forces_non_null(call));
            Some(types.resolve(&call.callee, position))
        }
        Expr::Name(_) | Expr::Member(_) => {
            let fullname = value.fullname()?;
            let class = types.ctx.class(fullname)?;
            class
                .is_a(&types.config.symbols.unmounted_type)
                .then(|| types.resolve(value, Position::argument(true)))
        }
        _ => None,
    }
}

/// Entry points recognized on the right of `=` or as a keyword value.
#[derive(Clone, Copy)]
enum Entry {
    Field,
    Argument,
    Structure,
    Unmounted,
}

/// Whether `call` constructs `entry` or a subclass of it.
fn is_call_to(types: &mut TypeResolver<'_, '_>, call: &CallExpr, entry: Entry) -> bool {
    let Some(callee) = call.callee_fullname() else { return false };
    let Some(class) = types.ctx.class(callee) else { return false };
    let symbols = &types.config.symbols;
    let base = match entry {
        Entry::Field => &symbols.field,
        Entry::Argument => &symbols.argument,
        Entry::Structure => &symbols.structure,
        Entry::Unmounted => &symbols.unmounted_type,
    };
    class.is_a(base)
}

// ------------------------------- Resolvers -------------------------------- //

/// Resolver methods in `statements`, in declaration order. Decorators are
/// not inspected.
pub fn resolvers_from(
    types: &mut TypeResolver<'_, '_>,
    owner: &ClassSymbol,
    statements: &[Stmt],
) -> Vec<ResolverDescriptor> {
    statements
        .iter()
        .filter_map(Stmt::as_func)
        .filter_map(|func| {
            let field_name = types.config.resolver_field_name(&func.name)?.to_string();
            Some(resolver(types, owner, func, field_name))
        })
        .collect()
}

fn resolver(
    types: &mut TypeResolver<'_, '_>,
    owner: &ClassSymbol,
    func: &FuncDef,
    field_name: String,
) -> ResolverDescriptor {
    let mut params = func.params.iter();
    let previous_argument = match params.next() {
        Some(param) => parameter(types, owner, param),
        None => ArgumentDescriptor {
            name: "self".into(),
            ty: RuntimeType::Unknown,
            location: owner.location(func.span),
        },
    };
    // The execution-context parameter (`info`) carries no obligations.
    params.next();
    let keyword_arguments = params
        .map(|param| {
            let descriptor = parameter(types, owner, param);
            (descriptor.name.clone(), descriptor)
        })
        .collect();
    ResolverDescriptor {
        field_name,
        return_type: types.ctx.annotation(func.returns.as_ref(), &owner.module),
        previous_argument,
        keyword_arguments,
        location: owner.location(func.span),
    }
}

fn parameter(types: &mut TypeResolver<'_, '_>, owner: &ClassSymbol, param: &Param) -> ArgumentDescriptor {
    ArgumentDescriptor {
        name: param.name.clone(),
        ty: types.ctx.annotation(param.annotation.as_ref(), &owner.module),
        location: owner.location(param.span),
    }
}
