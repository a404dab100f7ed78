//! Object/interface models and the per-run model cache.
use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{Expr, Stmt};
use crate::diagnostics::{Code, Location};
use crate::extract::{self, FieldDescriptor, ResolverDescriptor};
use crate::host::ClassSymbol;
use crate::inference::TypeResolver;
use crate::types::RuntimeType;

const META_CLASS: &str = "Meta";
const META_INTERFACES: &str = "interfaces";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Object,
    Interface,
}

/// Everything the cross-checker needs to know about one schema class.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaModel {
    pub kind: ModelKind,
    pub name: String,
    pub fullname: String,
    /// Own fields plus fields of declared interfaces; own fields win.
    pub fields: IndexMap<String, FieldDescriptor>,
    pub resolvers: IndexMap<String, ResolverDescriptor>,
    /// The declared payload type parameter.
    pub payload: RuntimeType,
    pub location: Location,
}

impl SchemaModel {
    pub fn is_interface(&self) -> bool {
        self.kind == ModelKind::Interface
    }
}

/// Build the model for `class`, or `None` when it is neither an object type
/// nor an interface. Problems with `Meta.interfaces` are reported through the
/// context and the model is built from whatever could be read.
pub fn build(types: &mut TypeResolver<'_, '_>, class: &ClassSymbol) -> Option<SchemaModel> {
    let symbols = &types.config.symbols;
    let kind = if class.is_a(&symbols.interface) {
        ModelKind::Interface
    } else if class.is_a(&symbols.object_type) {
        ModelKind::Object
    } else {
        return None;
    };

    // Only object types implement interfaces.
    let mut fields = IndexMap::new();
    if kind == ModelKind::Object {
        for interface in declared_interfaces(types, class) {
            for field in extract::fields_from(types, interface, &interface.defn.body) {
                fields.insert(field.name.clone(), field);
            }
        }
    }
    for field in extract::fields_from(types, class, &class.defn.body) {
        fields.insert(field.name.clone(), field);
    }

    let resolvers = extract::resolvers_from(types, class, &class.defn.body)
        .into_iter()
        .map(|resolver| (resolver.field_name.clone(), resolver))
        .collect();

    Some(SchemaModel {
        kind,
        name: class.defn.name.clone(),
        fullname: class.fullname.clone(),
        fields,
        resolvers,
        payload: types.payload_type(class),
        location: class.location(class.defn.span),
    })
}

/// Interfaces listed in `class Meta: interfaces = (...)`, in listed order.
fn declared_interfaces<'a>(types: &mut TypeResolver<'_, 'a>, class: &ClassSymbol) -> Vec<&'a ClassSymbol> {
    let Some(meta) = class.defn.nested_class(META_CLASS) else {
        return Vec::new();
    };
    let Some(assign) = meta.body.iter().find_map(|stmt| match stmt {
        Stmt::Assign(assign) if assign.single_name_target().is_some_and(|t| t.name == META_INTERFACES) => {
            Some(assign)
        }
        _ => None,
    }) else {
        return Vec::new();
    };
    let Some(value) = &assign.value else {
        return Vec::new();
    };
    let Expr::Tuple(tuple) = value else {
        let span = if value.span() == Default::default() { assign.span } else { value.span() };
        types.ctx.fail(
            class.location(span),
            Code::InvalidInterfaces,
            "\"interfaces\" attribute in Meta class must be a tuple type",
        );
        return Vec::new();
    };

    let mut interfaces = Vec::new();
    for item in &tuple.items {
        // Unresolved names are the host's to report.
        let Some(fullname) = item.fullname() else { continue };
        let Some(symbol) = types.ctx.class(fullname) else { continue };
        if symbol.is_a(&types.config.symbols.interface) {
            interfaces.push(symbol);
        } else {
            types.ctx.fail(
                class.location(item.span()),
                Code::NotAnInterface,
                format!("\"{}\" in Meta.interfaces is not an Interface", item.display_name()),
            );
        }
    }
    interfaces
}

// --------------------------------- Cache ---------------------------------- //

/// Models by class fullname. Written once per class, on the first complete
/// build, and read-only afterwards.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ModelCache {
    models: IndexMap<String, SchemaModel>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `model` unless its class already has one. Returns whether it was
    /// stored.
    pub fn insert(&mut self, model: SchemaModel) -> bool {
        if self.models.contains_key(&model.fullname) {
            log::debug!("model for {} already cached", model.fullname);
            return false;
        }
        log::debug!(
            "caching model {} ({} fields, {} resolvers)",
            model.fullname,
            model.fields.len(),
            model.resolvers.len()
        );
        self.models.insert(model.fullname.clone(), model);
        true
    }

    pub fn get(&self, fullname: &str) -> Option<&SchemaModel> {
        self.models.get(fullname)
    }

    pub fn contains(&self, fullname: &str) -> bool {
        self.models.contains_key(fullname)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

}
