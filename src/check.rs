//! Cross-checking a model's fields against its resolvers.
//!
//! Every field and every resolver is visited; a violation stops the checks
//! for that one resolver only, never for the class.
use crate::config::CheckerConfig;
use crate::diagnostics::{Code, Diagnostic};
use crate::extract::{FieldDescriptor, ResolverDescriptor};
use crate::host::CheckerApi;
use crate::model::SchemaModel;

pub fn cross_check(model: &SchemaModel, api: &dyn CheckerApi, config: &CheckerConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for field in model.fields.values() {
        match model.resolvers.get(&field.name) {
            Some(resolver) => check_resolver(model, field, resolver, api, &mut diagnostics),
            // Implementers of an interface bring their own resolvers.
            None if model.is_interface() => {}
            None => check_default_access(model, field, api, &mut diagnostics),
        }
    }

    for resolver in model.resolvers.values() {
        if model.fields.contains_key(&resolver.field_name) {
            continue;
        }
        if model.is_interface() && resolver.field_name == config.polymorphic_resolver {
            continue;
        }
        diagnostics.push(Diagnostic::error(
            resolver.location.clone(),
            Code::UnknownField,
            format!("No field with name \"{}\" defined", resolver.field_name),
        ));
    }

    diagnostics
}

/// No resolver: the library reads the like-named attribute off the payload.
fn check_default_access(
    model: &SchemaModel,
    field: &FieldDescriptor,
    api: &dyn CheckerApi,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match api.attribute_type_of(&model.payload, &field.name) {
        None => diagnostics.push(Diagnostic::error(
            field.location.clone(),
            Code::AttrMissing,
            format!("\"{}\" has no attribute \"{}\"", model.payload, field.name),
        )),
        Some(actual) if !api.is_subtype(&actual, &field.ty) => diagnostics.push(Diagnostic::error(
            field.location.clone(),
            Code::DefaultResolver,
            format!(
                "Field expects type {}, but {}.{} has type {}",
                field.ty, model.payload, field.name, actual
            ),
        )),
        Some(_) => {}
    }
}

fn check_resolver(
    model: &SchemaModel,
    field: &FieldDescriptor,
    resolver: &ResolverDescriptor,
    api: &dyn CheckerApi,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let previous = &resolver.previous_argument;
    if !api.is_equivalent(&previous.ty, &model.payload) {
        diagnostics.push(Diagnostic::error(
            previous.location.clone(),
            Code::PreviousArgument,
            parameter_mismatch(&previous.name, &previous.ty, &model.payload),
        ));
        return;
    }

    if !api.is_subtype(&resolver.return_type, &field.ty) {
        diagnostics.push(Diagnostic::error(
            resolver.location.clone(),
            Code::ReturnType,
            format!("Resolver returns type {}, expected type {}", resolver.return_type, field.ty),
        ));
        return;
    }

    for declared in field.arguments.values() {
        let Some(accepted) = resolver.keyword_arguments.values().find(|accepted| *accepted == declared) else {
            diagnostics.push(Diagnostic::error(
                resolver.location.clone(),
                Code::MissingParameter,
                format!(
                    "Parameter \"{}\" of type {} is missing, but required in resolver definition",
                    declared.name, declared.ty
                ),
            ));
            continue;
        };
        if !api.is_equivalent(&accepted.ty, &declared.ty) {
            diagnostics.push(Diagnostic::error(
                accepted.location.clone(),
                Code::ParameterType,
                parameter_mismatch(&accepted.name, &accepted.ty, &declared.ty),
            ));
        }
    }
}

fn parameter_mismatch(name: &str, actual: &impl std::fmt::Display, expected: &impl std::fmt::Display) -> String {
    format!("Parameter \"{name}\" has type {actual}, expected type {expected}")
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::ast::Span;
    use crate::diagnostics::Location;
    use crate::extract::ArgumentDescriptor;
    use crate::host::TypeOracle;
    use crate::model::ModelKind;
    use crate::types::{BUILTINS_INT, BUILTINS_STR, RuntimeType};

    /// Nominal equality plus `Unknown` and `None`-in-union handling; enough to
    /// exercise the rules without a symbol table.
    struct Flat {
        attributes: Vec<(&'static str, RuntimeType)>,
    }

    impl TypeOracle for Flat {
        fn is_subtype(&self, left: &RuntimeType, right: &RuntimeType) -> bool {
            match (left, right) {
                (RuntimeType::Unknown, _) | (_, RuntimeType::Unknown) => true,
                (RuntimeType::Union(items), _) => items.iter().all(|item| self.is_subtype(item, right)),
                (_, RuntimeType::Union(items)) => items.iter().any(|item| self.is_subtype(left, item)),
                _ => left == right,
            }
        }
    }

    impl CheckerApi for Flat {
        fn attribute_type_of(&self, _ty: &RuntimeType, name: &str) -> Option<RuntimeType> {
            self.attributes.iter().find(|(attr, _)| *attr == name).map(|(_, ty)| ty.clone())
        }
    }

    fn at(line: u32) -> Location {
        Location::new("app.py", Span::new(line, 4))
    }

    fn str_() -> RuntimeType {
        RuntimeType::named(BUILTINS_STR)
    }

    fn payload() -> RuntimeType {
        RuntimeType::named("app.Payload")
    }

    fn arg(name: &str, ty: RuntimeType) -> ArgumentDescriptor {
        ArgumentDescriptor { name: name.into(), ty, location: at(20) }
    }

    fn field(name: &str, ty: RuntimeType, arguments: Vec<ArgumentDescriptor>) -> FieldDescriptor {
        FieldDescriptor {
            name: name.into(),
            ty,
            arguments: arguments.into_iter().map(|a| (a.name.clone(), a)).collect(),
            location: at(10),
        }
    }

    fn resolver(field_name: &str, previous: RuntimeType, returns: RuntimeType, kwargs: Vec<ArgumentDescriptor>) -> ResolverDescriptor {
        ResolverDescriptor {
            field_name: field_name.into(),
            return_type: returns,
            previous_argument: arg("self", previous),
            keyword_arguments: kwargs.into_iter().map(|a| (a.name.clone(), a)).collect(),
            location: at(30),
        }
    }

    fn model(kind: ModelKind, fields: Vec<FieldDescriptor>, resolvers: Vec<ResolverDescriptor>) -> SchemaModel {
        SchemaModel {
            kind,
            name: "Query".into(),
            fullname: "app.Query".into(),
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect::<IndexMap<_, _>>(),
            resolvers: resolvers.into_iter().map(|r| (r.field_name.clone(), r)).collect(),
            payload: payload(),
            location: at(1),
        }
    }

    fn run(model: &SchemaModel) -> Vec<Diagnostic> {
        cross_check(model, &Flat { attributes: vec![("name", str_().nullable())] }, &CheckerConfig::default())
    }

    #[test]
    fn matching_resolver_is_clean() {
        let m = model(
            ModelKind::Object,
            vec![field("x", str_(), vec![])],
            vec![resolver("x", payload(), str_(), vec![])],
        );
        assert!(run(&m).is_empty());
    }

    #[test]
    fn optional_return_for_non_null_field() {
        let m = model(
            ModelKind::Object,
            vec![field("x", str_(), vec![])],
            vec![resolver("x", payload(), str_().nullable(), vec![])],
        );
        let diagnostics = run(&m);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, Code::ReturnType);
        assert_eq!(
            diagnostics[0].message,
            "Resolver returns type Union[builtins.str, None], expected type builtins.str"
        );
    }

    #[test]
    fn resolver_without_field() {
        let m = model(ModelKind::Object, vec![], vec![resolver("y", payload(), str_(), vec![])]);
        let diagnostics = run(&m);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "No field with name \"y\" defined");
        assert_eq!(diagnostics[0].location, at(30));
    }

    #[test]
    fn interface_type_resolver_is_exempt() {
        let resolvers = vec![resolver("type", payload(), RuntimeType::Unknown, vec![])];
        assert!(run(&model(ModelKind::Interface, vec![], resolvers.clone())).is_empty());
        assert_eq!(run(&model(ModelKind::Object, vec![], resolvers)).len(), 1);
    }

    #[test]
    fn interface_fields_skip_default_access() {
        let m = model(ModelKind::Interface, vec![field("missing", str_(), vec![])], vec![]);
        assert!(run(&m).is_empty());
    }

    #[test]
    fn default_access_mismatch_and_missing_attribute() {
        let m = model(
            ModelKind::Object,
            vec![field("name", str_(), vec![]), field("email", str_(), vec![])],
            vec![],
        );
        let diagnostics = run(&m);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].code, Code::DefaultResolver);
        assert_eq!(
            diagnostics[0].message,
            "Field expects type builtins.str, but app.Payload.name has type Union[builtins.str, None]"
        );
        assert_eq!(diagnostics[1].code, Code::AttrMissing);
        assert_eq!(diagnostics[1].message, "\"app.Payload\" has no attribute \"email\"");
    }

    #[test]
    fn previous_argument_must_be_equivalent() {
        let m = model(
            ModelKind::Object,
            vec![field("x", str_(), vec![arg("first", str_())])],
            // wrong return and missing argument are not reported
            vec![resolver("x", RuntimeType::named("app.Other"), RuntimeType::named(BUILTINS_INT), vec![])],
        );
        let diagnostics = run(&m);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, Code::PreviousArgument);
        assert_eq!(diagnostics[0].message, "Parameter \"self\" has type app.Other, expected type app.Payload");
    }

    #[test]
    fn previous_argument_subtype_is_not_enough() {
        let m = model(
            ModelKind::Object,
            vec![field("x", str_(), vec![])],
            vec![resolver("x", payload().nullable(), str_(), vec![])],
        );
        assert_eq!(run(&m)[0].code, Code::PreviousArgument);
    }

    #[test]
    fn arguments_missing_and_mistyped() {
        let m = model(
            ModelKind::Object,
            vec![field(
                "x",
                str_(),
                vec![arg("first", RuntimeType::named(BUILTINS_INT)), arg("after", str_().nullable()), arg("ok", str_())],
            )],
            vec![resolver(
                "x",
                payload(),
                str_(),
                vec![arg("after", str_()), arg("ok", str_()), arg("extra", str_())],
            )],
        );
        let diagnostics = run(&m);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Parameter \"first\" of type builtins.int is missing, but required in resolver definition",
                "Parameter \"after\" has type builtins.str, expected type Union[builtins.str, None]",
            ]
        );
        assert_eq!(diagnostics[0].code, Code::MissingParameter);
        assert_eq!(diagnostics[1].code, Code::ParameterType);
    }

    #[test]
    fn unknown_absorbs_everywhere() {
        let m = model(
            ModelKind::Object,
            vec![field("x", RuntimeType::Unknown, vec![arg("first", RuntimeType::Unknown)])],
            vec![resolver("x", RuntimeType::Unknown, str_().nullable(), vec![arg("first", str_())])],
        );
        assert!(run(&m).is_empty());
    }

    #[test]
    fn every_violation_in_one_pass_and_idempotent() {
        let m = model(
            ModelKind::Object,
            vec![field("a", str_(), vec![]), field("b", str_(), vec![arg("n", str_())])],
            vec![
                resolver("a", payload(), RuntimeType::named(BUILTINS_INT), vec![]),
                resolver("b", payload(), str_(), vec![]),
                resolver("c", payload(), str_(), vec![]),
            ],
        );
        let first = run(&m);
        assert_eq!(first.len(), 3);
        assert_eq!(first, run(&m));
    }
}
