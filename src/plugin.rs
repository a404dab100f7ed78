//! The resolver checks as a host plugin.
//!
//! The collection hook builds each schema class's model once and caches it;
//! the verification hook cross-checks the cached model.
use crate::check;
use crate::config::CheckerConfig;
use crate::host::{CheckContext, ClassSymbol, HookOutcome, Plugin, SemanticContext};
use crate::inference::TypeResolver;
use crate::model::{self, ModelCache};

#[derive(Debug, Default)]
pub struct ResolverCheckPlugin {
    config: CheckerConfig,
    cache: ModelCache,
}

impl ResolverCheckPlugin {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config, cache: ModelCache::new() }
    }

    pub fn models(&self) -> &ModelCache {
        &self.cache
    }
}

impl Plugin for ResolverCheckPlugin {
    fn handles_base(&self, fullname: &str) -> bool {
        let symbols = &self.config.symbols;
        fullname == symbols.object_type || fullname == symbols.interface
    }

    fn collect_class(&mut self, ctx: &mut SemanticContext<'_>, class: &ClassSymbol) -> HookOutcome {
        if self.cache.contains(&class.fullname) {
            return HookOutcome::Done;
        }
        // Diagnostics of an attempt that ends up deferred are dropped; the
        // retry reports them again.
        let mut attempt = Vec::new();
        let (model, deferred) = {
            let mut scratch = SemanticContext::new(ctx.api, ctx.path, &mut attempt);
            let model = model::build(&mut TypeResolver::new(&mut scratch, &self.config), class);
            (model, scratch.is_deferred())
        };
        if deferred {
            ctx.defer();
            return HookOutcome::Deferred;
        }
        ctx.report(attempt);
        if let Some(model) = model {
            self.cache.insert(model);
        }
        HookOutcome::Done
    }

    fn verify_class(&self, ctx: &mut CheckContext<'_>, class: &ClassSymbol) {
        let Some(model) = self.cache.get(&class.fullname) else {
            log::debug!("{}: no model collected, nothing to verify", class.fullname);
            return;
        };
        let diagnostics = check::cross_check(model, ctx.api, &self.config);
        ctx.report(diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BUILTINS_TRUE, Module, Stmt, UnboundType};
    use crate::diagnostics::{Code, Diagnostic};
    use crate::host::program::Program;
    use crate::host::scheduler::Scheduler;
    use crate::testing::{self, ARGUMENT, INT, NON_NULL, STRING};

    fn check(defs: Vec<Stmt>) -> Vec<Diagnostic> {
        let modules = vec![Module { name: "app".into(), path: Some("app/schema.py".into()), defs }];
        let mut program = Program::new(&modules, true).unwrap();
        let mut plugin = ResolverCheckPlugin::new(CheckerConfig::default());
        Scheduler::new(20).run(&mut program, &mut plugin)
    }

    fn record() -> Stmt {
        testing::plain_class(
            "app.Payload",
            vec![testing::attr("name", testing::ann("builtins.str")), testing::attr("age", testing::optional(testing::ann("builtins.int")))],
        )
    }

    fn query(body: Vec<Stmt>) -> Stmt {
        testing::class("app.Query", vec![testing::object_type_base(Some(testing::ann("app.Payload")))], body)
    }

    fn x_field() -> Stmt {
        testing::field("x", testing::call(NON_NULL, vec![testing::name(STRING)], vec![]), vec![])
    }

    fn resolve_x(returns: UnboundType) -> Stmt {
        testing::resolver("resolve_x", vec![("root", Some(testing::ann("app.Payload"))), ("info", None)], Some(returns))
    }

    #[test]
    fn non_null_field_with_exact_resolver() {
        let diagnostics = check(vec![record(), query(vec![x_field(), resolve_x(testing::ann("builtins.str"))])]);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn optional_return_for_non_null_field() {
        let diagnostics = check(vec![
            record(),
            query(vec![x_field(), resolve_x(testing::optional(testing::ann("builtins.str")))]),
        ]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, Code::ReturnType);
        assert_eq!(diagnostics[0].location.path, "app/schema.py");
    }

    #[test]
    fn default_access_uses_payload_attributes() {
        let diagnostics = check(vec![
            record(),
            query(vec![
                testing::field("name", testing::name(STRING), vec![]),
                testing::field("age", testing::name(INT), vec![("required", testing::name(BUILTINS_TRUE))]),
                testing::field("email", testing::name(STRING), vec![]),
            ]),
        ]);
        let codes: Vec<Code> = diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, [Code::DefaultResolver, Code::AttrMissing]);
        assert_eq!(
            diagnostics[0].message,
            "Field expects type builtins.int, but app.Payload.age has type Union[builtins.int, None]"
        );
    }

    #[test]
    fn argument_checks_through_the_whole_pipeline() {
        let diagnostics = check(vec![
            record(),
            query(vec![
                testing::field(
                    "x",
                    testing::name(STRING),
                    vec![
                        ("first", testing::call(ARGUMENT, vec![testing::name(INT)], vec![("default_value", testing::int_lit(10))])),
                        ("after", testing::name(STRING)),
                    ],
                ),
                testing::resolver(
                    "resolve_x",
                    vec![
                        ("root", Some(testing::ann("app.Payload"))),
                        ("info", None),
                        ("first", Some(testing::ann("builtins.int"))),
                    ],
                    Some(testing::ann("builtins.str")),
                ),
            ]),
        ]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Parameter \"after\" of type Union[builtins.str, None] is missing, but required in resolver definition"
        );
    }

    #[test]
    fn meta_interfaces_error_is_reported_once_across_deferrals() {
        let diagnostics = check(vec![
            query(vec![
                testing::meta(testing::name("app.Node")),
                testing::field("later", testing::name("app.Later"), vec![]),
            ]),
            testing::class("app.Later", vec![testing::object_type_base(None)], vec![]),
            testing::class("app.Node", vec![testing::interface_base(None)], vec![]),
            record(),
        ]);
        let invalid: Vec<&Diagnostic> = diagnostics.iter().filter(|d| d.code == Code::InvalidInterfaces).collect();
        assert_eq!(invalid.len(), 1);
    }

    #[test]
    fn interfaces_are_routed_and_exempt() {
        let diagnostics = check(vec![testing::class(
            "app.Node",
            vec![testing::interface_base(None)],
            vec![
                testing::field("name", testing::name(STRING), vec![]),
                testing::resolver("resolve_type", vec![("instance", None), ("info", None)], None),
            ],
        )]);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn plain_classes_are_not_routed() {
        let plugin = ResolverCheckPlugin::default();
        assert!(plugin.handles_base("graphene.types.objecttype.ObjectType"));
        assert!(!plugin.handles_base("builtins.object"));
        let diagnostics = check(vec![testing::plain_class(
            "app.Helper",
            vec![testing::resolver("resolve_x", vec![], None)],
        )]);
        assert!(diagnostics.is_empty());
    }
}
