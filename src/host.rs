//! The interface between the resolver checks and the compiler hosting them.
//!
//! The checks consume a host through [`SemanticApi`] (during semantic
//! analysis) and [`CheckerApi`] (during type checking) and are driven through
//! the [`Plugin`] hooks. [`program::Program`] is the host shipped with this
//! crate; any other front-end can implement the same traits.
pub mod prelude;
pub mod program;
pub mod scheduler;
pub mod subtype;

use crate::ast::{ClassDef, Span, UnboundType};
use crate::diagnostics::{Code, Diagnostic, Location};
use crate::types::RuntimeType;

// -------------------------------- Symbols --------------------------------- //

/// Outcome of asking the host about a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Ready(T),
    /// Known to the host but not analyzed yet; ask again on a later pass.
    Pending,
    Missing,
}

impl<T> Resolution<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Resolution::Ready(value) => Some(value),
            Resolution::Pending | Resolution::Missing => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Ready(value) => Resolution::Ready(f(value)),
            Resolution::Pending => Resolution::Pending,
            Resolution::Missing => Resolution::Missing,
        }
    }
}

/// A class as the host knows it after semantic analysis.
#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub fullname: String,
    /// Dotted name of the defining module.
    pub module: String,
    /// Path used for diagnostics pointing into this class.
    pub path: String,
    pub defn: ClassDef,
    /// Linearized ancestry, starting with the class itself.
    pub mro: Vec<String>,
}

impl ClassSymbol {
    /// True if `fullname` is the class itself or one of its ancestors.
    pub fn is_a(&self, fullname: &str) -> bool {
        self.mro.iter().any(|entry| entry == fullname)
    }

    pub fn is_any_of(&self, fullnames: &[&str]) -> bool {
        fullnames.iter().any(|fullname| self.is_a(fullname))
    }

    pub fn location(&self, span: Span) -> Location {
        Location::new(self.path.clone(), span)
    }
}

// ------------------------------- Host APIs -------------------------------- //

pub trait TypeOracle {
    fn is_subtype(&self, left: &RuntimeType, right: &RuntimeType) -> bool;

    /// Mutual subtypes.
    fn is_equivalent(&self, left: &RuntimeType, right: &RuntimeType) -> bool {
        self.is_subtype(left, right) && self.is_subtype(right, left)
    }
}

/// What the host offers while classes are being analyzed.
pub trait SemanticApi: TypeOracle {
    fn lookup_class(&self, fullname: &str) -> Resolution<&ClassSymbol>;

    /// Bind an annotation written in module `scope` to a runtime type.
    fn resolve_unbound_type(&self, ty: &UnboundType, scope: &str) -> Resolution<RuntimeType>;

    /// On the final iteration nothing is `Pending` any more.
    fn is_final_iteration(&self) -> bool;
}

/// What the host offers while type checking.
pub trait CheckerApi: TypeOracle {
    /// Type of attribute `name` on a value of type `ty`; `None` if there is
    /// no such attribute.
    fn attribute_type_of(&self, ty: &RuntimeType, name: &str) -> Option<RuntimeType>;
}

// ------------------------------ Hook contexts ----------------------------- //

/// Passed to the collection hook. Owns nothing; diagnostics go to the host's
/// list and a deferral request is read back by the scheduler.
pub struct SemanticContext<'a> {
    pub api: &'a dyn SemanticApi,
    /// Display path of the module being analyzed.
    pub path: &'a str,
    diagnostics: &'a mut Vec<Diagnostic>,
    deferred: bool,
}

impl<'a> SemanticContext<'a> {
    pub fn new(api: &'a dyn SemanticApi, path: &'a str, diagnostics: &'a mut Vec<Diagnostic>) -> Self {
        Self { api, path, diagnostics, deferred: false }
    }

    pub fn fail(&mut self, location: Location, code: Code, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(location, code, message));
    }

    pub fn report(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Ask to be invoked again once more symbols are resolved. Ignored on the
    /// final iteration, where everything unresolved is simply unknown.
    pub fn defer(&mut self) {
        if !self.api.is_final_iteration() {
            self.deferred = true;
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Class lookup that turns `Pending` into a deferral request.
    pub fn class(&mut self, fullname: &str) -> Option<&'a ClassSymbol> {
        let api = self.api;
        match api.lookup_class(fullname) {
            Resolution::Ready(symbol) => Some(symbol),
            Resolution::Pending => {
                self.defer();
                None
            }
            Resolution::Missing => None,
        }
    }

    /// Annotation binding that turns `Pending` into a deferral request and
    /// anything unresolvable into `Unknown`.
    pub fn annotation(&mut self, ty: Option<&UnboundType>, scope: &str) -> RuntimeType {
        let Some(ty) = ty else { return RuntimeType::Unknown };
        let api = self.api;
        match api.resolve_unbound_type(ty, scope) {
            Resolution::Ready(resolved) => resolved,
            Resolution::Pending => {
                self.defer();
                RuntimeType::Unknown
            }
            Resolution::Missing => RuntimeType::Unknown,
        }
    }
}

/// Passed to the verification hook.
pub struct CheckContext<'a> {
    pub api: &'a dyn CheckerApi,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> CheckContext<'a> {
    pub fn new(api: &'a dyn CheckerApi, diagnostics: &'a mut Vec<Diagnostic>) -> Self {
        Self { api, diagnostics }
    }

    pub fn report(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }
}

// --------------------------------- Hooks ---------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Done,
    /// Not ready; run the hook again on a later pass.
    Deferred,
}

/// Hooks a host calls for classes deriving from a base the plugin handles.
pub trait Plugin {
    /// Whether subclasses of `fullname` (direct or transitive) are routed to
    /// this plugin.
    fn handles_base(&self, fullname: &str) -> bool;

    /// Semantic-analysis time; may be invoked several times per class until
    /// it returns [`HookOutcome::Done`].
    fn collect_class(&mut self, ctx: &mut SemanticContext<'_>, class: &ClassSymbol) -> HookOutcome;

    /// Type-checking time; invoked once per routed class.
    fn verify_class(&self, ctx: &mut CheckContext<'_>, class: &ClassSymbol);
}

/// Whether `class` should be routed to `plugin`: some strict ancestor is a
/// handled base.
pub fn routes_to(plugin: &dyn Plugin, class: &ClassSymbol) -> bool {
    class.mro.iter().skip(1).any(|ancestor| plugin.handles_base(ancestor))
}
