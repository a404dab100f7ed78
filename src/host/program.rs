//! The built-in host: a whole program read from module dumps.
//!
//! Classes become ready one by one as the scheduler visits them (a class is
//! ready once all of its bases are). Until then lookups answer
//! [`Resolution::Pending`], which is what drives deferral.
use std::collections::HashMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::ast::{BUILTINS_NONE, ClassDef, Module, Stmt, UnboundType};
use crate::error::Result;
use crate::host::subtype::{self, BaseShape, ClassShape, Hierarchy, TypeArg};
use crate::host::{CheckerApi, ClassSymbol, Resolution, SemanticApi, TypeOracle, prelude};
use crate::types::{
    BUILTINS_BOOL, BUILTINS_BYTES, BUILTINS_FLOAT, BUILTINS_INT, BUILTINS_LIST, BUILTINS_OBJECT, BUILTINS_STR,
    RuntimeType, TYPING_SEQUENCE,
};

const PROPERTY: &str = "builtins.property";

// ----------------------------- Annotations -------------------------------- //

#[derive(Debug, Clone, Copy)]
enum Alias {
    Class(&'static str),
    Optional,
    Union,
    Any,
    None,
}

static ALIASES: Lazy<HashMap<&'static str, Alias>> = Lazy::new(|| {
    let mut aliases = HashMap::new();
    for (short, fullname) in [
        ("str", BUILTINS_STR),
        ("int", BUILTINS_INT),
        ("float", BUILTINS_FLOAT),
        ("bool", BUILTINS_BOOL),
        ("bytes", BUILTINS_BYTES),
        ("object", BUILTINS_OBJECT),
        ("list", BUILTINS_LIST),
    ] {
        aliases.insert(short, Alias::Class(fullname));
        aliases.insert(fullname, Alias::Class(fullname));
    }
    aliases.insert("List", Alias::Class(BUILTINS_LIST));
    aliases.insert("typing.List", Alias::Class(BUILTINS_LIST));
    aliases.insert("Sequence", Alias::Class(TYPING_SEQUENCE));
    aliases.insert(TYPING_SEQUENCE, Alias::Class(TYPING_SEQUENCE));
    aliases.insert("Optional", Alias::Optional);
    aliases.insert("typing.Optional", Alias::Optional);
    aliases.insert("Union", Alias::Union);
    aliases.insert("typing.Union", Alias::Union);
    aliases.insert("Any", Alias::Any);
    aliases.insert("typing.Any", Alias::Any);
    aliases.insert("None", Alias::None);
    aliases.insert(BUILTINS_NONE, Alias::None);
    aliases
});

// ------------------------------- Program ---------------------------------- //

#[derive(Debug)]
struct Entry {
    symbol: ClassSymbol,
    shape: ClassShape,
    ready: bool,
}

#[derive(Debug, Default)]
pub struct Program {
    classes: IndexMap<String, Entry>,
    /// Classes from the input dumps, in declaration order; nested classes
    /// follow their owner.
    declared: Vec<String>,
    final_iteration: bool,
}

impl Program {
    /// A program over `modules`, optionally on top of the stub prelude.
    /// Prelude classes are ready immediately; a dump class with the same
    /// fullname replaces its stub.
    pub fn new(modules: &[Module], with_prelude: bool) -> Result<Self> {
        let mut program = Program::default();
        if with_prelude {
            for module in prelude::modules()? {
                program.add_module(&module, false);
            }
            program.settle();
        }
        for module in modules {
            program.add_module(module, true);
        }
        log::debug!("{} classes declared in {} modules", program.declared.len(), modules.len());
        Ok(program)
    }

    fn add_module(&mut self, module: &Module, declare: bool) {
        let mut pending: Vec<&ClassDef> = module
            .defs
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Class(class) => Some(class),
                _ => None,
            })
            .rev()
            .collect();
        while let Some(class) = pending.pop() {
            let symbol = ClassSymbol {
                fullname: class.fullname.clone(),
                module: module.name.clone(),
                path: module.display_path().to_string(),
                defn: class.clone(),
                mro: vec![class.fullname.clone()],
            };
            let entry = Entry { symbol, shape: ClassShape::default(), ready: false };
            self.classes.insert(class.fullname.clone(), entry);
            if declare && !self.declared.contains(&class.fullname) {
                self.declared.push(class.fullname.clone());
            }
            let nested = class.body.iter().rev().filter_map(|stmt| match stmt {
                Stmt::Class(class) => Some(class),
                _ => None,
            });
            pending.extend(nested);
        }
    }

    pub fn declared(&self) -> &[String] {
        &self.declared
    }

    /// A class regardless of readiness.
    pub fn symbol(&self, fullname: &str) -> Option<&ClassSymbol> {
        self.classes.get(fullname).map(|entry| &entry.symbol)
    }

    pub fn is_ready(&self, fullname: &str) -> bool {
        self.classes.get(fullname).is_some_and(|entry| entry.ready)
    }

    pub fn set_final_iteration(&mut self, final_iteration: bool) {
        self.final_iteration = final_iteration;
    }

    /// Mark `fullname` ready if its bases are. With `force`, unready bases
    /// are left out of its ancestry instead. Returns whether it is ready.
    pub fn analyze_class(&mut self, fullname: &str, force: bool) -> bool {
        let Some(entry) = self.classes.get(fullname) else { return false };
        if entry.ready {
            return true;
        }
        let bases = &entry.symbol.defn.bases;
        let waiting = bases.iter().any(|base| self.classes.get(&base.fullname).is_some_and(|e| !e.ready));
        if waiting && !force {
            return false;
        }

        let mut mro = vec![fullname.to_string()];
        let mut shape_bases = Vec::new();
        for base in bases {
            let ancestry = match self.classes.get(&base.fullname) {
                Some(base_entry) if base_entry.ready => base_entry.symbol.mro.clone(),
                // Only reachable under `force`: cycles and stuck bases.
                Some(_) => continue,
                None => vec![base.fullname.clone()],
            };
            for ancestor in ancestry {
                if !mro.contains(&ancestor) {
                    mro.push(ancestor);
                }
            }
            let args = base
                .args
                .iter()
                .map(|arg| TypeArg::Concrete(self.bind(arg, &entry.symbol.module, false).ready().unwrap_or(RuntimeType::Unknown)))
                .collect();
            shape_bases.push(BaseShape { fullname: base.fullname.clone(), args });
        }
        let implicit_object = self.classes.contains_key(BUILTINS_OBJECT);
        if implicit_object && fullname != BUILTINS_OBJECT && !mro.iter().any(|a| a == BUILTINS_OBJECT) {
            mro.push(BUILTINS_OBJECT.to_string());
        }
        let shape = prelude::generic_shape(fullname).unwrap_or(ClassShape { params: Vec::new(), bases: shape_bases });

        if let Some(entry) = self.classes.get_mut(fullname) {
            log::debug!("{fullname} ready, mro = [{}]", mro.join(", "));
            entry.symbol.mro = mro;
            entry.shape = shape;
            entry.ready = true;
        }
        true
    }

    /// Make every class ready: repeated passes, then force what is left.
    pub fn settle(&mut self) {
        let names: Vec<String> = self.classes.keys().cloned().collect();
        loop {
            let mut progress = false;
            for name in &names {
                if !self.is_ready(name) && self.analyze_class(name, false) {
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }
        for name in &names {
            self.analyze_class(name, true);
        }
    }

    /// Bind an annotation. `strict` answers `Pending` for unready classes
    /// outside the final iteration.
    fn bind(&self, ty: &UnboundType, scope: &str, strict: bool) -> Resolution<RuntimeType> {
        let name = ty.fullname.as_deref().unwrap_or(&ty.name);
        if let Some(alias) = ALIASES.get(name) {
            return match alias {
                Alias::Class(fullname) => self.bind_instance(fullname, &ty.args, scope, strict),
                Alias::Any => Resolution::Ready(RuntimeType::Unknown),
                Alias::None => Resolution::Ready(RuntimeType::NoneType),
                Alias::Optional => match ty.args.first() {
                    Some(inner) => self.bind_arg(inner, scope, strict).map(RuntimeType::nullable),
                    None => Resolution::Ready(RuntimeType::Unknown),
                },
                Alias::Union => {
                    let mut members = Vec::new();
                    for arg in &ty.args {
                        match self.bind_arg(arg, scope, strict) {
                            Resolution::Ready(member) => members.push(member),
                            Resolution::Pending => return Resolution::Pending,
                            Resolution::Missing => members.push(RuntimeType::Unknown),
                        }
                    }
                    Resolution::Ready(RuntimeType::union(members))
                }
            };
        }
        if self.classes.contains_key(name) {
            return self.bind_instance(name, &ty.args, scope, strict);
        }
        let local = format!("{scope}.{name}");
        if self.classes.contains_key(&local) {
            return self.bind_instance(&local, &ty.args, scope, strict);
        }
        Resolution::Missing
    }

    /// Type arguments that fail to bind are unknown.
    fn bind_arg(&self, ty: &UnboundType, scope: &str, strict: bool) -> Resolution<RuntimeType> {
        match self.bind(ty, scope, strict) {
            Resolution::Missing => Resolution::Ready(RuntimeType::Unknown),
            other => other,
        }
    }

    fn bind_instance(&self, fullname: &str, args: &[UnboundType], scope: &str, strict: bool) -> Resolution<RuntimeType> {
        let Some(entry) = self.classes.get(fullname) else { return Resolution::Missing };
        if strict && !entry.ready && !self.final_iteration {
            return Resolution::Pending;
        }
        let mut bound = Vec::with_capacity(args.len());
        for arg in args {
            match self.bind_arg(arg, scope, strict) {
                Resolution::Ready(arg) => bound.push(arg),
                _ => return Resolution::Pending,
            }
        }
        let arity = prelude::generic_shape(fullname).map_or(entry.shape.params.len(), |shape| shape.params.len());
        while bound.len() < arity {
            bound.push(RuntimeType::Unknown);
        }
        Resolution::Ready(RuntimeType::instance(fullname, bound))
    }

    /// Type of `name` declared directly in `class`, last declaration wins.
    fn declared_attribute(&self, class: &ClassSymbol, name: &str) -> Option<RuntimeType> {
        let annotation = |ty: Option<&UnboundType>| match ty {
            Some(ty) => self.bind(ty, &class.module, false).ready().unwrap_or(RuntimeType::Unknown),
            None => RuntimeType::Unknown,
        };
        class.defn.body.iter().rev().find_map(|stmt| match stmt {
            Stmt::Assign(assign) if assign.single_name_target().is_some_and(|target| target.name == name) => {
                Some(annotation(assign.annotation.as_ref()))
            }
            Stmt::Func(func) if func.name == name => Some(RuntimeType::Unknown),
            Stmt::Decorated(decorated) if decorated.func.name == name => {
                let is_property = decorated
                    .decorators
                    .iter()
                    .any(|decorator| decorator.is_named_constant(PROPERTY) || decorator.display_name() == "property");
                if is_property {
                    Some(annotation(decorated.func.returns.as_ref()))
                } else {
                    Some(RuntimeType::Unknown)
                }
            }
            Stmt::Class(nested) if nested.name == name => Some(RuntimeType::Unknown),
            _ => None,
        })
    }
}

// ------------------------------ Host traits ------------------------------- //

impl Hierarchy for Program {
    fn shape(&self, fullname: &str) -> Option<&ClassShape> {
        self.classes.get(fullname).filter(|entry| entry.ready).map(|entry| &entry.shape)
    }
}

impl TypeOracle for Program {
    fn is_subtype(&self, left: &RuntimeType, right: &RuntimeType) -> bool {
        subtype::is_subtype(self, left, right)
    }
}

impl SemanticApi for Program {
    fn lookup_class(&self, fullname: &str) -> Resolution<&ClassSymbol> {
        match self.classes.get(fullname) {
            Some(entry) if entry.ready => Resolution::Ready(&entry.symbol),
            Some(_) if !self.final_iteration => Resolution::Pending,
            _ => Resolution::Missing,
        }
    }

    fn resolve_unbound_type(&self, ty: &UnboundType, scope: &str) -> Resolution<RuntimeType> {
        self.bind(ty, scope, true)
    }

    fn is_final_iteration(&self) -> bool {
        self.final_iteration
    }
}

impl CheckerApi for Program {
    fn attribute_type_of(&self, ty: &RuntimeType, name: &str) -> Option<RuntimeType> {
        match ty {
            RuntimeType::Unknown => Some(RuntimeType::Unknown),
            RuntimeType::NoneType => None,
            RuntimeType::Union(items) => {
                let mut found = Vec::with_capacity(items.len());
                for item in items {
                    found.push(self.attribute_type_of(item, name)?);
                }
                Some(RuntimeType::union(found))
            }
            RuntimeType::Instance(instance) => {
                // Nothing is known about classes outside the program.
                let Some(entry) = self.classes.get(&instance.fullname) else {
                    return Some(RuntimeType::Unknown);
                };
                for ancestor in &entry.symbol.mro {
                    let Some(class) = self.classes.get(ancestor) else {
                        return Some(RuntimeType::Unknown);
                    };
                    if let Some(found) = self.declared_attribute(&class.symbol, name) {
                        return Some(found);
                    }
                }
                None
            }
        }
    }
}
