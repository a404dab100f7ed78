//! Subtyping over [`RuntimeType`] with strict-optional semantics.
use crate::types::{BUILTINS_FLOAT, BUILTINS_INT, BUILTINS_OBJECT, Instance, RuntimeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    Covariant,
    Invariant,
}

/// A base-class type argument, either one of the subclass's own parameters
/// or a fixed type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Param(usize),
    Concrete(RuntimeType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseShape {
    pub fullname: String,
    pub args: Vec<TypeArg>,
}

/// Generic signature of a class: its parameters and how each direct base is
/// parameterized in terms of them. The base graph must be acyclic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassShape {
    pub params: Vec<Variance>,
    pub bases: Vec<BaseShape>,
}

impl ClassShape {
    pub fn base(mut self, fullname: impl Into<String>, args: Vec<TypeArg>) -> Self {
        self.bases.push(BaseShape { fullname: fullname.into(), args });
        self
    }
}

pub trait Hierarchy {
    fn shape(&self, fullname: &str) -> Option<&ClassShape>;
}

pub fn is_subtype(classes: &dyn Hierarchy, left: &RuntimeType, right: &RuntimeType) -> bool {
    match (left, right) {
        (RuntimeType::Unknown, _) | (_, RuntimeType::Unknown) => true,
        (RuntimeType::Union(items), _) => items.iter().all(|item| is_subtype(classes, item, right)),
        (_, RuntimeType::Union(items)) => items.iter().any(|item| is_subtype(classes, left, item)),
        (RuntimeType::NoneType, RuntimeType::NoneType) => true,
        (RuntimeType::NoneType, RuntimeType::Instance(right)) => right.fullname == BUILTINS_OBJECT,
        (RuntimeType::Instance(_), RuntimeType::NoneType) => false,
        (RuntimeType::Instance(left), RuntimeType::Instance(right)) => is_instance_subtype(classes, left, right),
    }
}

pub fn is_equivalent(classes: &dyn Hierarchy, left: &RuntimeType, right: &RuntimeType) -> bool {
    is_subtype(classes, left, right) && is_subtype(classes, right, left)
}

fn is_instance_subtype(classes: &dyn Hierarchy, left: &Instance, right: &Instance) -> bool {
    if right.fullname == BUILTINS_OBJECT {
        return true;
    }
    if right.fullname == BUILTINS_FLOAT && map_to_ancestor(classes, left, BUILTINS_INT).is_some() {
        return true;
    }
    let Some(args) = map_to_ancestor(classes, left, &right.fullname) else {
        return false;
    };
    let variances = classes.shape(&right.fullname).map(|shape| shape.params.as_slice()).unwrap_or_default();
    // Missing arguments on either side are unknown and match anything.
    args.iter().zip(&right.args).enumerate().all(|(i, (left, right))| {
        match variances.get(i).copied().unwrap_or(Variance::Invariant) {
            Variance::Covariant => is_subtype(classes, left, right),
            Variance::Invariant => is_equivalent(classes, left, right),
        }
    })
}

/// `instance` viewed as its ancestor `target`: the type arguments `target`
/// receives along the first inheritance path that reaches it.
pub fn map_to_ancestor(classes: &dyn Hierarchy, instance: &Instance, target: &str) -> Option<Vec<RuntimeType>> {
    if instance.fullname == target {
        return Some(instance.args.clone());
    }
    let shape = classes.shape(&instance.fullname)?;
    shape.bases.iter().find_map(|base| {
        let args = base
            .args
            .iter()
            .map(|arg| match arg {
                TypeArg::Param(index) => instance.args.get(*index).cloned().unwrap_or(RuntimeType::Unknown),
                TypeArg::Concrete(ty) => ty.clone(),
            })
            .collect();
        map_to_ancestor(classes, &Instance { fullname: base.fullname.clone(), args }, target)
    })
}
