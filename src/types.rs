//! Runtime (Python-side) types. No AST nodes here.

use std::fmt;

use serde::{Serialize, Serializer};

pub const BUILTINS_OBJECT: &str = "builtins.object";
pub const BUILTINS_STR: &str = "builtins.str";
pub const BUILTINS_INT: &str = "builtins.int";
pub const BUILTINS_FLOAT: &str = "builtins.float";
pub const BUILTINS_BOOL: &str = "builtins.bool";
pub const BUILTINS_BYTES: &str = "builtins.bytes";
pub const BUILTINS_LIST: &str = "builtins.list";
pub const TYPING_SEQUENCE: &str = "typing.Sequence";

/// The type a value will have at runtime.
///
/// Nullability is expressed as a union with [`RuntimeType::NoneType`];
/// [`RuntimeType::Unknown`] is absorbing and compares compatible with
/// everything, so a gap in inference never produces a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuntimeType {
    Unknown,
    NoneType,
    Instance(Instance),
    Union(Vec<RuntimeType>),
}

/// A nominal type with its type arguments, e.g. `builtins.list[builtins.int]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instance {
    pub fullname: String,
    pub args: Vec<RuntimeType>,
}

impl RuntimeType {
    pub fn instance(fullname: impl Into<String>, args: Vec<RuntimeType>) -> Self {
        RuntimeType::Instance(Instance { fullname: fullname.into(), args })
    }

    pub fn named(fullname: impl Into<String>) -> Self {
        Self::instance(fullname, Vec::new())
    }

    /// Mutable list of `item`.
    pub fn list_of(item: RuntimeType) -> Self {
        Self::instance(BUILTINS_LIST, vec![item])
    }

    /// Read-only covariant sequence of `item`.
    pub fn sequence_of(item: RuntimeType) -> Self {
        Self::instance(TYPING_SEQUENCE, vec![item])
    }

    /// Flattened, de-duplicated union. A single member collapses to itself and
    /// any `Unknown` member absorbs the whole union.
    pub fn union(items: impl IntoIterator<Item = RuntimeType>) -> Self {
        let mut flat: Vec<RuntimeType> = Vec::new();
        for item in items {
            match item {
                RuntimeType::Unknown => return RuntimeType::Unknown,
                RuntimeType::Union(inner) => {
                    for member in inner {
                        if !flat.contains(&member) {
                            flat.push(member);
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => RuntimeType::Unknown,
            1 => flat.remove(0),
            _ => RuntimeType::Union(flat),
        }
    }

    /// `Union[self, None]`; `Unknown` is never wrapped.
    pub fn nullable(self) -> Self {
        match self {
            RuntimeType::Unknown => RuntimeType::Unknown,
            other => RuntimeType::union([other, RuntimeType::NoneType]),
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            RuntimeType::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeType::Unknown => write!(f, "Any"),
            RuntimeType::NoneType => write!(f, "None"),
            RuntimeType::Instance(instance) => write!(f, "{instance}"),
            RuntimeType::Union(items) => {
                write!(f, "Union[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullname)?;
        if !self.args.is_empty() {
            write!(f, "[")?;
            write_joined(f, &self.args)?;
            write!(f, "]")?;
        }
        Ok(())
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[RuntimeType]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

// Models are dumped as JSON with types in their display form.
impl Serialize for RuntimeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
