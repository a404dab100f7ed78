//! Stub declarations for the builtins and the schema library.
//!
//! The stubs are ordinary module dumps, decoded like user input, plus the
//! generic signatures that cannot be read off a class header.
use serde_json::{Value, json};

use crate::ast::Module;
use crate::error::{Error, Result};
use crate::host::subtype::{ClassShape, TypeArg, Variance};
use crate::types::{
    BUILTINS_BOOL, BUILTINS_BYTES, BUILTINS_FLOAT, BUILTINS_INT, BUILTINS_LIST, BUILTINS_OBJECT, BUILTINS_STR,
    TYPING_SEQUENCE,
};

pub const PRELUDE_PATH: &str = "<prelude>";

const UNMOUNTED_TYPE: &str = "graphene.types.unmountedtype.UnmountedType";
const STRUCTURE: &str = "graphene.types.structures.Structure";
const SCALAR: &str = "graphene.types.scalars.Scalar";
const OBJECT_TYPE: &str = "graphene.types.objecttype.ObjectType";
const INTERFACE: &str = "graphene.types.interface.Interface";

pub fn modules() -> Result<Vec<Module>> {
    let dump = Value::Array(vec![
        module("builtins", vec![
            class(BUILTINS_OBJECT, &[], vec![]),
            class(BUILTINS_STR, &[BUILTINS_OBJECT], vec![]),
            class(BUILTINS_INT, &[BUILTINS_OBJECT], vec![]),
            class(BUILTINS_BOOL, &[BUILTINS_INT], vec![]),
            class(BUILTINS_FLOAT, &[BUILTINS_OBJECT], vec![]),
            class(BUILTINS_BYTES, &[BUILTINS_OBJECT], vec![]),
            class(BUILTINS_LIST, &[TYPING_SEQUENCE], vec![]),
        ]),
        module("typing", vec![class(TYPING_SEQUENCE, &[BUILTINS_OBJECT], vec![])]),
        module("graphene.types.unmountedtype", vec![class(UNMOUNTED_TYPE, &[BUILTINS_OBJECT], vec![])]),
        module("graphene.types.structures", vec![
            class(STRUCTURE, &[UNMOUNTED_TYPE], vec![]),
            class("graphene.types.structures.List", &[STRUCTURE], vec![]),
            class("graphene.types.structures.NonNull", &[STRUCTURE], vec![]),
        ]),
        module("graphene.types.scalars", vec![
            class(SCALAR, &[UNMOUNTED_TYPE], vec![]),
            class("graphene.types.scalars.String", &[SCALAR], vec![parse_value(BUILTINS_STR)]),
            class("graphene.types.scalars.ID", &[SCALAR], vec![parse_value(BUILTINS_STR)]),
            class("graphene.types.scalars.Int", &[SCALAR], vec![parse_value(BUILTINS_INT)]),
            class("graphene.types.scalars.Float", &[SCALAR], vec![parse_value(BUILTINS_FLOAT)]),
            class("graphene.types.scalars.Boolean", &[SCALAR], vec![parse_value(BUILTINS_BOOL)]),
        ]),
        module("graphene.types.enum", vec![class("graphene.types.enum.Enum", &[UNMOUNTED_TYPE], vec![])]),
        module("graphene.types.objecttype", vec![class(OBJECT_TYPE, &[BUILTINS_OBJECT], vec![])]),
        module("graphene.types.interface", vec![class(INTERFACE, &[BUILTINS_OBJECT], vec![])]),
        module("graphene.types.field", vec![class("graphene.types.field.Field", &[BUILTINS_OBJECT], vec![])]),
        module("graphene.types.argument", vec![class("graphene.types.argument.Argument", &[BUILTINS_OBJECT], vec![])]),
    ]);
    crate::path_de::from_value_with_path(dump).map_err(|source| Error::Decode {
        origin: PRELUDE_PATH.into(),
        source,
    })
}

/// Generic signature of a stub class, when it has one.
pub fn generic_shape(fullname: &str) -> Option<ClassShape> {
    let shape = match fullname {
        BUILTINS_LIST => ClassShape { params: vec![Variance::Invariant], bases: vec![] }
            .base(TYPING_SEQUENCE, vec![TypeArg::Param(0)]),
        TYPING_SEQUENCE => ClassShape { params: vec![Variance::Covariant], bases: vec![] }.base(BUILTINS_OBJECT, vec![]),
        // The payload parameter.
        OBJECT_TYPE | INTERFACE => {
            ClassShape { params: vec![Variance::Invariant], bases: vec![] }.base(BUILTINS_OBJECT, vec![])
        }
        _ => return None,
    };
    Some(shape)
}

fn module(name: &str, defs: Vec<Value>) -> Value {
    json!({ "name": name, "path": PRELUDE_PATH, "defs": defs })
}

fn class(fullname: &str, bases: &[&str], body: Vec<Value>) -> Value {
    let name = fullname.rsplit('.').next().unwrap_or(fullname);
    let bases: Vec<Value> = bases.iter().map(|base| json!({ "fullname": base })).collect();
    json!({ "kind": "class", "name": name, "fullname": fullname, "bases": bases, "body": body })
}

/// `@staticmethod def parse_value(value) -> <returns>`
fn parse_value(returns: &str) -> Value {
    json!({
        "kind": "decorated",
        "decorators": [{ "kind": "name", "name": "staticmethod", "fullname": "builtins.staticmethod" }],
        "func": {
            "name": "parse_value",
            "params": [{ "name": "value" }],
            "returns": { "name": returns, "fullname": returns },
        },
    })
}
