//! Static cross-checking of graphene object-type resolvers against the
//! fields they resolve.
//!
//! A host (the built-in [`host::program::Program`] or any other
//! implementation of the host traits) drives [`plugin::ResolverCheckPlugin`]:
//! the collection hook turns every object type and interface into a
//! [`model::SchemaModel`], the verification hook runs [`check::cross_check`].
pub mod ast;
pub mod check;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod host;
pub mod inference;
pub mod jq_exec;
pub mod model;
pub mod path_de;
pub mod plugin;
pub mod types;

#[cfg(test)]
mod testing;
