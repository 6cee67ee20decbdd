//! Scaffolding for Odoo data-import projects.
//!
//! Two jobs:
//!
//! - create the folder tree and helper scripts of an import project
//!   ([`scaffold`]);
//! - read the fields of a model on a running Odoo instance and write the
//!   transform script mapping client CSV columns to those fields
//!   ([`skeleton`]).
//!
//! ```text
//! fetch (MetadataSource) -> field (FieldDescriptor) -> mapper -> skeleton
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod field;
pub mod mapper;
pub mod odoo;
pub mod scaffold;
pub mod skeleton;

pub use error::{Error, Result};
pub use fetch::{MetadataSource, ModelInfo};
pub use field::{FieldDescriptor, FieldType};
pub use odoo::Odoo;
