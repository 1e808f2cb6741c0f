//! Annotation-driven conversion of source schemas into the canonical record.
//!
//! A [`Converter`] resolves each field of a [`Describable`](metahub_api::reflect::Describable)
//! message, coerces it, runs its parser and validators from the shared
//! [`Registries`], routes the result into a [`Record`](metahub_api::record::Record),
//! and finally runs the computed-field hooks registered for the schema.

pub mod coerce;
pub mod config;
pub mod convert;
pub mod edtf;
pub mod error;
pub mod hooks;
pub mod identifiers;
pub mod merge;
pub mod names;
pub mod parsers;
pub mod registry;
pub mod relator;
pub mod resolve;
pub mod route;
pub mod serializers;
pub mod validators;

pub use config::{ConfigParser, FailOn, HubConfig, TomlParser};
pub use convert::{ConversionResult, Converter};
pub use error::{ConversionIssue, EngineError, Severity};
pub use hooks::{ComputedField, HookRegistry};
pub use registry::{Registries, Registry};
