//! Shared types for the metahub conversion engine.
//!
//! Source schemas ("spokes") describe themselves through [`reflect::Describable`],
//! usually via `#[derive(Describable)]`, and convert into the canonical
//! [`record::Record`] ("hub record").

// Lets the derive macros' `metahub_api::...` paths resolve inside this crate too.
extern crate self as metahub_api;

pub mod converter;
pub mod date;
pub mod error;
pub mod options;
pub mod record;
pub mod reflect;
pub mod value;
pub mod vocab;

pub use metahub_api_derive::{Describable, HubEnum};
