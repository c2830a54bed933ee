//! # Munch: Database Record Conversion Engine
//!
//! Munch converts structured database and bibliographic records between an
//! input representation ("spec") and an output representation ("format"),
//! parameterized by a YAML table of named configuration profiles ("targets").
//!
//! ## Features
//!
//! - **Generic record model**: records accumulate field data incrementally as
//!   a spec parser scans raw input, with per-field multi-valued storage keyed
//!   by source element
//! - **Format registry**: input and output converter plugins registered under
//!   explicit tags in two independent namespaces
//! - **Target cascade**: configuration profiles resolved from most to least
//!   specific (`base.spec:format`, then `base.spec`, then `base`)
//! - **Emission disciplines**: streaming, whole-corpus deferred
//!   (sort + dedup), and enveloped output, selected per output format
//!
//! ## Example: target table
//!
//! ```yaml
//! generic:
//!   midos:
//!     fields:
//!       title:
//!         elements: ["TI"]
//!       person:
//!         elements: ["AU", "ED"]
//!         join: "; "
//! ```
//!
//! ## Example: conversion run
//!
//! ```ignore
//! use munch::{FormatRegistry, Pipeline, RunOptions, TargetTable};
//!
//! let registry = FormatRegistry::builtin();
//! let table = TargetTable::load_from_file("config.yaml")?;
//!
//! let pipeline = Pipeline::new(&registry, &table);
//! let stats = pipeline.run(
//!     &RunOptions { spec: "midos", format: "lingo", target: None, target_fallback: None },
//!     &mut reader,
//!     &mut writer,
//! )?;
//! ```

// Core modules
pub mod error;
pub mod record;
pub mod registry;

// Generic runtime for target resolution and the conversion pipeline
pub mod runtime;

// Built-in converter plugins
pub mod formats;
pub mod specs;

// Re-export key types
pub use error::ConvertError;
pub use record::{Field, Finalizer, Record};
pub use registry::{Capability, FormatRegistry, InputFormat, OutputFormat, OutputMode};

// Re-export runtime types
pub use runtime::{
    resolve_target, FieldSpec, Pipeline, RunOptions, RunStats, TargetSpec, TargetTable,
};
