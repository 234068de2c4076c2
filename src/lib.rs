//! Typed API error responses and synchronized response-code catalogs.
//!
//! Two halves share one model of named, integer-valued response codes:
//!
//! - **Normalization**: any failure signal ([`ErrorInput`]) plus optional
//!   code/status [`Overrides`] becomes a [`NormalizedError`], which
//!   [`ErrorHandler`] renders through a JSON response template.
//! - **Synchronization**: [`TranslationSync`] makes sure every case of every
//!   [`CodeGroup`] has a message in every locale, never overwriting an
//!   existing one, and migrates catalogs written in older on-disk layouts.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use respcode::{Config, ErrorHandler, Overrides, TranslatorRegistry};
//!
//! let config = Arc::new(Config::default());
//! let handler = ErrorHandler::from_registry(config, &TranslatorRegistry::new()).unwrap();
//! let response = handler.handle("Custom error", &Overrides::code(1001));
//! assert_eq!(response.status, 500);
//! ```

pub mod builtin;
pub mod cases;
pub mod catalog;
pub mod config;
pub mod debug;
pub mod error;
pub mod generate;
pub mod handler;
pub mod key;
pub mod normalize;
pub mod render;
pub mod sync;
pub mod traits;
pub mod translate;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    builtin::main_group,
    cases::{ManifestDirectory, StaticCases},
    catalog::{CatalogLocator, Layout, MessageStore, MigrationOutcome, merge_missing},
    config::{Config, StatusInference},
    debug::DebugContext,
    error::{Error, ValidationError},
    handler::{ApiResponse, ErrorHandler},
    key::{case_key, group_key, humanize},
    normalize::{
        ErrorInput, ErrorPayload, ErrorResponse, Failure, FailureKind, NormalizedError, Normalizer,
        Overrides, deferred_error, error_if, error_unless,
    },
    render::{RenderVars, ResponseRenderer},
    sync::{BatchReport, SyncOptions, SyncReport, TranslationSync, normalize_locales},
    traits::{CaseProvider, TranslationBackend, Translator},
    translate::{FileTranslator, InMemoryBackend, KeyValueTranslator, TranslatorRegistry},
    types::{Catalog, CodeGroup, ErrorCode, ResponseCode, TypedCase},
};
