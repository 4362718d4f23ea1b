//! relclean Core Library
//!
//! Relation-integrity maintenance for relational content stores.
//!
//! # Features
//! - Detection and removal of duplicated and dangling M:N join rows
//! - Classification of the global reference index by target liveness
//! - Removal of references to missing records and offline versions
//! - Dry-run by default, with persisted execution logs for committed runs
//! - Localized messages from YAML catalogs

pub mod config;
pub mod db;
pub mod error;
pub mod localization;
pub mod log;
pub mod references;
pub mod registry;
pub mod relations;
pub mod runner;
pub mod schema;
pub mod service;

pub use config::{Config, HistoryConfig, ServiceSettings};
pub use db::{DataStore, Database, LogSummary, Row, Value};
pub use error::{CleanupError, Error, Result};
pub use localization::{Catalog, Localizer};
pub use log::{ExecutionLog, LogMessage};
pub use references::{
    MissingRelationsService, NewReference, ReferenceEntry, ReferenceFindings,
    ReferenceIndexScanner, ReferenceRepairer, TargetLiveness,
};
pub use registry::{ServiceFactory, ServiceOptions, ServiceRegistration, ServiceRegistry};
pub use relations::{
    CorruptFindingSet, CorruptRelationDetector, CorruptRelationRepairer,
    CorruptRelationsService, RelationDefinition, RelationSchemaIndexer, Violation,
};
pub use runner::{run_scheduled, run_service, RunReport};
pub use schema::{ColumnSchema, Schema, SchemaProvider, TableSchema};
pub use service::{CleanupService, Journal, Outcome, ServiceContext, Severity};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "relclean";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "relclean";
