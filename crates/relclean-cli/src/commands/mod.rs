//! CLI command handlers

pub mod history;
pub mod relations;
pub mod run;
pub mod services;

use relclean_core::{Catalog, Config, Database, Schema, ServiceContext, ServiceRegistry};

/// Everything a command runs against, built once at startup
pub struct Session {
    pub config: Config,
    pub db: Database,
    pub schema: Schema,
    pub catalog: Catalog,
    pub registry: ServiceRegistry,
}

impl Session {
    pub fn context(&self) -> ServiceContext<'_> {
        ServiceContext::new(&self.db, &self.schema, &self.catalog).with_user(self.config.user_id)
    }

    /// Dry run unless `--commit` is given or the config turns it off
    pub fn dry_run(&self, commit: bool) -> bool {
        !commit && self.config.dry_run
    }
}
