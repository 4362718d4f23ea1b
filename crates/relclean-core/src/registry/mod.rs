//! Registry of available cleanup services
//!
//! Constructed once at startup and passed to whatever runs services.

use crate::error::{CleanupError, Result};
use crate::references::MissingRelationsService;
use crate::relations::CorruptRelationsService;
use crate::service::{CleanupService, ServiceContext};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

lazy_static! {
    static ref IDENTIFIER_PATTERN: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
}

/// Builds a service bound to the given context
pub type ServiceFactory = for<'a> fn(ServiceContext<'a>) -> Box<dyn CleanupService + 'a>;

/// Flags of a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOptions {
    pub enabled: bool,
    /// Included in scheduled runs
    pub scheduler_task: bool,
    /// Offered for interactive runs
    pub toolbar: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            scheduler_task: true,
            toolbar: true,
        }
    }
}

/// A registered service
#[derive(Clone, Copy)]
pub struct ServiceRegistration {
    pub factory: ServiceFactory,
    pub options: ServiceOptions,
}

/// Registry for managing cleanup services
pub struct ServiceRegistry {
    services: BTreeMap<String, ServiceRegistration>,
}

fn corrupt_relations<'a>(ctx: ServiceContext<'a>) -> Box<dyn CleanupService + 'a> {
    Box::new(CorruptRelationsService::new(ctx))
}

fn missing_relations<'a>(ctx: ServiceContext<'a>) -> Box<dyn CleanupService + 'a> {
    Box::new(MissingRelationsService::new(ctx))
}

impl ServiceRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self {
            services: BTreeMap::new(),
        }
    }

    /// Create registry with the built-in services
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        // Built-in identifiers are valid
        let _ = registry.register(
            CorruptRelationsService::IDENTIFIER,
            corrupt_relations,
            ServiceOptions::default(),
        );
        let _ = registry.register(
            MissingRelationsService::IDENTIFIER,
            missing_relations,
            ServiceOptions::default(),
        );
        registry
    }

    /// Register a service, replacing any earlier registration of the same identifier
    pub fn register(
        &mut self,
        identifier: &str,
        factory: ServiceFactory,
        options: ServiceOptions,
    ) -> Result<()> {
        if !IDENTIFIER_PATTERN.is_match(identifier) {
            return Err(CleanupError::InvalidService(format!(
                "\"{}\" is not a valid service identifier",
                identifier
            )));
        }
        if self
            .services
            .insert(identifier.to_string(), ServiceRegistration { factory, options })
            .is_some()
        {
            tracing::debug!(identifier, "cleanup service registration replaced");
        }
        Ok(())
    }

    pub fn remove(&mut self, identifier: &str) -> Result<ServiceRegistration> {
        self.services
            .remove(identifier)
            .ok_or_else(|| CleanupError::NotRegistered(identifier.to_string()))
    }

    pub fn set_enabled(&mut self, identifier: &str, enabled: bool) -> Result<()> {
        self.options_mut(identifier)?.enabled = enabled;
        Ok(())
    }

    pub fn set_scheduler_task(&mut self, identifier: &str, scheduler_task: bool) -> Result<()> {
        self.options_mut(identifier)?.scheduler_task = scheduler_task;
        Ok(())
    }

    pub fn set_toolbar(&mut self, identifier: &str, toolbar: bool) -> Result<()> {
        self.options_mut(identifier)?.toolbar = toolbar;
        Ok(())
    }

    /// Get registration by identifier
    pub fn get(&self, identifier: &str) -> Option<&ServiceRegistration> {
        self.services.get(identifier)
    }

    /// Build a fresh service instance
    pub fn create<'a>(
        &self,
        identifier: &str,
        ctx: ServiceContext<'a>,
    ) -> Result<Box<dyn CleanupService + 'a>> {
        let registration = self
            .get(identifier)
            .ok_or_else(|| CleanupError::NotRegistered(identifier.to_string()))?;
        Ok((registration.factory)(ctx))
    }

    /// All identifiers in sorted order
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Enabled services
    pub fn enabled(&self) -> impl Iterator<Item = (&str, &ServiceOptions)> {
        self.services
            .iter()
            .filter(|(_, r)| r.options.enabled)
            .map(|(id, r)| (id.as_str(), &r.options))
    }

    /// Identifiers of enabled services flagged for scheduled runs
    pub fn scheduler_services(&self) -> Vec<&str> {
        self.enabled()
            .filter(|(_, options)| options.scheduler_task)
            .map(|(id, _)| id)
            .collect()
    }

    fn options_mut(&mut self, identifier: &str) -> Result<&mut ServiceOptions> {
        self.services
            .get_mut(identifier)
            .map(|r| &mut r.options)
            .ok_or_else(|| CleanupError::NotRegistered(identifier.to_string()))
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
