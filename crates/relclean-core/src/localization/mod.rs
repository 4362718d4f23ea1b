//! Localization of log and outcome messages
//!
//! A [`Catalog`] is an ordered list of YAML resources mapping keys to
//! sprintf-style templates (`%s`, `%d`, `%1$s`, `%%`). Lookups walk the
//! resources in registration order and the first non-empty template wins.

use crate::error::{CleanupError, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_RESOURCE: &str = include_str!("en.yml");

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"%(?:(\d+)\$)?([sd%])").unwrap();
}

/// Resolves message keys to text
pub trait Localizer {
    fn translate(&self, key: &str, arguments: &[String]) -> Option<String>;
}

/// A single key/template resource
#[derive(Debug, Clone)]
struct Resource {
    source: String,
    entries: HashMap<String, String>,
}

/// Ordered set of localization resources
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: Vec<Resource>,
}

impl Catalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding only the built-in English messages
    pub fn with_defaults() -> Self {
        Self::new().with_builtin()
    }

    /// Catalog with the given resource files, then the built-in messages
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut catalog = Self::new();
        for path in paths {
            catalog.add_path(path)?;
        }
        Ok(catalog.with_builtin())
    }

    /// Append the built-in English messages
    pub fn with_builtin(mut self) -> Self {
        // The embedded resource is part of the crate and always parses
        if let Ok(entries) = serde_yaml::from_str(BUILTIN_RESOURCE) {
            self.resources.push(Resource {
                source: "builtin".to_string(),
                entries,
            });
        }
        self
    }

    /// Append a resource parsed from YAML text
    pub fn with_resource_str(mut self, yaml: &str) -> Result<Self> {
        self.push_yaml("inline", yaml)?;
        Ok(self)
    }

    /// Append a resource file
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CleanupError::Config(format!(
                "cannot read localization file {}: {}",
                path.display(),
                e
            ))
        })?;
        self.push_yaml(&path.display().to_string(), &content)
    }

    /// Sources in lookup order
    pub fn sources(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.source.as_str()).collect()
    }

    fn push_yaml(&mut self, source: &str, yaml: &str) -> Result<()> {
        let entries: HashMap<String, String> = serde_yaml::from_str(yaml)?;
        self.resources.push(Resource {
            source: source.to_string(),
            entries,
        });
        Ok(())
    }
}

impl Localizer for Catalog {
    fn translate(&self, key: &str, arguments: &[String]) -> Option<String> {
        self.resources
            .iter()
            .filter_map(|r| r.entries.get(key))
            .find(|template| !template.is_empty())
            .map(|template| format_template(template, arguments))
    }
}

/// Substitute positional arguments into a sprintf-style template
pub fn format_template(template: &str, arguments: &[String]) -> String {
    let mut next = 0usize;
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            if &caps[2] == "%" {
                return "%".to_string();
            }
            let index = match caps.get(1) {
                Some(pos) => pos.as_str().parse::<usize>().unwrap_or(1).saturating_sub(1),
                None => {
                    next += 1;
                    next - 1
                }
            };
            let Some(argument) = arguments.get(index) else {
                return String::new();
            };
            if &caps[2] == "d" {
                argument
                    .trim()
                    .parse::<i64>()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|_| argument.clone())
            } else {
                argument.clone()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_format_template() {
        assert_eq!(format_template("%s of %s", &args(&["1", "2"])), "1 of 2");
        assert_eq!(format_template("%2$s then %1$s", &args(&["a", "b"])), "b then a");
        assert_eq!(format_template("%d%% done", &args(&["50"])), "50% done");
        assert_eq!(format_template("missing %s", &[]), "missing ");
    }

    #[test]
    fn test_first_non_empty_resource_wins() {
        let catalog = Catalog::new()
            .with_resource_str("a: \"\"\nb: \"first %s\"")
            .unwrap()
            .with_resource_str("a: \"second\"\nb: \"ignored\"")
            .unwrap();

        assert_eq!(catalog.translate("a", &[]), Some("second".to_string()));
        assert_eq!(
            catalog.translate("b", &args(&["x"])),
            Some("first x".to_string())
        );
        assert_eq!(catalog.translate("c", &[]), None);
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::with_defaults();
        assert_eq!(catalog.sources(), vec!["builtin"]);
        assert_eq!(
            catalog.translate("corrupt_relations.deleted.other", &args(&["3", "pages_mm"])),
            Some("Deleted 3 corrupt entries from table pages_mm.".to_string())
        );
    }

    #[test]
    fn test_from_paths_puts_builtin_last() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(&path, "messages.fallback.headline: \"Housekeeping\"\n").unwrap();

        let catalog = Catalog::from_paths(&[&path]).unwrap();
        assert_eq!(catalog.sources().last(), Some(&"builtin"));
        assert_eq!(
            catalog.translate("messages.fallback.headline", &[]),
            Some("Housekeeping".to_string())
        );
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let mut catalog = Catalog::new();
        let err = catalog.add_path("/nonexistent/locale.yml").unwrap_err();
        assert!(matches!(err, CleanupError::Config(_)));
    }
}
