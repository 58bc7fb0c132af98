//! CURIE parsing and provider URL generation.
//!
//! The resolver only depends on the [`CurieNormalizer`] trait. [`Registry`]
//! is the implementation shipped with the crate: a catalogue of prefixes
//! with their synonyms, identifier patterns and provider URL templates,
//! built in code or read from JSON.
//!
//! ```json
//! {
//!   "go": {
//!     "name": "Gene Ontology",
//!     "synonyms": ["GO"],
//!     "pattern": "^\\d{7}$",
//!     "banana": true,
//!     "providers": {"amigo": "http://amigo.geneontology.org/amigo/term/GO:$1"}
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::Providers;

/// Placeholder replaced with the identifier in provider URL templates.
const IDENTIFIER_PLACEHOLDER: &str = "$1";

/// Splits CURIEs and computes provider URLs.
pub trait CurieNormalizer: Send + Sync {
    /// Splits `curie` into a normalized `(prefix, identifier)` pair.
    ///
    /// Returns `None` when either part is missing or the prefix is not
    /// recognized.
    fn parse_curie(&self, curie: &str) -> Option<(String, String)>;

    /// Provider name to URL for the entity.
    fn get_providers(&self, prefix: &str, identifier: &str) -> Providers;

    /// Human-readable name of the vocabulary, if known.
    fn get_name(&self, _prefix: &str) -> Option<String> {
        None
    }
}

/// One vocabulary in a [`Registry`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Resource {
    /// Display name.
    pub name: Option<String>,
    /// Alternative spellings of the prefix, matched case-insensitively.
    pub synonyms: Vec<String>,
    /// Regular expression local identifiers must match.
    pub pattern: Option<String>,
    /// Whether identifiers may repeat the prefix (`GO:GO:0000073`).
    pub banana: bool,
    /// Provider name to URL template containing `$1`.
    pub providers: BTreeMap<String, String>,
}

impl Resource {
    /// Creates an empty resource.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an alternative spelling of the prefix.
    #[must_use]
    pub fn synonym(mut self, synonym: impl Into<String>) -> Self {
        self.synonyms.push(synonym.into());
        self
    }

    /// Sets the identifier regular expression.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Allows identifiers that repeat the prefix.
    #[must_use]
    pub const fn banana(mut self, banana: bool) -> Self {
        self.banana = banana;
        self
    }

    /// Adds a provider URL template; `$1` is the identifier.
    #[must_use]
    pub fn provider(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.providers.insert(name.into(), template.into());
        self
    }
}

#[derive(Debug)]
struct Entry {
    resource: Resource,
    pattern: Option<Regex>,
}

/// Prefix catalogue implementing [`CurieNormalizer`].
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
    /// Lowercased prefix or synonym to canonical prefix.
    aliases: HashMap<String, String>,
    /// Resolver-wide providers; `$1` is replaced with the whole CURIE.
    resolvers: BTreeMap<String, String>,
    accept_unknown: bool,
}

impl Registry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry with no resources that accepts any prefix, lowercased.
    ///
    /// Useful when the backend itself is the only authority on prefixes.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            accept_unknown: true,
            ..Self::default()
        }
    }

    /// Parses a JSON object of `prefix -> resource`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let resources: BTreeMap<String, Resource> =
            serde_json::from_str(json).map_err(|e| ConfigError::Registry {
                reason: format!("invalid registry JSON: {e}"),
            })?;
        resources
            .into_iter()
            .fold(Self::builder(), |builder, (prefix, resource)| builder.resource(prefix, resource))
            .build()
    }

    /// Reads a JSON registry file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Registry {
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_json_str(&json)
    }

    /// Canonical form of `prefix`, if it is registered (or the registry is
    /// permissive).
    #[must_use]
    pub fn normalize_prefix(&self, prefix: &str) -> Option<String> {
        let key = prefix.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        match self.aliases.get(&key) {
            Some(canonical) => Some(canonical.clone()),
            None if self.accept_unknown => Some(key),
            None => None,
        }
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no resource is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn strip_banana<'a>(&self, prefix: &str, entry: &Entry, identifier: &'a str) -> &'a str {
        if !entry.resource.banana {
            return identifier;
        }
        match identifier.split_once(':') {
            Some((head, rest))
                if self.aliases.get(&head.to_lowercase()).map(String::as_str) == Some(prefix) =>
            {
                rest
            }
            _ => identifier,
        }
    }
}

impl CurieNormalizer for Registry {
    fn parse_curie(&self, curie: &str) -> Option<(String, String)> {
        let (raw_prefix, raw_identifier) = curie.split_once(':')?;
        let prefix = self.normalize_prefix(raw_prefix)?;
        let mut identifier = raw_identifier.trim();

        if let Some(entry) = self.entries.get(&prefix) {
            identifier = self.strip_banana(&prefix, entry, identifier);
            if let Some(pattern) = &entry.pattern {
                if !pattern.is_match(identifier) {
                    return None;
                }
            }
        }

        if identifier.is_empty() {
            return None;
        }
        Some((prefix, identifier.to_string()))
    }

    fn get_providers(&self, prefix: &str, identifier: &str) -> Providers {
        let mut providers = Providers::new();
        if let Some(entry) = self.entries.get(prefix) {
            for (name, template) in &entry.resource.providers {
                providers.insert(
                    name.clone(),
                    template.replace(IDENTIFIER_PLACEHOLDER, identifier),
                );
            }
        }
        let curie = format!("{prefix}:{identifier}");
        for (name, template) in &self.resolvers {
            providers.insert(name.clone(), template.replace(IDENTIFIER_PLACEHOLDER, &curie));
        }
        providers
    }

    fn get_name(&self, prefix: &str) -> Option<String> {
        self.entries.get(prefix).and_then(|entry| entry.resource.name.clone())
    }
}

/// Builder for [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    resources: Vec<(String, Resource)>,
    resolvers: BTreeMap<String, String>,
    accept_unknown: bool,
}

impl RegistryBuilder {
    /// Registers a resource under `prefix`.
    #[must_use]
    pub fn resource(mut self, prefix: impl Into<String>, resource: Resource) -> Self {
        self.resources.push((prefix.into(), resource));
        self
    }

    /// Adds a provider offered for every CURIE; `$1` is the whole CURIE.
    #[must_use]
    pub fn resolver(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.resolvers.insert(name.into(), template.into());
        self
    }

    /// Also accept prefixes that are not registered.
    #[must_use]
    pub const fn accept_unknown(mut self, accept: bool) -> Self {
        self.accept_unknown = accept;
        self
    }

    /// Compiles patterns and checks that no alias is claimed twice.
    pub fn build(self) -> Result<Registry, ConfigError> {
        let mut registry = Registry {
            resolvers: self.resolvers,
            accept_unknown: self.accept_unknown,
            ..Registry::default()
        };

        for (prefix, resource) in self.resources {
            let canonical = prefix.trim().to_lowercase();
            if canonical.is_empty() || canonical.contains(':') {
                return Err(ConfigError::Registry {
                    reason: format!("invalid prefix '{prefix}'"),
                });
            }

            let pattern = resource
                .pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|e| ConfigError::Registry {
                    reason: format!("invalid pattern for '{canonical}': {e}"),
                })?;

            let aliases = std::iter::once(canonical.clone())
                .chain(resource.synonyms.iter().map(|s| s.trim().to_lowercase()));
            for alias in aliases {
                match registry.aliases.get(&alias) {
                    Some(owner) if owner != &canonical => {
                        return Err(ConfigError::Registry {
                            reason: format!(
                                "alias '{alias}' is claimed by both '{owner}' and '{canonical}'"
                            ),
                        });
                    }
                    _ => {
                        registry.aliases.insert(alias, canonical.clone());
                    }
                }
            }

            registry.entries.insert(canonical, Entry { resource, pattern });
        }

        Ok(registry)
    }
}
