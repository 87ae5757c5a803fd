//! Compiled tag registry: definitions plus derived matching structures.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::debug;

use super::definition::TagDefinition;

/// Errors raised while building or extending the registry.
///
/// These are programmer errors in a tag definition set, not user-input
/// errors; a malformed builtin registry is the engine's only fatal path.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid tag name {0:?}: names are ascii letters and digits, or the single tag \"*\"")]
    InvalidName(String),
    #[error("tag [{tag}] restricts nesting to unregistered tag [{target}]")]
    UnknownRestriction { tag: String, target: String },
}

/// The compiled tag registry.
///
/// Holds the definition table and everything derived from it: the token
/// pattern used by the escaper, per-tag patterns for no-parse body
/// protection, and the stray-token pattern used by the misalignment passes.
/// Derived structures are rebuilt whenever the definition set changes;
/// [`extend`](Self::extend) takes `&mut self`, so a rebuild can never race
/// a parse holding `&self`.
#[derive(Debug)]
pub struct TagRegistry {
    tags: BTreeMap<String, TagDefinition>,
    token_pattern: Regex,
    no_parse_patterns: Vec<(String, Regex)>,
    stray_token: Regex,
}

impl TagRegistry {
    /// Build a registry from a set of definitions.
    pub fn build<I>(definitions: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = TagDefinition>,
    {
        let mut tags = BTreeMap::new();
        for def in definitions {
            validate_name(def.name())?;
            tags.insert(def.name().to_owned(), def);
        }
        let mut registry = Self {
            tags,
            token_pattern: Regex::new("$^").unwrap(),
            no_parse_patterns: Vec::new(),
            stray_token: Regex::new("$^").unwrap(),
        };
        registry.rebuild()?;
        Ok(registry)
    }

    /// Merge additional definitions and rebuild all derived structures.
    /// Existing names are replaced.
    pub fn extend<I>(&mut self, definitions: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = TagDefinition>,
    {
        for def in definitions {
            validate_name(def.name())?;
            self.tags.insert(def.name().to_owned(), def);
        }
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<(), RegistryError> {
        for def in self.tags.values() {
            for target in def.children_allowed().iter().chain(def.parents_allowed()) {
                if !self.tags.contains_key(target) {
                    return Err(RegistryError::UnknownRestriction {
                        tag: def.name().to_owned(),
                        target: target.clone(),
                    });
                }
            }
        }

        let alternation = self.alternation();
        // Close branch first so `[/b]` is not parsed as an open token.
        self.token_pattern = Regex::new(&format!(
            r"(?i)\[(?:/({alternation})|({alternation})((?:=[^\[\]]*)?))\]"
        ))
        .unwrap();
        self.stray_token =
            Regex::new(&format!(r"(?i)<(/?)(?:\d+:)?({alternation})((?:=[^<>]*)?)>")).unwrap();
        self.no_parse_patterns = self
            .tags
            .values()
            .filter(|def| def.is_no_parse())
            .map(|def| {
                let escaped = regex::escape(def.name());
                let pattern =
                    Regex::new(&format!(r"(?is)<{escaped}((?:=[^<>]*)?)>(.*?)</{escaped}>"))
                        .unwrap();
                (def.name().to_owned(), pattern)
            })
            .collect();

        debug!(tags = self.tags.len(), "rebuilt tag registry");
        Ok(())
    }

    /// Alternation of all tag names, longest first so longer names are never
    /// shadowed by a shorter prefix. The `*` tag has no letters and relies
    /// on `regex::escape`.
    fn alternation(&self) -> String {
        let mut names: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Look up a definition by (case-insensitive) name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        if name.chars().any(|c| c.is_ascii_uppercase()) {
            self.tags.get(&name.to_ascii_lowercase())
        } else {
            self.tags.get(name)
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Pattern matching `[name]`, `[name=params]`, and `[/name]` bracket
    /// tokens for every registered tag.
    pub(crate) fn token_pattern(&self) -> &Regex {
        &self.token_pattern
    }

    /// Per-tag patterns matching internal-form no-parse spans.
    pub(crate) fn no_parse_patterns(&self) -> &[(String, Regex)] {
        &self.no_parse_patterns
    }

    /// Pattern matching any internal-form token, annotated or not.
    pub(crate) fn stray_token_pattern(&self) -> &Regex {
        &self.stray_token
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    let valid = name == "*"
        || (!name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_owned()))
    }
}
