//! Verb -> plugin registration table

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use super::Plugin;

/// Immutable, exact-match, case-sensitive verb table
///
/// Built once at startup and shared read-only between workers.
#[derive(Clone, Default)]
pub struct Registry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl Registry {
    /// Build the table from a set of capability implementations
    ///
    /// Returns the registry together with load diagnostics, one per rejected
    /// capability. Invalid verbs are skipped; on a duplicate verb the first
    /// capability is kept.
    #[must_use]
    pub fn load<I>(capabilities: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        let mut plugins: HashMap<String, Arc<dyn Plugin>> = HashMap::new();
        let mut diagnostics = Vec::new();

        for plugin in capabilities {
            let verb = plugin.verb().to_string();

            if verb.is_empty() || verb.chars().any(char::is_whitespace) {
                diagnostics.push(format!("Invalid verb {verb:?}: verbs must be a single token"));
                continue;
            }

            match plugins.entry(verb) {
                Entry::Occupied(entry) => {
                    diagnostics.push(format!(
                        "Duplicate verb '{}': keeping the first registration",
                        entry.key()
                    ));
                }
                Entry::Vacant(entry) => {
                    tracing::info!(verb = %entry.key(), "registered plugin");
                    entry.insert(plugin);
                }
            }
        }

        (Self { plugins }, diagnostics)
    }

    /// Look up the plugin for a verb
    #[must_use]
    pub fn get(&self, verb: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(verb)
    }

    /// Registered verbs, sorted
    #[must_use]
    pub fn verbs(&self) -> Vec<&str> {
        let mut verbs: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        verbs.sort_unstable();
        verbs
    }

    /// Number of registered verbs
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no verbs are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("verbs", &self.verbs())
            .finish()
    }
}
