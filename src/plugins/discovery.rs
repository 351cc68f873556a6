//! Plugin folder resolution and manifest discovery

use std::path::{Path, PathBuf};

use super::manifest::{MANIFEST_SUFFIX, PluginManifest};
use crate::{Error, Result};

/// Folder name searched for when no plugin folder is configured
pub const PLUGIN_DIR_NAME: &str = "plugins";

/// Resolve the plugin folder
///
/// A configured path must be an existing directory. Otherwise `root` and
/// each of its ancestors are searched for a `plugins` directory.
///
/// # Errors
///
/// Returns [`Error::PluginDirNotFound`] when no folder can be resolved
pub fn resolve_plugin_dir(configured: Option<&Path>, root: &Path) -> Result<PathBuf> {
    if let Some(path) = configured {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        return if path.is_dir() {
            Ok(path)
        } else {
            Err(Error::PluginDirNotFound {
                searched_from: path,
            })
        };
    }

    root.ancestors()
        .map(|dir| dir.join(PLUGIN_DIR_NAME))
        .find(|candidate| candidate.is_dir())
        .ok_or_else(|| Error::PluginDirNotFound {
            searched_from: root.to_path_buf(),
        })
}

/// Read every `*.plugin.toml` manifest in `dir`
///
/// Manifests are returned sorted by file name. Unreadable or invalid
/// manifests are reported as diagnostics and skipped.
#[must_use]
pub fn discover_manifests(dir: &Path) -> (Vec<PluginManifest>, Vec<String>) {
    let mut diagnostics = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            diagnostics.push(format!("Failed to read plugin folder {}: {e}", dir.display()));
            return (Vec::new(), diagnostics);
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(MANIFEST_SUFFIX))
        })
        .collect();
    paths.sort();

    let mut manifests = Vec::with_capacity(paths.len());
    for path in paths {
        match PluginManifest::from_file(&path) {
            Ok(manifest) => {
                tracing::debug!(
                    verb = %manifest.verb,
                    capability = %manifest.capability,
                    path = %path.display(),
                    "discovered plugin manifest"
                );
                manifests.push(manifest);
            }
            Err(e) => diagnostics.push(format!("Failed to load {}: {e}", path.display())),
        }
    }

    (manifests, diagnostics)
}
