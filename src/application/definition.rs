//! Loading hierarchy definitions from TOML files.
//!
//! ```toml
//! [[nodes]]
//! id = "app"
//! label = "App"
//! children = ["counter"]
//!
//! [[nodes]]
//! id = "counter"
//! value = 0        # omit for inert nodes
//! ```

use std::path::Path;

use tracing::{debug, instrument};

use crate::application::engine::PropagationEngine;
use crate::application::error_ext::IoResultExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::HierarchyDefinition;

/// Read and parse a hierarchy definition file.
#[instrument(level = "debug")]
pub fn load_definition(path: &Path) -> ApplicationResult<HierarchyDefinition> {
    let content = std::fs::read_to_string(path).with_path_context("read hierarchy", path)?;
    let definition =
        HierarchyDefinition::from_toml_str(&content).map_err(|e| ApplicationError::Definition {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
    debug!(nodes = definition.nodes.len(), "definition loaded");
    Ok(definition)
}

/// Definition from `path`, or the built-in diagram when no path is given.
pub fn resolve_definition(path: Option<&Path>) -> ApplicationResult<HierarchyDefinition> {
    match path {
        Some(path) => load_definition(path),
        None => Ok(HierarchyDefinition::builtin()),
    }
}

/// Validate a definition and construct an engine for it.
pub fn build_engine(definition: &HierarchyDefinition) -> ApplicationResult<PropagationEngine> {
    Ok(PropagationEngine::from_definition(definition)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn given_no_path_when_resolving_then_uses_builtin() {
        let definition = resolve_definition(None).unwrap();
        assert_eq!(definition, HierarchyDefinition::builtin());
    }

    #[test]
    fn given_missing_file_when_loading_then_io_error() {
        let temp = TempDir::new().unwrap();
        let result = load_definition(&temp.path().join("absent.toml"));
        assert!(matches!(result.unwrap_err(), ApplicationError::Io { .. }));
    }

    #[test]
    fn given_invalid_toml_when_loading_then_definition_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        fs::write(&path, "[[nodes]]\nid = 42\n").unwrap();

        let result = load_definition(&path);
        assert!(matches!(result.unwrap_err(), ApplicationError::Definition { .. }));
    }
}
