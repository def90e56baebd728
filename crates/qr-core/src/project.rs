//! Project discovery and loading

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::model::Model;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A Quarry project: its configuration and the model templates found under
/// its model paths
#[derive(Debug)]
pub struct Project {
    /// Project root directory
    pub root: PathBuf,

    /// Project configuration
    pub config: Config,

    /// Models keyed by name
    pub models: BTreeMap<String, Model>,
}

impl Project {
    /// Load a project from a directory
    pub fn load(path: &Path) -> CoreResult<Self> {
        let root = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        if !root.exists() {
            return Err(CoreError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }

        let config = Config::load_from_dir(&root)?;
        let models = Self::discover_models(&root, &config)?;
        log::debug!(
            "Loaded project '{}' with {} model(s)",
            config.name,
            models.len()
        );

        Ok(Self {
            root,
            config,
            models,
        })
    }

    /// Discover all SQL model files in the project
    fn discover_models(root: &Path, config: &Config) -> CoreResult<BTreeMap<String, Model>> {
        let mut models = BTreeMap::new();

        for model_path in config.model_paths_absolute(root) {
            if !model_path.exists() {
                log::debug!("Model path {} does not exist", model_path.display());
                continue;
            }

            Self::discover_models_recursive(&model_path, config, &mut models)?;
        }

        Ok(models)
    }

    /// Recursively discover SQL files in a directory
    fn discover_models_recursive(
        dir: &Path,
        config: &Config,
        models: &mut BTreeMap<String, Model>,
    ) -> CoreResult<()> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                Self::discover_models_recursive(&path, config, models)?;
            } else if path.extension().is_some_and(|e| e == "sql") {
                let model = Self::load_model(&path, config)?;

                if let Some(existing) = models.get(model.name.as_str()) {
                    return Err(CoreError::DuplicateModel {
                        name: model.name.to_string(),
                        first: existing.path.display().to_string(),
                        second: path.display().to_string(),
                    });
                }

                models.insert(model.name.to_string(), model);
            }
        }

        Ok(())
    }

    /// Build a model from a template file, applying its `models:` override
    fn load_model(path: &Path, config: &Config) -> CoreResult<Model> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let raw_sql = std::fs::read_to_string(path).map_err(|source| CoreError::IoWithPath {
            path: path.display().to_string(),
            source,
        })?;

        let mut model = Model::new(name, path)?;
        model.set_raw_sql(raw_sql);
        model.set_config(config.materialization_for(name, false));
        if let Some(over) = config.models.get(name) {
            for (key, value) in &over.meta {
                model.set_metadata(key.clone(), value.clone());
            }
        }
        Ok(model)
    }

    /// Get a model by name
    pub fn get_model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// All model names, sorted
    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }
}
