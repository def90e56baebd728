//! Model compilation: rendering templates and collecting `ref()` dependencies.

use crate::error::{RunError, RunResult};
use qr_core::{Config, Model};
use qr_jinja::{DependencyTracker, RenderContext, TemplateRenderer};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Renders model templates against a project configuration.
///
/// Every `ref()` made while rendering is recorded; references to other
/// models in the same batch become dependencies, anything else is treated
/// as an external relation.
pub struct ModelCompiler<'a> {
    config: &'a Config,
    renderer: TemplateRenderer,
    tracker: Arc<DependencyTracker>,
    full_refresh: bool,
}

impl<'a> ModelCompiler<'a> {
    /// Create a compiler for models of the project described by `config`
    pub fn new(config: &'a Config) -> Self {
        let tracker = Arc::new(DependencyTracker::new());
        let renderer = TemplateRenderer::new().with_collector(tracker.clone());
        Self {
            config,
            renderer,
            tracker,
            full_refresh: false,
        }
    }

    /// Force full refresh on every compiled model
    pub fn with_full_refresh(mut self, full_refresh: bool) -> Self {
        self.full_refresh = full_refresh;
        self
    }

    /// Use a custom renderer; its collector is replaced by this compiler's
    pub fn with_renderer(mut self, renderer: TemplateRenderer) -> Self {
        self.renderer = renderer.with_collector(self.tracker.clone());
        self
    }

    /// The render context `model` is compiled with
    pub fn context_for(&self, model: &Model) -> RenderContext {
        let name = model.name.as_str();
        let mut materialization = model.config.clone();
        materialization.full_refresh |= self.full_refresh;

        let seeds: HashMap<String, String> = self
            .config
            .seeds
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let ctx = RenderContext::for_model(name, &materialization)
            .with_vars(self.config.vars.clone())
            .with_config(self.config.config_for(name))
            .with_sources(self.config.source_tables())
            .with_seeds(seeds);

        match &self.config.schema {
            Some(schema) => ctx.with_schema(schema.clone()),
            None => ctx,
        }
    }

    /// Render one model.
    ///
    /// `known` holds the names of every model in the batch; only `ref()`
    /// targets in it are added as dependencies.
    pub fn compile(&self, model: &Model, known: &HashSet<&str>) -> RunResult<Model> {
        let name = model.name.as_str();
        let to_compile_error = |source| RunError::Compile {
            model: name.to_string(),
            source,
        };

        let template = self
            .renderer
            .parse(name, &model.raw_sql)
            .map_err(to_compile_error)?;
        let sql = self
            .renderer
            .render(&template, &self.context_for(model), None)
            .map_err(to_compile_error)?;

        let mut compiled = model.clone();
        compiled.set_compiled_sql(sql);
        compiled.config.full_refresh |= self.full_refresh;

        for dep in self.tracker.dependencies_of(name) {
            if dep == name {
                log::debug!("Model '{}' references itself; not a dependency", name);
            } else if known.contains(dep.as_str()) {
                compiled
                    .add_dependency(&dep)
                    .map_err(RunError::Graph)?;
            } else {
                log::debug!("Model '{}' references external relation '{}'", name, dep);
            }
        }

        log::debug!(
            "Compiled model '{}' with {} dependencies",
            name,
            compiled.dependencies.len()
        );
        Ok(compiled)
    }

    /// Render every model, stopping at the first failure
    pub fn compile_all<'m>(
        &self,
        models: impl IntoIterator<Item = &'m Model>,
    ) -> RunResult<Vec<Model>> {
        let models: Vec<&Model> = models.into_iter().collect();
        let known: HashSet<&str> = models.iter().map(|m| m.name.as_str()).collect();
        models.iter().map(|m| self.compile(m, &known)).collect()
    }
}
