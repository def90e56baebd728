//! Template parsing and rendering.

use crate::context::RenderContext;
use crate::error::{JinjaError, JinjaResult};
use crate::functions::{into_template_error, to_template_value, FunctionScope, FUNCTIONS};
use crate::tracker::DependencyCollector;
use minijinja::syntax::SyntaxConfig;
use minijinja::value::Rest;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use std::sync::Arc;

/// Open/close delimiter pairs used by templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    /// Expression delimiters, `{{` `}}` by default
    pub variable: (String, String),
    /// Statement delimiters, `{%` `%}` by default
    pub block: (String, String),
    /// Comment delimiters, `{#` `#}` by default
    pub comment: (String, String),
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            variable: ("{{".to_string(), "}}".to_string()),
            block: ("{%".to_string(), "%}".to_string()),
            comment: ("{#".to_string(), "#}".to_string()),
        }
    }
}

impl Delimiters {
    /// Replace the expression delimiters, keeping the default block and
    /// comment delimiters
    pub fn variable(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            variable: (open.into(), close.into()),
            ..Self::default()
        }
    }

    /// Replace the statement delimiters
    pub fn with_block(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.block = (open.into(), close.into());
        self
    }

    /// Replace the comment delimiters
    pub fn with_comment(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.comment = (open.into(), close.into());
        self
    }

    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    fn syntax(&self) -> JinjaResult<SyntaxConfig> {
        for (open, close) in [&self.variable, &self.block, &self.comment] {
            if open.is_empty() || close.is_empty() {
                return Err(JinjaError::InvalidDelimiters(
                    "delimiters cannot be empty".to_string(),
                ));
            }
        }

        SyntaxConfig::builder()
            .block_delimiters(self.block.0.clone(), self.block.1.clone())
            .variable_delimiters(self.variable.0.clone(), self.variable.1.clone())
            .comment_delimiters(self.comment.0.clone(), self.comment.1.clone())
            .build()
            .map_err(|e| JinjaError::InvalidDelimiters(e.to_string()))
    }
}

/// A template that passed syntax validation and can be rendered repeatedly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    name: String,
    source: String,
}

impl ParsedTemplate {
    /// Template name, used in error messages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template body as given to [`TemplateRenderer::parse`]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Renders model templates with the fixed function surface.
///
/// Each render builds a fresh environment bound to the caller's
/// [`RenderContext`], so parsed templates can be shared across models.
#[derive(Clone, Default)]
pub struct TemplateRenderer {
    delimiters: Delimiters,
    collector: Option<Arc<dyn DependencyCollector>>,
}

impl TemplateRenderer {
    /// Create a renderer with the default delimiters and no collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer using custom delimiters.
    ///
    /// Fails if any pair is empty or the pairs conflict.
    pub fn with_delimiters(delimiters: Delimiters) -> JinjaResult<Self> {
        delimiters.syntax()?;
        Ok(Self {
            delimiters,
            collector: None,
        })
    }

    /// Report `ref()` calls to `collector`
    pub fn with_collector(mut self, collector: Arc<dyn DependencyCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// The delimiters this renderer uses
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Validate `content` and return a reusable template.
    ///
    /// Functions are bound to a placeholder context; nothing is executed.
    pub fn parse(&self, name: &str, content: &str) -> JinjaResult<ParsedTemplate> {
        let mut env = self.environment(FunctionScope::new(Arc::default(), None))?;
        env.add_template_owned(name.to_string(), content.to_string())
            .map_err(|e| JinjaError::TemplateSyntax {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(ParsedTemplate {
            name: name.to_string(),
            source: content.to_string(),
        })
    }

    /// Render `template` against `ctx`.
    ///
    /// `data` is exposed as the template's root scope. Accessing any field
    /// it does not define is an error.
    pub fn render(
        &self,
        template: &ParsedTemplate,
        ctx: &RenderContext,
        data: Option<&qr_core::Value>,
    ) -> JinjaResult<String> {
        let scope = FunctionScope::new(Arc::new(ctx.clone()), self.collector.clone());
        let mut env = self.environment(scope)?;
        env.add_template_owned(template.name.clone(), template.source.clone())
            .map_err(|e| JinjaError::TemplateSyntax {
                name: template.name.clone(),
                message: e.to_string(),
            })?;

        let root = match data {
            Some(value) => to_template_value(value),
            None => Value::from(()),
        };

        let tmpl = env.get_template(&template.name)?;
        let rendered = tmpl.render(root)?;
        log::debug!("Rendered template '{}'", template.name);
        Ok(rendered)
    }

    /// Parse and render in one step
    pub fn render_str(
        &self,
        name: &str,
        content: &str,
        ctx: &RenderContext,
    ) -> JinjaResult<String> {
        let template = self.parse(name, content)?;
        self.render(&template, ctx, None)
    }

    fn environment(&self, scope: FunctionScope) -> JinjaResult<Environment<'static>> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        if !self.delimiters.is_default() {
            env.set_syntax(self.delimiters.syntax()?);
        }

        for (name, func) in FUNCTIONS {
            let func = *func;
            let scope = scope.clone();
            env.add_function(*name, move |args: Rest<Value>| {
                func(&scope, &args).map_err(into_template_error)
            });
        }

        Ok(env)
    }
}

#[cfg(test)]
#[path = "environment_test.rs"]
mod tests;
