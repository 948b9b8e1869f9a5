use crate::error::{NativeQueryError, Result};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde_json::{Map, Value};
use std::fmt;

/// Renders template text against the bound parameters
pub trait TemplateEngine: Send + Sync + fmt::Debug {
    fn render(&self, name: &str, source: &str, parameters: &Map<String, Value>) -> Result<String>;
}

/// Jinja-syntax engine (`{% if %}`, `{% for %}`, `{{ value }}`).
///
/// Undefined variables render as empty and test as false; output is never
/// escaped.
pub struct JinjaTemplateEngine {
    env: Environment<'static>,
}

impl JinjaTemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        Self { env }
    }
}

impl Default for JinjaTemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JinjaTemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JinjaTemplateEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine for JinjaTemplateEngine {
    fn render(&self, name: &str, source: &str, parameters: &Map<String, Value>) -> Result<String> {
        self.env
            .render_named_str(name, source, parameters)
            .map_err(|e| NativeQueryError::TemplateRender {
                template: name.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_conditional_on_parameter() {
        let engine = JinjaTemplateEngine::new();
        let source = "SELECT * FROM users WHERE 1=1{% if name %} AND name LIKE :name{% endif %}";

        let with = engine.render("t", source, &params(json!({"name": "%al%"}))).unwrap();
        assert_eq!(with, "SELECT * FROM users WHERE 1=1 AND name LIKE :name");

        let without = engine.render("t", source, &params(json!({"name": null}))).unwrap();
        assert_eq!(without, "SELECT * FROM users WHERE 1=1");
    }

    #[test]
    fn test_undefined_variables_are_lenient() {
        let engine = JinjaTemplateEngine::new();
        let sql = engine.render("t", "SELECT '{{ missing }}'", &Map::new()).unwrap();
        assert_eq!(sql, "SELECT ''");
    }

    #[test]
    fn test_loop_over_map_keys() {
        let engine = JinjaTemplateEngine::new();
        let source = "{% for key in filters %}{{ key }} = :{{ key }}{% if not loop.last %} AND {% endif %}{% endfor %}";
        let sql = engine
            .render("t", source, &params(json!({"filters": ["a", "b"]})))
            .unwrap();
        assert_eq!(sql, "a = :a AND b = :b");
    }

    #[test]
    fn test_syntax_error_is_render_error() {
        let engine = JinjaTemplateEngine::new();
        let result = engine.render("broken.twig", "{% if %}", &Map::new());
        assert!(matches!(result, Err(NativeQueryError::TemplateRender { ref template, .. }) if template == "broken.twig"));
    }
}
