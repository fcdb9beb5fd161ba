use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use std::collections::BTreeMap;
use thiserror::Error;

/// Values bound to a prompt's slots.
pub type PromptVariables = BTreeMap<String, String>;

/// Builds [`PromptVariables`] from `(slot, value)` pairs.
pub fn prompt_vars<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> PromptVariables {
    pairs
        .into_iter()
        .map(|(slot, value)| (slot.to_string(), value.to_string()))
        .collect()
}

/// A named prompt template with its required variable slots.
///
/// Specs are compile-time constants (see [`super::templates`]) and are never
/// mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSpec {
    name: &'static str,
    template: &'static str,
    variables: &'static [&'static str],
}

impl PromptSpec {
    pub const fn new(
        name: &'static str,
        template: &'static str,
        variables: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            template,
            variables,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    /// Slots that must be bound for `render` to succeed.
    pub fn variables(&self) -> &'static [&'static str] {
        self.variables
    }
}

/// A required template slot had no value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing variable '{variable}' for prompt '{template}'")]
pub struct MissingVariable {
    pub template: &'static str,
    /// The unbound slot. For slots the prompt did not declare this is the
    /// template engine's description of the undefined value.
    pub variable: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error(transparent)]
    MissingVariable(#[from] MissingVariable),

    /// The template itself is malformed.
    #[error("Template '{template}' failed to render: {message}")]
    Template {
        template: &'static str,
        message: String,
    },
}

/// Fills [`PromptSpec`] templates with variables.
///
/// Rendering is pure: the same prompt and variables always produce the same
/// text. Values are inserted verbatim and never re-parsed as template syntax.
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl PromptRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    pub fn render(
        &self,
        spec: &PromptSpec,
        variables: &PromptVariables,
    ) -> Result<String, RenderError> {
        if let Some(missing) = spec
            .variables()
            .iter()
            .find(|slot| !variables.contains_key(**slot))
        {
            return Err(MissingVariable {
                template: spec.name(),
                variable: missing.to_string(),
            }
            .into());
        }

        self.env
            .render_str(spec.template(), variables)
            .map_err(|err| match err.kind() {
                ErrorKind::UndefinedError => MissingVariable {
                    template: spec.name(),
                    variable: err
                        .detail()
                        .map(str::to_string)
                        .unwrap_or_else(|| err.to_string()),
                }
                .into(),
                _ => RenderError::Template {
                    template: spec.name(),
                    message: err.to_string(),
                },
            })
    }
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: PromptSpec = PromptSpec::new("greeting", "Hello {{ name }}!", &["name"]);

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_fills_slots() {
        let renderer = PromptRenderer::new();
        let out = renderer.render(&GREETING, &vars(&[("name", "Ada")])).unwrap();
        assert_eq!(out, "Hello Ada!");
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = PromptRenderer::new();
        let v = vars(&[("name", "Ada")]);
        assert_eq!(
            renderer.render(&GREETING, &v).unwrap(),
            renderer.render(&GREETING, &v).unwrap()
        );
    }

    #[test]
    fn test_missing_declared_variable() {
        let renderer = PromptRenderer::new();
        let err = renderer.render(&GREETING, &BTreeMap::new()).unwrap_err();
        assert_eq!(
            err,
            RenderError::MissingVariable(MissingVariable {
                template: "greeting",
                variable: "name".into(),
            })
        );
    }

    #[test]
    fn test_undeclared_slot_is_still_missing_variable() {
        const SLOPPY: PromptSpec = PromptSpec::new("sloppy", "{{ a }} and {{ b }}", &["a"]);
        let renderer = PromptRenderer::new();
        let err = renderer.render(&SLOPPY, &vars(&[("a", "x")])).unwrap_err();
        assert!(matches!(err, RenderError::MissingVariable(_)));
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let renderer = PromptRenderer::new();
        let out = renderer
            .render(&GREETING, &vars(&[("name", "{{ evil }} <b>")]))
            .unwrap();
        assert_eq!(out, "Hello {{ evil }} <b>!");
    }

    #[test]
    fn test_malformed_template() {
        const BROKEN: PromptSpec = PromptSpec::new("broken", "{% if %}", &[]);
        let renderer = PromptRenderer::new();
        let err = renderer.render(&BROKEN, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, RenderError::Template { template: "broken", .. }));
    }
}
