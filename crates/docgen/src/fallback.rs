//! Degraded generation path.
//!
//! Tier one asks the model again with a short prompt. Tier two renders a
//! template straight from the metadata and cannot fail.

use crate::metadata::{FunctionMetadata, Style};
use crate::prompt::build_fallback_prompt;
use crate::sanitize::sanitize;
use crate::style_fix::{apply_style_fixes, summary_is_usable};
use llm::CompletionClient;
use tracing::{debug, warn};

const NO_TYPE: &str = "Any";

pub struct FallbackGenerator<'a> {
    client: &'a dyn CompletionClient,
    model_call: bool,
}

impl<'a> FallbackGenerator<'a> {
    pub fn new(client: &'a dyn CompletionClient, model_call: bool) -> Self {
        Self { client, model_call }
    }

    /// Never returns an empty string.
    pub async fn generate(&self, meta: &FunctionMetadata, style: Style) -> String {
        if self.model_call {
            if let Some(body) = self.secondary_call(meta, style).await {
                return body;
            }
        }

        debug!(function = %meta.display_name(), style = %style, "Rendering template docstring");
        render_template(meta, style)
    }

    async fn secondary_call(&self, meta: &FunctionMetadata, style: Style) -> Option<String> {
        let prompt = build_fallback_prompt(meta, style);

        match self.client.complete(&prompt).await {
            Ok(raw) => {
                let body = apply_style_fixes(&sanitize(&raw, meta, style));
                if summary_is_usable(&body) {
                    Some(body)
                } else {
                    warn!(function = %meta.display_name(), "Fallback model call returned nothing usable");
                    None
                }
            }
            Err(e) => {
                warn!(function = %meta.display_name(), error = %e, "Fallback model call failed");
                None
            }
        }
    }
}

/// Deterministic template body for the given style, with first-line fixes applied.
pub fn render_template(meta: &FunctionMetadata, style: Style) -> String {
    let body = match style {
        Style::Numpy => numpy_body(meta),
        Style::Rest => rest_body(meta),
        Style::Google | Style::None => google_body(meta),
    };
    apply_style_fixes(&body)
}

/// "calc_sum" -> "Calc sum"
pub fn humanize_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn summary_subject(meta: &FunctionMetadata) -> String {
    let human = humanize_name(meta.display_name());
    if human.trim().is_empty() {
        "Function".to_string()
    } else {
        human
    }
}

fn param_desc(name: &str) -> String {
    format!("{name} value.")
}

fn return_desc(meta: &FunctionMetadata) -> String {
    format!("Result of {}.", meta.display_name())
}

fn attr_desc(name: &str) -> String {
    format!("{name} attribute.")
}

fn google_body(meta: &FunctionMetadata) -> String {
    let mut parts = vec![format!("Short description of `{}`.", meta.display_name())];

    if !meta.args_meta.is_empty() {
        let mut lines = vec!["Args:".to_string()];
        for arg in &meta.args_meta {
            lines.push(format!(
                "    {} ({}): {}",
                arg.name,
                arg.type_name(),
                param_desc(&arg.name)
            ));
        }
        parts.push(lines.join("\n"));
    }

    if meta.has_return {
        parts.push(format!(
            "Returns:\n    {}: {}",
            meta.returns.as_deref().unwrap_or(NO_TYPE),
            return_desc(meta)
        ));
    }

    if meta.has_yields {
        parts.push(format!(
            "Yields:\n    {}: Yielded values.",
            meta.yields.as_deref().unwrap_or(NO_TYPE)
        ));
    }

    if !meta.attributes.is_empty() {
        let mut lines = vec!["Attributes:".to_string()];
        for attr in &meta.attributes {
            lines.push(format!("    {attr} ({NO_TYPE}): {}", attr_desc(attr)));
        }
        parts.push(lines.join("\n"));
    }

    if !meta.raises.is_empty() {
        let mut lines = vec!["Raises:".to_string()];
        for exception in &meta.raises {
            lines.push(format!("    {exception}: If an error occurs."));
        }
        parts.push(lines.join("\n"));
    }

    parts.join("\n\n")
}

fn numpy_body(meta: &FunctionMetadata) -> String {
    let mut parts = vec![format!("{} summary.", summary_subject(meta))];

    if !meta.args_meta.is_empty() {
        parts.push("\nParameters\n----------".to_string());
        for arg in &meta.args_meta {
            parts.push(format!("{} : {}", arg.name, arg.type_name()));
            parts.push(format!("    {}", param_desc(&arg.name)));
        }
    }

    if meta.has_return {
        parts.push("\nReturns\n-------".to_string());
        parts.push(meta.returns.as_deref().unwrap_or(NO_TYPE).to_string());
        parts.push(format!("    {}", return_desc(meta)));
    }

    if meta.has_yields {
        parts.push("\nYields\n------".to_string());
        parts.push(meta.yields.as_deref().unwrap_or(NO_TYPE).to_string());
        parts.push("    Yielded values.".to_string());
    }

    if !meta.attributes.is_empty() {
        parts.push("\nAttributes\n----------".to_string());
        for attr in &meta.attributes {
            parts.push(format!("{attr} : {NO_TYPE}"));
            parts.push(format!("    {}", attr_desc(attr)));
        }
    }

    if !meta.raises.is_empty() {
        parts.push("\nRaises\n------".to_string());
        for exception in &meta.raises {
            parts.push(exception.clone());
            parts.push("    If an error occurs.".to_string());
        }
    }

    parts.join("\n")
}

fn rest_body(meta: &FunctionMetadata) -> String {
    let mut parts = vec![format!("{} description.", summary_subject(meta)), String::new()];

    for arg in &meta.args_meta {
        parts.push(format!(":param {}: {}", arg.name, param_desc(&arg.name)));
        parts.push(format!(":type {}: {}", arg.name, arg.type_name()));
    }

    if meta.has_return {
        parts.push(format!(":returns: {}", return_desc(meta)));
        parts.push(format!(":rtype: {}", meta.returns.as_deref().unwrap_or(NO_TYPE)));
    }

    if meta.has_yields {
        parts.push(":yields: Yielded values.".to_string());
        parts.push(format!(":ytype: {}", meta.yields.as_deref().unwrap_or(NO_TYPE)));
    }

    for attr in &meta.attributes {
        parts.push(format!(":attribute {attr}: {}", attr_desc(attr)));
    }

    for exception in &meta.raises {
        parts.push(format!(":raises {exception}: If an error occurs."));
    }

    parts.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::{ConfigError, LLMError, LLMResult};
    use parking_lot::Mutex;

    struct StubClient {
        reply: Mutex<Option<LLMResult<String>>>,
        calls: Mutex<u32>,
    }

    impl StubClient {
        fn replying(reply: LLMResult<String>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for StubClient {
        async fn complete(&self, _prompt: &str) -> LLMResult<String> {
            *self.calls.lock() += 1;
            self.reply
                .lock()
                .take()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn calc_sum() -> FunctionMetadata {
        FunctionMetadata::new("calc_sum")
            .with_arg("a", Some("int"))
            .with_arg("b", None)
            .with_return(Some("int"))
    }

    #[test]
    fn test_humanize_name() {
        assert_eq!(humanize_name("calc_sum"), "Calc sum");
        assert_eq!(humanize_name("_private"), " private");
        assert_eq!(humanize_name(""), "");
    }

    #[test]
    fn test_google_template() {
        let body = render_template(&calc_sum().with_raise("ValueError"), Style::Google);
        assert_eq!(
            body,
            "Short description of `calc_sum`.\n\n\
             Args:\n    a (int): a value.\n    b (Any): b value.\n\n\
             Returns:\n    int: Result of calc_sum.\n\n\
             Raises:\n    ValueError: If an error occurs."
        );
    }

    #[test]
    fn test_numpy_template() {
        let meta = FunctionMetadata::new("read_lines")
            .with_arg("path", Some("str"))
            .with_yields(Some("str"))
            .with_attribute("cursor");
        let body = render_template(&meta, Style::Numpy);

        assert!(body.starts_with("Read lines summary.\n\nParameters\n----------\npath : str\n    path value."));
        assert!(body.contains("Yields\n------\nstr\n    Yielded values."));
        assert!(body.contains("Attributes\n----------\ncursor : Any\n    cursor attribute."));
        assert!(!body.contains("Returns"));
    }

    #[test]
    fn test_rest_template() {
        let body = render_template(&calc_sum(), Style::Rest);
        assert_eq!(
            body,
            "Calc sum description.\n\n\
             :param a: a value.\n:type a: int\n\
             :param b: b value.\n:type b: Any\n\
             :returns: Result of calc_sum.\n:rtype: int"
        );
    }

    #[test]
    fn test_template_first_line_is_fixed() {
        let body = render_template(&FunctionMetadata::new("this_thing"), Style::Numpy);
        assert!(!body.to_lowercase().starts_with("this "));
        assert!(body.lines().next().unwrap().ends_with('.'));
    }

    #[test]
    fn test_minimal_metadata_never_empty() {
        for style in [Style::Google, Style::Numpy, Style::Rest, Style::None] {
            let body = render_template(&FunctionMetadata::new("f"), style);
            assert!(!body.trim().is_empty());
            assert!(!body.contains("Returns"));
            assert!(!body.contains("Raises"));
        }
        assert!(!render_template(&FunctionMetadata::default(), Style::Rest).is_empty());
    }

    #[tokio::test]
    async fn test_secondary_call_output_is_cleaned() {
        let client = StubClient::replying(Ok("\"\"\"calculates the sum\"\"\"".to_string()));
        let body = FallbackGenerator::new(&client, true)
            .generate(&calc_sum(), Style::Google)
            .await;

        assert_eq!(body, "Calculate the sum.");
    }

    #[tokio::test]
    async fn test_failed_secondary_call_renders_template() {
        let client = StubClient::replying(Err(LLMError::Configuration(
            ConfigError::MissingRequired {
                config_key: "GROQ_API_KEY".to_string(),
            },
        )));
        let body = FallbackGenerator::new(&client, true)
            .generate(&calc_sum(), Style::Google)
            .await;

        assert!(body.starts_with("Short description of `calc_sum`."));
        assert_eq!(*client.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_model_call_can_be_disabled() {
        let client = StubClient::replying(Ok("Sum numbers.".to_string()));
        let body = FallbackGenerator::new(&client, false)
            .generate(&calc_sum(), Style::Rest)
            .await;

        assert!(body.starts_with("Calc sum description."));
        assert_eq!(*client.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_secondary_reply_drops_unsupported_sections() {
        let reply = "Prints a greeting.\n\nRaises:\n    KeyError: Missing.\n\nAttributes:\n    level (str): Level.\n\nReturns:\n    bool: Whether it worked.";
        let client = StubClient::replying(Ok(reply.to_string()));
        let meta = FunctionMetadata::new("greet").with_arg("name", Some("str"));

        let body = FallbackGenerator::new(&client, true)
            .generate(&meta, Style::Google)
            .await;
        assert_eq!(body, "Print a greeting.");
    }

    #[tokio::test]
    async fn test_subjectless_secondary_reply_renders_template() {
        let client = StubClient::replying(Ok("This".to_string()));
        let body = FallbackGenerator::new(&client, true)
            .generate(&FunctionMetadata::new("f"), Style::Google)
            .await;

        assert_eq!(body, "Short description of `f`.");
    }

    #[tokio::test]
    async fn test_empty_secondary_reply_renders_template() {
        let client = StubClient::replying(Ok("```python\nprint()\n```".to_string()));
        let body = FallbackGenerator::new(&client, true)
            .generate(&FunctionMetadata::new("f"), Style::Numpy)
            .await;

        assert_eq!(body, "F summary.");
    }
}
