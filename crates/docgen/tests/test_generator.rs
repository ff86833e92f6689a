use async_trait::async_trait;
use common::{ConfigError, LLMError, LLMResult};
use docgen::{DocstringCache, DocstringGenerator, FunctionMetadata, GeneratorConfig, Style};
use llm::CompletionClient;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Replays canned replies in order and records every prompt it was sent.
/// Once the script runs out it keeps failing with a transport error.
#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<VecDeque<LLMResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(replies: Vec<LLMResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn replying(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock()[index].clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> LLMResult<String> {
        self.prompts.lock().push(prompt.to_string());
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Err(LLMError::Transport {
                provider: "scripted".to_string(),
                reason: "script exhausted".to_string(),
            })
        })
    }
}

fn generator(client: &Arc<ScriptedClient>) -> DocstringGenerator {
    DocstringGenerator::new(client.clone())
}

fn calc_sum() -> FunctionMetadata {
    FunctionMetadata::new("calc_sum")
        .with_arg("a", Some("int"))
        .with_arg("b", Some("int"))
        .with_return(Some("int"))
}

fn missing_key() -> LLMResult<String> {
    Err(LLMError::Configuration(ConfigError::MissingRequired {
        config_key: "GROQ_API_KEY".to_string(),
    }))
}

#[tokio::test]
async fn test_none_style_is_empty_without_model_call() {
    let client = ScriptedClient::replying(&["Add numbers."]);
    let gen = generator(&client);

    assert_eq!(gen.generate(&calc_sum(), Style::None, false).await, "");
    assert_eq!(gen.generate(&FunctionMetadata::default(), Style::None, true).await, "");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_google_end_to_end() {
    let client = ScriptedClient::replying(&[
        "Here's the docstring:\n\"\"\"\ncalculates the sum of two integers\n\nArgs:\n    a (int): First addend.\n    b (int): Second addend.\n\nReturns:\n    int: The sum.\n\nRaises:\n    TypeError: If inputs are not numbers.\n\nAttributes:\n    total (int): Running total.\n\"\"\"",
    ]);
    let body = generator(&client).generate(&calc_sum(), Style::Google, false).await;

    assert_eq!(
        body,
        "Calculate the sum of two integers.\n\nArgs:\n    a (int): First addend.\n    b (int): Second addend.\n\nReturns:\n    int: The sum."
    );
    assert!(!body.contains("Raises:"));
    assert!(!body.contains("Attributes:"));
}

#[tokio::test]
async fn test_rest_end_to_end() {
    let client = ScriptedClient::replying(&[
        "```\nSum two integers.\n\n:param a: First.\n:param b: Second.\n:returns: The sum.\n:rtype: int\n:raises ValueError: Never.\n```",
    ]);
    let body = generator(&client).generate(&calc_sum(), Style::Rest, false).await;

    // A leading fence leaves nothing, so the template answers once the script runs dry.
    assert!(!body.is_empty());
    assert!(body.contains(":param a:"));
    assert!(body.contains(":param b:"));
    assert!(body.contains(":returns:"));
    assert!(!body.contains(":raises"));
}

#[tokio::test]
async fn test_rest_model_output_is_reconciled() {
    let client = ScriptedClient::replying(&[
        "Sum two integers.\n\n:param a: First.\n:param b: Second.\n:returns: The sum.\n:rtype: int\n:raises ValueError: Never.",
    ]);
    let body = generator(&client).generate(&calc_sum(), Style::Rest, false).await;

    assert_eq!(
        body,
        "Sum two integers.\n\n:param a: First.\n:param b: Second.\n:returns: The sum.\n:rtype: int"
    );
}

#[tokio::test]
async fn test_cache_hit_skips_model() {
    let client = ScriptedClient::replying(&["Add two integers.", "Sum two integers."]);
    let gen = generator(&client);

    let first = gen.generate(&calc_sum(), Style::Google, false).await;
    let second = gen.generate(&calc_sum(), Style::Google, false).await;

    assert_eq!(first, "Add two integers.");
    assert_eq!(first, second);
    assert_eq!(client.calls(), 1);
    assert_eq!(gen.cache().len(), 1);
}

#[tokio::test]
async fn test_different_style_is_a_cache_miss() {
    let client = ScriptedClient::replying(&["Add two integers.", "Add two integers."]);
    let gen = generator(&client);

    gen.generate(&calc_sum(), Style::Google, false).await;
    gen.generate(&calc_sum(), Style::Numpy, false).await;

    assert_eq!(client.calls(), 2);
    assert_eq!(gen.cache().len(), 2);
}

#[tokio::test]
async fn test_bypass_regenerates_and_replaces_cache() {
    let client = ScriptedClient::replying(&["Add two integers.", "this function calculates the total"]);
    let gen = generator(&client);

    let first = gen.generate(&calc_sum(), Style::Google, false).await;
    let fresh = gen.generate(&calc_sum(), Style::Google, true).await;

    assert_eq!(first, "Add two integers.");
    assert_eq!(fresh, "Calculate the total.");
    assert_eq!(client.calls(), 2);
    assert_eq!(gen.generate(&calc_sum(), Style::Google, false).await, fresh);
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn test_first_attempt_has_no_variation_hint() {
    let client = ScriptedClient::replying(&["Add two integers."]);
    generator(&client).generate(&calc_sum(), Style::Google, false).await;

    assert!(client
        .prompt(0)
        .ends_with("Return ONLY the docstring content, no triple quotes."));
}

#[tokio::test]
async fn test_empty_output_retries_then_falls_back() {
    let client = ScriptedClient::replying(&["\"\"\"\"\"\"", "```python\npass\n```", "Note: nothing to add."]);
    let gen = generator(&client);

    let body = gen.generate(&calc_sum(), Style::Google, false).await;

    // Three primary attempts, then one failed fallback call.
    assert_eq!(client.calls(), 4);
    assert!(body.starts_with("Short description of `calc_sum`."));
    assert!(body.contains("Args:\n    a (int): a value.\n    b (int): b value."));
    assert!(body.contains("Returns:\n    int: Result of calc_sum."));
    assert!(gen.cache().is_empty());
}

#[tokio::test]
async fn test_retry_recovers_and_is_cached() {
    let client = ScriptedClient::replying(&["", "Add two integers."]);
    let gen = generator(&client);

    assert_eq!(gen.generate(&calc_sum(), Style::Google, false).await, "Add two integers.");
    assert_eq!(client.calls(), 2);
    assert_eq!(gen.cache().len(), 1);
}

#[tokio::test]
async fn test_retries_and_bypass_carry_a_variation_hint() {
    let hint = "Emphasize the function's purpose.";
    let client = ScriptedClient::replying(&["", "Add two integers.", "Sum both integers."]);
    let config = GeneratorConfig::default().with_variation_seed_range(3..=3);
    let gen = DocstringGenerator::with_cache(client.clone(), Arc::new(DocstringCache::new()), config);

    assert_eq!(gen.generate(&calc_sum(), Style::Google, false).await, "Add two integers.");
    assert!(!client.prompt(0).contains(hint));
    assert!(client.prompt(1).ends_with(hint));

    assert_eq!(gen.generate(&calc_sum(), Style::Google, true).await, "Sum both integers.");
    assert!(client.prompt(2).ends_with(hint));
}

#[tokio::test]
async fn test_bare_this_summary_is_retried() {
    let client = ScriptedClient::replying(&["This", "\"\"\"This.\n\nArgs:\n    a (int): First.\"\"\"", "Add two integers."]);
    let gen = generator(&client);

    assert_eq!(gen.generate(&calc_sum(), Style::Google, false).await, "Add two integers.");
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn test_secondary_reply_is_reconciled() {
    let meta = FunctionMetadata::new("log_event").with_arg("event", Some("str"));
    let client = ScriptedClient::new(vec![
        Err(LLMError::Transport {
            provider: "groq".to_string(),
            reason: "timed out".to_string(),
        }),
        Ok("Logs an event.\n\nRaises:\n    KeyError: Missing.\n\nAttributes:\n    level (str): Level.\n\nReturns:\n    bool: Done.".to_string()),
    ]);

    let body = generator(&client).generate(&meta, Style::Google, false).await;
    assert_eq!(body, "Log an event.");
}

#[tokio::test]
async fn test_fallback_uses_secondary_model_call() {
    let client = ScriptedClient::new(vec![
        Err(LLMError::APIRequest {
            provider: "groq".to_string(),
            status_code: 503,
            body: "unavailable".to_string(),
        }),
        Ok("'''adds two numbers'''".to_string()),
    ]);
    let gen = generator(&client);

    let body = gen.generate(&calc_sum(), Style::Google, false).await;
    assert_eq!(body, "Add two numbers.");
    assert!(client.prompt(1).starts_with("Write a brief docstring"));
    assert!(gen.cache().is_empty());
}

#[tokio::test]
async fn test_missing_credential_goes_straight_to_template() {
    let client = ScriptedClient::new(vec![missing_key(), Ok("Unused.".to_string())]);
    let body = generator(&client).generate(&calc_sum(), Style::Numpy, false).await;

    assert_eq!(client.calls(), 1);
    assert!(body.starts_with("Calc sum summary.\n\nParameters\n----------\na : int"));
}

#[tokio::test]
async fn test_fallback_never_empty_for_minimal_metadata() {
    let config = GeneratorConfig::default().with_fallback_model_call(false);
    for style in [Style::Google, Style::Numpy, Style::Rest] {
        let client = ScriptedClient::new(vec![missing_key()]);
        let gen = DocstringGenerator::with_cache(client.clone(), Arc::new(DocstringCache::new()), config.clone());

        let body = gen.generate(&FunctionMetadata::new("f"), style, false).await;
        assert!(!body.trim().is_empty());
        assert!(!body.contains("Returns"));
        assert!(!body.contains("Raises"));
        assert!(!body.contains(":raises"));
    }
}

#[tokio::test]
async fn test_raises_kept_when_metadata_supports_it() {
    let meta = calc_sum().with_raise("ValueError");
    let client = ScriptedClient::replying(&[
        "Add two integers.\n\nArgs:\n    a (int): First.\n    b (int): Second.\n\nReturns:\n    int: Sum.\n\nRaises:\n    ValueError: If an input is negative.",
    ]);
    let body = generator(&client).generate(&meta, Style::Google, false).await;

    assert!(body.contains("Raises:\n    ValueError: If an input is negative."));
}

#[tokio::test]
async fn test_zero_retries_config() {
    let client = ScriptedClient::replying(&["", "Add two integers."]);
    let config = GeneratorConfig::default()
        .with_max_empty_retries(0)
        .with_fallback_model_call(false);
    let gen = DocstringGenerator::with_cache(client.clone(), Arc::new(DocstringCache::new()), config);

    let body = gen.generate(&calc_sum(), Style::Google, false).await;
    assert_eq!(client.calls(), 1);
    assert!(body.starts_with("Short description of `calc_sum`."));
}

#[tokio::test]
async fn test_shared_cache_across_generators() {
    let cache = Arc::new(DocstringCache::new());
    let first_client = ScriptedClient::replying(&["Add two integers."]);
    let second_client = ScriptedClient::replying(&["Unused."]);

    let first = DocstringGenerator::with_cache(first_client.clone(), cache.clone(), GeneratorConfig::default());
    let second = DocstringGenerator::with_cache(second_client.clone(), cache.clone(), GeneratorConfig::default());

    first.generate(&calc_sum(), Style::Google, false).await;
    assert_eq!(second.generate(&calc_sum(), Style::Google, false).await, "Add two integers.");
    assert_eq!(second_client.calls(), 0);
}
