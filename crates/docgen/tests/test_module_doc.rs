use async_trait::async_trait;
use common::{LLMError, LLMResult};
use docgen::{DocstringCache, DocstringGenerator, GeneratorConfig};
use llm::CompletionClient;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

struct EchoClient {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl EchoClient {
    fn new(reply: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionClient for EchoClient {
    async fn complete(&self, prompt: &str) -> LLMResult<String> {
        self.prompts.lock().push(prompt.to_string());
        self.reply.clone().ok_or_else(|| LLMError::Transport {
            provider: "echo".to_string(),
            reason: "offline".to_string(),
        })
    }
}

fn source_file(lines: usize) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("string_utils")
        .suffix(".py")
        .tempfile()
        .unwrap();
    for i in 0..lines {
        writeln!(file, "VALUE_{i} = {i}").unwrap();
    }
    file
}

#[tokio::test]
async fn test_module_docstring_reads_file_and_fixes_first_line() {
    let file = source_file(80);
    let client = EchoClient::new(Some("Here is the module docstring:\ncalculates string metrics"));
    let gen = DocstringGenerator::new(client.clone());

    let body = gen.generate_module(file.path(), "").await;
    assert_eq!(body, "Calculate string metrics.");

    let prompt = client.prompts.lock()[0].clone();
    assert!(prompt.contains("VALUE_49 = 49"));
    assert!(!prompt.contains("VALUE_50 = 50"));
    assert!(prompt.contains("Module name: string_utils"));
}

#[tokio::test]
async fn test_module_docstring_uses_given_preview() {
    let client = EchoClient::new(Some("\"\"\"This module parses config files\"\"\""));
    let gen = DocstringGenerator::new(client.clone());

    let body = gen.generate_module("/nowhere/config_loader.py", "import json").await;
    assert_eq!(body, "Parse config files.");
    assert!(client.prompts.lock()[0].contains("import json"));
}

#[tokio::test]
async fn test_module_docstring_falls_back_to_title() {
    let client = EchoClient::new(None);
    let gen = DocstringGenerator::new(client);

    let body = gen.generate_module("/src/string_utils.py", "import re").await;
    assert_eq!(body, "String Utils module.");
}

#[tokio::test]
async fn test_unreadable_module_yields_empty() {
    let client = EchoClient::new(Some("Unused."));
    let gen = DocstringGenerator::new(client.clone());

    assert_eq!(gen.generate_module("/definitely/missing.py", "").await, "");
    assert!(client.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_preview_line_limit_is_configurable() {
    let file = source_file(20);
    let client = EchoClient::new(Some("Define constants."));
    let config = GeneratorConfig::default().with_module_preview_lines(5);
    let gen = DocstringGenerator::with_cache(client.clone(), Arc::new(DocstringCache::new()), config);

    gen.generate_module(file.path(), "").await;
    let prompt = client.prompts.lock()[0].clone();
    assert!(prompt.contains("VALUE_4 = 4"));
    assert!(!prompt.contains("VALUE_5 = 5"));
}
