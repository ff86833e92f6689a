//! Generation orchestrator, the public entry point for docstring bodies.

use crate::cache::{DocstringCache, Fingerprint};
use crate::config::GeneratorConfig;
use crate::fallback::FallbackGenerator;
use crate::metadata::{FunctionMetadata, Style};
use crate::module_doc;
use crate::prompt::build_prompt;
use crate::sanitize::sanitize;
use crate::style_fix::{apply_style_fixes, summary_is_usable};
use common::{LLMError, OperationTimer, RecoveryStrategy, RequestContext};
use llm::CompletionClient;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Outcome of one primary generation attempt
enum Attempt {
    Body(String),
    Empty,
    Failed(LLMError),
}

/// Sequences prompt, model call, cleanup and caching for each function.
///
/// Holds the cache by `Arc` so several generators (or a long-lived session)
/// can share it.
pub struct DocstringGenerator {
    client: Arc<dyn CompletionClient>,
    cache: Arc<DocstringCache>,
    config: GeneratorConfig,
}

impl DocstringGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self::with_cache(client, Arc::new(DocstringCache::new()), GeneratorConfig::default())
    }

    pub fn with_cache(
        client: Arc<dyn CompletionClient>,
        cache: Arc<DocstringCache>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            client,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<DocstringCache> {
        &self.cache
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Docstring body for `meta`, without delimiters.
    ///
    /// Never fails: model trouble degrades to the fallback path. With
    /// `bypass_cache` the cached body is ignored and replaced by a fresh one.
    pub async fn generate(&self, meta: &FunctionMetadata, style: Style, bypass_cache: bool) -> String {
        if style.is_none() {
            return String::new();
        }

        let ctx = RequestContext::new();
        let span = info_span!(
            "generate_docstring",
            request_id = %ctx.request_id,
            function = %meta.display_name(),
            style = %style
        );

        self.generate_inner(meta, style, bypass_cache)
            .instrument(span)
            .await
    }

    async fn generate_inner(&self, meta: &FunctionMetadata, style: Style, bypass_cache: bool) -> String {
        let fingerprint = Fingerprint::of(meta, style);

        if !bypass_cache {
            if let Some(cached) = self.cache.get(&fingerprint) {
                debug!(fingerprint = %fingerprint, "Docstring cache hit");
                return cached;
            }
        }

        let mut timer = OperationTimer::new("generate_docstring");
        timer.add_field("function", meta.display_name());
        timer.add_field("style", style.as_str());

        let mut retries = 0u32;
        loop {
            let seed = if bypass_cache || retries > 0 {
                self.random_seed()
            } else {
                0
            };
            timer.add_field("attempts", retries + 1);

            match self.attempt(meta, style, seed).await {
                Attempt::Body(body) => {
                    self.cache.insert(fingerprint, body.clone());
                    info!(retries = retries, chars = body.len(), "Docstring generated");
                    timer.finish();
                    return body;
                }
                Attempt::Empty if retries < self.config.max_empty_retries => {
                    retries += 1;
                    warn!(
                        retry = retries,
                        max_retries = self.config.max_empty_retries,
                        "Empty docstring after cleanup, retrying"
                    );
                }
                Attempt::Empty => {
                    warn!("Empty docstring after all retries, falling back");
                    let body = self.fallback(meta, style, true).await;
                    timer.finish_with_result(Err::<(), _>("empty model output"));
                    return body;
                }
                Attempt::Failed(e) => match e.recovery_strategy() {
                    RecoveryStrategy::Retry { max_attempts }
                        if retries < max_attempts.min(self.config.max_empty_retries) =>
                    {
                        retries += 1;
                        warn!(retry = retries, error = %e, "Model returned nothing, retrying");
                    }
                    _ => {
                        error!(error = %e, "Model call failed, falling back");
                        let body = self.fallback(meta, style, !e.is_configuration()).await;
                        timer.finish_with_result(Err::<(), _>(e));
                        return body;
                    }
                },
            }
        }
    }

    async fn attempt(&self, meta: &FunctionMetadata, style: Style, seed: u32) -> Attempt {
        let prompt = build_prompt(meta, style, seed);
        debug!(seed = seed, prompt_chars = prompt.len(), "Sending generation prompt");

        match self.client.complete(&prompt).await {
            Ok(raw) => {
                let body = apply_style_fixes(&sanitize(&raw, meta, style));
                if !summary_is_usable(&body) {
                    return Attempt::Empty;
                }
                Attempt::Body(body)
            }
            Err(e) => Attempt::Failed(e),
        }
    }

    async fn fallback(&self, meta: &FunctionMetadata, style: Style, model_reachable: bool) -> String {
        let model_call = self.config.fallback_model_call && model_reachable;
        FallbackGenerator::new(self.client.as_ref(), model_call)
            .generate(meta, style)
            .await
    }

    fn random_seed(&self) -> u32 {
        let range = self.config.variation_seed_range.clone();
        if range.is_empty() {
            return *range.start();
        }
        rand::thread_rng().gen_range(range)
    }

    /// Module-level docstring for `file_path`.
    ///
    /// An empty `preview_text` means the file is read from disk; an unreadable
    /// file yields an empty string.
    pub async fn generate_module(&self, file_path: impl AsRef<Path>, preview_text: &str) -> String {
        let ctx = RequestContext::new();
        let path = file_path.as_ref();
        let span = info_span!(
            "generate_module_docstring",
            request_id = %ctx.request_id,
            file = %path.display()
        );

        module_doc::generate_module(
            self.client.as_ref(),
            path,
            preview_text,
            self.config.module_preview_lines,
        )
        .instrument(span)
        .await
    }
}
