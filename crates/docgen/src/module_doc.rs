//! Module-level docstrings: a one or two sentence summary, no sections.

use crate::prompt::build_module_prompt;
use crate::sanitize::strip_quote_layer;
use crate::style_fix::{apply_style_fixes, summary_is_usable};
use common::{FileSystemError, FileSystemResult};
use llm::CompletionClient;
use std::path::Path;
use tracing::{debug, warn};

/// File name and module name (file stem) of `path`.
pub fn module_names(path: &Path) -> (String, String) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let module_name = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (file_name, module_name)
}

/// "string_utils" -> "String Utils module."
pub fn template_module_docstring(module_name: &str) -> String {
    let title = module_name
        .replace('_', " ")
        .split(' ')
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    format!("{title} module.")
}

/// First `max_lines` lines of `content`.
pub fn preview_lines(content: &str, max_lines: usize) -> String {
    content.split('\n').take(max_lines).collect::<Vec<_>>().join("\n")
}

pub async fn read_source(path: &Path) -> FileSystemResult<String> {
    let display = path.display().to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FileSystemError::from_io("read", &display, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Drop a chatty lead-in line such as "Here is a docstring for utils.py:".
fn drop_here_line(content: &str) -> String {
    let starts_with_here = content
        .get(..4)
        .map(|head| head.eq_ignore_ascii_case("here"))
        .unwrap_or(false);
    if !starts_with_here {
        return content.to_string();
    }
    match content.split_once('\n') {
        Some((_, rest)) => rest.trim().to_string(),
        None => content.to_string(),
    }
}

pub(crate) async fn generate_module(
    client: &dyn CompletionClient,
    path: &Path,
    preview_text: &str,
    max_lines: usize,
) -> String {
    let content = if preview_text.is_empty() {
        match read_source(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Cannot read module source");
                return String::new();
            }
        }
    } else {
        preview_text.to_string()
    };

    let (file_name, module_name) = module_names(path);
    let prompt = build_module_prompt(&file_name, &module_name, &preview_lines(&content, max_lines));

    match client.complete(&prompt).await {
        Ok(raw) => {
            let body = drop_here_line(&strip_quote_layer(&raw));
            let body = apply_style_fixes(&body);
            let body = body.trim().to_string();
            if !summary_is_usable(&body) {
                debug!(module = %module_name, "No usable module docstring, using template");
                return template_module_docstring(&module_name);
            }
            body
        }
        Err(e) => {
            warn!(module = %module_name, error = %e, "Module docstring generation failed");
            template_module_docstring(&module_name)
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
