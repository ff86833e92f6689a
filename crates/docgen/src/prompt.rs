//! Prompt construction for the model.
//!
//! Every prompt written here asks for the docstring body only. The source
//! grounded prompt also spells out which sections are allowed, since the
//! sanitizer downstream only removes what slips through.

use crate::metadata::{FunctionMetadata, Style};

/// Appended on retries and regenerations to move the model off its last answer.
const VARIATION_HINTS: [&str; 8] = [
    "",
    "Use clear and professional language.",
    "Focus on clarity and brevity.",
    "Emphasize the function's purpose.",
    "Use descriptive parameter explanations.",
    "Be precise about types and returns.",
    "Write in an informative tone.",
    "Prioritize readability.",
];

const GOOGLE_INSTRUCTIONS: &str = r#"Generate a Google-style docstring with these sections (if applicable):
- One-line summary (imperative mood, e.g., "Calculate the sum...")
- Blank line after summary
- Args: section with each parameter on its own line, indented with 4 spaces
- Returns: section describing what is returned
- Yields: section if the function yields values
- Raises: section listing exceptions that may be raised

Example format:
Short description of the function.

Args:
    param1 (type): Description of param1.
    param2 (type): Description of param2.

Returns:
    type: Description of return value.

Raises:
    ExceptionType: When this exception is raised."#;

const NUMPY_INSTRUCTIONS: &str = r#"Generate a NumPy-style docstring with these sections (if applicable):
- One-line summary
- Blank line after summary
- Parameters section with dashed underline
- Returns section with dashed underline
- Yields section if applicable
- Raises section if applicable

Example format:
Short description of the function.

Parameters
----------
param1 : type
    Description of param1.
param2 : type
    Description of param2.

Returns
-------
type
    Description of return value.

Raises
------
ExceptionType
    When this exception is raised."#;

const REST_INSTRUCTIONS: &str = r#"Generate a reStructuredText-style docstring with these sections (if applicable):
- One-line summary
- Blank line after summary
- :param directives for each parameter
- :returns: directive for return value
- :rtype: directive for return type
- :raises: directives for exceptions
- :yields: directive if applicable

Example format:
Short description of the function.

:param type param1: Description of param1.
:param type param2: Description of param2.
:returns: Description of return value.
:rtype: type
:raises ExceptionType: When this exception is raised."#;

const GROUNDING_RULES: &str = r#"RULES:
- Analyze the ACTUAL code to understand what it does
- Only include a Returns section if the function has an explicit return statement that returns a value
- Do NOT include "Returns: None" or any Returns section for functions that don't return anything
- Only include a Raises section if the code contains an explicit `raise ExceptionType` statement
- Do NOT include a Raises section for potential runtime errors like TypeError or AttributeError unless they are EXPLICITLY raised with the `raise` keyword in the function body
- Do NOT include "Raises: None" or any Raises section if no `raise` statements exist in the code
- Only include a Yields section if the code actually uses `yield`
- Infer parameter types from how they are used in the code
- Be accurate and concise
- Return ONLY the docstring content, no triple quotes
- Do NOT include any preamble like "Here's the docstring" or "Here is the Google-style docstring"
- Do NOT suggest code changes, refactoring, or improvements to the function
- Do NOT rewrite or modify the function in any way
- Do NOT include example code, usage examples, code fences or code snippets
- Do NOT include "Note:", "Example:", "See Also:", "Attributes:" or any other extra sections
- Do NOT include commentary about the function's design or structure
- ONLY output the docstring text itself, nothing else
- Start directly with the docstring summary line

PEP 257 COMPLIANCE (CRITICAL - follow these exactly):
- The first line MUST end with a period (.)
- The first line MUST be in IMPERATIVE mood (e.g., "Calculate the sum" NOT "Calculates the sum")
- The first word MUST be properly capitalized
- The first word should NOT be "This"
- The first line should NOT be the function signature
- If the docstring is short enough, keep it on one line
- Put a blank line between the summary line and the description or Args section
- Section headers must be properly formatted:
  * Section names capitalized (Args, Returns, Raises, Yields)
  * Blank line before each section
  * No blank lines between a section header and its content"#;

pub fn style_instructions(style: Style) -> &'static str {
    match style {
        Style::Numpy => NUMPY_INSTRUCTIONS,
        Style::Rest => REST_INSTRUCTIONS,
        Style::Google | Style::None => GOOGLE_INSTRUCTIONS,
    }
}

pub fn variation_hint(seed: u32) -> &'static str {
    VARIATION_HINTS[seed as usize % VARIATION_HINTS.len()]
}

/// Main generation prompt.
///
/// Seed 0 is the first attempt and adds no hint.
pub fn build_prompt(meta: &FunctionMetadata, style: Style, variation_seed: u32) -> String {
    let instructions = style_instructions(style);
    let hint = variation_hint(variation_seed);

    match meta.source() {
        Some(source) => build_source_prompt(source, instructions, hint),
        None => build_metadata_prompt(meta, instructions, hint),
    }
}

fn build_source_prompt(source: &str, instructions: &str, hint: &str) -> String {
    let mut prompt = format!(
        "Analyze this Python function and generate a docstring for it.\n\n\
         ```python\n{source}\n```\n\n\
         Generate a docstring in the following style:\n{instructions}\n\n\
         {GROUNDING_RULES}"
    );

    if !hint.is_empty() {
        prompt.push('\n');
        prompt.push_str(hint);
    }
    prompt.push('\n');
    prompt
}

fn build_metadata_prompt(meta: &FunctionMetadata, instructions: &str, hint: &str) -> String {
    let mut prompt = format!(
        "Generate a Python docstring for the function: {}\n\nParameters:\n",
        meta.display_name()
    );

    for arg in &meta.args_meta {
        let annotation = arg.annotation.as_deref().unwrap_or("infer from context");
        prompt.push_str(&format!("  - {}: {}\n", arg.name, annotation));
    }
    prompt.push('\n');

    if meta.has_return {
        let returns = meta.returns.as_deref().unwrap_or("has a return statement");
        prompt.push_str(&format!("Returns: {returns}\n"));
    } else {
        prompt.push_str("The function does not return a value; do not add a Returns section.\n");
    }

    if meta.raises.is_empty() {
        prompt.push_str("The function raises nothing explicitly; do not add a Raises section.\n");
    } else {
        prompt.push_str(&format!("Raises: {}\n", meta.raises.join(", ")));
    }

    if meta.has_yields {
        let yields = meta.yields.as_deref().unwrap_or("yields values");
        prompt.push_str(&format!("Yields: {yields}\n"));
    }

    prompt.push_str(&format!(
        "\n{instructions}\n\nReturn ONLY the docstring content, no triple quotes."
    ));

    if !hint.is_empty() {
        prompt.push('\n');
        prompt.push_str(hint);
    }
    prompt
}

/// Short, low-context prompt used by the first fallback tier.
pub fn build_fallback_prompt(meta: &FunctionMetadata, style: Style) -> String {
    match meta.source() {
        Some(source) => format!(
            "Write a brief docstring for this Python function. Return ONLY the docstring text, no quotes.\n\n\
             ```python\n{source}\n```\n\n\
             Style: {style}\n\
             Just write a one-line summary describing what this function does."
        ),
        None => {
            let args = meta
                .args_meta
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let args = if args.is_empty() { "none".to_string() } else { args };
            let name = if meta.name.is_empty() {
                "function"
            } else {
                meta.name.as_str()
            };

            format!(
                "Write a brief docstring for a function called '{name}' with parameters: {args}\n\n\
                 Style: {style}\n\
                 Just write a one-line summary describing what this function likely does based on its name."
            )
        }
    }
}

/// Prompt for a module-level summary docstring.
pub fn build_module_prompt(file_name: &str, module_name: &str, preview: &str) -> String {
    format!(
        r#"Generate a brief module-level docstring for this Python file.

File name: {file_name}
Module name: {module_name}

File content preview:
```python
{preview}
```

RULES:
- Write a concise one-line description of what this module does
- Use imperative mood (e.g., "Provide utilities for..." not "Provides utilities for...")
- First word must be capitalized
- First line MUST end with a period
- Do NOT start with "This module" or "This file"
- Do NOT include author info, dates, or copyright
- Return ONLY the docstring text, no triple quotes
- Keep it to 1-2 sentences maximum

Example good docstrings:
- "Provide core validation utilities for Python docstrings."
- "Define the main application entry point and UI components."
- "Implement database connection and query utilities."
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc_sum() -> FunctionMetadata {
        FunctionMetadata::new("calc_sum")
            .with_arg("a", Some("int"))
            .with_arg("b", None)
            .with_return(Some("int"))
    }

    #[test]
    fn test_style_specific_templates() {
        let meta = calc_sum().with_source("def calc_sum(a, b):\n    return a + b");

        let google = build_prompt(&meta, Style::Google, 0);
        assert!(google.contains("Google-style"));
        assert!(google.contains("Args:"));

        let numpy = build_prompt(&meta, Style::Numpy, 0);
        assert!(numpy.contains("NumPy-style"));
        assert!(numpy.contains("----------"));

        let rest = build_prompt(&meta, Style::Rest, 0);
        assert!(rest.contains("reStructuredText"));
        assert!(rest.contains(":param"));
    }

    #[test]
    fn test_source_prompt_embeds_code_and_rules() {
        let source = "def calc_sum(a, b):\n    return a + b";
        let prompt = build_prompt(&calc_sum().with_source(source), Style::Google, 0);

        assert!(prompt.contains(source));
        assert!(prompt.contains("```python"));
        assert!(prompt.contains("Only include a Raises section"));
        assert!(prompt.contains("IMPERATIVE"));
        assert!(prompt.contains("should NOT be \"This\""));
        assert!(!prompt.contains("infer from context"));
    }

    #[test]
    fn test_metadata_prompt_lists_known_facts() {
        let meta = calc_sum().with_raise("ValueError").with_yields(Some("int"));
        let prompt = build_prompt(&meta, Style::Google, 0);

        assert!(prompt.contains("function: calc_sum"));
        assert!(prompt.contains("  - a: int"));
        assert!(prompt.contains("  - b: infer from context"));
        assert!(prompt.contains("Returns: int"));
        assert!(prompt.contains("Raises: ValueError"));
        assert!(prompt.contains("Yields: int"));
        assert!(!prompt.contains("```"));
    }

    #[test]
    fn test_metadata_prompt_forbids_unsupported_sections() {
        let prompt = build_prompt(&FunctionMetadata::new("log_event"), Style::Numpy, 0);
        assert!(prompt.contains("do not add a Returns section"));
        assert!(prompt.contains("do not add a Raises section"));
        assert!(!prompt.contains("Yields:"));
    }

    #[test]
    fn test_variation_seed_appends_hint() {
        let meta = calc_sum();
        let first = build_prompt(&meta, Style::Google, 0);
        let varied = build_prompt(&meta, Style::Google, 2);

        assert_ne!(first, varied);
        assert!(varied.ends_with("Focus on clarity and brevity."));
        assert_eq!(variation_hint(8), "");
        assert_eq!(variation_hint(9), VARIATION_HINTS[1]);
    }

    #[test]
    fn test_fallback_prompt_variants() {
        let bare = build_fallback_prompt(&FunctionMetadata::new("f"), Style::Rest);
        assert!(bare.contains("called 'f' with parameters: none"));
        assert!(bare.contains("Style: rest"));

        let with_source =
            build_fallback_prompt(&calc_sum().with_source("def calc_sum(a, b): ..."), Style::Google);
        assert!(with_source.contains("def calc_sum(a, b): ..."));

        let named = build_fallback_prompt(&calc_sum(), Style::Google);
        assert!(named.contains("parameters: a, b"));
    }

    #[test]
    fn test_module_prompt() {
        let prompt = build_module_prompt("utils.py", "utils", "import os");
        assert!(prompt.contains("File name: utils.py"));
        assert!(prompt.contains("Module name: utils"));
        assert!(prompt.contains("import os"));
    }
}
