//! Docstring generation pipeline.
//!
//! Metadata goes in, a docstring body comes out. The body never contains
//! the delimiters and never fails to come out: model errors degrade to a
//! deterministic template.

pub mod cache;
pub mod config;
pub mod fallback;
pub mod generator;
pub mod metadata;
mod module_doc;
pub mod prompt;
pub mod sanitize;
pub mod style_fix;

pub use cache::{DocstringCache, Fingerprint};
pub use config::GeneratorConfig;
pub use fallback::{render_template, FallbackGenerator};
pub use generator::DocstringGenerator;
pub use metadata::{ArgMeta, FunctionMetadata, Style, UnknownStyle};
pub use module_doc::{preview_lines, template_module_docstring};
pub use sanitize::sanitize;
pub use style_fix::{apply_style_fixes, summary_is_usable};
