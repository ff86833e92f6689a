//! Cleanup of raw model output.
//!
//! Model text is untrusted. Each stage below is a pure `&str -> String`
//! transform that leaves already clean input alone, and none of them can
//! fail: anything unexpected is passed through untouched.

use crate::metadata::{FunctionMetadata, Style};
use once_cell::sync::Lazy;
use regex::Regex;

const PREAMBLES: [&str; 10] = [
    "Here's the generated docstring for the given function:",
    "Here's the generated docstring:",
    "Here's the docstring:",
    "Here is the generated docstring for the given function:",
    "Here is the generated docstring:",
    "Here is the docstring:",
    "Here's a docstring for the function:",
    "Here is a docstring for the function:",
    "Generated docstring:",
    "Short description of the function.",
];

static GOOGLE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(args|arguments|parameters|params|keyword args|keyword arguments|other parameters|returns?|raises?|yields?|attributes|examples?|notes?|see also|warnings?)\s*:",
    )
    .expect("static regex")
});

static NUMPY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(parameters|other parameters|returns?|raises?|yields?|attributes|examples?|notes?|see also|warnings?)\s*:?\s*$",
    )
    .expect("static regex")
});

static REST_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([A-Za-z]+)([^:]*):").expect("static regex"));

static REST_ADMONITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\.\.\s+(note|seealso|warning|example)::").expect("static regex")
});

/// A bare exception name, or a `Name: description` entry.
static EXCEPTION_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]\w*(?:Error|Exception))\s*(?::.*)?$").expect("static regex")
});

/// Kind of a recognised docstring section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Args,
    Returns,
    Raises,
    Yields,
    Attributes,
    Example,
    Note,
    SeeAlso,
    Warnings,
    Other,
}

impl SectionKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "args" | "arguments" | "parameters" | "params" | "param" | "parameter" | "arg"
            | "argument" | "key" | "keyword" | "keyword args" | "keyword arguments"
            | "other parameters" | "type" => SectionKind::Args,
            "returns" | "return" | "rtype" => SectionKind::Returns,
            "raises" | "raise" | "raised" | "except" | "exception" => SectionKind::Raises,
            "yields" | "yield" | "ytype" => SectionKind::Yields,
            "attributes" | "attribute" | "ivar" | "var" | "cvar" => SectionKind::Attributes,
            "examples" | "example" => SectionKind::Example,
            "notes" | "note" => SectionKind::Note,
            "see also" | "seealso" => SectionKind::SeeAlso,
            "warnings" | "warning" => SectionKind::Warnings,
            _ => SectionKind::Other,
        }
    }

    /// Whether the function's metadata supports a section of this kind.
    pub fn is_supported_by(&self, meta: &FunctionMetadata) -> bool {
        match self {
            SectionKind::Args | SectionKind::Warnings | SectionKind::Other => true,
            SectionKind::Returns => meta.has_return,
            SectionKind::Raises => !meta.raises.is_empty(),
            SectionKind::Yields => meta.has_yields,
            SectionKind::Attributes
            | SectionKind::Example
            | SectionKind::Note
            | SectionKind::SeeAlso => false,
        }
    }
}

/// A section header found at some line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    pub kind: SectionKind,
    /// Exception named by a reST `:raises X:` directive
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    NoSection,
    InValidSection(SectionKind),
    InSkippedSection(SectionKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    Keep,
    Drop,
}

/// Line scanner deciding, line by line, what survives section reconciliation.
pub struct SectionScanner<'m> {
    meta: &'m FunctionMetadata,
    style: Style,
    state: ScanState,
    /// Index of the header that opened the current skipped section
    header_line: Option<usize>,
}

impl<'m> SectionScanner<'m> {
    pub fn new(meta: &'m FunctionMetadata, style: Style) -> Self {
        Self {
            meta,
            style,
            state: ScanState::NoSection,
            header_line: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Decide the fate of `lines[index]`. Calls must be made in order.
    pub fn decide(&mut self, lines: &[&str], index: usize) -> LineAction {
        let line = lines[index];

        if let Some(header) = detect_header(self.style, lines, index) {
            let valid = self.header_is_valid(&header);
            if valid {
                self.state = ScanState::InValidSection(header.kind);
                self.header_line = None;
                return LineAction::Keep;
            }
            self.state = ScanState::InSkippedSection(header.kind);
            self.header_line = Some(index);
            return LineAction::Drop;
        }

        let ScanState::InSkippedSection(_) = self.state else {
            return LineAction::Keep;
        };

        if self.style == Style::Numpy {
            // NumPy entries are not indented; the section runs to the next header.
            return LineAction::Drop;
        }

        if self.is_underline_after_header(lines, index) || is_indented(line) {
            return LineAction::Drop;
        }

        if line.trim().is_empty() {
            return match next_non_blank(lines, index) {
                Some(next) if is_indented(next) => LineAction::Drop,
                Some(_) => {
                    self.end_section();
                    LineAction::Keep
                }
                None => LineAction::Drop,
            };
        }

        self.end_section();
        LineAction::Keep
    }

    fn header_is_valid(&self, header: &SectionHeader) -> bool {
        if !header.kind.is_supported_by(self.meta) {
            return false;
        }
        match (&header.kind, &header.target) {
            (SectionKind::Raises, Some(exception)) => self.meta.raises_exception(exception),
            _ => true,
        }
    }

    fn is_underline_after_header(&self, lines: &[&str], index: usize) -> bool {
        self.header_line == Some(index.wrapping_sub(1)) && is_dashed_underline(lines[index])
    }

    fn end_section(&mut self) {
        self.state = ScanState::NoSection;
        self.header_line = None;
    }
}

/// Recognise a section header at `lines[index]` for the given style.
///
/// The summary line is never a header, and neither is an indented line.
pub fn detect_header(style: Style, lines: &[&str], index: usize) -> Option<SectionHeader> {
    let line = lines[index];
    if index == 0 || is_indented(line) || line.trim().is_empty() {
        return None;
    }
    let stripped = line.trim_end();

    match style {
        Style::Numpy => {
            if let Some(caps) = NUMPY_HEADER.captures(stripped) {
                return Some(SectionHeader {
                    kind: SectionKind::from_name(&caps[1]),
                    target: None,
                });
            }
            let underlined = lines
                .get(index + 1)
                .map(|next| is_dashed_underline(next))
                .unwrap_or(false);
            underlined.then(|| SectionHeader {
                kind: SectionKind::from_name(stripped.trim_end_matches(':')),
                target: None,
            })
        }
        Style::Rest => {
            if let Some(caps) = REST_ADMONITION.captures(stripped) {
                return Some(SectionHeader {
                    kind: SectionKind::from_name(&caps[1]),
                    target: None,
                });
            }
            REST_DIRECTIVE.captures(stripped).map(|caps| {
                let kind = SectionKind::from_name(&caps[1]);
                let target = match kind {
                    SectionKind::Raises => caps[2].split_whitespace().last().map(str::to_string),
                    _ => None,
                };
                SectionHeader { kind, target }
            })
        }
        Style::Google | Style::None => GOOGLE_HEADER.captures(stripped).map(|caps| SectionHeader {
            kind: SectionKind::from_name(&caps[1]),
            target: None,
        }),
    }
}

/// Run every stage in order and trim the result.
pub fn sanitize(raw: &str, meta: &FunctionMetadata, style: Style) -> String {
    let text = strip_quote_layer(raw);
    // A preamble can sit outside the quotes.
    let text = strip_quote_layer(&strip_preamble(&text));
    let text = truncate_at_noise(&text);
    let text = normalize_indentation(&text);
    let text = collapse_blank_lines(&reconcile_sections(&text, meta, style));
    let text = collapse_blank_lines(&sweep_hallucinations(&text, meta));
    let text = collapse_blank_lines(&drop_empty_attributes(&text));
    let text = collapse_blank_lines(&truncate_at_note(&text));
    text.trim().to_string()
}

/// Stage 1: remove one layer of enclosing `"""` / `'''`, raw prefix included.
pub fn strip_quote_layer(text: &str) -> String {
    let trimmed = text.trim();

    let unprefixed = match trimmed.strip_prefix(['r', 'R']) {
        Some(rest) if rest.starts_with("\"\"\"") || rest.starts_with("'''") => rest,
        _ => trimmed,
    };

    for delimiter in ["\"\"\"", "'''"] {
        if let Some(inner) = unprefixed.strip_prefix(delimiter) {
            let inner = inner.strip_suffix(delimiter).unwrap_or(inner);
            return inner.trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Stage 2: drop the first known preamble phrase, case-insensitively.
pub fn strip_preamble(text: &str) -> String {
    let trimmed = text.trim_start();

    for preamble in PREAMBLES {
        let matches = trimmed
            .get(..preamble.len())
            .map(|head| head.eq_ignore_ascii_case(preamble))
            .unwrap_or(false);
        if matches {
            return trimmed[preamble.len()..].trim().to_string();
        }
    }

    text.to_string()
}

/// Stage 3: cut at the first code fence or leftover triple quote.
pub fn truncate_at_noise(text: &str) -> String {
    let cut = ["```", "\"\"\"", "'''"]
        .iter()
        .filter_map(|marker| text.find(marker))
        .min();

    match cut {
        Some(position) => text[..position].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Remove the common indentation of all lines after the first, and the
/// leading whitespace of the first. Tabs count as four spaces.
pub fn normalize_indentation(text: &str) -> String {
    let lines: Vec<String> = text.lines().map(expand_leading_tabs).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| indentation(l))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.trim_start().to_string()
            } else if line.trim().is_empty() {
                String::new()
            } else {
                line[margin..].trim_end().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stage 4: delete sections the metadata does not support.
pub fn reconcile_sections(text: &str, meta: &FunctionMetadata, style: Style) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut scanner = SectionScanner::new(meta, style);

    let kept: Vec<&str> = (0..lines.len())
        .filter(|&i| scanner.decide(&lines, i) == LineAction::Keep)
        .map(|i| lines[i])
        .collect();

    kept.join("\n")
}

/// Stage 5: drop bare "None" lines and stray exception entries the function
/// never raises, whether bare (`KeyError`) or described (`KeyError: ...`).
pub fn sweep_hallucinations(text: &str, meta: &FunctionMetadata) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut kept = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let stripped = lines[i].trim();

        if stripped == "None" {
            i += 1;
            continue;
        }

        let stray = EXCEPTION_ENTRY
            .captures(stripped)
            .map(|caps| !meta.raises_exception(&caps[1]))
            .unwrap_or(false);
        if stray {
            i += 1;
            while i < lines.len() && !lines[i].trim().is_empty() && is_indented(lines[i]) {
                i += 1;
            }
            continue;
        }

        kept.push(lines[i]);
        i += 1;
    }

    kept.join("\n")
}

/// Stage 6: remove an Attributes header whose body is empty or "None".
pub fn drop_empty_attributes(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut kept = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let stripped = lines[i].trim().trim_end_matches(':');
        if !stripped.eq_ignore_ascii_case("attributes") {
            kept.push(lines[i]);
            i += 1;
            continue;
        }

        let mut j = i + 1;
        if j < lines.len() && is_dashed_underline(lines[j]) {
            j += 1;
        }
        while j < lines.len() && lines[j].trim().is_empty() {
            j += 1;
        }

        let body_is_empty = match lines.get(j) {
            None => true,
            Some(next) if next.trim() == "None" => {
                j += 1;
                true
            }
            Some(next) => {
                !is_indented(next)
                    && (GOOGLE_HEADER.is_match(next.trim())
                        || NUMPY_HEADER.is_match(next.trim()))
            }
        };

        if body_is_empty {
            i = j;
        } else {
            kept.push(lines[i]);
            i += 1;
        }
    }

    kept.join("\n")
}

/// Stage 7: a line opening with "Note:" or "Note " ends the docstring.
pub fn truncate_at_note(text: &str) -> String {
    text.lines()
        .take_while(|line| {
            let stripped = line.trim_start();
            !(stripped.starts_with("Note:") || stripped.starts_with("Note "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stage 8: squeeze runs of blank lines down to one.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            out.push("");
        } else {
            blank_run = 0;
            out.push(line);
        }
    }

    out.join("\n")
}

fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

fn is_dashed_underline(line: &str) -> bool {
    let stripped = line.trim();
    stripped.len() >= 3 && stripped.chars().all(|c| c == '-')
}

fn next_non_blank<'a>(lines: &[&'a str], index: usize) -> Option<&'a str> {
    lines[index + 1..]
        .iter()
        .copied()
        .find(|l| !l.trim().is_empty())
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn expand_leading_tabs(line: &str) -> String {
    let body = line.trim_start_matches([' ', '\t']);
    let prefix = &line[..line.len() - body.len()];
    if !prefix.contains('\t') {
        return line.to_string();
    }
    let width: usize = prefix.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum();
    format!("{}{}", " ".repeat(width), body)
}
