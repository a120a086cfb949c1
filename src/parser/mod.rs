//! Tool-call parser - detects tool invocations embedded in model output
//!
//! The model weaves tool calls into its streamed text in two syntaxes: a
//! JSON object `{"tool": "...", "args": {...}}` and a bracket shorthand
//! `[[GREP:query]]`. Both are matched with hand-written scanners rather than
//! regexes: the JSON form needs brace-depth tracking so nested objects in
//! `args` don't end the match early, and a trailing object that is still
//! streaming in must not be reported until its closing brace arrives.

use serde_json::Value;
use tracing::debug;

/// Bracket shorthand tags and the canonical call each maps to
const BRACKET_TAGS: &[(&str, &str, &str)] = &[
    ("GREP", "grep", "query"),
    ("FIND", "find_by_name", "pattern"),
    ("LIST_DIR", "list_dir", "path"),
    ("READ", "read_file", "path"),
    ("READ_FILE", "read_file", "path"),
];

/// A tool invocation detected in model-generated text
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Tool name as written (canonicalized for shorthand calls)
    pub tool: String,

    /// Argument object
    pub args: Value,

    /// Exact source substring, reproducible at `start_index`
    pub raw: String,

    /// Byte offset of the call in the scanned text
    pub start_index: usize,
}

impl ToolCall {
    /// Key identifying this call for dedup purposes
    pub fn dedup_key(&self) -> String {
        format!("{}:{}:{}", self.tool, self.args, self.start_index)
    }

    /// Byte offset one past the end of the call's source span
    pub fn end_index(&self) -> usize {
        self.start_index + self.raw.len()
    }
}

/// Scan text for tool calls, returned in document order with exact spans
pub fn parse_tool_calls(text: &str) -> Vec<ToolCall> {
    let bytes = text.as_bytes();
    let mut calls = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                if let Some(end) = scan_json_object(text, i) {
                    if let Some(call) = json_candidate(&text[i..end], i) {
                        debug!(tool = %call.tool, start = i, "parse_tool_calls: json call");
                        calls.push(call);
                        i = end;
                        continue;
                    }
                }
                // Balanced-but-invalid candidates are skipped, not errors;
                // rescanning from inside still finds calls nested in prose braces.
                i += 1;
            }
            b'[' if bytes.get(i + 1) == Some(&b'[') => {
                if let Some((call, end)) = scan_bracket_call(text, i) {
                    debug!(tool = %call.tool, start = i, "parse_tool_calls: bracket call");
                    calls.push(call);
                    i = end;
                    continue;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    calls
}

/// Cheap existence check; agrees with [`parse_tool_calls`] on non-emptiness
pub fn has_tool_calls(text: &str) -> bool {
    if !text.contains("\"tool\"") && !text.contains("[[") {
        return false;
    }
    !parse_tool_calls(text).is_empty()
}

/// Remove every call span and collapse the blank holes left behind
pub fn strip_tool_calls(text: &str) -> String {
    let calls = parse_tool_calls(text);
    collapse_blank_lines(&remove_spans(text, &calls))
}

/// Scan a balanced JSON object starting at `start` (which must be `{`)
///
/// Returns the exclusive end offset, or None while the object is unclosed
/// (e.g. still streaming in). String- and escape-aware so braces inside
/// string values don't affect depth.
fn scan_json_object(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (off, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + off + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Validate a balanced candidate as a call: valid JSON shaped
/// `{"tool": <string>, "args": <object>}`. Extra keys are tolerated.
fn json_candidate(raw: &str, start_index: usize) -> Option<ToolCall> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;
    let tool = obj.get("tool")?.as_str()?;
    let args = obj.get("args")?;
    if !args.is_object() || tool.is_empty() {
        return None;
    }

    Some(ToolCall {
        tool: tool.to_string(),
        args: args.clone(),
        raw: raw.to_string(),
        start_index,
    })
}

fn bracket_tool(tag: &str) -> Option<(&'static str, &'static str)> {
    BRACKET_TAGS
        .iter()
        .find(|(t, _, _)| *t == tag)
        .map(|(_, tool, key)| (*tool, *key))
}

/// Scan a `[[TAG:arg]]` shorthand call starting at `start` (first `[`)
///
/// Grammar: TAG is uppercase ASCII/underscore and must be a known tag; arg
/// is everything to the first `]]`, trimmed, non-empty. Unknown tags and
/// unterminated candidates are prose, not calls.
fn scan_bracket_call(text: &str, start: usize) -> Option<(ToolCall, usize)> {
    let rest = &text[start + 2..];
    let colon = rest.find(':')?;
    let tag = &rest[..colon];
    if tag.is_empty() || !tag.bytes().all(|b| b.is_ascii_uppercase() || b == b'_') {
        return None;
    }
    let (tool, arg_key) = bracket_tool(tag)?;

    let after = &rest[colon + 1..];
    let close = after.find("]]")?;
    let arg = after[..close].trim();
    if arg.is_empty() {
        return None;
    }

    let end = start + 2 + colon + 1 + close + 2;
    let call = ToolCall {
        tool: tool.to_string(),
        args: serde_json::json!({ arg_key: arg }),
        raw: text[start..end].to_string(),
        start_index: start,
    };
    Some((call, end))
}

/// Rebuild text with every call span removed
fn remove_spans(text: &str, calls: &[ToolCall]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for call in calls {
        out.push_str(&text[pos..call.start_index]);
        pos = call.end_index();
    }
    out.push_str(&text[pos..]);
    out
}

/// Cap newline runs at two, so call removal leaves at most one blank line
pub(crate) fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            run += 1;
            if run <= 2 {
                out.push('\n');
            }
        } else {
            run = 0;
            out.push(ch);
        }
    }
    out
}

/// Incremental visible-text filter for a streaming model turn
///
/// Feeds on raw deltas and returns only the text that is safe to show:
/// complete call spans are removed, a trailing region that may still become
/// a call is held back until it resolves, and blank runs are collapsed.
/// Emitted text is monotone - nothing handed out is ever taken back.
#[derive(Debug, Default)]
pub struct StreamFilter {
    raw: String,
    emitted: String,
}

impl StreamFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw delta, returning newly visible text (possibly empty)
    pub fn push(&mut self, delta: &str) -> String {
        self.raw.push_str(delta);
        let visible = self.visible_prefix();
        self.take_delta(visible)
    }

    /// Flush once the turn has settled; held-back text that never became a
    /// call is released here
    pub fn finish(&mut self) -> String {
        let visible = strip_tool_calls(&self.raw);
        self.take_delta(visible)
    }

    /// Full raw (unfiltered) text accumulated so far
    pub fn raw(&self) -> &str {
        &self.raw
    }

    fn take_delta(&mut self, visible: String) -> String {
        if visible.len() > self.emitted.len() && visible.starts_with(&self.emitted) {
            let delta = visible[self.emitted.len()..].to_string();
            self.emitted = visible;
            return delta;
        }
        String::new()
    }

    fn visible_prefix(&self) -> String {
        let calls = parse_tool_calls(&self.raw);
        let hold = hold_back_index(&self.raw, &calls);
        let safe_calls: Vec<ToolCall> = calls.into_iter().filter(|c| c.end_index() <= hold).collect();
        collapse_blank_lines(&remove_spans(&self.raw[..hold], &safe_calls))
    }
}

/// First offset that must be withheld from the visible stream: the earliest
/// unclosed JSON object or a still-open bracket candidate. Complete call
/// spans are jumped over, matching what the parser would report.
fn hold_back_index(text: &str, calls: &[ToolCall]) -> usize {
    let bytes = text.as_bytes();
    let mut pos = 0usize;
    let mut spans = calls.iter().peekable();

    while pos < bytes.len() {
        if let Some(c) = spans.peek() {
            if pos == c.start_index {
                pos = c.end_index();
                spans.next();
                continue;
            }
        }
        match bytes[pos] {
            b'{' => {
                if scan_json_object(text, pos).is_none() {
                    return pos;
                }
                pos += 1;
            }
            b'[' => {
                if bracket_candidate_open(&text[pos..]) {
                    return pos;
                }
                pos += 1;
            }
            _ => pos += 1,
        }
    }

    text.len()
}

/// Could `rest` (starting at `[`) still grow into a bracket call?
fn bracket_candidate_open(rest: &str) -> bool {
    let r = &rest[1..];
    if r.is_empty() {
        // Lone trailing "[" - the next delta may bring the second bracket
        return true;
    }
    if !r.starts_with('[') {
        return false;
    }
    let body = &r[1..];
    match body.find(|c: char| !(c.is_ascii_uppercase() || c == '_')) {
        None => is_known_tag_prefix(body),
        Some(te) => {
            let tag = &body[..te];
            if !body[te..].starts_with(':') {
                return false;
            }
            if bracket_tool(tag).is_none() {
                return false;
            }
            // Known tag, colon seen: open until the closing "]]" arrives
            !body[te + 1..].contains("]]")
        }
    }
}

fn is_known_tag_prefix(partial: &str) -> bool {
    BRACKET_TAGS.iter().any(|(tag, _, _)| tag.starts_with(partial))
}
