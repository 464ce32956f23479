/// Helpers for pulling a JSON object out of free-form model output.
///
/// Models wrap their answer in prose, markdown fences, or leave small syntax
/// slips behind. The extractor scans for balanced `{ ... }` fragments and
/// returns the first one that parses, after light repairs.
use anyhow::Result;

/// Remove trailing commas before `}` or `]` (invalid but common in LLM outputs)
pub fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &ch) in chars.iter().enumerate() {
        if escape_next {
            escape_next = false;
            result.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some('}') | Some(']')) {
                    continue;
                }
            }
            _ => {}
        }
        result.push(ch);
    }
    result
}

/// Escape backslashes inside strings that do not start a valid JSON escape
/// (LaTeX such as `\frac` is the usual culprit).
pub fn fix_unescaped_backslashes(json: &str) -> String {
    let mut fixed = String::with_capacity(json.len() + 8);
    let mut in_string = false;
    let mut chars = json.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_string => match chars.peek() {
                Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => {
                    fixed.push('\\');
                    if let Some(next) = chars.next() {
                        fixed.push(next);
                    }
                }
                _ => fixed.push_str("\\\\"),
            },
            '"' => {
                in_string = !in_string;
                fixed.push(ch);
            }
            _ => fixed.push(ch),
        }
    }
    fixed
}

/// End index (exclusive, in bytes) of the object starting at `start`, tracking
/// string literals so braces inside strings are ignored.
fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn parses(candidate: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(candidate),
        Ok(serde_json::Value::Object(_))
    )
}

/// Try the fragment as-is, then with each repair applied.
fn repair(fragment: &str) -> Option<String> {
    if parses(fragment) {
        return Some(fragment.to_string());
    }
    let without_commas = remove_trailing_commas(fragment);
    if parses(&without_commas) {
        return Some(without_commas);
    }
    let escaped = fix_unescaped_backslashes(&without_commas);
    if parses(&escaped) {
        tracing::debug!("Recovered JSON by escaping stray backslashes");
        return Some(escaped);
    }
    None
}

fn scan(text: &str) -> Option<String> {
    for (start, _) in text.match_indices('{') {
        if let Some(end) = matching_brace(text, start) {
            if let Some(found) = repair(&text[start..end]) {
                return Some(found);
            }
        }
    }
    None
}

/// Extract the first parseable JSON object from `text`
pub fn extract_json(text: &str) -> Result<String> {
    if let Some(found) = scan(text) {
        return Ok(found);
    }

    // Smart quotes used as JSON delimiters
    let straightened = text
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    if straightened != text {
        if let Some(found) = scan(&straightened) {
            tracing::debug!("Recovered JSON after replacing smart quotes");
            return Ok(found);
        }
    }

    anyhow::bail!(
        "Failed to extract valid JSON from response. Text length: {}, Preview (first 200 chars): {}",
        text.len(),
        text.chars().take(200).collect::<String>()
    )
}
