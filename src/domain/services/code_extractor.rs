#[cfg(test)]
#[path = "code_extractor_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"```(?:[\w+.#-]+[ \t]*\r?\n)?([\s\S]*?)```").unwrap());

/// Pulls the most likely runnable snippet out of an assistant answer.
///
/// Fenced blocks win: the longest one in characters is returned, the first one on ties.
/// Without any fence, everything from the first line importing `bpy` onwards
/// is treated as code.
pub fn extract_code(text: &str) -> Option<String> {
    let mut longest: Option<(&str, usize)> = None;
    for captures in FENCED_BLOCK.captures_iter(text) {
        let block = match captures.get(1) {
            Some(block) => block.as_str().trim(),
            None => continue,
        };
        if block.is_empty() {
            continue;
        }

        let chars = block.chars().count();
        match longest {
            Some((_, current)) if current >= chars => {}
            _ => longest = Some((block, chars)),
        }
    }

    if let Some((block, _)) = longest {
        return Some(block.to_string());
    }

    if FENCED_BLOCK.is_match(text) {
        return None;
    }

    return fallback_code(text);
}

fn fallback_code(text: &str) -> Option<String> {
    let lines = text
        .lines()
        .skip_while(|line| {
            let trimmed = line.trim_start();
            return !(trimmed.starts_with("import bpy") || trimmed.starts_with("from bpy"));
        })
        .collect::<Vec<&str>>();

    let code = lines.join("\n").trim_end().to_string();
    if code.is_empty() {
        return None;
    }

    return Some(code);
}
