//! INI-style diag files
//!
//! Each section is one record. Values are decoded permissively: numbers,
//! booleans, quoted strings and bracketed sequences take their natural types,
//! and bare words stay strings. A section titled `[#]` is anonymous; before
//! parsing it is renamed to a salted SHA-256 digest of the raw lines that
//! follow it, so many anonymous sections can live in one file.

use crate::error::{ResolveError, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Title marking a section that should receive a generated name.
pub const ANONYMOUS_TITLE: &str = "#";

const DEFAULT_SECTION: &str = "DEFAULT";
const SALT_LEN: usize = 16;

/// One parsed section with raw (undecoded) values.
#[derive(Debug, Clone, PartialEq)]
pub struct IniSection {
    pub title: String,
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

fn section_title(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    trimmed.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')).map(str::trim)
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with(';')
}

/// An indented line right after an entry continues that entry's value, even
/// when it looks like a `[header]`.
fn continues_value(line: &str, after_entry: bool) -> bool {
    after_entry && line.starts_with(char::is_whitespace)
}

/// Section titles by line; continuation lines are never headers.
fn header_titles<'a>(lines: &[&'a str]) -> Vec<Option<&'a str>> {
    let mut after_entry = false;
    lines
        .iter()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                after_entry = false;
                return None;
            }
            if is_comment(trimmed) || continues_value(line, after_entry) {
                return None;
            }
            let title = section_title(line);
            after_entry = title.is_none();
            title
        })
        .collect()
}

/// Replace every anonymous section header with a unique digest title.
pub fn retitle_anonymous_sections(content: &str) -> Result<String> {
    let lines: Vec<&str> = content.lines().collect();
    let titles = header_titles(&lines);
    let mut out = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        if titles[i] != Some(ANONYMOUS_TITLE) {
            out.push((*line).to_string());
            continue;
        }
        let mut salt = [0u8; SALT_LEN];
        getrandom::fill(&mut salt).map_err(|e| ResolveError::Entropy(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(salt);
        let body_len = titles[i + 1..].iter().take_while(|t| t.is_none()).count();
        for body in &lines[i + 1..i + 1 + body_len] {
            hasher.update(body.as_bytes());
            hasher.update(b"\n");
        }
        out.push(format!("[{:x}]", hasher.finalize()));
    }

    let mut text = out.join("\n");
    if content.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Split INI text into sections, applying `[DEFAULT]` values to every section.
pub fn parse_sections(content: &str, path: &Path) -> Result<Vec<IniSection>> {
    let mut sections: Vec<IniSection> = Vec::new();
    let mut defaults: Vec<(String, String)> = Vec::new();
    let mut in_default = false;
    let mut last_key: Option<String> = None;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            last_key = None;
            continue;
        }
        if is_comment(trimmed) {
            continue;
        }

        if continues_value(line, last_key.is_some()) {
            let entries = if in_default {
                Some(&mut defaults)
            } else {
                sections.last_mut().map(|section| &mut section.entries)
            };
            let key = last_key.as_deref().unwrap_or_default();
            if let Some((_, value)) =
                entries.and_then(|entries| entries.iter_mut().rev().find(|(k, _)| k == key))
            {
                value.push('\n');
                value.push_str(trimmed);
                continue;
            }
        }

        if let Some(title) = section_title(line) {
            last_key = None;
            if title == DEFAULT_SECTION {
                in_default = true;
                continue;
            }
            in_default = false;
            if sections.iter().any(|s| s.title == title) {
                return Err(ResolveError::DuplicateSection {
                    path: path.to_path_buf(),
                    section: title.to_string(),
                });
            }
            sections.push(IniSection { title: title.to_string(), entries: Vec::new() });
            continue;
        }

        let entries = if in_default {
            &mut defaults
        } else {
            match sections.last_mut() {
                Some(section) => &mut section.entries,
                None => {
                    return Err(ResolveError::malformed(
                        path,
                        format!("line {}: entry before any section header", idx + 1),
                    ))
                }
            }
        };

        let Some(split) = trimmed.find(['=', ':']) else {
            return Err(ResolveError::malformed(
                path,
                format!("line {}: expected 'key = value'", idx + 1),
            ));
        };
        let key = trimmed[..split].trim().to_lowercase();
        let value = trimmed[split + 1..].trim().to_string();
        if key.is_empty() {
            return Err(ResolveError::malformed(path, format!("line {}: empty key", idx + 1)));
        }
        if entries.iter().any(|(k, _)| *k == key) {
            tracing::warn!("{}: key '{}' repeated, keeping the last value", path.display(), key);
            entries.retain(|(k, _)| *k != key);
        }
        entries.push((key.clone(), value));
        last_key = Some(key);
    }

    for section in &mut sections {
        for (key, value) in &defaults {
            if section.get(key).is_none() {
                section.entries.push((key.clone(), value.clone()));
            }
        }
    }
    Ok(sections)
}

/// YAML 1.1 boolean words, which the YAML 1.2 decoder keeps as strings.
fn yaml11_bool(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "yes" | "on" => Some(true),
        "no" | "off" => Some(false),
        _ => None,
    }
}

/// Decode one raw value into its natural type; undecodable text stays a string.
pub fn decode_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Some(flag) = yaml11_bool(trimmed) {
        return Value::Bool(flag);
    }
    serde_yaml::from_str::<Value>(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}
