//! Terraform configuration parser
//!
//! Reads the `required_version` setting from the top-level `terraform` block
//! of every configuration file directly inside a project directory.
//!
//! Format examples:
//! - Native syntax (`*.tf`):
//!   ```text
//!   terraform {
//!     required_version = ">= 1.2.0, < 2.0.0"
//!
//!     required_providers {
//!       aws = { version = "~> 5.0" }   # not a core constraint
//!     }
//!   }
//!   ```
//! - JSON syntax (`*.tf.json`):
//!   ```text
//!   { "terraform": { "required_version": ">= 1.2.0" } }
//!   ```

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::parser::traits::{ConfigError, ConstraintSource, DeclaredConstraint};

/// Parser for Terraform configuration directories
pub struct TerraformConfigParser {
    /// Regex for the assignment inside the block body: `required_version = "..."`
    required_version_re: Regex,
}

impl TerraformConfigParser {
    pub fn new() -> Self {
        Self {
            required_version_re: Regex::new(r#"(?m)^\s*required_version\s*=\s*"([^"]*)""#)
                .expect("required_version pattern is valid"),
        }
    }

    /// Constraints declared in native-syntax configuration text
    pub fn parse_hcl(&self, content: &str) -> Vec<String> {
        let stripped = strip_comments(content);
        terraform_block_bodies(&stripped)
            .iter()
            .flat_map(|body| {
                self.required_version_re
                    .captures_iter(body)
                    .filter_map(|caps| caps.get(1))
                    .map(|m| m.as_str().trim().to_string())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Constraints declared in JSON-syntax configuration text
    pub fn parse_json(&self, path: &Path, content: &str) -> Result<Vec<String>, ConfigError> {
        let root: Value = serde_json::from_str(content).map_err(|e| ConfigError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;

        // "terraform" may be a single object or a list of blocks
        let blocks: Vec<&Value> = match root.get("terraform") {
            Some(Value::Array(blocks)) => blocks.iter().collect(),
            Some(block @ Value::Object(_)) => vec![block],
            _ => Vec::new(),
        };

        Ok(blocks
            .into_iter()
            .filter_map(|block| block.get("required_version"))
            .filter_map(Value::as_str)
            .map(|c| c.trim().to_string())
            .collect())
    }
}

impl Default for TerraformConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSource for TerraformConfigParser {
    fn declared_constraints(&self, dir: &Path) -> Result<Vec<DeclaredConstraint>, ConfigError> {
        let mut declared = Vec::new();

        for file in configuration_files(dir)? {
            let content = fs::read_to_string(&file).map_err(|e| ConfigError::Io {
                path: file.clone(),
                source: e,
            })?;

            let constraints = if is_json_config(&file) {
                self.parse_json(&file, &content)?
            } else {
                self.parse_hcl(&content)
            };

            for constraint in constraints {
                debug!("Found required_version \"{}\" in {:?}", constraint, file);
                declared.push(DeclaredConstraint {
                    file: file.clone(),
                    constraint,
                });
            }
        }

        Ok(declared)
    }
}

fn is_json_config(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".tf.json"))
}

/// `*.tf` and `*.tf.json` files directly inside `dir`, sorted by name
fn configuration_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = fs::read_dir(dir).map_err(|e| ConfigError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if (name.ends_with(".tf") || name.ends_with(".tf.json")) && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Replace `#`, `//` and `/* */` comments with whitespace, keeping line breaks
/// and leaving string literals untouched
fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' | '\n' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '#' => skip_line(&mut chars, &mut out),
            '/' if chars.peek() == Some(&'/') => skip_line(&mut chars, &mut out),
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, out: &mut String) {
    for c in chars.by_ref() {
        if c == '\n' {
            out.push('\n');
            break;
        }
    }
}

/// Text at the first nesting level of every top-level `terraform { ... }` block
///
/// Nested blocks such as `required_providers` are left out, so attributes
/// with the same name inside them are not mistaken for the core constraint.
fn terraform_block_bodies(content: &str) -> Vec<String> {
    let mut bodies = Vec::new();
    let mut header = String::new();
    let mut body: Option<String> = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for c in content.chars() {
        if in_string {
            if let Some(body) = body.as_mut().filter(|_| depth == 1) {
                body.push(c);
            }
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' || c == '\n' {
                in_string = false;
            }
            continue;
        }

        match c {
            '{' => {
                if depth == 0 {
                    if header.trim() == "terraform" {
                        body = Some(String::new());
                    }
                    header.clear();
                }
                depth += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                match depth {
                    0 => {
                        if let Some(done) = body.take() {
                            bodies.push(done);
                        }
                    }
                    1 => {
                        if let Some(body) = body.as_mut() {
                            body.push('\n');
                        }
                    }
                    _ => {}
                }
            }
            _ => {
                if c == '"' {
                    in_string = true;
                }
                if depth == 0 {
                    if c == '\n' {
                        header.clear();
                    } else {
                        header.push(c);
                    }
                } else if let Some(body) = body.as_mut().filter(|_| depth == 1) {
                    body.push(c);
                }
            }
        }
    }

    bodies
}
