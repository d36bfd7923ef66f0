//! Settings for mahalsp.
//!
//! Two sources feed the server:
//! - the editor configuration, sent by the client in `initializationOptions`
//!   and `workspace/didChangeConfiguration`;
//! - the script compiler options, read once from a `tsconfig.json` or
//!   `jsconfig.json` found near the workspace.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Section name clients may nest the editor configuration under.
pub const CONFIG_SECTION: &str = "mahal";

/// Editor-facing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Indentation width used by formatters.
    pub tab_size: u32,
    pub insert_spaces: bool,
    pub style: LanguageConfig,
    pub script: LanguageConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: true,
            style: LanguageConfig::default(),
            script: LanguageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub format: FormatConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub enable: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { enable: true }
    }
}

impl EditorConfig {
    /// Read a configuration payload, either bare or nested under `mahal`.
    ///
    /// Malformed payloads are logged and replaced with the defaults.
    pub fn from_value(value: Value) -> Self {
        let value = match value {
            Value::Object(mut map) => match map.remove(CONFIG_SECTION) {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };
        if value.is_null() {
            return Self::default();
        }

        match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "invalid editor configuration, using defaults");
                Self::default()
            }
        }
    }
}

/// Script compiler options relevant to the language service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Whether plain script files take part in the program.
    pub allow_js: bool,
    pub check_js: bool,
    pub declaration: bool,
    pub target: Option<String>,
    pub strict: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            allow_js: true,
            check_js: false,
            declaration: false,
            target: None,
            strict: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CompilerConfigFile {
    compiler_options: CompilerOptions,
}

/// Remove `//` and `/* */` comments and trailing commas, leaving strings intact.
pub fn strip_json_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut copied = 0;

    let flush = |out: &mut String, from: usize, to: usize| out.push_str(&text[from..to]);

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i = (i + 1).min(bytes.len());
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                flush(&mut out, copied, i);
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                copied = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                flush(&mut out, copied, i);
                i = match text[i + 2..].find("*/") {
                    Some(end) => i + 2 + end + 2,
                    None => bytes.len(),
                };
                copied = i;
            }
            b',' => {
                let rest = text[i + 1..].trim_start();
                if rest.starts_with('}') || rest.starts_with(']') {
                    flush(&mut out, copied, i);
                    copied = i + 1;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    flush(&mut out, copied, bytes.len());
    out
}

/// Load the `compilerOptions` of a tsconfig/jsconfig file.
pub fn load_compiler_options(path: &Path) -> Result<CompilerOptions> {
    let content = std::fs::read_to_string(path)?;
    let file: CompilerConfigFile =
        serde_json::from_str(&strip_json_comments(&content)).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(file.compiler_options)
}

fn find_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

/// Discover the script compiler configuration.
///
/// Search order:
/// 1. `tsconfig.json`, walking up from `cwd`
/// 2. `jsconfig.json`, walking up from `workspace_root`
///
/// Returns the options and the file they came from. Missing or unreadable
/// configuration yields the permissive defaults.
pub fn discover_compiler_options(
    cwd: &Path,
    workspace_root: &Path,
) -> (CompilerOptions, Option<PathBuf>) {
    let Some(path) =
        find_upwards(cwd, "tsconfig.json").or_else(|| find_upwards(workspace_root, "jsconfig.json"))
    else {
        tracing::debug!("no compiler configuration found, using defaults");
        return (CompilerOptions::default(), None);
    };

    match load_compiler_options(&path) {
        Ok(options) => {
            tracing::info!(path = %path.display(), "loaded compiler options");
            (options, Some(path))
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring compiler configuration");
            (CompilerOptions::default(), Some(path))
        }
    }
}
