use std::{collections::BTreeMap, fs, io, path::Path};

use pest::Parser;
use pest_derive::Parser;

use crate::{error::Error, token::Credential};

/// Key under which the login flow leaves the bearer token.
pub const TOKEN_KEY: &str = "token";

#[derive(Parser)]
#[grammar_inline = r##"
File = {
    SOI ~ (Line ~ NEWLINE)* ~ Line ~ EOI
}

Line = _{ Entry? ~ Comment? }

Entry = { Key ~ "=" ~ Value }

Key = @{ (ASCII_ALPHANUMERIC | "_" | "-" | ".")+ }

Value = ${ "\"" ~ Inner ~ "\"" }

Inner = @{ Char* }

Char = {
    !("\"" | "\\" | NEWLINE) ~ ANY
    | "\\" ~ ("\"" | "\\" | "n")
}

Comment = @{ "#" ~ (!NEWLINE ~ ANY)* }

WHITESPACE = _{ " " | "\t" }
"##]
struct StorageParser;

/// A small persistent key/value store, the command-line counterpart of a
/// browser's local storage.
///
/// On disk it is a list of `key = "value"` lines. Blank lines and `#`
/// comments are allowed and dropped when the file is rewritten.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocalStorage {
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let input = match fs::read_to_string(path) {
            Ok(input) => input,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No storage at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(Error::Storage {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        parse(input).map_err(|e| Error::StorageSyntax {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        fs::write(path, self.to_string()).map_err(|source| Error::Storage {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    #[cfg(test)]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// The stored bearer token, if any. An empty value counts as absent.
    pub fn credential(&self) -> Option<Credential> {
        self.get(TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .map(Credential::new)
    }
}

impl std::fmt::Display for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key} = \"{}\"", escape(value))?;
        }
        Ok(())
    }
}

#[allow(
    clippy::result_large_err,
    reason = "error is from pest and contains useful info"
)]
pub fn parse<S: AsRef<str>>(input: S) -> Result<LocalStorage, pest::error::Error<Rule>> {
    let mut storage = LocalStorage::default();
    for pair in StorageParser::parse(Rule::File, input.as_ref())?.flatten() {
        if pair.as_rule() != Rule::Entry {
            continue;
        }
        let mut i = pair.into_inner();
        if let (Some(key), Some(value)) = (i.next(), i.next()) {
            let raw = value.into_inner().next().map_or("", |inner| inner.as_str());
            storage.set(key.as_str(), unescape(raw));
        }
    }
    Ok(storage)
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
