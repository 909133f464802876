//! `${key}` placeholder substitution for templated migration scripts.
//!
//! Only keys present in the map are replaced. Unknown placeholders stay in the
//! script verbatim and are reported at warn level.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}").expect("valid regex literal"))
}

/// Key/value map applied to script text before execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    values: HashMap<String, String>,
}

impl Substitutions {
    /// Build from any iterator of key/value pairs.
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value configured for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Replace every recognised `${key}` in `text`.
    ///
    /// `origin` names the script in log messages. Returns the input unchanged
    /// (borrowed) when nothing was replaced.
    pub fn apply<'a>(&self, text: &'a str, origin: &str) -> Cow<'a, str> {
        let mut unresolved: Vec<String> = Vec::new();
        let replaced = placeholder_re().replace_all(text, |caps: &Captures<'_>| {
            let key = &caps[1];
            match self.values.get(key) {
                Some(value) => value.clone(),
                None => {
                    if !unresolved.iter().any(|k| k == key) {
                        unresolved.push(key.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        if !unresolved.is_empty() {
            log::warn!(
                "Unresolved placeholder(s) left verbatim in {}: {}",
                origin,
                unresolved
                    .iter()
                    .map(|k| format!("${{{k}}}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        replaced
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
#[path = "substitution_test.rs"]
mod tests;
