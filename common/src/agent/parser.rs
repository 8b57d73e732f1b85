use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// literal the model answers with when a question needs fields the schema lacks
pub const SCHEMA_VIOLATION_SENTINEL: &str = "INVALID_FIELD";

/// data- and schema-mutating verbs, matched as plain substrings
pub const FORBIDDEN_VERBS: [&str; 7] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE",
];

static FENCE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```[ \t]*(?:sql\b)?[ \t]*\r?\n?(.*?)```").unwrap()
});

static LEADING_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^```[ \t]*(?:sql\b)?").unwrap()
});

static TRAILING_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```$").unwrap()
});

static SQL_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^sql:").unwrap()
});

/// why a completion could not become executable sql
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("model returned empty output")]
    Empty,

    #[error("model output contained no statement")]
    Unintelligible,

    #[error("query contains invalid or non-existent fields")]
    SchemaViolation,

    #[error("forbidden sql operation: {0}")]
    ForbiddenOperation(&'static str),
}

/// sql that passed sanitization: non-empty, unwrapped, read-only by lexical check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql(String);

impl GeneratedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneratedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// remove markdown fences and a leading `SQL:` label; idempotent
pub fn strip_wrappers(text: &str) -> String {
    let text = text.trim();

    // prefer the body of a complete fenced block when one is present
    let text = FENCE_BLOCK_REGEX
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let mut current = text.trim().to_string();

    loop {
        let next = LEADING_FENCE_REGEX.replace(&current, "").trim().to_string();
        let next = TRAILING_FENCE_REGEX.replace(&next, "").trim().to_string();
        let next = SQL_LABEL_REGEX.replace(&next, "").trim().to_string();

        if next == current {
            return current;
        }
        current = next;
    }
}

/// first forbidden verb found anywhere in `text`, ignoring case
pub fn find_forbidden_verb(text: &str) -> Option<&'static str> {
    let upper = text.to_uppercase();
    FORBIDDEN_VERBS.iter().copied().find(|verb| upper.contains(verb))
}

/// turn a raw completion into [`GeneratedSql`] or explain why it cannot be run
pub fn sanitize_sql(raw: &str) -> Result<GeneratedSql, Rejection> {
    if raw.trim().is_empty() {
        return Err(Rejection::Empty);
    }

    let sql = strip_wrappers(raw);

    if sql.is_empty() {
        return Err(Rejection::Unintelligible);
    }

    if sql.eq_ignore_ascii_case(SCHEMA_VIOLATION_SENTINEL) {
        return Err(Rejection::SchemaViolation);
    }

    if let Some(verb) = find_forbidden_verb(&sql) {
        return Err(Rejection::ForbiddenOperation(verb));
    }

    Ok(GeneratedSql(sql))
}
