//! Shadow record parsing and serialization

use std::fmt;

const FIELD_COUNT: usize = 9;

/// One line of the shadow database.
///
/// Aging fields are kept as the exact text found on disk so a rewrite never
/// changes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub hash: String,
    pub last_change: String,
    pub min_days: String,
    pub max_days: String,
    pub warn_days: String,
    pub inactive_days: String,
    pub expire_date: String,
    pub flag: String,
}

impl CredentialRecord {
    /// Parses a line without its trailing newline. Returns `None` for lines
    /// that are not well-formed shadow records.
    pub fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != FIELD_COUNT || fields[0].is_empty() {
            return None;
        }

        Some(Self {
            username: fields[0].to_string(),
            hash: fields[1].to_string(),
            last_change: fields[2].to_string(),
            min_days: fields[3].to_string(),
            max_days: fields[4].to_string(),
            warn_days: fields[5].to_string(),
            inactive_days: fields[6].to_string(),
            expire_date: fields[7].to_string(),
            flag: fields[8].to_string(),
        })
    }

    /// Copy of this record with `hash` replaced.
    pub fn with_hash(&self, hash: &str) -> Self {
        Self {
            hash: hash.to_string(),
            ..self.clone()
        }
    }

    /// Full record line, newline terminated.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.username,
            self.hash,
            self.last_change,
            self.min_days,
            self.max_days,
            self.warn_days,
            self.inactive_days,
            self.expire_date,
            self.flag
        )
    }
}
