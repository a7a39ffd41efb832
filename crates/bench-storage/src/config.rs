//! Database dialect detection.

use serde::{Deserialize, Serialize};

/// Database type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// SQLite database.
    #[default]
    SQLite,
    /// PostgreSQL database.
    PostgreSQL,
}

impl DatabaseType {
    /// Parse from a database URL.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if url.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostgreSQL => write!(f, "postgresql"),
            Self::SQLite => write!(f, "sqlite"),
        }
    }
}

/// Whether `url` names a private in-memory SQLite database.
#[must_use]
pub fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(
            DatabaseType::from_url("postgres://localhost/bench"),
            Some(DatabaseType::PostgreSQL)
        );
        assert_eq!(
            DatabaseType::from_url("postgresql://u:p@host:5432/bench"),
            Some(DatabaseType::PostgreSQL)
        );
        assert_eq!(
            DatabaseType::from_url("sqlite://llm_benchmark.db?mode=rwc"),
            Some(DatabaseType::SQLite)
        );
        assert_eq!(DatabaseType::from_url("sqlite::memory:"), Some(DatabaseType::SQLite));
        assert_eq!(DatabaseType::from_url("mysql://localhost/bench"), None);
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:bench?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://llm_benchmark.db?mode=rwc"));
        assert!(!is_in_memory("postgres://localhost/:memory:"));
    }

    #[test]
    fn test_display() {
        assert_eq!(DatabaseType::SQLite.to_string(), "sqlite");
        assert_eq!(DatabaseType::PostgreSQL.to_string(), "postgresql");
    }
}
