use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum DbUrlError {
    #[error("invalid --db value: {raw}")]
    Invalid { raw: String },

    #[error("cannot create database file: {0}")]
    Io(#[from] std::io::Error),
}

/// Turn a bare path or `sqlite:` path into an absolute `sqlite://` URL.
pub(crate) fn normalize_sqlite_url(raw: &str) -> Result<String, DbUrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DbUrlError::Invalid {
            raw: raw.to_owned(),
        });
    }
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_owned());
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

/// Make sure the database file and its directory exist before connecting.
pub(crate) fn prepare_sqlite_file(db_url: &str) -> Result<(), DbUrlError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || DbUrlError::Invalid {
        raw: db_url.to_owned(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_pass_through() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:").unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/w.sqlite3").unwrap(),
            "sqlite:///tmp/w.sqlite3"
        );
    }

    #[test]
    fn bare_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:/var/lib/wordiamo.db").unwrap();
        assert_eq!(url, "sqlite:///var/lib/wordiamo.db");

        let relative = normalize_sqlite_url("data/wordiamo.db").unwrap();
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("data/wordiamo.db"));
    }

    #[test]
    fn blank_and_foreign_urls_are_rejected() {
        assert!(matches!(
            normalize_sqlite_url("  "),
            Err(DbUrlError::Invalid { .. })
        ));
        assert!(matches!(
            prepare_sqlite_file("postgres://localhost/db"),
            Err(DbUrlError::Invalid { .. })
        ));
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }
}
