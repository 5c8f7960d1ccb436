use chrono::{DateTime, Datelike, Utc};
use std::fmt;

/// Naming convention a storage backend expects for uploaded files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathScheme {
    /// `<year>/<month>/<slug>.<ext>`, month unpadded
    Local,
    /// `<year><MON>/<slug>.<ext>`, a flat key under a directory marker
    Remote,
}

/// Backend-relative location of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    /// Directory (local) or directory marker name (remote). `None` means the root.
    pub container: Option<String>,
    pub file_name: String,
}

impl StoragePath {
    /// A file directly under the backend root
    pub fn root(file_name: impl Into<String>) -> Self {
        StoragePath {
            container: None,
            file_name: file_name.into(),
        }
    }

    /// Slash-joined key, e.g. `2024/11/abc.png` or `2024NOV/abc.png`
    pub fn key(&self) -> String {
        match &self.container {
            Some(container) => format!("{}/{}", container, self.file_name),
            None => self.file_name.clone(),
        }
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

impl PathScheme {
    /// Map an upload to its partitioned location. Pure: identical inputs
    /// always give identical paths, so the path itself is never stored.
    pub fn resolve(&self, slug: &str, extension: &str, created_at: DateTime<Utc>) -> StoragePath {
        StoragePath {
            container: Some(self.container_for(created_at)),
            file_name: format!("{}.{}", slug, extension),
        }
    }

    pub fn container_for(&self, created_at: DateTime<Utc>) -> String {
        match self {
            PathScheme::Local => format!("{}/{}", created_at.year(), created_at.month()),
            PathScheme::Remote => format!(
                "{}{}",
                created_at.year(),
                MONTHS[created_at.month0() as usize]
            ),
        }
    }
}
