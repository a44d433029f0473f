use std::env;

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// Read-only footer values taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterInfo {
    pub version: String,
    pub author: String,
}

impl Default for FooterInfo {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.into(),
            author: DEFAULT_AUTHOR.into(),
        }
    }
}

impl FooterInfo {
    /// Load `VERSION` and `AUTHOR`, reading a `.env` file first if one exists.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            version: lookup("VERSION").unwrap_or_else(|| DEFAULT_VERSION.into()),
            author: lookup("AUTHOR").unwrap_or_else(|| DEFAULT_AUTHOR.into()),
        }
    }

    pub fn version_label(&self) -> String {
        format!("Ver. {}", self.version)
    }

    pub fn author_label(&self) -> String {
        format!("Made by {}", self.author)
    }
}
