use std::path::Path;

use thiserror::Error;

pub const SUPABASE_URL_VAR: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

const LOCAL_ENV_FILE: &str = ".env";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing Supabase credentials: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Connection settings for the hosted Supabase project
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

// Keep the service role key out of debug output
impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

impl SupabaseConfig {
    /// Read both credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    ///
    /// Absent and blank values are both reported as missing, and every
    /// missing variable is named in the error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let url = read(SUPABASE_URL_VAR);
        let service_role_key = read(SUPABASE_KEY_VAR);

        match (url, service_role_key) {
            (Some(url), Some(service_role_key)) => Ok(Self {
                url: url.trim_end_matches('/').to_string(),
                service_role_key,
            }),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(SUPABASE_URL_VAR);
                }
                if key.is_none() {
                    missing.push(SUPABASE_KEY_VAR);
                }
                Err(ConfigError::Missing(missing))
            }
        }
    }
}

/// Load environment variables from `env_file` if it exists, otherwise from a
/// `.env` in the working directory. Parent directories are never searched.
/// Variables already present in the process environment are never overwritten.
///
/// Returns the path that was loaded, if any.
pub fn load_env_file(env_file: &Path) -> Option<String> {
    [env_file, Path::new(LOCAL_ENV_FILE)]
        .into_iter()
        .filter(|path| path.is_file())
        .find_map(|path| match dotenvy::from_path(path) {
            Ok(()) => Some(path.display().to_string()),
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", path.display(), e);
                None
            }
        })
}
