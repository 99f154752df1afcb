use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Optional; without it leads cannot be stored but chat still answers.
    pub database_url: Option<String>,
    /// Schema holding the collection tables. Any name is accepted; it is
    /// quoted wherever it reaches SQL.
    pub database_name: Option<String>,
    /// Optional JSON file replacing the built-in FAQ table.
    pub faq_kb_path: Option<PathBuf>,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            database_name: None,
            faq_kb_path: None,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            database_url: optional_var("DATABASE_URL")
                .map(|url| -> anyhow::Result<String> {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })
                .transpose()?,
            database_name: optional_var("DATABASE_NAME"),
            faq_kb_path: optional_var("FAQ_KB_PATH").map(PathBuf::from),
            rate_limit_per_second: std::env::var("RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u64>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a positive number"))?,
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "20".to_string())
                .parse::<u32>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| anyhow::anyhow!("RATE_LIMIT_BURST must be a positive number"))?,
        };

        // Log configuration (without sensitive values)
        match config.database_url {
            Some(ref url) => {
                let prefix: String = url.chars().take(20).collect();
                tracing::debug!("Database URL: {}...", prefix);
            }
            None => tracing::warn!("DATABASE_URL not set: leads will not be stored"),
        }
        tracing::debug!("Schema: {}", config.schema());
        if let Some(ref path) = config.faq_kb_path {
            tracing::info!("FAQ knowledge base file: {}", path.display());
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Schema for collection tables, `public` unless `DATABASE_NAME` is set.
    pub fn schema(&self) -> &str {
        self.database_name.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }
}
