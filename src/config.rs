use crate::services::templates::Branding;
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{env, str::FromStr, time::Duration};

/// Object store adapter selected at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    Local,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown storage backend `{}` (expected local or memory)", other),
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub storage_dir: String,
    pub database_url: String,
    /// Base URL presigned links are issued under.
    pub public_url: String,
    pub presign_ttl: Duration,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
    pub http_timeout: Duration,
    pub file_function_url: Option<String>,
    pub folder_function_url: Option<String>,
    pub function_token: Option<String>,
    pub resend_api_key: Option<String>,
    pub resend_base_url: String,
    pub app_name: String,
    pub app_domain: String,
    pub admin_domain: String,
    pub app_email: String,
    pub admin_emails: Vec<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Upload, zip listing and notification gateway")]
pub struct Args {
    /// Host to bind to (overrides GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Object store adapter (overrides GATEWAY_STORAGE_BACKEND)
    #[arg(long, value_enum)]
    pub storage_backend: Option<StorageBackend>,

    /// Directory where objects are stored (overrides GATEWAY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides GATEWAY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Public base URL for presigned links (overrides GATEWAY_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

/// Optional variable; unset and blank values are both `None`.
fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when it is unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|err| anyhow::anyhow!("{}", err))
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

/// Split a comma separated list, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    fn merge(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_port = env_parse("GATEWAY_PORT", 8080u16)?;
        let env_backend = env_parse("GATEWAY_STORAGE_BACKEND", StorageBackend::Local)?;
        let port = args.port.unwrap_or(env_port);

        let public_url = args
            .public_url
            .or_else(|| env_opt("GATEWAY_PUBLIC_URL"))
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let app_domain = env_or("GATEWAY_APP_DOMAIN", "http://localhost:3000");

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or_else(|| env_or("GATEWAY_HOST", "0.0.0.0")),
            port,
            storage_backend: args.storage_backend.unwrap_or(env_backend),
            storage_dir: args
                .storage_dir
                .unwrap_or_else(|| env_or("GATEWAY_STORAGE_DIR", "./data/objects")),
            database_url: args.database_url.unwrap_or_else(|| {
                env_or("GATEWAY_DATABASE_URL", "sqlite://./data/meta/gateway.db")
            }),
            public_url: public_url.trim_end_matches('/').to_string(),
            presign_ttl: Duration::from_secs(env_parse("GATEWAY_PRESIGN_TTL_SECS", 900u64)?),
            max_upload_bytes: env_parse("GATEWAY_MAX_UPLOAD_BYTES", 10 * 1024 * 1024 * 1024usize)?,
            cors_origins: split_list(&env_or("GATEWAY_CORS_ORIGINS", "*")),
            http_timeout: Duration::from_secs(env_parse("GATEWAY_HTTP_TIMEOUT_SECS", 30u64)?),
            file_function_url: env_opt("GATEWAY_FILE_FUNCTION_URL"),
            folder_function_url: env_opt("GATEWAY_FOLDER_FUNCTION_URL"),
            function_token: env_opt("GATEWAY_FUNCTION_TOKEN"),
            resend_api_key: env_opt("GATEWAY_RESEND_API_KEY"),
            resend_base_url: env_or("GATEWAY_RESEND_BASE_URL", "https://api.resend.com"),
            app_name: env_or("GATEWAY_APP_NAME", "Archive Gateway"),
            admin_domain: env_or("GATEWAY_ADMIN_DOMAIN", &app_domain),
            app_domain,
            app_email: env_or("GATEWAY_APP_EMAIL", "no-reply@localhost"),
            admin_emails: split_list(&env_or("GATEWAY_ADMIN_EMAILS", "")),
            supabase_url: env_opt("GATEWAY_SUPABASE_URL"),
            supabase_service_role_key: env_opt("GATEWAY_SUPABASE_SERVICE_ROLE_KEY"),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings the service starts without but cannot serve every route with.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.file_function_url.is_none() || self.folder_function_url.is_none() {
            missing.push("Archive extraction functions are not fully configured");
        }
        if self.resend_api_key.is_none() {
            missing.push("GATEWAY_RESEND_API_KEY is unset; email routes will fail");
        }
        if self.admin_emails.is_empty() {
            missing.push("GATEWAY_ADMIN_EMAILS is empty; admin notices have no recipients");
        }
        missing
    }

    pub fn branding(&self) -> Branding {
        Branding {
            app_name: self.app_name.clone(),
            app_domain: self.app_domain.clone(),
            admin_domain: self.admin_domain.clone(),
            sender: self.app_email.clone(),
            admin_recipients: self.admin_emails.clone(),
        }
    }
}
