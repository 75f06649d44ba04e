use anyhow::Result;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use config::StorageBackend;
use services::{
    functions::HttpArchiveFunctions,
    mailer::ResendMailer,
    storage::{ObjectStore, local::LocalObjectStore, memory::MemoryObjectStore},
    users::SupabaseUserDirectory,
};
use state::AppState;

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        "Starting archive-gateway on {} with {:?} storage",
        cfg.addr(),
        cfg.storage_backend
    );

    // --- Handle migration mode ---
    if migrate {
        let db = db::connect(&cfg.database_url).await?;
        db::run_migrations(&db).await?;
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Initialize object store ---
    let (store, links): (Arc<dyn ObjectStore>, Option<Arc<LocalObjectStore>>) =
        match cfg.storage_backend {
            StorageBackend::Local => {
                if !Path::new(&cfg.storage_dir).exists() {
                    fs::create_dir_all(&cfg.storage_dir)?;
                    tracing::info!("Created storage directory at {}", cfg.storage_dir);
                }
                let db = db::connect(&cfg.database_url).await?;
                db::run_migrations(&db).await?;

                let local = Arc::new(LocalObjectStore::new(
                    Arc::new(db),
                    cfg.storage_dir.clone(),
                    cfg.public_url.clone(),
                ));
                let store: Arc<dyn ObjectStore> = local.clone();
                (store, Some(local))
            }
            StorageBackend::Memory => {
                tracing::warn!("Objects are kept in memory and lost on restart");
                let store: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());
                (store, None)
            }
        };

    // --- Outbound clients ---
    let http = reqwest::Client::builder()
        .timeout(cfg.http_timeout)
        .build()?;
    for warning in cfg.missing_settings() {
        tracing::warn!("{}", warning);
    }

    let state = AppState {
        store,
        functions: Arc::new(HttpArchiveFunctions::new(
            http.clone(),
            cfg.file_function_url.clone(),
            cfg.folder_function_url.clone(),
            cfg.function_token.clone(),
        )),
        mailer: Arc::new(ResendMailer::new(
            http.clone(),
            cfg.resend_base_url.clone(),
            cfg.resend_api_key.clone(),
        )),
        users: Arc::new(SupabaseUserDirectory::new(
            http,
            cfg.supabase_url.clone(),
            cfg.supabase_service_role_key.clone(),
        )),
        branding: Arc::new(cfg.branding()),
        presign_ttl: cfg.presign_ttl,
    };

    // --- Build router ---
    let app = routes::routes::app(state, links, cfg.max_upload_bytes, &cfg.cors_origins);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
