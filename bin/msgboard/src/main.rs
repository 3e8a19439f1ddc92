//! # msgboard Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod settings;

use std::sync::Arc;

use mb_api::{create_router, AppState, BoardPolicy};
use mb_core::{ThreadRepo, ThreadService, WriteConcern};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings::{Backend, DatabaseSettings, LogFormat, Settings};

// Feature-gated imports: only the compiled-in backends can be selected.
#[cfg(feature = "db-sqlite")]
use mb_db_sqlite::SqliteThreadRepo;

#[cfg(feature = "db-memory")]
use mb_db_memory::MemoryThreadRepo;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}

async fn build_repo(
    db: &DatabaseSettings,
    write_concern: &WriteConcern,
) -> anyhow::Result<Arc<dyn ThreadRepo>> {
    match db.backend {
        #[cfg(feature = "db-sqlite")]
        Backend::Sqlite => {
            let repo = SqliteThreadRepo::connect(
                db.url.expose_secret(),
                db.max_connections,
                write_concern.journal,
            )
            .await?;
            Ok(Arc::new(repo))
        }
        #[cfg(feature = "db-memory")]
        Backend::Memory => Ok(Arc::new(MemoryThreadRepo::new())),
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("backend {other:?} is not compiled in; enable its cargo feature"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::load()?;
    init_tracing(settings.log.format);

    let write_concern = WriteConcern::from(&settings.write_concern);

    // 1. Initialize Database Implementation
    let repo = build_repo(&settings.database, &write_concern).await?;
    info!(backend = ?settings.database.backend, "thread store ready");

    // 2. Board policy
    let allowed = settings.boards.allowed_boards()?;
    let boards = if allowed.is_empty() {
        BoardPolicy::open()
    } else {
        info!(boards = ?allowed, "restricting to configured boards");
        BoardPolicy::allow_only(allowed)
    };

    // 3. Wrap in AppState (dynamic dispatch over the selected backend)
    let state = AppState {
        service: ThreadService::new(repo, write_concern),
        boards,
    };
    let app = create_router(state);

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&address).await?;
    info!("msgboard listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
