//! Server module for managing HTTP server lifecycle
//!
//! Handles server initialization, background dialer startup, and graceful
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{Environment, Settings};
use crate::db::{establish_async_connection_pool, run_migrations};
use crate::dialer::{CallDistributor, DialerScheduler, LockSweeper};
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until shutdown signal
    ///
    /// This method:
    /// 1. Logs startup information
    /// 2. Initializes the database connection pool (and migrations when configured)
    /// 3. Creates application state
    /// 4. Starts the dialer scheduler and lock sweeper
    /// 5. Binds to the configured address and serves until shutdown
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env(),
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = %self.settings.server.port,
            "Server configuration loaded"
        );

        // Log database and dialer configuration (without the URL, which
        // carries credentials)
        tracing::info!(
            max_connections = %self.settings.database.max_connections,
            auto_migrate = %self.settings.database.auto_migrate,
            "Database configuration loaded"
        );
        tracing::info!(
            tick_interval = %self.settings.dialer.tick_interval,
            sweep_interval = %self.settings.dialer.sweep_interval,
            autostart = %self.settings.dialer.autostart,
            "Dialer configuration loaded"
        );

        if self.settings.database.auto_migrate {
            tracing::info!("Running pending migrations");
            run_migrations(&self.settings.database.url).await?;
        }

        let pool = establish_async_connection_pool(
            &self.settings.database.url,
            self.settings.database.max_connections,
        )
        .await?;
        tracing::info!("Database connection pool initialized");

        let state = AppState::new(pool, &self.settings)?;

        // Background loops share the state's repositories and pacing
        // controller so the HTTP surface observes the same counters.
        let distributor = Arc::new(CallDistributor::new(
            state.repos.clone(),
            Arc::clone(&state.lifecycle),
        ));
        let scheduler = Arc::new(DialerScheduler::new(
            state.repos.clone(),
            Arc::clone(&state.pacing),
            distributor,
            Duration::from_secs(self.settings.dialer.tick_interval),
            self.settings.dialer.reserve_wrapup_headroom,
        ));
        let sweeper = Arc::new(LockSweeper::new(
            state.repos.clone(),
            Duration::from_secs(self.settings.dialer.sweep_interval),
            self.settings.dialer.stale_in_progress,
        ));

        if self.settings.dialer.autostart {
            scheduler.start();
            sweeper.start();
            tracing::info!("Dialer scheduler and lock sweeper started");
        } else {
            tracing::info!("Dialer autostart disabled; scheduler not running");
        }

        let router = create_router(state);

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        scheduler.stop().await;
        sweeper.stop().await;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
