use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use actix_web_lab::middleware::from_fn;
use anyhow::Context;
use sqlx::PgPool;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_actix_web::TracingLogger;

use crate::authentication::{reject_unauthenticated, JwtVerifier, TokenVerifier};
use crate::configuration::{DatabaseSettings, Settings};
use crate::lifecycle::{supervise, watch_database, FatalErrorReporter};
use crate::pipeline::{
    cors_policy, credentials, error_funnel, parse_cookie_header, parse_json,
    prevent_parameter_pollution, sanitize, security_headers, serve_static, PublicDir,
};
use crate::routes::{health_check, not_found, RouteGroups};

/// The running server plus everything it needs until it stops.
///
/// Built in a fixed order: database pool first, listener last.
pub struct Application {
    port: u16,
    server: Server,
    fatal_reporter: FatalErrorReporter,
    fatal_errors: mpsc::UnboundedReceiver<anyhow::Error>,
}

impl Application {
    /// Connects to the database, then binds the listener. Fails without binding when the
    /// database cannot be reached.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database)
            .await
            .context("Failed to connect to the database")?;
        tracing::info!("Database connection successful");
        Self::build_with_pool(configuration, connection_pool, RouteGroups::default())
    }

    /// Binds the listener around an already opened pool.
    pub fn build_with_pool(
        configuration: Settings,
        connection_pool: PgPool,
        route_groups: RouteGroups,
    ) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener =
            TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
        let port = listener.local_addr()?.port();
        tracing::info!(%address, port, "Server is listening");

        let database = configuration.database.clone();
        let server = run(listener, connection_pool.clone(), configuration, route_groups)?;

        let (fatal_reporter, fatal_errors) = FatalErrorReporter::new();
        if database.liveness_interval_secs > 0 {
            supervise(
                "database-liveness",
                fatal_reporter.clone(),
                watch_database(
                    connection_pool,
                    Duration::from_secs(database.liveness_interval_secs),
                    database.liveness_max_failures,
                ),
            );
        }

        Ok(Self {
            port,
            server,
            fatal_reporter,
            fatal_errors,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Hands out a reporter background work can use to bring the application down.
    pub fn fatal_reporter(&self) -> FatalErrorReporter {
        self.fatal_reporter.clone()
    }

    /// Serves until the server stops on its own or a fatal error is reported.
    ///
    /// On a fatal error the listener is closed, in-flight requests are drained and the error
    /// is returned.
    pub async fn run_until_stopped(self) -> Result<(), anyhow::Error> {
        let Self {
            server,
            fatal_reporter,
            mut fatal_errors,
            ..
        } = self;
        // keep a sender alive so `recv` only resolves on a real report
        let _fatal_reporter = fatal_reporter;
        let handle = server.handle();
        let server = tokio::spawn(server);

        tokio::select! {
            outcome = server => {
                outcome.context("Server task panicked")?.context("Server stopped with an error")?;
                Ok(())
            }
            Some(error) = fatal_errors.recv() => {
                tracing::error!(error.cause_chain = ?error, "Fatal error, draining connections");
                handle.stop(true).await;
                Err(error)
            }
        }
    }
}

#[tracing::instrument(name = "Connecting to the database", skip(configuration))]
pub async fn get_connection_pool(configuration: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    configuration.connect().await
}

/// Builds the actix server: pipeline stages, route groups, catch-all and error funnel.
pub fn run(
    listener: TcpListener,
    connection_pool: PgPool,
    configuration: Settings,
    route_groups: RouteGroups,
) -> Result<Server, anyhow::Error> {
    let connection_pool = web::Data::new(connection_pool);
    let environment = web::Data::new(configuration.application.environment);
    let public_dir = web::Data::new(PublicDir(PathBuf::from(
        &configuration.application.public_dir,
    )));
    let security = web::Data::new(configuration.security.clone());
    let authentication = web::Data::new(configuration.authentication.clone());
    let verifier: Arc<dyn TokenVerifier> =
        Arc::new(JwtVerifier::new(&configuration.authentication.jwt_secret));
    let verifier = web::Data::from(verifier);

    let RouteGroups { auth, forms, user } = route_groups;

    let server = HttpServer::new(move || {
        // `.wrap()` is applied inside-out: the last call below sees the request first
        App::new()
            .wrap(from_fn(prevent_parameter_pollution))
            .wrap(from_fn(sanitize))
            .wrap(from_fn(parse_json))
            .wrap(from_fn(parse_cookie_header))
            .wrap(from_fn(serve_static))
            .wrap(cors_policy(&security))
            .wrap(from_fn(credentials))
            .wrap(error_funnel())
            .wrap(TracingLogger::default())
            .wrap(from_fn(security_headers))
            .route("/health_check", web::get().to(health_check))
            .service(web::scope("/api/v1/auth").configure(auth))
            .service(web::scope("/api/v1/forms").configure(forms))
            .service(
                web::scope("/api/v1/user")
                    .wrap(from_fn(reject_unauthenticated))
                    .configure(user),
            )
            .default_service(web::route().to(not_found))
            .app_data(connection_pool.clone())
            .app_data(environment.clone())
            .app_data(public_dir.clone())
            .app_data(security.clone())
            .app_data(authentication.clone())
            .app_data(verifier.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
