use forms_api::configuration::get_configuration;
use forms_api::lifecycle::{install_panic_hook, FATAL_EXIT_CODE};
use forms_api::startup::Application;
use forms_api::telemetry::{get_tracing_subscriber, init_subscriber};

#[tokio::main]
async fn main() {
    // variables already in the environment win over `.env`
    dotenvy::dotenv().ok();

    let subscriber = get_tracing_subscriber("forms-api", "info", std::io::stdout);
    init_subscriber(subscriber);

    let configuration = match get_configuration() {
        Ok(configuration) => configuration,
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, "Failed to load configuration");
            std::process::exit(FATAL_EXIT_CODE);
        }
    };
    install_panic_hook();

    // no database, no traffic: the listener is only bound once the connection succeeds
    let application = match Application::build(configuration).await {
        Ok(application) => application,
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, error.message = %e, "Startup failed");
            std::process::exit(FATAL_EXIT_CODE);
        }
    };

    if let Err(e) = application.run_until_stopped().await {
        tracing::error!(error.cause_chain = ?e, "Server stopped after a fatal error");
        std::process::exit(FATAL_EXIT_CODE);
    }
}
