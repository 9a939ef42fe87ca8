#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use fedlogin::{
    api::HttpAccountApi, handlers::configure_services, LoginOrchestrator, LoginSettings,
    ProviderRegistry, SessionManager,
};
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = LoginSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    // One client for providers and the account API
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.api.timeout_seconds))
        .build()
        .map_err(|e| std::io::Error::other(format!("Failed to build HTTP client: {e}")))?;

    let registry = ProviderRegistry::from_settings(&settings, &client);
    let api = Arc::new(HttpAccountApi::new(client, &settings.api));
    let orchestrator = LoginOrchestrator::new(
        registry,
        api,
        SessionManager::from_settings(&settings),
        &settings,
    );

    println!("✓ Using stateless sessions with encrypted cookies");
    start_server(orchestrator, &settings).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(orchestrator: LoginOrchestrator, settings: &LoginSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, settings);

    let orchestrator = web::Data::new(orchestrator);
    HttpServer::new(move || {
        App::new()
            .app_data(orchestrator.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &LoginSettings) {
    println!("Starting federated login service on http://{bind_address}");
    println!();
    println!("Login endpoints:");
    println!("  GET|POST /login               - Sign-in page");
    println!("  GET  /logout                  - Clear session");
    println!("  GET  /auth/{{network}}          - Provider sign-in and callback");
    println!("  POST /unlink                  - Remove a provider link");
    println!("  GET  /login/email/{{token}}     - Email token sign-in");
    println!();
    println!("Callback URLs for identity providers:");
    for network in fedlogin::Network::THIRD_PARTY {
        println!("  {}", settings.callback_uri(network));
    }
    println!();
    println!("Account API: {}", settings.api.base_url);
    println!();
    println!("System endpoints:");
    println!("  GET  /ping                    - Health check");
}
