// web-server/src/main.rs
use actix::Actor;
use actix_web::{web, App, HttpServer};
use common::{setup_tracing, Config};
use role_gate::client_registry::ClientRegistryActor;
use role_gate::middleware::rate_limiter::RateLimiter;
use role_gate::{routes, GateServices};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Setup tracing
    setup_tracing();

    // Load configuration
    let config = Config::from_env();

    for missing in config.missing_credentials() {
        tracing::warn!("Configuration value {} is not set", missing);
    }

    // Anyone knowing the secret can mint Discord sessions
    if config.has_insecure_session_secret() {
        tracing::error!("session.secret is empty or the shipped placeholder, refusing to start");
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "session.secret must be set",
        ));
    }

    // Save address before moving config into web::Data
    let server_addr = config.web_server_addr.clone();

    let services = GateServices::from_config(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    // Browser sessions live in a single registry actor
    let registry = ClientRegistryActor::new()
        .with_ttl(config.session.browser_ttl)
        .with_cleanup_interval(config.session.cleanup_interval)
        .start();

    let rate_limiter = RateLimiter::from_config(&config.rate_limit);

    tracing::info!("Starting role gate on {}", server_addr);

    // Create data references
    let config_data = web::Data::new(config);
    let registry_data = web::Data::new(registry);
    let services_data = web::Data::new(services);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(rate_limiter.clone())
            .app_data(config_data.clone())
            .app_data(registry_data.clone())
            .app_data(services_data.clone())
            .configure(routes(config_data.get_ref()))
    })
    .bind(&server_addr)?
    .run()
    .await
}
