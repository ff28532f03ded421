mod config;
mod render;
mod routes;
mod services;
mod site;
mod state;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::SiteConfig::from_env().expect("invalid configuration");
    let site = site::Site::load().expect("site content failed to load");
    let templates = render::Templates::new().expect("templates failed to parse");
    let port = config.port;

    // Contact delivery falls back to logging when no provider key is set.
    let mailer = services::mailer::from_config(&config);
    if config.resend_api_key.is_none() {
        tracing::warn!("RESEND_API_KEY not set; contact submissions will only be logged");
    }
    tracing::info!(mailer = mailer.name(), to = %config.contact_to, "contact delivery configured");
    tracing::info!(pages = site.pages.len(), redirects = site.redirects.len(), "site content loaded");

    let state = state::AppState::new(config, site, templates, mailer);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "ekgf-site listening");
    axum::serve(listener, app).await.expect("server failed");
}
