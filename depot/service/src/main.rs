use actix_web::{App, HttpServer, web};
use depot_core::OpContext;
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::{certs, pkcs8_private_keys};
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::time::Duration;
use utoipa_swagger_ui::SwaggerUi;

pub mod extractors;
pub mod middleware;
pub mod routers;
pub mod shared;
pub mod state;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().init();
    dotenvy::dotenv().ok();

    let config = depot_core::DepotConfig::init();
    let addr: SocketAddr = config.bind_addr.parse().expect("invalid DEPOT_BIND_ADDR");
    let max_body_bytes: usize = envmnt::get_or("DEPOT_MAX_REQUEST_BODY_BYTES", "1073741824")
        .parse()
        .unwrap_or(1024 * 1024 * 1024);

    let app_state = state::AppState::init(&config)
        .await
        .expect("service bootstrap failed");

    spawn_session_sweeper(app_state.clone());

    let tls_config = load_tls(&config.tls_cert_path, &config.tls_key_path);
    let data = web::Data::new(app_state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .app_data(data.clone())
            // Middleware
            .wrap(middleware::identity::DepotIdentity::new(
                data.identity.clone(),
            ))
            .wrap(middleware::logger::FilteredLogger)
            // Registry protocol surfaces
            .service(routers::docker::scope())
            .service(routers::npm::scope())
            .service(routers::nuget::scope())
            .service(routers::maven::scope())
            .service(routers::gomod::scope())
            .service(routers::helm::scope())
            .service(routers::cargo::scope())
            .service(routers::rubygems::scope())
            .service(routers::opa::scope())
            // Management API
            .service(routers::accounts::scope())
            .service(routers::api_keys::scope())
            .service(routers::admin::scope())
            .service(routers::artifacts::scope())
            .service(routers::health::scope())
            // Swagger UI
            .service(routers::swagger_redirect)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", routers::openapi()),
            )
    });

    if let Some(tls) = tls_config {
        tracing::info!("starting HTTPS server on {addr}");
        server.bind_rustls_0_23(addr, tls)?.run().await
    } else {
        tracing::info!("starting plain HTTP server on {addr}");
        server.bind(addr)?.run().await
    }
}

/// Hourly sweep of idle OCI upload sessions; the manager takes the current
/// time so tests can drive expiry without a clock.
fn spawn_session_sweeper(state: state::AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        interval.tick().await;
        loop {
            interval.tick().await;
            let ctx = OpContext::new();
            let expired = state.sessions.sweep(&ctx, chrono::Utc::now()).await;
            if expired > 0 {
                tracing::info!(expired, "expired upload sessions swept");
            }
        }
    });
}

fn load_tls(cert_path: &str, key_path: &str) -> Option<ServerConfig> {
    let mut cert_reader = BufReader::new(File::open(cert_path).ok()?);
    let mut key_reader = BufReader::new(File::open(key_path).ok()?);

    let cert_chain: Vec<CertificateDer<'static>> =
        certs(&mut cert_reader).collect::<Result<_, _>>().ok()?;

    let mut keys = pkcs8_private_keys(&mut key_reader)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    let key: PrivateKeyDer<'static> = keys.pop()?.into();

    ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)
        .ok()
}
