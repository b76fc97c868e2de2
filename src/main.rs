// Módulos de la aplicación
mod api;
mod config;
mod error;
mod grouper;
mod models;
mod parser;
mod pipeline;
mod progress;
mod writer;

use axum::extract::DefaultBodyLimit;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env().expect("Error al cargar la configuración");

    // 3. Configurar el router de la API
    let app = api::create_router()
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 4. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr)
        .await
        .expect("No se pudo abrir el puerto del servidor");
    info!("🚀 Servidor escuchando en http://{}", cfg.server_addr);

    // Apagado ordenado con ctrl-c
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Error del servidor HTTP");

    info!("✅ Servidor cerrado correctamente.");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Señal de apagado recibida, iniciando cierre del servidor.");
}
