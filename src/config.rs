//! Carga y gestión de configuración del servidor.
//!
//! Las credenciales de Neo4j NO viven aquí: llegan con cada petición y
//! pertenecen a la ejecución, no al proceso.

use std::env;

use anyhow::Result;

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3322";
const DEFAULT_MAX_UPLOAD_MB: usize = 64;

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string());

        let max_upload_mb = env::var("MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB);

        Ok(Self {
            server_addr,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}
