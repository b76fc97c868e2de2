//! Modelos de dominio de la carga masiva: descriptor de conexión, ficheros,
//! tablas parseadas y los eventos que viajan por el stream NDJSON.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::error::UploadError;

/// Esquemas de URI aceptados por el driver de Neo4j.
pub const ALLOWED_SCHEMES: [&str; 6] = [
    "neo4j",
    "neo4j+s",
    "neo4j+ssc",
    "bolt",
    "bolt+s",
    "bolt+ssc",
];

/// Columna de agrupación en ficheros de nodos.
pub const NODE_LABEL_COLUMN: &str = "LABEL";

/// Columnas fijas obligatorias en ficheros de relaciones.
pub const RELATIONSHIP_REQUIRED_COLUMNS: [&str; 5] =
    ["TYPE", "FROM_LABEL", "FROM_ID", "TO_LABEL", "TO_ID"];

/// Tamaños de lote internos (no configurables).
pub const NODE_BATCH_SIZE: usize = 1000;
pub const RELATIONSHIP_BATCH_SIZE: usize = 5000;

/// Qué clase de entidades describe el fichero subido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Nodes,
    Relationships,
}

impl UploadKind {
    /// Columna cuyo valor particiona las filas en grupos.
    pub fn grouping_column(&self) -> &'static str {
        match self {
            UploadKind::Nodes => NODE_LABEL_COLUMN,
            UploadKind::Relationships => "TYPE",
        }
    }

    /// Cabeceras que deben existir para poder procesar el fichero.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Nodes => &[NODE_LABEL_COLUMN],
            UploadKind::Relationships => &RELATIONSHIP_REQUIRED_COLUMNS,
        }
    }

    /// Filas por transacción de escritura.
    pub fn batch_size(&self) -> usize {
        match self {
            UploadKind::Nodes => NODE_BATCH_SIZE,
            UploadKind::Relationships => RELATIONSHIP_BATCH_SIZE,
        }
    }

    /// Nombre en plural para los mensajes de progreso.
    pub fn entity_word(&self) -> &'static str {
        match self {
            UploadKind::Nodes => "nodes",
            UploadKind::Relationships => "relationships",
        }
    }
}

/// Credenciales y endpoint de una ejecución. Inmutable durante la carga;
/// cada ejecución abre y cierra su propia conexión.
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl ConnectionDescriptor {
    /// Comprobación mínima que hace el pipeline antes de arrancar.
    pub fn is_complete(&self) -> bool {
        !self.uri.trim().is_empty()
            && !self.user.trim().is_empty()
            && !self.password.trim().is_empty()
    }

    /// Validación completa (esquema incluido) para el endpoint de
    /// comprobación de conexión. Devuelve el mensaje a mostrar al usuario.
    pub fn validate(&self) -> Result<(), String> {
        if self.uri.trim().is_empty() {
            return Err("Connection URL must not be empty".to_string());
        }
        if self.user.trim().is_empty() || self.password.trim().is_empty() {
            return Err("Username and password must not be empty".to_string());
        }
        let url = Url::parse(&self.uri)
            .map_err(|_| format!("Invalid connection URL: {}", self.uri))?;
        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return Err(format!(
                "Unsupported URL scheme '{}'; expected one of: {}",
                url.scheme(),
                ALLOWED_SCHEMES.join(", ")
            ));
        }
        Ok(())
    }
}

/// Fichero recibido tal cual, antes de parsear.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub content: Bytes,
}

/// Resultado del parser: cabeceras ordenadas y filas como mapa
/// cabecera → valor. Cada fila solo contiene las columnas que aparecieron
/// en su línea de origen; los valores son el texto CSV literal.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl ParsedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Resumen final de una ejecución correcta.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub success: bool,
    #[serde(rename = "processedFiles")]
    pub processed_files: usize,
    #[serde(rename = "totalRows")]
    pub total_rows: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Evento del stream de salida. Se serializa sin etiqueta de variante para
/// producir exactamente las tres formas del protocolo:
/// `{"progress": ...}`, `{"error": {"error": ...}}` y `{"data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UploadEvent {
    Progress { progress: u8, message: String },
    Error { error: ErrorEnvelope },
    Data { data: UploadSummary },
}

impl UploadEvent {
    pub fn progress(percent: u8, message: impl Into<String>) -> Self {
        UploadEvent::Progress {
            progress: percent,
            message: message.into(),
        }
    }

    pub fn failure(err: &UploadError) -> Self {
        let details = err.details();
        UploadEvent::Error {
            error: ErrorEnvelope {
                error: ErrorBody {
                    message: err.to_string(),
                    details: if details.is_empty() {
                        None
                    } else {
                        Some(details)
                    },
                },
            },
        }
    }

    pub fn success(summary: UploadSummary) -> Self {
        UploadEvent::Data { data: summary }
    }

    /// Una línea NDJSON terminada en salto de línea.
    pub fn to_ndjson_line(&self) -> String {
        let mut line =
            serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        line.push('\n');
        line
    }
}
