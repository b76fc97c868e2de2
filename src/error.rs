//! Taxonomía de errores de la carga. Cualquier error de validación o de
//! escritura es terminal para toda la ejecución: o hay un resumen final, o
//! hay exactamente un error, nunca ambos.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No CSV files were provided")]
    NoInputFiles,

    #[error("Connection credentials are incomplete")]
    MissingConnectionCredentials,

    #[error("Could not parse CSV file '{file}'")]
    MalformedCsv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("CSV file '{file}' has no header row")]
    MissingHeaders { file: String },

    #[error("CSV file '{file}' is missing required columns: {}", .missing.join(", "))]
    MissingRequiredColumn {
        file: String,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("Could not connect to Neo4j: {0}")]
    StoreConnectionFailure(#[source] neo4rs::Error),

    #[error("Neo4j write failed: {0}")]
    StoreWriteFailure(#[source] neo4rs::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// Lista ordenada de detalles que se muestran al usuario junto al
    /// mensaje principal (p. ej. columnas faltantes y encontradas).
    pub fn details(&self) -> Vec<String> {
        match self {
            UploadError::MalformedCsv { source, .. } => vec![source.to_string()],
            UploadError::MissingRequiredColumn { missing, found, .. } => vec![
                format!("Missing columns: {}", missing.join(", ")),
                format!("Found columns: {}", found.join(", ")),
            ],
            UploadError::StoreConnectionFailure(e)
            | UploadError::StoreWriteFailure(e) => vec![e.to_string()],
            _ => Vec::new(),
        }
    }
}
