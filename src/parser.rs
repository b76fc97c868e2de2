//! Parseo y validación estructural de ficheros CSV (UTF-8, RFC4180).
//!
//! El parser produce una `ParsedTable` o rechaza el fichero entero; nunca
//! deja estado a medias. La validación de columnas es solo de cabeceras,
//! nunca por fila.

use std::collections::HashMap;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::UploadError;
use crate::models::{ParsedTable, RawFile, UploadKind};

/// Parsea los bytes de un fichero a una tabla de filas cabecera → valor.
///
/// Las cabeceras se recortan de espacios circundantes. Cabeceras duplicadas:
/// gana la última columna, tanto para el valor de la propiedad como para la
/// clave de agrupación (decisión documentada en DESIGN.md).
pub fn parse_table(file: &RawFile) -> Result<ParsedTable, UploadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file.content.as_ref());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| UploadError::MalformedCsv {
            file: file.name.clone(),
            source: e,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(UploadError::MissingHeaders {
            file: file.name.clone(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| UploadError::MalformedCsv {
            file: file.name.clone(),
            source: e,
        })?;
        let mut row = HashMap::with_capacity(headers.len());
        // zip: una fila corta solo aporta las columnas presentes en su línea
        for (header, value) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), value.to_string());
        }
        rows.push(row);
    }

    debug!(
        "Parseado '{}': {} cabeceras, {} filas",
        file.name,
        headers.len(),
        rows.len()
    );

    Ok(ParsedTable {
        file_name: file.name.clone(),
        headers,
        rows,
    })
}

/// Valida que las cabeceras contienen todas las columnas obligatorias del
/// modo de subida. Falla listando todas las que faltan a la vez.
pub fn validate_columns(table: &ParsedTable, kind: UploadKind) -> Result<(), UploadError> {
    let missing: Vec<String> = kind
        .required_columns()
        .iter()
        .filter(|col| !table.headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(UploadError::MissingRequiredColumn {
            file: table.file_name.clone(),
            missing,
            found: table.headers.clone(),
        })
    }
}
