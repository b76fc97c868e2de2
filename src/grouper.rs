//! Particionado de las filas validadas por su clave de agrupación (el valor
//! de `LABEL` en nodos, de `TYPE` en relaciones) para poder escribir cada
//! grupo con una única consulta por lote.

use std::collections::HashMap;

use tracing::debug;

use crate::models::ParsedTable;

/// Filas que comparten un mismo valor de clave, en su orden de entrada.
#[derive(Debug, Clone)]
pub struct RowGroup {
    pub key: String,
    pub rows: Vec<HashMap<String, String>>,
}

/// Agrupa las filas de una tabla por el valor de `key_column`, conservando
/// el orden de primera aparición de cada clave y el orden de las filas
/// dentro de cada grupo.
///
/// Las filas con clave vacía o ausente se descartan en silencio: no cuentan
/// como procesadas ni como error (comportamiento aceptado con pérdida).
pub fn group_rows(table: ParsedTable, key_column: &str) -> Vec<RowGroup> {
    let mut groups: Vec<RowGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0usize;

    for row in table.rows {
        let key = match row.get(key_column) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => {
                dropped += 1;
                continue;
            }
        };

        match index.get(&key) {
            Some(&pos) => groups[pos].rows.push(row),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(RowGroup {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    if dropped > 0 {
        debug!(
            "'{}': descartadas {} filas sin valor en '{}'",
            table.file_name, dropped, key_column
        );
    }

    groups
}
