//! Escritura por lotes contra Neo4j. Cada lote es una única sentencia
//! Cypher parametrizada con UNWIND, es decir, una transacción y un viaje de
//! red por lote. La semántica es siempre CREATE: repetir una subida duplica
//! entidades a propósito.

use std::collections::HashMap;

use async_trait::async_trait;
use neo4rs::{query, BoltType, Graph};
use tracing::info;
use url::Url;

use crate::error::UploadError;
use crate::models::ConnectionDescriptor;

/// Fila de relación lista para escribir: extremos + propiedades restantes.
#[derive(Debug, Clone)]
pub struct RelationshipRow {
    pub from_id: String,
    pub to_id: String,
    pub props: HashMap<String, String>,
}

/// Operaciones de escritura que necesita el pipeline. La implementación
/// real habla con Neo4j; los tests usan un doble que registra llamadas.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Crea un nodo por fila bajo la etiqueta dada. Devuelve cuántos nodos
    /// reporta el almacén como creados.
    async fn create_nodes(
        &self,
        label: &str,
        rows: &[HashMap<String, String>],
    ) -> Result<u64, UploadError>;

    /// Crea una relación dirigida por fila entre nodos ya existentes.
    /// Los extremos se buscan por `{id: ...}` sin acotar por etiqueta, igual
    /// que el comportamiento original: con ids no únicos entre etiquetas
    /// puede emparejar el nodo equivocado (hueco documentado, no corregir
    /// aquí sin cambiar la especificación). Las filas sin ambos extremos
    /// aportan cero al recuento y no son un error.
    async fn create_relationships(
        &self,
        rel_type: &str,
        rows: &[RelationshipRow],
    ) -> Result<u64, UploadError>;

    /// Crea, si no existe, el índice de búsqueda sobre la propiedad `id`
    /// de la etiqueta dada. Idempotente.
    async fn ensure_id_index(&self, label: &str) -> Result<(), UploadError>;
}

/// Fábrica de conexiones: una conexión nueva y exclusiva por ejecución.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(
        &self,
        conn: &ConnectionDescriptor,
    ) -> Result<Box<dyn GraphStore>, UploadError>;
}

/// Conector real contra Neo4j.
pub struct Neo4jConnector;

#[async_trait]
impl StoreConnector for Neo4jConnector {
    async fn connect(
        &self,
        conn: &ConnectionDescriptor,
    ) -> Result<Box<dyn GraphStore>, UploadError> {
        let addr = bolt_address(&conn.uri)?;
        info!("Conectando a Neo4j en {addr}...");
        let graph = Graph::new(addr.as_str(), conn.user.as_str(), conn.password.as_str())
            .await
            .map_err(UploadError::StoreConnectionFailure)?;
        // el driver conecta de forma perezosa; una consulta trivial obliga
        // a comprobar endpoint y credenciales ahora
        graph
            .run(query("RETURN 1"))
            .await
            .map_err(UploadError::StoreConnectionFailure)?;
        info!("Conexión a Neo4j OK");
        Ok(Box::new(Neo4jStore { graph }))
    }
}

/// Sesión de escritura de una ejecución. Al soltarla se liberan las
/// conexiones del driver (neo4rs no expone un `close` explícito).
pub struct Neo4jStore {
    graph: Graph,
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn create_nodes(
        &self,
        label: &str,
        rows: &[HashMap<String, String>],
    ) -> Result<u64, UploadError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let payload: Vec<HashMap<String, BoltType>> =
            rows.iter().map(props_to_bolt).collect();
        let cypher = format!(
            "UNWIND $rows AS props \
             CREATE (n:`{}`) \
             SET n = props \
             RETURN count(n) AS created",
            escape_identifier(label)
        );
        self.execute_counting(&cypher, payload).await
    }

    async fn create_relationships(
        &self,
        rel_type: &str,
        rows: &[RelationshipRow],
    ) -> Result<u64, UploadError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let payload: Vec<HashMap<String, BoltType>> = rows
            .iter()
            .map(|row| {
                let mut m: HashMap<String, BoltType> = HashMap::new();
                m.insert("from_id".to_string(), row.from_id.clone().into());
                m.insert("to_id".to_string(), row.to_id.clone().into());
                m.insert("props".to_string(), props_to_bolt(&row.props).into());
                m
            })
            .collect();
        // MATCH por id sin etiqueta: las filas cuyos extremos no emparejan
        // quedan filtradas y no crean nada
        let cypher = format!(
            "UNWIND $rows AS row \
             MATCH (from {{id: row.from_id}}) \
             MATCH (to {{id: row.to_id}}) \
             CREATE (from)-[r:`{}`]->(to) \
             SET r = row.props \
             RETURN count(r) AS created",
            escape_identifier(rel_type)
        );
        self.execute_counting(&cypher, payload).await
    }

    async fn ensure_id_index(&self, label: &str) -> Result<(), UploadError> {
        let cypher = format!(
            "CREATE INDEX IF NOT EXISTS FOR (n:`{}`) ON (n.id)",
            escape_identifier(label)
        );
        self.graph
            .run(query(&cypher))
            .await
            .map_err(UploadError::StoreWriteFailure)
    }
}

impl Neo4jStore {
    async fn execute_counting(
        &self,
        cypher: &str,
        rows: Vec<HashMap<String, BoltType>>,
    ) -> Result<u64, UploadError> {
        let mut stream = self
            .graph
            .execute(query(cypher).param("rows", rows))
            .await
            .map_err(UploadError::StoreWriteFailure)?;

        let mut created = 0u64;
        while let Some(row) = stream
            .next()
            .await
            .map_err(UploadError::StoreWriteFailure)?
        {
            created += row.get::<i64>("created").unwrap_or(0) as u64;
        }
        Ok(created)
    }
}

/// Deriva la dirección host:puerto que espera el driver a partir de la URI
/// de conexión (puerto Bolt 7687 por defecto).
pub fn bolt_address(uri: &str) -> Result<String, UploadError> {
    let url = Url::parse(uri)
        .map_err(|e| UploadError::Internal(format!("invalid connection URI '{uri}': {e}")))?;
    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(7687);
    Ok(format!("{host}:{port}"))
}

/// Escapa acentos graves para interpolar etiquetas y tipos (vienen de datos
/// CSV) dentro de identificadores Cypher entre acentos graves.
fn escape_identifier(raw: &str) -> String {
    raw.replace('`', "``")
}

fn props_to_bolt(props: &HashMap<String, String>) -> HashMap<String, BoltType> {
    props
        .iter()
        .map(|(k, v)| (k.clone(), v.clone().into()))
        .collect()
}
