//! Orquestación de una ejecución de carga: validar entrada, parsear y
//! validar todos los ficheros, conectar una sola vez, escribir por lotes y
//! cerrar con exactamente un evento terminal (resumen o error).
//!
//! Todo es secuencial a propósito: ficheros en orden de entrada, grupos en
//! orden de primera aparición, lotes en orden de corte. Sin paralelismo el
//! recuento de progreso es determinista y basta una sesión por ejecución.

use std::collections::{BTreeSet, HashMap};

use tracing::{error, info, warn};

use crate::error::UploadError;
use crate::grouper::{self, RowGroup};
use crate::models::{
    ConnectionDescriptor, RawFile, UploadKind, UploadSummary, NODE_LABEL_COLUMN,
    RELATIONSHIP_REQUIRED_COLUMNS,
};
use crate::parser;
use crate::progress::{
    parsing_target, writing_target, EventSink, ListenerGone, ProgressReporter, CONNECT_END,
    INDEX_END, PARSE_END, WRITE_END,
};
use crate::writer::{GraphStore, RelationshipRow, StoreConnector};

/// Por qué terminó la ejecución antes del resumen.
enum RunAbort {
    /// Error fatal: se emite como evento terminal.
    Failed(UploadError),
    /// El consumidor cerró el stream: se aborta sin emitir nada más.
    ListenerGone,
}

impl From<UploadError> for RunAbort {
    fn from(err: UploadError) -> Self {
        RunAbort::Failed(err)
    }
}

impl From<ListenerGone> for RunAbort {
    fn from(_: ListenerGone) -> Self {
        RunAbort::ListenerGone
    }
}

/// Ejecuta una carga completa y emite todos sus eventos por `sink`.
/// Nunca devuelve error: el resultado viaja por el stream.
pub async fn run_upload(
    kind: UploadKind,
    files: Vec<RawFile>,
    connection: ConnectionDescriptor,
    connector: &dyn StoreConnector,
    sink: EventSink,
) {
    let mut reporter = ProgressReporter::new(sink);
    match execute(kind, files, connection, connector, &mut reporter).await {
        Ok(summary) => {
            info!(
                "Carga completada: {} ficheros, {} filas",
                summary.processed_files, summary.total_rows
            );
            if reporter.succeed(summary).await.is_err() {
                warn!("El consumidor se desconectó antes del resumen final");
            }
        }
        Err(RunAbort::Failed(err)) => {
            error!("Carga fallida: {err}");
            if reporter.fail(&err).await.is_err() {
                warn!("El consumidor se desconectó antes del evento de error");
            }
        }
        Err(RunAbort::ListenerGone) => {
            warn!("El consumidor cerró el stream; se aborta el trabajo restante");
        }
    }
}

/// Grupos de un fichero ya validado, listos para trocear en lotes.
struct FilePlan {
    file_name: String,
    groups: Vec<RowGroup>,
}

async fn execute(
    kind: UploadKind,
    files: Vec<RawFile>,
    connection: ConnectionDescriptor,
    connector: &dyn StoreConnector,
    reporter: &mut ProgressReporter,
) -> Result<UploadSummary, RunAbort> {
    // --- Validación de entrada ---
    if files.is_empty() {
        return Err(UploadError::NoInputFiles.into());
    }
    if !connection.is_complete() {
        return Err(UploadError::MissingConnectionCredentials.into());
    }
    let processed_files = files.len();

    // --- Parseo y validación (0–15%): el primer fallo tumba la ejecución ---
    let mut tables = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        reporter
            .progress(
                parsing_target(i, files.len()),
                format!("Parsing file {} of {}: {}", i + 1, files.len(), file.name),
            )
            .await?;
        let table = parser::parse_table(file)?;
        parser::validate_columns(&table, kind)?;
        tables.push(table);
    }
    reporter
        .progress(PARSE_END, "All CSV files parsed and validated")
        .await?;

    // etiquetas de extremos, para el paso opcional de índices
    let endpoint_labels = match kind {
        UploadKind::Relationships => collect_endpoint_labels(&tables),
        UploadKind::Nodes => BTreeSet::new(),
    };

    // la agrupación es trabajo en memoria; hacerla ya nos da el total de
    // filas con el que prorratear el progreso de escritura
    let mut plans = Vec::with_capacity(tables.len());
    for table in tables {
        let file_name = table.file_name.clone();
        let groups = grouper::group_rows(table, kind.grouping_column());
        plans.push(FilePlan { file_name, groups });
    }
    let total_rows: usize = plans
        .iter()
        .flat_map(|p| p.groups.iter())
        .map(|g| g.rows.len())
        .sum();

    // --- Conexión (15–20%): una sola sesión para toda la ejecución ---
    reporter
        .progress(reporter.percent(), "Connecting to Neo4j...")
        .await?;
    let store = connector.connect(&connection).await?;
    reporter.progress(CONNECT_END, "Connected to Neo4j").await?;

    // --- Índices de búsqueda (20–30%, solo relaciones, nunca fatal) ---
    if kind == UploadKind::Relationships {
        for label in &endpoint_labels {
            if let Err(err) = store.ensure_id_index(label).await {
                warn!("No se pudo crear el índice para '{label}': {err}");
            }
        }
        reporter
            .progress(INDEX_END, "Ensured id lookup indexes")
            .await?;
    }
    let write_start = reporter.percent();

    // --- Escritura por lotes ---
    let mut processed = 0usize;
    let mut total_created = 0u64;
    for plan in &plans {
        for group in &plan.groups {
            for chunk in group.rows.chunks(kind.batch_size()) {
                let created = match kind {
                    UploadKind::Nodes => {
                        store.create_nodes(&group.key, &node_batch(chunk)).await?
                    }
                    UploadKind::Relationships => {
                        store
                            .create_relationships(&group.key, &relationship_batch(chunk))
                            .await?
                    }
                };
                processed += chunk.len();
                total_created += created;
                reporter
                    .progress(
                        writing_target(write_start, processed, total_rows),
                        format!(
                            "Writing {} from {}... ({processed}/{total_rows} rows)",
                            kind.entity_word(),
                            plan.file_name
                        ),
                    )
                    .await?;
            }
        }
    }

    // --- Finalización ---
    reporter.progress(WRITE_END, "Finalizing upload...").await?;
    Ok(UploadSummary {
        success: true,
        processed_files,
        total_rows: total_created,
        message: format!(
            "Successfully processed {processed_files} file(s); {total_created} {} created",
            kind.entity_word()
        ),
    })
}

/// Valores no vacíos de FROM_LABEL/TO_LABEL de todas las tablas, en orden
/// estable, para crear índices de búsqueda por `id`.
fn collect_endpoint_labels(
    tables: &[crate::models::ParsedTable],
) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    for table in tables {
        for row in &table.rows {
            for col in ["FROM_LABEL", "TO_LABEL"] {
                if let Some(value) = row.get(col) {
                    if !value.is_empty() {
                        labels.insert(value.clone());
                    }
                }
            }
        }
    }
    labels
}

/// Filas de nodo → mapas de propiedades (la columna de agrupación no es una
/// propiedad).
fn node_batch(rows: &[HashMap<String, String>]) -> Vec<HashMap<String, String>> {
    rows.iter()
        .map(|row| {
            let mut props = row.clone();
            props.remove(NODE_LABEL_COLUMN);
            props
        })
        .collect()
}

/// Filas de relación → extremos + propiedades (las cinco columnas fijas no
/// son propiedades).
fn relationship_batch(rows: &[HashMap<String, String>]) -> Vec<RelationshipRow> {
    rows.iter()
        .map(|row| {
            let mut props = row.clone();
            let from_id = props.remove("FROM_ID").unwrap_or_default();
            let to_id = props.remove("TO_ID").unwrap_or_default();
            for col in RELATIONSHIP_REQUIRED_COLUMNS {
                props.remove(col);
            }
            RelationshipRow {
                from_id,
                to_id,
                props,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    // ---- Doble del almacén que registra cada llamada ----

    #[derive(Default)]
    struct Recorded {
        node_batches: Vec<(String, Vec<HashMap<String, String>>)>,
        rel_batches: Vec<(String, Vec<RelationshipRow>)>,
        indexed_labels: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct MockStore {
        recorded: Arc<Mutex<Recorded>>,
        existing_ids: Arc<HashSet<String>>,
        fail_writes: bool,
        fail_index: bool,
    }

    #[async_trait]
    impl GraphStore for MockStore {
        async fn create_nodes(
            &self,
            label: &str,
            rows: &[HashMap<String, String>],
        ) -> Result<u64, UploadError> {
            if self.fail_writes {
                return Err(UploadError::Internal("write refused".to_string()));
            }
            self.recorded
                .lock()
                .unwrap()
                .node_batches
                .push((label.to_string(), rows.to_vec()));
            Ok(rows.len() as u64)
        }

        async fn create_relationships(
            &self,
            rel_type: &str,
            rows: &[RelationshipRow],
        ) -> Result<u64, UploadError> {
            if self.fail_writes {
                return Err(UploadError::Internal("write refused".to_string()));
            }
            let created = rows
                .iter()
                .filter(|r| {
                    self.existing_ids.contains(&r.from_id)
                        && self.existing_ids.contains(&r.to_id)
                })
                .count() as u64;
            self.recorded
                .lock()
                .unwrap()
                .rel_batches
                .push((rel_type.to_string(), rows.to_vec()));
            Ok(created)
        }

        async fn ensure_id_index(&self, label: &str) -> Result<(), UploadError> {
            self.recorded
                .lock()
                .unwrap()
                .indexed_labels
                .push(label.to_string());
            if self.fail_index {
                return Err(UploadError::Internal("index refused".to_string()));
            }
            Ok(())
        }
    }

    struct MockConnector {
        store: MockStore,
        refuse: bool,
    }

    #[async_trait]
    impl StoreConnector for MockConnector {
        async fn connect(
            &self,
            _conn: &ConnectionDescriptor,
        ) -> Result<Box<dyn GraphStore>, UploadError> {
            if self.refuse {
                return Err(UploadError::Internal("no route to store".to_string()));
            }
            Ok(Box::new(self.store.clone()))
        }
    }

    // ---- Utilidades ----

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor {
            uri: "neo4j://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "secret".to_string(),
        }
    }

    fn file(name: &str, content: impl Into<Bytes>) -> RawFile {
        RawFile {
            name: name.to_string(),
            content: content.into(),
        }
    }

    async fn run_and_collect(
        kind: UploadKind,
        files: Vec<RawFile>,
        connection: ConnectionDescriptor,
        connector: &MockConnector,
    ) -> Vec<serde_json::Value> {
        let (tx, mut rx) = mpsc::channel(512);
        run_upload(kind, files, connection, connector, EventSink::new(tx)).await;

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(serde_json::to_value(&ev).unwrap());
        }
        events
    }

    fn percents(events: &[serde_json::Value]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| e.get("progress").and_then(|p| p.as_u64()))
            .collect()
    }

    fn terminal_error(events: &[serde_json::Value]) -> Option<&serde_json::Value> {
        events.iter().find(|e| e.get("error").is_some())
    }

    fn terminal_data(events: &[serde_json::Value]) -> Option<&serde_json::Value> {
        events.iter().find(|e| e.get("data").is_some())
    }

    // ---- Tests ----

    #[tokio::test]
    async fn node_upload_progress_is_monotonic_and_ends_at_100() {
        let connector = MockConnector {
            store: MockStore::default(),
            refuse: false,
        };
        let events = run_and_collect(
            UploadKind::Nodes,
            vec![file("people.csv", &b"id,LABEL,name\n1,Person,Ann\n2,Person,Bo\n"[..])],
            descriptor(),
            &connector,
        )
        .await;

        let ps = percents(&events);
        assert!(!ps.is_empty());
        assert!(ps.windows(2).all(|w| w[0] <= w[1]), "percents: {ps:?}");
        assert_eq!(*ps.last().unwrap(), 100);

        let data = terminal_data(&events).expect("summary event");
        assert_eq!(data["data"]["success"], true);
        assert_eq!(data["data"]["processedFiles"], 1);
        assert_eq!(data["data"]["totalRows"], 2);
        // el terminal es el último evento y es único
        assert!(terminal_error(&events).is_none());
        assert!(events.last().unwrap().get("data").is_some());
    }

    #[tokio::test]
    async fn end_to_end_node_scenario_writes_one_batch_of_two_rows() {
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        run_and_collect(
            UploadKind::Nodes,
            vec![file("people.csv", &b"id,LABEL,name\n1,Person,Ann\n2,Person,Bo\n"[..])],
            descriptor(),
            &connector,
        )
        .await;

        let recorded = store.recorded.lock().unwrap();
        assert_eq!(recorded.node_batches.len(), 1);
        let (label, rows) = &recorded.node_batches[0];
        assert_eq!(label, "Person");
        assert_eq!(rows.len(), 2);
        // la columna de agrupación no viaja como propiedad
        assert!(rows[0].get("LABEL").is_none());
        assert_eq!(rows[0]["name"], "Ann");
        assert_eq!(rows[1]["id"], "2");
    }

    #[tokio::test]
    async fn missing_label_column_is_single_terminal_error_with_zero_writes() {
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let events = run_and_collect(
            UploadKind::Nodes,
            vec![file("people.csv", &b"id,name\n1,Ann\n"[..])],
            descriptor(),
            &connector,
        )
        .await;

        let errors: Vec<_> = events.iter().filter(|e| e.get("error").is_some()).collect();
        assert_eq!(errors.len(), 1);
        assert!(terminal_data(&events).is_none());

        let details = errors[0]["error"]["error"]["details"].as_array().unwrap();
        assert!(details.iter().any(|d| d == "Found columns: id, name"));

        let recorded = store.recorded.lock().unwrap();
        assert!(recorded.node_batches.is_empty());
        assert!(recorded.rel_batches.is_empty());
    }

    #[tokio::test]
    async fn batches_slice_as_1000_1000_500() {
        let mut csv = String::from("id,LABEL\n");
        for i in 0..2500 {
            csv.push_str(&format!("{i},Person\n"));
        }
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        run_and_collect(
            UploadKind::Nodes,
            vec![file("big.csv", Bytes::from(csv))],
            descriptor(),
            &connector,
        )
        .await;

        let recorded = store.recorded.lock().unwrap();
        let sizes: Vec<usize> = recorded.node_batches.iter().map(|(_, b)| b.len()).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
    }

    #[tokio::test]
    async fn unmatched_relationship_endpoints_count_zero_but_run_succeeds() {
        let store = MockStore {
            existing_ids: Arc::new(HashSet::from(["1".to_string(), "2".to_string()])),
            ..MockStore::default()
        };
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let events = run_and_collect(
            UploadKind::Relationships,
            vec![file(
                "rels.csv",
                &b"TYPE,FROM_LABEL,FROM_ID,TO_LABEL,TO_ID\nKNOWS,Person,1,Person,2\nKNOWS,Person,1,Person,999\n"[..],
            )],
            descriptor(),
            &connector,
        )
        .await;

        let data = terminal_data(&events).expect("summary event");
        assert_eq!(data["data"]["totalRows"], 1);
        assert_eq!(data["data"]["processedFiles"], 1);
    }

    #[tokio::test]
    async fn relationship_scenario_creates_one_relationship() {
        let store = MockStore {
            existing_ids: Arc::new(HashSet::from(["1".to_string(), "2".to_string()])),
            ..MockStore::default()
        };
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let events = run_and_collect(
            UploadKind::Relationships,
            vec![file(
                "rels.csv",
                &b"TYPE,FROM_LABEL,FROM_ID,TO_LABEL,TO_ID\nKNOWS,Person,1,Person,2\n"[..],
            )],
            descriptor(),
            &connector,
        )
        .await;

        let data = terminal_data(&events).expect("summary event");
        assert_eq!(data["data"]["totalRows"], 1);

        let recorded = store.recorded.lock().unwrap();
        assert_eq!(recorded.rel_batches.len(), 1);
        let (rel_type, rows) = &recorded.rel_batches[0];
        assert_eq!(rel_type, "KNOWS");
        assert_eq!(rows[0].from_id, "1");
        assert_eq!(rows[0].to_id, "2");
        // las cinco columnas fijas no viajan como propiedades
        assert!(rows[0].props.is_empty());
        // se pidieron índices para las etiquetas de extremos
        assert_eq!(recorded.indexed_labels, vec!["Person"]);
    }

    #[tokio::test]
    async fn relationship_properties_keep_extra_columns() {
        let store = MockStore {
            existing_ids: Arc::new(HashSet::from(["1".to_string(), "2".to_string()])),
            ..MockStore::default()
        };
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        run_and_collect(
            UploadKind::Relationships,
            vec![file(
                "rels.csv",
                &b"TYPE,FROM_LABEL,FROM_ID,TO_LABEL,TO_ID,since\nKNOWS,Person,1,Person,2,2020\n"[..],
            )],
            descriptor(),
            &connector,
        )
        .await;

        let recorded = store.recorded.lock().unwrap();
        let (_, rows) = &recorded.rel_batches[0];
        assert_eq!(rows[0].props["since"], "2020");
        assert!(rows[0].props.get("FROM_LABEL").is_none());
    }

    #[tokio::test]
    async fn uploading_the_same_file_twice_doubles_the_writes() {
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let csv = &b"id,LABEL\n1,Person\n2,Person\n"[..];
        for _ in 0..2 {
            let events = run_and_collect(
                UploadKind::Nodes,
                vec![file("people.csv", csv)],
                descriptor(),
                &connector,
            )
            .await;
            assert_eq!(terminal_data(&events).unwrap()["data"]["totalRows"], 2);
        }

        // semántica siempre-crear: dos subidas, dos lotes, el doble de nodos
        let recorded = store.recorded.lock().unwrap();
        assert_eq!(recorded.node_batches.len(), 2);
        let total: usize = recorded.node_batches.iter().map(|(_, b)| b.len()).sum();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn zero_files_fails_before_touching_the_store() {
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let events =
            run_and_collect(UploadKind::Nodes, Vec::new(), descriptor(), &connector).await;

        let err = terminal_error(&events).expect("error event");
        assert_eq!(
            err["error"]["error"]["message"],
            "No CSV files were provided"
        );
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn incomplete_credentials_fail_immediately() {
        let connector = MockConnector {
            store: MockStore::default(),
            refuse: false,
        };
        let connection = ConnectionDescriptor {
            password: String::new(),
            ..descriptor()
        };
        let events = run_and_collect(
            UploadKind::Nodes,
            vec![file("people.csv", &b"id,LABEL\n1,Person\n"[..])],
            connection,
            &connector,
        )
        .await;

        let err = terminal_error(&events).expect("error event");
        assert_eq!(
            err["error"]["error"]["message"],
            "Connection credentials are incomplete"
        );
    }

    #[tokio::test]
    async fn first_invalid_file_aborts_the_whole_batch() {
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let events = run_and_collect(
            UploadKind::Nodes,
            vec![
                file("ok.csv", &b"id,LABEL\n1,Person\n"[..]),
                file("bad.csv", &b"id,name\n2,Ann\n"[..]),
            ],
            descriptor(),
            &connector,
        )
        .await;

        assert!(terminal_error(&events).is_some());
        // el fichero válido ya parseado se descarta: ninguna escritura
        assert!(store.recorded.lock().unwrap().node_batches.is_empty());
    }

    #[tokio::test]
    async fn rows_with_empty_grouping_key_are_excluded_from_counts() {
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let events = run_and_collect(
            UploadKind::Nodes,
            vec![file("people.csv", &b"id,LABEL\n1,Person\n2,\n3,Person\n"[..])],
            descriptor(),
            &connector,
        )
        .await;

        let data = terminal_data(&events).expect("summary event");
        assert_eq!(data["data"]["totalRows"], 2);
        let recorded = store.recorded.lock().unwrap();
        assert_eq!(recorded.node_batches[0].1.len(), 2);
    }

    #[tokio::test]
    async fn store_write_failure_is_terminal() {
        let store = MockStore {
            fail_writes: true,
            ..MockStore::default()
        };
        let connector = MockConnector {
            store,
            refuse: false,
        };
        let events = run_and_collect(
            UploadKind::Nodes,
            vec![file("people.csv", &b"id,LABEL\n1,Person\n"[..])],
            descriptor(),
            &connector,
        )
        .await;

        assert!(terminal_error(&events).is_some());
        assert!(terminal_data(&events).is_none());
    }

    #[tokio::test]
    async fn connect_failure_is_terminal() {
        let connector = MockConnector {
            store: MockStore::default(),
            refuse: true,
        };
        let events = run_and_collect(
            UploadKind::Nodes,
            vec![file("people.csv", &b"id,LABEL\n1,Person\n"[..])],
            descriptor(),
            &connector,
        )
        .await;

        assert!(terminal_error(&events).is_some());
        assert!(terminal_data(&events).is_none());
    }

    #[tokio::test]
    async fn index_creation_failure_does_not_abort_the_run() {
        // el paso de índices es el mejor esfuerzo: si el almacén lo rechaza
        // se registra y la escritura continúa igualmente
        let store = MockStore {
            existing_ids: Arc::new(HashSet::from(["1".to_string(), "2".to_string()])),
            fail_index: true,
            ..MockStore::default()
        };
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let events = run_and_collect(
            UploadKind::Relationships,
            vec![file(
                "rels.csv",
                &b"TYPE,FROM_LABEL,FROM_ID,TO_LABEL,TO_ID\nKNOWS,Person,1,Person,2\n"[..],
            )],
            descriptor(),
            &connector,
        )
        .await;

        let data = terminal_data(&events).expect("summary event");
        assert_eq!(data["data"]["success"], true);
        assert_eq!(data["data"]["totalRows"], 1);
        assert!(terminal_error(&events).is_none());

        let recorded = store.recorded.lock().unwrap();
        assert_eq!(recorded.indexed_labels, vec!["Person"]);
        assert_eq!(recorded.rel_batches.len(), 1);
    }

    #[tokio::test]
    async fn dropped_consumer_aborts_before_any_write() {
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        let (tx, rx) = mpsc::channel(16);
        // el consumidor se va antes de empezar: el primer envío falla y la
        // ejecución aborta sin tocar el almacén ni emitir más eventos
        drop(rx);
        run_upload(
            UploadKind::Nodes,
            vec![file("people.csv", &b"id,LABEL\n1,Person\n2,Person\n"[..])],
            descriptor(),
            &connector,
            EventSink::new(tx),
        )
        .await;

        let recorded = store.recorded.lock().unwrap();
        assert!(recorded.node_batches.is_empty());
        assert!(recorded.rel_batches.is_empty());
        assert!(recorded.indexed_labels.is_empty());
    }

    #[tokio::test]
    async fn groups_are_written_in_first_seen_order() {
        let store = MockStore::default();
        let connector = MockConnector {
            store: store.clone(),
            refuse: false,
        };
        run_and_collect(
            UploadKind::Nodes,
            vec![file(
                "mixed.csv",
                &b"id,LABEL\n1,Person\n2,City\n3,Person\n"[..],
            )],
            descriptor(),
            &connector,
        )
        .await;

        let recorded = store.recorded.lock().unwrap();
        let labels: Vec<&str> = recorded
            .node_batches
            .iter()
            .map(|(l, _)| l.as_str())
            .collect();
        assert_eq!(labels, vec!["Person", "City"]);
    }

    #[test]
    fn relationship_batch_extracts_endpoints() {
        let mut row = HashMap::new();
        row.insert("TYPE".to_string(), "KNOWS".to_string());
        row.insert("FROM_LABEL".to_string(), "Person".to_string());
        row.insert("FROM_ID".to_string(), "a".to_string());
        row.insert("TO_LABEL".to_string(), "Person".to_string());
        row.insert("TO_ID".to_string(), "b".to_string());
        row.insert("weight".to_string(), "3".to_string());

        let batch = relationship_batch(std::slice::from_ref(&row));
        assert_eq!(batch[0].from_id, "a");
        assert_eq!(batch[0].to_id, "b");
        assert_eq!(batch[0].props.len(), 1);
        assert_eq!(batch[0].props["weight"], "3");
    }
}
