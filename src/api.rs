//! Router y handlers HTTP: subida de CSVs con respuesta NDJSON en streaming
//! y comprobación de conexión contra Neo4j.

use axum::{
    body::Body,
    extract::{Json, Multipart},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{
    models::{ConnectionDescriptor, RawFile, UploadKind},
    pipeline,
    progress::EventSink,
    writer::{Neo4jConnector, StoreConnector},
};

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Capacidad del canal de eventos: el pipeline se suspende si el consumidor
/// va muy por detrás (back-pressure natural).
const EVENT_CHANNEL_CAPACITY: usize = 16;

// --- Payloads de la API ---

#[derive(Deserialize)]
pub struct CheckConnectionPayload {
    #[serde(rename = "connectionUrl")]
    connection_url: String,
    username: String,
    password: String,
}

// --- Router ---

pub fn create_router() -> Router {
    Router::new()
        .route("/api/upload/nodes", post(upload_nodes_handler))
        .route("/api/upload/relationships", post(upload_relationships_handler))
        .route("/api/check-connection", post(check_connection_handler))
}

// --- Handlers ---

#[axum::debug_handler]
async fn upload_nodes_handler(multipart: Multipart) -> Response {
    start_upload(UploadKind::Nodes, multipart).await
}

#[axum::debug_handler]
async fn upload_relationships_handler(multipart: Multipart) -> Response {
    start_upload(UploadKind::Relationships, multipart).await
}

/// Extrae ficheros y credenciales del formulario, lanza el pipeline en una
/// tarea propia y devuelve su stream de eventos como NDJSON. Si el cliente
/// corta la respuesta, el canal se cierra y el pipeline aborta solo.
async fn start_upload(kind: UploadKind, multipart: Multipart) -> Response {
    let (files, connection) = match read_upload_form(multipart).await {
        Ok(parts) => parts,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"message": message}})),
            )
                .into_response();
        }
    };

    info!(
        "Subida de {} recibida: {} fichero(s)",
        kind.entity_word(),
        files.len()
    );

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        pipeline::run_upload(kind, files, connection, &Neo4jConnector, EventSink::new(tx))
            .await;
    });

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        let line = Bytes::from(event.to_ndjson_line());
        Some((Ok::<_, std::convert::Infallible>(line), rx))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Lee el formulario multipart: cualquier parte con nombre de fichero es un
/// CSV; `url`, `username` y `password` son las credenciales de conexión.
async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(Vec<RawFile>, ConnectionDescriptor), String> {
    let mut files = Vec::new();
    let mut uri = String::new();
    let mut user = String::new();
    let mut password = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed multipart body: {e}"))?
    {
        if let Some(file_name) = field.file_name() {
            let name = file_name.to_string();
            let content = field
                .bytes()
                .await
                .map_err(|e| format!("Could not read file part '{name}': {e}"))?;
            files.push(RawFile { name, content });
            continue;
        }

        let field_name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| format!("Could not read field '{field_name}': {e}"))?;
        match field_name.as_str() {
            "url" => uri = value,
            "username" => user = value,
            "password" => password = value,
            _ => {}
        }
    }

    Ok((files, ConnectionDescriptor { uri, user, password }))
}

/// Valida las credenciales (400 si la URL o los campos no son válidos) y
/// prueba la conexión real contra Neo4j (401 si el servidor la rechaza).
#[axum::debug_handler]
async fn check_connection_handler(
    Json(payload): Json<CheckConnectionPayload>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let connection = ConnectionDescriptor {
        uri: payload.connection_url,
        user: payload.username,
        password: payload.password,
    };

    if let Err(message) = connection.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"message": message}})),
        ));
    }

    match Neo4jConnector.connect(&connection).await {
        Ok(_store) => Ok(Json(json!({ "isConnected": true }))),
        Err(e) => {
            error!("Comprobación de conexión fallida: {e}");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": e.to_string()}})),
            ))
        }
    }
}
