//! Contador de progreso monótono por fases y emisión de eventos hacia el
//! consumidor a través de un canal mpsc acotado (con back-pressure).
//!
//! Presupuestos fijos de fase: parseo 0–15, conexión 15–20, índice 20–30
//! (solo relaciones), escritura lineal hasta 95, finalización 95, completo
//! 100. El porcentaje nunca retrocede y solo se emite un evento terminal.

use tokio::sync::mpsc;

use crate::error::UploadError;
use crate::models::{UploadEvent, UploadSummary};

pub const PARSE_END: u8 = 15;
pub const CONNECT_END: u8 = 20;
pub const INDEX_END: u8 = 30;
pub const WRITE_END: u8 = 95;

/// El receptor del stream se cerró: no queda nadie escuchando y la
/// ejecución debe abortar el trabajo restante.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerGone;

/// Extremo emisor del stream de eventos. El envío se suspende cuando el
/// consumidor va por detrás (canal acotado).
pub struct EventSink {
    tx: mpsc::Sender<UploadEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<UploadEvent>) -> Self {
        Self { tx }
    }

    pub async fn emit(&self, event: UploadEvent) -> Result<(), ListenerGone> {
        self.tx.send(event).await.map_err(|_| ListenerGone)
    }
}

/// Porcentaje objetivo durante el parseo del fichero `index` de `total`.
pub fn parsing_target(index: usize, total_files: usize) -> u8 {
    if total_files == 0 {
        return PARSE_END;
    }
    ((index + 1) * PARSE_END as usize / total_files) as u8
}

/// Porcentaje objetivo durante la escritura: lineal en filas procesadas
/// dentro del presupuesto que queda entre `start` y `WRITE_END`.
pub fn writing_target(start: u8, processed: usize, total: usize) -> u8 {
    if total == 0 {
        return WRITE_END;
    }
    let span = (WRITE_END - start) as usize;
    start + (span * processed.min(total) / total) as u8
}

/// Reportero de una ejecución: porcentaje monótono + eventos por el canal.
pub struct ProgressReporter {
    sink: EventSink,
    percent: u8,
}

impl ProgressReporter {
    pub fn new(sink: EventSink) -> Self {
        Self { sink, percent: 0 }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Avanza (nunca retrocede) hasta `target` y emite un evento de progreso.
    pub async fn progress(
        &mut self,
        target: u8,
        message: impl Into<String>,
    ) -> Result<(), ListenerGone> {
        self.percent = self.percent.max(target.min(100));
        self.sink
            .emit(UploadEvent::progress(self.percent, message))
            .await
    }

    /// Evento terminal de éxito, precedido del 100%.
    pub async fn succeed(&mut self, summary: UploadSummary) -> Result<(), ListenerGone> {
        self.progress(100, "Upload complete").await?;
        self.sink.emit(UploadEvent::success(summary)).await
    }

    /// Evento terminal de error.
    pub async fn fail(&self, err: &UploadError) -> Result<(), ListenerGone> {
        self.sink.emit(UploadEvent::failure(err)).await
    }
}
