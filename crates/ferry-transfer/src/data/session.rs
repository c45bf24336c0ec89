use chrono::{DateTime, Utc};
use ferry_stream::ProgressObserver;
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Download,
    Upload,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::Download => write!(f, "download"),
            TransferKind::Upload => write!(f, "upload"),
        }
    }
}

/// Progress bookkeeping for one transfer.
///
/// Owned by the request that started it and updated only through the
/// progress observer of that transfer's adapter chain.
#[derive(Debug, Clone)]
pub struct TransferSession {
    id:             Uuid,
    kind:           TransferKind,
    file:           String,
    bytes_moved:    u64,
    total:          Option<u64>,
    started_at:     DateTime<Utc>,
    last_update_at: DateTime<Utc>,
    clock:          Instant,
}

impl TransferSession {
    pub fn new(kind: TransferKind, file: impl Into<String>, total: Option<u64>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            file: file.into(),
            bytes_moved: 0,
            total,
            started_at: now,
            last_update_at: now,
            clock: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid { self.id }

    pub fn kind(&self) -> TransferKind { self.kind }

    pub fn file(&self) -> &str { &self.file }

    pub fn bytes_moved(&self) -> u64 { self.bytes_moved }

    pub fn total(&self) -> Option<u64> { self.total }

    pub fn started_at(&self) -> DateTime<Utc> { self.started_at }

    pub fn last_update_at(&self) -> DateTime<Utc> { self.last_update_at }

    /// Percentage of `total` moved so far; `None` when the size is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.bytes_moved as f64 / total as f64) * 100.0
            }
        })
    }

    /// Average rate since the session started, in bytes per second.
    #[must_use]
    pub fn average_rate_bps(&self) -> f64 {
        let secs = self.clock.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.bytes_moved as f64 / secs
        } else {
            0.0
        }
    }

    pub fn report(&self) -> TransferReport {
        TransferReport {
            id:               self.id,
            kind:             self.kind,
            file:             self.file.clone(),
            bytes:            self.bytes_moved,
            total:            self.total,
            percentage:       self.percentage(),
            average_rate_bps: self.average_rate_bps(),
            elapsed_ms:       self.clock.elapsed().as_millis() as u64,
            started_at:       self.started_at,
        }
    }
}

impl ProgressObserver for TransferSession {
    fn on_progress(&mut self, cumulative: u64, total: Option<u64>) {
        self.bytes_moved = cumulative;
        if total.is_some() {
            self.total = total;
        }
        self.last_update_at = Utc::now();
    }
}

/// Snapshot of a session for logs and JSON responses.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub id:               Uuid,
    pub kind:             TransferKind,
    pub file:             String,
    pub bytes:            u64,
    pub total:            Option<u64>,
    pub percentage:       Option<f64>,
    pub average_rate_bps: f64,
    pub elapsed_ms:       u64,
    pub started_at:       DateTime<Utc>,
}

/// Body of a successful `POST /upload`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub filename:   String,
    pub bytes:      u64,
    pub sha256:     String,
    pub elapsed_ms: u64,
}
