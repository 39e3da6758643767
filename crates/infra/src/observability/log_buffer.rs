//! Bounded log line buffer fed by a `tracing` layer

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

const CHANNEL_CAPACITY: usize = 1024;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Most recent rendered log lines, newest first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<RwLock<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { lines: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))), capacity }
    }

    pub fn push(&self, line: String) {
        let mut lines = self.lines.write();
        lines.push_front(line);
        lines.truncate(self.capacity);
    }

    /// Copy of the buffered lines, newest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// `tracing` layer that renders events at or above `min_level` and hands
/// them to a [`LogForwarder`].
pub struct LogBufferLayer {
    tx: mpsc::Sender<String>,
    zone: Tz,
    min_level: Level,
}

impl LogBufferLayer {
    /// Render timestamps in `zone` instead of UTC.
    pub fn with_time_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    fn render(&self, event: &Event<'_>) -> String {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let timestamp = Utc::now().with_timezone(&self.zone).format(TIMESTAMP_FORMAT);
        let mut line = format!("[{timestamp}] ");
        let level = *event.metadata().level();
        if level <= Level::WARN {
            let _ = write!(line, "{level} ");
        }
        line.push_str(&visitor.message);
        line.push_str(&visitor.fields);
        line
    }
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // Level ordering: ERROR < WARN < INFO < DEBUG < TRACE.
        if *event.metadata().level() > self.min_level {
            return;
        }
        let _ = self.tx.try_send(self.render(event));
    }
}

/// Receiving end of the log channel.
pub struct LogForwarder {
    rx: mpsc::Receiver<String>,
    buffer: LogBuffer,
}

impl LogForwarder {
    /// Move lines into the buffer until every layer handle is dropped.
    pub async fn run(mut self) {
        while let Some(line) = self.rx.recv().await {
            self.buffer.push(line);
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Create a connected layer/forwarder pair writing into `buffer`.
pub fn log_channel(buffer: LogBuffer) -> (LogBufferLayer, LogForwarder) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let layer = LogBufferLayer { tx, zone: chrono_tz::UTC, min_level: Level::INFO };
    (layer, LogForwarder { rx, buffer })
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
