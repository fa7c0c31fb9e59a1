use crate::notify::Notification;
use crate::progress::Progress;
use crate::table::Row;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Upload,
    Download,
}

/// Everything an operation reports back to whoever presents it.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Notify(Notification),
    Progress(Transfer, Progress),
    /// Status line of the last relocate or sync call.
    OpsInfo(String),
    DataLoaded(Vec<Row>),
    SchemaLoaded(Vec<String>),
    Health(String),
}

pub type EventSender = UnboundedSender<AppEvent>;

/// Small helpers so handlers read as what they report. A closed receiver means
/// nobody is displaying anything any more, so send errors are dropped.
pub trait Emit {
    fn emit(&self, event: AppEvent);

    fn success(&self, message: impl Into<String>) {
        self.emit(AppEvent::Notify(Notification::success(message)));
    }

    fn failure(&self, message: impl Into<String>) {
        self.emit(AppEvent::Notify(Notification::failure(message)));
    }

    fn progress(&self, transfer: Transfer, progress: Progress) {
        self.emit(AppEvent::Progress(transfer, progress));
    }
}

impl Emit for EventSender {
    fn emit(&self, event: AppEvent) {
        let _ = self.send(event);
    }
}
