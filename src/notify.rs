// User-facing transient notices ("toasts") and the sinks that deliver them.
use crate::config::NotifierKind;
use notify_rust::Notification;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            description: description.into(),
        }
    }
}

/// Sink for notices. Implementations must not block the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => log::warn!("{}: {}", notice.title, notice.description),
            _ => log::info!("{}: {}", notice.title, notice.description),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: Notice) {}
}

/// Forwards notices to a UI loop. Drops them when the queue is full or closed.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notice>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<Notice>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.tx.try_send(notice) {
            log::debug!("Dropping notice: {}", e);
        }
    }
}

/// OS desktop notification.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    appname: String,
}

impl DesktopNotifier {
    pub fn new(appname: &str) -> Self {
        Self {
            appname: appname.to_string(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: Notice) {
        let appname = self.appname.clone();
        // The D-Bus round trip can stall; keep it off the async workers.
        std::thread::spawn(move || {
            if let Err(e) = Notification::new()
                .summary(&notice.title)
                .body(&notice.description)
                .appname(&appname)
                .show()
            {
                log::debug!("Desktop notification failed: {}", e);
            }
        });
    }
}

pub fn from_kind(kind: NotifierKind) -> SharedNotifier {
    match kind {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new("Daybook")),
        NotifierKind::None => Arc::new(NullNotifier),
    }
}
