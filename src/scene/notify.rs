//! Info and error notification channels.
//!
//! Listeners are plain callbacks registered by the host. The notifier is a
//! cheap handle (`Clone`) so pending delays can publish after the call that
//! created them has returned.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::log::{debug, warn};

/// Which channel a notice travels on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// One published message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    /// Script line being executed when the notice was published, if any
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

type Listener = Box<dyn FnMut(&Notice) + Send>;

#[derive(Default)]
struct Channels {
    info: Vec<Listener>,
    error: Vec<Listener>,
    line: Option<usize>,
}

/// Shared fan-out of notices to registered listeners.
///
/// Listeners must not publish through the same notifier; the channel lock is
/// held while they run.
#[derive(Clone, Default)]
pub struct Notifier {
    channels: Arc<Mutex<Channels>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback for info notices
    pub fn on_info(&self, listener: impl FnMut(&Notice) + Send + 'static) {
        self.lock().info.push(Box::new(listener));
    }

    /// Register a callback for error notices
    pub fn on_error(&self, listener: impl FnMut(&Notice) + Send + 'static) {
        self.lock().error.push(Box::new(listener));
    }

    /// Register one callback on both channels
    pub fn on_any(&self, listener: impl FnMut(&Notice) + Send + 'static) {
        let shared = Arc::new(Mutex::new(listener));
        let info = Arc::clone(&shared);
        self.on_info(move |n| {
            let mut listener = info.lock().unwrap_or_else(PoisonError::into_inner);
            (*listener)(n)
        });
        self.on_error(move |n| {
            let mut listener = shared.lock().unwrap_or_else(PoisonError::into_inner);
            (*listener)(n)
        });
    }

    /// Tag subsequent notices with a script line
    pub fn set_line(&self, line: Option<usize>) {
        self.lock().line = line;
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Level::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Level::Error, message.into());
    }

    fn publish(&self, level: Level, message: String) {
        let mut channels = self.lock();
        let notice = Notice {
            level,
            line: channels.line,
            message,
        };
        if level == Level::Info {
            debug!(line = ?notice.line, message = %notice.message, "info");
        } else {
            warn!(line = ?notice.line, message = %notice.message, "error");
        }
        let listeners = match level {
            Level::Info => &mut channels.info,
            Level::Error => &mut channels.error,
        };
        for listener in listeners.iter_mut() {
            listener(&notice);
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self.lock();
        f.debug_struct("Notifier")
            .field("info_listeners", &channels.info.len())
            .field("error_listeners", &channels.error.len())
            .field("line", &channels.line)
            .finish()
    }
}

/// Listener that records every notice, for hosts and tests that want a
/// transcript rather than callbacks.
#[derive(Clone, Default, Debug)]
pub struct Transcript {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl Transcript {
    /// Attach a new transcript to both channels of `notifier`
    pub fn attach(notifier: &Notifier) -> Self {
        let transcript = Transcript::default();
        let sink = transcript.clone();
        notifier.on_any(move |notice| sink.push(notice.clone()));
        transcript
    }

    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All messages, one per line
    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.message).collect()
    }

    /// Messages rendered as `<line>: <message>` (`-` when untagged), with
    /// errors marked by `!`
    pub fn render(&self) -> String {
        self.notices()
            .iter()
            .map(|n| {
                let line = n.line.map(|l| l.to_string()).unwrap_or_else(|| "-".into());
                let mark = match n.level {
                    Level::Info => ' ',
                    Level::Error => '!',
                };
                format!("{line}:{mark}{}", n.message)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_only_hear_their_channel() {
        let notifier = Notifier::new();
        let infos = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&infos);
        notifier.on_info(move |n| sink.lock().unwrap().push(n.message.clone()));
        notifier.info("hello");
        notifier.error("boom");
        assert_eq!(*infos.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn notices_carry_current_line() {
        let notifier = Notifier::new();
        let transcript = Transcript::attach(&notifier);
        notifier.info("before");
        notifier.set_line(Some(3));
        notifier.error("during");
        let notices = transcript.notices();
        assert_eq!(notices[0].line, None);
        assert_eq!(notices[1].line, Some(3));
        assert_eq!(notices[1].level, Level::Error);
        assert_eq!(transcript.render(), "-: before\n3:!during");
    }
}
