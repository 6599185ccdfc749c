use std::fmt::Display;

/// Shows non-blocking messages to the user.
pub trait Notifier: Send + Sync {
    fn show_error_message(&self, message: String);
}

/// Writes messages to standard error, and to the log.
#[derive(Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn show_error_message(&self, message: String) {
        log::error!("{message}");
        eprintln!("error: {message}");
    }
}

/// Routes the error of a fallible operation to the user instead of to the caller.
pub trait NotifyResultExt {
    type Ok;

    /// On error, shows `"{prefix}\n{error}"` and returns `None`.
    fn notify_err(self, notifier: &dyn Notifier, prefix: impl Display) -> Option<Self::Ok>;
}

impl<T> NotifyResultExt for anyhow::Result<T> {
    type Ok = T;

    fn notify_err(self, notifier: &dyn Notifier, prefix: impl Display) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                notifier.show_error_message(format!("{prefix}\n{error:#}"));
                None
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct FakeNotifier {
    messages: parking_lot::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeNotifier {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn take_messages(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Notifier for FakeNotifier {
    fn show_error_message(&self, message: String) {
        self.messages.lock().push(message);
    }
}
