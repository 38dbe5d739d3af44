//! Per-call controller.

/// One-shot callback invoked when cancellation is requested.
type CancelCallback = Box<dyn FnOnce() + Send>;

/// Per-call mutable status object, passed to both generic dispatch and to
/// business logic.
///
/// `failed()` and `error_text()` are meaningful only after the call has
/// completed. Once a call fails the flag stays set until [`reset`] is
/// called, and `reset` must only happen between calls, never while a call
/// is outstanding.
///
/// Cancellation is advisory: `start_cancel` flips the flag and fires the
/// registered callback, but nothing in the transport layer interrupts an
/// in-flight read or write. Server logic that wants cancellation must poll
/// [`is_canceled`] itself.
///
/// [`reset`]: RpcController::reset
/// [`is_canceled`]: RpcController::is_canceled
#[derive(Default)]
pub struct RpcController {
    failed: bool,
    error_text: String,
    canceled: bool,
    cancel_callback: Option<CancelCallback>,
}

impl RpcController {
    /// Creates a fresh controller for one call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears failure and cancellation state so the controller can be
    /// reused for another call.
    pub fn reset(&mut self) {
        self.failed = false;
        self.error_text.clear();
        self.canceled = false;
        self.cancel_callback = None;
    }

    /// Returns whether the call failed.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Returns the recorded failure reason, empty if the call succeeded.
    pub fn error_text(&self) -> &str {
        &self.error_text
    }

    /// Marks the call failed with a human-readable reason.
    ///
    /// Repeated calls overwrite the reason: last write wins.
    pub fn set_failed(&mut self, reason: impl Into<String>) {
        self.failed = true;
        self.error_text = reason.into();
    }

    /// Signals that the caller wants this call canceled.
    ///
    /// Fires the callback registered via [`notify_on_cancel`] exactly once.
    ///
    /// [`notify_on_cancel`]: RpcController::notify_on_cancel
    pub fn start_cancel(&mut self) {
        self.canceled = true;
        if let Some(callback) = self.cancel_callback.take() {
            callback();
        }
    }

    /// Returns whether cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// Registers a one-shot callback to run when cancellation is requested.
    ///
    /// If the call is already canceled the callback runs immediately.
    pub fn notify_on_cancel(&mut self, callback: impl FnOnce() + Send + 'static) {
        if self.canceled {
            callback();
        } else {
            self.cancel_callback = Some(Box::new(callback));
        }
    }
}

impl std::fmt::Debug for RpcController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcController")
            .field("failed", &self.failed)
            .field("error_text", &self.error_text)
            .field("canceled", &self.canceled)
            .field("has_cancel_callback", &self.cancel_callback.is_some())
            .finish()
    }
}
