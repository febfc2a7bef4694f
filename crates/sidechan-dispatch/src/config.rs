use std::time::Duration;

use sidechan_frame::MODULE_NOT_FOUND;

/// Quiet window between a generic error and the end of the output.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(200);

/// How repeated generic errors interact with already armed termination timers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TerminationMode {
    /// Every error arms its own timer; the first to fire ends the output and
    /// the rest find it ended.
    #[default]
    Independent,
    /// A new error cancels the pending timer and restarts the window.
    Rearm,
}

/// Controls built-in dispatch policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Delay before ending the output after a generic error. Default: 200 ms.
    pub quiet_window: Duration,
    /// Timer interaction for repeated errors.
    pub termination: TerminationMode,
    /// `payload.code` values that end the output immediately.
    pub fatal_codes: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            quiet_window: DEFAULT_QUIET_WINDOW,
            termination: TerminationMode::default(),
            fatal_codes: vec![MODULE_NOT_FOUND.to_string()],
        }
    }
}

impl DispatchConfig {
    /// Returns true if `code` is a fatal dependency code.
    pub fn is_fatal_code(&self, code: Option<&str>) -> bool {
        code.is_some_and(|code| self.fatal_codes.iter().any(|fatal| fatal == code))
    }
}
