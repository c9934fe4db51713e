// crates/trellis-core/src/log.rs
use tracing::{error, info, warn};

/// Severity levels understood by the layout and shaping code.
///
/// Everything is routed through `tracing`; `Fatal` is an `error!` event tagged with
/// `fatal = true` so subscribers can filter on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogSeverity {
    pub fn emit(self, message: &str) {
        match self {
            LogSeverity::Fatal => error!(fatal = true, "{}", message),
            LogSeverity::Error => error!("{}", message),
            LogSeverity::Warning => warn!("{}", message),
            LogSeverity::Info => info!("{}", message),
        }
    }
}
