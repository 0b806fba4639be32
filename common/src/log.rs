//! Tracing targets with dedicated rendering in the terminal formatter.

/// Events on this target are printed verbatim from their `raw_msg` field.
pub const PRINT_TARGET: &str = "phantom::print";

/// Events on this target are rendered as successes.
pub const SUCCESS_TARGET: &str = "phantom::success";

/// Logs a success line at `INFO` level.
#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        $crate::tracing::info!(target: $crate::log::SUCCESS_TARGET, $($arg)+)
    };
}
