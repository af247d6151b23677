//! Logger setup plus module-gated logging macros.
//!
//! A module opts into the macros by defining its own switch:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn};
//!
//! log_info!("reveal started");
//! ```

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
/// Later calls are no-ops.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .try_init();
    });
}

/// `log::info!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::warn!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// `log::error!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENABLE_LOGS: bool = true;

    #[test]
    fn init_logging_can_run_twice() {
        init_logging();
        init_logging();

        log_info!("logging ready");
        log_warn!("logging ready");
        log_error!("logging ready");
        assert!(INIT.is_completed());
    }
}
