//! Crash reporting.
//!
//! Panics anywhere in the process are logged through `tracing` before the
//! default hook runs. Handler panics are turned into 500 responses by the
//! HTTP layer; a panic that takes down the server task ends the process
//! through the supervisor with exit code 1.

use std::panic;

pub fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        tracing::error!(location = %location, message = %message, "Uncaught panic");
        default_hook(info);
    }));
}
