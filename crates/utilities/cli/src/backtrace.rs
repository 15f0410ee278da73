//! Helper to set the backtrace env var.

use std::sync::Once;

static INIT: Once = Once::new();

/// Sets `RUST_BACKTRACE=1` unless a value was already provided.
///
/// Must be called before any other thread is spawned.
pub fn enable() {
    INIT.call_once(|| {
        if std::env::var_os("RUST_BACKTRACE").is_none() {
            // SAFETY: called once from `main` before the runtime starts any threads.
            unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtrace_enable_is_idempotent() {
        enable();
        let first = std::env::var_os("RUST_BACKTRACE");
        assert!(first.is_some());

        enable();
        assert_eq!(std::env::var_os("RUST_BACKTRACE"), first);
    }
}
