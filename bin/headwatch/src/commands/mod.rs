//! Contains subcommands for headwatch.

mod watch;
pub use watch::WatchCommand;

mod check;
pub use check::CheckCommand;
