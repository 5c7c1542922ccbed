//! Logger construction helpers.
//!
//! Every component that logs (line search, step optimizer, models, agent)
//! owns a `slog::Logger` and defaults to [`discard_logger`]. With the
//! `obs_slog` feature, [`term_logger`] builds an asynchronous terminal logger
//! filtered at a chosen level, the same drain stack argmin's slog observer
//! uses for solver progress.
use slog::{o, Discard, Logger};

#[cfg(feature = "obs_slog")]
use slog::{Drain, Level, LevelFilter};

/// Logger that drops every record.
pub fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}

/// Asynchronous terminal logger keeping records at `level` or above.
#[cfg(feature = "obs_slog")]
pub fn term_logger(level: Level) -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = LevelFilter::new(drain, level).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!("crate" => env!("CARGO_PKG_NAME")))
}
