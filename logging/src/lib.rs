//! Logging bootstrap shared by binaries and tests.
//!
//! Everything logs through the `log` facade; this crate decides where it
//! goes.  Call [init] once from whatever owns the process.  Calling it
//! again is harmless, so every integration test just calls it first thing.
use std::sync::Once;

static ONCE: Once = Once::new();

/// Install the stderr logger, honoring `RUST_LOG` for filtering.
pub fn init() {
    init_with_default_filter("info");
}

/// Install the stderr logger with a fallback filter used when `RUST_LOG`
/// is unset.
pub fn init_with_default_filter(filter: &str) {
    let filter = filter.to_string();
    ONCE.call_once(move || {
        env_logger::Builder::new()
            .parse_filters(&std::env::var("RUST_LOG").unwrap_or(filter))
            .format(|buf, record| {
                use std::io::Write;

                writeln!(
                    buf,
                    "{} [{}] {} at={}",
                    time::OffsetDateTime::now_utc(),
                    record.level(),
                    record.args(),
                    record.target(),
                )
            })
            .init();
    });
}
