//! Logging setup (component H). One call, made at the top of `main`
//! before the store, client, or monitor are constructed.

use log::LevelFilter;

/// Initializes the global logger at `level` (case-insensitive: ERROR,
/// WARN, INFO, DEBUG, TRACE). Falls back to INFO for an unrecognized
/// value rather than failing startup over a typo'd environment variable.
pub fn init(level: &str) {
    let level_filter = level.parse::<LevelFilter>().unwrap_or_else(|_| {
        eprintln!("unrecognized LOG_LEVEL '{level}', defaulting to INFO");
        LevelFilter::Info
    });

    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level_filter)
        .chain(std::io::stdout())
        .apply();

    if let Err(e) = result {
        eprintln!("logger already initialized: {e}");
    }
}
