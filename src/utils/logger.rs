use chrono::Local;
use eyre::Result;
use fern::Dispatch;
use log::LevelFilter;

/// Level used when `RUST_LOG` is unset or unreadable
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Sets up the application logger with console output.
///
/// Records go to stderr so that the simulator's results on stdout stay clean.
///
/// # Errors
/// * If a logger is already installed
pub fn setup_logger() -> Result<()> {
    Dispatch::new()
        .level(level_from_env(std::env::var("RUST_LOG").ok().as_deref()))
        .chain(std::io::stderr())
        // Format log messages with time and log level
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .apply()?;
    Ok(())
}

/// Level filter named by `value`, [`DEFAULT_LEVEL`] if missing or unknown
fn level_from_env(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|level| level.trim().parse().ok())
        .unwrap_or(DEFAULT_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_env() {
        assert_eq!(level_from_env(None), LevelFilter::Info);
        assert_eq!(level_from_env(Some("debug")), LevelFilter::Debug);
        assert_eq!(level_from_env(Some(" WARN ")), LevelFilter::Warn);
        assert_eq!(level_from_env(Some("off")), LevelFilter::Off);
        assert_eq!(level_from_env(Some("chatty")), LevelFilter::Info);
    }
}
