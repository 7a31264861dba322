use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Initializes the logging system from `log4rs.yaml` in the working
/// directory if present; otherwise falls back to a stderr console logger.
///
/// # Errors
/// Returns an error if the fallback console config cannot be built.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if Path::new("log4rs.yaml").exists() {
        log4rs::init_file("log4rs.yaml", log4rs::config::Deserializers::default())?;
        return Ok(());
    }
    configure_logging(None, None)?;
    Ok(())
}

/// Configure logging globally: to `{dir}/bookdb.log` when a directory is
/// given, to stderr otherwise. Repeated initialization is ignored.
///
/// # Errors
/// Returns an error if the log directory or file cannot be created.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let lvl = match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    };
    let appender: Box<dyn log4rs::append::Append> = match dir {
        Some(d) => {
            std::fs::create_dir_all(d)?;
            Box::new(
                FileAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(PATTERN)))
                    .build(d.join("bookdb.log"))?,
            )
        }
        None => Box::new(
            ConsoleAppender::builder()
                .target(log4rs::append::console::Target::Stderr)
                .encoder(Box::new(PatternEncoder::new(PATTERN)))
                .build(),
        ),
    };
    let config = Config::builder()
        .appender(Appender::builder().build("main", appender))
        .build(Root::builder().appender("main").build(lvl))?;
    let _ = log4rs::init_config(config);
    Ok(())
}

/// Configure logging from environment variables if present:
/// - `BOOKDB_LOG_DIR`
/// - `BOOKDB_LOG_LEVEL`
pub fn configure_from_env() {
    let dir = std::env::var("BOOKDB_LOG_DIR").ok().map(std::path::PathBuf::from);
    let level = std::env::var("BOOKDB_LOG_LEVEL").ok();
    let _ = configure_logging(dir.as_deref(), level.as_deref());
}
