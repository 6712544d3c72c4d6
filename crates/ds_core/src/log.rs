//! Six-level logging (spec.md §6), layered over the widely used `log`
//! crate rather than a bespoke sink, matching how this engine's other
//! subsystems log.
//!
//! DeepSea's original C logging facility is a function-pointer table
//! (`Trace | Debug | Info | Warning | Error | Fatal`, plus `userData`, `tag`,
//! and source position) with a default sink that writes `< Warning` to
//! stdout and `>= Warning` to stderr. Rather than re-invent that on top of
//! raw `print!`, this module expresses the same six-level taxonomy as a thin
//! layer over the `log` crate: [`Level`] maps onto `log::Level` (with `Fatal`
//! folded into `Error` plus a marker, since `log` has no fifth level), and
//! [`install_default_sink`] installs a `log::Log` implementation with the
//! stdout/stderr split spec.md describes.

use std::io::Write as _;

/// The six severities from spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    /// Unrecoverable; logged at [`log::Level::Error`] with a `FATAL` marker.
    /// DeepSea does not abort on the caller's behalf — callers that want
    /// process termination do so explicitly after logging.
    Fatal,
}

impl Level {
    fn to_log_level(self) -> log::Level {
        match self {
            Level::Trace => log::Level::Trace,
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
            Level::Warning => log::Level::Warn,
            Level::Error | Level::Fatal => log::Level::Error,
        }
    }
}

/// Logs `message` under `tag` at `level`, attributing the call site.
///
/// Mirrors the six-argument shape (`userData, tag, file, function, line,
/// message`) this subsystem's logging is modeled on; `userData` has no
/// equivalent here since the `log` crate's global logger already carries
/// whatever state its implementation needs.
#[track_caller] // not log::Record's ordinary caller, but gives a free `file/line` fallback
pub fn log_message(level: Level, tag: &str, file: &str, line: u32, message: &str) {
    let prefix = if level == Level::Fatal { "FATAL: " } else { "" };
    log::logger().log(
        &log::Record::builder()
            .level(level.to_log_level())
            .target(tag)
            .file(Some(file))
            .line(Some(line))
            .args(format_args!("{prefix}{message}"))
            .build(),
    );
}

/// `log!(Level::Warning, "MyTag", "ran out of buffer space")`
#[macro_export]
macro_rules! ds_log {
    ($level:expr, $tag:expr, $($arg:tt)*) => {
        $crate::log::log_message($level, $tag, file!(), line!(), &format!($($arg)*))
    };
}

/// A `log::Log` implementation matching spec.md §6's default sink: severities
/// below `Warning` go to stdout, `Warning` and above go to stderr. (The
/// original additionally mirrors to the debugger console on Windows; there
/// is no equivalent console API available from stable Rust without a
/// platform crate, so that mirroring is intentionally omitted here.)
struct DefaultSink;

impl log::Log for DefaultSink {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let line = format!(
            "[{level}] {target}: {args}",
            level = record.level(),
            target = record.target(),
            args = record.args()
        );
        if record.level() >= log::Level::Warn {
            let _ = writeln!(std::io::stderr(), "{line}");
        } else {
            let _ = writeln!(std::io::stdout(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

/// Installs DeepSea's default log sink as the global `log` crate logger.
///
/// Safe to call more than once; subsequent calls are no-ops (the `log` crate
/// only accepts the first `set_logger` call per process). Host applications
/// that want their own sink (e.g. `env_logger`) should call their own
/// `set_logger`-equivalent instead of this function.
pub fn install_default_sink() {
    static SINK: DefaultSink = DefaultSink;
    // `set_logger` fails if a logger is already installed; that's fine, it
    // just means the host application installed its own sink first.
    let _ = log::set_logger(&SINK);
    log::set_max_level(log::LevelFilter::Trace);
}
