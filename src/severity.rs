use std::fmt;

/// Severity levels understood by Application Insights trace telemetry.
///
/// Ordered from least to most severe; the discriminants are the integer
/// codes the ingestion API expects in `severityLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    Verbose = 0,
    #[default]
    Information = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

/// Severity used when a record carries no level, or one that is not
/// recognized.
pub const DEFAULT_SEVERITY: Severity = Severity::Information;

impl Severity {
    /// Integer code sent to the backend.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Verbose => "Verbose",
            Severity::Information => "Information",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Critical => "Critical",
        };
        f.write_str(name)
    }
}

/// Level vocabulary of the upstream structured logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
    NoLevel,
    Disabled,
    Custom,
}

fn parse_level(text: &str) -> Option<LogLevel> {
    const NAMED: [(&str, LogLevel); 8] = [
        ("trace", LogLevel::Trace),
        ("debug", LogLevel::Debug),
        ("info", LogLevel::Info),
        ("warn", LogLevel::Warn),
        ("error", LogLevel::Error),
        ("fatal", LogLevel::Fatal),
        ("panic", LogLevel::Panic),
        ("disabled", LogLevel::Disabled),
    ];

    if text.is_empty() {
        return Some(LogLevel::NoLevel);
    }
    if let Some((_, level)) = NAMED.iter().find(|(name, _)| name.eq_ignore_ascii_case(text)) {
        return Some(*level);
    }

    // Numeric levels are accepted as long as they fit the logger's i8 range.
    let numeric: i8 = text.parse().ok()?;
    Some(match numeric {
        -1 => LogLevel::Trace,
        0 => LogLevel::Debug,
        1 => LogLevel::Info,
        2 => LogLevel::Warn,
        3 => LogLevel::Error,
        4 => LogLevel::Fatal,
        5 => LogLevel::Panic,
        6 => LogLevel::NoLevel,
        7 => LogLevel::Disabled,
        _ => LogLevel::Custom,
    })
}

/// Map the text of a record's level field to a [`Severity`].
///
/// Unknown text never fails; it falls back to `default` just like the
/// "no level" and "disabled" sentinels do.
pub fn severity_for_level(text: &str, default: Severity) -> Severity {
    match parse_level(text) {
        Some(LogLevel::Debug) => Severity::Verbose,
        Some(LogLevel::Info) => Severity::Information,
        Some(LogLevel::Warn) => Severity::Warning,
        Some(LogLevel::Error) => Severity::Error,
        Some(LogLevel::Fatal) | Some(LogLevel::Panic) => Severity::Critical,
        Some(LogLevel::Trace)
        | Some(LogLevel::NoLevel)
        | Some(LogLevel::Disabled)
        | Some(LogLevel::Custom)
        | None => default,
    }
}
