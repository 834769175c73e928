#[cfg(feature = "cli")]
use crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};
#[cfg(feature = "cli")]
use std::fmt::Write;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Success,
    Error,
    Info,
    Warning,
    Watch,
    Debug,
    Action,
}

/// Captured log lines, shared between a capturing logger and its readers.
pub type CaptureSink = Arc<Mutex<Vec<(LogLevel, String)>>>;

/// Terminal logger handed to every component at construction.
///
/// Debug lines are dropped unless the logger was built with debug output
/// enabled. A capturing logger keeps every line in memory instead of
/// printing it, which is what the tests assert against.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    debug: bool,
    capture: Option<CaptureSink>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(debug: bool) -> Self {
        Self {
            debug,
            capture: None,
        }
    }

    /// Logger that records lines (debug included) instead of printing them.
    pub fn capturing() -> Self {
        Self {
            debug: true,
            capture: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Snapshot of captured lines. Empty for a printing logger.
    pub fn captured(&self) -> Vec<(LogLevel, String)> {
        match &self.capture {
            Some(sink) => sink.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            None => Vec::new(),
        }
    }

    /// True when a captured line at `level` contains `needle`.
    pub fn has_logged(&self, level: LogLevel, needle: &str) -> bool {
        self.captured()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if level == LogLevel::Debug && !self.debug {
            return;
        }
        match &self.capture {
            Some(sink) => sink
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((level, message.as_ref().to_string())),
            None => self.print_line(level, message.as_ref()),
        }
    }

    pub fn log_with_details<I, S>(&self, level: LogLevel, message: impl AsRef<str>, details: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.log(level, message);
        for detail in details {
            self.print_detail(detail.as_ref());
        }
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Success, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    pub fn watch(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Watch, message);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn action(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Action, message);
    }

    fn print_detail(&self, detail: &str) {
        if self.capture.is_some() {
            return;
        }
        #[cfg(feature = "cli")]
        {
            println!("   ↳ {}", detail);
        }
        #[cfg(not(feature = "cli"))]
        {
            println!("   -> {}", detail);
        }
    }

    fn print_line(&self, level: LogLevel, message: &str) {
        #[cfg(feature = "cli")]
        {
            println!("{}", self.render_colored_line(level, message));
        }
        #[cfg(not(feature = "cli"))]
        {
            println!("[{}] {}", level.as_label(), message);
        }
    }

    #[cfg(feature = "cli")]
    fn render_colored_line(&self, level: LogLevel, message: &str) -> String {
        let mut out = String::new();
        let (emoji, color) = level.visuals();

        out.push_str(emoji);
        out.push(' ');
        out.push_str(&render_signature());
        out.push(' ');
        out.push_str(&render_status(level, color));
        out.push(' ');
        out.push_str(message);
        out
    }
}

#[cfg(feature = "cli")]
fn render_signature() -> String {
    let mut s = String::new();
    let _ = write!(&mut s, "{}", SetForegroundColor(Color::Grey));
    s.push('[');
    let _ = write!(
        &mut s,
        "{}",
        SetForegroundColor(Color::Rgb {
            r: 36,
            g: 199,
            b: 181,
        })
    );
    let _ = write!(&mut s, "{}", SetAttribute(Attribute::Bold));
    s.push_str("Duet");
    let _ = write!(&mut s, "{}", SetAttribute(Attribute::Reset));
    let _ = write!(&mut s, "{}", SetForegroundColor(Color::Grey));
    s.push(']');
    let _ = write!(&mut s, "{}", ResetColor);
    s
}

#[cfg(feature = "cli")]
fn render_status(level: LogLevel, color: Color) -> String {
    let mut s = String::new();
    let _ = write!(&mut s, "{}", SetForegroundColor(color));
    let _ = write!(&mut s, "{}", SetAttribute(Attribute::Bold));
    s.push('[');
    s.push_str(level.as_label());
    s.push(']');
    let _ = write!(&mut s, "{}", SetAttribute(Attribute::Reset));
    let _ = write!(&mut s, "{}", ResetColor);
    s
}

impl LogLevel {
    pub fn as_label(self) -> &'static str {
        match self {
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Watch => "WATCH",
            LogLevel::Debug => "DEBUG",
            LogLevel::Action => "ACTION",
        }
    }

    #[cfg(feature = "cli")]
    fn visuals(self) -> (&'static str, Color) {
        match self {
            LogLevel::Success => (
                "✅",
                Color::Rgb {
                    r: 76,
                    g: 175,
                    b: 80,
                },
            ),
            LogLevel::Error => (
                "❌",
                Color::Rgb {
                    r: 244,
                    g: 67,
                    b: 54,
                },
            ),
            LogLevel::Info => (
                "ℹ️ ",
                Color::Rgb {
                    r: 33,
                    g: 150,
                    b: 243,
                },
            ),
            LogLevel::Warning => (
                "⚠️",
                Color::Rgb {
                    r: 255,
                    g: 152,
                    b: 0,
                },
            ),
            LogLevel::Watch => (
                "👀",
                Color::Rgb {
                    r: 171,
                    g: 71,
                    b: 188,
                },
            ),
            LogLevel::Debug => (
                "🛠️",
                Color::Rgb {
                    r: 121,
                    g: 134,
                    b: 203,
                },
            ),
            LogLevel::Action => (
                "🎹",
                Color::Rgb {
                    r: 0,
                    g: 188,
                    b: 212,
                },
            ),
        }
    }
}

#[cfg(test)]
#[path = "test_logger.rs"]
mod tests;
