//! The logging capability handed to components
//!
//! Components take a `Log` instead of a whole application context.
//! `ConsoleLog` is the stand-in used before a real `LogBuffer` exists.

use super::content::Content;
use super::level::Severity;

/// Something that accepts leveled log content
pub trait Log {
    /// Add content at the given severity
    fn add(&mut self, content: Content, severity: Severity);

    /// Push pending content to its outputs
    fn flush(&mut self);

    /// Log an error, flush, and terminate
    fn fatal(&mut self, content: Content) -> !;

    /// Log an error and terminate the process
    fn error(&mut self, content: impl Into<Content>) -> !
    where
        Self: Sized,
    {
        self.fatal(content.into())
    }

    /// Plain output
    fn print(&mut self, content: impl Into<Content>)
    where
        Self: Sized,
    {
        self.add(content.into(), Severity::Print)
    }

    fn warning(&mut self, content: impl Into<Content>)
    where
        Self: Sized,
    {
        self.add(content.into(), Severity::Warning)
    }

    fn notice(&mut self, content: impl Into<Content>)
    where
        Self: Sized,
    {
        self.add(content.into(), Severity::Notice)
    }

    fn debug(&mut self, content: impl Into<Content>)
    where
        Self: Sized,
    {
        self.add(content.into(), Severity::Debug)
    }
}

/// Unbuffered logger that prints every line straight to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

impl ConsoleLog {
    fn prefix(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => "[ ERROR ] ",
            Severity::Print => "",
            Severity::Warning => "[WARNING] ",
            Severity::Notice => "[NOTICE ] ",
            Severity::Debug => "[ DEBUG ] ",
        }
    }
}

impl Log for ConsoleLog {
    fn add(&mut self, content: Content, severity: Severity) {
        let prefix = Self::prefix(severity);
        for line in content.lines() {
            println!("{}{}", prefix, line);
        }
    }

    fn flush(&mut self) {}

    fn fatal(&mut self, content: Content) -> ! {
        self.add(content, Severity::Error);
        std::process::exit(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(Severity, Vec<String>)>,
    }

    impl Log for Recorder {
        fn add(&mut self, content: Content, severity: Severity) {
            self.seen.push((severity, content.into_lines()));
        }

        fn flush(&mut self) {}

        fn fatal(&mut self, _content: Content) -> ! {
            panic!("fatal")
        }
    }

    #[test]
    fn test_shortcuts_use_reserved_levels() {
        let mut log = Recorder::default();
        log.print("p");
        log.warning("w");
        log.notice("n");
        log.debug("d");
        let levels: Vec<Severity> = log.seen.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            levels,
            vec![
                Severity::Print,
                Severity::Warning,
                Severity::Notice,
                Severity::Debug
            ]
        );
    }

    #[test]
    fn test_console_prefixes() {
        assert_eq!(ConsoleLog::prefix(Severity::Print), "");
        assert_eq!(ConsoleLog::prefix(Severity::Warning), "[WARNING] ");
        assert_eq!(ConsoleLog::prefix(Severity::Error), "[ ERROR ] ");
    }
}
