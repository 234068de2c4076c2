//! Debug context attached to responses when debug output is enabled.

use std::panic::Location;

use serde::{Deserialize, Serialize};

/// Where an error was raised and what caused it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebugContext {
    pub file: String,
    pub line: u32,
    /// Most recent first.
    pub trace: Vec<String>,
}

impl DebugContext {
    /// Captures the location of the caller.
    #[track_caller]
    pub fn capture() -> Self {
        Self::at(Location::caller())
    }

    pub fn at(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            trace: Vec::new(),
        }
    }

    /// Captures the caller's location and the `source()` chain of `error`.
    #[track_caller]
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self::capture().with_trace(source_chain(error))
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = trace;
        self
    }
}

/// Display text of `error` and each of its sources, outermost first.
pub fn source_chain(error: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = Some(error);
    while let Some(err) = current {
        chain.push(err.to_string());
        current = err.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io;

    #[test]
    fn test_capture_points_at_caller() {
        let context = DebugContext::capture();
        assert!(context.file.ends_with("debug.rs"));
        assert!(context.line > 0);
        assert!(context.trace.is_empty());
    }

    #[test]
    fn test_from_error_walks_sources() {
        let error = Error::write_error(
            "lang/en/main.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let context = DebugContext::from_error(&error);
        assert_eq!(
            context.trace,
            vec!["failed to write `lang/en/main.json`: denied", "denied"]
        );
    }
}
