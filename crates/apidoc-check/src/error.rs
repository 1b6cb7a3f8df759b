//! Error types for the apidoc-check crate.

use std::backtrace::Backtrace;
use std::fmt;
use std::io;

/// Error type for snapshot checking.
///
/// Covers failures to read, parse or write data. Problems with the
/// snapshot's content are diagnostics in the [`crate::Report`], not errors.
#[derive(Debug)]
pub struct CheckError {
    kind: CheckErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Use the `is_xxx()` methods to classify.
#[derive(Debug)]
pub(crate) enum CheckErrorKind {
    /// Reading the input stream failed.
    Read(io::Error),
    /// The input is not a snapshot.
    Parse(serde_json::Error),
    /// The report, snapshot or schema could not be encoded.
    Serialization(serde_json::Error),
    /// Writing the output stream failed.
    Write(io::Error),
}

impl CheckError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: CheckErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    pub(crate) fn read(err: io::Error) -> Self {
        Self::new(CheckErrorKind::Read(err))
    }

    pub(crate) fn parse(err: serde_json::Error) -> Self {
        Self::new(CheckErrorKind::Parse(err))
    }

    pub(crate) fn write(err: io::Error) -> Self {
        Self::new(CheckErrorKind::Write(err))
    }

    /// Splits an encoder error into a failed write and a real encoding
    /// failure.
    pub(crate) fn encode(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::write(err.into())
        } else {
            Self::new(CheckErrorKind::Serialization(err))
        }
    }

    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, CheckErrorKind::Parse(_))
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, CheckErrorKind::Serialization(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self.kind, CheckErrorKind::Read(_) | CheckErrorKind::Write(_))
    }

    /// Returns true if the input ended in the middle of a snapshot.
    pub fn is_truncated(&self) -> bool {
        matches!(&self.kind, CheckErrorKind::Parse(err) if err.is_eof())
    }

    /// Line and column of the input where parsing stopped.
    pub fn location(&self) -> Option<(usize, usize)> {
        match &self.kind {
            CheckErrorKind::Parse(err) if err.line() > 0 => {
                Some((err.line(), err.column()))
            }
            _ => None,
        }
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for CheckErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckErrorKind::Read(err) => {
                write!(f, "failed to read input: {err}")
            }
            CheckErrorKind::Parse(err) => {
                write!(f, "input is not a snapshot: {err}")
            }
            CheckErrorKind::Serialization(err) => {
                write!(f, "failed to encode output: {err}")
            }
            CheckErrorKind::Write(err) => {
                write!(f, "failed to write output: {err}")
            }
        }
    }
}

impl fmt::Display for CheckError {
    /// Formats the error with a summary and the captured backtrace.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;

        // Empty unless RUST_BACKTRACE is set.
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            CheckErrorKind::Parse(err)
            | CheckErrorKind::Serialization(err) => Some(err),
            CheckErrorKind::Read(err) | CheckErrorKind::Write(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::error::Error;

    use super::*;
    use crate::{CheckOptions, NormalizeOptions, check, normalize};

    /// A stream whose every read and write fails.
    struct Unplugged;

    impl io::Read for Unplugged {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device unplugged"))
        }
    }

    impl io::Write for Unplugged {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("device unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    const SNAPSHOT: &str = r#"{"name": "expo-camera", "children": []}"#;

    #[test]
    fn test_truncated_snapshot() {
        let input = &SNAPSHOT.as_bytes()[..20];
        let err = check(input, Vec::new(), &CheckOptions::default())
            .unwrap_err();

        assert!(err.is_deserialization());
        assert!(err.is_truncated());
        assert!(!err.is_io());
        assert_eq!(err.location().map(|(line, _)| line), Some(1));
        assert!(err.to_string().starts_with("input is not a snapshot"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_wrong_shape() {
        let err = check(
            r#"{"name": 3, "children": []}"#.as_bytes(),
            Vec::new(),
            &CheckOptions::default(),
        )
        .unwrap_err();

        assert!(err.is_deserialization());
        assert!(!err.is_truncated());
        assert!(err.to_string().contains("invalid type: integer `3`"));
    }

    #[test]
    fn test_trailing_input() {
        let input = format!("{SNAPSHOT} {SNAPSHOT}");
        let err = normalize(
            input.as_bytes(),
            Vec::new(),
            &NormalizeOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_deserialization());
        assert!(err.location().is_some());
    }

    #[test]
    fn test_read_failure() {
        let err = check(Unplugged, Vec::new(), &CheckOptions::default())
            .unwrap_err();

        assert!(err.is_io());
        assert!(err.location().is_none());
        assert!(err.to_string().contains("failed to read input"));
        assert!(err.to_string().contains("device unplugged"));
    }

    #[test]
    fn test_write_failure() {
        for result in [
            check(SNAPSHOT.as_bytes(), Unplugged, &CheckOptions::default())
                .map(drop),
            normalize(
                SNAPSHOT.as_bytes(),
                Unplugged,
                &NormalizeOptions::default(),
            )
            .map(drop),
        ] {
            let err = result.unwrap_err();
            assert!(err.is_io());
            assert!(!err.is_serialization());
            assert!(err.to_string().contains("failed to write output"));
        }
    }

    #[test]
    fn test_encoding_failure() {
        let keys = HashMap::from([((1, 2), "tuple keys")]);
        let err = CheckError::encode(serde_json::to_string(&keys).unwrap_err());

        assert!(err.is_serialization());
        assert!(!err.is_io());
        assert!(err.to_string().contains("failed to encode output"));
        let _ = err.backtrace();
    }
}
