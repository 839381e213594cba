//! Generator errors.

use std::fmt;
use std::path::PathBuf;

use retro_binds_core::BindsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file is not valid Rust.
    #[error("{path}:{line}:{column}: {message}")]
    Syntax {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// Declarations failed validation or resolution.
    #[error("{}", Report(.0))]
    Declarations(Vec<BindsError>),

    #[error("invalid generator config: {0}")]
    Config(String),

    #[error("invalid generator config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to render output: {0}")]
    Format(#[from] fmt::Error),
}

impl GenerateError {
    /// Declaration errors, if this is a validation failure.
    pub fn declarations(&self) -> &[BindsError] {
        match self {
            GenerateError::Declarations(errors) => errors,
            _ => &[],
        }
    }
}

impl From<Vec<BindsError>> for GenerateError {
    fn from(errors: Vec<BindsError>) -> Self {
        GenerateError::Declarations(errors)
    }
}

/// One error per line, with a trailing count when there are several.
struct Report<'a>(&'a [BindsError]);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "error: {err}")?;
        }
        if self.0.len() > 1 {
            write!(f, "\n{} binding errors", self.0.len())?;
        }
        Ok(())
    }
}
