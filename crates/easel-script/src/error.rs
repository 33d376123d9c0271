//! Script errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The source did not parse
    #[error("Syntax error: {0}")]
    Compile(String),

    /// The script raised an error while running
    #[error("{0}")]
    Runtime(String),

    /// The options could not be turned into a script value
    #[error("Invalid script options: {0}")]
    Metadata(String),
}
