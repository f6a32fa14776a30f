//! # Ctl Core Console Errors
//!
//! Defines [`ConsoleError`], raised while resolving, parsing or dispatching
//! console commands.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Command \"{name}\" is not defined.{}", did_you_mean(.alternatives))]
    CommandNotFound {
        name: String,
        alternatives: Vec<String>,
    },

    /// The arguments were rejected; `message` carries the usage text.
    #[error("{message}")]
    InvalidInput {
        command: Option<String>,
        message: String,
    },

    #[error("A command named \"{name}\" is already registered")]
    DuplicateCommand { name: String },

    #[error("Command name \"{name}\" is invalid")]
    InvalidCommandName { name: String },
}

fn did_you_mean(alternatives: &[String]) -> String {
    match alternatives {
        [] => String::new(),
        [single] => format!("\n\nDid you mean this?\n    {}", single),
        many => format!("\n\nDid you mean one of these?\n    {}", many.join("\n    ")),
    }
}
