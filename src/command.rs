//! Client → server command parsing
//!
//! A line starting with `/` is a command, unless it is `//…` (escaped
//! literal slash) or just `/`. Arguments are separated by single spaces;
//! trailing empty tokens are ignored.

use crate::error::CommandError;

/// A parsed client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/nick <name>`
    Nick(String),
    /// `/join <room>`
    Join(String),
    /// `/leave`
    Leave,
    /// `/bye`
    Bye,
    /// `/priv <nick> <text>`
    Priv { to: String, text: String },
    /// Chat text for the current room
    Text(String),
}

impl Command {
    /// Parse one decoded line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Text(line.to_string()));
        };
        if rest.is_empty() || rest.starts_with('/') {
            return Ok(Command::Text(rest.to_string()));
        }

        let tokens = tokens(line);
        let name = tokens.first().copied().unwrap_or_default();
        match name {
            "/nick" => single_argument(&tokens, "/nick").map(Command::Nick),
            "/join" => single_argument(&tokens, "/join").map(Command::Join),
            "/leave" => no_arguments(&tokens, "/leave").map(|_| Command::Leave),
            "/bye" => no_arguments(&tokens, "/bye").map(|_| Command::Bye),
            "/priv" => {
                if tokens.len() < 3 {
                    return Err(CommandError::WrongArity("/priv"));
                }
                let to = tokens[1];
                let text_start = name.len() + to.len() + 2;
                Ok(Command::Priv {
                    to: to.to_string(),
                    text: line[text_start..].to_string(),
                })
            }
            // Unknown commands are chat text without the slash
            _ => Ok(Command::Text(rest.to_string())),
        }
    }
}

/// Split on single spaces, dropping trailing empty tokens
fn tokens(line: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = line.split(' ').collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

fn single_argument(tokens: &[&str], command: &'static str) -> Result<String, CommandError> {
    match tokens {
        [_, arg] => Ok((*arg).to_string()),
        _ => Err(CommandError::WrongArity(command)),
    }
}

fn no_arguments(tokens: &[&str], command: &'static str) -> Result<(), CommandError> {
    if tokens.len() == 1 {
        Ok(())
    } else {
        Err(CommandError::WrongArity(command))
    }
}
