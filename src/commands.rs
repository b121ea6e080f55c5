//! Front-end commands
//!
//! Parses one line of user input and applies it to the [`AppState`].

use std::path::PathBuf;

use crate::form::FormField;
use crate::image::SelectedFile;
use crate::logging;
use crate::state::{AppState, Pipeline};
use crate::{log_debug, log_error};

const MODULE: &str = "commands";

pub const HELP: &str = "\
Commands:
  form                     switch to the form input tab
  image                    switch to the image upload tab
  set <field> <value>      edit a field (brand, model_year, mileage, fuel_type,
                           transmission, horsepower, engine_size, has_accident,
                           is_clean_title)
  select <path> [mime]     choose an image file (MIME type guessed from extension)
  submit                   predict with the active tab
  retry                    restart from the connection check
  show                     redraw the screen
  logs                     print recent log lines
  help                     show this help
  quit                     exit
";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tab(Pipeline),
    Set { field: FormField, value: String },
    Select { path: PathBuf, mime: Option<String> },
    Submit,
    Retry,
    Show,
    Logs,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "form" => Ok(Command::Tab(Pipeline::Form)),
            "image" => Ok(Command::Tab(Pipeline::Image)),
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err("Usage: set <field> <value>".to_string());
                }
                Ok(Command::Set {
                    field: field.parse()?,
                    value: value.to_string(),
                })
            }
            "select" => {
                if rest.is_empty() {
                    return Err("Usage: select <path> [mime]".to_string());
                }
                let (path, mime) = match rest.rsplit_once(char::is_whitespace) {
                    Some((path, mime)) if looks_like_mime(mime) => {
                        (path.trim(), Some(mime.to_string()))
                    }
                    _ => (rest, None),
                };
                Ok(Command::Select {
                    path: PathBuf::from(path),
                    mime,
                })
            }
            "submit" => Ok(Command::Submit),
            "retry" => Ok(Command::Retry),
            "show" | "" => Ok(Command::Show),
            "logs" => Ok(Command::Logs),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command: {} (type `help`)", other)),
        }
    }
}

/// Top-level MIME types accepted as an explicit override
const MIME_KINDS: &[&str] = &["image", "application", "text", "video", "audio"];

fn looks_like_mime(token: &str) -> bool {
    match token.split_once('/') {
        Some((kind, sub)) => MIME_KINDS.contains(&kind) && !sub.is_empty() && !sub.contains('/'),
        None => false,
    }
}

/// What the front-end should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Redraw the screen
    Render,
    /// Print a message, then redraw
    Message(String),
    /// Print text without redrawing
    Text(String),
    Quit,
}

pub async fn execute(state: &mut AppState, command: Command) -> Reply {
    log_debug!(MODULE, "Executing {:?}", command);

    match command {
        Command::Tab(pipeline) => {
            state.set_active(pipeline);
            Reply::Render
        }
        Command::Set { field, value } => match state.set_field(field, value) {
            Ok(()) => Reply::Render,
            Err(e) => Reply::Message(e),
        },
        Command::Select { path, mime } => {
            match SelectedFile::from_path(&path, mime.as_deref()).await {
                Ok(file) => match state.select_image(file).await {
                    Ok(()) => Reply::Render,
                    Err(e) => Reply::Message(e),
                },
                Err(e) => {
                    log_error!(MODULE, "Cannot select {}: {}", path.display(), e);
                    Reply::Message(e)
                }
            }
        }
        Command::Submit => {
            state.submit().await;
            Reply::Render
        }
        Command::Retry => {
            state.retry().await;
            Reply::Render
        }
        Command::Show => Reply::Render,
        Command::Logs => Reply::Text(logging::get_logs().join("\n")),
        Command::Help => Reply::Text(HELP.to_string()),
        Command::Quit => Reply::Quit,
    }
}
