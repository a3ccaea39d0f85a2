//! Terminal front end: command parsing and text rendering.
//!
//! Parsing turns a typed line into an [`Intent`] for the current step, so the
//! state machine only ever sees validated domain values. Rendering is a pure
//! function of the session.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::ai::DocumentSelection;
use crate::domain::{NewsField, NewsItem, NewsRegion, Role, ViewStep};
use crate::error::FlowError;
use crate::session::{Intent, LoginForm, Modal, Session};

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Intent(Intent),
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Type a command, or 'help'")]
    Empty,

    #[error("Unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// Parse one input line in the context of the session's current step.
pub fn parse_command(session: &Session, line: &str) -> Result<Command, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ConsoleError::Empty);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let keyword = head.to_ascii_lowercase();

    match keyword.as_str() {
        "quit" | "exit" => return Ok(Command::Quit),
        "help" | "?" => return Ok(Command::Help),
        "back" => return Ok(Command::Intent(Intent::Back)),
        "reload" => return Ok(Command::Intent(Intent::Reload)),
        "ok" | "continue" => return Ok(Command::Intent(Intent::AcknowledgeModal)),
        _ => {}
    }

    let intent = match session.step() {
        ViewStep::Login => Intent::SubmitLogin(LoginForm::new(line)),
        ViewStep::RoleSelect => match keyword.as_str() {
            "1" | "citizen" => Intent::PickRole(Role::Citizen),
            "2" | "reporter" => Intent::PickRole(Role::Reporter),
            _ => return Err(ConsoleError::Unknown(line.to_string())),
        },
        ViewStep::Verification => match keyword.as_str() {
            "upload" if !rest.is_empty() => {
                Intent::SelectDocument(DocumentSelection::from_path(rest)?)
            }
            "upload" => return Err(ConsoleError::Usage("upload <path-to-image>")),
            "verify" => Intent::SubmitVerification,
            _ => return Err(ConsoleError::Unknown(line.to_string())),
        },
        ViewStep::FieldSelect => Intent::PickField(
            parse_field(line).ok_or_else(|| ConsoleError::Unknown(line.to_string()))?,
        ),
        ViewStep::RegionSelect => {
            if let Some(region) = parse_region(line) {
                Intent::PickRegion(region)
            } else if keyword == "confirm" {
                Intent::ConfirmLocation
            } else if session
                .selected_region()
                .is_some_and(NewsRegion::requires_location)
            {
                Intent::ChooseLocation(line.to_string())
            } else {
                return Err(ConsoleError::Unknown(line.to_string()));
            }
        }
        ViewStep::Dashboard => match keyword.as_str() {
            "open" => {
                let n: usize = rest
                    .parse()
                    .map_err(|_| ConsoleError::Usage("open <story number>"))?;
                let item = n
                    .checked_sub(1)
                    .and_then(|i| session.news_feed().get(i))
                    .ok_or_else(|| FlowError::UnknownArticle(rest.to_string()))?;
                Intent::OpenArticle(item.id.clone())
            }
            "close" => Intent::CloseArticle,
            "topics" | "topic" => Intent::ChangeTopic,
            _ => return Err(ConsoleError::Unknown(line.to_string())),
        },
    };
    Ok(Command::Intent(intent))
}

fn parse_field(input: &str) -> Option<NewsField> {
    let wanted = input.trim().to_ascii_lowercase();
    NewsField::ALL.iter().enumerate().find_map(|(i, field)| {
        let matches = wanted == (i + 1).to_string()
            || wanted == field.label().to_ascii_lowercase()
            || field
                .label()
                .to_ascii_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| !word.is_empty() && word == wanted);
        matches.then_some(*field)
    })
}

fn parse_region(input: &str) -> Option<NewsRegion> {
    let wanted = input.trim().to_ascii_lowercase();
    NewsRegion::ALL.iter().enumerate().find_map(|(i, region)| {
        let label = region.label().to_ascii_lowercase();
        let short = label.trim_end_matches("-wise");
        (wanted == (i + 1).to_string() || wanted == label || wanted == short).then_some(*region)
    })
}

/// Area name for the loading indicator if `intent` is about to query news.
///
/// Taken before dispatch, since the session is borrowed while the call runs.
pub fn loading_label(session: &Session, intent: &Intent) -> Option<String> {
    match intent {
        Intent::PickRegion(region) if !region.requires_location() => {
            Some(region.label().to_string())
        }
        Intent::ConfirmLocation => session.pending_location().map(str::to_string),
        _ => None,
    }
}

/// Commands accepted on the current step.
pub fn help_text(session: &Session) -> String {
    let step_help = match session.step() {
        ViewStep::Login => "<email>             log in",
        ViewStep::RoleSelect => "citizen | reporter  choose a role",
        ViewStep::Verification => "upload <path>       pick an ID image\n  verify              submit it",
        ViewStep::FieldSelect => "<number|name>       choose a topic",
        ViewStep::RegionSelect => {
            "<number|name>       choose a region\n  <state|country>     choose a location\n  confirm             load news"
        }
        ViewStep::Dashboard => {
            "open <n>            read a story\n  close               close the story\n  topics              choose another topic"
        }
    };
    format!(
        "Commands:\n  {}\n  ok                  dismiss a dialog\n  back                go back\n  reload              start over\n  quit                exit\n",
        step_help
    )
}

/// Render the current screen.
pub fn render(session: &Session) -> String {
    Screen(session).to_string()
}

/// The current screen of a session, as terminal text.
struct Screen<'a>(&'a Session);

impl fmt::Display for Screen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.0;

        if let Some(modal) = session.modal() {
            return match modal {
                Modal::Error(message) => {
                    writeln!(f, "{}\n  {}\n  [ok]", "ERROR".red().bold(), message)
                }
                Modal::Success(message) => writeln!(
                    f,
                    "{}\n  {}\n  [continue]",
                    "SUCCESS".green().bold(),
                    message
                ),
            };
        }

        if let Some(item) = session.selected_article() {
            return write_article(f, item);
        }

        match session.step() {
            ViewStep::Login => {
                writeln!(f, "{}", "InfoSphere".cyan().bold())?;
                writeln!(f, "Enter your email to sign in:")
            }
            ViewStep::RoleSelect => writeln!(f, "Choose your role:\n  1. Citizen\n  2. Reporter"),
            ViewStep::Verification => {
                writeln!(f, "Reporter verification: upload a government ID.")?;
                match session.id_proof() {
                    Some(doc) => {
                        writeln!(f, "  Selected: {} ({})", doc.file_name(), doc.media_type)?
                    }
                    None => writeln!(f, "  No document selected.")?,
                }
                if session.is_verifying() {
                    writeln!(f, "  Verifying...")?;
                }
                Ok(())
            }
            ViewStep::FieldSelect => {
                writeln!(f, "Choose a topic:")?;
                for (i, field) in NewsField::ALL.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, field)?;
                }
                Ok(())
            }
            ViewStep::RegionSelect => {
                writeln!(f, "Choose a region:")?;
                for (i, region) in NewsRegion::ALL.iter().enumerate() {
                    let marker = if session.selected_region() == Some(*region) {
                        "*"
                    } else {
                        " "
                    };
                    writeln!(f, " {}{}. {}", marker, i + 1, region)?;
                }
                if let Some(catalog) =
                    session.selected_region().and_then(NewsRegion::location_catalog)
                {
                    writeln!(f, "Options: {}", catalog.join(", "))?;
                    match session.pending_location() {
                        Some(loc) => writeln!(f, "Selected: {} (type 'confirm')", loc)?,
                        None => writeln!(f, "Type a name to select it.")?,
                    }
                }
                Ok(())
            }
            ViewStep::Dashboard => {
                let heading = session.dashboard_heading().unwrap_or_default();
                writeln!(f, "{}", heading.to_uppercase().cyan().bold())?;
                if session.news_feed().is_empty() {
                    writeln!(f, "No news found. Go back to try another selection.")?;
                }
                for (i, item) in session.news_feed().iter().enumerate() {
                    writeln!(f, "  {}. [{}] {}", i + 1, item.tag, item.title)?;
                }
                Ok(())
            }
        }
    }
}

fn write_article(f: &mut fmt::Formatter<'_>, item: &NewsItem) -> fmt::Result {
    writeln!(f, "STORY_ID: {}", item.story_id())?;
    writeln!(f, "{}", item.title.to_uppercase().bold())?;
    writeln!(
        f,
        "Reporter: {} | Posted: {} | Location: {} | Tag: {}",
        item.reporter_id,
        item.posted_date.format("%H:%M:%S"),
        item.region,
        item.tag
    )?;
    if let Some(image) = &item.image_url {
        writeln!(f, "Image: {}", image)?;
    }
    writeln!(f, "\n{}\n", item.description)?;
    if !item.sources.is_empty() {
        writeln!(f, "{}", "Verified Sources".cyan())?;
        for src in &item.sources {
            writeln!(f, "  - {} <{}>", src.title, src.uri)?;
        }
    }
    Ok(())
}
