//! Command dispatch: bridges CLI args -> core intents -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod files;
pub mod printers;
pub mod status;
pub mod util;

use printdeck_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Printers(args) => printers::handle(session, args, global).await,
        Command::Status(args) => status::handle(session, args, global).await,
        Command::Files(args) => files::handle(session, args, global).await,
        Command::Job(_)
        | Command::Temp { .. }
        | Command::Move { .. }
        | Command::Home { .. }
        | Command::Extrude { .. }
        | Command::Retract { .. }
        | Command::Gcode { .. } => control::handle(session, cmd, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
