//! Job, temperature, motion and raw G-code handlers.
//!
//! Each command becomes one `Intent`; the session reports the outcome
//! through the terminal notifier.

use printdeck_core::{Axis, Heater, Intent, Session};

use crate::cli::{Command, GlobalOpts, JobCommand};
use crate::error::CliError;

use super::util;

fn intent_for(cmd: Command, yes: bool) -> Result<Option<Intent>, CliError> {
    let intent = match cmd {
        Command::Job(args) => match args.command {
            JobCommand::Pause => Intent::PauseJob,
            JobCommand::Resume => Intent::ResumeJob,
            JobCommand::Cancel => {
                if !util::confirm("Cancel the current print?", yes, "job cancel")? {
                    return Ok(None);
                }
                Intent::CancelJob
            }
        },
        Command::Temp { heater, celsius } => Intent::SetTemperature {
            heater: heater.parse::<Heater>()?,
            celsius,
        },
        Command::Move { axis, distance } => Intent::MoveAxis {
            axis: axis.parse::<Axis>().map_err(|_| CliError::Validation {
                field: "axis".into(),
                reason: format!("'{axis}' is not one of x, y, z"),
            })?,
            distance_mm: distance,
        },
        Command::Home { axes } => Intent::Home {
            axes: util::parse_axes(&axes)?,
        },
        Command::Extrude { mm } => Intent::Extrude {
            amount_mm: mm.abs(),
        },
        Command::Retract { mm } => Intent::Extrude {
            amount_mm: -mm.abs(),
        },
        Command::Gcode { lines } => Intent::SendCommands { lines },
        _ => return Ok(None),
    };
    Ok(Some(intent))
}

pub async fn handle(session: &Session, cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(intent) = intent_for(cmd, global.yes)? else {
        return Ok(());
    };
    session.execute(intent).await?;
    Ok(())
}
