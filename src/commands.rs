use crate::constants::{MOTD_MAX_LEN, MOTD_MIN_LEN};
use crate::error::CommandError;
use crate::types::{BlockPos, BoardSize, Flavor, Phase, Role};

pub const COMMAND_PREFIX: char = '!';
pub const SCRIPT_EVENT_NAMESPACE: &str = "challenge";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeCommand {
    Help,
    SetMotdTitle(String),
    SetMotdSubtitle(String),
    SetStart { at: Option<BlockPos> },
    Debug,
    SetPhase(Phase),
    SetFlavor(Option<Flavor>),
    SetRole { player: String, role: Role },
    SetAllowTeamChange { player: String, value: Option<bool> },
    SetSize(BoardSize),
    ClearPads,
}

pub fn help_lines() -> Vec<&'static str> {
    vec![
        "!setmotdtitle <text>, !setmotdsubtitle <text>",
        "!setstart [x y z]  (setup phase)",
        "!setphase <setup|pre|build|vote|post>",
        "!setflavor [regular|goodvibes]",
        "!setrole <player> <player|admin|judge|spectator>",
        "!setallowteamchange <player> [true|false]",
        "!setsize <small|medium|large|xtralarge>  (setup phase)",
        "!clearpads  (setup phase)",
        "!debug",
    ]
}

pub fn script_event_to_message(id: &str, message: &str) -> Option<String> {
    let (namespace, command) = id.trim().split_once(':')?;
    if namespace != SCRIPT_EVENT_NAMESPACE || command.is_empty() {
        return None;
    }
    let message = message.trim();
    if message.is_empty() {
        Some(format!("{COMMAND_PREFIX}{command}"))
    } else {
        Some(format!("{COMMAND_PREFIX}{command} {message}"))
    }
}

pub fn parse_command(input: &str) -> Result<Option<ChallengeCommand>, CommandError> {
    let Some(body) = input.trim().strip_prefix(COMMAND_PREFIX) else {
        return Ok(None);
    };
    let body = body.trim();
    let (word, rest) = match body.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (body, ""),
    };
    let command = word.to_ascii_lowercase();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let parsed = match command.as_str() {
        "" | "help" => ChallengeCommand::Help,
        "setmotdtitle" => ChallengeCommand::SetMotdTitle(parse_motd(rest, "setmotdtitle")?),
        "setmotdsubtitle" => {
            ChallengeCommand::SetMotdSubtitle(parse_motd(rest, "setmotdsubtitle")?)
        }
        "setstart" => match args.as_slice() {
            [] => ChallengeCommand::SetStart { at: None },
            [x, y, z] => ChallengeCommand::SetStart {
                at: Some(BlockPos::new(
                    parse_coord(x)?,
                    parse_coord(y)?,
                    parse_coord(z)?,
                )),
            },
            _ => return Err(CommandError::new("Usage: !setstart [x y z]")),
        },
        "debug" => ChallengeCommand::Debug,
        "setphase" => {
            let [value] = args.as_slice() else {
                return Err(CommandError::new(
                    "Usage: !setphase <setup|pre|build|vote|post>",
                ));
            };
            let phase = Phase::parse(value)
                .ok_or_else(|| CommandError::new(format!("Unknown phase: {value}")))?;
            ChallengeCommand::SetPhase(phase)
        }
        "setflavor" => match args.as_slice() {
            [] => ChallengeCommand::SetFlavor(None),
            [value] => ChallengeCommand::SetFlavor(Some(
                Flavor::parse(value)
                    .ok_or_else(|| CommandError::new(format!("Unknown flavor: {value}")))?,
            )),
            _ => return Err(CommandError::new("Usage: !setflavor [regular|goodvibes]")),
        },
        "setrole" => {
            let Some((player, role)) = rest.rsplit_once(char::is_whitespace) else {
                return Err(CommandError::new("Usage: !setrole <player> <role>"));
            };
            let role = Role::parse(role)
                .filter(|role| *role != Role::Unknown)
                .ok_or_else(|| CommandError::new(format!("Unknown role: {role}")))?;
            ChallengeCommand::SetRole {
                player: player.trim().to_string(),
                role,
            }
        }
        "setallowteamchange" => {
            if rest.is_empty() {
                return Err(CommandError::new(
                    "Usage: !setallowteamchange <player> [true|false]",
                ));
            }
            match rest.rsplit_once(char::is_whitespace) {
                Some((player, flag)) if parse_bool(flag).is_some() => {
                    ChallengeCommand::SetAllowTeamChange {
                        player: player.trim().to_string(),
                        value: parse_bool(flag),
                    }
                }
                _ => ChallengeCommand::SetAllowTeamChange {
                    player: rest.to_string(),
                    value: None,
                },
            }
        }
        "setsize" => {
            let [value] = args.as_slice() else {
                return Err(CommandError::new(
                    "Usage: !setsize <small|medium|large|xtralarge>",
                ));
            };
            let size = BoardSize::parse(value)
                .ok_or_else(|| CommandError::new(format!("Unknown size: {value}")))?;
            ChallengeCommand::SetSize(size)
        }
        "clearpads" => ChallengeCommand::ClearPads,
        _ => {
            return Err(CommandError::new(format!(
                "Unknown command: {command}. Try !help"
            )))
        }
    };
    Ok(Some(parsed))
}

fn parse_motd(text: &str, command: &str) -> Result<String, CommandError> {
    let length = text.chars().count();
    if !(MOTD_MIN_LEN..=MOTD_MAX_LEN).contains(&length) {
        return Err(CommandError::new(format!(
            "Usage: !{command} <text> ({MOTD_MIN_LEN}-{MOTD_MAX_LEN} characters)"
        )));
    }
    Ok(text.to_string())
}

fn parse_coord(value: &str) -> Result<i32, CommandError> {
    value
        .parse::<i32>()
        .map_err(|_| CommandError::new(format!("Invalid coordinate: {value}")))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Some(true),
        "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
