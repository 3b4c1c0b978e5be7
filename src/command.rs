//! Command surface
//!
//! Labels, aliases and permission nodes, plus parsing of raw arguments into
//! a typed [`Command`]. Execution lives on the optimizer.

/// Permission nodes
pub mod permissions {
    /// Grants every command and marks a player as an admin
    pub const ADMIN: &str = "serveropt.admin";
    pub const OPTIMIZE: &str = "serveropt.command.optimize";
    pub const TPS: &str = "serveropt.command.tps";
    pub const LAG: &str = "serveropt.command.lag";
    pub const VIEW_DISTANCE: &str = "serveropt.command.viewdistance";
}

/// Whoever issued a command (player or console)
pub trait CommandSender {
    fn name(&self) -> &str;
    fn has_permission(&self, permission: &str) -> bool;
}

/// The server console; holds every permission
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSender;

impl CommandSender for ConsoleSender {
    fn name(&self) -> &str {
        "CONSOLE"
    }

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }
}

/// Command failures, distinct from a successful reply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("You do not have permission to use this command! ({0})")]
    PermissionDenied(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Player not found: {0}")]
    PlayerNotFound(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl From<crate::monitor::view_distance::ViewDistanceError> for CommandError {
    fn from(e: crate::monitor::view_distance::ViewDistanceError) -> Self {
        CommandError::InvalidArgument(e.to_string())
    }
}

/// Top-level command labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Optimize,
    Tps,
    Lag,
    ViewDistance,
}

impl CommandKind {
    /// Resolve a label or alias
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "optimize" | "opt" | "perf" => Some(CommandKind::Optimize),
            "tps" => Some(CommandKind::Tps),
            "lag" => Some(CommandKind::Lag),
            "viewdistance" | "vd" => Some(CommandKind::ViewDistance),
            _ => None,
        }
    }

    pub fn permission(&self) -> &'static str {
        match self {
            CommandKind::Optimize => permissions::OPTIMIZE,
            CommandKind::Tps => permissions::TPS,
            CommandKind::Lag => permissions::LAG,
            CommandKind::ViewDistance => permissions::VIEW_DISTANCE,
        }
    }

    pub fn usage(&self) -> &'static str {
        match self {
            CommandKind::Optimize => "/optimize <status|full|view <player>>",
            CommandKind::Tps => "/tps",
            CommandKind::Lag => "/lag",
            CommandKind::ViewDistance => "/viewdistance [distance|auto]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/optimize` without arguments
    OptimizeHelp,
    Status,
    FullOptimization,
    /// `/optimize view` without a player name
    ListViewers,
    ToggleViewer(String),
    Tps,
    LagReport,
    ShowViewDistance,
    SetViewDistance(u32),
    ToggleAutoViewDistance,
}

impl Command {
    /// Parse the arguments of an already resolved command label
    pub fn parse(kind: CommandKind, args: &[&str]) -> Result<Self, CommandError> {
        match kind {
            CommandKind::Tps => Ok(Command::Tps),
            CommandKind::Lag => Ok(Command::LagReport),
            CommandKind::Optimize => {
                let Some(action) = args.first() else {
                    return Ok(Command::OptimizeHelp);
                };
                match action.to_ascii_lowercase().as_str() {
                    "status" => Ok(Command::Status),
                    "full" => Ok(Command::FullOptimization),
                    "view" => match args.get(1) {
                        Some(name) => Ok(Command::ToggleViewer(name.to_string())),
                        None => Ok(Command::ListViewers),
                    },
                    other => Err(CommandError::InvalidArgument(format!(
                        "Unknown optimize subcommand: {}",
                        other
                    ))),
                }
            }
            CommandKind::ViewDistance => {
                let Some(arg) = args.first() else {
                    return Ok(Command::ShowViewDistance);
                };
                if arg.eq_ignore_ascii_case("auto") {
                    return Ok(Command::ToggleAutoViewDistance);
                }
                arg.parse::<u32>()
                    .map(Command::SetViewDistance)
                    .map_err(|_| {
                        CommandError::InvalidArgument("Please enter a valid number!".to_string())
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(CommandKind::from_label("opt"), Some(CommandKind::Optimize));
        assert_eq!(CommandKind::from_label("PERF"), Some(CommandKind::Optimize));
        assert_eq!(CommandKind::from_label("vd"), Some(CommandKind::ViewDistance));
        assert_eq!(CommandKind::from_label("tps"), Some(CommandKind::Tps));
        assert_eq!(CommandKind::from_label("gamemode"), None);
    }

    #[test]
    fn test_parse_optimize() {
        assert_eq!(Command::parse(CommandKind::Optimize, &[]), Ok(Command::OptimizeHelp));
        assert_eq!(Command::parse(CommandKind::Optimize, &["Status"]), Ok(Command::Status));
        assert_eq!(Command::parse(CommandKind::Optimize, &["full"]), Ok(Command::FullOptimization));
        assert_eq!(Command::parse(CommandKind::Optimize, &["view"]), Ok(Command::ListViewers));
        assert_eq!(
            Command::parse(CommandKind::Optimize, &["view", "Steve"]),
            Ok(Command::ToggleViewer("Steve".to_string()))
        );
        assert!(matches!(
            Command::parse(CommandKind::Optimize, &["explode"]),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_view_distance() {
        assert_eq!(Command::parse(CommandKind::ViewDistance, &[]), Ok(Command::ShowViewDistance));
        assert_eq!(
            Command::parse(CommandKind::ViewDistance, &["AUTO"]),
            Ok(Command::ToggleAutoViewDistance)
        );
        assert_eq!(
            Command::parse(CommandKind::ViewDistance, &["10"]),
            Ok(Command::SetViewDistance(10))
        );
        assert!(matches!(
            Command::parse(CommandKind::ViewDistance, &["ten"]),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(matches!(
            Command::parse(CommandKind::ViewDistance, &["-3"]),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_permissions() {
        assert_eq!(CommandKind::Optimize.permission(), "serveropt.command.optimize");
        assert_eq!(CommandKind::ViewDistance.permission(), "serveropt.command.viewdistance");
    }
}
