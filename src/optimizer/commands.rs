//! Command execution

use tracing::{debug, info};

use super::ServerOptimizer;
use crate::command::{permissions, Command, CommandError, CommandKind, CommandSender};
use crate::host::Host;
use crate::messages;

impl<H: Host> ServerOptimizer<H> {
    /// Resolve, authorize, parse and execute a raw command. The reply lines
    /// are for the sender.
    pub fn dispatch_command(
        &mut self,
        sender: &dyn CommandSender,
        label: &str,
        args: &[&str],
    ) -> Result<Vec<String>, CommandError> {
        let kind = CommandKind::from_label(label)
            .ok_or_else(|| CommandError::UnknownCommand(label.to_string()))?;

        let permission = kind.permission();
        if !sender.has_permission(permission) && !sender.has_permission(permissions::ADMIN) {
            debug!("{} was denied /{}", sender.name(), label);
            return Err(CommandError::PermissionDenied(permission));
        }

        let command = Command::parse(kind, args).map_err(|e| match e {
            CommandError::InvalidArgument(msg) => {
                CommandError::InvalidArgument(format!("{} Usage: {}", msg, kind.usage()))
            }
            other => other,
        })?;

        debug!("{} ran {:?}", sender.name(), command);
        self.execute(command)
    }

    /// Execute an already authorized command
    pub fn execute(&mut self, command: Command) -> Result<Vec<String>, CommandError> {
        match command {
            Command::OptimizeHelp => Ok(messages::optimize_help()),
            Command::Status => Ok(messages::status(&self.status())),
            Command::FullOptimization => {
                let (chunks, entities) = self.run_full_optimization();
                Ok(messages::full_optimization_done(chunks, entities))
            }
            Command::ListViewers => Ok(messages::viewer_list(&self.viewers.names())),
            Command::ToggleViewer(name) => {
                let player = self
                    .host
                    .find_player(&name)
                    .ok_or(CommandError::PlayerNotFound(name))?;

                let enabled = self.viewers.toggle(player.name());
                if let Err(e) = player.send_message(&messages::viewer_notice(enabled)) {
                    debug!("Could not tell {} about the display toggle: {:#}", player.name(), e);
                }
                Ok(vec![messages::viewer_toggled(player.name(), enabled)])
            }
            Command::Tps => Ok(vec![messages::tps_line(self.tps())]),
            Command::LagReport => Ok(messages::lag_report(&self.lag_report())),
            Command::ShowViewDistance => Ok(messages::view_distance_info(
                self.view_distance.current(),
                self.view_distance.is_auto(),
            )),
            Command::SetViewDistance(value) => {
                self.set_view_distance(value)?;
                Ok(vec![messages::view_distance_set(value)])
            }
            Command::ToggleAutoViewDistance => {
                let auto = self.view_distance.toggle_auto();
                info!("Auto view distance {}", if auto { "enabled" } else { "disabled" });
                Ok(vec![messages::auto_view_distance(auto)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::command::ConsoleSender;
    use crate::host::testing::FakePlayer;

    struct TestSender {
        permissions: Vec<&'static str>,
    }

    impl TestSender {
        fn with(permissions: &[&'static str]) -> Self {
            Self {
                permissions: permissions.to_vec(),
            }
        }
    }

    impl CommandSender for TestSender {
        fn name(&self) -> &str {
            "Tester"
        }

        fn has_permission(&self, permission: &str) -> bool {
            self.permissions.contains(&permission)
        }
    }

    #[test]
    fn test_view_distance_range() {
        let (mut optimizer, _host) = optimizer();

        for bad in ["3", "13"] {
            let result = optimizer.dispatch_command(&ConsoleSender, "vd", &[bad]);
            assert!(matches!(result, Err(CommandError::InvalidArgument(_))), "{}", bad);
        }
        assert_eq!(optimizer.view_distance().current(), 8);
        assert!(optimizer.view_distance().is_auto());

        let reply = optimizer.dispatch_command(&ConsoleSender, "viewdistance", &["10"]).unwrap();
        assert_eq!(reply, vec![messages::view_distance_set(10)]);
        assert_eq!(optimizer.view_distance().current(), 10);
        assert!(!optimizer.view_distance().is_auto());
    }

    #[test]
    fn test_non_numeric_distance_mentions_usage() {
        let (mut optimizer, _host) = optimizer();

        match optimizer.dispatch_command(&ConsoleSender, "vd", &["far"]) {
            Err(CommandError::InvalidArgument(msg)) => assert!(msg.contains("/viewdistance")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_toggle_auto_and_show() {
        let (mut optimizer, _host) = optimizer();

        let reply = optimizer.dispatch_command(&ConsoleSender, "vd", &["auto"]).unwrap();
        assert_eq!(reply, vec![messages::auto_view_distance(false)]);
        assert!(!optimizer.view_distance().is_auto());

        let reply = optimizer.dispatch_command(&ConsoleSender, "vd", &[]).unwrap();
        assert!(reply[1].contains("OFF"));
    }

    #[test]
    fn test_permission_checked_before_arguments() {
        let (mut optimizer, _host) = optimizer();
        let sender = TestSender::with(&[permissions::TPS]);

        assert_eq!(
            optimizer.dispatch_command(&sender, "vd", &["not-a-number"]),
            Err(CommandError::PermissionDenied(permissions::VIEW_DISTANCE))
        );
        assert_eq!(
            optimizer.dispatch_command(&sender, "vd", &["10"]),
            Err(CommandError::PermissionDenied(permissions::VIEW_DISTANCE))
        );
        assert_eq!(optimizer.view_distance().current(), 8);

        assert!(optimizer.dispatch_command(&sender, "tps", &[]).is_ok());
    }

    #[test]
    fn test_admin_permission_grants_everything() {
        let (mut optimizer, _host) = optimizer();
        let admin = TestSender::with(&[permissions::ADMIN]);

        assert!(optimizer.dispatch_command(&admin, "optimize", &["status"]).is_ok());
        assert!(optimizer.dispatch_command(&admin, "lag", &[]).is_ok());
        assert!(optimizer.dispatch_command(&admin, "vd", &["6"]).is_ok());
    }

    #[test]
    fn test_unknown_command() {
        let (mut optimizer, _host) = optimizer();
        assert_eq!(
            optimizer.dispatch_command(&ConsoleSender, "gamemode", &[]),
            Err(CommandError::UnknownCommand("gamemode".to_string()))
        );
    }

    #[test]
    fn test_toggle_viewer() {
        let (mut optimizer, host) = optimizer();
        let alex = FakePlayer::new("Alex", false);
        host.add_player(alex.clone());

        assert_eq!(
            optimizer.dispatch_command(&ConsoleSender, "opt", &["view", "Bob"]),
            Err(CommandError::PlayerNotFound("Bob".to_string()))
        );

        let reply = optimizer.dispatch_command(&ConsoleSender, "opt", &["view", "ALEX"]).unwrap();
        assert_eq!(reply, vec![messages::viewer_toggled("Alex", true)]);
        assert!(optimizer.viewers().contains("Alex"));
        assert_eq!(alex.last_message(), Some(messages::viewer_notice(true)));

        let list = optimizer.dispatch_command(&ConsoleSender, "perf", &["view"]).unwrap();
        assert_eq!(list, messages::viewer_list(&["Alex".to_string()]));

        optimizer.dispatch_command(&ConsoleSender, "opt", &["view", "alex"]).unwrap();
        assert!(optimizer.viewers().is_empty());
        assert_eq!(alex.last_message(), Some(messages::viewer_notice(false)));
    }

    #[test]
    fn test_full_optimization_is_not_an_auto_run() {
        let (mut optimizer, host) = optimizer();
        host.set_extra_players(10);
        run_ticks(&mut optimizer, &host, 5, HEALTHY_TICK);

        let reply = optimizer.dispatch_command(&ConsoleSender, "optimize", &["full"]).unwrap();
        assert!(reply[1].contains("Chunks: 140, Entities: 50"));
        assert_eq!(optimizer.optimizations().counters().total_optimizations, 0);
        assert_eq!(host.reclaim_calls(), 1);
    }

    #[test]
    fn test_help_status_and_reports() {
        let (mut optimizer, host) = optimizer();
        host.add_player(FakePlayer::new("Alex", false));
        run_ticks(&mut optimizer, &host, 5, HEALTHY_TICK);

        let help = optimizer.dispatch_command(&ConsoleSender, "optimize", &[]).unwrap();
        assert_eq!(help, messages::optimize_help());

        let status = optimizer.dispatch_command(&ConsoleSender, "optimize", &["status"]).unwrap();
        assert!(status.iter().any(|line| line == "§ePlayers: §f1"));
        assert!(status.iter().any(|line| line.contains("View Distance: §f8 (auto)")));

        let tps = optimizer.dispatch_command(&ConsoleSender, "tps", &[]).unwrap();
        assert!(tps[0].contains("20.00 TPS"));

        let lag = optimizer.dispatch_command(&ConsoleSender, "lag", &[]).unwrap();
        assert!(lag[0].contains("LAG Report"));
        assert!(lag.iter().any(|line| line.contains("Estimated chunks: §f64")));
    }
}
