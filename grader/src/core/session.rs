//! Session state machine.
//!
//! Input parsing ([`parse_command`]) is separate from state transitions
//! ([`transition`]); neither performs I/O. The controller in
//! [`crate::session`] executes the returned [`Action`].

/// Current position of an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No level chosen yet; the next input selects one.
    NoLevelSelected,
    /// Rounds draw exercises from this level.
    LevelSelected(String),
    /// The session has ended.
    Terminated,
}

/// How the user asked for a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelChoice {
    Random,
    /// 1-based position in the displayed level list.
    Index(usize),
    /// Level name, matched case-insensitively.
    Name(String),
}

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Grade another random exercise of the current level.
    Retest,
    /// Drop the current level and choose again.
    ChangeLevel,
    Exit,
    Choose(LevelChoice),
    Unrecognized(String),
}

/// Why the session asks again without changing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reprompt {
    Unrecognized(String),
    UnknownLevel(LevelChoice),
    /// A valid command that does not apply in the current state.
    NotAvailable,
}

/// Side effect the controller must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Pick a random exercise from the level and run the pipeline on it.
    RunRound(String),
    /// Clear staging, build and trace directories.
    ResetWorkspaces,
    /// Clear all workspaces and end the process.
    Terminate,
    Reprompt(Reprompt),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionState,
    pub action: Action,
}

impl SessionState {
    pub fn level(&self) -> Option<&str> {
        match self {
            SessionState::LevelSelected(level) => Some(level),
            _ => None,
        }
    }
}

/// Parse one line of input in the context of `state`.
///
/// Matching is case-insensitive and ignores surrounding and repeated
/// whitespace. Level indices and names are only meaningful while no level is
/// selected.
pub fn parse_command(input: &str, state: &SessionState) -> Command {
    let word = input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if matches!(word.as_str(), "exit" | "quit") {
        return Command::Exit;
    }
    match state {
        SessionState::NoLevelSelected => match word.as_str() {
            "" | "random" => Command::Choose(LevelChoice::Random),
            _ => match word.parse::<usize>() {
                Ok(index) => Command::Choose(LevelChoice::Index(index)),
                Err(_) => Command::Choose(LevelChoice::Name(word)),
            },
        },
        SessionState::LevelSelected(_) => match word.as_str() {
            "" | "retest" | "new" => Command::Retest,
            "newnew" | "level" | "change" | "change level" => Command::ChangeLevel,
            _ => Command::Unrecognized(input.trim().to_string()),
        },
        SessionState::Terminated => Command::Unrecognized(input.trim().to_string()),
    }
}

/// Resolve an explicit index or name against the displayed `levels`.
///
/// Returns `None` for [`LevelChoice::Random`]; random choice belongs to the
/// caller's selector.
pub fn resolve_level(choice: &LevelChoice, levels: &[String]) -> Option<String> {
    match choice {
        LevelChoice::Random => None,
        LevelChoice::Index(index) => index
            .checked_sub(1)
            .and_then(|pos| levels.get(pos))
            .cloned(),
        LevelChoice::Name(name) => levels
            .iter()
            .find(|level| level.to_lowercase() == name.to_lowercase())
            .cloned(),
    }
}

/// Compute the next state for `command`.
///
/// `choose_level` turns a [`LevelChoice`] into a concrete level (or `None` if
/// it names nothing). It is only called for [`Command::Choose`] while no level
/// is selected.
pub fn transition<F>(state: &SessionState, command: Command, choose_level: F) -> Transition
where
    F: FnOnce(&LevelChoice) -> Option<String>,
{
    let stay = |action| Transition {
        next: state.clone(),
        action,
    };
    match (state, command) {
        (SessionState::Terminated, _) => stay(Action::None),
        (_, Command::Exit) => Transition {
            next: SessionState::Terminated,
            action: Action::Terminate,
        },
        (SessionState::NoLevelSelected, Command::Choose(choice)) => match choose_level(&choice) {
            Some(level) => Transition {
                next: SessionState::LevelSelected(level.clone()),
                action: Action::RunRound(level),
            },
            None => stay(Action::Reprompt(Reprompt::UnknownLevel(choice))),
        },
        (SessionState::LevelSelected(level), Command::Retest) => {
            stay(Action::RunRound(level.clone()))
        }
        (SessionState::LevelSelected(_), Command::ChangeLevel) => Transition {
            next: SessionState::NoLevelSelected,
            action: Action::ResetWorkspaces,
        },
        (_, Command::Unrecognized(raw)) => stay(Action::Reprompt(Reprompt::Unrecognized(raw))),
        (_, _) => stay(Action::Reprompt(Reprompt::NotAvailable)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Vec<String> {
        vec!["level1".to_string(), "Level2".to_string()]
    }

    fn selected(level: &str) -> SessionState {
        SessionState::LevelSelected(level.to_string())
    }

    fn never(_: &LevelChoice) -> Option<String> {
        panic!("level chooser must not be called");
    }

    #[test]
    fn parses_level_prompt_input() {
        let state = SessionState::NoLevelSelected;
        assert_eq!(
            parse_command("", &state),
            Command::Choose(LevelChoice::Random)
        );
        assert_eq!(
            parse_command(" 2 ", &state),
            Command::Choose(LevelChoice::Index(2))
        );
        assert_eq!(
            parse_command("LEVEL1", &state),
            Command::Choose(LevelChoice::Name("level1".to_string()))
        );
        assert_eq!(parse_command("Exit", &state), Command::Exit);
    }

    #[test]
    fn parses_round_commands() {
        let state = selected("level1");
        assert_eq!(parse_command("", &state), Command::Retest);
        assert_eq!(parse_command("retest", &state), Command::Retest);
        assert_eq!(parse_command("New", &state), Command::Retest);
        assert_eq!(parse_command("NEWNEW", &state), Command::ChangeLevel);
        assert_eq!(parse_command("change", &state), Command::ChangeLevel);
        assert_eq!(parse_command("Change Level", &state), Command::ChangeLevel);
        assert_eq!(parse_command("change   level\n", &state), Command::ChangeLevel);
        assert_eq!(parse_command("quit", &state), Command::Exit);
        assert_eq!(
            parse_command(" what ", &state),
            Command::Unrecognized("what".to_string())
        );
    }

    #[test]
    fn level_index_is_not_a_command_once_selected() {
        assert_eq!(
            parse_command("1", &selected("level1")),
            Command::Unrecognized("1".to_string())
        );
    }

    #[test]
    fn resolves_index_and_name() {
        let levels = levels();
        assert_eq!(
            resolve_level(&LevelChoice::Index(1), &levels),
            Some("level1".to_string())
        );
        assert_eq!(
            resolve_level(&LevelChoice::Name("level2".to_string()), &levels),
            Some("Level2".to_string())
        );
        assert_eq!(resolve_level(&LevelChoice::Index(0), &levels), None);
        assert_eq!(resolve_level(&LevelChoice::Index(3), &levels), None);
        assert_eq!(
            resolve_level(&LevelChoice::Name("level9".to_string()), &levels),
            None
        );
        assert_eq!(resolve_level(&LevelChoice::Random, &levels), None);
    }

    #[test]
    fn choosing_a_level_runs_a_round() {
        let t = transition(
            &SessionState::NoLevelSelected,
            Command::Choose(LevelChoice::Index(2)),
            |choice| resolve_level(choice, &levels()),
        );
        assert_eq!(t.next, selected("Level2"));
        assert_eq!(t.action, Action::RunRound("Level2".to_string()));
    }

    #[test]
    fn unknown_level_reprompts_without_state_change() {
        let t = transition(
            &SessionState::NoLevelSelected,
            Command::Choose(LevelChoice::Index(7)),
            |choice| resolve_level(choice, &levels()),
        );
        assert_eq!(t.next, SessionState::NoLevelSelected);
        assert_eq!(
            t.action,
            Action::Reprompt(Reprompt::UnknownLevel(LevelChoice::Index(7)))
        );
    }

    #[test]
    fn retest_keeps_level() {
        let t = transition(&selected("level1"), Command::Retest, never);
        assert_eq!(t.next, selected("level1"));
        assert_eq!(t.action, Action::RunRound("level1".to_string()));
    }

    #[test]
    fn change_level_resets_and_clears_selection() {
        let t = transition(&selected("level1"), Command::ChangeLevel, never);
        assert_eq!(t.next, SessionState::NoLevelSelected);
        assert_eq!(t.action, Action::ResetWorkspaces);
    }

    #[test]
    fn exit_terminates_from_any_live_state() {
        for state in [SessionState::NoLevelSelected, selected("level1")] {
            let t = transition(&state, Command::Exit, never);
            assert_eq!(t.next, SessionState::Terminated);
            assert_eq!(t.action, Action::Terminate);
        }
    }

    #[test]
    fn unrecognized_input_is_a_no_op() {
        let state = selected("level1");
        let t = transition(&state, Command::Unrecognized("huh".to_string()), never);
        assert_eq!(t.next, state);
        assert_eq!(
            t.action,
            Action::Reprompt(Reprompt::Unrecognized("huh".to_string()))
        );
    }

    #[test]
    fn retest_without_level_is_not_available() {
        let t = transition(&SessionState::NoLevelSelected, Command::Retest, never);
        assert_eq!(t.next, SessionState::NoLevelSelected);
        assert_eq!(t.action, Action::Reprompt(Reprompt::NotAvailable));
    }

    #[test]
    fn terminated_state_ignores_input() {
        let t = transition(&SessionState::Terminated, Command::Retest, never);
        assert_eq!(t.next, SessionState::Terminated);
        assert_eq!(t.action, Action::None);
    }
}
