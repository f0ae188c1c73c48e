//! Interactive session controller.
//!
//! Reads commands line by line, feeds them through the state machine in
//! [`crate::core::session`] and performs the resulting actions. Failures inside
//! a round are reported and the loop continues.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::session::{
    Action, Command, LevelChoice, Reprompt, SessionState, parse_command, resolve_level, transition,
};
use crate::io::catalog::{Selector, list_levels};
use crate::io::config::{GraderConfig, LevelSelection};
use crate::io::process::ProcessRunner;
use crate::io::workspace::{WorkspacePaths, reset_all};
use crate::pipeline::{RoundOutcome, run_round};
use crate::report::{render_exercise, render_verdict};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user exited (or input ended); workspaces were cleared.
    Exited,
    /// The task root held no level directories at startup.
    NoLevels,
}

pub struct Session<'a, R, S> {
    paths: &'a WorkspacePaths,
    cfg: &'a GraderConfig,
    runner: &'a R,
    selector: &'a mut S,
    state: SessionState,
}

impl<'a, R, S> Session<'a, R, S>
where
    R: ProcessRunner,
    S: Selector,
{
    pub fn new(
        paths: &'a WorkspacePaths,
        cfg: &'a GraderConfig,
        runner: &'a R,
        selector: &'a mut S,
    ) -> Self {
        Self {
            paths,
            cfg,
            runner,
            selector,
            state: SessionState::NoLevelSelected,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Drive the session until exit or end of input.
    ///
    /// An empty task root at startup ends the session with
    /// [`SessionEnd::NoLevels`]. Later, an empty or unreadable task root is
    /// reported and the user may look again or exit.
    pub fn run<I: BufRead, O: Write>(&mut self, mut input: I, out: &mut O) -> Result<SessionEnd> {
        writeln!(out, "Task tester started.")?;
        writeln!(out)?;
        if list_levels(&self.paths.tasks_dir)?.is_empty() {
            writeln!(
                out,
                "No level folders found in {}",
                self.paths.tasks_dir.display()
            )?;
            return Ok(SessionEnd::NoLevels);
        }
        loop {
            let mut levels = Vec::new();
            let command = match &self.state {
                SessionState::Terminated => return Ok(SessionEnd::Exited),
                SessionState::NoLevelSelected => match self.available_levels(out)? {
                    Some(found) => {
                        levels = found;
                        match self.cfg.level_selection {
                            LevelSelection::Random => Command::Choose(LevelChoice::Random),
                            LevelSelection::Prompt => {
                                writeln!(out, "Available levels:")?;
                                for (index, level) in levels.iter().enumerate() {
                                    writeln!(out, "{}. {}", index + 1, level)?;
                                }
                                write!(
                                    out,
                                    "Choose a level (1-{}), type a level name, press Enter for a random one, or EXIT: ",
                                    levels.len()
                                )?;
                                self.read_command(&mut input, out)?
                            }
                        }
                    }
                    None => {
                        write!(out, "Press Enter to look again, or EXIT to close: ")?;
                        match self.read_command(&mut input, out)? {
                            Command::Exit => Command::Exit,
                            _ => continue,
                        }
                    }
                },
                SessionState::LevelSelected(_) => {
                    write!(
                        out,
                        "Press Enter to retest (new exercise, same level), NewNew to choose another level, Exit to close: "
                    )?;
                    self.read_command(&mut input, out)?
                }
            };
            self.apply(command, &levels, out)?;
        }
    }

    /// Apply one command; exposed for driving the controller without input parsing.
    pub fn apply<O: Write>(&mut self, command: Command, levels: &[String], out: &mut O) -> Result<()> {
        let selector = &mut *self.selector;
        let next = transition(&self.state, command, |choice| match choice {
            LevelChoice::Random => selector.pick(levels),
            other => resolve_level(other, levels),
        });
        self.state = next.next;

        match next.action {
            Action::RunRound(level) => {
                if let Err(err) = self.round(&level, out) {
                    warn!(level = %level, err = %format!("{err:#}"), "round failed");
                    writeln!(out, "error: {err:#}")?;
                }
                writeln!(out)?;
                writeln!(out, "--- Ready for next action ---")?;
                writeln!(out)?;
            }
            Action::ResetWorkspaces => {
                self.reset(out)?;
                writeln!(out, "Choose a new level... solutions, traces and build cleared.")?;
                writeln!(out)?;
            }
            Action::Terminate => {
                self.reset(out)?;
                writeln!(out, "Exiting program. Solutions, traces, and build cleared. Bye!")?;
            }
            Action::Reprompt(reason) => {
                match reason {
                    Reprompt::Unrecognized(raw) => writeln!(out, "Invalid input {raw:?}, try again.")?,
                    Reprompt::UnknownLevel(_) => writeln!(out, "Invalid choice, try again.")?,
                    Reprompt::NotAvailable => writeln!(out, "Not available right now, try again.")?,
                }
                writeln!(out)?;
            }
            Action::None => {}
        }
        Ok(())
    }

    fn round<O: Write>(&mut self, level: &str, out: &mut O) -> Result<()> {
        info!(level, "round started");
        let outcome = run_round(
            self.paths,
            self.cfg,
            level,
            self.runner,
            &mut *self.selector,
            |exercise| render_exercise(&mut *out, exercise),
        )?;
        match outcome {
            RoundOutcome::NoExercises { level } => {
                writeln!(out, "No exercises found in {level}")?;
            }
            RoundOutcome::Graded { exercise, verdict } => {
                info!(subject = %exercise.subject(), outcome = ?verdict.outcome(), "round graded");
                render_verdict(out, &verdict, self.paths)?;
            }
        }
        Ok(())
    }

    fn reset<O: Write>(&self, out: &mut O) -> Result<()> {
        if let Err(err) = reset_all(self.paths) {
            warn!(err = %format!("{err:#}"), "workspace reset failed");
            writeln!(out, "error: {err:#}")?;
        }
        Ok(())
    }

    /// Current levels, or `None` after reporting an empty or unreadable task root.
    fn available_levels<O: Write>(&self, out: &mut O) -> Result<Option<Vec<String>>> {
        match list_levels(&self.paths.tasks_dir) {
            Ok(levels) if !levels.is_empty() => Ok(Some(levels)),
            Ok(_) => {
                warn!(dir = %self.paths.tasks_dir.display(), "no levels found");
                writeln!(
                    out,
                    "No level folders found in {}",
                    self.paths.tasks_dir.display()
                )?;
                Ok(None)
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "listing levels failed");
                writeln!(out, "error: {err:#}")?;
                Ok(None)
            }
        }
    }

    /// Read one line; end of input counts as `exit`.
    ///
    /// Bytes that are not valid UTF-8 are replaced, so such a line parses as
    /// an unknown command instead of failing the session.
    fn read_command<I: BufRead, O: Write>(&self, input: &mut I, out: &mut O) -> Result<Command> {
        out.flush().context("flush prompt")?;
        let mut raw = Vec::new();
        let read = input.read_until(b'\n', &mut raw).context("read command")?;
        if read == 0 {
            writeln!(out)?;
            return Ok(Command::Exit);
        }
        let line = String::from_utf8_lossy(&raw);
        Ok(parse_command(&line, &self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FirstSelector, ScriptedRunner, TaskTree};
    use std::io::Cursor;

    fn drive(tree: &TaskTree, runner: &ScriptedRunner, input: &str) -> (SessionEnd, String) {
        let mut selector = FirstSelector;
        let mut session = Session::new(tree.paths(), tree.config(), runner, &mut selector);
        let mut out = Vec::new();
        let end = session.run(Cursor::new(input), &mut out).expect("session");
        (end, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn empty_catalog_ends_session() {
        let tree = TaskTree::new().expect("tree");
        let runner = ScriptedRunner::new(Vec::new());
        let (end, text) = drive(&tree, &runner, "");
        assert_eq!(end, SessionEnd::NoLevels);
        assert!(text.contains("No level folders found"));
    }

    #[test]
    fn end_of_input_exits_and_clears() {
        let tree = TaskTree::new().expect("tree");
        tree.level("level1").expect("level");
        tree.stage_solution("main.c", "x").expect("stage");
        let runner = ScriptedRunner::new(Vec::new());
        let (end, text) = drive(&tree, &runner, "");
        assert_eq!(end, SessionEnd::Exited);
        assert!(text.contains("Bye!"));
        assert!(!tree.paths().solutions_dir.join("main.c").exists());
    }

    #[test]
    fn invalid_level_choice_reprompts() {
        let tree = TaskTree::new().expect("tree");
        tree.level("level1").expect("level");
        let runner = ScriptedRunner::new(Vec::new());
        let (_, text) = drive(&tree, &runner, "9\nexit\n");
        assert!(text.contains("Invalid choice, try again."));
        assert_eq!(text.matches("Available levels:").count(), 2);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn round_failure_does_not_end_session() {
        let tree = TaskTree::new().expect("tree");
        tree.exercise("level1", "1", Some("hi")).expect("exercise");
        tree.stage_solution("main.c", "x").expect("stage");
        // No scripted outputs: the compiler call errors.
        let runner = ScriptedRunner::new(Vec::new());
        let (end, text) = drive(&tree, &runner, "1\nexit\n");
        assert_eq!(end, SessionEnd::Exited);
        assert!(text.contains("error: run compiler"));
        assert!(text.contains("Bye!"));
    }

    #[test]
    fn undecodable_line_reprompts() {
        let tree = TaskTree::new().expect("tree");
        tree.level("level1").expect("level");
        let runner = ScriptedRunner::new(Vec::new());
        let mut selector = FirstSelector;
        let mut session = Session::new(tree.paths(), tree.config(), &runner, &mut selector);
        let mut out = Vec::new();

        let end = session
            .run(Cursor::new(&b"\xff\xfe\nexit\n"[..]), &mut out)
            .expect("session");
        let text = String::from_utf8(out).expect("utf8");

        assert_eq!(end, SessionEnd::Exited);
        assert!(text.contains("Invalid choice, try again."));
        assert!(text.contains("Bye!"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn undecodable_line_after_a_round_is_unrecognized() {
        let tree = TaskTree::new().expect("tree");
        tree.exercise("level1", "1", None).expect("exercise");
        tree.stage_solution("main.c", "x").expect("stage");
        let runner = ScriptedRunner::compiles_and_prints("out");
        let mut selector = FirstSelector;
        let mut session = Session::new(tree.paths(), tree.config(), &runner, &mut selector);
        let mut out = Vec::new();

        session
            .run(Cursor::new(&b"1\n\xc3\nexit\n"[..]), &mut out)
            .expect("session");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("Invalid input"));
        assert_eq!(runner.calls().len(), 2);
        assert!(text.contains("Bye!"));
    }
}
