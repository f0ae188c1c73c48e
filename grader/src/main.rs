use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use grader::exit_codes;
use grader::io::catalog::{RandomSelector, list_exercises, list_levels, load_exercise};
use grader::io::config::{DEFAULT_CONFIG_FILE, GraderConfig, load_config, write_config};
use grader::io::process::SystemProcessRunner;
use grader::io::workspace::{WorkspacePaths, ensure_dirs, reset_all};
use grader::logging;
use grader::pipeline::{Outcome, verify_exercise};
use grader::report::{render_exercise, render_verdict};
use grader::session::{Session, SessionEnd};

#[derive(Parser)]
#[command(
    name = "grader",
    version,
    about = "Compile, run and grade a single C/C++ solution against stored exercises"
)]
struct Cli {
    /// Directory holding tasks, solutions, build and traces.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Config file (default: `<root>/grader.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session (default).
    Session,
    /// Print the available levels.
    Levels,
    /// Print the exercises of a level.
    Exercises { level: String },
    /// Grade the staged solution against one exercise.
    Check {
        level: String,
        exercise: String,
        /// Print the verdict as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Clear solutions, build and traces.
    Reset,
    /// Write the default config file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("resolve root {}", cli.root.display()))?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));

    match cli.command.unwrap_or(Command::Session) {
        Command::InitConfig { force } => cmd_init_config(&config_path, force),
        Command::Session => {
            let (cfg, paths) = load(&root, &config_path)?;
            cmd_session(&paths, &cfg)
        }
        Command::Levels => {
            let (_, paths) = load(&root, &config_path)?;
            require_tasks_dir(&paths)?;
            for level in list_levels(&paths.tasks_dir)? {
                println!("{level}");
            }
            Ok(exit_codes::OK)
        }
        Command::Exercises { level } => {
            let (_, paths) = load(&root, &config_path)?;
            require_tasks_dir(&paths)?;
            for exercise in list_exercises(&paths.tasks_dir, &level)? {
                println!("{exercise}");
            }
            Ok(exit_codes::OK)
        }
        Command::Check {
            level,
            exercise,
            json,
        } => {
            let (cfg, paths) = load(&root, &config_path)?;
            cmd_check(&paths, &cfg, &level, &exercise, json)
        }
        Command::Reset => {
            let (_, paths) = load(&root, &config_path)?;
            reset_all(&paths)?;
            println!("reset: solutions, build and traces cleared");
            Ok(exit_codes::OK)
        }
    }
}

fn load(root: &Path, config_path: &Path) -> Result<(GraderConfig, WorkspacePaths)> {
    let cfg = load_config(config_path).context("load config")?;
    let paths = WorkspacePaths::new(root, &cfg);
    Ok((cfg, paths))
}

fn cmd_session(paths: &WorkspacePaths, cfg: &GraderConfig) -> Result<i32> {
    require_tasks_dir(paths)?;
    ensure_dirs(paths)?;
    let runner = SystemProcessRunner;
    let mut selector = RandomSelector;
    let mut session = Session::new(paths, cfg, &runner, &mut selector);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    match session.run(stdin.lock(), &mut stdout)? {
        SessionEnd::Exited => Ok(exit_codes::OK),
        SessionEnd::NoLevels => Ok(exit_codes::UNUSABLE),
    }
}

fn cmd_check(
    paths: &WorkspacePaths,
    cfg: &GraderConfig,
    level: &str,
    name: &str,
    json: bool,
) -> Result<i32> {
    require_tasks_dir(paths)?;
    ensure_dirs(paths)?;
    let exercise = load_exercise(&paths.tasks_dir, level, name, cfg)?;
    let mut stdout = std::io::stdout();
    if !json {
        render_exercise(&mut stdout, &exercise)?;
    }
    let verdict = verify_exercise(paths, cfg, &exercise, &SystemProcessRunner)?;
    let outcome = verdict.outcome();
    if json {
        let payload = serde_json::json!({
            "subject": exercise.subject(),
            "outcome": outcome,
            "result": verdict,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("serialize verdict")?
        );
    } else {
        render_verdict(&mut stdout, &verdict, paths)?;
    }
    Ok(match outcome {
        Outcome::Pass | Outcome::Unverified => exit_codes::OK,
        Outcome::Fail => exit_codes::FAILED,
        Outcome::Unusable => exit_codes::UNUSABLE,
    })
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &GraderConfig::default())?;
    println!("init-config: wrote {}", path.display());
    Ok(exit_codes::OK)
}

/// The task root must exist before any command that reads the catalog.
fn require_tasks_dir(paths: &WorkspacePaths) -> Result<()> {
    if !paths.tasks_dir.is_dir() {
        bail!("task root not found at {}", paths.tasks_dir.display());
    }
    Ok(())
}
