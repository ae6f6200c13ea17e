use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for spacekit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and docs
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Render the demo scene headlessly through the CLI
    Smoke {
        #[arg(long, default_value = "3")]
        frames: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            for step in [Step::Fmt, Step::Clippy, Step::Test, Step::Doc] {
                step.run()?;
            }
        }
        Commands::Fmt => Step::Fmt.run()?,
        Commands::Clippy => Step::Clippy.run()?,
        Commands::Test => Step::Test.run()?,
        Commands::Doc => Step::Doc.run()?,
        Commands::Smoke { frames } => {
            let frames = frames.to_string();
            cargo(
                "headless render",
                &["run", "-p", "spacekit-cli", "--", "render", "--frames", &frames],
            )?;
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum Step {
    Fmt,
    Clippy,
    Test,
    Doc,
}

impl Step {
    fn run(self) -> Result<()> {
        match self {
            Step::Fmt => cargo("fmt", &["fmt", "--all", "--", "--check"]),
            Step::Clippy => cargo(
                "clippy",
                &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            ),
            Step::Test => cargo("test", &["test", "--workspace"]),
            Step::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"]),
        }
    }
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed");
    }
    Ok(())
}
