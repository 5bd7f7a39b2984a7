use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for mcdrive")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        /// Run only drive (CDD/CDC) tests
        #[arg(long)]
        cdd: bool,
        /// Run only configuration tests
        #[arg(long)]
        config: bool,
        /// Run only TOC sheet loader tests
        #[arg(long)]
        loader: bool,
        /// Run only save state tests
        #[arg(long)]
        save_state: bool,
    },
    /// Run benchmarks
    Bench,
    /// Trace a command script against a TOC sheet
    Trace {
        /// Path to the TOC sheet (.toml)
        sheet: String,
        /// Command blocks as hex digits
        #[arg(short = 'c', long = "command")]
        commands: Vec<String>,
        /// Ticks to run after each command
        #[arg(short = 'n', long, default_value = "1")]
        ticks: u32,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Check { verbose } => run_check(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            cdd,
            config,
            loader,
            save_state,
        } => run_test(doc, cdd, config, loader, save_state),
        Commands::Bench => run_bench(),
        Commands::Trace {
            sheet,
            commands,
            ticks,
            json,
            release,
        } => run_trace(&sheet, &commands, ticks, json, release),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Build", || run_build(false), verbose)?;
    run_task(
        "Test",
        || run_test(false, false, false, false, false),
        verbose,
    )?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_check(verbose: bool) -> Result<()> {
    println!("{}", "=== Running Quick Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ Checks passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--all-targets").arg("--all-features");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn run_test(doc: bool, cdd: bool, config: bool, loader: bool, save_state: bool) -> Result<()> {
    if doc {
        let mut cmd = Command::new("cargo");
        cmd.arg("test").arg("--all-features").arg("--doc");
        return execute_command(&mut cmd);
    }

    let modules = [
        (cdd, "core::cdd", "Drive"),
        (config, "core::config", "Config"),
        (loader, "core::loader", "Loader"),
        (save_state, "core::save_state", "Save state"),
    ];
    let module_count = modules.iter().filter(|(enabled, _, _)| *enabled).count();

    if module_count == 0 {
        let mut cmd = Command::new("cargo");
        cmd.arg("test").arg("--all-features");
        return execute_command(&mut cmd);
    }

    let mut all_success = true;

    for (enabled, module_path, module_name) in modules {
        if !enabled {
            continue;
        }

        println!("{} Running {} tests...", "→".blue(), module_name.bold());

        let mut cmd = Command::new("cargo");
        cmd.arg("test")
            .arg("--all-features")
            .arg("--lib")
            .arg(module_path);

        match execute_command(&mut cmd) {
            Ok(_) => {
                println!("{} {} tests passed\n", "✓".green(), module_name);
            }
            Err(e) => {
                println!("{} {} tests failed\n", "✗".red(), module_name);
                all_success = false;
                if module_count == 1 {
                    return Err(e);
                }
            }
        }
    }

    if all_success {
        Ok(())
    } else {
        anyhow::bail!("Some module tests failed")
    }
}

fn run_bench() -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench");

    execute_command(&mut cmd)
}

fn run_trace(sheet: &str, commands: &[String], ticks: u32, json: bool, release: bool) -> Result<()> {
    if !json {
        println!("{}", "=== CDD Trace ===".bold().blue());
    }

    if !Path::new(sheet).exists() {
        println!(
            "{} TOC sheet not found: {}",
            "✗".red().bold(),
            sheet.yellow()
        );
        anyhow::bail!("TOC sheet not found");
    }

    if commands.is_empty() {
        println!(
            "{} No commands given, the trace will only load the disc",
            "ℹ".blue()
        );
    }

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run").arg("--quiet").arg("--bin").arg("cdd-trace");

    if release {
        cmd.arg("--release");
    }

    cmd.arg("--")
        .arg(sheet)
        .arg("--ticks")
        .arg(ticks.to_string());
    for command in commands {
        cmd.arg("--command").arg(command);
    }
    if json {
        cmd.arg("--json");
    }

    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        println!("\n{} Trace failed", "✗".red().bold());
        anyhow::bail!("Trace failed with exit code: {}", status);
    }

    if !json {
        let elapsed = start.elapsed();
        println!(
            "\n{} Trace completed in {}",
            "✓".green().bold(),
            format!("{:.2}s", elapsed.as_secs_f64()).bold()
        );
    }

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
