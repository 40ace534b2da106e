//! Build automation tasks for the matrix light sense project.
//!
//! Run with: `cargo xtask <command>`

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::process::{Command, ExitCode};

/// The only board the firmware demo targets.
const FIRMWARE_TARGET: &str = "thumbv6m-none-eabi";
const FIRMWARE_FEATURES: &str = "pico1,arm,defmt";
const DEMO_BIN: &str = "light_sense";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for matrix light sense", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: host tests, firmware library and demo, docs
    CheckAll,
    /// Build the firmware library
    Build {
        /// Include per-pin hand-off tracing
        #[arg(long)]
        trace: bool,
    },
    /// Build the UF2 firmware file of the demo for flashing to a Pico
    Uf2 {
        /// Include per-pin hand-off tracing
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckAll => check_all(),
        Commands::Build { trace } => build_lib(trace),
        Commands::Uf2 { trace } => build_uf2(trace),
    }
}

fn check_all() -> ExitCode {
    let workspace_root = workspace_root();

    println!("{}", "==> Running host tests...".cyan());
    let host_target = host_target();
    match host_target.as_deref() {
        Some(target) => {
            println!(
                "  {}",
                format!("Using host target: {target}").bright_black()
            );
        }
        None => {
            println!(
                "{}",
                "  Unable to detect host target; relying on cargo default.".bright_black()
            );
        }
    }

    let mut host_test_cmd = Command::new("cargo");
    host_test_cmd
        .current_dir(&workspace_root)
        .args(["test", "-p", "matrix-light-sense"]);
    if let Some(target) = host_target {
        host_test_cmd.arg("--target").arg(target);
    }
    if !run_command(&mut host_test_cmd) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> Building firmware library...".cyan());
    if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "build",
        "--lib",
        "--target",
        FIRMWARE_TARGET,
        "--features",
        FIRMWARE_FEATURES,
    ])) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> Building firmware demo (with trace)...".cyan());
    if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "build",
        "--bin",
        DEMO_BIN,
        "--target",
        FIRMWARE_TARGET,
        "--features",
        &features(true),
    ])) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> Building documentation...".cyan());
    if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "doc",
        "-p",
        "matrix-light-sense",
        "--target",
        FIRMWARE_TARGET,
        "--no-deps",
        "--features",
        FIRMWARE_FEATURES,
    ])) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> All checks passed!".green().bold());
    ExitCode::SUCCESS
}

fn build_lib(trace: bool) -> ExitCode {
    let workspace_root = workspace_root();
    let features = features(trace);
    println!(
        "{}",
        format!("Building library with features: {features}").cyan()
    );

    if run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "build",
        "--lib",
        "--target",
        FIRMWARE_TARGET,
        "--features",
        &features,
    ])) {
        println!("{}", "Build successful!".green());
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn build_uf2(trace: bool) -> ExitCode {
    let workspace_root = workspace_root();
    let features = features(trace);

    println!("{}", format!("Building UF2 for '{DEMO_BIN}'").cyan());
    println!("  Features: {}", features.bright_black());
    println!("  Target: {}", FIRMWARE_TARGET.bright_black());

    if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "build",
        "--bin",
        DEMO_BIN,
        "--release",
        "--target",
        FIRMWARE_TARGET,
        "--features",
        &features,
    ])) {
        return ExitCode::FAILURE;
    }

    let elf_path = format!("target/{FIRMWARE_TARGET}/release/{DEMO_BIN}");
    let uf2_path = format!("{DEMO_BIN}.uf2");

    println!("\n{}", "Converting to UF2 format...".cyan());

    if run_command(
        Command::new("elf2uf2-rs")
            .current_dir(&workspace_root)
            .args([&elf_path, &uf2_path]),
    ) {
        println!("{}", format!("UF2 created: {uf2_path}").green().bold());
        println!("{}", "Ready to drag-and-drop to your Pico!".bright_black());
        ExitCode::SUCCESS
    } else {
        println!(
            "{}",
            "Note: Install elf2uf2-rs with: cargo install elf2uf2-rs".yellow()
        );
        ExitCode::FAILURE
    }
}

fn features(trace: bool) -> String {
    let mut features = FIRMWARE_FEATURES.to_string();
    if trace {
        features.push_str(",sense-trace");
    }
    features
}

fn workspace_root() -> std::path::PathBuf {
    // xtask/ sits one level below the workspace root.
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map_or_else(|| std::path::PathBuf::from("."), std::path::Path::to_path_buf)
}

fn host_target() -> Option<String> {
    let output = Command::new("rustc").arg("-vV").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("host: "))
        .map(|host| host.trim().to_string())
}

fn run_command(cmd: &mut Command) -> bool {
    match cmd.status() {
        Ok(status) => status.success(),
        Err(e) => {
            eprintln!("{}", format!("Failed to execute command: {e}").red());
            false
        }
    }
}
