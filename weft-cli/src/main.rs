//! Weft CLI - Command line interface
//!
//! `weave` runs one pass over a freshly compiled module, `inspect`
//! prints a module's declarations and markers.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

mod config;
mod logging;

use crate::config::LogConfig;
use crate::logging::LogFormat;
use weft_config::{RetryPolicy, SearchPaths, WeaveConfig};
use weft_core::{
    CompilationEvent, Diagnostic, MarkerRegistry, Orchestrator, PassOutcome, SkipReason,
};
use weft_model::decode_module;
use weft_vfs::{NativeFileSystem, VirtualFileSystem};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<FormatArg> for LogFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pretty => LogFormat::Pretty,
            FormatArg::Compact => LogFormat::Compact,
            FormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "weft",
    about = "Weft - post-compilation bytecode aspect weaver",
    version = "0.1.0"
)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "compact")]
    log_format: FormatArg,

    /// Also append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Weave a freshly compiled module in place
    Weave {
        /// Module file (.wmod) to weave
        module: PathBuf,

        /// Build-intermediate directory searched for dependencies
        #[arg(long)]
        intermediate_dir: Option<PathBuf>,

        /// Base-library directory searched for dependencies (repeatable)
        #[arg(long = "lib-dir")]
        lib_dirs: Vec<PathBuf>,

        /// JSON file with the triggering compilation's diagnostics
        #[arg(long)]
        diagnostics: Option<PathBuf>,

        /// Skip weaving entirely
        #[arg(long)]
        disabled: bool,

        /// Replace attempts before the pass fails
        #[arg(long, default_value_t = 5)]
        max_attempts: u32,

        /// Fixed backoff between replace attempts, in milliseconds
        #[arg(long, default_value_t = 200)]
        backoff_ms: u64,
    },
    /// Print a module's declarations and markers
    Inspect {
        /// Module file (.wmod) to inspect
        module: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let global = cli.log_level.parse::<Level>().unwrap_or_else(|_| {
        eprintln!("Error: invalid log level '{}'", cli.log_level);
        process::exit(1);
    });
    let log_config = LogConfig {
        global,
        ..LogConfig::default()
    };
    logging::init_with_file(&log_config, cli.log_format.into(), cli.log_file.as_ref());

    match cli.command {
        Command::Weave {
            module,
            intermediate_dir,
            lib_dirs,
            diagnostics,
            disabled,
            max_attempts,
            backoff_ms,
        } => handle_weave(
            module,
            intermediate_dir,
            lib_dirs,
            diagnostics,
            disabled,
            max_attempts,
            backoff_ms,
        ),
        Command::Inspect { module } => handle_inspect(&module),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_weave(
    module: PathBuf,
    intermediate_dir: Option<PathBuf>,
    lib_dirs: Vec<PathBuf>,
    diagnostics: Option<PathBuf>,
    disabled: bool,
    max_attempts: u32,
    backoff_ms: u64,
) {
    let diagnostics = match diagnostics.map(|p| read_diagnostics(&p)).transpose() {
        Ok(d) => d.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let config = WeaveConfig {
        enabled: !disabled,
        search_paths: SearchPaths {
            module_dir: None,
            intermediate_dir,
            base_library_dirs: lib_dirs,
        },
        retry: RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(backoff_ms),
        },
        ..WeaveConfig::default()
    };

    let mut orchestrator = Orchestrator::new(
        config,
        MarkerRegistry::with_builtin_weavers(),
        Arc::new(NativeFileSystem::new()),
    );
    let event = CompilationEvent {
        module_path: module,
        diagnostics,
    };

    match orchestrator.run(&event) {
        Ok(PassOutcome::Completed(report)) => {
            println!(
                "Woven {}: {} target(s), {} failure(s)",
                report.module,
                report.woven,
                report.failures.len()
            );
            for failure in &report.failures {
                println!(
                    "  failed: {} [{}] - {}",
                    failure.target, failure.marker, failure.error
                );
            }
        }
        Ok(PassOutcome::Dropped) => {
            println!("Dropped: another pass is active");
        }
        Ok(PassOutcome::Skipped(SkipReason::Disabled)) => {
            println!("Skipped: weaving disabled");
        }
        Ok(PassOutcome::Skipped(SkipReason::CompilationErrors)) => {
            println!("Skipped: compilation reported errors");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Read a JSON array of diagnostics dropped by the host toolchain.
fn read_diagnostics(path: &Path) -> Result<Vec<Diagnostic>, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("cannot read diagnostics file '{}': {}", path.display(), e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| format!("cannot parse diagnostics file '{}': {}", path.display(), e))
}

fn handle_inspect(path: &Path) {
    let fs = NativeFileSystem::new();
    let bytes = match fs.read_file(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let module = match decode_module(bytes) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Error: cannot decode '{}': {}", path.display(), e);
            process::exit(1);
        }
    };

    println!("module {}", module.name);
    for ty in module.declaration_order() {
        let decl = module.type_decl(ty);
        let base = decl
            .base
            .as_ref()
            .map(|b| format!(" : {}", b))
            .unwrap_or_default();
        println!("  type {}{}", module.full_name(ty), base);
        for marker in &decl.markers {
            println!("    [{}]", marker);
        }
        for field in &decl.fields {
            let markers = field
                .markers
                .iter()
                .map(|m| format!(" [{}]", m))
                .collect::<String>();
            println!("    field {} {}{}", field.field_type, field.name, markers);
        }
        for method in &decl.methods {
            let body = method
                .body
                .as_ref()
                .map(|b| format!(" ({} instr)", b.instructions.len()))
                .unwrap_or_else(|| " (no body)".to_string());
            let markers = method
                .markers
                .iter()
                .map(|m| format!(" [{}]", m))
                .collect::<String>();
            println!(
                "    method {} {}{}{}",
                method.return_type, method.name, body, markers
            );
        }
    }
}
