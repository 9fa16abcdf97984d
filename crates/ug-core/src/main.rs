//! userguard CLI.
//!
//! Small tools around the credential hasher and the PII redactor:
//! - `ug hash`: hash a secret read from stdin
//! - `ug verify --hash <phc>`: check a secret from stdin against a hash
//! - `ug redact`: redact log lines from stdin
//! - `ug config show`: print the resolved configuration

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, error};
use ug_core::config::CoreConfig;
use ug_core::exit_codes::ExitCode;
use ug_core::logging::{
    init_logging, Level, LogConfig, LogFormat, LogLevel, LogRecord, RedactingLogSink,
    WriterEmitter,
};
use ug_core::ConfigSource;
use ug_redact::{CredentialHasher, FieldRedactor, FieldSpec};

/// userguard - credential hashing and PII redaction
#[derive(Parser)]
#[command(name = "ug")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for diagnostics on stderr
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a secret read from stdin and print the encoded hash
    Hash,

    /// Check a secret read from stdin against an encoded hash
    Verify {
        /// Encoded hash to check against
        #[arg(long = "hash")]
        encoded: String,
    },

    /// Redact sensitive fields from lines read on stdin
    Redact(RedactArgs),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// Comma-separated field names (overrides config)
    #[arg(long)]
    fields: Option<String>,

    /// Replacement marker (overrides config)
    #[arg(long)]
    marker: Option<String>,

    /// Assignment separator (overrides config)
    #[arg(long)]
    separator: Option<char>,

    /// Logger name printed on each line
    #[arg(long)]
    logger: Option<String>,

    /// Print only the redacted text, without the log prefix
    #[arg(long)]
    raw: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration as JSON
    Show,
}

fn main() {
    let cli = Cli::parse();

    let (config, source) = match CoreConfig::resolve(cli.global.config.as_deref()) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("ug: {}", e);
            std::process::exit(ExitCode::ConfigError.as_i32());
        }
    };

    let log_config = config.logging.clone().with_overrides(
        |key| std::env::var(key).ok(),
        cli.global.log_level,
        cli.global.log_format,
    );
    match RedactingLogSink::from_config(
        &config.redaction,
        &log_config,
        Box::new(WriterEmitter::stderr()),
    ) {
        Ok(sink) => {
            if let Err(e) = init_logging(&log_config, Arc::new(sink)) {
                eprintln!("ug: failed to initialize logging: {}", e);
            }
        }
        Err(e) => {
            eprintln!("ug: {}", e);
            std::process::exit(ExitCode::ConfigError.as_i32());
        }
    }
    debug!(source = %source, "configuration resolved");

    let exit_code = match cli.command {
        Commands::Hash => run_hash(&config),
        Commands::Verify { encoded } => run_verify(&config, &encoded),
        Commands::Redact(args) => run_redact(&config, &log_config, &args),
        Commands::Config(ConfigCommands::Show) => run_config_show(&config, &source),
    };

    if !exit_code.is_operational() {
        debug!(exit_code = %exit_code, "command failed");
    }
    std::process::exit(exit_code.as_i32());
}

/// Read a secret from stdin, dropping one trailing line ending.
fn read_secret() -> io::Result<String> {
    let mut secret = String::new();
    io::stdin().read_to_string(&mut secret)?;
    if secret.ends_with('\n') {
        secret.pop();
        if secret.ends_with('\r') {
            secret.pop();
        }
    }
    Ok(secret)
}

fn run_hash(config: &CoreConfig) -> ExitCode {
    let hasher = match CredentialHasher::new(config.hashing) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "invalid hash cost");
            return ExitCode::ConfigError;
        }
    };
    let secret = match read_secret() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to read secret");
            return ExitCode::IoError;
        }
    };
    match hasher.hash(&secret) {
        Ok(hash) => {
            println!("{}", hash);
            ExitCode::Ok
        }
        Err(e) => {
            error!(error = %e, "hashing failed");
            ExitCode::InternalError
        }
    }
}

fn run_verify(config: &CoreConfig, encoded: &str) -> ExitCode {
    let hasher = match CredentialHasher::new(config.hashing) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "invalid hash cost");
            return ExitCode::ConfigError;
        }
    };
    let secret = match read_secret() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to read secret");
            return ExitCode::IoError;
        }
    };
    if hasher.verify_encoded(&secret, encoded) {
        println!("valid");
        ExitCode::Ok
    } else {
        println!("invalid");
        ExitCode::Mismatch
    }
}

fn run_redact(config: &CoreConfig, log_config: &LogConfig, args: &RedactArgs) -> ExitCode {
    let mut policy = config.redaction.clone();
    if let Some(list) = &args.fields {
        match FieldSpec::parse_list(list) {
            Ok(fields) => policy.fields = fields,
            Err(e) => {
                eprintln!("ug: --fields: {}", e);
                return ExitCode::ArgsError;
            }
        }
    }
    if let Some(marker) = &args.marker {
        policy.marker = marker.clone();
    }
    if let Some(separator) = args.separator {
        policy.separator = separator;
    }

    let redactor = match FieldRedactor::from_policy(&policy) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ug: {}", e);
            return ExitCode::ArgsError;
        }
    };
    let sink = RedactingLogSink::new(redactor, Box::new(WriterEmitter::stdout()))
        .with_tag(log_config.tag.clone())
        .with_format(log_config.format);
    let logger = args.logger.as_deref().unwrap_or(&log_config.logger);

    let stdin = io::stdin();
    let mut lines = 0usize;
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, "failed to read input");
                return ExitCode::IoError;
            }
        };
        let written = if args.raw {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", sink.redactor().redact(&line))
        } else {
            sink.emit(&LogRecord::new(Level::Info, logger, line))
        };
        if let Err(e) = written {
            error!(error = %e, "failed to write output");
            return ExitCode::IoError;
        }
        lines += 1;
    }
    debug!(lines, "redaction finished");
    ExitCode::Ok
}

fn run_config_show(config: &CoreConfig, source: &ConfigSource) -> ExitCode {
    let output = serde_json::json!({
        "source": source.to_string(),
        "config": config,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::Ok
        }
        Err(e) => {
            error!(error = %e, "failed to serialize config");
            ExitCode::InternalError
        }
    }
}
