#![deny(missing_docs)]
//! A command-line interface for replaying one-time passcode entry sessions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{error, info};
use otp_entry_core::app_hash;
use otp_entry_core::config::{self, CharCase, SessionConfig};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

mod script;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n  \n# Write a session config for a 6-digit code\notp-entry init-config ./otp.json --shape 1,1,1,1,1,1 --pattern '^[0-9]$' --sms-pattern '\\d{6}'\n\n# Replay a script of cell events against that config\notp-entry --config ./otp.json replay ./events.jsonl\n\n# Split a code into cells\notp-entry split --shape 3,3 ABCXYZ\n\n# Compute the SMS Retriever app hash\notp-entry app-hash --package com.example.app --cert ./signing.pem"
)]
struct Cli {
    /// Path to a JSON session config. Flags override its fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event script and print every session event
    Replay {
        /// Script file; reads stdin when omitted or '-'
        #[arg()]
        script: Option<PathBuf>,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Split a code into cells and report its completeness
    Split {
        /// The code to split
        #[arg()]
        code: String,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Write a session config file
    InitConfig {
        /// Where to write the config
        #[arg()]
        path: PathBuf,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Compute the SMS Retriever app hash for a package and signing certificate
    AppHash {
        /// Application package name
        #[arg(long)]
        package: String,

        /// Signing certificate as a PEM or DER file
        #[arg(long, value_name = "CERT_FILE", conflicts_with = "cert_hex", required_unless_present = "cert_hex")]
        cert: Option<PathBuf>,

        /// Signing certificate DER bytes as hex
        #[arg(long, value_name = "HEX")]
        cert_hex: Option<String>,
    },
}

#[derive(Args)]
struct SessionArgs {
    /// Cell capacities, e.g. 1,1,1,1,1,1 or 3,3
    #[arg(long, value_delimiter = ',')]
    shape: Option<Vec<usize>>,

    /// Initial code value
    #[arg(long)]
    value: Option<String>,

    /// Regular expression every character must match
    #[arg(long)]
    pattern: Option<String>,

    /// Case conversion for typed characters
    #[arg(long, value_enum)]
    transform: Option<Transform>,

    /// Separator used by pasted codes, e.g. '-' for ABC-XYZ
    #[arg(long)]
    delimiter: Option<String>,

    /// Regular expression locating the code inside an SMS
    #[arg(long)]
    sms_pattern: Option<String>,

    /// Do not submit automatically when the last cell is typed
    #[arg(long)]
    no_auto_submit: bool,

    /// Arm the SMS listener when the session starts
    #[arg(long)]
    expect_sms: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transform {
    None,
    Uppercase,
    Lowercase,
}

impl From<Transform> for CharCase {
    fn from(transform: Transform) -> Self {
        match transform {
            Transform::None => Self::None,
            Transform::Uppercase => Self::Uppercase,
            Transform::Lowercase => Self::Lowercase,
        }
    }
}

fn resolve_config(config_path: Option<&Path>, args: SessionArgs) -> SessionConfig {
    let mut session_config = match config_path {
        Some(path) => config::load_config(path).unwrap_or_else(|e| {
            error!("Failed to load config '{}': {e}", path.display());
            std::process::exit(1);
        }),
        None => {
            let Some(shape) = args.shape.clone() else {
                error!("A --shape is required when no --config file is given.");
                std::process::exit(1);
            };
            SessionConfig::new(shape)
        }
    };

    if let Some(shape) = args.shape {
        session_config.code_input_shape = shape;
    }
    if let Some(value) = args.value {
        session_config.value = Some(value);
    }
    if let Some(pattern) = args.pattern {
        session_config.validate_pattern = Some(pattern);
    }
    if let Some(transform) = args.transform {
        session_config.char_transform = transform.into();
    }
    if let Some(delimiter) = args.delimiter {
        session_config.paste_delimiter = Some(delimiter);
    }
    if let Some(sms_pattern) = args.sms_pattern {
        session_config.sms_code_pattern = Some(sms_pattern);
    }
    if args.no_auto_submit {
        session_config.automatically_submit = false;
    }
    if args.expect_sms {
        session_config.expect_sms_on_mount = true;
    }
    session_config
}

fn read_script(path: Option<&Path>) -> String {
    let result = match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path),
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).map(|_| buffer)
        }
    };
    result.unwrap_or_else(|e| {
        error!("Failed to read event script: {e}");
        std::process::exit(1);
    })
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { script, session } => {
            let session_config = resolve_config(cli.config.as_deref(), session);
            let otp_session = session_config.build_session().unwrap_or_else(|e| {
                error!("Invalid session configuration: {e}");
                std::process::exit(1);
            });
            let source = read_script(script.as_deref());
            let steps = script::parse_script(&source).unwrap_or_else(|e| {
                error!("Invalid event script: {e}");
                std::process::exit(1);
            });
            info!("Replaying {} step(s).", steps.len());
            if let Err(e) = script::replay(&otp_session, &steps) {
                error!("Failed to write replay output: {e}");
                std::process::exit(1);
            }
        }
        Commands::Split { code, session } => {
            let session_config = resolve_config(cli.config.as_deref(), session);
            let mut engine = session_config.build_engine().unwrap_or_else(|e| {
                error!("Invalid session configuration: {e}");
                std::process::exit(1);
            });
            engine.set_value(&code);
            let report = serde_json::json!({
                "cells": engine.state(),
                "ready": engine.is_ready(),
                "complete": engine.is_complete(),
            });
            println!("{report}");
        }
        Commands::InitConfig { path, session } => {
            let session_config = resolve_config(cli.config.as_deref(), session);
            if let Err(e) = session_config.build_session() {
                error!("Refusing to write an invalid configuration: {e}");
                std::process::exit(1);
            }
            if let Err(e) = config::save_config(&path, &session_config) {
                error!("Failed to save config: {e}");
                std::process::exit(1);
            }
            info!("Config written to '{}'.", path.display());
        }
        Commands::AppHash {
            package,
            cert,
            cert_hex,
        } => {
            let certificate_hex = match (cert, cert_hex) {
                (_, Some(hex)) => hex,
                (Some(path), None) => {
                    let contents = fs::read(&path).unwrap_or_else(|e| {
                        error!("Failed to read certificate '{}': {e}", path.display());
                        std::process::exit(1);
                    });
                    let der = app_hash::certificate_der(&contents).unwrap_or_else(|e| {
                        error!("{e}");
                        std::process::exit(1);
                    });
                    app_hash::certificate_hex(&der)
                }
                (None, None) => {
                    error!("Either --cert or --cert-hex is required.");
                    std::process::exit(1);
                }
            };
            match app_hash::app_hash(&package, &certificate_hex) {
                Ok(hash) => println!("{hash}"),
                Err(e) => {
                    error!("Failed to compute app hash: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
