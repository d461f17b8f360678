//! Configuration example: escalate, guard on HA state, apply and persist.
//!
//! Walks the full change workflow: connect, `enable` if the device left us
//! at an unprivileged prompt, refuse to touch a standby HA unit, push a
//! small configuration, and save it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example config_session -- \
//!     --host 192.0.2.10 --user admin --password secret \
//!     --enable enable-secret --ntp 192.0.2.123
//! ```

use std::env;
use std::process::exit;

use corral::error::SessionError;
use corral::{Error, SessionBuilder, SessionMode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}:{}...", args.host, args.port);
    let mut session = SessionBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(&args.password)
        .connect()
        .await?;
    println!(
        "Connected to '{}' ({} mode)",
        session.prompt_prefix(),
        session.mode()
    );

    if session.mode() != SessionMode::Privileged {
        println!("Escalating to privileged mode...");
        session.enable(&args.enable).await?;
    }

    // Never push configuration at a standby unit; the active peer owns it.
    match session.check_ha_status().await? {
        Some(true) => println!("HA state: active"),
        Some(false) => {
            eprintln!("HA state: standby; refusing to configure this unit");
            session.close().await?;
            exit(2);
        }
        None => println!("HA state: unknown (continuing; device may be standalone)"),
    }

    let lines = [
        format!("ntp server {}", args.ntp),
        "service timestamps log datetime msec".to_string(),
    ];
    let lines: Vec<&str> = lines.iter().map(|l| l.as_str()).collect();

    println!("\nApplying {} configuration lines...", lines.len());
    for response in session.apply_config(&lines).await? {
        println!("  {} ({:?})", response.command, response.elapsed);
    }
    println!("Back at {} mode, depth {}", session.mode(), session.config_depth());

    println!("\nSaving configuration...");
    match session.write_config().await {
        Ok(response) => println!("{}", response.output),
        Err(Error::Session(SessionError::Unsupported { .. })) => {
            println!("No save command registered for this device family; skipping");
        }
        Err(err) => return Err(err.into()),
    }

    session.close().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    enable: String,
    ntp: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 22u16;
        let mut user = "admin".to_string();
        let mut password = None;
        let mut enable = None;
        let mut ntp = "192.0.2.123".to_string();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--enable" | "-e" => {
                    i += 1;
                    if i < args.len() {
                        enable = Some(args[i].clone());
                    }
                }
                "--ntp" => {
                    i += 1;
                    if i < args.len() {
                        ntp = args[i].clone();
                    }
                }
                "--help" => {
                    Self::print_help();
                    exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        let Some(password) = password else {
            eprintln!("Error: --password is required");
            exit(1);
        };
        // The enable password often equals the login password.
        let enable = enable.unwrap_or_else(|| password.clone());

        Self {
            host,
            port,
            user,
            password,
            enable,
            ntp,
        }
    }

    fn print_help() {
        println!(
            r#"corral config_session example

USAGE:
    cargo run --example config_session -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Target device [default: localhost]
    -p, --port <PORT>        SSH port [default: 22]
    -u, --user <USER>        Username [default: admin]
    -P, --password <PASS>    Password for authentication (required)
    -e, --enable <PASS>      Enable password [default: same as --password]
    --ntp <ADDR>             NTP server to configure [default: 192.0.2.123]
    --help                   Print this help message
"#
        );
    }
}
