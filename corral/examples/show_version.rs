//! Basic example: connect to a device and run `show version`.
//!
//! Demonstrates the connect sequence (prompt discovery, identification,
//! pagination disable) and a simple command round-trip.
//!
//! # Prerequisites
//!
//! - A network device (or lab VM) reachable over SSH
//! - Valid credentials (username/password or SSH key)
//!
//! # Usage
//!
//! ```bash
//! cargo run --example show_version -- --host 192.0.2.10 --user admin --password secret
//! ```

use std::env;
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

use corral::SessionBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}:{}...", args.host, args.port);

    let mut builder = SessionBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .connect_timeout(Duration::from_secs(args.timeout));

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: must provide either --password or --key");
        exit(1);
    }

    let mut session = builder.connect().await?;

    println!("Connected!");
    println!("  prompt:      {}", session.prompt());
    println!("  mode:        {}", session.mode());
    match session.profile().catalog.as_deref() {
        Some(name) => println!("  catalog:     {}", name),
        None => println!("  catalog:     (none matched, generic matching)"),
    }
    let identifiers: Vec<&str> = session.identifiers().iter().map(|s| s.as_str()).collect();
    println!("  identifiers: {}", identifiers.join(", "));

    println!("\nExecuting: show version");
    println!("{}", "-".repeat(50));

    let response = session.send_graceful("show version").await?;
    if let Some(failure) = &response.failure {
        eprintln!("Command was rejected: {}", failure);
    } else {
        println!("{}", response.output);
    }

    println!("{}", "-".repeat(50));
    println!("Command completed in {:?}", response.elapsed);

    println!("\nClosing session...");
    session.close().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 22u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "admin".to_string());
        let mut password = None;
        let mut key = None;
        let mut timeout = 30u64;

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
                "--key" | "-k" => {
                    i += 1;
                    if i < args.len() {
                        key = Some(PathBuf::from(&args[i]));
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(30);
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

        Self {
            host,
            port,
            user,
            password,
            key,
            timeout,
        }
    }

    fn print_help() {
        println!(
            r#"corral show_version example

USAGE:
    cargo run --example show_version -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Target device [default: localhost]
    -p, --port <PORT>        SSH port [default: 22]
    -u, --user <USER>        Username [default: $USER]
    -P, --password <PASS>    Password for authentication
    -k, --key <PATH>         Path to SSH private key
    -t, --timeout <SECS>     Connection timeout [default: 30]
    --help                   Print this help message

EXAMPLES:
    # Connect with password
    cargo run --example show_version -- --host 192.0.2.10 --user admin --password secret

    # Connect with SSH key
    cargo run --example show_version -- --host 192.0.2.10 --user admin --key ~/.ssh/id_rsa
"#
        );
    }
}
