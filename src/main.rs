//! keystone starter entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Init logger at default level
//!   3. Load config
//!   4. Switch logger to the configured level
//!   5. Print greeting and a sample digest
//!   6. Exit, reporting any failure through the error model

use keystone::{AppError, config::{self, LogLevel}, constants, greeter, logger};
use sha2::{Digest, Sha256};
use tracing::info;

fn main() {
    if let Err(e) = run() {
        e.log();
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    // Load .env if present; ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    // Bootstrap logger at info before config is available.
    let log = logger::init(LogLevel::Info, false)?;

    let config = config::load()?;

    log.set_level(config.log_level, false)?;

    info!(
        app = constants::APP_NAME,
        version = constants::VERSION,
        environment = %config.environment,
        log_level = %config.log_level,
        secret_key_set = config.secret_key.is_some(),
        "config loaded"
    );

    println!("{}", greeter::greet("World"));
    println!("Hash: {}", sha256_hex("Hello, World!"));

    Ok(())
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
