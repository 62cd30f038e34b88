// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use warden_core::auth::jwt::TokenCodec;
use warden_core::auth::password;
use warden_core::clock::{Clock, SystemClock};

mod cli;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match &args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), warden_core::version());
        }
        Commands::HashPassword { plaintext, cost } => {
            if !password::is_valid_cost(*cost) {
                return Err(Error::Custom(format!(
                    "cost must be between {} and {}",
                    password::MIN_BCRYPT_COST,
                    password::MAX_BCRYPT_COST
                )));
            }
            println!("{}", password::hash_password(plaintext, *cost)?);
        }
        Commands::InspectToken {
            token,
            secret,
            issuer,
        } => {
            let codec = TokenCodec::new(secret.as_bytes(), issuer.as_str());
            let claims = codec.decode(token.trim(), SystemClock.now())?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }

    Ok(())
}
