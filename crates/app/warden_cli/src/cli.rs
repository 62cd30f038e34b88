use clap::{Parser, Subcommand};
use warden_core::auth::config::DEFAULT_ISSUER;
use warden_core::auth::password::DEFAULT_BCRYPT_COST;

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Warden operator tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Hash a password for seeding an account row.
    HashPassword {
        plaintext: String,

        /// bcrypt work factor.
        #[arg(long, env = "BCRYPT_COST", default_value_t = DEFAULT_BCRYPT_COST)]
        cost: u32,
    },

    /// Verify and decode a token, printing its claims as JSON.
    InspectToken {
        token: String,

        /// Signing secret the token was issued with.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,

        /// Issuer the token must carry.
        #[arg(long, env = "JWT_ISSUER", default_value = DEFAULT_ISSUER)]
        issuer: String,
    },
}
