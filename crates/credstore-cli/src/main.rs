use clap::{Parser, Subcommand};
use credstore_jwt::Tier;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "credstore", version, about = "CredStore operator CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Signing key management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// App token minting and token debugging
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Policy file tooling
    Policy {
        #[command(subcommand)]
        cmd: PolicyCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new Ed25519 signing keypair (PEM).
    Generate {
        /// Directory to write signing.key and signing.pub into. Prints to stdout if omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Mint an app token for a client, signed with the server's key.
    Mint {
        /// Client name
        #[arg(long)]
        client: String,

        /// Path to the PKCS#8 PEM signing key
        #[arg(long, env = "CREDSTORE_SIGNING_KEY")]
        signing_key: PathBuf,

        /// Token lifetime (e.g. "8760h", "30days")
        #[arg(long, default_value = commands::token::DEFAULT_APP_TOKEN_LIFETIME)]
        expires: String,

        /// Emit the JWS JSON serialization instead of the compact token
        #[arg(long)]
        long: bool,

        /// Write the token to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Decode a token without verifying its signature.
    Inspect {
        /// Token string or path to a file containing it
        token: String,
    },

    /// Verify a token's signature, tier and expiry.
    Verify {
        /// Path to the SPKI PEM public key
        #[arg(long)]
        public_key: PathBuf,

        /// Expected tier: app, auth or rpc
        #[arg(long, default_value = "app")]
        tier: Tier,

        /// Token string or path to a file containing it
        token: String,
    },
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Validate a policy file
    Check {
        /// Path to the YAML policy file
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { output } => commands::keys::generate(output)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Mint {
                client,
                signing_key,
                expires,
                long,
                output,
            } => commands::token::mint(signing_key, client, expires, long, output)?,
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
            TokenCommand::Verify {
                public_key,
                tier,
                token,
            } => commands::token::verify(public_key, tier, token)?,
        },

        Command::Policy { cmd } => match cmd {
            PolicyCommand::Check { file } => commands::check::run(&file)?,
        },
    }

    Ok(())
}
