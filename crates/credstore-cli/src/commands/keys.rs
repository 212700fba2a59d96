//! Key management commands.
//!
//! `credstore keys generate` - Generate a new Ed25519 signing keypair.

use credstore_jwt::KeyPair;
use std::fs;
use std::path::PathBuf;

pub const PRIVATE_KEY_FILE: &str = "signing.key";
pub const PUBLIC_KEY_FILE: &str = "signing.pub";

/// Generate a new signing keypair.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let keypair = KeyPair::generate();

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let private_path = output_dir.join(PRIVATE_KEY_FILE);
        let public_path = output_dir.join(PUBLIC_KEY_FILE);
        keypair.save_to_files(&private_path, &public_path)?;

        println!("✔ Generated signing keypair:");
        println!("  Private key: {}", private_path.display());
        println!("  Public key:  {}", public_path.display());
        println!();
        println!("⚠️  Keep your private key secure! Never commit it to version control.");
        println!();
        println!("Start the server with:");
        println!(
            "  credstore-server --signing-key {} --config policy.yaml",
            private_path.display()
        );
    } else {
        print!("{}", keypair.private_key_pem()?);
        print!("{}", keypair.public_key_pem()?);
    }

    Ok(())
}
