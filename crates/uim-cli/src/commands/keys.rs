//! Key management commands.
//!
//! `uim keys generate` - Generate a provider token-signing key pair.

use std::fs;
use std::path::PathBuf;
use uim_pat::KeyPair;

pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let keypair = KeyPair::generate()?;

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let private_path = output_dir.join("private.key");
        let public_path = output_dir.join("public.key");
        fs::write(&private_path, keypair.private_key_hex())?;
        fs::write(&public_path, keypair.public_key_hex())?;

        println!("Generated provider key pair:");
        println!("  Private key: {}", private_path.display());
        println!("  Public key:  {}", public_path.display());
        println!();
        println!("Reference it from uim.yaml:");
        println!("  provider:");
        println!("    private_key_file: {}", private_path.display());
    } else {
        println!("Private key (keep secure!):");
        println!("{}", keypair.private_key_hex());
        println!();
        println!("Public key:");
        println!("{}", keypair.public_key_hex());
        println!();
        println!("Use --output <dir> to save keys to files.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_keys_to_files() {
        let dir = tempdir().unwrap();
        generate(Some(dir.path().to_path_buf())).unwrap();

        let private_hex = fs::read_to_string(dir.path().join("private.key")).unwrap();
        let public_hex = fs::read_to_string(dir.path().join("public.key")).unwrap();
        assert_eq!(private_hex.len(), 64);
        assert_eq!(public_hex.len(), 64);
        assert!(KeyPair::from_private_key_hex(&private_hex).is_ok());
    }
}
