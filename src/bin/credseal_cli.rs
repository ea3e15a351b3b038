// credseal-cli — local key custody and encryption operations
//
// Everything here runs on the client machine; nothing touches the
// ledger. Usage: credseal-cli <command> [args...]

use std::env;

use colored::*;

use credseal::config::{INSTITUTION_KEY_MESSAGE, STUDENT_KEY_MESSAGE};
use credseal::crypto::keys::{derive_address, encode_address_string, generate_keypair, public_from_private};
use credseal::crypto::{ecies, recover};
use credseal::wallet::backup::{self, EncryptedBackup};

fn print_usage() {
    println!(
        "{}",
        "  ██████╗██████╗ ███████╗██████╗ ███████╗███████╗ █████╗ ██╗     ".bright_cyan()
    );
    println!(
        "{}",
        " ██╔════╝██╔══██╗██╔════╝██╔══██╗██╔════╝██╔════╝██╔══██╗██║     "
            .bright_cyan()
            .bold()
    );
    println!(
        "{}",
        " ██║     ██████╔╝█████╗  ██║  ██║███████╗█████╗  ███████║██║     "
            .bright_cyan()
            .bold()
    );
    println!(
        "{}",
        " ██║     ██╔══██╗██╔══╝  ██║  ██║╚════██║██╔══╝  ██╔══██║██║     ".blue()
    );
    println!(
        "{}",
        " ╚██████╗██║  ██║███████╗██████╔╝███████║███████╗██║  ██║███████╗".blue()
    );
    println!(
        "{}",
        "  ╚═════╝╚═╝  ╚═╝╚══════╝╚═════╝ ╚══════╝╚══════╝╚═╝  ╚═╝╚══════╝".blue()
    );
    println!(
        "{}",
        "            - Academic Records Key Custody -            "
            .bright_yellow()
            .on_blue()
            .bold()
    );
    println!();
    println!(
        "{}",
        "  Usage: credseal-cli <command> [args...]"
            .bright_yellow()
            .bold()
    );
    println!();
    println!("{}", "  Commands:".bright_white().bold());
    println!(
        "  {} {:<46} {}",
        "❯".bright_black(),
        "createkeys <backup-file> <password>".bright_green(),
        "Generate a keypair and seal a backup".white()
    );
    println!(
        "  {} {:<46} {}",
        "❯".bright_black(),
        "inspect <backup-file>".bright_green(),
        "Show backup parameters (no secrets)".white()
    );
    println!(
        "  {} {:<46} {}",
        "❯".bright_black(),
        "showkey <backup-file> <password>".bright_green(),
        "Recover address + public key from a backup".white()
    );
    println!(
        "  {} {:<46} {}",
        "❯".bright_black(),
        "encrypt <recipient-pub-hex> <plaintext>".bright_green(),
        "Hybrid-encrypt to a public key".white()
    );
    println!(
        "  {} {:<46} {}",
        "❯".bright_black(),
        "decrypt <backup-file> <password> <payload-hex>".bright_green(),
        "Decrypt a hybrid payload".white()
    );
    println!(
        "  {} {:<46} {}",
        "❯".bright_black(),
        "recoverkey <student|institution> <sig-hex>".bright_green(),
        "Recover a public key from a role signature".white()
    );
    println!();
}

fn fail(message: &str) -> ! {
    eprintln!("{} {}", "error:".bright_red().bold(), message);
    std::process::exit(1);
}

/// Decrypts a hybrid payload for display. Every failure collapses to the
/// same message: wrong key, tampered ciphertext and malformed payload
/// must be indistinguishable in user-facing output.
fn decrypt_payload(payload_hex: &str, private: &[u8]) -> Result<String, &'static str> {
    let plaintext = ecies::decrypt(payload_hex, private).map_err(|_| "decryption failed")?;
    String::from_utf8(plaintext).map_err(|_| "decryption failed")
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "createkeys" if args.len() == 4 => {
            let (private, public) = generate_keypair(&mut rand::rngs::OsRng);
            let sealed = match backup::seal(&private, &args[3]) {
                Ok(b) => b,
                Err(e) => fail(&e.to_string()),
            };
            if let Err(e) = sealed.save(&args[2]) {
                fail(&e.to_string());
            }

            println!("{}", "NEW KEYPAIR CREATED".bright_green().bold());
            println!(
                "{} {}",
                "Address:   ".bright_yellow(),
                encode_address_string(&derive_address(&public)).bright_white()
            );
            println!(
                "{} {}",
                "Public key:".bright_yellow(),
                hex::encode(public).white()
            );
            println!(
                "{} {}",
                "Backup:    ".bright_yellow(),
                args[2].white()
            );
            println!();
            println!(
                "{}",
                "IMPORTANT: The backup file and password are the ONLY way to recover this key."
                    .on_red()
                    .white()
                    .bold()
            );
        }

        "inspect" if args.len() == 3 => {
            let sealed = match EncryptedBackup::load(&args[2]) {
                Ok(b) => b,
                Err(e) => fail(&e.to_string()),
            };
            println!("{} {}", "version:      ".bright_yellow(), sealed.version);
            println!(
                "{} {}",
                "kdfIterations:".bright_yellow(),
                sealed.kdf_iterations
            );
            println!("{} {}", "salt:         ".bright_yellow(), sealed.salt);
            println!("{} {}", "iv:           ".bright_yellow(), sealed.iv);
        }

        "showkey" if args.len() == 4 => {
            let sealed = match EncryptedBackup::load(&args[2]) {
                Ok(b) => b,
                Err(e) => fail(&e.to_string()),
            };
            let private = match backup::open(&sealed, &args[3]) {
                Ok(k) => k,
                Err(e) => fail(&e.to_string()),
            };
            let public = match public_from_private(&private) {
                Ok(p) => p,
                Err(e) => fail(&e.to_string()),
            };
            println!(
                "{} {}",
                "Address:   ".bright_yellow(),
                encode_address_string(&derive_address(&public)).bright_white()
            );
            println!(
                "{} {}",
                "Public key:".bright_yellow(),
                hex::encode(public).white()
            );
        }

        "encrypt" if args.len() == 4 => {
            let recipient = match hex::decode(&args[2]) {
                Ok(b) => b,
                Err(_) => fail("invalid public key hex"),
            };
            match ecies::encrypt(args[3].as_bytes(), &recipient) {
                Ok(payload) => println!("{}", payload.bright_white()),
                Err(e) => fail(&e.to_string()),
            }
        }

        "decrypt" if args.len() == 5 => {
            let sealed = match EncryptedBackup::load(&args[2]) {
                Ok(b) => b,
                Err(e) => fail(&e.to_string()),
            };
            let private = match backup::open(&sealed, &args[3]) {
                Ok(k) => k,
                Err(e) => fail(&e.to_string()),
            };
            match decrypt_payload(&args[4], &private) {
                Ok(text) => println!("{}", text.bright_white()),
                Err(message) => fail(message),
            }
        }

        "recoverkey" if args.len() == 4 => {
            let message = match args[2].as_str() {
                "student" => STUDENT_KEY_MESSAGE,
                "institution" => INSTITUTION_KEY_MESSAGE,
                _ => fail("role must be 'student' or 'institution'"),
            };
            let signature = match hex::decode(&args[3]) {
                Ok(b) => b,
                Err(_) => fail("invalid signature hex"),
            };
            match recover::recover_public_key(message, &signature) {
                Ok(public) => {
                    println!(
                        "{} {}",
                        "Address:   ".bright_yellow(),
                        encode_address_string(&derive_address(&public)).bright_white()
                    );
                    println!(
                        "{} {}",
                        "Public key:".bright_yellow(),
                        hex::encode(public).white()
                    );
                }
                Err(e) => fail(&e.to_string()),
            }
        }

        _ => print_usage(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credseal::config::{NONCE_BYTES, PUBLIC_KEY_BYTES};
    use credseal::crypto::keys::generate_keypair;
    use rand::rngs::OsRng;

    #[test]
    fn test_decrypt_failures_share_one_message() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let (other_sk, _) = generate_keypair(&mut OsRng);
        let payload = ecies::encrypt(b"transcript", &pk).unwrap();

        let wrong_key = decrypt_payload(&payload, &other_sk).unwrap_err();

        let mut raw = hex::decode(&payload).unwrap();
        let idx = PUBLIC_KEY_BYTES + NONCE_BYTES + 1;
        raw[idx] ^= 0x40;
        let tampered = decrypt_payload(&hex::encode(&raw), &sk).unwrap_err();

        let malformed = decrypt_payload("deadbeef", &sk).unwrap_err();

        assert_eq!(wrong_key, tampered);
        assert_eq!(tampered, malformed);
    }

    #[test]
    fn test_decrypt_payload_roundtrip() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let payload = ecies::encrypt(b"hello", &pk).unwrap();
        assert_eq!(decrypt_payload(&payload, &sk).unwrap(), "hello");
    }
}
