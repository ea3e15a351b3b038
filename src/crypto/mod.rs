// Cryptographic primitives
pub mod aead;    // AES-256-GCM authenticated encryption
pub mod ecdh;    // secp256k1 shared-secret derivation
pub mod ecies;   // hybrid encryption (ECDH + AEAD)
pub mod hash;    // SHA-256 / Keccak-256 wrappers
pub mod kdf;     // PBKDF2 password key derivation
pub mod keys;    // keypair generation, addresses
pub mod recover; // public-key recovery from signatures
