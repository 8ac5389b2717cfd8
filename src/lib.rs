//! # rsasig
//!
//! RSA key pairs, RSASSA-PSS signatures over text and files, and the
//! signature-info records stored next to them.
//!
//! ## Features
//!
//! - **Key Generation**: RSA key pairs of 1024, 2048, 3072 or 4096 bits with public exponent 65537
//! - **Key Containers**: PKCS#8 private keys (optionally password-encrypted) and SubjectPublicKeyInfo public keys in PEM
//! - **Signing**: RSASSA-PSS with SHA-256, MGF1-SHA-256 and the maximum salt length
//! - **File Signing**: files are streamed through SHA-256 and the digest is signed
//! - **Verification**: a plain `bool`; mismatches and malformed signatures are `false`, never errors
//! - **Signature Records**: JSON sidecars naming the signed artifact, signature file, time and creator
//!
//! ## Quick Start
//!
//! ```rust
//! use rsasig::keys::{generate_key_pair, KeySize};
//! use rsasig::signing::{sign, verify};
//!
//! let key_pair = generate_key_pair(KeySize::Rsa1024).unwrap();
//!
//! let signature = sign(&key_pair.private_key, "hello world").unwrap();
//! assert!(verify(&key_pair.public_key, "hello world", &signature));
//! assert!(!verify(&key_pair.public_key, "hello world!", &signature));
//! ```
//!
//! ## Concurrency
//!
//! Every operation is synchronous and holds no shared state. Key generation
//! and RSA operations are CPU-bound, hashing blocks on disk I/O; callers that
//! need responsiveness should run them on a worker thread.
//!
//! ## Error Handling
//!
//! Operations return [`Result<T, Error>`](error::Result). I/O failures,
//! unparseable keys, wrong passwords and malformed records are errors; an
//! invalid signature is not.

pub mod config;
pub mod error;
pub mod fsutil;
pub mod hasher;
pub mod keys;
pub mod record;
pub mod signing;
pub mod types;

pub use error::{Error, Result};
pub use hasher::{digest_bytes, digest_file, Digest};
pub use keys::{
    generate_key_pair, load_private_key, load_public_key, save_private_key, save_public_key,
    KeyPair, KeySize,
};
pub use record::{build_record, load_record, persist_record, SignatureRecord};
pub use signing::{sign, sign_file, verify, verify_file, Signature};
