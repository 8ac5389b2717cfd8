use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

use rsasig::config::Config;
use rsasig::fsutil::{create_default_directories, read_text};
use rsasig::hasher::{digest_file_chunked, Digest};
use rsasig::keys::{self, KeySize};
use rsasig::record::{build_record, info_path_for, load_record, persist_record};
use rsasig::signing::{self, load_signature, save_signature, Signature};

#[derive(Debug, Parser)]
#[command(name = "rsasig", version, about = "RSA-PSS signing and verification of text and files")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a key pair into the keys directory
    Keygen {
        /// Modulus size in bits (1024, 2048, 3072, 4096)
        #[arg(long)]
        bits: Option<u32>,
        /// Output directory (defaults to the configured keys directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Encrypt the private key with this password
        #[arg(long, env = "RSASIG_KEY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign text or a file and write the signature plus its .info record
    Sign {
        /// Private key PEM
        #[arg(long)]
        key: PathBuf,
        #[command(flatten)]
        input: Input,
        /// Signature output path
        #[arg(long)]
        out: PathBuf,
        /// Creator label for the signature record
        #[arg(long)]
        creator: Option<String>,
        /// Password of an encrypted private key
        #[arg(long, env = "RSASIG_KEY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Verify a signature; exits with status 1 when it is invalid
    Verify {
        /// Public key PEM
        #[arg(long)]
        public_key: PathBuf,
        #[command(flatten)]
        input: Input,
        /// Raw signature file
        #[arg(long, required_unless_present = "signature_base64", conflicts_with = "signature_base64")]
        signature: Option<PathBuf>,
        /// Signature as printed by `sign`, base64-encoded
        #[arg(long)]
        signature_base64: Option<String>,
    },
    /// Print the SHA-256 digest of a file
    Hash {
        file: PathBuf,
        /// Expected digest (hex, optionally `sha256:`-prefixed); exits with status 1 on mismatch
        #[arg(long)]
        expect: Option<Digest>,
    },
    /// Print a signature record
    Info { path: PathBuf },
    /// Print the fingerprint of a public key
    Fingerprint { public_key: PathBuf },
    /// Create the keys, signatures and temp directories
    Init,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Input {
    /// Text payload, signed as UTF-8
    #[arg(long)]
    text: Option<String>,
    /// Read the text payload from a UTF-8 file
    #[arg(long)]
    text_file: Option<PathBuf>,
    /// File to sign through its SHA-256 digest
    #[arg(long)]
    file: Option<PathBuf>,
}

enum Payload {
    /// Text and the file it came from, if any
    Text(String, Option<PathBuf>),
    File(PathBuf),
}

impl Input {
    fn resolve(self) -> rsasig::Result<Payload> {
        if let Some(text) = self.text {
            return Ok(Payload::Text(text, None));
        }
        if let Some(path) = self.text_file {
            let text = read_text(&path)?;
            return Ok(Payload::Text(text, Some(path)));
        }
        match self.file {
            Some(path) => Ok(Payload::File(path)),
            None => Err(rsasig::Error::Config("no input given".to_string())),
        }
    }
}

fn init_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S%.3f)} [{l}] {t} - {m}{n}")))
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn run(command: Command, config: &Config) -> rsasig::Result<ExitCode> {
    match command {
        Command::Keygen {
            bits,
            out_dir,
            password,
        } => {
            let size = match bits {
                Some(bits) => KeySize::try_from(bits)?,
                None => config.key_size,
            };
            let dir = out_dir.unwrap_or_else(|| config.keys_dir.clone());
            let pair = keys::generate_key_pair(size)?;
            let (private_path, public_path) = keys::default_key_paths(&dir, size);
            keys::save_private_key(&pair.private_key, &private_path, password.as_deref())?;
            keys::save_public_key(&pair.public_key, &public_path)?;
            println!("private key: {}", private_path.display());
            println!("public key:  {}", public_path.display());
            println!("fingerprint: {}", keys::key_fingerprint(&pair.public_key)?);
        }
        Command::Sign {
            key,
            input,
            out,
            creator,
            password,
        } => {
            let private_key = keys::load_private_key(&key, password.as_deref())?;
            let (signature, original) = match input.resolve()? {
                Payload::Text(text, source) => (
                    signing::sign(&private_key, &text)?,
                    source.unwrap_or_else(|| PathBuf::from("text")),
                ),
                Payload::File(path) => {
                    let digest = digest_file_chunked(&path, config.hash_chunk_size)?;
                    (signing::sign(&private_key, digest)?, path)
                }
            };
            save_signature(&signature, &out)?;
            let creator = creator.unwrap_or_else(|| config.creator.clone());
            let record = build_record(&original, &out, &creator);
            let info_path = info_path_for(&out);
            persist_record(&record, &info_path)?;
            println!("signature: {}", out.display());
            println!("record:    {}", info_path.display());
            println!("{}", signature.to_base64());
        }
        Command::Verify {
            public_key,
            input,
            signature,
            signature_base64,
        } => {
            let public_key = keys::load_public_key(&public_key)?;
            let signature = match (signature, signature_base64) {
                (Some(path), _) => load_signature(&path)?,
                (None, Some(encoded)) => Signature::from_base64(&encoded)?,
                (None, None) => return Err(rsasig::Error::Config("no signature given".to_string())),
            };
            let valid = match input.resolve()? {
                Payload::Text(text, _) => signing::verify(&public_key, &text, &signature),
                Payload::File(path) => {
                    let digest = digest_file_chunked(&path, config.hash_chunk_size)?;
                    signing::verify(&public_key, digest, &signature)
                }
            };
            if valid {
                println!("valid: signature matches, data unchanged");
            } else {
                println!("invalid: signature does not match");
                return Ok(ExitCode::from(1));
            }
        }
        Command::Hash { file, expect } => {
            let digest = digest_file_chunked(&file, config.hash_chunk_size)?;
            println!("{}  {}", digest, file.display());
            if let Some(expected) = expect {
                if expected != digest {
                    println!("mismatch: expected {}", expected);
                    return Ok(ExitCode::from(1));
                }
            }
        }
        Command::Info { path } => {
            let record = load_record(&path)?;
            println!("original file:  {}", record.original_artifact_name);
            println!("signature file: {}", record.signature_artifact_name);
            println!("created:        {}", record.created_at);
            if !record.creator.is_empty() {
                println!("creator:        {}", record.creator);
            }
        }
        Command::Fingerprint { public_key } => {
            let public_key = keys::load_public_key(&public_key)?;
            println!("{}", keys::key_fingerprint(&public_key)?);
        }
        Command::Init => {
            for dir in create_default_directories(config)? {
                println!("{}", dir.display());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("warning: logging disabled: {}", e);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            log::debug!("command failed: {:?}", e);
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}
