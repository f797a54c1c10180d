//! UnionPay gateway command-line tool
//!
//! Offline helpers around the signing, verification and field-protection
//! core: canonical encodings, PIN blocks, signing and authenticating form
//! bodies, and decrypting gateway-encrypted values.

use clap::{Parser, Subcommand};
use miette::{miette, Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use unionpay_gateway::{
    canonicalize, ConfigManager, GatewayConfig, MerchantKey, ParameterSet, PinBlock,
    RequestSigner, SensitiveFieldCipher, TrustStore,
};

#[derive(Parser)]
#[command(name = "unionpay-gateway")]
#[command(about = "Signing, verification and field protection for the UnionPay gateway")]
#[command(long_about = "
UnionPay gateway tool - offline signing and verification helpers

EXAMPLES:
    # Show the ISO 9564 format-0 PIN block for a card
    unionpay-gateway pin-block --pan 6222021234567890123 --pin 123456

    # Sign a form-encoded request body with the configured merchant key
    unionpay-gateway sign request.txt

    # Authenticate a notification body against the configured anchors
    unionpay-gateway verify notify.txt

ENVIRONMENT VARIABLES:
    UNIONPAY_PFX_PASSWORD   Merchant PKCS#12 password (sign, verify, decrypt)
    RUST_LOG                Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the encrypted-PIN block input as hex
    PinBlock {
        /// Primary account number
        #[arg(long)]
        pan: String,

        /// Cardholder PIN (4 to 12 digits)
        #[arg(long)]
        pin: String,
    },

    /// Print the canonical encoding of a form-encoded body
    Canonicalize {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Add identity fields and a signature to a form-encoded request body
    Sign {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Authenticate a form-encoded gateway notification
    Verify {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Decrypt a base64 value encrypted to the merchant certificate
    Decrypt {
        #[arg(value_name = "CIPHERTEXT")]
        ciphertext: String,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new().into_diagnostic()?,
    };

    match cli.command {
        Commands::PinBlock { pan, pin } => {
            let block = PinBlock::build(&pan, &pin)?;
            println!("{}", block.to_hex());
        }

        Commands::Canonicalize { file } => {
            let params = read_form_file(&file)?;
            println!("{}", canonicalize(&params));
        }

        Commands::Sign { file } => {
            let params = read_form_file(&file)?;
            let signer = load_signer(&config_manager)?;
            let signed = signer.finalize(params)?;
            println!(
                "{}",
                unionpay_gateway::adapters::gateway_http_client::encode_form(
                    &signed.to_form_pairs()
                )
            );
        }

        Commands::Verify { file } => {
            let body = std::fs::read_to_string(&file)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
            let signer = load_signer(&config_manager)?;
            let params = signer.verify_notification(body.trim())?;
            println!("✅ Notification authentic ({} fields)", params.len());
        }

        Commands::Decrypt { ciphertext } => {
            let config = config_manager.load().into_diagnostic()?;
            let cipher = SensitiveFieldCipher::new(load_merchant(&config)?);
            println!("{}", cipher.decrypt(&ciphertext)?);
        }

        Commands::Config(config_cmd) => handle_config_command(&config_manager, config_cmd)?,
    }

    Ok(())
}

fn read_form_file(path: &Path) -> Result<ParameterSet> {
    let body = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    Ok(ParameterSet::from_form_body(body.trim()))
}

fn load_merchant(config: &GatewayConfig) -> Result<Arc<MerchantKey>> {
    let pfx = config
        .credentials
        .signing_pfx
        .as_ref()
        .ok_or_else(|| miette!("credentials.signing_pfx is not set in the configuration"))?;
    let password = GatewayConfig::pfx_password_from_env()?;
    Ok(Arc::new(MerchantKey::from_pkcs12_file(pfx, &password)?))
}

fn load_signer(config_manager: &ConfigManager) -> Result<RequestSigner> {
    let config = config_manager.load().into_diagnostic()?;
    let merchant = load_merchant(&config)?;

    let mut trust = TrustStore::new();
    if let Some(root) = &config.credentials.root_cert {
        trust.load_root_from_file(root)?;
    }
    if let Some(intermediate) = &config.credentials.intermediate_cert {
        trust.load_intermediate_from_file(intermediate)?;
    }
    Ok(RequestSigner::new(config, merchant, trust)?)
}

fn handle_config_command(config_manager: &ConfigManager, config_cmd: ConfigCommands) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show => match config_manager.load() {
            Ok(config) => {
                println!("📋 Current Configuration:");
                println!("  Environment: {:?}", config.environment);
                println!("  Gateway host: {}", config.host());
                println!("  Merchant id: {}", config.merchant_id);
                println!("  Version: {}", config.version);
                println!("  Sign method: {}", config.sign_method);
                println!("  Timeout: {}s", config.network_timeout_seconds);
                print_path("Signing container", config.credentials.signing_pfx.as_deref());
                print_path("Root certificate", config.credentials.root_cert.as_deref());
                print_path(
                    "Intermediate certificate",
                    config.credentials.intermediate_cert.as_deref(),
                );
                print_path(
                    "Encryption certificate",
                    config.credentials.encryption_cert.as_deref(),
                );
                println!(
                    "  Configuration file: {}",
                    config_manager.config_path().display()
                );
            }
            Err(e) => {
                println!("📋 No usable configuration ({e}). Use 'config init' to create one.");
            }
        },

        ConfigCommands::Init => {
            config_manager.load_or_create_default().into_diagnostic()?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
            println!("   Set merchant_id and the credential paths before signing.");
        }
    }
    Ok(())
}

fn print_path(label: &str, path: Option<&Path>) {
    match path {
        Some(path) => println!("  {label}: {}", path.display()),
        None => println!("  {label}: (not set)"),
    }
}
