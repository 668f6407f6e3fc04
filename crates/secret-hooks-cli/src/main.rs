//! secret-hooks CLI — `shk` command.
//!
//! Drives the rotation handler and identity triggers against a local
//! file-backed store: create and inspect secrets, run rotation steps, and
//! replay trigger events.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use secret_hooks::{
    FileRecordStore, FileSecretStore, HooksConfig, IdentityTriggers, RotationEvent,
    RotationHandler, SecretId, SecretStore, SecretValue, StageLabel, StepKind, TriggerEvent,
    TriggerKind,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn secrets_dir(root: &Path) -> PathBuf {
    root.join("secrets")
}

fn records_dir(root: &Path) -> PathBuf {
    root.join("records")
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// secret-hooks CLI — rotate credentials and replay identity triggers.
#[derive(Parser, Debug)]
#[command(
    name = "shk",
    about = "secret-hooks CLI",
    version,
    long_about = "shk — secret-hooks CLI\n\nCreate and inspect versioned secrets, run the four-step rotation\nprotocol, and replay identity-directory trigger events."
)]
struct Cli {
    /// Store directory (overrides config and SECRET_HOOKS_DIR)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// JSON config file (default: environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage stored secrets
    Secret {
        #[command(subcommand)]
        subcommand: SecretCommands,
    },

    /// Run one rotation step and print the JSON response
    Rotate {
        /// Secret identifier
        #[arg(long)]
        id: String,

        /// createSecret, setSecret, testSecret or finishSecret
        #[arg(long, default_value = "createSecret")]
        step: String,
    },

    /// Run all four rotation steps in order, stopping at the first failure
    RotateAll {
        /// Secret identifier
        #[arg(long)]
        id: String,
    },

    /// Run an identity trigger over a JSON event and print the result
    Trigger {
        /// pre-signup, post-confirmation, pre-authentication,
        /// post-authentication or custom-message (default: from triggerSource)
        #[arg(long)]
        kind: Option<String>,

        /// Event file, or `-` for stdin
        #[arg(long)]
        event: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum SecretCommands {
    /// Create a secret whose first version is current
    Create {
        /// Secret identifier
        #[arg(long)]
        id: String,

        /// Value as a JSON object of string fields
        #[arg(long)]
        value: String,
    },

    /// Show one version of a secret
    Show {
        /// Secret identifier
        #[arg(long)]
        id: String,

        /// Stage label to show (default: AWSCURRENT)
        #[arg(long)]
        stage: Option<String>,

        /// Print field values instead of masking them
        #[arg(long)]
        reveal: bool,
    },

    /// Show which version holds each stage label
    Labels {
        /// Secret identifier
        #[arg(long)]
        id: String,
    },

    /// List all secrets in the store
    List,
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = load_config(cli.config.as_deref(), cli.store).and_then(|config| {
        match cli.command {
            Commands::Secret { subcommand } => match subcommand {
                SecretCommands::Create { id, value } => {
                    cmd_secret_create(&config, &id, &value, verbose)
                }
                SecretCommands::Show { id, stage, reveal } => {
                    cmd_secret_show(&config, &id, stage.as_deref(), reveal, verbose)
                }
                SecretCommands::Labels { id } => cmd_secret_labels(&config, &id, verbose),
                SecretCommands::List => cmd_secret_list(&config, verbose),
            },
            Commands::Rotate { id, step } => cmd_rotate(&config, &id, &step, verbose),
            Commands::RotateAll { id } => cmd_rotate_all(&config, &id, verbose),
            Commands::Trigger { kind, event } => {
                cmd_trigger(&config, kind.as_deref(), &event, verbose)
            }
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Shared setup ──────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>, store: Option<PathBuf>) -> Result<HooksConfig> {
    let mut config = HooksConfig::load(path).context("failed to load configuration")?;
    if store.is_some() {
        config.store_dir = store;
    }
    log::debug!(
        "project={} environment={} store={}",
        config.project_name,
        config.environment,
        config.store_dir().display()
    );
    Ok(config)
}

fn open_store(config: &HooksConfig) -> Result<FileSecretStore> {
    let dir = secrets_dir(&config.store_dir());
    FileSecretStore::new(&dir)
        .with_context(|| format!("failed to open secret store at {}", dir.display()))
}

fn rotation_handler(config: &HooksConfig) -> Result<RotationHandler<FileSecretStore>> {
    let policy = config.policy().context("invalid secret type policy")?;
    Ok(RotationHandler::new(open_store(config)?, policy).with_options(config.rotation_options()))
}

// ── Command implementations ───────────────────────────────────────────────────

fn cmd_secret_create(config: &HooksConfig, id: &str, value: &str, verbose: bool) -> Result<()> {
    let store = open_store(config)?;
    let value = SecretValue::from_json_str(value).context("--value must be a JSON object")?;
    let fingerprint = value.fingerprint();

    let secret_id = SecretId::new(id);
    let version_id = store.create_secret(&secret_id, value)?;

    println!("Created secret {secret_id}");
    println!("  Version:     {version_id} ({})", StageLabel::Current);
    println!("  Fingerprint: {fingerprint}");
    if verbose {
        println!("  Store:       {}", store.base_dir().display());
    }
    Ok(())
}

fn cmd_secret_show(
    config: &HooksConfig,
    id: &str,
    stage: Option<&str>,
    reveal: bool,
    verbose: bool,
) -> Result<()> {
    let store = open_store(config)?;
    let stage = stage.map(str::parse::<StageLabel>).transpose()?;
    let version = store.get_version(&SecretId::new(id), stage)?;

    let labels: Vec<&str> = version.labels.iter().map(StageLabel::as_str).collect();
    println!("Secret:      {id}");
    println!("Version:     {}", version.version_id);
    println!("Labels:      {}", labels.join(", "));
    println!("Created:     {}", secret_hooks::time::micros_to_rfc3339(version.created_at));
    println!("Fingerprint: {}", version.value.fingerprint());
    println!("Fields:");
    for field in version.value.fields() {
        let shown = match version.value.get(field) {
            Some(v) if reveal => v,
            _ => "********",
        };
        println!("  {field}: {shown}");
    }
    if verbose {
        println!("Store:       {}", store.base_dir().display());
    }
    Ok(())
}

fn cmd_secret_labels(config: &HooksConfig, id: &str, verbose: bool) -> Result<()> {
    let store = open_store(config)?;
    let secret_id = SecretId::new(id);
    let labels = store.describe_labels(&secret_id)?;

    for label in StageLabel::ALL {
        match labels.get(&label) {
            Some(version) => println!("{:<12} {version}", label.as_str()),
            None => println!("{:<12} -", label.as_str()),
        }
    }

    if verbose {
        let versions = store.list_versions(&secret_id)?;
        println!();
        println!("{} version(s):", versions.len());
        for v in versions {
            println!("  {}  {}", v.version_id, secret_hooks::time::micros_to_rfc3339(v.created_at));
        }
    }
    Ok(())
}

fn cmd_secret_list(config: &HooksConfig, verbose: bool) -> Result<()> {
    let store = open_store(config)?;
    let ids = store.list_secrets()?;

    if ids.is_empty() {
        println!("No secrets found in {}", store.base_dir().display());
        return Ok(());
    }
    for id in ids {
        if verbose {
            let count = store.list_versions(&id)?.len();
            println!("{id}  ({count} version(s))");
        } else {
            println!("{id}");
        }
    }
    Ok(())
}

fn cmd_rotate(config: &HooksConfig, id: &str, step: &str, verbose: bool) -> Result<()> {
    let handler = rotation_handler(config)?;
    let event = RotationEvent {
        secret_id: id.to_string(),
        step: step.to_string(),
    };

    let response = handler.handle(&event);
    println!("{}", serde_json::to_string_pretty(&response)?);
    if verbose {
        eprintln!("status: {}", response.status_code());
    }

    match response.error {
        Some(error) => Err(anyhow!("{step} failed: {}", error.message)),
        None => Ok(()),
    }
}

fn cmd_rotate_all(config: &HooksConfig, id: &str, verbose: bool) -> Result<()> {
    let handler = rotation_handler(config)?;
    let secret_id = SecretId::new(id);

    for step in StepKind::CYCLE {
        let outcome = handler
            .execute_step(&secret_id, step)
            .with_context(|| format!("{step} failed for {secret_id}"))?;
        println!("{step}: {outcome}");
    }

    if verbose {
        println!();
        for (label, version) in handler.store().describe_labels(&secret_id)? {
            println!("{:<12} {version}", label.as_str());
        }
    }
    Ok(())
}

fn cmd_trigger(config: &HooksConfig, kind: Option<&str>, path: &Path, verbose: bool) -> Result<()> {
    let json = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event file {}", path.display()))?
    };
    let event = TriggerEvent::from_json_str(&json)?;

    let kind = match kind {
        Some(kind) => kind.parse::<TriggerKind>()?,
        None => TriggerKind::from_trigger_source(&event.trigger_source).ok_or_else(|| {
            anyhow!(
                "cannot infer trigger kind from source {:?}; pass --kind",
                event.trigger_source
            )
        })?,
    };

    let dir = records_dir(&config.store_dir());
    let records = FileRecordStore::new(&dir)
        .with_context(|| format!("failed to open record store at {}", dir.display()))?;
    let triggers = IdentityTriggers::new(records, config.trigger_context());

    if verbose {
        eprintln!("Running {kind} trigger for user {}", event.user_name);
    }

    match triggers.dispatch(kind, event) {
        Ok(event) => {
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        Err(e) => bail!("{kind} rejected the event: {e}"),
    }
}
