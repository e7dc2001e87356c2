use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};

use tf_bounce::bounce::{
    BatchOptions, BatchSummary, BounceMode, Transformer, find_module_files, run_batch,
};
use tf_bounce::config::{BounceConfig, DEFAULT_CONFIG_FILE};
use tf_bounce::error::BounceError;
use tf_bounce::logging::{self, LogFormat};
use tf_bounce::repository::RepositoryIdentity;
use tf_bounce::version::cache::CachedRegistry;
use tf_bounce::version::credentials::{CredentialSource, default_credentials};
use tf_bounce::version::registries::TerraformRegistry;
use tf_bounce::version::registry::Registry;

#[derive(Parser)]
#[command(name = "tf-bounce")]
#[command(version, about = "Bounce Terraform module sources between local paths and a registry")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Project root used for discovery, config lookup and repository identity
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// JSON config file (defaults to .tf-bounce.json under the root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Registry namespace publishing this project's modules
    #[arg(long, global = true, env = "TF_BOUNCE_NAMESPACE")]
    namespace: Option<String>,

    /// Registry host (defaults to registry.terraform.io)
    #[arg(long, global = true, env = "TF_BOUNCE_HOST")]
    host: Option<String>,

    /// Terraform Cloud organization for private registries
    #[arg(long, global = true, env = "TF_BOUNCE_ORGANIZATION")]
    organization: Option<String>,

    /// Repository name to use instead of the discovered one
    #[arg(long, global = true)]
    repository_name: Option<String>,

    /// Name of the files scanned during discovery
    #[arg(long, global = true)]
    file_name: Option<String>,

    /// Number of files processed concurrently
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Report what would change without writing files
    #[arg(long, global = true)]
    dry_run: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    log_format: LogFormatArg,
}

#[derive(Subcommand)]
enum Command {
    /// Point this repository's module at the local tree
    Local {
        /// Files to rewrite (discovered under --root when empty)
        files: Vec<PathBuf>,
    },
    /// Point this repository's module at the registry with the latest version
    Registry {
        /// Files to rewrite (discovered under --root when empty)
        files: Vec<PathBuf>,
    },
    /// Refresh the version of every module from the configured namespace
    RegistryAll,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

fn load_config(cli: &Cli) -> Result<BounceConfig, BounceError> {
    let default_path = cli.root.join(DEFAULT_CONFIG_FILE);
    let mut config = match &cli.config {
        Some(path) => BounceConfig::load(path)?,
        None if default_path.is_file() => BounceConfig::load(&default_path)?,
        None => BounceConfig::default(),
    };

    if let Some(namespace) = &cli.namespace {
        config.registry.namespace = namespace.clone();
    }
    if let Some(host) = &cli.host {
        config.registry.host = host.clone();
    }
    if let Some(organization) = &cli.organization {
        config.registry.organization = Some(organization.clone());
    }
    if let Some(file_name) = &cli.file_name {
        config.file_name = file_name.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }

    config.validate()?;
    Ok(config)
}

fn repository_identity(cli: &Cli) -> Result<RepositoryIdentity, BounceError> {
    match &cli.repository_name {
        Some(name) => RepositoryIdentity::from_name(name),
        None => RepositoryIdentity::discover(&cli.root),
    }
}

fn build_registry(config: &BounceConfig) -> Result<Arc<dyn Registry>, BounceError> {
    let credentials: Arc<dyn CredentialSource> = Arc::new(default_credentials());
    let registry = TerraformRegistry::from_config(&config.registry, credentials)?;
    Ok(Arc::new(CachedRegistry::new(registry)))
}

fn print_summary(summary: &BatchSummary, dry_run: bool) {
    let verb = if dry_run { "Would update" } else { "Updated" };
    for path in &summary.changed {
        println!("{} {}", verb, path.display());
    }
    for (path, message) in &summary.failed {
        println!("Failed {}: {}", path.display(), message);
    }

    let not_found: Vec<_> = summary.not_found().collect();
    if !not_found.is_empty() {
        println!("Not published, left unchanged:");
        for (path, entry) in not_found {
            println!(
                "  {}:{} module \"{}\" ({})",
                path.display(),
                entry.line,
                entry.name,
                entry.target
            );
        }
    }

    let errors: Vec<_> = summary.errors().collect();
    if !errors.is_empty() {
        println!("Unresolved, left unchanged:");
        for (path, entry) in errors {
            println!(
                "  {}:{} module \"{}\" ({}): {}",
                path.display(),
                entry.line,
                entry.name,
                entry.target,
                entry.reason
            );
        }
    }

    println!(
        "{} changed, {} unchanged, {} failed",
        summary.changed.len(),
        summary.unchanged.len(),
        summary.failed.len()
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_file.as_deref(), cli.log_format.into())?;

    let config = load_config(&cli)?;

    let (mode, files) = match &cli.command {
        Command::Local { files } => (
            BounceMode::to_local(&repository_identity(&cli)?, &config.registry),
            files.clone(),
        ),
        Command::Registry { files } => (
            BounceMode::to_registry(&repository_identity(&cli)?, &config.registry),
            files.clone(),
        ),
        Command::RegistryAll => (BounceMode::to_registry_all(&config.registry), Vec::new()),
    };

    let paths = if files.is_empty() {
        find_module_files(&cli.root, &config.file_name)
    } else {
        files
    };
    if paths.is_empty() {
        println!("No {} files found under {}", config.file_name, cli.root.display());
        return Ok(());
    }

    // The blocking client must be created and dropped outside the async runtime
    let registry = build_registry(&config)?;
    let transformer = Arc::new(Transformer::new(Arc::clone(&registry)));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(run_batch(
        transformer,
        Arc::new(mode),
        paths,
        BatchOptions {
            concurrency: config.concurrency,
            dry_run: cli.dry_run,
        },
    ));
    drop(runtime);

    print_summary(&summary, cli.dry_run);

    if summary.has_failures() {
        bail!("{} file(s) failed", summary.failed.len());
    }
    Ok(())
}
