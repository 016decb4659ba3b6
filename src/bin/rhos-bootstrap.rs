//! `rhos-bootstrap` - prepare a host's repositories and module streams for an
//! OpenStack release.
//!
//! Steps, each of which can be skipped:
//!
//! 1. validate the release against the host distribution
//! 2. write or enable the release's repositories
//! 3. enable the release's dnf module streams
//! 4. optionally update every package
//! 5. install or update the client package

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use serde::Serialize;
use tracing::{error, info, warn};

use rhos_bootstrap::catalog::CatalogSearchPath;
use rhos_bootstrap::dnf::{DnfCli, DnfModule, ModuleManager, PackageBackend};
use rhos_bootstrap::logging;
use rhos_bootstrap::repos::{RepoPlanEntry, ReqwestFetcher};
use rhos_bootstrap::{
    BootstrapConfig, BootstrapError, DistributionIdentity, Entitlements, Resolver,
    SubscriptionManager,
};

/// Exit status for runs that need root.
const EXIT_NOT_ROOT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "rhos-bootstrap",
    about = "Perform basic bootstrap related functions when installing, updating, or \
             upgrading OpenStack on Red Hat based systems. This tool can manage RPM \
             repository and dnf module configurations. This tool can also be used to \
             install tripleoclient and perform repository validations for the target version",
    version
)]
struct Cli {
    /// The target OpenStack version to configure this system to use when fetching packages
    #[arg(id = "release", value_name = "VERSION")]
    version: String,

    /// Skip version validation
    #[arg(long)]
    skip_validation: bool,

    /// Skip repository configuration related actions
    #[arg(long)]
    skip_repos: bool,

    /// Skip ceph related configuration actions
    #[arg(long)]
    skip_ceph_install: bool,

    /// Skip module configuration related actions
    #[arg(long)]
    skip_modules: bool,

    /// Perform a system update after configuring the system repositories and modules
    #[arg(long)]
    update_packages: bool,

    /// Skip tripleoclient installation
    #[arg(long)]
    skip_client_install: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Disable the daily log file under /var/log (rhos-bootstrap.<date>.log)
    #[arg(long)]
    skip_log_file: bool,

    /// Tool configuration file (default: /etc/rhos-bootstrap/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory repo files are written to
    #[arg(long)]
    repo_dir: Option<PathBuf>,

    /// Override the distribution ID from /etc/os-release
    #[arg(long)]
    distro_id: Option<String>,

    /// Override the distribution VERSION_ID from /etc/os-release
    #[arg(long)]
    distro_version_id: Option<String>,

    /// Override the distribution NAME from /etc/os-release
    #[arg(long)]
    distro_name: Option<String>,

    /// Resolve everything and print the plan as JSON without changing the host
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn needs_package_manager(&self) -> bool {
        !(self.skip_modules && !self.update_packages && self.skip_client_install)
    }
}

/// What a run would do, printed by `--dry-run`.
#[derive(Debug, Serialize)]
struct Plan<'a> {
    version: &'a str,
    distribution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    supported: Option<bool>,
    disable_entitlement_repos: bool,
    repo_dir: &'a Path,
    repos: Vec<RepoPlanEntry>,
    modules: Vec<DnfModule>,
    update_packages: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_package: Option<&'a str>,
}

fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = (!cli.skip_log_file).then(logging::default_log_file);
    let _guard = match logging::init_logging(cli.debug, log_file.as_deref()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("unable to log to {}: {e}", logging::DEFAULT_LOG_FILE);
            logging::init_logging(cli.debug, None).ok()
        }
    };

    if !cli.dry_run && !running_as_root() {
        error!("You must be root to run this command");
        let _ = Cli::command().print_help();
        return ExitCode::from(EXIT_NOT_ROOT);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let needs_root = e.chain().any(|cause| {
                matches!(
                    cause.downcast_ref::<BootstrapError>(),
                    Some(BootstrapError::MustRunAsRoot { .. })
                )
            });
            if needs_root {
                ExitCode::from(EXIT_NOT_ROOT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = BootstrapConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let repo_dir = cli.repo_dir.clone().unwrap_or_else(|| config.repo_dir.clone());

    let identity = DistributionIdentity::detect(
        cli.distro_id.as_deref(),
        cli.distro_version_id.as_deref(),
        cli.distro_name.as_deref(),
    )
    .context("detecting host distribution")?;
    let catalog = CatalogSearchPath::system(&config.data_dirs)
        .load(&identity.id)
        .with_context(|| format!("loading version catalog for {}", identity.id))?;
    let resolver = Resolver::new(identity, catalog, &config);
    let entitlements = SubscriptionManager::new();

    info!("{}", "=".repeat(40));
    info!("=== OpenStack Version: {}", cli.version);
    info!("=== Distribution: {}", resolver.normalized_id());
    info!("{}", "=".repeat(40));

    if cli.dry_run {
        return print_plan(cli, &resolver, &entitlements, &repo_dir, &config);
    }

    if !cli.skip_validation {
        info!("=== Validating version for distro...");
        validate(cli, &resolver, &entitlements)?;
        info!("OK! {} on {}", cli.version, resolver.normalized_id());
    } else {
        info!("=== Skipping validation of version for distro...");
    }

    if !cli.skip_repos {
        configure_repos(cli, &resolver, &entitlements, &repo_dir)?;
    } else {
        info!("=== Skipping repository configuration...");
    }

    if !cli.needs_package_manager() {
        info!("=== Skipping dnf configuration...");
        info!("=== Skipping module configuration...");
        info!("=== Skipping tripleoclient installation...");
        info!("=== Done!");
        return Ok(());
    }

    info!("=== Configuring dnf...");
    let backend = DnfCli::new().context("locating dnf")?;
    let mut manager = ModuleManager::new(backend).context("reading module state")?;
    configure_packages(cli, &resolver, &mut manager, &config.client_package)?;

    info!("=== Done!");
    Ok(())
}

fn validate(cli: &Cli, resolver: &Resolver, entitlements: &dyn Entitlements) -> Result<()> {
    if !resolver.validate(&cli.version, entitlements)? {
        return Err(BootstrapError::DistroNotSupported {
            distro: resolver.normalized_id(),
        }
        .into());
    }
    Ok(())
}

fn configure_repos(
    cli: &Cli,
    resolver: &Resolver,
    entitlements: &dyn Entitlements,
    repo_dir: &Path,
) -> Result<()> {
    let fetcher = ReqwestFetcher::new()?;
    let repos = resolver
        .expand_repos(&cli.version, !cli.skip_ceph_install, &fetcher)
        .with_context(|| format!("resolving repositories for {}", cli.version))?;
    info!("=== Configuring repositories...");

    if resolver.identity().is_entitlement_managed() {
        info!("Disabling all existing configured repositories...");
        entitlements.repos(&[], &["*".to_string()])?;
    }

    for repo in &repos {
        info!("Configuring {}", repo.name());
        repo.materialize(repo_dir, entitlements)
            .with_context(|| format!("configuring repository {}", repo.name()))?;
    }
    Ok(())
}

fn configure_packages<B: PackageBackend>(
    cli: &Cli,
    resolver: &Resolver,
    manager: &mut ModuleManager<B>,
    client_package: &str,
) -> Result<()> {
    if !cli.skip_modules {
        let modules = resolver.modules(&cli.version)?;
        info!("=== Configuring modules...");
        for module in &modules {
            info!("Enabling {}:{}", module.name, module.stream);
            manager
                .enable_module(module)
                .with_context(|| format!("enabling module {module}"))?;
        }
    } else {
        info!("=== Skipping module configuration...");
    }

    if cli.update_packages {
        info!("=== Performing update...");
        manager.update_package("*").context("updating packages")?;
        info!("NOTE: A manual reboot may be required");
    }

    if !cli.skip_client_install {
        info!("=== Installing {}...", client_package);
        manager
            .install_update_package(client_package)
            .with_context(|| format!("installing {client_package}"))?;
    } else {
        info!("=== Skipping tripleoclient installation...");
    }
    Ok(())
}

fn print_plan(
    cli: &Cli,
    resolver: &Resolver,
    entitlements: &dyn Entitlements,
    repo_dir: &Path,
    config: &BootstrapConfig,
) -> Result<()> {
    let supported = if cli.skip_validation {
        None
    } else {
        Some(resolver.validate(&cli.version, entitlements)?)
    };
    if supported == Some(false) {
        warn!("{} is not supported on {}", cli.version, resolver.normalized_id());
    }

    let repos = if cli.skip_repos {
        Vec::new()
    } else {
        let fetcher = ReqwestFetcher::new()?;
        resolver
            .expand_repos(&cli.version, !cli.skip_ceph_install, &fetcher)?
            .iter()
            .map(|repo| repo.plan_entry(repo_dir))
            .collect()
    };

    let modules = if cli.skip_modules {
        Vec::new()
    } else {
        resolver.modules(&cli.version)?
    };

    let plan = Plan {
        version: &cli.version,
        distribution: resolver.normalized_id(),
        supported,
        disable_entitlement_repos: !cli.skip_repos
            && resolver.identity().is_entitlement_managed(),
        repo_dir,
        repos,
        modules,
        update_packages: cli.update_packages,
        client_package: (!cli.skip_client_install).then_some(config.client_package.as_str()),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&plan).context("serializing plan")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "rhos-bootstrap",
            "wallaby",
            "--skip-ceph-install",
            "--skip-log-file",
            "--distro-id",
            "centos",
            "--repo-dir",
            "/tmp/repos",
        ]);
        assert_eq!(cli.version, "wallaby");
        assert!(cli.skip_ceph_install);
        assert!(cli.skip_log_file);
        assert!(!cli.skip_repos);
        assert_eq!(cli.distro_id.as_deref(), Some("centos"));
        assert_eq!(cli.repo_dir, Some(PathBuf::from("/tmp/repos")));
    }

    #[test]
    fn test_version_is_required() {
        assert!(Cli::try_parse_from(["rhos-bootstrap"]).is_err());
    }

    #[test]
    fn test_needs_package_manager() {
        let base = ["rhos-bootstrap", "master"];
        let cli = Cli::parse_from(base);
        assert!(cli.needs_package_manager());

        let cli = Cli::parse_from(
            base.iter()
                .copied()
                .chain(["--skip-modules", "--skip-client-install"]),
        );
        assert!(!cli.needs_package_manager());

        let cli = Cli::parse_from(base.iter().copied().chain([
            "--skip-modules",
            "--skip-client-install",
            "--update-packages",
        ]));
        assert!(cli.needs_package_manager());
    }

    #[test]
    fn test_version_flag_and_positional() {
        let err = Cli::try_parse_from(["rhos-bootstrap", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);

        let cli = Cli::try_parse_from(["rhos-bootstrap", "train"]).unwrap();
        assert_eq!(cli.version, "train");
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
