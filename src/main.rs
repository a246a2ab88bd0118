use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use forgehand::config::Config;
use forgehand::otp::TotpGenerator;
use forgehand::{Api, OrganizationUsage, SecurityFeature, Session};

#[derive(Parser)]
#[command(name = "forgehand")]
#[command(about = "Drive GitHub's HTML forms for admin actions the REST API lacks")]
struct Cli {
    /// Path to the credentials file (defaults to the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an organization on the free plan
    CreateOrg {
        /// Organization login (also used as the profile name)
        org: String,

        /// Billing contact email
        #[arg(long)]
        billing_email: String,

        /// Company name; presence marks the organization as business usage
        #[arg(long)]
        company: Option<String>,
    },

    /// Install a GitHub App on an account or organization
    InstallApp {
        /// App slug as it appears under /apps/
        app: String,

        /// Numeric id of the target user or organization
        #[arg(long)]
        target_id: u64,
    },

    /// Suspend an app installation in an organization
    SuspendInstall { org: String, installation_id: u64 },

    /// Lift a suspension on an app installation
    UnsuspendInstall { org: String, installation_id: u64 },

    /// Approve an app's updated permission request
    ApprovePermissions { org: String, installation_id: u64 },

    /// Request generation of an enterprise metered-usage report
    RequestReport {
        enterprise: String,

        /// Number of days the report should cover
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Download a previously requested usage report to stdout
    DownloadReport { enterprise: String, report_id: String },

    /// Enable or disable a security-analysis feature for an organization
    SecurityAnalysis {
        org: String,
        feature: FeatureArg,
        state: ToggleArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FeatureArg {
    DependencyGraph,
    DependabotAlerts,
    DependabotSecurityUpdates,
    SecretScanning,
    SecretScanningPushProtection,
}

impl From<FeatureArg> for SecurityFeature {
    fn from(arg: FeatureArg) -> Self {
        match arg {
            FeatureArg::DependencyGraph => SecurityFeature::DependencyGraph,
            FeatureArg::DependabotAlerts => SecurityFeature::DependabotAlerts,
            FeatureArg::DependabotSecurityUpdates => SecurityFeature::DependabotSecurityUpdates,
            FeatureArg::SecretScanning => SecurityFeature::SecretScanning,
            FeatureArg::SecretScanningPushProtection => {
                SecurityFeature::SecretScanningPushProtection
            }
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ToggleArg {
    Enabled,
    Disabled,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(Config::default_path)
        .context("No credentials file; pass --config")?;
    let config = Config::load(&config_path)?;
    let otp = TotpGenerator::from_base32(&config.otp_seed)?;

    let session = Session::new()?;
    let api = Api::login(session, &config.username, &config.password, || {
        otp.generate().map_err(Into::into)
    })
    .await?;

    match cli.command {
        Command::CreateOrg {
            org,
            billing_email,
            company,
        } => {
            let usage = match company {
                Some(company_name) => OrganizationUsage::Business { company_name },
                None => OrganizationUsage::Personal,
            };
            api.create_organization(&org, &billing_email, &usage).await?;
            println!("Created organization {org}");
        }
        Command::InstallApp { app, target_id } => {
            api.install_application(&app, target_id).await?;
            println!("Installed {app} on target {target_id}");
        }
        Command::SuspendInstall {
            org,
            installation_id,
        } => {
            api.suspend_installation(&org, installation_id).await?;
            println!("Suspended installation {installation_id} in {org}");
        }
        Command::UnsuspendInstall {
            org,
            installation_id,
        } => {
            api.unsuspend_installation(&org, installation_id).await?;
            println!("Unsuspended installation {installation_id} in {org}");
        }
        Command::ApprovePermissions {
            org,
            installation_id,
        } => {
            api.approve_updated_permissions(&org, installation_id).await?;
            println!("Approved updated permissions for installation {installation_id} in {org}");
        }
        Command::RequestReport { enterprise, days } => {
            api.request_usage_report(&enterprise, days).await?;
            println!("Requested {days}-day usage report for {enterprise}");
        }
        Command::DownloadReport {
            enterprise,
            report_id,
        } => {
            let body = api.download_usage_report(&enterprise, &report_id).await?;
            print!("{body}");
        }
        Command::SecurityAnalysis {
            org,
            feature,
            state,
        } => {
            let enabled = matches!(state, ToggleArg::Enabled);
            api.set_security_analysis(&org, feature.into(), enabled).await?;
            println!(
                "{} {:?} for {org}",
                if enabled { "Enabled" } else { "Disabled" },
                SecurityFeature::from(feature)
            );
        }
    }

    Ok(())
}
