use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::credentials::Supplied;

#[derive(Parser)]
#[command(name = "sprinter")]
#[command(version)]
#[command(about = "Install, update and remove development environments from manifests", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install a new environment from a manifest path or URL
    Install(InstallArgs),

    /// Bring an installed environment up to date with its manifest
    Update(UpdateArgs),

    /// Remove an environment and everything it installed
    Remove {
        /// Environment namespace
        namespace: String,
    },

    /// Hook an environment into your shell
    Activate {
        /// Environment namespace
        namespace: String,
    },

    /// Unhook an environment from your shell
    Deactivate {
        /// Environment namespace
        namespace: String,
    },

    /// Check a manifest without installing anything
    Validate(ValidateArgs),

    /// List installed environments
    Environments {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared Arguments
// ============================================================================

#[derive(Args, Clone, Default)]
pub struct CredentialArgs {
    /// Username for a protected manifest URL
    #[arg(long)]
    pub username: Option<String>,

    /// Password for a protected manifest URL (prompted for when omitted)
    #[arg(long, env = "SPRINTER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Prompt for credentials
    #[arg(long)]
    pub auth: bool,
}

impl CredentialArgs {
    pub fn supplied(&self) -> Supplied {
        Supplied {
            username: self.username.clone(),
            password: self.password.clone(),
            auth: self.auth,
        }
    }
}

#[derive(Args, Clone, Default)]
pub struct FetchArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Skip TLS certificate verification for the manifest URL
    #[arg(long)]
    pub allow_bad_certificate: bool,
}

// ============================================================================
// Install / Update / Validate
// ============================================================================

#[derive(Args)]
pub struct InstallArgs {
    /// Manifest path or URL
    pub target: String,

    /// Namespace to install under (defaults to the manifest's own)
    #[arg(short, long)]
    pub namespace: Option<String>,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Environment namespace
    pub namespace: String,

    /// Re-run the update step of every feature, even unchanged ones
    #[arg(short, long)]
    pub reconfigure: bool,

    /// Manifest path or URL to update to (defaults to the recorded source)
    #[arg(short, long)]
    pub target: Option<String>,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Manifest path or URL
    pub target: String,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_flags() {
        let cli = Cli::parse_from([
            "sprinter",
            "install",
            "https://example.com/tools.cfg",
            "--namespace",
            "tools",
            "--username",
            "me",
            "--allow-bad-certificate",
        ]);
        let Command::Install(args) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(args.target, "https://example.com/tools.cfg");
        assert_eq!(args.namespace.as_deref(), Some("tools"));
        assert_eq!(args.fetch.credentials.username.as_deref(), Some("me"));
        assert!(args.fetch.allow_bad_certificate);
        assert!(args.fetch.credentials.supplied().wanted());
    }

    #[test]
    fn test_update_defaults() {
        let cli = Cli::parse_from(["sprinter", "-vv", "update", "tools"]);
        assert_eq!(cli.verbose, 2);
        let Command::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.namespace, "tools");
        assert!(!args.reconfigure);
        assert!(args.target.is_none());
        assert!(!args.fetch.credentials.auth);
    }
}
