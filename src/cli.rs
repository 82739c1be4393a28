//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use jd_mobile_core::config::schema::DEFAULT_TIMEOUT_MS;
use jd_mobile_core::provider::DEFAULT_PACKAGE_NAME;
use jd_mobile_core::setup::DEFAULT_INSTANCE_NAME;

/// Control a local JDownloader instance from a small screen.
///
/// Results are printed as JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "jd-mobile")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (overrides JD_MOBILE_CONFIG_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Test a downloader endpoint and save it as the primary instance
    Setup(SetupArgs),
    /// Probe the active instance and report health
    Health,
    /// List packages in the download list
    Packages,
    /// Send links to the LinkGrabber
    Add(AddArgs),
    /// Manage links waiting in the LinkGrabber
    Linkgrabber {
        #[command(subcommand)]
        command: LinkgrabberCommand,
    },
    /// Remove a package from the download list
    Remove(RemoveArgs),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the reconciled config and its diagnostics
    Show,
    /// Exit non-zero unless the config is complete and valid
    Validate,
}

#[derive(ClapArgs, Debug)]
pub struct SetupArgs {
    /// Base URL of the downloader's local API, e.g. http://192.168.1.5:3128
    #[arg(long)]
    pub base_url: String,

    /// Per-call timeout in milliseconds (100-60000)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS.unsigned_abs(), value_parser = clap::value_parser!(u64).range(100..=60000))]
    pub timeout_ms: u64,

    /// Display name of the instance
    #[arg(long, default_value = DEFAULT_INSTANCE_NAME)]
    pub name: String,
}

#[derive(ClapArgs, Debug)]
pub struct AddArgs {
    /// Links to add, separated by whitespace or newlines
    #[arg(long, required = true)]
    pub links: String,

    /// Package to add the links to
    #[arg(long, default_value = DEFAULT_PACKAGE_NAME)]
    pub package: String,

    /// Destination folder on the downloader host
    #[arg(long)]
    pub dest: Option<String>,

    /// Start downloading immediately
    #[arg(long)]
    pub autostart: bool,

    /// Keep links in the LinkGrabber so files can be picked (disables --autostart)
    #[arg(long)]
    pub select_files: bool,
}

#[derive(Subcommand, Debug)]
pub enum LinkgrabberCommand {
    /// List links waiting in the LinkGrabber
    List,
    /// Start the selected links and discard the other displayed ones
    Start {
        /// Link ids to download
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,

        /// Ids shown to the user (comma separated); defaults to every link in the LinkGrabber
        #[arg(long, value_delimiter = ',')]
        displayed: Option<Vec<i64>>,
    },
    /// Discard links from the LinkGrabber (all links when no ids are given)
    Cancel {
        /// Link ids to discard
        ids: Vec<i64>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RemoveArgs {
    /// Package id
    pub id: i64,

    /// Also delete the package's files on disk
    #[arg(long)]
    pub delete_files: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["jd-mobile", "-v", "health"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["jd-mobile", "health", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["jd-mobile", "--quiet", "packages"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_subcommand_required() {
        assert!(Args::try_parse_from(["jd-mobile"]).is_err());
    }

    #[test]
    fn test_cli_config_path_flag() {
        let args =
            Args::try_parse_from(["jd-mobile", "config", "show", "--config", "/tmp/c.json"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(
            args.command,
            Command::Config {
                command: ConfigCommand::Show
            }
        ));
    }

    #[test]
    fn test_cli_setup_defaults() {
        let args =
            Args::try_parse_from(["jd-mobile", "setup", "--base-url", "http://jd.lan:3128"]).unwrap();
        let Command::Setup(setup) = args.command else {
            panic!("expected setup command");
        };
        assert_eq!(setup.timeout_ms, 800);
        assert_eq!(setup.name, "Primary");
    }

    #[test]
    fn test_cli_setup_timeout_out_of_range_rejected() {
        let err = Args::try_parse_from([
            "jd-mobile",
            "setup",
            "--base-url",
            "http://jd.lan",
            "--timeout-ms",
            "50",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_add_defaults() {
        let args =
            Args::try_parse_from(["jd-mobile", "add", "--links", "https://a.example/x"]).unwrap();
        let Command::Add(add) = args.command else {
            panic!("expected add command");
        };
        assert_eq!(add.package, "Mobile");
        assert!(!add.autostart);
        assert!(!add.select_files);
        assert!(add.dest.is_none());
    }

    #[test]
    fn test_cli_linkgrabber_start_displayed_list() {
        let args = Args::try_parse_from([
            "jd-mobile",
            "linkgrabber",
            "start",
            "2",
            "--displayed",
            "1,2,3",
        ])
        .unwrap();
        let Command::Linkgrabber {
            command: LinkgrabberCommand::Start { ids, displayed },
        } = args.command
        else {
            panic!("expected linkgrabber start");
        };
        assert_eq!(ids, vec![2]);
        assert_eq!(displayed, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_cli_linkgrabber_start_requires_ids() {
        let err = Args::try_parse_from(["jd-mobile", "linkgrabber", "start"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_remove_delete_files() {
        let args =
            Args::try_parse_from(["jd-mobile", "remove", "42", "--delete-files"]).unwrap();
        let Command::Remove(remove) = args.command else {
            panic!("expected remove command");
        };
        assert_eq!(remove.id, 42);
        assert!(remove.delete_files);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["jd-mobile", "health", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
