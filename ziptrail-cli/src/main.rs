//! ziptrail CLI
//!
//! Inspect, test and stream entries of ZIP and ZIP64 archives, including
//! self-extracting archives with prepended stubs.

mod commands;
mod logging;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use commands::{ListOptions, cmd_cat, cmd_info, cmd_list, cmd_test};
use std::path::PathBuf;
use utils::GlobalOptions;

#[derive(Parser)]
#[command(name = "ziptrail")]
#[command(author, version, about = "Streaming ZIP/ZIP64 archive reader")]
#[command(long_about = "
ziptrail reads ZIP archives entry by entry, verifying local headers and
CRC-32 checksums as it streams.

Examples:
  ziptrail list archive.zip
  ziptrail list -v --json archive.zip
  ziptrail test installer.exe
  ziptrail cat archive.zip docs/readme.txt
  ziptrail --encoding shift_jis list legacy.zip
  ziptrail info archive.zip
")]
struct Cli {
    /// Code page for names without the UTF-8 flag (default: cp437)
    #[arg(long, global = true)]
    encoding: Option<String>,

    /// Password for encrypted entries
    #[arg(long, global = true)]
    password: Option<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    debug: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only files matching pattern (glob syntax: *.txt, src/**/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Test archive integrity
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write one entry to standard output
    #[command(alias = "c")]
    Cat {
        /// Archive file to read
        archive: PathBuf,

        /// Entry name
        name: String,

        /// Write the compressed bytes instead of decompressing
        #[arg(long)]
        raw: bool,

        /// Match the entry name ignoring ASCII case
        #[arg(short, long)]
        ignore_case: bool,
    },

    /// Show information about an archive
    #[command(alias = "i")]
    Info {
        /// Archive file to inspect
        archive: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let global = GlobalOptions {
        encoding: cli.encoding,
        password: cli.password,
    };

    let result = match cli.command {
        Commands::List {
            archive,
            verbose,
            json,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                verbose,
                json,
                include: &include,
                exclude: &exclude,
            },
            &global,
        ),
        Commands::Test { archive, verbose } => cmd_test(&archive, verbose, &global),
        Commands::Cat {
            archive,
            name,
            raw,
            ignore_case,
        } => cmd_cat(&archive, &name, raw, ignore_case, &global),
        Commands::Info { archive } => cmd_info(&archive, &global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "ziptrail",
            "list",
            "a.zip",
            "--encoding",
            "shift_jis",
            "-dd",
            "-I",
            "*.txt",
        ]);
        assert_eq!(cli.encoding.as_deref(), Some("shift_jis"));
        assert_eq!(cli.debug, 2);
        match cli.command {
            Commands::List { include, json, .. } => {
                assert_eq!(include, vec!["*.txt".to_string()]);
                assert!(!json);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_cat() {
        let cli = Cli::parse_from(["ziptrail", "cat", "--raw", "-i", "a.zip", "Docs/README"]);
        match cli.command {
            Commands::Cat {
                name,
                raw,
                ignore_case,
                ..
            } => {
                assert_eq!(name, "Docs/README");
                assert!(raw);
                assert!(ignore_case);
            }
            _ => panic!("expected cat"),
        }
    }
}
