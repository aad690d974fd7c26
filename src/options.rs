//! Parsing Options.
//! `--net {file}` or `-n` names the net description to complement.

use clap::{Arg, ArgAction, Command, value_parser};
use std::error::Error;
use std::path::PathBuf;

fn make_options_parser() -> clap::Command {
    Command::new("pn-complement")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Complements a bounded Petri net against an upward-closed forbidden region")
        .arg(
            Arg::new("net")
                .short('n')
                .long("net")
                .value_name("FILE")
                .help("Net description (.json or .ron) with initial marking and forbidden region")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML analysis configuration")
                .default_value("pn-complement.toml")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("state-limit")
                .short('l')
                .long("state-limit")
                .value_name("N")
                .help("Abort once more than N markings are reachable (overrides the config file)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the JSON report will be stored")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dot")
                .long("dot")
                .value_name("FILE")
                .help("Write the reachability graph in DOT format")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("net-dot")
                .long("net-dot")
                .value_name("FILE")
                .help("Write the net itself in DOT format")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Do not print the report to stdout")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub net: PathBuf,
    pub config: PathBuf,
    pub state_limit: Option<usize>,
    pub output: Option<PathBuf>,
    pub dot: Option<PathBuf>,
    pub net_dot: Option<PathBuf>,
    pub quiet: bool,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let net = matches
            .get_one::<PathBuf>("net")
            .cloned()
            .ok_or("missing --net")?;
        let config = matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_default();

        Ok(Options {
            net,
            config,
            state_limit: matches.get_one::<usize>("state-limit").copied(),
            output: matches.get_one::<PathBuf>("output").cloned(),
            dot: matches.get_one::<PathBuf>("dot").cloned(),
            net_dot: matches.get_one::<PathBuf>("net-dot").cloned(),
            quiet: matches.get_flag("quiet"),
        })
    }
}
