//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::AuthMode;
use crate::transfer::TimeoutAction;

#[derive(Parser, Debug)]
#[command(
    name = "echoflow",
    version,
    about = "Paced, echo-acknowledged command automation for remote terminal sessions",
    long_about = "echoflow drives interactive remote sessions the way a careful operator would:\n\
                  it sends one line at a time and waits for the remote to echo it back before\n\
                  sending the next. It can run a list of commands against many targets and save\n\
                  each command's output, or paste a block of text (a configuration snippet,\n\
                  say) into a single session without overrunning the remote's input buffer.",
    after_help = "EXAMPLES:\n  Run the configured commands on every target:  echoflow run\n  Run one command on a custom target list:      echoflow run -t hosts.txt -C \"show clock\"\n  Paste a config snippet in configuration mode:  echoflow paste -t core-sw1 -f snippet.txt --check-mode\n  Paste from stdin, skipping unechoed lines:     cat acl.txt | echoflow paste -t edge1 --on-timeout continue"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'c',
        long,
        global = true,
        help = "Configuration file path\nWithout it: $ECHOFLOW_CONFIG, then ~/.config/echoflow/config.toml,\n~/.echoflow/config.toml, ./echoflow.toml"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'd',
        long,
        global = true,
        help = "Enable debug logging (also ECHOFLOW_DEBUG=1)"
    )]
    pub debug: bool,

    #[arg(long, global = true, help = "Authentication mode for every connection")]
    pub auth: Option<AuthMode>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run commands against every target in a list and save the output
    Run {
        #[arg(
            short = 't',
            long,
            help = "Target list file, one target per line [default: ~/Desktop/SessionList.txt]"
        )]
        targets: Option<PathBuf>,

        #[arg(
            short = 'C',
            long = "command",
            help = "Command to run; repeat for several. Replaces the configured list"
        )]
        commands: Vec<String>,

        #[arg(
            short = 'o',
            long,
            help = "Output directory [default: ~/LogOutputOfSpecificCommand]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Strip terminal escape sequences from captured output")]
        ignore_escapes: bool,
    },

    /// Paste text into one session, line by line
    Paste {
        #[arg(short = 't', long, help = "Target to connect to")]
        target: String,

        #[arg(short = 'f', long, help = "File to paste; standard input when omitted")]
        file: Option<PathBuf>,

        #[arg(
            long,
            help = "What to do when a line is not echoed back: abort, continue or ask"
        )]
        on_timeout: Option<TimeoutAction>,

        #[arg(
            long,
            help = "Acknowledge each line by this text instead of its echo, e.g. ')#'"
        )]
        ack_pattern: Option<String>,

        #[arg(
            long,
            num_args = 0..=1,
            default_missing_value = ")#",
            value_name = "MARKER",
            help = "Send a blank line first and require MARKER in the response\n[default MARKER: ')#', a configuration-mode prompt]"
        )]
        check_mode: Option<String>,
    },
}
