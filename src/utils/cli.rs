//! Command-line argument parsing and help for exeq.
//!
//! This module handles all CLI parsing for the `exeq` binary: the flag
//! string, wait toggling, the working directory and the trailing command.
//!
//! One trailing token is treated as a shell command line; several tokens
//! are executed directly as argv.

use crate::config::Config;
use crate::core::Action;

use std::path::PathBuf;

pub enum CliAction {
    Run(LaunchSpec),
    Exit,
}

/// Everything the binary needs to build a run request.
pub struct LaunchSpec {
    pub flags: String,
    pub wait: bool,
    pub cwd: Option<PathBuf>,
    pub action: Action,
}

pub fn handle_args() -> CliAction {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut flags = String::new();
    let mut wait = true;
    let mut cwd = None;
    let mut command: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return CliAction::Exit;
            }
            "-v" | "--version" => {
                print_version();
                return CliAction::Exit;
            }
            "--init" => {
                if let Err(e) = Config::generate_default(&Config::default_path()) {
                    eprintln!("Error: {}", e);
                }
                return CliAction::Exit;
            }
            "-f" | "--flags" => {
                i += 1;
                match args.get(i) {
                    Some(value) => flags = value.clone(),
                    None => {
                        eprintln!("Error: {} expects a flag string.", args[i - 1]);
                        return CliAction::Exit;
                    }
                }
            }
            "-n" | "--no-wait" => {
                wait = false;
            }
            "-d" | "--dir" => {
                i += 1;
                match args.get(i) {
                    Some(value) => cwd = Some(PathBuf::from(value)),
                    None => {
                        eprintln!("Error: {} expects a path.", args[i - 1]);
                        return CliAction::Exit;
                    }
                }
            }
            "--" => {
                command = args[i + 1..].to_vec();
                break;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown argument: {}", arg);
                eprintln!("Try --help for available options");
                return CliAction::Exit;
            }
            _ => {
                command = args[i..].to_vec();
                break;
            }
        }
        i += 1;
    }

    if command.is_empty() {
        eprintln!("Error: no command given.");
        eprintln!("Usage: exeq [OPTIONS] [--] COMMAND [ARGS...]");
        return CliAction::Exit;
    }

    let action = if command.len() == 1 {
        Action::Shell(command.remove(0))
    } else {
        Action::Args(command)
    };

    CliAction::Run(LaunchSpec {
        flags,
        wait,
        cwd,
        action,
    })
}

fn print_version() {
    println!("exeq {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!(
        r#"exeq - run a command the way a terminal file manager would

USAGE:
  exeq [OPTIONS] [--] COMMAND [ARGS...]

A single COMMAND token is run through your shell. With ARGS present, the
tokens are executed directly with no shell in between.

OPTIONS:
  -f, --flags FLAGS       Flag string changing how the command is run:
                            s  silent mode, output is discarded
                            f  fork the process
                            p  redirect output to the pager
                            w  wait for enter-press afterward
                            r  run with root privilege (sudo or doas)
                            t  run in a new terminal window
                          An uppercase flag negates the lowercase one.
  -n, --no-wait           Do not wait for the command to finish
  -d, --dir PATH          Working directory for the command
      --init              Generate the default configuration file
  -h, --help              Print help information
  -v, --version           Display the current installed version of exeq

ENVIRONMENT:
  EXEQ_CONFIG             Override the default config path
  SHELL                   Shell used for command lines
  TERMCMD                 Terminal emulator used by the 't' flag
"#
    );
}
