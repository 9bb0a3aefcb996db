//! Run request data for exeq.
//!
//! This module provides the [Action] and [RunRequest] types and the
//! [squash_flags] function.
//!
//! A [RunRequest] describes one launch: what to run, for which files, with
//! which flags and spawn options. It is built once with the consuming
//! builder methods and handed to the runner; the runner squashes its flags
//! and interprets them before spawning anything.
//!
//! Flags are single characters. An uppercase flag negates its lowercase
//! counterpart, which is what [squash_flags] resolves.

use crate::core::spawn::SpawnOptions;

use std::fmt;
use std::path::{Path, PathBuf};

/// The documented flag alphabet.
///
/// `c` is accepted but carries no meaning inside the runner itself; it tells
/// the calling application to act on the current file only. The legacy flags
/// `s`, `p` and `w` are still honored by the interpreter. Anything else is
/// accepted and ignored.
pub const ALLOWED_FLAGS: &str = "cfrtCFRT";

/// What to launch: a shell command line or argv tokens.
///
/// A `Shell` action is handed to `$SHELL -c` at spawn time. An `Args` action
/// is executed directly, with no shell in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Shell(String),
    Args(Vec<String>),
}

impl Action {
    /// Whether this action needs a shell to run.
    #[inline]
    pub fn is_shell(&self) -> bool {
        matches!(self, Action::Shell(_))
    }

    /// Prefix the action with a privilege escalation tool.
    ///
    /// With `background` set, the tool's own background flag (`-b`) is
    /// inserted instead of forking on our side.
    pub(crate) fn elevated(self, tool: &str, background: bool) -> Action {
        match self {
            Action::Shell(line) => {
                let bg = if background { "-b " } else { "" };
                Action::Shell(format!("{} {}{}", tool, bg, line))
            }
            Action::Args(args) => {
                let mut argv = Vec::with_capacity(args.len() + 2);
                argv.push(tool.to_owned());
                if background {
                    argv.push("-b".to_owned());
                }
                argv.extend(args);
                Action::Args(argv)
            }
        }
    }

    /// Wrap the action so it runs inside a terminal emulator window.
    pub(crate) fn in_terminal(self, term: &str) -> Action {
        match self {
            Action::Shell(line) => Action::Shell(format!("{} -e {}", term, line)),
            Action::Args(args) => {
                let mut argv = Vec::with_capacity(args.len() + 2);
                argv.push(term.to_owned());
                argv.push("-e".to_owned());
                argv.extend(args);
                Action::Args(argv)
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shell(line) => f.write_str(line),
            Action::Args(args) => f.write_str(&args.join(" ")),
        }
    }
}

impl From<&str> for Action {
    fn from(line: &str) -> Self {
        Action::Shell(line.to_owned())
    }
}

impl From<String> for Action {
    fn from(line: String) -> Self {
        Action::Shell(line)
    }
}

impl From<Vec<String>> for Action {
    fn from(args: Vec<String>) -> Self {
        Action::Args(args)
    }
}

/// Remove negation pairs from a flag string.
///
/// For every ASCII-uppercase flag present, every occurrence of both that
/// flag and its lowercase counterpart is removed. Lowercase flags without a
/// present negation are kept as they are, duplicates included. Squashing an
/// already-squashed string changes nothing.
pub fn squash_flags(flags: &str) -> String {
    let mut squashed = flags.to_owned();
    for flag in flags.chars().filter(char::is_ascii_uppercase) {
        let lower = flag.to_ascii_lowercase();
        squashed.retain(|c| c != flag && c != lower);
    }
    squashed
}

/// A single launch request.
///
/// Built once, interpreted once, discarded after use. The first file in
/// `files` is the primary file; it is always derived, never stored twice.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub(crate) action: Option<Action>,
    pub(crate) app: String,
    pub(crate) mode: i32,
    pub(crate) flags: String,
    pub(crate) files: Vec<PathBuf>,
    pub(crate) try_app_first: bool,
    pub(crate) wait: Option<bool>,
    pub(crate) options: SpawnOptions,
}

impl Default for RunRequest {
    fn default() -> Self {
        RunRequest {
            action: None,
            app: "default".to_owned(),
            mode: 0,
            flags: String::new(),
            files: Vec::new(),
            try_app_first: false,
            wait: None,
            options: SpawnOptions::default(),
        }
    }
}

impl RunRequest {
    pub fn new() -> Self {
        Self::default()
    }

    // Builder methods, consuming

    pub fn action(mut self, action: impl Into<Action>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    pub fn mode(mut self, mode: i32) -> Self {
        self.mode = mode;
        self
    }

    pub fn flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = flags.into();
        self
    }

    pub fn files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    pub fn try_app_first(mut self, value: bool) -> Self {
        self.try_app_first = value;
        self
    }

    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn options(mut self, options: SpawnOptions) -> Self {
        self.options = options;
        self
    }

    // Accessors

    #[inline]
    pub fn get_action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    #[inline]
    pub fn get_app(&self) -> &str {
        &self.app
    }

    #[inline]
    pub fn get_mode(&self) -> i32 {
        self.mode
    }

    #[inline]
    pub fn get_flags(&self) -> &str {
        &self.flags
    }

    #[inline]
    pub fn get_files(&self) -> &[PathBuf] {
        &self.files
    }

    #[inline]
    pub fn is_try_app_first(&self) -> bool {
        self.try_app_first
    }

    #[inline]
    pub fn get_wait(&self) -> Option<bool> {
        self.wait
    }

    #[inline]
    pub fn get_options(&self) -> &SpawnOptions {
        &self.options
    }

    /// The primary file, derived from the file list.
    #[inline]
    pub fn primary_file(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }

    /// Replace the flag string with its squashed form.
    pub(crate) fn squash(&mut self) {
        self.flags = squash_flags(&self.flags);
    }

    #[inline]
    pub(crate) fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_removes_negation_pairs() {
        assert_eq!(squash_flags("rF"), "r");
        assert_eq!(squash_flags("rf"), "rf");
        assert_eq!(squash_flags("fFf"), "");
        assert_eq!(squash_flags("pSsw"), "pw");
    }

    #[test]
    fn squash_keeps_duplicates_without_negation() {
        assert_eq!(squash_flags("ppw"), "ppw");
        assert_eq!(squash_flags("ss"), "ss");
    }

    #[test]
    fn squash_never_keeps_uppercase() {
        assert_eq!(squash_flags("T"), "");
        assert_eq!(squash_flags("RT"), "");
        assert_eq!(squash_flags("cFRT"), "c");
    }

    #[test]
    fn squash_is_idempotent() {
        for flags in ["", "p", "rF", "fFtT", "swprc", "xyzXY"] {
            let once = squash_flags(flags);
            assert_eq!(squash_flags(&once), once, "not idempotent for {:?}", flags);
        }
    }

    #[test]
    fn elevated_shell_and_args() {
        let shell = Action::Shell("vim notes.txt".into()).elevated("sudo", false);
        assert_eq!(shell, Action::Shell("sudo vim notes.txt".into()));

        let forked = Action::Shell("mount /dev/sda1".into()).elevated("sudo", true);
        assert_eq!(forked, Action::Shell("sudo -b mount /dev/sda1".into()));

        let args = Action::Args(vec!["mount".into(), "/dev/sda1".into()]).elevated("doas", true);
        assert_eq!(
            args,
            Action::Args(vec![
                "doas".into(),
                "-b".into(),
                "mount".into(),
                "/dev/sda1".into()
            ])
        );
    }

    #[test]
    fn terminal_wrap_shell_and_args() {
        let shell = Action::Shell("htop".into()).in_terminal("xterm");
        assert_eq!(shell, Action::Shell("xterm -e htop".into()));

        let args = Action::Args(vec!["htop".into()]).in_terminal("kitty");
        assert_eq!(
            args,
            Action::Args(vec!["kitty".into(), "-e".into(), "htop".into()])
        );
    }

    #[test]
    fn primary_file_is_derived() {
        let request = RunRequest::new().files(vec!["a.txt".into(), "b.txt".into()]);
        assert_eq!(request.primary_file(), Some(Path::new("a.txt")));

        let empty = RunRequest::new();
        assert_eq!(empty.primary_file(), None);
    }

    #[test]
    fn request_defaults() {
        let request = RunRequest::new();
        assert_eq!(request.get_app(), "default");
        assert_eq!(request.get_mode(), 0);
        assert_eq!(request.get_wait(), None);
        assert!(request.get_action().is_none());
        assert!(!request.is_try_app_first());
    }
}
