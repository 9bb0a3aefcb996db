//! Core runtime logic for exeq.
//!
//! This module contains the launcher "engine" pieces:
//! - [context]: the [RunRequest] value, the [Action] type and flag squashing.
//! - [runner]: the [Runner] itself, flag interpretation and notifications.
//! - [spawn]: spawn options, stream routing and the spawn primitives.
//! - [lookup]: executable, privilege-tool, display and terminal discovery.
//! - [terminal]: the [Ui] trait and the crossterm-backed [TermUi].
//! - [zombies]: tracking and reaping of detached children.
//!
//! Most callers will import [Runner], [RunRequest] and [Outcome] from this
//! module.

pub mod context;
pub mod lookup;
pub mod runner;
pub mod spawn;
pub mod terminal;
pub mod zombies;

pub use context::{ALLOWED_FLAGS, Action, RunRequest, squash_flags};
pub use lookup::{find_privilege_tool, find_terminal_emulator, has_display, is_executable_available};
pub use runner::{Event, EventSink, LogFn, Outcome, Runner};
pub use spawn::{SpawnOptions, StreamSpec};
pub use terminal::{TermUi, Ui};
pub use zombies::Zombies;
