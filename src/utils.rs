//! Miscellaneous utilities for exeq.
//!
//! This module holds the [cli] submodule, which implements argument
//! parsing and the help/version/--init handling for the `exeq` binary.

pub mod cli;
