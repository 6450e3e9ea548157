//! Command-line interface support for the `nodal` binary.

pub mod commands;
