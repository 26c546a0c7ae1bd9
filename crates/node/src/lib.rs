//! Command line front of chordring.
//!
//! Reads and writes yaml configs, sets up logging, and drives ring simulations on the
//! in-process transport of `chordring-transport`.
pub mod config;
pub mod consts;
pub mod error;
pub mod logging;
pub mod simulation;
pub mod util;
