#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod paths;
pub mod provider;
pub mod runner;
pub mod serve;
