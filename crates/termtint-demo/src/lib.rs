//! Full render test of the termtint escape tables and dynamic builders.

pub mod cli;
pub mod render;
