//! Terminal front end for the Arlo audit client.

pub mod cli;
pub mod commands;
pub mod config;
pub mod driver;
pub mod effects;
pub mod render;
