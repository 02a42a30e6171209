//! Zenload Installer Library
//!
//! Deploys the Zenload Telegram bot onto a systemd host.
//!
//! This crate provides the core functionality for:
//! - Writing the bot's `.env` secrets file
//! - Cloning or updating the bot repository
//! - Provisioning a Python virtual environment
//! - Installing and driving the systemd service

pub mod config;
pub mod install;
pub mod system;
