//! # Features Module
//!
//! Feature modules for the chime bot.

pub mod reminders;
