//! Hardware-free core logic for the Wordly smart dictionary.
//!
//! Everything in this crate runs on the host: the application state machine,
//! the dictionary wire protocol, HID key mapping, and the persisted-config
//! model. Hardware and network plumbing live in `wordly-hal-esp32s3` and the
//! firmware binary.

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod config;
pub mod dictionary;
pub mod driver;
pub mod input;
pub mod view;
