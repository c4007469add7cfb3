//! ESP32-S3 board support for Wordly: connectivity handles, BLE keyboard
//! input, MP3 playback, flash-backed config, and the screen renderer.

#![no_std]

pub mod audio;
pub mod input;
pub mod network;
pub mod render;
pub mod storage;
