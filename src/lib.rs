//! Core of an audio-only maze navigation game. The engine models the room
//! graph, movement, sonar probing, locked passages and directional sequence
//! puzzles; rendering and audio playback live outside this crate and consume
//! the queued events.

pub mod command;
pub mod constants;
pub mod engine;
pub mod level;
pub mod player;
pub mod save_store;
pub mod types;
pub mod world;
