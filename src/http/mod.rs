//! HTTP surface: the audio stream endpoint and a small JSON API

pub mod handlers;
pub mod server;

pub use server::{AppState, WebServer};
