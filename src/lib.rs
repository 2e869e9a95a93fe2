//! ML Agent client library
//!
//! Streaming chat renderer and desktop front end for the ML Agent gateway.

pub mod app;
pub mod gateway;
pub mod markdown;
pub mod storage;
pub mod stream;
pub mod types;
pub mod ui;
