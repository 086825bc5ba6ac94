pub mod bridge;
pub mod choices;
pub mod config;
pub mod controller;
pub mod host;
pub mod reveal;
pub mod runtime;
pub mod story;
pub mod tags;
