//! Narrative Dialogue — a branching conversation engine for games.
//!
//! Drives a narrative script runtime one line at a time through a
//! presentation layer, with a skippable typewriter reveal, tag-driven side
//! effects, choice presentation and host bridge hooks that let the script
//! query and mutate game state.

pub mod core;
pub mod schema;
