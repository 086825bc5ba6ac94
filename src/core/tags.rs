/// Tag processor — parses per-line `key:value` tags and dispatches them
/// through a registered handler table.
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::core::host::{HostServices, Presenter};
use crate::schema::item::{Item, ItemId};
use crate::schema::line::Tag;

pub const SPEAKER: &str = "speaker";
pub const GIVE_ITEM: &str = "give_item";
pub const TAKE_ITEM: &str = "take_item";

#[derive(Debug, Error, PartialEq)]
pub enum TagError {
    #[error("malformed tag '{0}': expected key:value")]
    Malformed(String),
    #[error("no handler for tag key '{0}'")]
    UnknownKey(String),
    #[error("unknown speaker '{0}'")]
    UnknownSpeaker(String),
}

/// Everything a handler may touch while a line's tags are applied.
pub struct TagContext<'a> {
    pub services: &'a HostServices,
    pub presenter: &'a mut dyn Presenter,
}

pub type TagHandler = Box<dyn Fn(&str, &mut TagContext<'_>) -> Result<(), TagError>>;

/// Outcome counts for one line's tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagReport {
    pub applied: usize,
    pub skipped: usize,
}

pub struct TagProcessor {
    handlers: FxHashMap<String, TagHandler>,
}

impl Default for TagProcessor {
    fn default() -> Self {
        let mut processor = Self::empty();
        processor.register(SPEAKER, apply_speaker);
        processor.register(GIVE_ITEM, apply_give_item);
        processor.register(TAKE_ITEM, apply_take_item);
        processor
    }
}

impl TagProcessor {
    /// A processor with no handlers at all.
    pub fn empty() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }

    /// Register (or replace) the handler for `key`.
    pub fn register<F>(&mut self, key: &str, handler: F)
    where
        F: Fn(&str, &mut TagContext<'_>) -> Result<(), TagError> + 'static,
    {
        self.handlers.insert(key.to_string(), Box::new(handler));
    }

    pub fn has_handler(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Apply `raw_tags` in order. A failing tag is logged and skipped; the
    /// remaining tags still run.
    pub fn process(&self, raw_tags: &[String], ctx: &mut TagContext<'_>) -> TagReport {
        let mut report = TagReport::default();
        for raw in raw_tags {
            match self.apply(raw, ctx) {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    tracing::warn!(tag = %raw, error = %e, "Tag skipped");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    fn apply(&self, raw: &str, ctx: &mut TagContext<'_>) -> Result<(), TagError> {
        let tag = Tag::parse(raw).ok_or_else(|| TagError::Malformed(raw.to_string()))?;
        let handler = self
            .handlers
            .get(&tag.key)
            .ok_or_else(|| TagError::UnknownKey(tag.key.clone()))?;
        handler(&tag.value, ctx)
    }
}

fn apply_speaker(value: &str, ctx: &mut TagContext<'_>) -> Result<(), TagError> {
    let services = ctx.services;
    let speaker = services
        .speakers
        .get(value)
        .ok_or_else(|| TagError::UnknownSpeaker(value.to_string()))?;
    ctx.presenter.set_speaker_layout(speaker);
    tracing::debug!(speaker = %speaker.id, slot = speaker.layout_slot, "Current speaker");
    Ok(())
}

fn apply_give_item(value: &str, ctx: &mut TagContext<'_>) -> Result<(), TagError> {
    let item = Item::from_tag_value(value);
    let added = {
        let mut inventory = ctx.services.inventory.borrow_mut();
        !inventory.contains(&item.id) && inventory.add_key_item(item.clone())
    };
    if added {
        tracing::info!(item = %item.id, "Item given");
        ctx.presenter.show_item_obtained(&item);
    } else {
        tracing::debug!(item = %item.id, "Item already held");
    }
    Ok(())
}

fn apply_take_item(value: &str, ctx: &mut TagContext<'_>) -> Result<(), TagError> {
    let id = ItemId::new(value);
    let removed = {
        let mut inventory = ctx.services.inventory.borrow_mut();
        if inventory.contains(&id) {
            inventory.remove_one(&id)
        } else {
            None
        }
    };
    match removed {
        Some(item) => {
            tracing::info!(item = %item.id, "Item taken");
            ctx.presenter.show_item_used(&item);
        }
        None => tracing::debug!(item = %id, "Item to take not held"),
    }
    Ok(())
}
