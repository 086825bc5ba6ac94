/// Host-side collaborators the dialogue core drives but does not own.
///
/// The inventory, quest tracker and level event system are shared across
/// sessions and accessed from a single cooperative timeline, so they are
/// handed over as `Rc<RefCell<dyn ..>>` without any locking.
use std::cell::RefCell;
use std::rc::Rc;

use crate::schema::item::{Item, ItemId};
use crate::schema::line::Choice;
use crate::schema::speaker::{Speaker, SpeakerRegistry};

/// The player's key-item inventory.
pub trait Inventory {
    fn contains(&self, id: &ItemId) -> bool;
    /// Store an item. Returns `false` when an item with the same id is
    /// already held, in which case nothing is stored.
    fn add_key_item(&mut self, item: Item) -> bool;
    /// Remove exactly one instance. Returns the removed record, if any.
    fn remove_one(&mut self, id: &ItemId) -> Option<Item>;
}

pub trait QuestTracker {
    fn advance_objective(&mut self);
}

/// The current level's scripted event system.
pub trait LevelEvents {
    fn trigger_event(&mut self, index: usize);
    fn is_event_running(&self) -> bool;
}

/// Callbacks into the presentation layer.
pub trait Presenter {
    fn show_conversation_ui(&mut self);
    fn hide_conversation_ui(&mut self);
    fn show_partial_text(&mut self, text: &str);
    fn show_full_text(&mut self, text: &str);
    fn set_speaker_layout(&mut self, speaker: &Speaker);
    fn show_choices(&mut self, choices: &[Choice]);
    fn hide_choices(&mut self);

    fn play_reveal_tick(&mut self, _pitch: f32) {}
    fn focus_choice(&mut self, _slot: usize) {}
    fn show_item_obtained(&mut self, _item: &Item) {}
    fn show_item_used(&mut self, _item: &Item) {}
}

/// Explicit set of host collaborators passed into a session.
#[derive(Clone)]
pub struct HostServices {
    pub inventory: Rc<RefCell<dyn Inventory>>,
    pub quests: Rc<RefCell<dyn QuestTracker>>,
    pub events: Rc<RefCell<dyn LevelEvents>>,
    pub speakers: Rc<SpeakerRegistry>,
}

impl HostServices {
    pub fn new(
        inventory: Rc<RefCell<dyn Inventory>>,
        quests: Rc<RefCell<dyn QuestTracker>>,
        events: Rc<RefCell<dyn LevelEvents>>,
        speakers: Rc<SpeakerRegistry>,
    ) -> Self {
        Self {
            inventory,
            quests,
            events,
            speakers,
        }
    }

    pub fn is_event_running(&self) -> bool {
        self.events.borrow().is_event_running()
    }
}
