//! Shared fakes for the integration tests: a recording presenter and
//! in-memory host collaborators.
#![allow(dead_code)]

use narrative_dialogue::core::host::{HostServices, Inventory, LevelEvents, Presenter, QuestTracker};
use narrative_dialogue::schema::item::{Item, ItemId};
use narrative_dialogue::schema::line::Choice;
use narrative_dialogue::schema::speaker::{Speaker, SpeakerRegistry};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Recorder {
    pub ui_visible: bool,
    pub buffer: String,
    pub partial_updates: usize,
    pub full_texts: Vec<String>,
    pub layouts: Vec<String>,
    pub choices: Vec<String>,
    pub choices_hidden: usize,
    pub focused: Option<usize>,
    pub ticks: usize,
    pub obtained: Vec<String>,
    pub used: Vec<String>,
}

impl Presenter for Recorder {
    fn show_conversation_ui(&mut self) {
        self.ui_visible = true;
    }
    fn hide_conversation_ui(&mut self) {
        self.ui_visible = false;
    }
    fn show_partial_text(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.partial_updates += 1;
    }
    fn show_full_text(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.full_texts.push(text.to_string());
    }
    fn set_speaker_layout(&mut self, speaker: &Speaker) {
        self.layouts.push(speaker.id.0.clone());
    }
    fn show_choices(&mut self, choices: &[Choice]) {
        self.choices = choices.iter().map(|c| c.text.clone()).collect();
    }
    fn hide_choices(&mut self) {
        self.choices.clear();
        self.choices_hidden += 1;
    }
    fn play_reveal_tick(&mut self, _pitch: f32) {
        self.ticks += 1;
    }
    fn focus_choice(&mut self, slot: usize) {
        self.focused = Some(slot);
    }
    fn show_item_obtained(&mut self, item: &Item) {
        self.obtained.push(item.id.0.clone());
    }
    fn show_item_used(&mut self, item: &Item) {
        self.used.push(item.id.0.clone());
    }
}

#[derive(Debug, Default)]
pub struct MemoryInventory {
    pub items: Vec<Item>,
}

impl MemoryInventory {
    pub fn holding(ids: &[&str]) -> Self {
        Self {
            items: ids.iter().map(|id| Item::from_tag_value(id)).collect(),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id.0.clone()).collect()
    }
}

impl Inventory for MemoryInventory {
    fn contains(&self, id: &ItemId) -> bool {
        self.items.iter().any(|i| &i.id == id)
    }
    fn add_key_item(&mut self, item: Item) -> bool {
        if self.contains(&item.id) {
            return false;
        }
        self.items.push(item);
        true
    }
    fn remove_one(&mut self, id: &ItemId) -> Option<Item> {
        let pos = self.items.iter().position(|i| &i.id == id)?;
        Some(self.items.remove(pos))
    }
}

#[derive(Debug, Default)]
pub struct QuestLog {
    pub objective: u32,
}

impl QuestTracker for QuestLog {
    fn advance_objective(&mut self) {
        self.objective += 1;
    }
}

/// Level events that keep "running" until the test finishes them.
#[derive(Debug, Default)]
pub struct EventStage {
    pub triggered: Vec<usize>,
    pub running: bool,
}

impl LevelEvents for EventStage {
    fn trigger_event(&mut self, index: usize) {
        self.triggered.push(index);
        self.running = true;
    }
    fn is_event_running(&self) -> bool {
        self.running
    }
}

pub struct Host {
    pub inventory: Rc<RefCell<MemoryInventory>>,
    pub quests: Rc<RefCell<QuestLog>>,
    pub events: Rc<RefCell<EventStage>>,
    pub services: HostServices,
}

pub fn host_with(items: &[&str]) -> Host {
    let mut speakers = SpeakerRegistry::new();
    speakers
        .load_from_ron(Path::new("dialogue_data/speakers.ron"))
        .unwrap();

    let inventory = Rc::new(RefCell::new(MemoryInventory::holding(items)));
    let quests = Rc::new(RefCell::new(QuestLog::default()));
    let events = Rc::new(RefCell::new(EventStage::default()));
    let services = HostServices::new(
        inventory.clone(),
        quests.clone(),
        events.clone(),
        Rc::new(speakers),
    );
    Host {
        inventory,
        quests,
        events,
        services,
    }
}
