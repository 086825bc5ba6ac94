/// Lighthouse example — a scripted, headless run of the lighthouse story.
///
/// The player arrives carrying lamp oil, trades it for the cellar key and
/// leaves. Every presenter callback is printed with a frame timestamp.
///
/// Run with: cargo run --example lighthouse

use narrative_dialogue::core::config::DialogueConfig;
use narrative_dialogue::core::controller::{ConversationController, ConversationState};
use narrative_dialogue::core::host::{HostServices, Inventory, LevelEvents, Presenter, QuestTracker};
use narrative_dialogue::core::story::ScriptedStory;
use narrative_dialogue::schema::item::{Item, ItemId};
use narrative_dialogue::schema::line::Choice;
use narrative_dialogue::schema::speaker::{Speaker, SpeakerRegistry};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// One 60 Hz frame.
const FRAME: Duration = Duration::from_micros(16_667);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = DialogueConfig::load_from_ron(Path::new("dialogue_data/config.ron"))
        .expect("Failed to load dialogue config");

    let mut speakers = SpeakerRegistry::new();
    speakers
        .load_from_ron(Path::new("dialogue_data/speakers.ron"))
        .expect("Failed to load speakers");

    let story = ScriptedStory::load_from_ron(Path::new("dialogue_data/lighthouse/story.ron"))
        .expect("Failed to load lighthouse story");

    let inventory = Rc::new(RefCell::new(Pack {
        items: vec![Item::from_tag_value("lamp_oil")],
    }));
    let services = HostServices::new(
        inventory.clone(),
        Rc::new(RefCell::new(Journal)),
        Rc::new(RefCell::new(QuietLevel)),
        Rc::new(speakers),
    );

    let mut controller = ConversationController::new(config, Log::default());
    controller
        .begin_session(Rc::new(RefCell::new(story)), services)
        .expect("Failed to start conversation");

    // The player taps accept twice per line: once to skip, once to move on.
    // At the prompt the first option (hand over the oil) is taken.
    let mut frame = 0u32;
    let mut presses = 0u32;
    while controller.is_session_active() && frame < 10_000 {
        controller.update(FRAME);
        controller.presenter_mut().frame = frame;

        match controller.state() {
            ConversationState::AwaitingChoice => controller.on_choice_selected(0),
            ConversationState::Revealing | ConversationState::AwaitingAdvance if frame % 20 == 0 => {
                controller.on_advance_input();
                presses += 1;
            }
            _ => {}
        }
        frame += 1;
    }

    println!();
    println!("Frames: {}, accept presses: {}", frame, presses);
    println!(
        "Inventory: {:?}",
        inventory
            .borrow()
            .items
            .iter()
            .map(|i| i.id.as_str())
            .collect::<Vec<_>>()
    );
}

#[derive(Default)]
struct Log {
    frame: u32,
}

impl Presenter for Log {
    fn show_conversation_ui(&mut self) {
        println!("[{:>5}] ui: open", self.frame);
    }

    fn hide_conversation_ui(&mut self) {
        println!("[{:>5}] ui: close", self.frame);
    }

    fn show_partial_text(&mut self, _text: &str) {}

    fn show_full_text(&mut self, text: &str) {
        println!("[{:>5}] text: {}", self.frame, text);
    }

    fn set_speaker_layout(&mut self, speaker: &Speaker) {
        println!(
            "[{:>5}] layout {}: {}",
            self.frame, speaker.layout_slot, speaker.id
        );
    }

    fn show_choices(&mut self, choices: &[Choice]) {
        for choice in choices {
            println!("[{:>5}] choice {}: {}", self.frame, choice.index, choice.text);
        }
    }

    fn hide_choices(&mut self) {
        println!("[{:>5}] choices hidden", self.frame);
    }

    fn show_item_obtained(&mut self, item: &Item) {
        println!("[{:>5}] obtained {}", self.frame, item.name);
    }

    fn show_item_used(&mut self, item: &Item) {
        println!("[{:>5}] used {}", self.frame, item.name);
    }
}

struct Pack {
    items: Vec<Item>,
}

impl Inventory for Pack {
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

struct Journal;

impl QuestTracker for Journal {
    fn advance_objective(&mut self) {
        println!("        objective advanced");
    }
}

struct QuietLevel;

impl LevelEvents for QuietLevel {
    fn trigger_event(&mut self, index: usize) {
        println!("        event {} (instant)", index);
    }

    fn is_event_running(&self) -> bool {
        false
    }
}
