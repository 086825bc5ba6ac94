/// Preview — play a story file in the terminal with the typewriter reveal.
///
/// Usage: preview --story <story.ron> [--speakers <speakers.ron>] [--config <config.ron>]
///                [--items <id1,id2>] [--event-secs <n>]
///
/// Controls:
///   <enter>   — advance
///   <n>       — pick choice n
///   resume    — release a script hold on advancing
///   quit      — exit

use narrative_dialogue::core::config::DialogueConfig;
use narrative_dialogue::core::controller::{ConversationController, ConversationState};
use narrative_dialogue::core::host::{HostServices, Inventory, LevelEvents, Presenter, QuestTracker};
use narrative_dialogue::core::story::ScriptedStory;
use narrative_dialogue::schema::item::{Item, ItemId};
use narrative_dialogue::schema::line::Choice;
use narrative_dialogue::schema::speaker::{Speaker, SpeakerRegistry};
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut story_path = None;
    let mut speakers_path = None;
    let mut config_path = None;
    let mut items: Vec<String> = Vec::new();
    let mut event_secs: f32 = 1.5;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--story" if i + 1 < args.len() => {
                i += 1;
                story_path = Some(args[i].clone());
            }
            "--speakers" if i + 1 < args.len() => {
                i += 1;
                speakers_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--items" if i + 1 < args.len() => {
                i += 1;
                items = args[i].split(',').map(|s| s.trim().to_string()).collect();
            }
            "--event-secs" if i + 1 < args.len() => {
                i += 1;
                event_secs = args[i].parse().unwrap_or(1.5);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let story_path = story_path.unwrap_or_else(|| {
        eprintln!("Error: --story is required");
        print_usage();
        std::process::exit(1);
    });

    let story = ScriptedStory::load_from_ron(Path::new(&story_path)).unwrap_or_else(|e| {
        eprintln!("Error loading story '{}': {}", story_path, e);
        std::process::exit(1);
    });

    let mut speakers = SpeakerRegistry::new();
    if let Some(ref path) = speakers_path {
        if let Err(e) = speakers.load_from_ron(Path::new(path)) {
            eprintln!("Error loading speakers '{}': {}", path, e);
            std::process::exit(1);
        }
    }

    let config = match config_path {
        Some(ref path) => DialogueConfig::load_from_ron(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error loading config '{}': {}", path, e);
            std::process::exit(1);
        }),
        None => DialogueConfig::default(),
    };

    let inventory = Rc::new(RefCell::new(Satchel::default()));
    for id in items.iter().filter(|s| !s.is_empty()) {
        inventory.borrow_mut().add_key_item(Item::from_tag_value(id));
    }
    let services = HostServices::new(
        inventory.clone(),
        Rc::new(RefCell::new(QuestNotes::default())),
        Rc::new(RefCell::new(TimedEvents::new(Duration::try_from_secs_f32(event_secs).unwrap_or(Duration::ZERO)))),
        Rc::new(speakers),
    );

    let step = config.typing_speed().max(Duration::from_millis(10));
    let mut controller = ConversationController::new(config, Terminal::default());
    let script = Rc::new(RefCell::new(story));
    if let Err(e) = controller.begin_session(script, services) {
        eprintln!("Error starting conversation: {}", e);
        std::process::exit(1);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while controller.is_session_active() {
        match controller.state() {
            ConversationState::Revealing | ConversationState::SessionEnded => {
                std::thread::sleep(step);
                controller.update(step);
                continue;
            }
            ConversationState::AwaitingAdvance => {
                let hint = if controller.can_advance() { "[enter]" } else { "[held: type resume]" };
                print!("  {} ", hint);
            }
            ConversationState::AwaitingChoice => print!("  choice> "),
            ConversationState::Idle => break,
        }
        io::stdout().flush().ok();

        let input = match lines.next() {
            Some(Ok(line)) => line.trim().to_string(),
            _ => break,
        };

        match input.as_str() {
            "quit" | "q" => break,
            "resume" => controller.resume_advance(),
            "" => controller.on_advance_input(),
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => controller.on_choice_selected(n - 1),
                _ => println!("  (enter, a choice number, resume, or quit)"),
            },
        }
    }

    println!();
    println!("Inventory: {:?}", inventory.borrow().ids());
}

fn print_usage() {
    println!("Usage: preview --story <story.ron> [--speakers <speakers.ron>] [--config <config.ron>]");
    println!("               [--items <id1,id2>] [--event-secs <n>]");
    println!();
    println!("Controls:");
    println!("  <enter>   advance");
    println!("  <n>       pick choice n");
    println!("  resume    release a script hold on advancing");
    println!("  quit      exit");
}

#[derive(Default)]
struct Terminal {
    speaker: Option<String>,
}

impl Presenter for Terminal {
    fn show_conversation_ui(&mut self) {
        println!("--- conversation ---");
    }

    fn hide_conversation_ui(&mut self) {
        println!("--- end ---");
    }

    fn show_partial_text(&mut self, text: &str) {
        print!("\r{}", text);
        io::stdout().flush().ok();
    }

    fn show_full_text(&mut self, text: &str) {
        println!("\r{}", text);
    }

    fn set_speaker_layout(&mut self, speaker: &Speaker) {
        if self.speaker.as_deref() != Some(speaker.display_name.as_str()) && !speaker.display_name.is_empty() {
            println!("[{}]", speaker.display_name);
        }
        self.speaker = Some(speaker.display_name.clone());
    }

    fn show_choices(&mut self, choices: &[Choice]) {
        for choice in choices {
            println!("  {}. {}", choice.index + 1, choice.text);
        }
    }

    fn hide_choices(&mut self) {}

    fn show_item_obtained(&mut self, item: &Item) {
        println!("  (You've obtained {})", item.name);
    }

    fn show_item_used(&mut self, item: &Item) {
        println!("  (You've used {})", item.name);
    }
}

#[derive(Default)]
struct Satchel {
    items: Vec<Item>,
}

impl Satchel {
    fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.id.as_str()).collect()
    }
}

impl Inventory for Satchel {
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

#[derive(Default)]
struct QuestNotes {
    objective: u32,
}

impl QuestTracker for QuestNotes {
    fn advance_objective(&mut self) {
        self.objective += 1;
        println!("  (Objective updated: step {})", self.objective);
    }
}

/// Events that "run" for a fixed wall-clock duration.
struct TimedEvents {
    duration: Duration,
    running_until: Option<Instant>,
}

impl TimedEvents {
    fn new(duration: Duration) -> Self {
        Self {
            duration,
            running_until: None,
        }
    }
}

impl LevelEvents for TimedEvents {
    fn trigger_event(&mut self, index: usize) {
        println!("  (Event {} plays)", index);
        self.running_until = Some(Instant::now() + self.duration);
    }

    fn is_event_running(&self) -> bool {
        self.running_until.is_some_and(|t| Instant::now() < t)
    }
}
