/// External function bridge — host hooks the script calls mid-line.
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

use crate::core::host::HostServices;
use crate::core::runtime::{ExternalFn, ScriptRuntime};
use crate::schema::item::ItemId;
use crate::schema::value::ScriptValue;

pub const HAS_ITEM: &str = "has_item";
pub const ADVANCE_OBJECTIVE: &str = "advance_objective";
pub const TRIGGER_EVENT: &str = "trigger_event";
pub const STOP_TYPING: &str = "stop_typing";

pub const HOOK_NAMES: [&str; 4] = [HAS_ITEM, ADVANCE_OBJECTIVE, TRIGGER_EVENT, STOP_TYPING];

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("hook '{0}' invoked with no bound session")]
    Unbound(String),
    #[error("hook '{hook}' is missing argument {index}")]
    MissingArgument { hook: String, index: usize },
    #[error("hook '{hook}' expected {expected}")]
    WrongArgumentType { hook: String, expected: &'static str },
}

/// The `can_advance` flag shared between a session and its hooks.
#[derive(Debug)]
pub struct AdvanceGate {
    open: Cell<bool>,
}

impl Default for AdvanceGate {
    fn default() -> Self {
        Self {
            open: Cell::new(true),
        }
    }
}

impl AdvanceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn hold(&self) {
        self.open.set(false);
    }

    pub fn release(&self) {
        self.open.set(true);
    }
}

/// What the hooks reach through. Cleared on teardown so a runtime that
/// outlives its session cannot touch host state through stale hooks.
struct Binding {
    services: RefCell<Option<HostServices>>,
    gate: Rc<AdvanceGate>,
}

impl Binding {
    fn services(&self, hook: &str) -> Result<HostServices, BridgeError> {
        self.services
            .borrow()
            .clone()
            .ok_or_else(|| BridgeError::Unbound(hook.to_string()))
    }

    fn gate(&self, hook: &str) -> Result<&AdvanceGate, BridgeError> {
        if self.services.borrow().is_none() {
            return Err(BridgeError::Unbound(hook.to_string()));
        }
        Ok(self.gate.as_ref())
    }
}

/// The hook table for one session. Owned by the controller; its lifetime
/// equals the session's.
pub struct ExternalBridge {
    binding: Rc<Binding>,
    hooks: FxHashMap<&'static str, ExternalFn>,
}

impl ExternalBridge {
    pub fn new(services: HostServices, gate: Rc<AdvanceGate>) -> Self {
        let binding = Rc::new(Binding {
            services: RefCell::new(Some(services)),
            gate,
        });

        let mut hooks: FxHashMap<&'static str, ExternalFn> = FxHashMap::default();

        let b = Rc::clone(&binding);
        hooks.insert(
            HAS_ITEM,
            Rc::new(move |args: &[ScriptValue]| -> Result<ScriptValue, BridgeError> {
                let services = b.services(HAS_ITEM)?;
                let id = str_arg(HAS_ITEM, args, 0)?;
                let held = services.inventory.borrow().contains(&ItemId::new(id));
                tracing::debug!(item = %id, held, "has_item");
                Ok(ScriptValue::Bool(held))
            }),
        );

        let b = Rc::clone(&binding);
        hooks.insert(
            ADVANCE_OBJECTIVE,
            Rc::new(move |_args: &[ScriptValue]| -> Result<ScriptValue, BridgeError> {
                let services = b.services(ADVANCE_OBJECTIVE)?;
                services.quests.borrow_mut().advance_objective();
                tracing::debug!("advance_objective");
                Ok(ScriptValue::Void)
            }),
        );

        let b = Rc::clone(&binding);
        hooks.insert(
            TRIGGER_EVENT,
            Rc::new(move |args: &[ScriptValue]| -> Result<ScriptValue, BridgeError> {
                let services = b.services(TRIGGER_EVENT)?;
                let index = index_arg(TRIGGER_EVENT, args, 0)?;
                tracing::debug!(event = index, "trigger_event");
                services.events.borrow_mut().trigger_event(index);
                Ok(ScriptValue::Void)
            }),
        );

        let b = Rc::clone(&binding);
        hooks.insert(
            STOP_TYPING,
            Rc::new(move |_args: &[ScriptValue]| -> Result<ScriptValue, BridgeError> {
                b.gate(STOP_TYPING)?.hold();
                tracing::debug!("stop_typing: advance input held");
                Ok(ScriptValue::Void)
            }),
        );

        Self { binding, hooks }
    }

    pub fn hook(&self, name: &str) -> Option<ExternalFn> {
        self.hooks.get(name).cloned()
    }

    pub fn is_bound(&self) -> bool {
        self.binding.services.borrow().is_some()
    }

    /// Bind every hook into the runtime under its script-facing name.
    pub fn register(&self, runtime: &mut dyn ScriptRuntime) {
        for name in HOOK_NAMES {
            if let Some(hook) = self.hook(name) {
                runtime.bind_external_function(name, hook);
            }
        }
    }

    /// Remove the hooks from the runtime and drop the host binding.
    pub fn unregister(&self, runtime: &mut dyn ScriptRuntime) {
        for name in HOOK_NAMES {
            runtime.unbind_external_function(name);
        }
        self.unbind();
    }

    pub fn unbind(&self) {
        self.binding.services.borrow_mut().take();
    }
}

fn arg<'a>(hook: &str, args: &'a [ScriptValue], index: usize) -> Result<&'a ScriptValue, BridgeError> {
    args.get(index).ok_or_else(|| BridgeError::MissingArgument {
        hook: hook.to_string(),
        index,
    })
}

fn str_arg<'a>(hook: &str, args: &'a [ScriptValue], index: usize) -> Result<&'a str, BridgeError> {
    arg(hook, args, index)?
        .as_str()
        .ok_or_else(|| BridgeError::WrongArgumentType {
            hook: hook.to_string(),
            expected: "a string",
        })
}

fn index_arg(hook: &str, args: &[ScriptValue], index: usize) -> Result<usize, BridgeError> {
    arg(hook, args, index)?
        .as_int()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| BridgeError::WrongArgumentType {
            hook: hook.to_string(),
            expected: "a non-negative integer",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::{Inventory, LevelEvents, QuestTracker};
    use crate::schema::item::Item;
    use crate::schema::speaker::SpeakerRegistry;

    #[derive(Default)]
    struct Bag(Vec<Item>);

    impl Inventory for Bag {
        fn contains(&self, id: &ItemId) -> bool {
            self.0.iter().any(|i| &i.id == id)
        }
        fn add_key_item(&mut self, item: Item) -> bool {
            self.0.push(item);
            true
        }
        fn remove_one(&mut self, id: &ItemId) -> Option<Item> {
            let pos = self.0.iter().position(|i| &i.id == id)?;
            Some(self.0.remove(pos))
        }
    }

    #[derive(Default)]
    struct Quests(u32);

    impl QuestTracker for Quests {
        fn advance_objective(&mut self) {
            self.0 += 1;
        }
    }

    #[derive(Default)]
    struct Events(Vec<usize>);

    impl LevelEvents for Events {
        fn trigger_event(&mut self, index: usize) {
            self.0.push(index);
        }
        fn is_event_running(&self) -> bool {
            false
        }
    }

    struct Fixture {
        bag: Rc<RefCell<Bag>>,
        quests: Rc<RefCell<Quests>>,
        events: Rc<RefCell<Events>>,
        gate: Rc<AdvanceGate>,
        bridge: ExternalBridge,
    }

    fn fixture() -> Fixture {
        let bag = Rc::new(RefCell::new(Bag(vec![Item::from_tag_value("lamp")])));
        let quests = Rc::new(RefCell::new(Quests::default()));
        let events = Rc::new(RefCell::new(Events::default()));
        let gate = Rc::new(AdvanceGate::new());
        let services = HostServices::new(
            bag.clone(),
            quests.clone(),
            events.clone(),
            Rc::new(SpeakerRegistry::new()),
        );
        let bridge = ExternalBridge::new(services, gate.clone());
        Fixture {
            bag,
            quests,
            events,
            gate,
            bridge,
        }
    }

    fn call(bridge: &ExternalBridge, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, BridgeError> {
        let hook = bridge.hook(name).unwrap();
        hook(args)
    }

    #[test]
    fn has_item_queries_without_side_effect() {
        let f = fixture();
        assert_eq!(
            call(&f.bridge, HAS_ITEM, &[ScriptValue::from("lamp")]).unwrap(),
            ScriptValue::Bool(true)
        );
        assert_eq!(
            call(&f.bridge, HAS_ITEM, &[ScriptValue::from("rope")]).unwrap(),
            ScriptValue::Bool(false)
        );
        assert_eq!(f.bag.borrow().0.len(), 1);
    }

    #[test]
    fn advance_objective_can_be_called_repeatedly() {
        let f = fixture();
        call(&f.bridge, ADVANCE_OBJECTIVE, &[]).unwrap();
        call(&f.bridge, ADVANCE_OBJECTIVE, &[]).unwrap();
        assert_eq!(f.quests.borrow().0, 2);
    }

    #[test]
    fn trigger_event_forwards_index() {
        let f = fixture();
        call(&f.bridge, TRIGGER_EVENT, &[ScriptValue::Int(2)]).unwrap();
        assert_eq!(f.events.borrow().0, vec![2]);
    }

    #[test]
    fn trigger_event_rejects_negative_index() {
        let f = fixture();
        let err = call(&f.bridge, TRIGGER_EVENT, &[ScriptValue::Int(-1)]).unwrap_err();
        assert!(matches!(err, BridgeError::WrongArgumentType { .. }));
        assert!(f.events.borrow().0.is_empty());
    }

    #[test]
    fn missing_argument_is_reported() {
        let f = fixture();
        let err = call(&f.bridge, HAS_ITEM, &[]).unwrap_err();
        assert!(matches!(err, BridgeError::MissingArgument { index: 0, .. }));
    }

    #[test]
    fn stop_typing_is_idempotent() {
        let f = fixture();
        call(&f.bridge, STOP_TYPING, &[]).unwrap();
        assert!(!f.gate.is_open());
        call(&f.bridge, STOP_TYPING, &[]).unwrap();
        assert!(!f.gate.is_open());
    }

    #[test]
    fn hooks_fail_once_unbound() {
        let f = fixture();
        f.bridge.unbind();
        assert!(!f.bridge.is_bound());
        for name in HOOK_NAMES {
            let err = call(&f.bridge, name, &[ScriptValue::Int(0)]).unwrap_err();
            assert!(matches!(err, BridgeError::Unbound(_)), "{} should be unbound", name);
        }
        assert!(f.gate.is_open());
    }
}
