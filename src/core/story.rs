/// A data-driven reference runtime: a prebuilt passage graph loaded from
/// RON. Used by the preview tool, the demo and the tests.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::runtime::{ExternalFn, ScriptError, ScriptRuntime};
use crate::schema::line::Choice;
use crate::schema::value::ScriptValue;

/// A bridge call made while a line is evaluated. The result is stored in
/// `store` when given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCall {
    pub hook: String,
    #[serde(default)]
    pub args: Vec<ScriptValue>,
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryLine {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub calls: Vec<StoryCall>,
    /// Only shown when this variable is truthy.
    #[serde(default)]
    pub when: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryChoice {
    pub text: String,
    pub goto: String,
    #[serde(default)]
    pub when: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Passage {
    #[serde(default)]
    pub lines: Vec<StoryLine>,
    /// Divert taken once the lines run out.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub choices: Vec<StoryChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryGraph {
    pub start: String,
    pub passages: FxHashMap<String, Passage>,
    #[serde(default)]
    pub variables: FxHashMap<String, ScriptValue>,
}

pub struct ScriptedStory {
    graph: StoryGraph,
    passage: String,
    cursor: usize,
    variables: FxHashMap<String, ScriptValue>,
    functions: FxHashMap<String, ExternalFn>,
    current_text: String,
    current_tags: Vec<String>,
}

impl ScriptedStory {
    /// Build a story, checking that every divert target exists.
    pub fn new(graph: StoryGraph) -> Result<Self, ScriptError> {
        let known = |name: &str| graph.passages.contains_key(name);
        if !known(&graph.start) {
            return Err(ScriptError::UnknownPassage(graph.start.clone()));
        }
        for passage in graph.passages.values() {
            let targets = passage
                .next
                .iter()
                .chain(passage.choices.iter().map(|c| &c.goto));
            for target in targets {
                if !known(target) {
                    return Err(ScriptError::UnknownPassage(target.clone()));
                }
            }
        }

        let mut story = Self {
            passage: graph.start.clone(),
            variables: graph.variables.clone(),
            graph,
            cursor: 0,
            functions: FxHashMap::default(),
            current_text: String::new(),
            current_tags: Vec::new(),
        };
        story.settle();
        Ok(story)
    }

    pub fn load_from_ron(path: &Path) -> Result<Self, ScriptError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Self, ScriptError> {
        let graph: StoryGraph = ron::from_str(input)?;
        Self::new(graph)
    }

    pub fn variable(&self, name: &str) -> Option<&ScriptValue> {
        self.variables.get(name)
    }

    pub fn current_passage(&self) -> &str {
        &self.passage
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn passage(&self) -> Option<&Passage> {
        self.graph.passages.get(&self.passage)
    }

    fn guard_passes(&self, when: &Option<String>) -> bool {
        match when {
            Some(var) => self.variables.get(var).is_some_and(ScriptValue::is_truthy),
            None => true,
        }
    }

    /// Skip guarded-out lines and follow diverts until a line is ready or
    /// the passage has nothing more to say.
    fn settle(&mut self) {
        let mut diverts = 0;
        loop {
            let Some(passage) = self.passage() else {
                return;
            };
            if let Some(line) = passage.lines.get(self.cursor) {
                if self.guard_passes(&line.when) {
                    return;
                }
                self.cursor += 1;
                continue;
            }
            match passage.next.clone() {
                Some(next) if diverts <= self.graph.passages.len() => {
                    self.passage = next;
                    self.cursor = 0;
                    diverts += 1;
                }
                _ => return,
            }
        }
    }

    fn visible_choices(&self) -> Vec<&StoryChoice> {
        match self.passage() {
            Some(passage) if !self.can_continue() => passage
                .choices
                .iter()
                .filter(|c| self.guard_passes(&c.when))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn run_call(&mut self, call: &StoryCall) -> Result<(), ScriptError> {
        let function = self
            .functions
            .get(&call.hook)
            .cloned()
            .ok_or_else(|| ScriptError::UnboundFunction(call.hook.clone()))?;
        let value = function(&call.args).map_err(|source| ScriptError::External {
            name: call.hook.clone(),
            source,
        })?;
        if let Some(var) = &call.store {
            self.variables.insert(var.clone(), value);
        }
        Ok(())
    }
}

impl ScriptRuntime for ScriptedStory {
    fn can_continue(&self) -> bool {
        self.passage()
            .is_some_and(|p| self.cursor < p.lines.len())
    }

    fn cont(&mut self) -> Result<String, ScriptError> {
        let line = self
            .passage()
            .and_then(|p| p.lines.get(self.cursor))
            .cloned()
            .ok_or(ScriptError::CannotContinue)?;
        self.cursor += 1;

        for call in &line.calls {
            self.run_call(call)?;
        }

        self.current_text = line.text;
        self.current_tags = line.tags;
        self.settle();
        Ok(self.current_text.clone())
    }

    fn current_text(&self) -> &str {
        &self.current_text
    }

    fn current_tags(&self) -> Vec<String> {
        self.current_tags.clone()
    }

    fn current_choices(&self) -> Vec<Choice> {
        self.visible_choices()
            .into_iter()
            .enumerate()
            .map(|(i, c)| Choice::new(i, c.text.clone()))
            .collect()
    }

    fn choose_choice_index(&mut self, index: usize) -> Result<(), ScriptError> {
        let choices = self.visible_choices();
        let target = choices
            .get(index)
            .map(|c| c.goto.clone())
            .ok_or(ScriptError::ChoiceOutOfRange {
                index,
                count: choices.len(),
            })?;
        self.passage = target;
        self.cursor = 0;
        self.current_tags.clear();
        self.settle();
        Ok(())
    }

    fn set_variable(&mut self, name: &str, value: ScriptValue) -> Result<(), ScriptError> {
        self.variables.insert(name.to_string(), value);
        self.settle();
        Ok(())
    }

    fn bind_external_function(&mut self, name: &str, function: ExternalFn) {
        self.functions.insert(name.to_string(), function);
    }

    fn unbind_external_function(&mut self, name: &str) {
        self.functions.remove(name);
    }
}
