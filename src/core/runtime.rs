/// The narrative script runtime seam.
///
/// The runtime parses and stores the script graph; the dialogue core only
/// drives it through this trait.
use std::rc::Rc;
use thiserror::Error;

use crate::core::bridge::BridgeError;
use crate::schema::line::Choice;
use crate::schema::value::ScriptValue;

/// A named host function the script calls synchronously mid-line.
pub type ExternalFn = Rc<dyn Fn(&[ScriptValue]) -> Result<ScriptValue, BridgeError>>;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("external function '{0}' is not bound")]
    UnboundFunction(String),
    #[error("external function '{name}' failed: {source}")]
    External {
        name: String,
        #[source]
        source: BridgeError,
    },
    #[error("choice index {index} out of range ({count} choices)")]
    ChoiceOutOfRange { index: usize, count: usize },
    #[error("script cannot continue")]
    CannotContinue,
    #[error("unknown passage: {0}")]
    UnknownPassage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

pub trait ScriptRuntime {
    fn can_continue(&self) -> bool;
    /// Evaluate and return the next line of text. Bound external functions
    /// may be invoked during this call.
    fn cont(&mut self) -> Result<String, ScriptError>;
    /// Text of the most recently continued line.
    fn current_text(&self) -> &str;
    fn current_tags(&self) -> Vec<String>;
    fn current_choices(&self) -> Vec<Choice>;
    fn choose_choice_index(&mut self, index: usize) -> Result<(), ScriptError>;
    fn set_variable(&mut self, name: &str, value: ScriptValue) -> Result<(), ScriptError>;
    fn bind_external_function(&mut self, name: &str, function: ExternalFn);
    fn unbind_external_function(&mut self, name: &str);
}
