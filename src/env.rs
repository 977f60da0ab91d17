use crate::storage::FileStorage;

/// Mutable state shared by every command of a console session.
///
/// - `storage`: the live object store.
/// - `help_topics`: `(name, description)` of every registered command, for `help`.
/// - `should_exit`: set by `quit`/`EOF`; the read loop checks it after each line.
#[derive(Debug)]
pub struct Environment {
    pub storage: FileStorage,
    pub help_topics: Vec<(&'static str, &'static str)>,
    pub should_exit: bool,
}

impl Environment {
    pub fn new(storage: FileStorage) -> Self {
        Self {
            storage,
            help_topics: Vec::new(),
            should_exit: false,
        }
    }

    /// Description of a registered command.
    pub fn help_for(&self, name: &str) -> Option<&'static str> {
        self.help_topics
            .iter()
            .find(|(topic, _)| *topic == name)
            .map(|(_, description)| *description)
    }
}
