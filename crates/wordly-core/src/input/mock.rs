//! Scripted input source for host tests.

use super::{InputProvider, KeyEvent};

pub struct ScriptedInput {
    events: heapless::Deque<KeyEvent, 64>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self {
            events: heapless::Deque::new(),
        }
    }

    pub fn push(&mut self, event: KeyEvent) {
        let _ = self.events.push_back(event);
    }

    pub fn push_key(&mut self, key: super::Key) {
        self.push(KeyEvent {
            key,
            usage: 0,
            modifiers: 0,
        });
    }

    pub fn type_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.push_key(super::Key::Char(ch));
        }
    }
}

impl Default for ScriptedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputProvider for ScriptedInput {
    type Error = core::convert::Infallible;

    fn poll_event(&mut self) -> Result<Option<KeyEvent>, Self::Error> {
        Ok(self.events.pop_front())
    }
}
