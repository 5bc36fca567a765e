//! Most-recent message buffer with history replace semantics.

use std::collections::VecDeque;

use crate::message::Message;

/// Per-room message buffer. History replays replace the whole buffer;
/// single messages append, dropping the oldest entries over the cap.
#[derive(Debug)]
pub(crate) struct MessageBuffer {
    cap: Option<usize>,
    items: VecDeque<Message>,
}

impl MessageBuffer {
    pub(crate) fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            items: VecDeque::new(),
        }
    }

    pub(crate) fn append(&mut self, message: Message) {
        self.items.push_back(message);
        if let Some(cap) = self.cap {
            while self.items.len() > cap {
                self.items.pop_front();
            }
        }
    }

    pub(crate) fn replace(&mut self, messages: Vec<Message>) {
        self.items = messages.into_iter().collect();
        if let Some(cap) = self.cap {
            while self.items.len() > cap {
                self.items.pop_front();
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub(crate) fn snapshot(&self) -> Vec<Message> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;

    fn message(body: &str) -> Message {
        Message {
            id: None,
            body: body.to_string(),
            sender_name: "test".to_string(),
            sender_id: None,
            timestamp: 0,
            room_key: None,
            kind: MessageKind::Ordinary,
        }
    }

    fn bodies(buffer: &MessageBuffer) -> Vec<String> {
        buffer.snapshot().into_iter().map(|m| m.body).collect()
    }

    #[test]
    fn test_append_keeps_most_recent_up_to_cap() {
        // given:
        let mut buffer = MessageBuffer::new(Some(3));

        // when:
        for body in ["a", "b", "c", "d"] {
            buffer.append(message(body));
        }

        // then:
        assert_eq!(bodies(&buffer), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_append_without_cap_keeps_everything() {
        // given:
        let mut buffer = MessageBuffer::new(None);

        // when:
        for body in ["a", "b", "c", "d"] {
            buffer.append(message(body));
        }

        // then:
        assert_eq!(bodies(&buffer), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_replace_discards_prior_entries() {
        // given:
        let mut buffer = MessageBuffer::new(Some(10));
        buffer.append(message("old"));

        // when:
        buffer.replace(vec![message("h1"), message("h2")]);

        // then:
        assert_eq!(bodies(&buffer), vec!["h1", "h2"]);
    }

    #[test]
    fn test_replace_over_cap_keeps_the_tail() {
        // given: history longer than the cap
        let mut buffer = MessageBuffer::new(Some(2));

        // when:
        buffer.replace(vec![message("h1"), message("h2"), message("h3")]);

        // then: the most recent entries survive
        assert_eq!(bodies(&buffer), vec!["h2", "h3"]);
    }

    #[test]
    fn test_append_after_replace_appends_to_history() {
        // given:
        let mut buffer = MessageBuffer::new(Some(10));
        buffer.replace(vec![message("h1"), message("h2")]);

        // when:
        buffer.append(message("live"));

        // then:
        assert_eq!(bodies(&buffer), vec!["h1", "h2", "live"]);
    }

    #[test]
    fn test_clear_empties_the_buffer() {
        // given:
        let mut buffer = MessageBuffer::new(None);
        buffer.append(message("a"));

        // when:
        buffer.clear();

        // then:
        assert!(buffer.snapshot().is_empty());
    }
}
