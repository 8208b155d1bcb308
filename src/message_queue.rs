use std::sync::{Mutex, PoisonError, RwLock};

use futures::channel::oneshot;

/// A message queue with persistent history that can be subscribed to.
///
/// Every message has a cursor, its position in the history. Subscribers ask
/// for everything after a cursor they have already seen, so a subscriber that
/// lost a message can ask for it again until it is acknowledged.
pub struct MessageQueue<T> {
    messages: RwLock<History<T>>,
    message_listeners: Mutex<Vec<Listener<T>>>,
}

struct History<T> {
    /// Cursor of the oldest retained message.
    first: u32,
    retained: Vec<T>,
}

impl<T> History<T> {
    fn end(&self) -> u32 {
        self.first + self.retained.len() as u32
    }
}

impl<T: Clone> Default for MessageQueue<T> {
    fn default() -> Self {
        MessageQueue::new()
    }
}

impl<T: Clone> MessageQueue<T> {
    pub fn new() -> MessageQueue<T> {
        MessageQueue {
            messages: RwLock::new(History {
                first: 0,
                retained: Vec::new(),
            }),
            message_listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn push_messages(&self, new_messages: &[T]) {
        let mut message_listeners = self
            .message_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
        messages.retained.extend_from_slice(new_messages);

        let mut remaining_listeners = Vec::new();

        for listener in message_listeners.drain(..) {
            match fire_listener_if_ready(&messages, listener) {
                Ok(_) => {}
                Err(listener) => remaining_listeners.push(listener),
            }
        }

        *message_listeners = remaining_listeners;
    }

    /// Subscribe to any messages occurring after the given message cursor.
    ///
    /// Messages that were already acknowledged are not sent again; the
    /// receiver gets whatever is still retained.
    pub fn subscribe(&self, cursor: u32) -> oneshot::Receiver<(u32, Vec<T>)> {
        let (sender, receiver) = oneshot::channel();

        let listener = {
            let listener = Listener { sender, cursor };

            let messages = self.messages.read().unwrap_or_else(PoisonError::into_inner);

            match fire_listener_if_ready(&messages, listener) {
                Ok(_) => return receiver,
                Err(listener) => listener,
            }
        };

        let mut message_listeners = self
            .message_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        message_listeners.push(listener);

        receiver
    }

    /// Subscribe to any messages being pushed into the queue.
    ///
    /// This method is only useful in tests. Non-test code should use subscribe
    /// instead.
    #[cfg(test)]
    pub fn subscribe_any(&self) -> oneshot::Receiver<(u32, Vec<T>)> {
        self.subscribe(self.cursor())
    }

    /// Drops every message up to `cursor`. Called once delivery of those
    /// messages has been confirmed.
    pub fn acknowledge(&self, cursor: u32) {
        let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);

        let cursor = cursor.min(messages.end());
        if cursor <= messages.first {
            return;
        }

        let count = (cursor - messages.first) as usize;
        messages.retained.drain(..count);
        messages.first = cursor;
    }

    /// Cursor of the oldest message that can still be replayed.
    pub fn first_cursor(&self) -> u32 {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .first
    }

    pub fn cursor(&self) -> u32 {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .end()
    }
}

struct Listener<T> {
    sender: oneshot::Sender<(u32, Vec<T>)>,
    cursor: u32,
}

fn fire_listener_if_ready<T: Clone>(
    messages: &History<T>,
    listener: Listener<T>,
) -> Result<(), Listener<T>> {
    let current_cursor = messages.end();

    if listener.cursor < current_cursor {
        let start = listener.cursor.saturating_sub(messages.first) as usize;
        let new_messages = messages.retained[start..].to_vec();
        let _ = listener.sender.send((current_cursor, new_messages));
        Ok(())
    } else {
        Err(listener)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use futures::executor::block_on;

    #[test]
    fn subscribe_replays_history() {
        let queue = MessageQueue::new();
        queue.push_messages(&["a", "b", "c"]);

        let (cursor, messages) = block_on(queue.subscribe(1)).unwrap();
        assert_eq!(cursor, 3);
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn subscribers_wait_for_new_messages() {
        let queue = MessageQueue::new();
        queue.push_messages(&["a"]);

        let receiver = queue.subscribe_any();
        queue.push_messages(&["b"]);

        let (cursor, messages) = block_on(receiver).unwrap();
        assert_eq!(cursor, 2);
        assert_eq!(messages, vec!["b"]);
    }

    #[test]
    fn acknowledged_messages_are_dropped() {
        let queue = MessageQueue::new();
        queue.push_messages(&["a", "b", "c"]);
        queue.acknowledge(2);

        assert_eq!(queue.first_cursor(), 2);
        assert_eq!(queue.cursor(), 3);

        let (_, messages) = block_on(queue.subscribe(0)).unwrap();
        assert_eq!(messages, vec!["c"]);

        queue.acknowledge(10);
        assert_eq!(queue.first_cursor(), 3);
    }
}
