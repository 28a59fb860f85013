//! Run-scoped directory of named bounded channels.
//!
//! The registry is an explicitly constructed object passed by reference to
//! whatever wires the pipeline together; it lives exactly as long as one run.
//! It keeps a clone of each endpoint so a channel never disconnects while the
//! run is alive, and stages hold only the ends they were handed.

use crate::error::{Result, VoxlateError};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::any::Any;
use std::collections::HashMap;

/// Both ends of a named bounded channel.
///
/// Cloning is cheap; crossbeam channels are multi-producer multi-consumer.
pub struct Channel<T> {
    pub tx: Sender<T>,
    pub rx: Receiver<T>,
}

// Manual impl: endpoints clone for any payload, no `T: Clone` needed.
impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> Channel<T> {
    /// Creates a standalone bounded channel, outside any registry.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Sends a message, evicting the oldest queued message when full.
    ///
    /// This is the overflow policy for audio hops: a stalled consumer costs
    /// the stalest frames, never fresh ones, and the producer never blocks.
    pub fn send_drop_oldest(&self, msg: T) {
        while self.tx.is_full() {
            if self.rx.try_recv().is_err() {
                break;
            }
        }
        // Still racing with other producers; losing the race drops the new
        // message, which is acceptable for audio.
        let _ = self.tx.try_send(msg);
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// True when no messages are queued.
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(0)
    }
}

/// Named-channel directory scoped to one pipeline run.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bounded channel under `name`, or returns the existing one.
    ///
    /// Idempotent: a second `create` with the same name and payload type
    /// returns the already-registered channel (the capacity argument is
    /// ignored in that case). A second `create` with a different payload
    /// type is an error.
    pub fn create<T: Send + 'static>(&mut self, name: &str, capacity: usize) -> Result<Channel<T>> {
        if let Some(existing) = self.channels.get(name) {
            return existing
                .downcast_ref::<Channel<T>>()
                .cloned()
                .ok_or_else(|| VoxlateError::ChannelTypeMismatch {
                    name: name.to_string(),
                });
        }

        let (tx, rx) = bounded(capacity);
        let channel = Channel { tx, rx };
        self.channels
            .insert(name.to_string(), Box::new(channel.clone()));
        Ok(channel)
    }

    /// Looks up an existing channel by name.
    pub fn get<T: Send + 'static>(&self, name: &str) -> Result<Channel<T>> {
        let entry = self
            .channels
            .get(name)
            .ok_or_else(|| VoxlateError::ChannelNotFound {
                name: name.to_string(),
            })?;
        entry
            .downcast_ref::<Channel<T>>()
            .cloned()
            .ok_or_else(|| VoxlateError::ChannelTypeMismatch {
                name: name.to_string(),
            })
    }

    /// Convenience accessor for the producing end.
    pub fn sender<T: Send + 'static>(&self, name: &str) -> Result<Sender<T>> {
        Ok(self.get::<T>(name)?.tx)
    }

    /// Convenience accessor for the consuming end.
    pub fn receiver<T: Send + 'static>(&self, name: &str) -> Result<Receiver<T>> {
        Ok(self.get::<T>(name)?.rx)
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True when no channels are registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// True when a channel with this name exists (any payload type).
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }
}
