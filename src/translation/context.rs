//! Rolling per-speaker translation context.
//!
//! Context-capable engines translate better when shown the last few
//! exchanges. Each speaker gets an isolated ring of recent source/target
//! pairs so one speaker's phrasing never bleeds into another's context;
//! unattributed segments share a separate ring.

use crate::config::ContextConfig;
use std::collections::{HashMap, VecDeque};

/// Recent translation pairs, partitioned by speaker.
pub struct ContextBuffers {
    per_speaker: HashMap<u32, VecDeque<(String, String)>>,
    unattributed: VecDeque<(String, String)>,
    config: ContextConfig,
    source_label: String,
    target_label: String,
}

impl ContextBuffers {
    pub fn new(config: ContextConfig, source_lang: &str, target_lang: &str) -> Self {
        Self {
            per_speaker: HashMap::new(),
            unattributed: VecDeque::new(),
            config,
            source_label: source_lang.to_uppercase(),
            target_label: target_lang.to_uppercase(),
        }
    }

    /// Records one completed translation for the given speaker.
    pub fn push(&mut self, speaker_id: Option<u32>, source: &str, target: &str) {
        let buffer = match speaker_id {
            Some(id) => self.per_speaker.entry(id).or_default(),
            None => &mut self.unattributed,
        };
        if buffer.len() >= self.config.buffer_size {
            buffer.pop_front();
        }
        buffer.push_back((source.to_string(), target.to_string()));
    }

    /// Builds the context string for the next translation by this speaker.
    ///
    /// Pairs are selected newest-first until the length bound is reached,
    /// then re-ordered chronologically: recency decides what fits, but the
    /// engine reads the conversation in order. Returns `None` when there is
    /// no usable context.
    pub fn build(&self, speaker_id: Option<u32>) -> Option<String> {
        if !self.config.include_source && !self.config.include_target {
            return None;
        }

        let buffer = match speaker_id {
            Some(id) => self.per_speaker.get(&id)?,
            None => &self.unattributed,
        };
        if buffer.is_empty() {
            return None;
        }

        let mut selected: Vec<String> = Vec::new();
        let mut length = 0usize;
        for (source, target) in buffer.iter().rev() {
            let part = self.format_pair(source, target);
            let cost = part.chars().count() + if selected.is_empty() { 0 } else { 4 };
            if length + cost > self.config.max_context_length && !selected.is_empty() {
                break;
            }
            length += cost;
            selected.push(part);
            if length >= self.config.max_context_length {
                break;
            }
        }

        selected.reverse();
        Some(selected.join(" || "))
    }

    fn format_pair(&self, source: &str, target: &str) -> String {
        let mut pieces = Vec::with_capacity(2);
        if self.config.include_source {
            pieces.push(format!("{}: {}", self.source_label, source));
        }
        if self.config.include_target {
            pieces.push(format!("{}: {}", self.target_label, target));
        }
        pieces.join(" | ")
    }

    /// Drops the context of one speaker, or the unattributed ring.
    pub fn clear(&mut self, speaker_id: Option<u32>) {
        match speaker_id {
            Some(id) => {
                self.per_speaker.remove(&id);
            }
            None => self.unattributed.clear(),
        }
    }

    pub fn speaker_count(&self) -> usize {
        self.per_speaker.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers() -> ContextBuffers {
        ContextBuffers::new(ContextConfig::default(), "en", "vi")
    }

    #[test]
    fn test_empty_context_is_none() {
        let b = buffers();
        assert_eq!(b.build(Some(1)), None);
        assert_eq!(b.build(None), None);
    }

    #[test]
    fn test_pair_format() {
        let mut b = buffers();
        b.push(Some(1), "hello", "xin chào");
        assert_eq!(b.build(Some(1)).as_deref(), Some("EN: hello | VI: xin chào"));
    }

    #[test]
    fn test_pairs_join_in_chronological_order() {
        let mut b = buffers();
        b.push(Some(1), "one", "một");
        b.push(Some(1), "two", "hai");
        assert_eq!(
            b.build(Some(1)).as_deref(),
            Some("EN: one | VI: một || EN: two | VI: hai")
        );
    }

    #[test]
    fn test_speakers_are_isolated() {
        let mut b = buffers();
        b.push(Some(1), "apple", "táo");
        b.push(Some(2), "orange", "cam");

        let ctx1 = b.build(Some(1)).unwrap();
        let ctx2 = b.build(Some(2)).unwrap();
        assert!(ctx1.contains("apple") && !ctx1.contains("orange"));
        assert!(ctx2.contains("orange") && !ctx2.contains("apple"));
    }

    #[test]
    fn test_unattributed_ring_is_separate() {
        let mut b = buffers();
        b.push(None, "floating", "trôi");
        b.push(Some(1), "anchored", "neo");

        assert!(!b.build(None).unwrap().contains("anchored"));
        assert!(!b.build(Some(1)).unwrap().contains("floating"));
    }

    #[test]
    fn test_ring_capacity_drops_oldest() {
        let config = ContextConfig {
            buffer_size: 2,
            max_context_length: 1000,
            ..ContextConfig::default()
        };
        let mut b = ContextBuffers::new(config, "en", "vi");
        b.push(Some(1), "one", "một");
        b.push(Some(1), "two", "hai");
        b.push(Some(1), "three", "ba");

        let ctx = b.build(Some(1)).unwrap();
        assert!(!ctx.contains("one"));
        assert!(ctx.contains("two") && ctx.contains("three"));
    }

    #[test]
    fn test_length_bound_prefers_newest() {
        let config = ContextConfig {
            buffer_size: 5,
            max_context_length: 40,
            ..ContextConfig::default()
        };
        let mut b = ContextBuffers::new(config, "en", "vi");
        b.push(Some(1), "a rather long early sentence", "bản dịch dài");
        b.push(Some(1), "newest", "mới nhất");

        let ctx = b.build(Some(1)).unwrap();
        assert!(ctx.contains("newest"), "newest pair must survive the bound");
        assert!(!ctx.contains("early"), "older pair should not fit");
    }

    #[test]
    fn test_target_only_context() {
        let config = ContextConfig {
            include_source: false,
            ..ContextConfig::default()
        };
        let mut b = ContextBuffers::new(config, "en", "vi");
        b.push(Some(1), "hello", "xin chào");
        assert_eq!(b.build(Some(1)).as_deref(), Some("VI: xin chào"));
    }

    #[test]
    fn test_both_parts_disabled_yields_none() {
        let config = ContextConfig {
            include_source: false,
            include_target: false,
            ..ContextConfig::default()
        };
        let mut b = ContextBuffers::new(config, "en", "vi");
        b.push(Some(1), "hello", "xin chào");
        assert_eq!(b.build(Some(1)), None);
    }

    #[test]
    fn test_clear_single_speaker() {
        let mut b = buffers();
        b.push(Some(1), "a", "1");
        b.push(Some(2), "b", "2");
        b.clear(Some(1));
        assert_eq!(b.build(Some(1)), None);
        assert!(b.build(Some(2)).is_some());
    }
}
