//! Transcript file output stage.

use crate::config::TranscriptConfig;
use crate::pipeline::error::StageError;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::TranscriptSegment;
use crate::transcript::merger::{TranscriptLine, TranscriptMerger};
use chrono::{DateTime, Local};
use crossbeam_channel::Receiver;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Receive timeout for the writer's poll loop. Longer than the other stages
/// since transcript lines arrive at sentence pace, and short enough that
/// idle flushes stay timely.
const POLL_MS: u64 = 500;

/// Formats one merged line for the transcript file.
///
/// The translated text goes on the main line; the pre-translation original
/// follows on an indented line aligned under the text column.
pub fn format_line(line: &TranscriptLine, include_original: bool) -> String {
    let time: DateTime<Local> = line.timestamp.into();
    let time_str = format!("[{}]", time.format("%H:%M:%S"));
    let speaker_str = match line.speaker_id {
        Some(id) => format!("[Speaker {}]", id),
        None => "[Unknown]".to_string(),
    };

    let mut out = format!("{} {}: {}\n", time_str, speaker_str, line.text);
    if include_original && !line.original.is_empty() {
        let indent = " ".repeat(time_str.len() + speaker_str.len() + 1);
        out.push_str(&format!("{}  (Orig: {})\n", indent, line.original));
    }
    out
}

/// Tails the transcript channel, merges segments into lines, and appends
/// them to a timestamped file.
///
/// The file is flushed after every line so a crash loses at most the open
/// line, and `tail -f` shows the conversation live.
pub struct TranscriptWriter {
    input: Receiver<TranscriptSegment>,
    merger: TranscriptMerger,
    config: TranscriptConfig,
    file: Option<BufWriter<File>>,
    path: PathBuf,
}

impl TranscriptWriter {
    pub fn new(config: TranscriptConfig, input: Receiver<TranscriptSegment>) -> Self {
        let timeout = Duration::from_secs_f32(config.speaker_timeout_secs);
        Self {
            input,
            merger: TranscriptMerger::new(config.merge_segments, timeout),
            config,
            file: None,
            path: PathBuf::new(),
        }
    }

    /// Path of the transcript file, valid after `setup`.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn write_line(&mut self, line: &TranscriptLine) -> Result<(), StageError> {
        let text = format_line(line, self.config.include_original);
        if let Some(file) = &mut self.file {
            file.write_all(text.as_bytes())
                .and_then(|()| file.flush())
                .map_err(|e| StageError::Fatal(format!("transcript write failed: {}", e)))?;
        }
        Ok(())
    }
}

impl Stage for TranscriptWriter {
    fn name(&self) -> &'static str {
        "transcript"
    }

    fn setup(&mut self) -> Result<(), StageError> {
        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            StageError::Fatal(format!(
                "cannot create transcript dir {}: {}",
                self.config.output_dir.display(),
                e
            ))
        })?;

        let name = Local::now().format("transcript_%Y%m%d_%H%M%S.txt").to_string();
        self.path = self.config.output_dir.join(name);
        let file = File::create(&self.path)
            .map_err(|e| StageError::Fatal(format!("cannot create transcript file: {}", e)))?;
        let mut file = BufWriter::new(file);

        let header = format!(
            "=== Conversation Transcript ===\nStarted: {}\n\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        file.write_all(header.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| StageError::Fatal(format!("transcript write failed: {}", e)))?;

        self.file = Some(file);
        eprintln!("voxlate: writing transcript to {}", self.path.display());
        Ok(())
    }

    fn step(&mut self) -> Result<(), StageError> {
        if let Some(line) = self.merger.poll() {
            self.write_line(&line)?;
        }

        let segment = match self.input.recv_timeout(Duration::from_millis(POLL_MS)) {
            Ok(segment) => segment,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => return Ok(()),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                return Err(StageError::Fatal("input channel closed".to_string()));
            }
        };

        for line in self.merger.push(segment) {
            self.write_line(&line)?;
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        if let Some(line) = self.merger.flush() {
            let _ = self.write_line(&line);
        }
        if let Some(file) = &mut self.file {
            let footer = format!(
                "\nEnded: {}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            let _ = file.write_all(footer.as_bytes());
            let _ = file.flush();
        }
    }
}
