//! Per-request trace: an explicit value threaded through the pipeline
//! instead of ambient diagnostic state, emitted once at request completion.

use std::time::Instant;

#[derive(Debug)]
pub struct RequestTrace {
    started: Instant,
    notes: Vec<String>,
}

impl RequestTrace {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            notes: Vec::new(),
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Emit the whole trace once and hand the notes to the response meta.
    pub fn finish(self) -> (Vec<String>, u64) {
        let elapsed = self.elapsed_ms();
        log::info!("request completed in {}ms: {}", elapsed, self.notes.join(" | "));
        (self.notes, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_accumulate_in_order() {
        let mut trace = RequestTrace::start();
        trace.note("intent normalized");
        trace.note("ladder step B");
        let (notes, _) = trace.finish();
        assert_eq!(notes, vec!["intent normalized", "ladder step B"]);
    }
}
