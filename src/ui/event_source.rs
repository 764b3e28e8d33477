use std::io::{self, BufRead};

use anyhow::Result;

use crate::{domain::events::AppEvent, usecases::contracts::AppEventSource};

/// Reads one command per line. End of input means quit.
pub struct LineEventSource<R> {
    reader: R,
}

impl LineEventSource<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> LineEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> AppEventSource for LineEventSource<R> {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(Some(AppEvent::QuitRequested));
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(AppEvent::Line(line.to_owned())))
    }
}

#[cfg(test)]
pub struct MockEventSource {
    queue: std::collections::VecDeque<AppEvent>,
}

#[cfg(test)]
impl MockEventSource {
    pub fn from(events: Vec<AppEvent>) -> Self {
        Self {
            queue: events.into(),
        }
    }
}

#[cfg(test)]
impl AppEventSource for MockEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        Ok(self.queue.pop_front())
    }
}
