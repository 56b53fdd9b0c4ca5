#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::Lines;
use tokio::sync::mpsc;
use tokio::time;

use crate::domain::models::Event;

/// Merges terminal input, worker results and a periodic tick into a single
/// stream of events for the loop.
pub struct EventsService<R> {
    input: Lines<R>,
    input_closed: bool,
    events: mpsc::UnboundedReceiver<Event>,
}

fn line_event(line: std::io::Result<Option<String>>) -> Event {
    match line {
        Ok(Some(text)) => return Event::Input(text),
        Ok(None) => return Event::InputClosed(),
        Err(err) => {
            tracing::error!(error = ?err, "Failed to read input");
            return Event::InputClosed();
        }
    }
}

impl<R: AsyncBufRead + Unpin> EventsService<R> {
    pub fn new(input: R, events: mpsc::UnboundedReceiver<Event>) -> EventsService<R> {
        return EventsService {
            input: input.lines(),
            input_closed: false,
            events,
        };
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            let evt = tokio::select! {
                event = self.events.recv() => event,
                line = self.input.next_line(), if !self.input_closed => Some(line_event(line)),
                _ = time::sleep(time::Duration::from_millis(100)) => Some(Event::UITick())
            };

            if let Some(Event::InputClosed()) = evt {
                self.input_closed = true;
            }

            if let Some(event) = evt {
                return Ok(event);
            }
        }
    }
}
