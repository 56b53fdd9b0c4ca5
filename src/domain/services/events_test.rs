use anyhow::Result;
use tokio::sync::mpsc;

use super::EventsService;
use crate::domain::models::Event;

#[tokio::test]
async fn it_reads_input_lines() -> Result<()> {
    let (_tx, rx) = mpsc::unbounded_channel::<Event>();
    let input: &[u8] = b"make a cube\n/quit\n";
    let mut events = EventsService::new(input, rx);

    assert_eq!(events.next().await?, Event::Input("make a cube".to_string()));
    assert_eq!(events.next().await?, Event::Input("/quit".to_string()));
    assert_eq!(events.next().await?, Event::InputClosed());
    return Ok(());
}

#[tokio::test]
async fn it_reports_closed_input_once() -> Result<()> {
    let (_tx, rx) = mpsc::unbounded_channel::<Event>();
    let input: &[u8] = b"";
    let mut events = EventsService::new(input, rx);

    assert_eq!(events.next().await?, Event::InputClosed());
    assert_eq!(events.next().await?, Event::UITick());
    return Ok(());
}

#[tokio::test]
async fn it_forwards_channel_events() -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let input: &[u8] = b"";
    let mut events = EventsService::new(input, rx);
    assert_eq!(events.next().await?, Event::InputClosed());

    tx.send(Event::UITick())?;
    tx.send(Event::Input("queued".to_string()))?;
    assert_eq!(events.next().await?, Event::UITick());
    assert_eq!(events.next().await?, Event::Input("queued".to_string()));
    return Ok(());
}
