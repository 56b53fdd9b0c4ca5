use super::Session;
use crate::domain::models::Author;
use crate::domain::models::Message;

fn session_with(count: usize) -> Session {
    let mut session = Session::new("Chat 1");
    for idx in 0..count {
        session
            .messages
            .push(Message::new(Author::User, &format!("message {idx}")));
    }
    return session;
}

#[test]
fn it_creates_short_ids() {
    let id = Session::create_id();
    assert_eq!(id.len(), 13);
    assert_eq!(id.split('-').count(), 2);
    assert_ne!(id, Session::create_id());
}

#[test]
fn it_starts_empty() {
    let session = Session::new("Chat 1");
    assert_eq!(session.name, "Chat 1");
    assert!(session.messages.is_empty());
    assert_eq!(session.cursor, 0);
}

#[test]
fn it_moves_the_cursor_within_bounds() {
    let mut session = session_with(3);

    session.up();
    assert_eq!(session.cursor, 0);

    session.down();
    session.down();
    session.down();
    assert_eq!(session.cursor, 2);

    session.up();
    assert_eq!(session.cursor, 1);

    session.last();
    assert_eq!(session.cursor, 2);
}

#[test]
fn it_keeps_the_cursor_at_zero_when_empty() {
    let mut session = session_with(0);
    session.down();
    assert_eq!(session.cursor, 0);
    session.last();
    assert_eq!(session.cursor, 0);
}

#[test]
fn it_clamps_the_cursor() {
    let mut session = session_with(5);
    session.last();
    session.messages.truncate(2);
    session.clamp_cursor();
    assert_eq!(session.cursor, 1);
}
