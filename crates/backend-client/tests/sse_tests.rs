//! Event stream decoding over chunked input.

use backend_client::{decode_events, ApiError};
use bytes::Bytes;
use field_common::EntityKind;
use futures::{stream, StreamExt};
use serde_json::json;
use test_utils::sse_frame;

fn chunks(parts: Vec<String>) -> impl futures::Stream<Item = Result<Bytes, ApiError>> + Unpin {
    stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
}

#[tokio::test]
async fn test_malformed_event_does_not_end_stream() {
    let good = sse_frame("season.update", json!({"field_id": 2, "season_id": "20240315"}));
    let (head, tail) = good.split_at(10);
    let input = chunks(vec!["data: {not json}\n\n".to_string(), head.to_string(), tail.to_string()]);

    let events: Vec<_> = decode_events(input).collect().await;

    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Err(ApiError::Payload(_))));
    let update = events[1].as_ref().unwrap();
    assert_eq!(update.entity, EntityKind::Season);
    assert!(update.is_update());
}

#[tokio::test]
async fn test_transport_error_is_yielded() {
    let input = stream::iter(vec![
        Ok(Bytes::from_static(b"data: {\"type\": \"user.update\", \"payload\": {}}\n\n")),
        Err(ApiError::Transport("connection reset".into())),
    ]);

    let events: Vec<_> = decode_events(input).collect().await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].as_ref().unwrap().entity, EntityKind::User);
    assert!(matches!(events[1], Err(ApiError::Transport(_))));
}

#[tokio::test]
async fn test_unterminated_message_is_dropped() {
    let events: Vec<_> = decode_events(chunks(vec!["data: {\"type\": \"field.create\"}\n".to_string()]))
        .collect()
        .await;
    assert!(events.is_empty());
}
