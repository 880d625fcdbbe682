//! Server-sent event framing and the per-connection response stream.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::web::Bytes;
use futures_util::Stream;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::info;

use crate::domain::Incident;

use super::registry::{SubscriberInbox, SubscriberRegistry};

/// Comment frame sent while the feed is idle; `EventSource` ignores it.
pub const KEEPALIVE_FRAME: &[u8] = b": keepalive\n\n";

/// `retry:` frame telling browsers how long to wait before reconnecting.
pub fn retry_frame(delay: Duration) -> Bytes {
    Bytes::from(format!("retry: {}\n\n", delay.as_millis()))
}

/// `data:` frame carrying one incident as compact JSON.
///
/// Compact JSON never contains a raw newline, so a single `data:` line is
/// always a complete event.
pub fn incident_frame(incident: &Incident) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(incident)?;
    Ok(Bytes::from(format!("data: {json}\n\n")))
}

/// Body of one `GET /api/incidents/stream` response.
///
/// Yields the `retry:` preamble, then queued incident frames, then keepalive
/// comments whenever the keepalive timer fires. Dropping the stream (client
/// gone) unregisters the subscriber and stops the timer with it.
pub struct SubscriberStream {
    inbox: SubscriberInbox,
    registry: Arc<SubscriberRegistry>,
    keepalive: Interval,
    preamble: Option<Bytes>,
}

impl SubscriberStream {
    pub(crate) fn new(
        inbox: SubscriberInbox,
        registry: Arc<SubscriberRegistry>,
        keepalive_period: Duration,
        retry: Duration,
    ) -> Self {
        let period = keepalive_period.max(Duration::from_millis(1));
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            inbox,
            registry,
            keepalive,
            preamble: Some(retry_frame(retry)),
        }
    }
}

impl Stream for SubscriberStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(frame) = this.preamble.take() {
            return Poll::Ready(Some(Ok(frame)));
        }
        if this.inbox.state.is_closed() {
            return Poll::Ready(None);
        }

        match this.inbox.receiver.poll_recv(cx) {
            Poll::Ready(Some(frame)) => return Poll::Ready(Some(Ok(frame))),
            Poll::Ready(None) => return Poll::Ready(None),
            Poll::Pending => {}
        }

        this.keepalive
            .poll_tick(cx)
            .map(|_| Some(Ok(Bytes::from_static(KEEPALIVE_FRAME))))
    }
}

impl Drop for SubscriberStream {
    fn drop(&mut self) {
        let id = self.inbox.id();
        if self.registry.unregister(id) {
            info!(subscriber_id = %id, "live feed subscriber disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Framing and lifecycle of a single subscriber stream.
    use super::*;
    use crate::domain::{IncidentDraft, IncidentFields, IncidentId};
    use crate::inbound::sse::registry::Subscriber;
    use chrono::Utc;
    use futures_util::StreamExt;
    use rstest::rstest;

    const KEEPALIVE: Duration = Duration::from_secs(20);
    const RETRY: Duration = Duration::from_millis(1_500);

    fn open(registry: &Arc<SubscriberRegistry>) -> (Subscriber, SubscriberStream) {
        let (subscriber, inbox) = Subscriber::channel(8);
        registry
            .register(subscriber.clone())
            .expect("registry accepts subscriber");
        let stream = SubscriberStream::new(inbox, Arc::clone(registry), KEEPALIVE, RETRY);
        (subscriber, stream)
    }

    async fn next_frame(stream: &mut SubscriberStream) -> Option<Bytes> {
        stream.next().await.map(|item| match item {
            Ok(bytes) => bytes,
            Err(never) => match never {},
        })
    }

    #[rstest]
    fn retry_frame_uses_milliseconds() {
        assert_eq!(retry_frame(RETRY), Bytes::from_static(b"retry: 1500\n\n"));
    }

    #[rstest]
    fn incident_frame_is_single_data_line() {
        let draft = IncidentDraft::try_from_fields(IncidentFields {
            incident_type: Some("Fire".to_owned()),
            description: Some("line one\nline two".to_owned()),
            ..IncidentFields::default()
        })
        .expect("valid draft");
        let incident =
            Incident::from_draft(IncidentId::random(), draft, Vec::new(), None, Utc::now());

        let frame = incident_frame(&incident).expect("serializable");
        let text = std::str::from_utf8(&frame).expect("utf8");
        assert!(text.starts_with("data: {"));
        assert!(text.ends_with("}\n\n"));
        assert_eq!(text.matches('\n').count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn starts_with_retry_then_relays_frames() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (subscriber, mut stream) = open(&registry);
        subscriber
            .try_deliver(Bytes::from_static(b"data: {}\n\n"))
            .expect("queued");

        assert_eq!(next_frame(&mut stream).await, Some(retry_frame(RETRY)));
        assert_eq!(
            next_frame(&mut stream).await,
            Some(Bytes::from_static(b"data: {}\n\n"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn idle_stream_emits_keepalive_within_twice_the_period() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (_subscriber, mut stream) = open(&registry);
        next_frame(&mut stream).await;

        let mut previous = Instant::now();
        for _ in 0..3 {
            let frame = next_frame(&mut stream).await;
            assert_eq!(frame, Some(Bytes::from_static(KEEPALIVE_FRAME)));
            assert!(previous.elapsed() <= KEEPALIVE * 2);
            previous = Instant::now();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unregistering_ends_the_stream() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (subscriber, mut stream) = open(&registry);
        next_frame(&mut stream).await;

        registry.unregister(subscriber.id());
        assert_eq!(next_frame(&mut stream).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_stream_unregisters() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (subscriber, stream) = open(&registry);
        assert!(registry.contains(subscriber.id()));

        drop(stream);
        assert!(registry.is_empty());
        assert!(subscriber.is_closed());
    }
}
