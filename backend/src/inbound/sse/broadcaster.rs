//! Fan-out of newly created incidents to every open live-feed connection.

use std::sync::{Arc, Mutex, PoisonError};

use actix_web::web::Bytes;
use tracing::{debug, error, warn};

use crate::domain::Incident;
use crate::domain::ports::IncidentNotifier;

use super::registry::SubscriberRegistry;
use super::stream::incident_frame;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers the frame was queued for.
    pub delivered: usize,
    /// Subscribers removed because their connection was closed or backed up.
    pub evicted: usize,
}

/// Writes incident events to every registered subscriber.
///
/// Broadcasts hold a sequencing lock so every subscriber sees events in
/// invocation order; registration only contends on the registry's own lock.
#[derive(Debug)]
pub struct IncidentBroadcaster {
    registry: Arc<SubscriberRegistry>,
    sequence: Mutex<()>,
}

impl IncidentBroadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self {
            registry,
            sequence: Mutex::new(()),
        }
    }

    /// Serialise `incident` once and queue it for every subscriber.
    pub fn broadcast(&self, incident: &Incident) -> BroadcastReport {
        match incident_frame(incident) {
            Ok(frame) => self.broadcast_frame(frame),
            Err(error) => {
                error!(%error, incident_id = %incident.id, "failed to serialise incident for live feed");
                BroadcastReport::default()
            }
        }
    }

    /// Queue a pre-encoded frame for every subscriber in a registry snapshot.
    ///
    /// A subscriber that cannot accept the frame is evicted; the others are
    /// unaffected.
    pub fn broadcast_frame(&self, frame: Bytes) -> BroadcastReport {
        let _sequence = self
            .sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut report = BroadcastReport::default();
        for subscriber in self.registry.snapshot() {
            match subscriber.try_deliver(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    if self.registry.unregister(subscriber.id()) {
                        warn!(subscriber_id = %subscriber.id(), %reason, "evicting live feed subscriber");
                        report.evicted += 1;
                    }
                }
            }
        }
        report
    }
}

impl IncidentNotifier for IncidentBroadcaster {
    fn incident_created(&self, incident: &Incident) {
        let report = self.broadcast(incident);
        debug!(
            incident_id = %incident.id,
            delivered = report.delivered,
            evicted = report.evicted,
            "incident broadcast"
        );
    }
}

#[cfg(test)]
mod tests {
    //! Fan-out, eviction and ordering guarantees.
    use super::*;
    use crate::inbound::sse::registry::{Subscriber, SubscriberInbox};
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> Arc<SubscriberRegistry> {
        Arc::new(SubscriberRegistry::new())
    }

    fn join(registry: &SubscriberRegistry, buffer: usize) -> (Subscriber, SubscriberInbox) {
        let (subscriber, inbox) = Subscriber::channel(buffer);
        registry
            .register(subscriber.clone())
            .expect("registry accepts subscriber");
        (subscriber, inbox)
    }

    fn drain(inbox: &mut SubscriberInbox) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while let Ok(frame) = inbox.receiver.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(7)]
    fn every_subscriber_gets_exactly_one_frame(
        registry: Arc<SubscriberRegistry>,
        #[case] count: usize,
    ) {
        let mut inboxes: Vec<_> = (0..count).map(|_| join(&registry, 4).1).collect();
        let broadcaster = IncidentBroadcaster::new(Arc::clone(&registry));

        let report = broadcaster.broadcast_frame(Bytes::from_static(b"data: 1\n\n"));

        assert_eq!(
            report,
            BroadcastReport {
                delivered: count,
                evicted: 0
            }
        );
        for inbox in &mut inboxes {
            assert_eq!(drain(inbox), vec![Bytes::from_static(b"data: 1\n\n")]);
        }
    }

    #[rstest]
    fn closed_subscriber_is_evicted_without_affecting_others(registry: Arc<SubscriberRegistry>) {
        let (_gone, gone_inbox) = join(&registry, 4);
        let (_alive, mut alive_inbox) = join(&registry, 4);
        drop(gone_inbox);
        let broadcaster = IncidentBroadcaster::new(Arc::clone(&registry));

        let report = broadcaster.broadcast_frame(Bytes::from_static(b"data: x\n\n"));

        assert_eq!(
            report,
            BroadcastReport {
                delivered: 1,
                evicted: 1
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(drain(&mut alive_inbox).len(), 1);
    }

    #[rstest]
    fn backed_up_subscriber_is_evicted(registry: Arc<SubscriberRegistry>) {
        let (slow, mut slow_inbox) = join(&registry, 1);
        let broadcaster = IncidentBroadcaster::new(Arc::clone(&registry));

        broadcaster.broadcast_frame(Bytes::from_static(b"data: 1\n\n"));
        let report = broadcaster.broadcast_frame(Bytes::from_static(b"data: 2\n\n"));

        assert_eq!(report.evicted, 1);
        assert!(!registry.contains(slow.id()));
        assert_eq!(drain(&mut slow_inbox), vec![Bytes::from_static(b"data: 1\n\n")]);
    }

    #[rstest]
    fn unregistered_subscriber_receives_nothing_later(registry: Arc<SubscriberRegistry>) {
        let (leaving, mut leaving_inbox) = join(&registry, 4);
        let (_staying, mut staying_inbox) = join(&registry, 4);
        let broadcaster = IncidentBroadcaster::new(Arc::clone(&registry));

        registry.unregister(leaving.id());
        let report = broadcaster.broadcast_frame(Bytes::from_static(b"data: x\n\n"));

        assert_eq!(report.delivered, 1);
        assert!(drain(&mut leaving_inbox).is_empty());
        assert_eq!(drain(&mut staying_inbox).len(), 1);
    }

    #[rstest]
    fn concurrent_unregistration_is_safe(registry: Arc<SubscriberRegistry>) {
        const ROUNDS: usize = 200;
        let stayers: Vec<_> = (0..8).map(|_| join(&registry, ROUNDS)).collect();
        let leavers: Vec<_> = (0..8).map(|_| join(&registry, ROUNDS)).collect();
        let broadcaster = Arc::new(IncidentBroadcaster::new(Arc::clone(&registry)));

        let sender = {
            let broadcaster = Arc::clone(&broadcaster);
            std::thread::spawn(move || {
                for round in 0..ROUNDS {
                    broadcaster.broadcast_frame(Bytes::from(format!("data: {round}\n\n")));
                }
            })
        };
        let leaver_ids: Vec<_> = leavers.iter().map(|(subscriber, _)| subscriber.id()).collect();
        let remover = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for id in leaver_ids {
                    registry.unregister(id);
                }
            })
        };
        sender.join().expect("broadcast thread");
        remover.join().expect("unregister thread");

        assert_eq!(registry.len(), stayers.len());
        for (_, mut inbox) in stayers {
            let frames = drain(&mut inbox);
            let expected: Vec<_> = (0..ROUNDS)
                .map(|round| Bytes::from(format!("data: {round}\n\n")))
                .collect();
            assert_eq!(frames, expected);
        }
        for (_, mut inbox) in leavers {
            let before = drain(&mut inbox).len();
            broadcaster.broadcast_frame(Bytes::from_static(b"data: late\n\n"));
            assert!(before <= ROUNDS);
            assert!(drain(&mut inbox).is_empty());
        }
    }
}
