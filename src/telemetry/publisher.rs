//! Opportunistic delivery of queued events.
//!
//! At most one delivery is attempted per tick, and only when all gates are
//! open: an endpoint is configured, the network is up, no fade is running,
//! the queue has something in it, and the minimum interval since the previous
//! attempt has passed. Delivery is FIFO and at-least-once: a failed head stays
//! at the head and blocks everything behind it until it succeeds or overflow
//! evicts it.

use std::time::Duration;

use super::queue::EventQueue;
use crate::error::LampError;
use crate::transport::{RemoteCall, Request, Transport};

#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub min_interval: Duration,
    pub timeout: Duration,
}

pub struct PublishContext<'a> {
    pub uptime: Duration,
    pub network_up: bool,
    pub fade_active: bool,
    pub transport: &'a mut dyn Transport,
}

/// Result of a finished delivery attempt.
#[derive(Debug)]
pub enum Delivery {
    /// The record with this sequence number was accepted by the collector.
    Delivered { seq: u64, dequeued: bool },
    Failed(LampError),
}

pub struct EventPublisher {
    settings: PublisherSettings,
    call: RemoteCall,
    in_flight_seq: Option<u64>,
    last_attempt: Option<Duration>,
    delivered: u64,
    consecutive_failures: u32,
    debug_enabled: bool,
}

impl EventPublisher {
    pub fn new(settings: PublisherSettings, debug_enabled: bool) -> Self {
        Self {
            settings,
            call: RemoteCall::idle(),
            in_flight_seq: None,
            last_attempt: None,
            delivered: 0,
            consecutive_failures: 0,
            debug_enabled,
        }
    }

    pub fn tick(&mut self, queue: &mut EventQueue, ctx: &mut PublishContext<'_>) -> Option<Delivery> {
        if self.call.is_in_flight() {
            return self.complete(queue, ctx.uptime);
        }

        let Some(endpoint) = self.settings.endpoint.as_deref() else {
            return None;
        };
        if !ctx.network_up || ctx.fade_active {
            return None;
        }
        let Some(head) = queue.head() else {
            return None;
        };
        if let Some(last) = self.last_attempt
            && ctx.uptime.saturating_sub(last) < self.settings.min_interval
        {
            return None;
        }

        self.last_attempt = Some(ctx.uptime);
        let seq = head.seq;

        let body = match head.payload() {
            Ok(body) => body,
            Err(e) => {
                log_error!("Dropping event '{}': {}", head.event, e);
                queue.pop_if_head(seq);
                return None;
            }
        };

        if self.debug_enabled {
            log_debug!("Delivering event #{} '{}'", seq, head.event);
        }

        let request = Request::post_json(endpoint, body, self.settings.timeout)
            .with_bearer(self.settings.token.clone());
        self.call = RemoteCall::start(ctx.transport, request, ctx.uptime);
        self.in_flight_seq = Some(seq);

        self.complete(queue, ctx.uptime)
    }

    fn complete(&mut self, queue: &mut EventQueue, uptime: Duration) -> Option<Delivery> {
        self.call.poll(uptime);
        let result = self.call.take_result()?;
        let seq = self.in_flight_seq.take()?;

        match result {
            Ok(_) => {
                let dequeued = queue.pop_if_head(seq);
                self.delivered += 1;
                if self.consecutive_failures > 0 {
                    log_info!("Event delivery recovered after {} failures", self.consecutive_failures);
                    self.consecutive_failures = 0;
                }
                if self.debug_enabled && !dequeued {
                    log_debug!("Delivered event #{} was evicted while in flight", seq);
                }
                Some(Delivery::Delivered { seq, dequeued })
            }
            Err(e) => {
                let error = LampError::from(e);
                self.consecutive_failures += 1;
                if self.consecutive_failures == 1 {
                    log_warning!("{}", error);
                } else if self.debug_enabled {
                    log_debug!("{} ({} in a row)", error, self.consecutive_failures);
                }
                Some(Delivery::Failed(error))
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.endpoint.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.call.is_in_flight()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::telemetry::Snapshot;
    use crate::testing::ScriptedTransport;
    use crate::transport::Method;

    const ENDPOINT: &str = "http://collector.local/events";
    const SNAPSHOT: Snapshot = Snapshot {
        lights_on: true,
        brightness: 30,
        motion: false,
    };

    fn create_test_publisher(endpoint: Option<&str>) -> EventPublisher {
        EventPublisher::new(
            PublisherSettings {
                endpoint: endpoint.map(str::to_string),
                token: Some("s3cret".to_string()),
                min_interval: Duration::from_secs(1),
                timeout: Duration::from_secs(10),
            },
            false,
        )
    }

    struct Gates {
        uptime: Duration,
        network_up: bool,
        fade_active: bool,
    }

    impl Gates {
        fn open(uptime_ms: u64) -> Self {
            Self {
                uptime: Duration::from_millis(uptime_ms),
                network_up: true,
                fade_active: false,
            }
        }
    }

    fn tick(
        publisher: &mut EventPublisher,
        queue: &mut EventQueue,
        transport: &mut ScriptedTransport,
        gates: Gates,
    ) -> Option<Delivery> {
        let mut ctx = PublishContext {
            uptime: gates.uptime,
            network_up: gates.network_up,
            fade_active: gates.fade_active,
            transport,
        };
        publisher.tick(queue, &mut ctx)
    }

    fn names(queue: &EventQueue) -> Vec<String> {
        queue.iter().map(|r| r.event.clone()).collect()
    }

    #[test]
    fn test_successful_delivery_dequeues_head() {
        let mut publisher = create_test_publisher(Some(ENDPOINT));
        let mut queue = EventQueue::new(8);
        let mut transport = ScriptedTransport::new();
        queue.enqueue("light_on", SNAPSHOT, None, None);
        queue.enqueue("fade_in_complete", SNAPSHOT, None, None);
        transport.respond_ok(204, "");

        let outcome = tick(&mut publisher, &mut queue, &mut transport, Gates::open(0));

        assert!(matches!(outcome, Some(Delivery::Delivered { seq: 0, dequeued: true })));
        assert_eq!(names(&queue), vec!["fade_in_complete"]);

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, ENDPOINT);
        assert_eq!(request.bearer.as_deref(), Some("s3cret"));
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["event"], "light_on");
        assert_eq!(body["brightness"], 30);
    }

    #[test]
    fn test_failure_keeps_head_then_success_removes_it() {
        let mut publisher = create_test_publisher(Some(ENDPOINT));
        let mut queue = EventQueue::new(8);
        let mut transport = ScriptedTransport::new();
        queue.enqueue("a", SNAPSHOT, None, None);
        queue.enqueue("b", SNAPSHOT, None, None);
        queue.enqueue("c", SNAPSHOT, None, None);

        transport.respond_err(TransportError::Status(500));
        let outcome = tick(&mut publisher, &mut queue, &mut transport, Gates::open(0));
        assert!(matches!(
            outcome,
            Some(Delivery::Failed(LampError::DeliveryFailed(TransportError::Status(500))))
        ));
        assert_eq!(names(&queue), vec!["a", "b", "c"]);
        assert_eq!(publisher.consecutive_failures(), 1);

        transport.respond_ok(200, "");
        tick(&mut publisher, &mut queue, &mut transport, Gates::open(1000));
        assert_eq!(names(&queue), vec!["b", "c"]);
        assert_eq!(publisher.consecutive_failures(), 0);
    }

    #[test]
    fn test_min_interval_between_attempts() {
        let mut publisher = create_test_publisher(Some(ENDPOINT));
        let mut queue = EventQueue::new(8);
        let mut transport = ScriptedTransport::new();
        queue.enqueue("a", SNAPSHOT, None, None);
        queue.enqueue("b", SNAPSHOT, None, None);
        transport.respond_ok(200, "");
        transport.respond_ok(200, "");

        tick(&mut publisher, &mut queue, &mut transport, Gates::open(0));
        assert!(tick(&mut publisher, &mut queue, &mut transport, Gates::open(999)).is_none());
        assert_eq!(transport.request_count(), 1);

        tick(&mut publisher, &mut queue, &mut transport, Gates::open(1000));
        assert_eq!(transport.request_count(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_gates_block_delivery() {
        let mut queue = EventQueue::new(8);
        let mut transport = ScriptedTransport::new();
        queue.enqueue("a", SNAPSHOT, None, None);

        let mut unconfigured = create_test_publisher(None);
        assert!(tick(&mut unconfigured, &mut queue, &mut transport, Gates::open(0)).is_none());
        assert!(!unconfigured.is_configured());

        let mut publisher = create_test_publisher(Some(ENDPOINT));
        let offline = Gates {
            network_up: false,
            ..Gates::open(0)
        };
        assert!(tick(&mut publisher, &mut queue, &mut transport, offline).is_none());

        let fading = Gates {
            fade_active: true,
            ..Gates::open(0)
        };
        assert!(tick(&mut publisher, &mut queue, &mut transport, fading).is_none());

        assert_eq!(transport.request_count(), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_empty_queue_makes_no_attempt() {
        let mut publisher = create_test_publisher(Some(ENDPOINT));
        let mut queue = EventQueue::new(8);
        let mut transport = ScriptedTransport::new();

        assert!(tick(&mut publisher, &mut queue, &mut transport, Gates::open(0)).is_none());
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_eviction_during_flight_keeps_new_head() {
        let mut publisher = create_test_publisher(Some(ENDPOINT));
        let mut queue = EventQueue::new(2);
        let mut transport = ScriptedTransport::new();
        queue.enqueue("a", SNAPSHOT, None, None);
        queue.enqueue("b", SNAPSHOT, None, None);
        transport.respond_pending();

        assert!(tick(&mut publisher, &mut queue, &mut transport, Gates::open(0)).is_none());
        assert!(publisher.is_in_flight());

        // "a" is evicted while its delivery is in flight.
        queue.enqueue("c", SNAPSHOT, None, None);
        transport.complete_pending(Ok(crate::transport::Response {
            status: 200,
            body: String::new(),
        }));

        let outcome = tick(&mut publisher, &mut queue, &mut transport, Gates::open(50));
        assert!(matches!(outcome, Some(Delivery::Delivered { seq: 0, dequeued: false })));
        assert_eq!(names(&queue), vec!["b", "c"]);
    }

    #[test]
    fn test_in_flight_call_times_out() {
        let mut publisher = create_test_publisher(Some(ENDPOINT));
        let mut queue = EventQueue::new(2);
        let mut transport = ScriptedTransport::new();
        queue.enqueue("a", SNAPSHOT, None, None);
        transport.respond_pending();

        tick(&mut publisher, &mut queue, &mut transport, Gates::open(0));
        let outcome = tick(&mut publisher, &mut queue, &mut transport, Gates::open(10_000));

        assert!(matches!(
            outcome,
            Some(Delivery::Failed(LampError::DeliveryFailed(TransportError::Timeout)))
        ));
        assert_eq!(queue.len(), 1);
    }
}
