//! In-memory event capture for logging assertions in tests
//!
//! Events are recorded with their canonical fields lifted out (`op`,
//! `event`, `session_id`, `dist_name`) so tests can select the events of the
//! session or object they drove, even when other tests log concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use cmtree_core_types::schema::{EVENT_FALLBACK, FIELD_DIST_NAME, FIELD_SESSION_ID};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One recorded event
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub op: Option<String>,
    pub event: Option<String>,
    pub session_id: Option<String>,
    pub dist_name: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn from_fields(level: Level, fields: HashMap<String, String>) -> Self {
        Self {
            level,
            op: fields.get("op").cloned(),
            event: fields.get("event").cloned(),
            session_id: fields.get(FIELD_SESSION_ID).cloned(),
            dist_name: fields.get(FIELD_DIST_NAME).cloned(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }
}

#[derive(Default)]
struct FieldCollector(HashMap<String, String>);

impl FieldCollector {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

type EventBuffer = Arc<Mutex<Vec<CapturedEvent>>>;

/// Layer that appends every event to a shared buffer
pub struct TestCaptureLayer {
    events: EventBuffer,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let events = EventBuffer::default();
        (
            Self {
                events: Arc::clone(&events),
            },
            TestCapture { events },
        )
    }
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let captured = CapturedEvent::from_fields(*event.metadata().level(), collector.0);

        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

/// Read side of the capture buffer
#[derive(Clone)]
pub struct TestCapture {
    events: EventBuffer,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events of one operation, in emission order
    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.select(|e| e.op.as_deref() == Some(op))
    }

    /// Events correlated with one editing session
    pub fn events_for_session(&self, session_id: &str) -> Vec<CapturedEvent> {
        self.select(|e| e.session_id.as_deref() == Some(session_id))
    }

    /// Fallback events naming `dist_name`
    pub fn fallbacks_for(&self, dist_name: &str) -> Vec<CapturedEvent> {
        self.select(|e| {
            e.event.as_deref() == Some(EVENT_FALLBACK) && e.dist_name.as_deref() == Some(dist_name)
        })
    }

    /// # Panics
    ///
    /// When no event matches `op` and `event`.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.is(op, event)),
            "no {}/{} event among {} captured",
            op,
            event,
            events.len()
        );
    }

    fn select<F>(&self, predicate: F) -> Vec<CapturedEvent>
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().into_iter().filter(|e| predicate(e)).collect()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer as the global subscriber (once) and return its buffer
///
/// The buffer is shared by every test in the binary.
///
/// ```
/// use cmtree_core::logging_facility::test_capture::init_test_capture;
/// use cmtree_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_example_op");
/// capture.assert_event_exists("doc_example_op", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            tracing_subscriber::registry().with(layer).init();
            capture
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_fields_are_lifted() {
        let mut fields = HashMap::new();
        fields.insert("op".to_string(), "rulebook_resolve".to_string());
        fields.insert("event".to_string(), EVENT_FALLBACK.to_string());
        fields.insert(FIELD_DIST_NAME.to_string(), "ROOT-1".to_string());

        let event = CapturedEvent::from_fields(Level::WARN, fields);
        assert!(event.is("rulebook_resolve", EVENT_FALLBACK));
        assert_eq!(event.dist_name.as_deref(), Some("ROOT-1"));
        assert_eq!(event.session_id, None);
        assert_eq!(event.field("missing"), None);
    }
}
