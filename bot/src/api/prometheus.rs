use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

use crate::events::actions::Action;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum EventType {
    Stale,
    Close,
    Unstale,
}

impl From<&Action> for EventType {
    fn from(action: &Action) -> Self {
        match action {
            Action::Stale(_) => EventType::Stale,
            Action::Close(_) => EventType::Close,
            Action::Unstale(_) => EventType::Unstale,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MetricRecord {
    pub event_type: EventType,
    pub success: u32,
}

pub struct PrometheusClient {
    registry: Registry,
    event: Family<MetricRecord, Counter>,
    candidates: Gauge,

    // GraphQL requests are counted on our side; secondary rate limits
    // are only visible in response headers
    github_api_read_request: Counter,
    github_api_write_request: Counter,
}

impl Default for PrometheusClient {
    fn default() -> Self {
        let mut registry = Registry::default();
        let event = Family::default();
        let candidates = Gauge::default();
        let github_api_read_request = Counter::default();
        let github_api_write_request = Counter::default();

        registry.register(
            "github_api_read_requests",
            "GraphQL queries sent during the run",
            github_api_read_request.clone(),
        );
        registry.register(
            "github_api_write_requests",
            "GraphQL mutations sent during the run",
            github_api_write_request.clone(),
        );
        registry.register(
            "stale_candidates",
            "Open draft pull requests checked during the run",
            candidates.clone(),
        );
        registry.register(
            "stale_transition",
            "Transitions attempted on draft pull requests",
            event.clone(),
        );

        Self {
            registry,
            event,
            candidates,
            github_api_read_request,
            github_api_write_request,
        }
    }
}

impl PrometheusClient {
    pub fn record(&self, action: &Action, success: bool) {
        let record = MetricRecord {
            event_type: action.into(),
            success: success as u32,
        };
        self.event.get_or_create(&record).inc();
    }

    pub fn set_candidates(&self, value: u64) {
        self.candidates.set(value as i64);
    }

    pub fn add_read_request(&self) {
        self.github_api_read_request.inc();
    }

    pub fn add_write_request(&self) {
        self.github_api_write_request.inc();
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}
