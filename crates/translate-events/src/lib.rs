//! Typed command/event bus (C9) plus the metrics and health registries
//! (C11) it carries alongside. Everything here is process-wide and
//! singleton by construction — one `EventBus`, one `CorrelationMap`,
//! one `MetricsRegistry`, one `HealthRegistry` per running server.

pub mod bus;
pub mod command;
pub mod correlation;
pub mod health;
pub mod metrics;

pub use bus::{Envelope, EventBus};
pub use command::{parse_command, Command, CommandValidationError};
pub use correlation::{new_correlation_id, CorrelationMap};
pub use health::{ComponentStatus, HealthCheck, HealthRegistry};
pub use metrics::{Alert, MetricsRegistry, Snapshot};
