//! Injected trace capability.
//!
//! A sink is handed to the knowledge base at construction; events are
//! observational only and never affect control flow or return values.

use std::fmt;

use crate::entity::EntityId;

/// A human-readable record of one knowledge-base mutation.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// Entity inserted by direct assertion.
    Asserted { id: EntityId, entity: String },
    /// Entity inserted as the output of one inference step.
    Derived { id: EntityId, entity: String, fact: EntityId, rule: EntityId },
    /// Equal-shaped entity already present; justifications merged.
    Merged { id: EntityId, entity: String },
    /// Asserted flag cleared, but the entity stays: still justified.
    Unasserted { id: EntityId, entity: String },
    /// Entity removed from the store.
    Retracted { id: EntityId, entity: String },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Asserted { id, entity } => write!(f, "assert {id} {entity}"),
            TraceEvent::Derived { id, entity, fact, rule } => {
                write!(f, "derive {id} {entity} from ({fact}, {rule})")
            }
            TraceEvent::Merged { id, entity } => write!(f, "merge {id} {entity}"),
            TraceEvent::Unasserted { id, entity } => write!(f, "unassert {id} {entity}"),
            TraceEvent::Retracted { id, entity } => write!(f, "retract {id} {entity}"),
        }
    }
}

pub trait TraceSink {
    fn record(&self, event: &TraceEvent);
}

/// Silent default.
#[derive(Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&self, _event: &TraceEvent) {}
}

/// Forwards events to the active `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, event: &TraceEvent) {
        match event {
            TraceEvent::Derived { fact, rule, .. } => {
                tracing::debug!(%fact, %rule, "{event}");
            }
            TraceEvent::Merged { .. } => {
                tracing::trace!("{event}");
            }
            _ => {
                tracing::debug!("{event}");
            }
        }
    }
}
