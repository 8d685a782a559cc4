mod entity;
mod infer;
mod kb;
mod statement;
mod trace;
mod unify;

pub use entity::{Entity, EntityId, Fact, JustPair, Rule, Support};
pub use infer::infer;
pub use kb::{KbError, KnowledgeBase};
pub use statement::{Bindings, Statement, Term};
pub use trace::{NullSink, TraceEvent, TraceSink, TracingSink};
pub use unify::{instantiate, match_statements};
