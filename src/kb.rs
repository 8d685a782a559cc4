//! The knowledge base: entity arena, assertion with cross-inference to
//! fixpoint, cascading retraction, pattern queries.
//!
//! Entities live in an arena addressed by stable ids; justification
//! links are id sets on both sides (`supported_by` pairs and the
//! `supports_*` back-references), maintained together on every
//! mutation. De-duplication is what makes forward chaining terminate:
//! re-deriving an existing entity merges justifications instead of
//! recursing.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::entity::{Entity, EntityId, Fact, JustPair, Rule};
use crate::infer::infer;
use crate::statement::{Bindings, Statement};
use crate::trace::{NullSink, TraceEvent, TraceSink};
use crate::unify::match_statements;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KbError {
    /// `ask` called with a malformed query statement.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// `assert_rule` called with no antecedents.
    #[error("a rule needs at least one antecedent")]
    InvalidRule,
    /// `retract` called with nothing structurally equal in the store.
    #[error("nothing to retract: no matching {0}")]
    NotFound(&'static str),
}

pub struct KnowledgeBase {
    entities: HashMap<EntityId, Entity>,
    /// Fact ids in insertion order, for stable enumeration.
    facts: Vec<EntityId>,
    /// Rule ids in insertion order.
    rules: Vec<EntityId>,
    fact_index: HashMap<Statement, EntityId>,
    rule_index: HashMap<(Vec<Statement>, Statement), EntityId>,
    next_id: u64,
    sink: Box<dyn TraceSink>,
}

impl KnowledgeBase {
    /// An empty knowledge base with the silent trace sink.
    pub fn new() -> KnowledgeBase {
        KnowledgeBase::with_trace(Box::new(NullSink))
    }

    /// An empty knowledge base emitting trace events to `sink`.
    pub fn with_trace(sink: Box<dyn TraceSink>) -> KnowledgeBase {
        KnowledgeBase {
            entities: HashMap::new(),
            facts: Vec::new(),
            rules: Vec::new(),
            fact_index: HashMap::new(),
            rule_index: HashMap::new(),
            next_id: 0,
            sink,
        }
    }

    //
    // ------------------------- Assertion -------------------------
    //

    /// Assert a fact directly. Returns the id of the stored entity
    /// (the existing one when an equal statement is already present).
    pub fn assert_fact(&mut self, statement: Statement) -> EntityId {
        let id = self.ingest(Entity::Fact(Fact::asserted(statement)));
        self.audit();
        id
    }

    /// Assert a rule directly: conjunctive antecedents and a consequent.
    /// An empty antecedent list is rejected: such a rule could never
    /// fire and would sit in the store as dead knowledge.
    pub fn assert_rule(
        &mut self,
        lhs: Vec<Statement>,
        rhs: Statement,
    ) -> Result<EntityId, KbError> {
        if lhs.is_empty() {
            return Err(KbError::InvalidRule);
        }
        let id = self.ingest(Entity::Rule(Rule::asserted(lhs, rhs)));
        self.audit();
        Ok(id)
    }

    /// Insert or merge one entity, then run one round of
    /// cross-inference. Derived output re-enters through this same
    /// path, which is how multi-step chaining happens.
    fn ingest(&mut self, entity: Entity) -> EntityId {
        if let Some(id) = self.lookup(&entity) {
            self.merge(id, entity);
            return id;
        }

        let id = self.alloc();
        let is_fact = entity.is_fact();
        let pairs: Vec<JustPair> = entity.support().supported_by.iter().copied().collect();
        let rendered = entity.to_string();

        match &entity {
            Entity::Fact(f) => {
                self.fact_index.insert(f.statement.clone(), id);
                self.facts.push(id);
            }
            Entity::Rule(r) => {
                self.rule_index.insert(r.shape(), id);
                self.rules.push(id);
            }
        }
        self.entities.insert(id, entity);

        for pair in &pairs {
            self.link(*pair, id, is_fact);
        }

        match pairs.first() {
            Some(pair) => self.sink.record(&TraceEvent::Derived {
                id,
                entity: rendered,
                fact: pair.fact,
                rule: pair.rule,
            }),
            None => self.sink.record(&TraceEvent::Asserted { id, entity: rendered }),
        }

        // cross-inference: new fact against every rule, new rule
        // against every fact (snapshot; entities added during the loop
        // run their own round on ingestion)
        if is_fact {
            for rule_id in self.rules.clone() {
                self.cross_infer(id, rule_id);
            }
        } else {
            for fact_id in self.facts.clone() {
                self.cross_infer(fact_id, id);
            }
        }

        id
    }

    /// Merge an equal-shaped incoming entity into the stored one.
    /// Never recurses into inference.
    fn merge(&mut self, id: EntityId, incoming: Entity) {
        let is_fact = incoming.is_fact();
        let incoming_support = match incoming {
            Entity::Fact(f) => f.support,
            Entity::Rule(r) => r.support,
        };

        let (fresh, rendered) = {
            let Some(existing) = self.entities.get_mut(&id) else {
                return;
            };
            let rendered = existing.to_string();
            let support = existing.support_mut();

            if incoming_support.supported_by.is_empty() {
                // direct re-assertion of an existing entity
                support.asserted = true;
            }

            let mut fresh = Vec::new();
            for pair in incoming_support.supported_by {
                if support.supported_by.insert(pair) {
                    fresh.push(pair);
                }
            }
            (fresh, rendered)
        };

        for pair in fresh {
            self.link(pair, id, is_fact);
        }
        self.sink.record(&TraceEvent::Merged { id, entity: rendered });
    }

    fn cross_infer(&mut self, fact_id: EntityId, rule_id: EntityId) {
        let pair = JustPair { fact: fact_id, rule: rule_id };
        let derived = {
            let Some(fact) = self.entities.get(&fact_id).and_then(|e| e.as_fact()) else {
                return;
            };
            let Some(rule) = self.entities.get(&rule_id).and_then(|e| e.as_rule()) else {
                return;
            };
            infer(fact, rule, pair)
        };

        if let Some(entity) = derived {
            self.ingest(entity);
        }
    }

    //
    // ------------------------- Retraction -------------------------
    //

    /// Retract a fact by structural equality. Clears the asserted flag;
    /// the fact (and everything it supports) is removed only once no
    /// justification remains.
    pub fn retract_fact(&mut self, statement: &Statement) -> Result<(), KbError> {
        let id = self
            .fact_index
            .get(statement)
            .copied()
            .ok_or(KbError::NotFound("fact"))?;
        self.unassert(id);
        Ok(())
    }

    /// Retract a rule by structural equality of its shape.
    pub fn retract_rule(&mut self, lhs: &[Statement], rhs: &Statement) -> Result<(), KbError> {
        let key = (lhs.to_vec(), rhs.clone());
        let id = self
            .rule_index
            .get(&key)
            .copied()
            .ok_or(KbError::NotFound("rule"))?;
        self.unassert(id);
        Ok(())
    }

    fn unassert(&mut self, id: EntityId) {
        let (still_supported, rendered) = {
            let Some(entity) = self.entities.get_mut(&id) else {
                return;
            };
            entity.support_mut().asserted = false;
            (!entity.support().supported_by.is_empty(), entity.to_string())
        };

        if still_supported {
            // still justified by a derivation; stays in the store
            self.sink.record(&TraceEvent::Unasserted { id, entity: rendered });
            self.audit();
            return;
        }

        let mut in_flight = BTreeSet::new();
        self.remove(id, &mut in_flight);
        self.audit();
    }

    /// Remove an entity whose support has emptied, then cascade into
    /// its dependents. `in_flight` guards against support cycles from
    /// pathological rule sets.
    fn remove(&mut self, id: EntityId, in_flight: &mut BTreeSet<EntityId>) {
        if !in_flight.insert(id) {
            return;
        }

        let Some(entity) = self.entities.remove(&id) else {
            return;
        };
        match &entity {
            Entity::Fact(f) => {
                self.fact_index.remove(&f.statement);
                self.facts.retain(|x| *x != id);
            }
            Entity::Rule(r) => {
                self.rule_index.remove(&r.shape());
                self.rules.retain(|x| *x != id);
            }
        }
        self.sink.record(&TraceEvent::Retracted { id, entity: entity.to_string() });

        // supported_by is empty here, so no supporter still lists this
        // entity; only its dependents need attention
        let support = entity.support();
        let dependents: Vec<EntityId> = support
            .supports_facts
            .iter()
            .chain(support.supports_rules.iter())
            .copied()
            .collect();
        for dep in dependents {
            self.strip_support(dep, id, in_flight);
        }
    }

    /// Strip every justification pair mentioning `removed` from one
    /// dependent, prune back-references no surviving pair justifies,
    /// and cascade if the dependent is no longer retained.
    fn strip_support(
        &mut self,
        dep_id: EntityId,
        removed: EntityId,
        in_flight: &mut BTreeSet<EntityId>,
    ) {
        let (stripped, survivors, retained, dep_is_fact) = {
            let Some(dep) = self.entities.get_mut(&dep_id) else {
                return;
            };
            let dep_is_fact = dep.is_fact();
            let support = dep.support_mut();

            let stripped: Vec<JustPair> = support
                .supported_by
                .iter()
                .copied()
                .filter(|p| p.mentions(removed))
                .collect();
            for p in &stripped {
                support.supported_by.remove(p);
            }
            (
                stripped,
                support.supported_by.clone(),
                support.is_retained(),
                dep_is_fact,
            )
        };

        if stripped.is_empty() {
            return;
        }

        for p in &stripped {
            for supporter in [p.fact, p.rule] {
                if supporter == removed {
                    continue;
                }
                if survivors.iter().any(|q| q.mentions(supporter)) {
                    continue;
                }
                self.unlink(supporter, dep_id, dep_is_fact);
            }
        }

        if !retained {
            self.remove(dep_id, in_flight);
        }
    }

    //
    // ------------------------- Queries -------------------------
    //

    /// Match a query statement against every stored fact, one bindings
    /// set per successful match. An empty result is not an error.
    pub fn ask(&self, query: &Statement) -> Result<Vec<Bindings>, KbError> {
        if query.predicate.is_empty() || query.terms.is_empty() {
            return Err(KbError::InvalidQuery(query.to_string()));
        }

        let mut out = Vec::new();
        for id in &self.facts {
            let Some(fact) = self.entities.get(id).and_then(|e| e.as_fact()) else {
                continue;
            };
            if let Some(env) = match_statements(query, &fact.statement) {
                out.push(env);
            }
        }
        Ok(out)
    }

    pub fn contains_fact(&self, statement: &Statement) -> bool {
        self.fact_index.contains_key(statement)
    }

    pub fn fact_id(&self, statement: &Statement) -> Option<EntityId> {
        self.fact_index.get(statement).copied()
    }

    pub fn rule_id(&self, lhs: &[Statement], rhs: &Statement) -> Option<EntityId> {
        self.rule_index.get(&(lhs.to_vec(), rhs.clone())).copied()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Facts in insertion order, for display and debugging.
    pub fn facts(&self) -> impl Iterator<Item = &Fact> + '_ {
        self.facts
            .iter()
            .filter_map(|id| self.entities.get(id).and_then(|e| e.as_fact()))
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules
            .iter()
            .filter_map(|id| self.entities.get(id).and_then(|e| e.as_rule()))
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    //
    // ------------------------- Internals -------------------------
    //

    fn alloc(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn lookup(&self, entity: &Entity) -> Option<EntityId> {
        match entity {
            Entity::Fact(f) => self.fact_index.get(&f.statement).copied(),
            Entity::Rule(r) => self.rule_index.get(&r.shape()).copied(),
        }
    }

    /// Add `dependent` to the back-references of both members of `pair`.
    fn link(&mut self, pair: JustPair, dependent: EntityId, dependent_is_fact: bool) {
        for supporter in [pair.fact, pair.rule] {
            if let Some(e) = self.entities.get_mut(&supporter) {
                let s = e.support_mut();
                if dependent_is_fact {
                    s.supports_facts.insert(dependent);
                } else {
                    s.supports_rules.insert(dependent);
                }
            }
        }
    }

    fn unlink(&mut self, supporter: EntityId, dependent: EntityId, dependent_is_fact: bool) {
        if let Some(e) = self.entities.get_mut(&supporter) {
            let s = e.support_mut();
            if dependent_is_fact {
                s.supports_facts.remove(&dependent);
            } else {
                s.supports_rules.remove(&dependent);
            }
        }
    }

    /// Debug-build audit of the retention invariant and the
    /// bidirectional justification links. Corruption here is a
    /// programming defect, not a recoverable condition.
    fn audit(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        for (&id, entity) in &self.entities {
            debug_assert!(
                entity.support().is_retained(),
                "{id} stored without assertion or support"
            );
            for pair in &entity.support().supported_by {
                for supporter in [pair.fact, pair.rule] {
                    let back = self.entities.get(&supporter).map(|s| {
                        let sup = s.support();
                        if entity.is_fact() {
                            sup.supports_facts.contains(&id)
                        } else {
                            sup.supports_rules.contains(&id)
                        }
                    });
                    debug_assert_eq!(
                        back,
                        Some(true),
                        "broken back-reference {supporter} -> {id}"
                    );
                }
            }
            // reverse direction: every back-reference must be justified
            // by a pair on the dependent's side
            let sup = entity.support();
            for (deps, dep_is_fact) in
                [(&sup.supports_facts, true), (&sup.supports_rules, false)]
            {
                for &dep_id in deps.iter() {
                    let justified = self.entities.get(&dep_id).map(|dep| {
                        dep.is_fact() == dep_is_fact
                            && dep.support().supported_by.iter().any(|p| p.mentions(id))
                    });
                    debug_assert_eq!(
                        justified,
                        Some(true),
                        "stale back-reference {id} -> {dep_id}"
                    );
                }
            }
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> KnowledgeBase {
        KnowledgeBase::new()
    }
}
