//! Knowledge entities: the justification-carrying nodes of the store.

use std::collections::BTreeSet;
use std::fmt;

use crate::statement::Statement;

/// Stable arena identifier for a stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Justification pair: the fact and rule whose one-step inference
/// produced a derived entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JustPair {
    pub fact: EntityId,
    pub rule: EntityId,
}

impl JustPair {
    pub fn mentions(&self, id: EntityId) -> bool {
        self.fact == id || self.rule == id
    }
}

/// Justification state shared by facts and rules.
///
/// `supported_by` and the `supports_*` back-references form a
/// bidirectional link: for every pair `(f, r)` here, this entity must
/// appear in both `f`'s and `r`'s back-references. The knowledge base
/// maintains the two sides together.
#[derive(Debug, Clone, Default)]
pub struct Support {
    /// True when the entity was asserted directly by a caller.
    pub asserted: bool,
    /// Justification pairs that derived this entity. Re-derivation via
    /// a different (fact, rule) combination adds a second pair.
    pub supported_by: BTreeSet<JustPair>,
    /// Facts this entity helped derive.
    pub supports_facts: BTreeSet<EntityId>,
    /// Rules this entity helped derive.
    pub supports_rules: BTreeSet<EntityId>,
}

impl Support {
    pub fn direct() -> Support {
        Support { asserted: true, ..Support::default() }
    }

    pub fn derived(pair: JustPair) -> Support {
        let mut s = Support::default();
        s.supported_by.insert(pair);
        s
    }

    /// An entity is retained while asserted or still justified; the
    /// moment both are false it must leave the store.
    pub fn is_retained(&self) -> bool {
        self.asserted || !self.supported_by.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Fact {
    pub statement: Statement,
    pub support: Support,
}

impl Fact {
    /// A directly asserted fact.
    pub fn asserted(statement: Statement) -> Fact {
        Fact { statement, support: Support::direct() }
    }

    /// A fact produced by one inference step.
    pub fn derived(statement: Statement, pair: JustPair) -> Fact {
        Fact { statement, support: Support::derived(pair) }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statement)
    }
}

/// Conjunctive antecedents implying a consequent.
#[derive(Debug, Clone)]
pub struct Rule {
    pub lhs: Vec<Statement>,
    pub rhs: Statement,
    pub support: Support,
}

impl Rule {
    /// A directly asserted rule.
    pub fn asserted(lhs: Vec<Statement>, rhs: Statement) -> Rule {
        Rule { lhs, rhs, support: Support::direct() }
    }

    /// A narrowed rule produced by one inference step.
    pub fn derived(lhs: Vec<Statement>, rhs: Statement, pair: JustPair) -> Rule {
        Rule { lhs, rhs, support: Support::derived(pair) }
    }

    /// De-duplication key: rules are equal-shaped when lhs and rhs match
    /// structurally.
    pub fn shape(&self) -> (Vec<Statement>, Statement) {
        (self.lhs.clone(), self.rhs.clone())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for st in &self.lhs {
            write!(f, "{st} ")?;
        }
        write!(f, "=> {}", self.rhs)
    }
}

/// Closed union over the two entity kinds.
#[derive(Debug, Clone)]
pub enum Entity {
    Fact(Fact),
    Rule(Rule),
}

impl Entity {
    pub fn support(&self) -> &Support {
        match self {
            Entity::Fact(f) => &f.support,
            Entity::Rule(r) => &r.support,
        }
    }

    pub(crate) fn support_mut(&mut self) -> &mut Support {
        match self {
            Entity::Fact(f) => &mut f.support,
            Entity::Rule(r) => &mut r.support,
        }
    }

    pub fn is_fact(&self) -> bool {
        matches!(self, Entity::Fact(_))
    }

    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            Entity::Fact(f) => Some(f),
            Entity::Rule(_) => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Entity::Fact(_) => None,
            Entity::Rule(r) => Some(r),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Fact(x) => write!(f, "{x}"),
            Entity::Rule(x) => write!(f, "{x}"),
        }
    }
}
