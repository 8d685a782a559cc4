//! One-step forward inference.

use crate::entity::{Entity, Fact, JustPair, Rule};
use crate::unify::{instantiate, match_statements};

/// Derive at most one entity from a fact and a rule.
///
/// The fact is matched against the first antecedent only; the engine
/// never reorders or searches the remaining antecedents. When no
/// antecedents remain the result is a fact; otherwise a narrowed rule
/// over the instantiated remainder. Either way the derived entity
/// carries exactly one justification pair.
///
/// Pure with respect to its inputs: insertion, further cross-inference
/// and back-reference wiring are the knowledge base's responsibility.
pub fn infer(fact: &Fact, rule: &Rule, pair: JustPair) -> Option<Entity> {
    let first = rule.lhs.first()?;
    let env = match_statements(first, &fact.statement)?;

    let rhs = instantiate(&rule.rhs, &env);
    if rule.lhs.len() == 1 {
        return Some(Entity::Fact(Fact::derived(rhs, pair)));
    }

    let rest = rule.lhs[1..].iter().map(|st| instantiate(st, &env)).collect();
    Some(Entity::Rule(Rule::derived(rest, rhs, pair)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::statement::Statement;

    fn pair() -> JustPair {
        JustPair { fact: EntityId(1), rule: EntityId(2) }
    }

    #[test]
    fn single_antecedent_yields_fact() {
        let fact = Fact::asserted(Statement::parse("isa", ["fido", "dog"]));
        let rule = Rule::asserted(
            vec![Statement::parse("isa", ["?x", "dog"])],
            Statement::parse("isa", ["?x", "mammal"]),
        );

        let derived = infer(&fact, &rule, pair()).unwrap();
        let derived = derived.as_fact().unwrap();
        assert_eq!(derived.statement, Statement::parse("isa", ["fido", "mammal"]));
        assert!(!derived.support.asserted);
        assert!(derived.support.supported_by.contains(&pair()));
    }

    #[test]
    fn remaining_antecedents_yield_narrowed_rule() {
        let fact = Fact::asserted(Statement::parse("isa", ["fido", "dog"]));
        let rule = Rule::asserted(
            vec![
                Statement::parse("isa", ["?x", "dog"]),
                Statement::parse("color", ["?x", "?c"]),
            ],
            Statement::parse("cute", ["?x"]),
        );

        let derived = infer(&fact, &rule, pair()).unwrap();
        let derived = derived.as_rule().unwrap();
        assert_eq!(derived.lhs, vec![Statement::parse("color", ["fido", "?c"])]);
        assert_eq!(derived.rhs, Statement::parse("cute", ["fido"]));
        assert!(derived.support.supported_by.contains(&pair()));
    }

    #[test]
    fn only_the_first_antecedent_is_tried() {
        let fact = Fact::asserted(Statement::parse("color", ["fido", "brown"]));
        let rule = Rule::asserted(
            vec![
                Statement::parse("isa", ["?x", "dog"]),
                Statement::parse("color", ["?x", "?c"]),
            ],
            Statement::parse("cute", ["?x"]),
        );

        assert!(infer(&fact, &rule, pair()).is_none());
    }

    #[test]
    fn mismatch_produces_nothing() {
        let fact = Fact::asserted(Statement::parse("isa", ["fido", "cat"]));
        let rule = Rule::asserted(
            vec![Statement::parse("isa", ["?x", "dog"])],
            Statement::parse("isa", ["?x", "mammal"]),
        );

        assert!(infer(&fact, &rule, pair()).is_none());
    }
}
