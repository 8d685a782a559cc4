//! Pattern matching between statements, and pattern instantiation.
//!
//! `None` is the expected no-match signal, recovered locally by the
//! caller; it is never surfaced as an error.

use crate::statement::{Bindings, Statement, Term};

/// Compute bindings that make two statements term-for-term equal.
///
/// Predicates must be identical and arity equal. A variable binds on
/// first occurrence and must agree with its binding afterwards;
/// constants must be equal. Symmetric on constants: either side may
/// carry the variables.
pub fn match_statements(a: &Statement, b: &Statement) -> Option<Bindings> {
    if a.predicate != b.predicate || a.terms.len() != b.terms.len() {
        return None;
    }

    let mut env = Bindings::new();
    for (ta, tb) in a.terms.iter().zip(&b.terms) {
        unify_term(ta, tb, &mut env)?;
    }
    Some(env)
}

fn unify_term(a: &Term, b: &Term, env: &mut Bindings) -> Option<()> {
    match (a, b) {
        (Term::Const(ca), Term::Const(cb)) => {
            if ca == cb {
                Some(())
            } else {
                None
            }
        }
        (Term::Var(va), t) => env.bind(va, t.clone()),
        (t, Term::Var(vb)) => env.bind(vb, t.clone()),
    }
}

/// Substitute bound variables into a statement pattern.
///
/// Variables absent from `env` are left as-is; the result of a partial
/// match stays a pattern (used for the remaining antecedents of a rule).
pub fn instantiate(st: &Statement, env: &Bindings) -> Statement {
    Statement {
        predicate: st.predicate.clone(),
        terms: st.terms.iter().map(|t| inst_term(t, env)).collect(),
    }
}

fn inst_term(t: &Term, env: &Bindings) -> Term {
    match t {
        Term::Const(_) => t.clone(),
        Term::Var(v) => match env.get(v) {
            Some(bound) => bound.clone(),
            None => t.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st<'a>(p: &str, terms: impl IntoIterator<Item = &'a str>) -> Statement {
        Statement::parse(p, terms)
    }

    #[test]
    fn predicate_and_arity_must_agree() {
        assert!(match_statements(&st("isa", ["?x", "dog"]), &st("has", ["fido", "dog"])).is_none());
        assert!(match_statements(&st("isa", ["?x"]), &st("isa", ["fido", "dog"])).is_none());
    }

    #[test]
    fn constants_require_equality() {
        assert!(match_statements(&st("isa", ["fido", "dog"]), &st("isa", ["fido", "dog"])).is_some());
        assert!(match_statements(&st("isa", ["fido", "dog"]), &st("isa", ["rex", "dog"])).is_none());
    }

    #[test]
    fn variable_binds_first_occurrence() {
        let env = match_statements(&st("isa", ["?x", "dog"]), &st("isa", ["fido", "dog"])).unwrap();
        assert_eq!(env.get("x"), Some(&Term::Const("fido".into())));
    }

    #[test]
    fn reoccurring_variable_must_agree() {
        assert!(match_statements(&st("eq", ["?x", "?x"]), &st("eq", ["a", "a"])).is_some());
        assert!(match_statements(&st("eq", ["?x", "?x"]), &st("eq", ["a", "b"])).is_none());
    }

    #[test]
    fn binding_is_symmetric() {
        let env = match_statements(&st("isa", ["fido", "dog"]), &st("isa", ["?x", "dog"])).unwrap();
        assert_eq!(env.get("x"), Some(&Term::Const("fido".into())));
    }

    #[test]
    fn instantiate_leaves_unbound_variables() {
        let env = match_statements(&st("isa", ["?x", "dog"]), &st("isa", ["fido", "dog"])).unwrap();
        let out = instantiate(&st("likes", ["?x", "?y"]), &env);
        assert_eq!(out, st("likes", ["fido", "?y"]));
    }
}
