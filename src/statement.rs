use std::collections::HashMap;
use std::fmt;

/// A term is a constant symbol or a variable.
///
/// Variables use the reserved lexical form of a leading `?` (e.g. `?x`);
/// everything else is a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Const(String),
    Var(String),
}

impl Term {
    /// Build a term from its lexical form. The leading `?` marker is
    /// stripped from variable names; `Display` puts it back.
    pub fn parse(s: &str) -> Term {
        match s.strip_prefix('?') {
            Some(name) => Term::Var(name.to_string()),
            None => Term::Const(s.to_string()),
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Const(c) => write!(f, "{c}"),
            Term::Var(v) => write!(f, "?{v}"),
        }
    }
}

/// Predicate plus ordered terms, compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub predicate: String,
    pub terms: Vec<Term>,
}

impl Statement {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Statement {
        Statement { predicate: predicate.into(), terms }
    }

    /// Convenience constructor from lexical forms:
    /// `Statement::parse("isa", ["?x", "dog"])`.
    pub fn parse<'a, I>(predicate: &str, terms: I) -> Statement
    where
        I: IntoIterator<Item = &'a str>,
    {
        Statement {
            predicate: predicate.to_string(),
            terms: terms.into_iter().map(Term::parse).collect(),
        }
    }

    /// A statement is ground when it contains no variables.
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(|t| !t.is_var())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for t in &self.terms {
            write!(f, " {t}")?;
        }
        write!(f, ")")
    }
}

/// Variable -> term map built incrementally during matching.
///
/// A variable may carry at most one value within a match; `bind`
/// rejects inconsistent rebinding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    map: HashMap<String, Term>,
}

impl Bindings {
    pub fn new() -> Bindings {
        Bindings::default()
    }

    pub fn get(&self, var: &str) -> Option<&Term> {
        self.map.get(var)
    }

    /// Bind `var` to `value`, or check consistency against an existing
    /// binding. `None` means the match fails.
    pub(crate) fn bind(&mut self, var: &str, value: Term) -> Option<()> {
        match self.map.get(var) {
            Some(existing) if *existing == value => Some(()),
            Some(_) => None,
            None => {
                self.map.insert(var.to_string(), value);
                Some(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> + '_ {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // sorted for deterministic output
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        write!(f, "{{")?;
        for (i, (var, val)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{var}: {val}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_marks_variables() {
        assert_eq!(Term::parse("?x"), Term::Var("x".into()));
        assert_eq!(Term::parse("fido"), Term::Const("fido".into()));
    }

    #[test]
    fn groundness() {
        assert!(Statement::parse("isa", ["fido", "dog"]).is_ground());
        assert!(!Statement::parse("isa", ["?x", "dog"]).is_ground());
    }

    #[test]
    fn bind_rejects_inconsistent_rebinding() {
        let mut env = Bindings::new();
        assert_eq!(env.bind("x", Term::parse("fido")), Some(()));
        assert_eq!(env.bind("x", Term::parse("fido")), Some(()));
        assert_eq!(env.bind("x", Term::parse("rex")), None);
        assert_eq!(env.get("x"), Some(&Term::Const("fido".into())));
    }

    #[test]
    fn display_forms() {
        let st = Statement::parse("isa", ["?x", "dog"]);
        assert_eq!(st.to_string(), "(isa ?x dog)");

        let mut env = Bindings::new();
        env.bind("y", Term::parse("fido")).unwrap();
        assert_eq!(env.to_string(), "{?y: fido}");
    }
}
