use crate::grammar::{Grammar, NonTerminal, Symbol, Terminal};
use std::collections::BTreeSet;

/// Symbol sets derived from a grammar, computed once per table build.
///
/// Sets are ordered so everything built from them (closures, lookaheads,
/// conflict reports) comes out in the same order on every run.
#[derive(Debug, Clone)]
pub struct GrammarAnalysis {
    nullable: Vec<bool>,
    first: Vec<BTreeSet<Terminal>>,
    follow: Vec<BTreeSet<Terminal>>,
    leading: Vec<BTreeSet<Terminal>>,
}

impl GrammarAnalysis {
    #[must_use]
    pub fn new<T, V>(grammar: &Grammar<T, V>) -> Self {
        let count = grammar.non_terminal_count();
        let mut analysis = Self {
            nullable: vec![false; count],
            first: vec![BTreeSet::new(); count],
            follow: vec![BTreeSet::new(); count],
            leading: vec![BTreeSet::new(); count],
        };
        analysis.compute_nullable(grammar);
        analysis.compute_first(grammar);
        analysis.compute_follow(grammar);
        analysis.compute_leading(grammar);
        analysis
    }

    #[must_use]
    pub fn is_nullable(&self, nt: NonTerminal) -> bool {
        self.nullable[nt.index()]
    }

    #[must_use]
    pub fn first(&self, nt: NonTerminal) -> &BTreeSet<Terminal> {
        &self.first[nt.index()]
    }

    #[must_use]
    pub fn follow(&self, nt: NonTerminal) -> &BTreeSet<Terminal> {
        &self.follow[nt.index()]
    }

    /// Terminals that can be shifted as the very first symbol of `nt`.
    ///
    /// Unlike FIRST, nullable prefixes are not skipped: only terminals that
    /// sit at the front of some leftmost expansion count.
    #[must_use]
    pub fn leading(&self, nt: NonTerminal) -> &BTreeSet<Terminal> {
        &self.leading[nt.index()]
    }

    /// FIRST of a symbol sequence, plus whether the whole sequence is nullable.
    #[must_use]
    pub fn first_of(&self, symbols: &[Symbol]) -> (BTreeSet<Terminal>, bool) {
        let mut out = BTreeSet::new();
        for symbol in symbols {
            match *symbol {
                Symbol::Terminal(t) => {
                    out.insert(t);
                    return (out, false);
                }
                Symbol::NonTerminal(nt) => {
                    out.extend(self.first[nt.index()].iter().copied());
                    if !self.nullable[nt.index()] {
                        return (out, false);
                    }
                }
            }
        }
        (out, true)
    }

    /// Whether `t` can be shifted at the start of `symbol`.
    #[must_use]
    pub fn starts_with(&self, symbol: Symbol, t: Terminal) -> bool {
        match symbol {
            Symbol::Terminal(s) => s == t,
            Symbol::NonTerminal(nt) => self.leading[nt.index()].contains(&t),
        }
    }

    fn compute_nullable<T, V>(&mut self, grammar: &Grammar<T, V>) {
        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                if self.nullable[rule.lhs.index()] {
                    continue;
                }
                let all_nullable = rule.rhs.iter().all(|symbol| match symbol {
                    Symbol::Terminal(_) => false,
                    Symbol::NonTerminal(nt) => self.nullable[nt.index()],
                });
                if all_nullable {
                    self.nullable[rule.lhs.index()] = true;
                    changed = true;
                }
            }
        }
    }

    fn compute_first<T, V>(&mut self, grammar: &Grammar<T, V>) {
        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                let (first, _) = self.first_of(&rule.rhs);
                let target = &mut self.first[rule.lhs.index()];
                let before = target.len();
                target.extend(first);
                changed |= target.len() != before;
            }
        }
    }

    fn compute_follow<T, V>(&mut self, grammar: &Grammar<T, V>) {
        self.follow[grammar.augmented_start().index()].insert(grammar.end());
        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                for (i, symbol) in rule.rhs.iter().enumerate() {
                    let Symbol::NonTerminal(nt) = *symbol else {
                        continue;
                    };
                    let (mut add, nullable_tail) = self.first_of(&rule.rhs[i + 1..]);
                    if nullable_tail {
                        add.extend(self.follow[rule.lhs.index()].iter().copied());
                    }
                    let target = &mut self.follow[nt.index()];
                    let before = target.len();
                    target.extend(add);
                    changed |= target.len() != before;
                }
            }
        }
    }

    fn compute_leading<T, V>(&mut self, grammar: &Grammar<T, V>) {
        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                let add: BTreeSet<Terminal> = match rule.rhs.first() {
                    None => continue,
                    Some(Symbol::Terminal(t)) => std::iter::once(*t).collect(),
                    Some(Symbol::NonTerminal(nt)) => self.leading[nt.index()].clone(),
                };
                let target = &mut self.leading[rule.lhs.index()];
                let before = target.len();
                target.extend(add);
                changed |= target.len() != before;
            }
        }
    }
}
