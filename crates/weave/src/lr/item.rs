use crate::grammar::{Grammar, GrammarAnalysis, RuleId, Symbol, Terminal};
use std::collections::{BTreeMap, BTreeSet};

/// An LR item: a rule, a dot position and an optional lookahead.
///
/// SLR construction uses LR(0) items, which never carry a lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub rule: RuleId,
    pub dot: usize,
    pub lookahead: Option<Terminal>,
}

impl Item {
    #[must_use]
    pub const fn new(rule: RuleId, dot: usize, lookahead: Option<Terminal>) -> Self {
        Self {
            rule,
            dot,
            lookahead,
        }
    }

    /// The item without its lookahead.
    #[must_use]
    pub const fn core(self) -> (RuleId, usize) {
        (self.rule, self.dot)
    }

    #[must_use]
    pub const fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }

    /// The symbol right after the dot, if any.
    #[must_use]
    pub fn next_symbol<T, V>(&self, grammar: &Grammar<T, V>) -> Option<Symbol> {
        grammar.rule(self.rule).rhs().get(self.dot).copied()
    }

    #[must_use]
    pub fn is_complete<T, V>(&self, grammar: &Grammar<T, V>) -> bool {
        self.dot >= grammar.rule(self.rule).rhs().len()
    }

    /// Render as `lhs -> a . b, la`.
    #[must_use]
    pub fn display<T, V>(&self, grammar: &Grammar<T, V>) -> String {
        let rule = grammar.rule(self.rule);
        let mut out = String::from(grammar.non_terminal_name(rule.lhs()));
        out.push_str(" ->");
        for (i, symbol) in rule.rhs().iter().enumerate() {
            if i == self.dot {
                out.push_str(" .");
            }
            out.push(' ');
            out.push_str(grammar.symbol_name(*symbol));
        }
        if self.dot >= rule.rhs().len() {
            out.push_str(" .");
        }
        if let Some(la) = self.lookahead {
            out.push_str(", ");
            out.push_str(grammar.terminal_name(la));
        }
        out
    }
}

pub(crate) type ItemSet = BTreeSet<Item>;

/// Closure and goto over one grammar.
pub(crate) struct ItemSets<'g, T, V> {
    grammar: &'g Grammar<T, V>,
    analysis: &'g GrammarAnalysis,
    rules_by_lhs: Vec<Vec<RuleId>>,
    lookaheads: bool,
}

impl<'g, T, V> ItemSets<'g, T, V> {
    pub(crate) fn new(
        grammar: &'g Grammar<T, V>,
        analysis: &'g GrammarAnalysis,
        lookaheads: bool,
    ) -> Self {
        let mut rules_by_lhs = vec![Vec::new(); grammar.non_terminal_count()];
        for rule in grammar.rules() {
            rules_by_lhs[rule.lhs().index()].push(rule.id());
        }
        Self {
            grammar,
            analysis,
            rules_by_lhs,
            lookaheads,
        }
    }

    /// Kernel of the initial state: `$start -> . start` (on `$end` for LR(1)).
    pub(crate) fn initial_kernel(&self) -> ItemSet {
        let lookahead = self.lookaheads.then(|| self.grammar.end());
        BTreeSet::from([Item::new(RuleId(0), 0, lookahead)])
    }

    /// Closure of a kernel.
    ///
    /// For `[A -> α . B β, a]` every rule `B -> γ` contributes `[B -> . γ, b]`
    /// for each `b` in FIRST(β a).
    pub(crate) fn closure(&self, kernel: &ItemSet) -> ItemSet {
        let mut items = kernel.clone();
        let mut pending: Vec<Item> = kernel.iter().copied().collect();
        while let Some(item) = pending.pop() {
            let Some(Symbol::NonTerminal(nt)) = item.next_symbol(self.grammar) else {
                continue;
            };
            for lookahead in self.lookaheads_after(item) {
                for rule in &self.rules_by_lhs[nt.index()] {
                    let new = Item::new(*rule, 0, lookahead);
                    if items.insert(new) {
                        pending.push(new);
                    }
                }
            }
        }
        items
    }

    fn lookaheads_after(&self, item: Item) -> Vec<Option<Terminal>> {
        if !self.lookaheads {
            return vec![None];
        }
        let rhs = self.grammar.rule(item.rule).rhs();
        let (first, nullable) = self.analysis.first_of(&rhs[item.dot + 1..]);
        let mut out: Vec<Option<Terminal>> = first.into_iter().map(Some).collect();
        if nullable {
            if let Some(la) = item.lookahead {
                if !out.contains(&Some(la)) {
                    out.push(Some(la));
                }
            }
        }
        out
    }

    /// Kernels reachable from a closed item set, keyed (and so ordered) by symbol.
    pub(crate) fn transitions(&self, items: &ItemSet) -> BTreeMap<Symbol, ItemSet> {
        let mut out: BTreeMap<Symbol, ItemSet> = BTreeMap::new();
        for item in items {
            if let Some(symbol) = item.next_symbol(self.grammar) {
                out.entry(symbol).or_default().insert(item.advance());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    fn sum_grammar() -> Grammar<(), ()> {
        let mut b = GrammarBuilder::<(), ()>::new();
        let plus = b.terminal("+");
        let id = b.terminal("id");
        let expr = b.non_terminal("expr");
        b.rule(expr, [expr.into(), plus.into(), id.into()], |_| ());
        b.rule(expr, [id.into()], |_| ());
        b.start(expr);
        b.build().expect("grammar builds")
    }

    #[test]
    fn closure_propagates_lookaheads() {
        let g = sum_grammar();
        let a = GrammarAnalysis::new(&g);
        let sets = ItemSets::new(&g, &a, true);
        let closure = sets.closure(&sets.initial_kernel());
        let plus = g.terminal("+").unwrap();

        // $start -> . expr, $end ; expr -> . expr + id, {$end, +} ; expr -> . id, {$end, +}
        assert_eq!(closure.len(), 5);
        assert!(closure.contains(&Item::new(RuleId(1), 0, Some(plus))));
        assert!(closure.contains(&Item::new(RuleId(2), 0, Some(g.end()))));
    }

    #[test]
    fn lr0_closure_has_no_lookaheads() {
        let g = sum_grammar();
        let a = GrammarAnalysis::new(&g);
        let sets = ItemSets::new(&g, &a, false);
        let closure = sets.closure(&sets.initial_kernel());
        assert_eq!(closure.len(), 3);
        assert!(closure.iter().all(|item| item.lookahead.is_none()));
    }

    #[test]
    fn item_display_marks_the_dot() {
        let g = sum_grammar();
        let item = Item::new(RuleId(1), 1, Some(g.end()));
        assert_eq!(item.display(&g), "expr -> expr . + id, $end");
        assert_eq!(Item::new(RuleId(2), 1, None).display(&g), "expr -> id .");
    }
}
