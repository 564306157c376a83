//! LR action/goto table construction.
//!
//! States are built from a FIFO worklist, transitions are taken in symbol
//! order and item sets are ordered sets, so state numbering and every action
//! are a pure function of the grammar.
//!
//! ## Conflict resolution
//!
//! Per (state, terminal), once all candidate actions are known:
//!
//! 1. The completed augmented item on `$end` is [`Action::Accept`].
//! 2. Competing reductions: the rule with the highest priority wins; two rules
//!    sharing the top priority are a [`TableError::ReduceReduce`].
//! 3. Shift against reduce: the shift's precedence is the highest priority of
//!    the state's kernel items that can shift the terminal, either directly or
//!    as the leading terminal of the non-terminal after the dot. The higher
//!    number wins. On a tie the reduced rule's associativity decides (left
//!    reduces, right shifts); without associativity the table is rejected with
//!    [`TableError::ShiftReduce`].
//!
//! Every resolved conflict is kept in [`LrTable::resolutions`].

use crate::error::TableError;
use crate::grammar::{
    Associativity, Grammar, GrammarAnalysis, NonTerminal, RuleId, Symbol, Terminal,
};
use crate::lr::item::{Item, ItemSet, ItemSets};
use crate::lr::{LrConfig, TableAlgorithm};
use hashbrown::HashMap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// LR parsing action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Shift to state
    Shift(usize),
    /// Reduce using rule
    Reduce(RuleId),
    /// Accept (successful parse)
    Accept,
    /// Error (no action)
    Error,
}

impl Action {
    #[must_use]
    pub const fn shift(state: usize) -> Self {
        Self::Shift(state)
    }

    #[must_use]
    pub const fn reduce(rule: RuleId) -> Self {
        Self::Reduce(rule)
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Kind of a resolved conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

/// A conflict the generator settled, with the action it kept.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolution {
    pub state: usize,
    pub terminal: Terminal,
    pub kind: ConflictKind,
    pub chosen: Action,
    pub rejected: Vec<Action>,
}

/// Immutable LR parsing table with dense action and goto tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrTable {
    algorithm: TableAlgorithm,
    terminal_count: usize,
    non_terminal_count: usize,
    /// `state * terminal_count + terminal`
    actions: Vec<Action>,
    /// `state * non_terminal_count + non_terminal`
    gotos: Vec<Option<usize>>,
    kernels: Vec<Vec<Item>>,
    resolutions: Vec<Resolution>,
}

/// Build a table with the default configuration (canonical LR(1)).
///
/// # Errors
///
/// See [`LrTable::generate`].
pub fn generate<T, V>(grammar: &Grammar<T, V>) -> Result<LrTable, TableError> {
    LrTable::generate(grammar, &LrConfig::default())
}

impl LrTable {
    /// Build the parsing table for `grammar`.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if a conflict cannot be resolved by rule
    /// priority and associativity.
    pub fn generate<T, V>(grammar: &Grammar<T, V>, config: &LrConfig) -> Result<Self, TableError> {
        let analysis = GrammarAnalysis::new(grammar);
        let lookaheads = config.algorithm != TableAlgorithm::Slr;
        let sets = ItemSets::new(grammar, &analysis, lookaheads);

        let mut states = build_automaton(&sets);
        if config.algorithm == TableAlgorithm::Lalr1 {
            states = merge_cores(states);
        }

        let mut builder = TableBuilder {
            grammar,
            analysis: &analysis,
            algorithm: config.algorithm,
            actions: vec![Action::Error; states.len() * grammar.terminal_count()],
            gotos: vec![None; states.len() * grammar.non_terminal_count()],
            resolutions: Vec::new(),
        };
        for (id, state) in states.iter().enumerate() {
            builder.fill_state(id, state)?;
        }

        tracing::debug!(
            algorithm = ?config.algorithm,
            states = states.len(),
            resolutions = builder.resolutions.len(),
            "generated LR table"
        );

        Ok(Self {
            algorithm: config.algorithm,
            terminal_count: grammar.terminal_count(),
            non_terminal_count: grammar.non_terminal_count(),
            actions: builder.actions,
            gotos: builder.gotos,
            kernels: states
                .into_iter()
                .map(|state| state.kernel.into_iter().collect())
                .collect(),
            resolutions: builder.resolutions,
        })
    }

    /// Get action for state and terminal
    #[must_use]
    pub fn action(&self, state: usize, terminal: Terminal) -> Action {
        if terminal.index() >= self.terminal_count {
            return Action::Error;
        }
        self.actions
            .get(state * self.terminal_count + terminal.index())
            .copied()
            .unwrap_or(Action::Error)
    }

    /// Get goto state for state and non-terminal
    #[must_use]
    pub fn goto(&self, state: usize, nt: NonTerminal) -> Option<usize> {
        if nt.index() >= self.non_terminal_count {
            return None;
        }
        self.gotos
            .get(state * self.non_terminal_count + nt.index())
            .copied()
            .flatten()
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.kernels.len()
    }

    #[must_use]
    pub const fn algorithm(&self) -> TableAlgorithm {
        self.algorithm
    }

    /// Kernel items of a state.
    #[must_use]
    pub fn kernel(&self, state: usize) -> &[Item] {
        &self.kernels[state]
    }

    #[must_use]
    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Non-error actions of a state, in terminal order.
    pub fn actions(&self, state: usize) -> impl Iterator<Item = (Terminal, Action)> + '_ {
        (0..self.terminal_count).filter_map(move |t| {
            let terminal = Terminal(t as u32);
            let action = self.action(state, terminal);
            (!action.is_error()).then_some((terminal, action))
        })
    }

    /// Defined gotos of a state, in non-terminal order.
    pub fn gotos(&self, state: usize) -> impl Iterator<Item = (NonTerminal, usize)> + '_ {
        (0..self.non_terminal_count).filter_map(move |nt| {
            let nt = NonTerminal(nt as u32);
            self.goto(state, nt).map(|target| (nt, target))
        })
    }

    /// Terminals that have a non-error action in `state`.
    #[must_use]
    pub fn expected_terminals(&self, state: usize) -> Vec<Terminal> {
        self.actions(state).map(|(t, _)| t).collect()
    }
}

struct State {
    kernel: ItemSet,
    items: ItemSet,
    transitions: BTreeMap<Symbol, usize>,
}

fn build_automaton<T, V>(sets: &ItemSets<'_, T, V>) -> Vec<State> {
    let mut states: Vec<State> = Vec::new();
    let mut index: HashMap<ItemSet, usize, ahash::RandomState> =
        HashMap::with_hasher(ahash::RandomState::new());

    let kernel = sets.initial_kernel();
    index.insert(kernel.clone(), 0);
    states.push(State {
        items: sets.closure(&kernel),
        kernel,
        transitions: BTreeMap::new(),
    });

    let mut worklist = VecDeque::from([0]);
    while let Some(id) = worklist.pop_front() {
        for (symbol, kernel) in sets.transitions(&states[id].items) {
            let target = if let Some(&existing) = index.get(&kernel) {
                existing
            } else {
                let new_id = states.len();
                index.insert(kernel.clone(), new_id);
                states.push(State {
                    items: sets.closure(&kernel),
                    kernel,
                    transitions: BTreeMap::new(),
                });
                worklist.push_back(new_id);
                new_id
            };
            states[id].transitions.insert(symbol, target);
        }
    }
    states
}

/// Merge canonical LR(1) states that share an LR(0) core.
fn merge_cores(states: Vec<State>) -> Vec<State> {
    let mut by_core: HashMap<BTreeSet<(RuleId, usize)>, usize, ahash::RandomState> =
        HashMap::with_hasher(ahash::RandomState::new());
    let mut remap = vec![0; states.len()];
    let mut merged: Vec<State> = Vec::new();

    for (id, state) in states.iter().enumerate() {
        let core: BTreeSet<_> = state.kernel.iter().map(|item| item.core()).collect();
        if let Some(&target) = by_core.get(&core) {
            remap[id] = target;
            merged[target].kernel.extend(state.kernel.iter().copied());
            merged[target].items.extend(state.items.iter().copied());
        } else {
            remap[id] = merged.len();
            by_core.insert(core, merged.len());
            merged.push(State {
                kernel: state.kernel.clone(),
                items: state.items.clone(),
                transitions: BTreeMap::new(),
            });
        }
    }

    for (id, state) in states.into_iter().enumerate() {
        let from = remap[id];
        for (symbol, target) in state.transitions {
            merged[from].transitions.insert(symbol, remap[target]);
        }
    }
    merged
}

struct TableBuilder<'g, T, V> {
    grammar: &'g Grammar<T, V>,
    analysis: &'g GrammarAnalysis,
    algorithm: TableAlgorithm,
    actions: Vec<Action>,
    gotos: Vec<Option<usize>>,
    resolutions: Vec<Resolution>,
}

impl<T, V> TableBuilder<'_, T, V> {
    fn fill_state(&mut self, id: usize, state: &State) -> Result<(), TableError> {
        let grammar = self.grammar;
        let mut reductions: BTreeMap<Terminal, BTreeSet<RuleId>> = BTreeMap::new();
        let mut accepts = false;

        for item in state.items.iter().filter(|item| item.is_complete(grammar)) {
            if item.rule == RuleId(0) {
                accepts = true;
                continue;
            }
            match self.algorithm {
                TableAlgorithm::Slr => {
                    let lhs = grammar.rule(item.rule).lhs();
                    for t in self.analysis.follow(lhs) {
                        reductions.entry(*t).or_default().insert(item.rule);
                    }
                }
                TableAlgorithm::Lr1 | TableAlgorithm::Lalr1 => {
                    if let Some(la) = item.lookahead {
                        reductions.entry(la).or_default().insert(item.rule);
                    }
                }
            }
        }

        let terminal_count = grammar.terminal_count();
        for t in grammar.terminals() {
            let shift = state.transitions.get(&Symbol::Terminal(t)).copied();
            let reduces = reductions.remove(&t).unwrap_or_default();
            let accept = accepts && t == grammar.end();
            let action = self.resolve(id, state, t, shift, &reduces, accept)?;
            self.actions[id * terminal_count + t.index()] = action;
        }

        let non_terminal_count = grammar.non_terminal_count();
        for nt in grammar.non_terminals() {
            self.gotos[id * non_terminal_count + nt.index()] =
                state.transitions.get(&Symbol::NonTerminal(nt)).copied();
        }
        Ok(())
    }

    fn resolve(
        &mut self,
        id: usize,
        state: &State,
        t: Terminal,
        shift: Option<usize>,
        reduces: &BTreeSet<RuleId>,
        accept: bool,
    ) -> Result<Action, TableError> {
        if accept {
            if !reduces.is_empty() {
                self.record(
                    id,
                    t,
                    ConflictKind::ReduceReduce,
                    Action::Accept,
                    reduces.iter().copied().map(Action::Reduce).collect(),
                );
            }
            return Ok(Action::Accept);
        }

        let reduce = if reduces.len() > 1 {
            Some(self.pick_reduction(id, t, reduces)?)
        } else {
            reduces.first().copied()
        };

        Ok(match (shift, reduce) {
            (None, None) => Action::Error,
            (Some(target), None) => Action::Shift(target),
            (None, Some(rule)) => Action::Reduce(rule),
            (Some(target), Some(rule)) => self.shift_or_reduce(id, state, t, target, rule)?,
        })
    }

    fn pick_reduction(
        &mut self,
        id: usize,
        t: Terminal,
        reduces: &BTreeSet<RuleId>,
    ) -> Result<RuleId, TableError> {
        let grammar = self.grammar;
        let top = reduces
            .iter()
            .map(|rule| grammar.rule(*rule).priority())
            .max()
            .unwrap_or_default();
        let mut winners = reduces
            .iter()
            .copied()
            .filter(|rule| grammar.rule(*rule).priority() == top);
        let (Some(winner), second) = (winners.next(), winners.next()) else {
            unreachable!("a non-empty rule set has a top priority");
        };
        if let Some(second) = second {
            return Err(TableError::ReduceReduce {
                state: id,
                terminal: grammar.terminal_name(t).to_owned(),
                first: grammar.display_rule(winner),
                second: grammar.display_rule(second),
                priority: top,
            });
        }
        self.record(
            id,
            t,
            ConflictKind::ReduceReduce,
            Action::Reduce(winner),
            reduces
                .iter()
                .copied()
                .filter(|rule| *rule != winner)
                .map(Action::Reduce)
                .collect(),
        );
        Ok(winner)
    }

    fn shift_or_reduce(
        &mut self,
        id: usize,
        state: &State,
        t: Terminal,
        target: usize,
        rule_id: RuleId,
    ) -> Result<Action, TableError> {
        let grammar = self.grammar;
        let rule = grammar.rule(rule_id);
        let shift_priority = self.shift_priority(state, t);

        let shift_wins = match shift_priority.cmp(&rule.priority()) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match rule.associativity() {
                Some(Associativity::Left) => false,
                Some(Associativity::Right) => true,
                None => {
                    return Err(TableError::ShiftReduce {
                        state: id,
                        terminal: grammar.terminal_name(t).to_owned(),
                        rule: grammar.display_rule(rule_id),
                        priority: shift_priority,
                    })
                }
            },
        };

        let (chosen, rejected) = if shift_wins {
            (Action::Shift(target), Action::Reduce(rule_id))
        } else {
            (Action::Reduce(rule_id), Action::Shift(target))
        };
        self.record(id, t, ConflictKind::ShiftReduce, chosen, vec![rejected]);
        Ok(chosen)
    }

    /// Highest priority among kernel items that can shift `t`.
    fn shift_priority(&self, state: &State, t: Terminal) -> i32 {
        state
            .kernel
            .iter()
            .filter(|item| {
                item.next_symbol(self.grammar)
                    .is_some_and(|symbol| self.analysis.starts_with(symbol, t))
            })
            .map(|item| self.grammar.rule(item.rule).priority())
            .max()
            .unwrap_or_default()
    }

    fn record(
        &mut self,
        state: usize,
        terminal: Terminal,
        kind: ConflictKind,
        chosen: Action,
        rejected: Vec<Action>,
    ) {
        tracing::trace!(
            state,
            terminal = self.grammar.terminal_name(terminal),
            ?kind,
            ?chosen,
            "resolved conflict"
        );
        self.resolutions.push(Resolution {
            state,
            terminal,
            kind,
            chosen,
            rejected,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    /// `expr -> expr op expr | id` with the given operators `(name, priority, assoc)`.
    fn operators(ops: &[(&str, i32, Option<Associativity>)]) -> Grammar<(), ()> {
        let mut b = GrammarBuilder::<(), ()>::new();
        let id = b.terminal("id");
        let expr = b.non_terminal("expr");
        for (name, priority, assoc) in ops {
            let op = b.terminal(name);
            let decl = b.rule(expr, [expr.into(), op.into(), expr.into()], |_| ());
            decl.priority(*priority);
            if let Some(assoc) = assoc {
                decl.associativity(*assoc);
            }
        }
        b.rule(expr, [id.into()], |_| ());
        b.start(expr);
        b.build().expect("grammar builds")
    }

    fn run(grammar: &Grammar<(), ()>, terminals: &[&str]) -> Vec<RuleId> {
        // Drives the table and returns the reductions in order.
        let table = generate(grammar).expect("table builds");
        let mut input: Vec<Terminal> = terminals
            .iter()
            .map(|name| grammar.terminal(name).expect("known terminal"))
            .collect();
        input.push(grammar.end());
        let mut stack = vec![0usize];
        let mut pos = 0;
        let mut reductions = Vec::new();
        loop {
            let state = *stack.last().unwrap();
            match table.action(state, input[pos]) {
                Action::Shift(next) => {
                    stack.push(next);
                    pos += 1;
                }
                Action::Reduce(rule) => {
                    let rule_ref = grammar.rule(rule);
                    stack.truncate(stack.len() - rule_ref.rhs().len());
                    let top = *stack.last().unwrap();
                    stack.push(table.goto(top, rule_ref.lhs()).unwrap());
                    reductions.push(rule);
                }
                Action::Accept => return reductions,
                Action::Error => panic!("unexpected parse error at {pos}"),
            }
        }
    }

    #[test]
    fn higher_priority_operator_binds_tighter() {
        let g = operators(&[
            ("+", 4, Some(Associativity::Left)),
            ("*", 5, Some(Associativity::Left)),
        ]);
        let plus = RuleId(1);
        let times = RuleId(2);
        let reductions: Vec<_> = run(&g, &["id", "+", "id", "*", "id"])
            .into_iter()
            .filter(|r| *r == plus || *r == times)
            .collect();
        assert_eq!(reductions, vec![times, plus]);

        let reductions: Vec<_> = run(&g, &["id", "*", "id", "+", "id"])
            .into_iter()
            .filter(|r| *r == plus || *r == times)
            .collect();
        assert_eq!(reductions, vec![times, plus]);
    }

    #[test]
    fn associativity_breaks_ties() {
        let g = operators(&[
            ("-", 4, Some(Associativity::Left)),
            ("^", 6, Some(Associativity::Right)),
        ]);
        let table = generate(&g).expect("table builds");
        let minus = g.terminal("-").unwrap();
        let caret = g.terminal("^").unwrap();

        let kept_reduce = table.resolutions().iter().any(|r| {
            r.terminal == minus && r.chosen == Action::Reduce(RuleId(1))
        });
        let kept_shift = table.resolutions().iter().any(|r| {
            r.terminal == caret
                && matches!(r.chosen, Action::Shift(_))
                && r.rejected == vec![Action::Reduce(RuleId(2))]
        });
        assert!(kept_reduce);
        assert!(kept_shift);
        assert!(table
            .resolutions()
            .iter()
            .all(|r| r.kind == ConflictKind::ShiftReduce));
    }

    #[test]
    fn tie_without_associativity_is_rejected() {
        let g = operators(&[("+", 4, None)]);
        let err = generate(&g).unwrap_err();
        assert!(matches!(
            err,
            TableError::ShiftReduce { ref terminal, priority: 4, .. } if terminal == "+"
        ));
    }

    #[test]
    fn reduce_reduce_prefers_higher_priority() {
        // expr -> a | b ; a -> id (1) ; b -> id (2)
        let mut b = GrammarBuilder::<(), ()>::new();
        let id = b.terminal("id");
        let expr = b.non_terminal("expr");
        let a = b.non_terminal("a");
        let bb = b.non_terminal("b");
        b.rule(expr, [a.into()], |_| ());
        b.rule(expr, [bb.into()], |_| ());
        b.rule(a, [id.into()], |_| ()).priority(1);
        b.rule(bb, [id.into()], |_| ()).priority(2);
        b.start(expr);
        let g = b.build().expect("grammar builds");

        let table = generate(&g).expect("table builds");
        let rr: Vec<_> = table
            .resolutions()
            .iter()
            .filter(|r| r.kind == ConflictKind::ReduceReduce)
            .collect();
        assert_eq!(rr.len(), 1);
        assert_eq!(rr[0].chosen, Action::Reduce(RuleId(4)));
        assert_eq!(rr[0].rejected, vec![Action::Reduce(RuleId(3))]);
    }

    #[test]
    fn reduce_reduce_tie_is_rejected() {
        let mut b = GrammarBuilder::<(), ()>::new();
        let id = b.terminal("id");
        let expr = b.non_terminal("expr");
        let a = b.non_terminal("a");
        let bb = b.non_terminal("b");
        b.rule(expr, [a.into()], |_| ());
        b.rule(expr, [bb.into()], |_| ());
        b.rule(a, [id.into()], |_| ());
        b.rule(bb, [id.into()], |_| ());
        b.start(expr);
        let g = b.build().expect("grammar builds");

        assert_eq!(
            generate(&g).unwrap_err(),
            TableError::ReduceReduce {
                state: 1,
                terminal: "$end".into(),
                first: "a -> id".into(),
                second: "b -> id".into(),
                priority: 0,
            }
        );
    }

    /// `s -> l = r | r ; l -> * r | id ; r -> l`: LALR(1) but not SLR.
    fn assignment() -> Grammar<(), ()> {
        let mut b = GrammarBuilder::<(), ()>::new();
        let eq = b.terminal("=");
        let star = b.terminal("*");
        let id = b.terminal("id");
        let s = b.non_terminal("s");
        let l = b.non_terminal("l");
        let r = b.non_terminal("r");
        b.rule(s, [l.into(), eq.into(), r.into()], |_| ());
        b.rule(s, [r.into()], |_| ());
        b.rule(l, [star.into(), r.into()], |_| ());
        b.rule(l, [id.into()], |_| ());
        b.rule(r, [l.into()], |_| ());
        b.start(s);
        b.build().expect("grammar builds")
    }

    #[test]
    fn algorithms_differ_in_power() {
        let g = assignment();
        let slr = LrTable::generate(&g, &LrConfig::with_algorithm(TableAlgorithm::Slr));
        assert!(matches!(slr, Err(TableError::ShiftReduce { .. })));

        let lr1 = LrTable::generate(&g, &LrConfig::default()).expect("LR(1) table");
        let lalr = LrTable::generate(&g, &LrConfig::with_algorithm(TableAlgorithm::Lalr1))
            .expect("LALR(1) table");
        assert!(lr1.resolutions().is_empty());
        assert!(lalr.resolutions().is_empty());
        assert!(lalr.state_count() < lr1.state_count());
        assert_eq!(lalr.algorithm(), TableAlgorithm::Lalr1);
    }

    #[test]
    fn generation_is_deterministic() {
        let g = operators(&[
            ("+", 4, Some(Associativity::Left)),
            ("*", 5, Some(Associativity::Left)),
            ("^", 6, Some(Associativity::Right)),
        ]);
        for algorithm in [TableAlgorithm::Lr1, TableAlgorithm::Lalr1, TableAlgorithm::Slr] {
            let config = LrConfig::with_algorithm(algorithm);
            let first = LrTable::generate(&g, &config).expect("table builds");
            let second = LrTable::generate(&g, &config).expect("table builds");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn expected_terminals_in_initial_state() {
        let g = operators(&[("+", 4, Some(Associativity::Left))]);
        let table = generate(&g).expect("table builds");
        assert_eq!(table.expected_terminals(0), vec![g.terminal("id").unwrap()]);
        assert_eq!(table.kernel(0), &[Item::new(RuleId(0), 0, Some(g.end()))]);
        assert_eq!(table.action(0, Terminal(99)), Action::Error);
    }
}
