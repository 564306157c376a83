//! LR table rendering
//!
//! Renders a grammar's [`LrTable`] as a plain-text action/goto listing, as a
//! Graphviz state graph, or as JSON.

use serde::Serialize;
use std::fmt;
use weave::grammar::Grammar;
use weave::lr::{Action, ConflictKind, LrTable, Resolution, TableAlgorithm};

fn action_label(action: Action) -> String {
    match action {
        Action::Shift(state) => format!("s{state}"),
        Action::Reduce(rule) => format!("r{}", rule.index()),
        Action::Accept => "acc".to_string(),
        Action::Error => String::new(),
    }
}

const fn kind_label(kind: ConflictKind) -> &'static str {
    match kind {
        ConflictKind::ShiftReduce => "shift/reduce",
        ConflictKind::ReduceReduce => "reduce/reduce",
    }
}

fn resolution_line<T, V>(grammar: &Grammar<T, V>, resolution: &Resolution) -> String {
    let rejected = resolution
        .rejected
        .iter()
        .map(|action| action_label(*action))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "state {} on `{}`: {} kept {} over {}",
        resolution.state,
        grammar.terminal_name(resolution.terminal),
        kind_label(resolution.kind),
        action_label(resolution.chosen),
        rejected,
    )
}

/// Plain-text listing: rules, then per state its kernel, actions and gotos.
pub struct TableText<'a, T, V> {
    pub grammar: &'a Grammar<T, V>,
    pub table: &'a LrTable,
    pub show_conflicts: bool,
}

impl<T, V> fmt::Display for TableText<'_, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            grammar,
            table,
            show_conflicts,
        } = *self;
        writeln!(
            f,
            "{:?} table: {} states, {} resolved conflicts",
            table.algorithm(),
            table.state_count(),
            table.resolutions().len()
        )?;
        writeln!(f)?;
        write!(f, "{}", RulesText(grammar))?;

        for state in 0..table.state_count() {
            writeln!(f)?;
            writeln!(f, "state {state}")?;
            for item in table.kernel(state) {
                writeln!(f, "    {}", item.display(grammar))?;
            }
            for (terminal, action) in table.actions(state) {
                writeln!(
                    f,
                    "    {:<8} {}",
                    grammar.terminal_name(terminal),
                    action_label(action)
                )?;
            }
            for (nt, target) in table.gotos(state) {
                writeln!(f, "    {:<8} goto {target}", grammar.non_terminal_name(nt))?;
            }
        }

        if show_conflicts && !table.resolutions().is_empty() {
            writeln!(f)?;
            writeln!(f, "resolutions")?;
            for resolution in table.resolutions() {
                writeln!(f, "    {}", resolution_line(grammar, resolution))?;
            }
        }
        Ok(())
    }
}

/// Numbered rule listing, with priority and associativity when set.
pub struct RulesText<'a, T, V>(pub &'a Grammar<T, V>);

impl<T, V> fmt::Display for RulesText<'_, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grammar = self.0;
        for rule in grammar.rules() {
            write!(f, "{:>3}: {}", rule.id().index(), grammar.display_rule(rule.id()))?;
            if rule.priority() != 0 {
                write!(f, "  [priority {}]", rule.priority())?;
            }
            if let Some(associativity) = rule.associativity() {
                write!(f, "  [{associativity:?}]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Graphviz state graph; shift edges are solid, gotos dashed.
pub struct TableDot<'a, T, V> {
    pub grammar: &'a Grammar<T, V>,
    pub table: &'a LrTable,
    pub show_conflicts: bool,
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl<T, V> fmt::Display for TableDot<'_, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            grammar,
            table,
            show_conflicts,
        } = *self;
        let conflicted: Vec<usize> = table.resolutions().iter().map(|r| r.state).collect();

        writeln!(f, "digraph LrTable {{")?;
        writeln!(f, "  rankdir=LR;")?;
        writeln!(f, "  node [shape=box, fontname=\"monospace\"];")?;
        writeln!(f)?;

        for state in 0..table.state_count() {
            let mut label = format!("{state}");
            for item in table.kernel(state) {
                label.push_str("\\l");
                label.push_str(&escape(&item.display(grammar)));
            }
            label.push_str("\\l");
            let style = if show_conflicts && conflicted.contains(&state) {
                ", style=filled, fillcolor=lightyellow"
            } else {
                ""
            };
            writeln!(f, "  s{state} [label=\"{label}\"{style}];")?;
        }
        writeln!(f)?;

        for state in 0..table.state_count() {
            for (terminal, action) in table.actions(state) {
                if let Action::Shift(target) = action {
                    writeln!(
                        f,
                        "  s{state} -> s{target} [label=\"{}\"];",
                        escape(grammar.terminal_name(terminal))
                    )?;
                }
            }
            for (nt, target) in table.gotos(state) {
                writeln!(
                    f,
                    "  s{state} -> s{target} [label=\"{}\", style=dashed];",
                    escape(grammar.non_terminal_name(nt))
                )?;
            }
        }
        writeln!(f, "}}")
    }
}

#[derive(Debug, Serialize)]
pub struct TableReport {
    pub algorithm: TableAlgorithm,
    pub rules: Vec<String>,
    pub states: Vec<StateReport>,
    pub resolutions: Vec<ResolutionReport>,
}

#[derive(Debug, Serialize)]
pub struct StateReport {
    pub id: usize,
    pub kernel: Vec<String>,
    pub actions: Vec<(String, String)>,
    pub gotos: Vec<(String, usize)>,
}

#[derive(Debug, Serialize)]
pub struct ResolutionReport {
    pub state: usize,
    pub terminal: String,
    pub kind: &'static str,
    pub chosen: String,
    pub rejected: Vec<String>,
}

impl TableReport {
    #[must_use]
    pub fn new<T, V>(grammar: &Grammar<T, V>, table: &LrTable) -> Self {
        let rules = grammar
            .rules()
            .iter()
            .map(|rule| grammar.display_rule(rule.id()))
            .collect();
        let states = (0..table.state_count())
            .map(|id| StateReport {
                id,
                kernel: table.kernel(id).iter().map(|item| item.display(grammar)).collect(),
                actions: table
                    .actions(id)
                    .map(|(t, action)| (grammar.terminal_name(t).to_string(), action_label(action)))
                    .collect(),
                gotos: table
                    .gotos(id)
                    .map(|(nt, target)| (grammar.non_terminal_name(nt).to_string(), target))
                    .collect(),
            })
            .collect();
        let resolutions = table
            .resolutions()
            .iter()
            .map(|r| ResolutionReport {
                state: r.state,
                terminal: grammar.terminal_name(r.terminal).to_string(),
                kind: kind_label(r.kind),
                chosen: action_label(r.chosen),
                rejected: r.rejected.iter().map(|a| action_label(*a)).collect(),
            })
            .collect();
        Self {
            algorithm: table.algorithm(),
            rules,
            states,
            resolutions,
        }
    }
}

/// Pretty-printed JSON of a [`TableReport`].
///
/// # Errors
/// Serialization errors from `serde_json`.
pub fn generate_json<T, V>(grammar: &Grammar<T, V>, table: &LrTable) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&TableReport::new(grammar, table))
}
