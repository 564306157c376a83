use crate::error::GrammarError;
use crate::grammar::{Grammar, Symbol};

/// Structural checks run by [`GrammarBuilder::build`](super::GrammarBuilder::build).
pub(crate) fn validate<T, V>(grammar: &Grammar<T, V>) -> Result<(), GrammarError> {
    let end = grammar.end();
    for rule in grammar.rules() {
        if rule.rhs.contains(&Symbol::Terminal(end)) {
            return Err(GrammarError::EndInRule {
                rule: rule.id.index(),
            });
        }
    }

    let mut defined = vec![false; grammar.non_terminal_count()];
    for rule in grammar.rules() {
        defined[rule.lhs.index()] = true;
    }
    if let Some(nt) = grammar.non_terminals().find(|nt| !defined[nt.index()]) {
        return Err(GrammarError::UndefinedNonTerminal(
            grammar.non_terminal_name(nt).to_owned(),
        ));
    }

    let mut reachable = vec![false; grammar.non_terminal_count()];
    let mut used_terminals = vec![false; grammar.terminal_count()];
    let mut stack = vec![grammar.augmented_start()];
    reachable[grammar.augmented_start().index()] = true;
    while let Some(nt) = stack.pop() {
        for rule in grammar.rules_for(nt) {
            for symbol in &rule.rhs {
                match *symbol {
                    Symbol::Terminal(t) => used_terminals[t.index()] = true,
                    Symbol::NonTerminal(next) => {
                        if !reachable[next.index()] {
                            reachable[next.index()] = true;
                            stack.push(next);
                        }
                    }
                }
            }
        }
    }
    if let Some(nt) = grammar.non_terminals().find(|nt| !reachable[nt.index()]) {
        return Err(GrammarError::UnreachableNonTerminal(
            grammar.non_terminal_name(nt).to_owned(),
        ));
    }

    for t in grammar.terminals().filter(|t| *t != end) {
        if !used_terminals[t.index()] {
            tracing::debug!(terminal = grammar.terminal_name(t), "terminal is never used");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::GrammarError;
    use crate::grammar::GrammarBuilder;

    #[test]
    fn undefined_non_terminal() {
        let mut b = GrammarBuilder::<(), ()>::new();
        let expr = b.non_terminal("expr");
        let atom = b.non_terminal("atom");
        b.rule(expr, [atom.into()], |_| ());
        b.start(expr);
        assert_eq!(
            b.build().unwrap_err(),
            GrammarError::UndefinedNonTerminal("atom".into())
        );
    }

    #[test]
    fn unreachable_non_terminal() {
        let mut b = GrammarBuilder::<(), ()>::new();
        let id = b.terminal("id");
        let expr = b.non_terminal("expr");
        let orphan = b.non_terminal("orphan");
        b.rule(expr, [id.into()], |_| ());
        b.rule(orphan, [id.into()], |_| ());
        b.start(expr);
        assert_eq!(
            b.build().unwrap_err(),
            GrammarError::UnreachableNonTerminal("orphan".into())
        );
    }

    #[test]
    fn end_terminal_in_rule() {
        let mut b = GrammarBuilder::<(), ()>::new();
        let end = b.end();
        let expr = b.non_terminal("expr");
        b.rule(expr, [end.into()], |_| ());
        b.start(expr);
        assert_eq!(b.build().unwrap_err(), GrammarError::EndInRule { rule: 1 });
    }

    #[test]
    fn unused_terminals_are_allowed() {
        let mut b = GrammarBuilder::<(), ()>::new();
        let id = b.terminal("id");
        b.terminal("unused");
        let expr = b.non_terminal("expr");
        b.rule(expr, [id.into()], |_| ());
        b.start(expr);
        assert!(b.build().is_ok());
    }
}
