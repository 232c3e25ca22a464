use std::{collections::BTreeSet, fmt::Display};

use itertools::Itertools;
use log::trace;

use crate::{
    fsm::{compile, Graph, ReError, State},
    parser::parse,
};

pub type StateSet = BTreeSet<State>;

/// One snapshot of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Positions in the graph's rule list that fired on one symbol.
    Rules(Vec<usize>),
    /// Active states after a symbol (or before the first one).
    States(Vec<State>),
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rules(rules) => write!(f, "rules [{}]", rules.iter().join(", ")),
            Self::States(states) => write!(f, "states {{{}}}", states.iter().join(", ")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    pub steps: Vec<Step>,
    pub accepted: bool,
}

impl Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for step in &self.steps {
            writeln!(f, "{}", step)?;
        }
        write!(f, "{}", if self.accepted { "accepted" } else { "rejected" })
    }
}

pub trait Matcher {
    fn is_match(&self, text: &str) -> bool;
    fn trace(&self, text: &str) -> Trace;
}

/// Simulates a compiled graph. The graph is never modified, so one
/// evaluator serves any number of runs.
#[derive(Debug, Clone)]
pub struct Evaluator {
    graph: Graph,
}

impl Evaluator {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// States reachable from `state` through epsilon rules alone.
    pub fn epsilon_closure(&self, state: State) -> StateSet {
        let mut closure = StateSet::new();
        let mut stack = vec![state];
        while let Some(current) = stack.pop() {
            if closure.insert(current) {
                stack.extend(
                    self.graph
                        .rules()
                        .iter()
                        .filter(|rule| {
                            rule.is_epsilon() && rule.from == current && !rule.is_self_loop()
                        })
                        .map(|rule| rule.to),
                );
            }
        }
        closure
    }

    /// Positions of the consuming rules leaving `states` that accept `symbol`.
    pub fn matching_rules(&self, states: &StateSet, symbol: char) -> Vec<usize> {
        self.graph
            .rules()
            .iter()
            .positions(|rule| states.contains(&rule.from) && rule.accepts(symbol))
            .collect()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.run(text, None)
    }

    fn run(&self, text: &str, mut steps: Option<&mut Vec<Step>>) -> bool {
        let mut states = self.epsilon_closure(self.graph.start());
        if let Some(steps) = steps.as_mut() {
            steps.push(Step::States(states.iter().copied().collect_vec()));
        }

        for symbol in text.chars() {
            let rules = self.matching_rules(&states, symbol);
            states = rules
                .iter()
                .flat_map(|&index| self.epsilon_closure(self.graph.rules()[index].to))
                .collect();
            trace!(
                "{:?}: {} rules fired, {} states active",
                symbol,
                rules.len(),
                states.len()
            );

            if let Some(steps) = steps.as_mut() {
                if !rules.is_empty() {
                    steps.push(Step::Rules(rules));
                }
                if !states.is_empty() {
                    steps.push(Step::States(states.iter().copied().collect_vec()));
                }
            }
        }

        states.contains(&self.graph.end())
    }
}

impl Matcher for Evaluator {
    fn is_match(&self, text: &str) -> bool {
        self.matches(text)
    }

    fn trace(&self, text: &str) -> Trace {
        let mut steps = Vec::new();
        let accepted = self.run(text, Some(&mut steps));
        Trace { steps, accepted }
    }
}

/// A pattern compiled straight from its text.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: String,
    evaluator: Evaluator,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Regex, ReError> {
        let graph = compile(&parse(pattern)?);
        Ok(Regex {
            pattern: pattern.to_string(),
            evaluator: Evaluator::new(graph),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn graph(&self) -> &Graph {
        self.evaluator.graph()
    }
}

impl Matcher for Regex {
    fn is_match(&self, text: &str) -> bool {
        self.evaluator.matches(text)
    }

    fn trace(&self, text: &str) -> Trace {
        self.evaluator.trace(text)
    }
}
