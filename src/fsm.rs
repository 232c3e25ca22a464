use std::{collections::BTreeSet, error::Error, fmt::Display};

use colored::Colorize;
use itertools::Itertools;
use log::debug;

use crate::parser::{
    parse, visitor::Visitor, Character, Data, Expression, Group, Modifier, Node, ParserError,
    Start, Term,
};

/// Identity of an automaton state. Ids are unique within one compilation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct State(usize);

impl State {
    pub fn id(&self) -> usize {
        self.0
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Predicate {
    Equal(char),
    Any,
    /// Free transition, never matches a symbol.
    Epsilon,
}

impl Predicate {
    pub fn accepts(&self, symbol: char) -> bool {
        match self {
            Self::Equal(expected) => *expected == symbol,
            Self::Any => true,
            Self::Epsilon => false,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Self::Epsilon)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equal(c) => write!(f, "{}", c),
            Self::Any => write!(f, "ANY"),
            Self::Epsilon => write!(f, "ε"),
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Rule {
    pub from: State,
    pub to: State,
    pub predicate: Predicate,
}

impl Rule {
    pub fn new(from: State, to: State, predicate: Predicate) -> Self {
        Self {
            from,
            to,
            predicate,
        }
    }

    pub fn epsilon(from: State, to: State) -> Self {
        Self::new(from, to, Predicate::Epsilon)
    }

    pub fn accepts(&self, symbol: char) -> bool {
        self.predicate.accepts(symbol)
    }

    pub fn is_epsilon(&self) -> bool {
        self.predicate.is_epsilon()
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -{}-> {}", self.from, self.predicate, self.to)
    }
}

/// A compiled automaton: one start state, one end state and the rules in
/// construction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    label: String,
    start: State,
    end: State,
    rules: Vec<Rule>,
}

impl Graph {
    fn new(label: String, start: State, end: State, rules: Vec<Rule>) -> Self {
        Self {
            label,
            start,
            end,
            rules,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn start(&self) -> State {
        self.start
    }

    pub fn end(&self) -> State {
        self.end
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Every state the graph mentions, in ascending id order.
    pub fn states(&self) -> Vec<State> {
        let mut states: BTreeSet<State> = BTreeSet::from([self.start, self.end]);
        for rule in &self.rules {
            states.insert(rule.from);
            states.insert(rule.to);
        }
        states.into_iter().collect()
    }
}

impl Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} -> {}", self.label, self.start, self.end)?;
        if !self.rules.is_empty() {
            write!(f, "\n{}", self.rules.iter().join("\n"))?;
        }
        Ok(())
    }
}

type Fragment = (State, State);

/// Hands out fresh states for a single compilation and builds the
/// Thompson fragments on top of them.
#[derive(Debug, Default)]
pub struct StateAllocator {
    state_counter: usize,
}

impl StateAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gen_state(&mut self) -> State {
        let state = State(self.state_counter);
        self.state_counter += 1;
        state
    }

    pub fn fragment(&mut self) -> Fragment {
        (self.gen_state(), self.gen_state())
    }

    pub fn allocated(&self) -> usize {
        self.state_counter
    }

    fn symbol_transition(&mut self, label: String, predicate: Predicate) -> Graph {
        let (start, end) = self.fragment();
        Graph::new(label, start, end, vec![Rule::new(start, end, predicate)])
    }

    pub fn literal(&mut self, symbol: char) -> Graph {
        self.symbol_transition(symbol.to_string(), Predicate::Equal(symbol))
    }

    pub fn wildcard(&mut self) -> Graph {
        self.symbol_transition(Character::Wildcard.to_string(), Predicate::Any)
    }

    /// `^` and `$` compile to a single state with an epsilon self-loop; they
    /// do not check the input position.
    pub fn anchor(&mut self, symbol: char) -> Graph {
        let state = self.gen_state();
        Graph::new(
            symbol.to_string(),
            state,
            state,
            vec![Rule::epsilon(state, state)],
        )
    }

    /// Graph of the empty pattern: accepts only the empty input.
    pub fn empty(&mut self) -> Graph {
        let state = self.gen_state();
        Graph::new(String::new(), state, state, Vec::new())
    }

    pub fn zero_or_one(&mut self, subject: Graph) -> Graph {
        let (start, end) = self.fragment();
        let Graph {
            label,
            start: inner_start,
            end: inner_end,
            rules,
        } = subject;
        Graph::new(
            format!("{}?", label),
            start,
            end,
            rules
                .into_iter()
                .chain([
                    Rule::epsilon(start, end),
                    Rule::epsilon(start, inner_start),
                    Rule::epsilon(inner_end, end),
                ])
                .collect(),
        )
    }

    pub fn zero_or_more(&mut self, subject: Graph) -> Graph {
        let (start, end) = self.fragment();
        let Graph {
            label,
            start: inner_start,
            end: inner_end,
            rules,
        } = subject;
        Graph::new(
            format!("{}*", label),
            start,
            end,
            rules
                .into_iter()
                .chain([
                    Rule::epsilon(start, end),
                    Rule::epsilon(start, inner_start),
                    Rule::epsilon(inner_end, end),
                    Rule::epsilon(inner_end, inner_start),
                ])
                .collect(),
        )
    }
}

/// Rules of `left`, then rules of `right`, then `links`.
fn join_rules(
    left: Vec<Rule>,
    right: Vec<Rule>,
    links: impl IntoIterator<Item = Rule>,
) -> Vec<Rule> {
    // graphs are folded from the right, so `right` is usually the long one
    let mut rules = right;
    rules.splice(0..0, left);
    rules.extend(links);
    rules
}

pub fn concat(left: Graph, right: Graph) -> Graph {
    let link = Rule::epsilon(left.end, right.start);
    Graph::new(
        format!("{}{}", left.label, right.label),
        left.start,
        right.end,
        join_rules(left.rules, right.rules, [link]),
    )
}

/// Alternation sharing the left start and the right end.
pub fn either(left: Graph, right: Graph) -> Graph {
    let links = [
        Rule::epsilon(left.start, right.start),
        Rule::epsilon(left.end, right.end),
    ];
    Graph::new(
        format!("{}|{}", left.label, right.label),
        left.start,
        right.end,
        join_rules(left.rules, right.rules, links),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReError {
    ParsingFailed(ParserError),
    CompilationError(String),
}

impl From<ParserError> for ReError {
    fn from(err: ParserError) -> Self {
        ReError::ParsingFailed(err)
    }
}

impl Display for ReError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParsingFailed(err) => write!(f, "{}", err),
            Self::CompilationError(reason) => write!(
                f,
                "{} {}: {}",
                format!("[{:0>3}]", 2).red().bold(),
                "failed to compile pattern",
                reason
            ),
        }
    }
}

impl Error for ReError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ParsingFailed(err) => Some(err),
            Self::CompilationError(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Compiler {
    allocator: StateAllocator,
}

impl Visitor for Compiler {
    type Result = Graph;

    fn visit_start(&mut self, start: &Start) -> Self::Result {
        self.allocator = StateAllocator::new();
        match &start.0 {
            Some(expression) => expression.accept(self),
            None => self.allocator.empty(),
        }
    }

    fn visit_expression(&mut self, expression: &Expression) -> Self::Result {
        // terms are built left to right, then joined from the right
        let graphs = expression
            .terms()
            .map(|term| (term.precedes_pipe, term.accept(self)))
            .collect_vec();
        let (_, graph) = graphs
            .into_iter()
            .rev()
            .reduce(|(_, tail), (precedes_pipe, head)| {
                let joined = if precedes_pipe {
                    either(head, tail)
                } else {
                    concat(head, tail)
                };
                (precedes_pipe, joined)
            })
            .unwrap_or_else(|| (false, self.allocator.empty()));
        graph
    }

    fn visit_term(&mut self, term: &Term) -> Self::Result {
        match term.modifier {
            None => term.item.accept(self),
            Some(Modifier::ZeroOrOne) => {
                let subject = term.item.accept(self);
                self.allocator.zero_or_one(subject)
            }
            Some(Modifier::ZeroOrMore) => {
                let subject = term.item.accept(self);
                self.allocator.zero_or_more(subject)
            }
            Some(Modifier::OneOrMore) => {
                // the item is built twice; the copies share no states
                let once = term.item.accept(self);
                let subject = term.item.accept(self);
                concat(once, self.allocator.zero_or_more(subject))
            }
        }
    }

    fn visit_group(&mut self, group: &Group) -> Self::Result {
        group.0.accept(self)
    }

    fn visit_character(&mut self, character: &Character) -> Self::Result {
        match character {
            Character::Literal(symbol) => self.allocator.literal(*symbol),
            Character::Wildcard => self.allocator.wildcard(),
            Character::StartAnchor | Character::EndAnchor => {
                self.allocator.anchor(character.symbol())
            }
        }
    }
}

pub fn compile(root: &Start) -> Graph {
    let mut compiler = Compiler::default();
    let graph = root.accept(&mut compiler);
    debug!(
        "compiled {:?}: {} states, {} rules",
        graph.label(),
        compiler.allocator.allocated(),
        graph.rules().len()
    );
    graph
}

/// Compiles any syntax node. Modifiers only have meaning inside a term.
pub fn compile_node(node: &Node) -> Result<Graph, ReError> {
    let mut compiler = Compiler::default();
    match node {
        Node::Start(root) => Ok(compile(root)),
        Node::Expression(expression) => Ok(expression.accept(&mut compiler)),
        Node::Term(term) => Ok(term.accept(&mut compiler)),
        Node::Item(item) => Ok(item.accept(&mut compiler)),
        Node::Group(group) => Ok(group.accept(&mut compiler)),
        Node::Character(character) => Ok(character.accept(&mut compiler)),
        Node::Modifier(modifier) => Err(ReError::CompilationError(format!(
            "modifier `{}` is not attached to an item",
            modifier
        ))),
    }
}

pub fn compile_pattern(pattern: &str) -> Result<Graph, ReError> {
    Ok(compile(&parse(pattern)?))
}
