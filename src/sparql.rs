//! Parsing and evaluation of the query subset the compiler emits.
//!
//! The produced grammar is fixed:
//! `PREFIX ns: <iri> SELECT DISTINCT ?v… WHERE { patterns filters }
//! [ORDER BY DIR(?v)] LIMIT n`, with triple patterns over variables and
//! prefixed names, and FILTER expressions limited to comparisons,
//! `CONTAINS(LCASE(?v), "…")` and `LCASE(?v) = "…"`.
//!
//! Evaluation is a nested-loop join over the patterns in text order,
//! carrying a bindings map per partial solution, then filter application,
//! DISTINCT, ORDER BY and LIMIT.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::datatype::Literal;
use crate::error::{BibliographError, Result};
use crate::ontology::{NodeHasher, NodeId, Object, Ontology, OtherHasher, Statement};

lazy_static! {
    static ref PREFIX_RE: Regex = Regex::new(r"PREFIX\s+(\w+):\s*<([^>]*)>").unwrap();
    static ref SELECT_RE: Regex =
        Regex::new(r"SELECT\s+(DISTINCT\s+)?((?:\?\w+\s*)+)WHERE").unwrap();
    static ref ORDER_RE: Regex = Regex::new(r"ORDER\s+BY\s+(ASC|DESC)\(\?(\w+)\)").unwrap();
    static ref LIMIT_RE: Regex = Regex::new(r"LIMIT\s+(\d+)").unwrap();
    static ref TRIPLE_RE: Regex =
        Regex::new(r"^(\?\w+|\w+:\w+)\s+(a|\w+:\w+)\s+(\?\w+|\w+:\w+)$").unwrap();
    static ref CONTAINS_RE: Regex =
        Regex::new(r#"^CONTAINS\(\s*LCASE\(\?(\w+)\)\s*,\s*"((?:[^"\\]|\\.)*)"\s*\)$"#).unwrap();
    static ref LCASE_EQ_RE: Regex =
        Regex::new(r#"^LCASE\(\?(\w+)\)\s*(=|!=)\s*"((?:[^"\\]|\\.)*)"$"#).unwrap();
    static ref COMPARE_RE: Regex =
        Regex::new(r#"^\?(\w+)\s*(>=|<=|!=|=|>|<)\s*(.+)$"#).unwrap();
    static ref STRING_RHS_RE: Regex = Regex::new(r#"^"((?:[^"\\]|\\.)*)"$"#).unwrap();
}

// ------------- Query AST -------------
#[derive(Debug, Clone, PartialEq)]
enum Term {
    Var(String),
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    /// The `a` keyword: subject is an instance of the named class.
    A,
    Name(String),
}

#[derive(Debug, Clone)]
struct TriplePattern {
    subject: Term,
    predicate: Predicate,
    object: Term,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}
impl CmpOp {
    fn from_symbol(s: &str) -> Option<CmpOp> {
        Some(match s {
            "=" => CmpOp::Eq,
            "!=" => CmpOp::Ne,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::Le,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::Ge,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
enum Constraint {
    /// `?v op literal`, or the case-insensitive `LCASE(?v) op "…"` form.
    Compare { var: String, op: CmpOp, value: Literal, fold_case: bool },
    /// `CONTAINS(LCASE(?v), "…")` — case-insensitive substring.
    Contains { var: String, needle: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug)]
struct SelectQuery {
    vars: Vec<String>,
    distinct: bool,
    patterns: Vec<TriplePattern>,
    constraints: Vec<Constraint>,
    order: Option<(SortDir, String)>,
    limit: Option<usize>,
}

fn parse_error(message: impl Into<String>) -> BibliographError {
    BibliographError::Parse { message: message.into() }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_term(s: &str) -> Term {
    if let Some(v) = s.strip_prefix('?') {
        Term::Var(v.to_owned())
    } else {
        // strip the namespace prefix; only one is ever declared
        Term::Name(s.split_once(':').map(|(_, local)| local).unwrap_or(s).to_owned())
    }
}

// ------------- Parsing -------------
fn parse_query(text: &str) -> Result<SelectQuery> {
    PREFIX_RE
        .captures(text)
        .ok_or_else(|| parse_error("missing PREFIX declaration"))?;
    let select = SELECT_RE
        .captures(text)
        .ok_or_else(|| parse_error("missing SELECT clause"))?;
    let distinct = select.get(1).is_some();
    let vars: Vec<String> = select[2]
        .split_whitespace()
        .map(|v| v.trim_start_matches('?').to_owned())
        .collect();
    if vars.is_empty() {
        return Err(parse_error("SELECT clause projects no variables"));
    }

    let open = text
        .find('{')
        .ok_or_else(|| parse_error("missing opening brace"))?;
    let close = text
        .rfind('}')
        .ok_or_else(|| parse_error("missing closing brace"))?;
    if close <= open {
        return Err(parse_error("malformed WHERE block"));
    }
    let body = &text[open + 1..close];
    let tail = &text[close + 1..];

    let mut patterns = Vec::new();
    let mut constraints = Vec::new();
    let mut rest = body.trim();
    while !rest.is_empty() {
        if rest.starts_with("FILTER") {
            let (inner, remaining) = take_filter(rest)?;
            constraints.push(parse_constraint(inner.trim())?);
            rest = remaining.trim_start();
        } else {
            let dot = rest
                .find('.')
                .ok_or_else(|| parse_error(format!("unterminated triple pattern: {}", rest)))?;
            let triple = rest[..dot].trim();
            let caps = TRIPLE_RE
                .captures(triple)
                .ok_or_else(|| parse_error(format!("unrecognized triple pattern: {}", triple)))?;
            let predicate = match &caps[2] {
                "a" => Predicate::A,
                qname => Predicate::Name(
                    qname.split_once(':').map(|(_, l)| l).unwrap_or(qname).to_owned(),
                ),
            };
            patterns.push(TriplePattern {
                subject: parse_term(&caps[1]),
                predicate,
                object: parse_term(&caps[3]),
            });
            rest = rest[dot + 1..].trim_start();
        }
    }
    if patterns.is_empty() {
        return Err(parse_error("WHERE block contains no triple patterns"));
    }

    let order = ORDER_RE.captures(tail).map(|caps| {
        let dir = if &caps[1] == "ASC" { SortDir::Asc } else { SortDir::Desc };
        (dir, caps[2].to_owned())
    });
    let limit = LIMIT_RE
        .captures(tail)
        .and_then(|caps| caps[1].parse::<usize>().ok());

    Ok(SelectQuery { vars, distinct, patterns, constraints, order, limit })
}

/// Consume a `FILTER(...)` chunk, respecting nested parens and quoted
/// strings, returning the inner expression and the remainder.
fn take_filter(rest: &str) -> Result<(&str, &str)> {
    let open = rest
        .find('(')
        .ok_or_else(|| parse_error("FILTER without parenthesis"))?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in rest.char_indices().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&rest[open + 1..i], &rest[i + 1..]));
                }
            }
            _ => (),
        }
    }
    Err(parse_error("unbalanced parentheses in FILTER"))
}

fn parse_constraint(inner: &str) -> Result<Constraint> {
    if let Some(caps) = CONTAINS_RE.captures(inner) {
        return Ok(Constraint::Contains {
            var: caps[1].to_owned(),
            needle: unescape(&caps[2]).to_lowercase(),
        });
    }
    if let Some(caps) = LCASE_EQ_RE.captures(inner) {
        let op = CmpOp::from_symbol(&caps[2]).unwrap();
        return Ok(Constraint::Compare {
            var: caps[1].to_owned(),
            op,
            value: Literal::Str(unescape(&caps[3]).to_lowercase()),
            fold_case: true,
        });
    }
    if let Some(caps) = COMPARE_RE.captures(inner) {
        let op = CmpOp::from_symbol(&caps[2])
            .ok_or_else(|| parse_error(format!("unknown operator in filter: {}", inner)))?;
        let rhs = caps[3].trim();
        let value = if let Some(s) = STRING_RHS_RE.captures(rhs) {
            Literal::Str(unescape(&s[1]))
        } else if let Ok(i) = rhs.parse::<i64>() {
            Literal::Int(i)
        } else if let Ok(f) = rhs.parse::<f64>() {
            Literal::Float(f)
        } else {
            return Err(parse_error(format!("unparseable comparison operand: {}", rhs)));
        };
        return Ok(Constraint::Compare { var: caps[1].to_owned(), op, value, fold_case: false });
    }
    Err(parse_error(format!("unrecognized filter expression: {}", inner)))
}

// ------------- Evaluation -------------
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Node(u64),
    Lit(Literal),
}

type Bindings = HashMap<String, Value, OtherHasher>;

fn extend_with_pattern(
    onto: &Ontology,
    pattern: &TriplePattern,
    solutions: Vec<Bindings>,
) -> Result<Vec<Bindings>> {
    let mut next = Vec::new();
    match &pattern.predicate {
        Predicate::A => {
            let class = match &pattern.object {
                Term::Name(name) => name,
                Term::Var(_) => {
                    return Err(parse_error("class position of 'a' must be a name"));
                }
            };
            let Some(instances) = onto.instances_of(class) else {
                return Ok(Vec::new());
            };
            for binding in solutions {
                match &pattern.subject {
                    Term::Var(var) => match binding.get(var) {
                        Some(Value::Node(id)) => {
                            if instances.contains(*id) {
                                next.push(binding);
                            }
                        }
                        Some(Value::Lit(_)) => (),
                        None => {
                            for id in instances.iter() {
                                let mut extended = binding.clone();
                                extended.insert(var.clone(), Value::Node(id));
                                next.push(extended);
                            }
                        }
                    },
                    Term::Name(name) => {
                        if onto.lookup(name).map(|id| instances.contains(id)).unwrap_or(false) {
                            next.push(binding);
                        }
                    }
                }
            }
        }
        Predicate::Name(pred) => {
            let Some(pred_id) = onto.lookup(pred) else {
                return Ok(Vec::new());
            };
            let statements: Vec<&Statement> = onto.statements_with_predicate(pred_id).collect();
            // bound subjects only need to see their own statements
            let mut by_subject: HashMap<NodeId, Vec<&Statement>, NodeHasher> = HashMap::default();
            for statement in &statements {
                by_subject.entry(statement.subject).or_default().push(*statement);
            }
            let empty: Vec<&Statement> = Vec::new();
            for binding in solutions {
                let subject_id = match &pattern.subject {
                    Term::Var(var) => match binding.get(var) {
                        Some(Value::Node(id)) => Some(*id),
                        Some(Value::Lit(_)) => continue,
                        None => None,
                    },
                    Term::Name(name) => {
                        let Some(id) = onto.lookup(name) else { continue };
                        Some(id)
                    }
                };
                let candidates = match subject_id {
                    Some(id) => by_subject.get(&id).unwrap_or(&empty),
                    None => &statements,
                };
                for statement in candidates {
                    let mut extended = binding.clone();
                    if !match_term(onto, &pattern.subject, &Value::Node(statement.subject), &mut extended) {
                        continue;
                    }
                    let object_value = match &statement.object {
                        Object::Node(id) => Value::Node(*id),
                        Object::Literal(lit) => Value::Lit(lit.clone()),
                    };
                    if !match_term(onto, &pattern.object, &object_value, &mut extended) {
                        continue;
                    }
                    next.push(extended);
                }
            }
        }
    }
    Ok(next)
}

fn match_term(onto: &Ontology, term: &Term, value: &Value, binding: &mut Bindings) -> bool {
    match term {
        Term::Var(var) => match binding.get(var) {
            Some(bound) => bound == value,
            None => {
                binding.insert(var.clone(), value.clone());
                true
            }
        },
        Term::Name(name) => match value {
            Value::Node(id) => onto.lookup(name) == Some(*id),
            Value::Lit(_) => false,
        },
    }
}

fn passes(onto: &Ontology, constraint: &Constraint, binding: &Bindings) -> Result<bool> {
    match constraint {
        Constraint::Contains { var, needle } => {
            let text = rendered(onto, var, binding)?;
            Ok(text.to_lowercase().contains(needle.as_str()))
        }
        Constraint::Compare { var, op, value, fold_case } => {
            let bound = binding
                .get(var)
                .ok_or_else(|| BibliographError::Execution(format!("unknown variable ?{} in filter", var)))?;
            let left = match bound {
                Value::Lit(lit) => lit.clone(),
                Value::Node(id) => Literal::Str(
                    onto.name_of(*id).unwrap_or_default().to_owned(),
                ),
            };
            let left = if *fold_case {
                Literal::Str(left.to_string().to_lowercase())
            } else {
                left
            };
            let ordering = match left.compare(value) {
                Some(o) => o,
                None => return Ok(matches!(op, CmpOp::Ne)),
            };
            Ok(match op {
                CmpOp::Eq => ordering.is_eq(),
                CmpOp::Ne => !ordering.is_eq(),
                CmpOp::Lt => ordering.is_lt(),
                CmpOp::Le => ordering.is_le(),
                CmpOp::Gt => ordering.is_gt(),
                CmpOp::Ge => ordering.is_ge(),
            })
        }
    }
}

fn rendered(onto: &Ontology, var: &str, binding: &Bindings) -> Result<String> {
    match binding.get(var) {
        Some(Value::Node(id)) => Ok(onto.name_of(*id).unwrap_or_default().to_owned()),
        Some(Value::Lit(lit)) => Ok(lit.to_string()),
        None => Err(BibliographError::Execution(format!(
            "variable ?{} is not bound by any pattern",
            var
        ))),
    }
}

/// Evaluate query text against the ontology, producing ordered positional
/// rows of display-safe strings, one column per projected variable.
pub fn evaluate(onto: &Ontology, text: &str) -> Result<Vec<Vec<String>>> {
    let query = parse_query(text)?;

    let mut solutions: Vec<Bindings> = vec![Bindings::default()];
    for pattern in &query.patterns {
        solutions = extend_with_pattern(onto, pattern, solutions)?;
        if solutions.is_empty() {
            break;
        }
    }
    let mut kept = Vec::with_capacity(solutions.len());
    'solution: for binding in solutions {
        for constraint in &query.constraints {
            if !passes(onto, constraint, &binding)? {
                continue 'solution;
            }
        }
        kept.push(binding);
    }

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(kept.len());
    let mut seen: HashSet<Vec<String>, OtherHasher> = HashSet::default();
    for binding in &kept {
        let mut row = Vec::with_capacity(query.vars.len());
        for var in &query.vars {
            row.push(rendered(onto, var, binding)?);
        }
        if !query.distinct || seen.insert(row.clone()) {
            rows.push(row);
        }
    }

    if let Some((dir, var)) = &query.order {
        let column = query
            .vars
            .iter()
            .position(|v| v == var)
            .ok_or_else(|| BibliographError::Execution(format!("ORDER BY ?{} is not projected", var)))?;
        rows.sort_by(|a, b| {
            let ordering = match (a[column].parse::<f64>(), b[column].parse::<f64>()) {
                (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
                _ => a[column].cmp(&b[column]),
            };
            match dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            }
        });
    }
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    Ok(rows)
}
