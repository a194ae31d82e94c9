//! Schema introspection: a bounded textual description of the ontology used
//! to ground the external model, so its structured output only references
//! classes and properties that actually exist.
//!
//! The description is ephemeral: regenerated on every call, never cached.
//! It must always be produced; a problem while rendering one hierarchy
//! branch skips that branch only.

use std::collections::HashSet;

use tracing::debug;

use crate::ontology::Ontology;

// hierarchies deeper than this are assumed cyclic and abandoned
const MAX_HIERARCHY_DEPTH: usize = 16;

/// Render the grounding text. Never fails and is never empty, even for an
/// ontology with no classes at all.
pub fn describe(onto: &Ontology) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("CLASSES:".to_owned());
    let mut seen: HashSet<&str> = HashSet::new();
    for class in onto.classes() {
        // the universal root type says nothing useful to the model
        if class.name() == "Thing" || !seen.insert(class.name()) {
            continue;
        }
        match class.comment() {
            Some(comment) => lines.push(format!("  - {}: {}", class.name(), comment)),
            None => lines.push(format!("  - {}", class.name())),
        }
    }

    lines.push(String::new());
    lines.push("RELATIONSHIPS (object properties):".to_owned());
    for prop in onto.object_properties() {
        let domain = prop.domain().unwrap_or("Thing");
        let range = prop.range().unwrap_or("Thing");
        match prop.comment() {
            Some(comment) => {
                lines.push(format!("  - {}: ({} → {}) {}", prop.name(), domain, range, comment))
            }
            None => lines.push(format!("  - {}: ({} → {})", prop.name(), domain, range)),
        }
    }

    lines.push(String::new());
    lines.push("ATTRIBUTES (data properties):".to_owned());
    for prop in onto.data_properties() {
        let domain = prop.domain().unwrap_or("Thing");
        lines.push(format!("  - {}: ({} → {})", prop.name(), domain, prop.range().name()));
    }

    if onto.class_named("Genre").is_some() {
        lines.push(String::new());
        lines.push("GENRE HIERARCHY:".to_owned());
        let mut visited = HashSet::new();
        for sub in onto.subclasses_of("Genre") {
            render_branch(onto, sub.name(), 2, &mut visited, &mut lines);
        }
    }

    lines.join("\n")
}

fn render_branch(
    onto: &Ontology,
    name: &str,
    indent: usize,
    visited: &mut HashSet<String>,
    lines: &mut Vec<String>,
) {
    if indent / 2 > MAX_HIERARCHY_DEPTH || !visited.insert(name.to_owned()) {
        // cyclic or runaway branch: drop it, keep the rest of the description
        debug!(class = name, "skipping genre hierarchy branch");
        return;
    }
    lines.push(format!("{}- {}", " ".repeat(indent), name));
    for sub in onto.subclasses_of(name) {
        render_branch(onto, sub.name(), indent + 2, visited, lines);
    }
}
