//! Bounded DOT export of the instance graph, for rendering with external
//! tooling. Only relation statements are drawn; literal properties feed the
//! node labels instead.

use std::collections::HashMap;

use crate::ontology::{NodeId, Object, Ontology};

/// The property whose value labels an individual of the given class.
fn label_property(class: &str) -> Option<&'static str> {
    match class {
        "Book" => Some("book_title"),
        "Author" => Some("author_name"),
        "Publisher" => Some("publisher_name"),
        "Genre" => Some("genre_name"),
        "User" => Some("user_name"),
        _ => None,
    }
}

fn shape(class: &str) -> &'static str {
    match class {
        "Book" => "box",
        "Review" => "diamond",
        _ => "ellipse",
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render at most `max_nodes` individuals and the relations between them.
pub fn to_dot(onto: &Ontology, max_nodes: usize) -> String {
    let mut admitted: HashMap<NodeId, usize> = HashMap::new();
    let mut node_lines: Vec<String> = Vec::new();
    let mut edge_lines: Vec<String> = Vec::new();

    let mut admit = |onto: &Ontology, id: NodeId, node_lines: &mut Vec<String>| -> bool {
        if admitted.contains_key(&id) {
            return true;
        }
        if admitted.len() >= max_nodes {
            return false;
        }
        let name = onto.name_of(id).unwrap_or_default().to_owned();
        let class = onto
            .class_of(id)
            .and_then(|c| onto.name_of(c))
            .unwrap_or_default()
            .to_owned();
        let label = label_property(&class)
            .and_then(|p| onto.literal_of(id, p))
            .map(|l| l.to_string())
            .unwrap_or_else(|| name.clone());
        node_lines.push(format!(
            "  \"{}\" [label=\"{}\", shape={}];",
            escape(&name),
            escape(&label),
            shape(&class)
        ));
        admitted.insert(id, admitted.len());
        true
    };

    for statement in onto.statements() {
        let Object::Node(object) = &statement.object else {
            continue;
        };
        let object = *object;
        if !admit(onto, statement.subject, &mut node_lines) {
            continue;
        }
        if !admit(onto, object, &mut node_lines) {
            continue;
        }
        let predicate = onto.name_of(statement.predicate).unwrap_or_default();
        edge_lines.push(format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];",
            escape(onto.name_of(statement.subject).unwrap_or_default()),
            escape(onto.name_of(object).unwrap_or_default()),
            escape(predicate)
        ));
    }

    let mut dot = String::from("digraph ontology {\n  rankdir=LR;\n");
    for line in node_lines {
        dot.push_str(&line);
        dot.push('\n');
    }
    for line in edge_lines {
        dot.push_str(&line);
        dot.push('\n');
    }
    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::Literal;
    use crate::ontology::book_schema;

    #[test]
    fn node_cap_is_respected() {
        let mut onto = book_schema("http://example.org/onto#");
        for i in 0..10 {
            let book = onto.add_individual(&format!("book_{}", i), "Book");
            let author = onto.add_individual(&format!("author_{}", i), "Author");
            onto.assert_relation(book, "has_author", author);
        }
        let dot = to_dot(&onto, 4);
        let nodes = dot.lines().filter(|l| l.contains("shape=")).count();
        assert!(nodes <= 4);
        assert!(dot.starts_with("digraph ontology {"));
    }

    #[test]
    fn labels_prefer_titles() {
        let mut onto = book_schema("http://example.org/onto#");
        let book = onto.add_individual("book_1", "Book");
        onto.assert_literal(book, "book_title", Literal::Str("The Hobbit".into()));
        let author = onto.add_individual("author_0", "Author");
        onto.assert_relation(book, "has_author", author);
        let dot = to_dot(&onto, 50);
        assert!(dot.contains("label=\"The Hobbit\""));
    }
}
