use bibliograph::datatype::LiteralType;
use bibliograph::ontology::{book_schema, Ontology};
use bibliograph::schema::describe;

#[test]
fn empty_ontology_yields_a_usable_description() {
    let onto = Ontology::new("http://example.org/onto#");
    let text = describe(&onto);
    assert!(!text.is_empty());
    assert!(text.contains("CLASSES:"));
    assert!(text.contains("RELATIONSHIPS"));
    assert!(text.contains("ATTRIBUTES"));
    // no Genre class, no hierarchy section
    assert!(!text.contains("GENRE HIERARCHY"));
}

#[test]
fn book_schema_sections_are_complete() {
    let onto = book_schema("http://example.org/onto#");
    let text = describe(&onto);
    for class in ["Book", "Author", "Publisher", "Genre", "User", "Review"] {
        assert!(text.contains(&format!("- {}", class)), "missing class {}", class);
    }
    assert!(text.contains("- has_author: (Book → Author)"));
    assert!(text.contains("- publication_year: (Book → int)"));
    assert!(text.contains("- book_title: (Book → string)"));
}

#[test]
fn universal_root_is_excluded() {
    let mut onto = book_schema("http://example.org/onto#");
    onto.add_class("Thing", None, Some("the universal root"));
    let text = describe(&onto);
    assert!(!text.contains("- Thing"));
}

#[test]
fn missing_domains_fall_back() {
    let mut onto = Ontology::new("http://example.org/onto#");
    onto.add_object_property("relates", None, None, None);
    onto.add_data_property("label", None, LiteralType::Str);
    let text = describe(&onto);
    assert!(text.contains("- relates: (Thing → Thing)"));
    assert!(text.contains("- label: (Thing → string)"));
}

#[test]
fn genre_hierarchy_indents_by_depth() {
    let mut onto = book_schema("http://example.org/onto#");
    onto.add_class("Fantasy", Some("Genre"), None);
    onto.add_class("HighFantasy", Some("Fantasy"), None);
    onto.add_class("Mystery", Some("Genre"), None);
    let text = describe(&onto);
    assert!(text.contains("GENRE HIERARCHY:"));
    assert!(text.contains("\n  - Fantasy"));
    assert!(text.contains("\n    - HighFantasy"));
    assert!(text.contains("\n  - Mystery"));
}

#[test]
fn description_is_rebuilt_not_cached() {
    let mut onto = book_schema("http://example.org/onto#");
    let before = describe(&onto);
    onto.add_class("Western", Some("Genre"), None);
    let after = describe(&onto);
    assert!(!before.contains("Western"));
    assert!(after.contains("Western"));
}
