use std::collections::HashMap;

// used to keep the one-to-one mapping between node names and their assigned identities
use bimap::BiMap;

use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

// instance sets per class
use roaring::RoaringTreemap;

use crate::datatype::{Literal, LiteralType};

// ------------- NodeId -------------
pub type NodeId = u64;

pub type NodeHasher = BuildHasherDefault<SeaHasher>;
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub const GENESIS: NodeId = 0;

// ------------- Schema -------------
#[derive(Debug, Clone)]
pub struct ClassDef {
    name: String,
    comment: Option<String>,
    parent: Option<String>,
}
impl ClassDef {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct ObjectPropertyDef {
    name: String,
    domain: Option<String>,
    range: Option<String>,
    comment: Option<String>,
}
impl ObjectPropertyDef {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
    pub fn range(&self) -> Option<&str> {
        self.range.as_deref()
    }
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct DataPropertyDef {
    name: String,
    domain: Option<String>,
    range: LiteralType,
}
impl DataPropertyDef {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
    pub fn range(&self) -> LiteralType {
        self.range
    }
}

// ------------- Statements -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Node(NodeId),
    Literal(Literal),
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub subject: NodeId,
    pub predicate: NodeId,
    pub object: Object,
}

// ------------- Ontology -------------
/// The in-memory graph: an interner handing out node identities, the schema
/// registries, and the statement store with the indexes evaluation needs.
///
/// There is deliberately no global handle; every component receives the
/// ontology it should work against.
pub struct Ontology {
    base_iri: String,
    interner: BiMap<String, NodeId>,
    lower_bound: NodeId,
    classes: Vec<ClassDef>,
    object_properties: Vec<ObjectPropertyDef>,
    data_properties: Vec<DataPropertyDef>,
    statements: Vec<Statement>,
    // index: predicate -> statement positions
    by_predicate: HashMap<NodeId, Vec<usize>, NodeHasher>,
    // class node -> its direct instances
    instances: HashMap<NodeId, RoaringTreemap, NodeHasher>,
    // instance node -> class node
    class_of: HashMap<NodeId, NodeId, NodeHasher>,
}

impl Ontology {
    pub fn new(base_iri: &str) -> Self {
        Self {
            base_iri: base_iri.to_owned(),
            interner: BiMap::new(),
            lower_bound: GENESIS,
            classes: Vec::new(),
            object_properties: Vec::new(),
            data_properties: Vec::new(),
            statements: Vec::new(),
            by_predicate: HashMap::default(),
            instances: HashMap::default(),
            class_of: HashMap::default(),
        }
    }

    pub fn base_iri(&self) -> &str {
        &self.base_iri
    }

    // ------------- interning -------------
    pub fn intern(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.interner.get_by_left(name) {
            return *id;
        }
        self.lower_bound += 1;
        self.interner.insert(name.to_owned(), self.lower_bound);
        self.lower_bound
    }
    /// Re-register a name under the identity it held before persistence.
    /// The restore path must call this before any fresh interning happens.
    pub fn retain(&mut self, name: &str, id: NodeId) {
        self.interner.insert(name.to_owned(), id);
        if id > self.lower_bound {
            self.lower_bound = id;
        }
    }
    pub fn interned(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.interner.iter().map(|(name, id)| (name.as_str(), *id))
    }
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.interner.get_by_left(name).copied()
    }
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.interner.get_by_right(&id).map(|s| s.as_str())
    }

    // ------------- schema registration -------------
    pub fn add_class(&mut self, name: &str, parent: Option<&str>, comment: Option<&str>) {
        self.intern(name);
        self.classes.push(ClassDef {
            name: name.to_owned(),
            comment: comment.map(str::to_owned),
            parent: parent.map(str::to_owned),
        });
    }
    pub fn add_object_property(
        &mut self,
        name: &str,
        domain: Option<&str>,
        range: Option<&str>,
        comment: Option<&str>,
    ) {
        self.intern(name);
        self.object_properties.push(ObjectPropertyDef {
            name: name.to_owned(),
            domain: domain.map(str::to_owned),
            range: range.map(str::to_owned),
            comment: comment.map(str::to_owned),
        });
    }
    pub fn add_data_property(&mut self, name: &str, domain: Option<&str>, range: LiteralType) {
        self.intern(name);
        self.data_properties.push(DataPropertyDef {
            name: name.to_owned(),
            domain: domain.map(str::to_owned),
            range,
        });
    }

    // ------------- schema enumeration -------------
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }
    pub fn object_properties(&self) -> &[ObjectPropertyDef] {
        &self.object_properties
    }
    pub fn data_properties(&self) -> &[DataPropertyDef] {
        &self.data_properties
    }
    pub fn class_named(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.name == name)
    }
    pub fn subclasses_of(&self, name: &str) -> Vec<&ClassDef> {
        self.classes
            .iter()
            .filter(|c| c.parent.as_deref() == Some(name))
            .collect()
    }

    // ------------- individuals and statements -------------
    /// Create (or fetch) an individual of the given class.
    pub fn add_individual(&mut self, name: &str, class: &str) -> NodeId {
        let id = self.intern(name);
        let class_id = self.intern(class);
        self.instances.entry(class_id).or_default().insert(id);
        self.class_of.entry(id).or_insert(class_id);
        id
    }
    pub fn assert_relation(&mut self, subject: NodeId, property: &str, object: NodeId) {
        let predicate = self.intern(property);
        self.push_statement(Statement { subject, predicate, object: Object::Node(object) });
    }
    pub fn assert_literal(&mut self, subject: NodeId, property: &str, value: Literal) {
        let predicate = self.intern(property);
        self.push_statement(Statement { subject, predicate, object: Object::Literal(value) });
    }
    /// Restore paths work with identities instead of names.
    pub fn retain_individual(&mut self, individual: NodeId, class: NodeId) {
        self.instances.entry(class).or_default().insert(individual);
        self.class_of.entry(individual).or_insert(class);
    }
    pub fn retain_statement(&mut self, subject: NodeId, predicate: NodeId, object: Object) {
        self.push_statement(Statement { subject, predicate, object });
    }
    fn push_statement(&mut self, statement: Statement) {
        self.by_predicate
            .entry(statement.predicate)
            .or_default()
            .push(self.statements.len());
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
    pub fn statements_with_predicate(&self, predicate: NodeId) -> impl Iterator<Item = &Statement> {
        self.by_predicate
            .get(&predicate)
            .into_iter()
            .flatten()
            .map(|i| &self.statements[*i])
    }
    /// First literal value of `property` on `subject`, if asserted.
    pub fn literal_of(&self, subject: NodeId, property: &str) -> Option<&Literal> {
        let predicate = self.lookup(property)?;
        self.statements_with_predicate(predicate)
            .find(|s| s.subject == subject)
            .and_then(|s| match &s.object {
                Object::Literal(l) => Some(l),
                Object::Node(_) => None,
            })
    }
    /// First node related to `subject` through `property`, if asserted.
    pub fn related_of(&self, subject: NodeId, property: &str) -> Option<NodeId> {
        let predicate = self.lookup(property)?;
        self.statements_with_predicate(predicate)
            .find(|s| s.subject == subject)
            .and_then(|s| match &s.object {
                Object::Node(id) => Some(*id),
                Object::Literal(_) => None,
            })
    }
    pub fn instances_of(&self, class: &str) -> Option<&RoaringTreemap> {
        self.lookup(class).and_then(|id| self.instances.get(&id))
    }
    pub fn class_of(&self, id: NodeId) -> Option<NodeId> {
        self.class_of.get(&id).copied()
    }
    pub fn typed_individuals(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.class_of.iter().map(|(i, c)| (*i, *c))
    }
    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }
}

/// The fixed book-domain schema. Population happens through ingestion or
/// restoration; this only declares what the graph can talk about.
pub fn book_schema(base_iri: &str) -> Ontology {
    let mut onto = Ontology::new(base_iri);

    onto.add_class("Book", None, Some("A published book"));
    onto.add_class("Author", None, Some("A person who wrote one or more books"));
    onto.add_class("Publisher", None, Some("A publishing organisation"));
    onto.add_class("Genre", None, Some("A book genre; genres may have subgenres"));
    onto.add_class("User", None, Some("A reader who rates books"));
    onto.add_class("Review", None, Some("A single rating of a book by a user"));

    onto.add_object_property("has_author", Some("Book"), Some("Author"), None);
    onto.add_object_property("has_genre", Some("Book"), Some("Genre"), None);
    onto.add_object_property("has_review", Some("Book"), Some("Review"), None);
    onto.add_object_property("has_publisher", Some("Book"), Some("Publisher"), None);
    onto.add_object_property("written_by", Some("Author"), Some("Book"), Some("inverse of has_author"));
    onto.add_object_property("reviewed_by", Some("Review"), Some("User"), None);
    onto.add_object_property("similar_to", Some("Book"), Some("Book"), None);
    onto.add_object_property("recommends", Some("Book"), Some("Book"), None);
    onto.add_object_property("preferred_genre", Some("User"), Some("Genre"), None);

    onto.add_data_property("book_title", Some("Book"), LiteralType::Str);
    onto.add_data_property("isbn", Some("Book"), LiteralType::Str);
    onto.add_data_property("publication_year", Some("Book"), LiteralType::Int);
    onto.add_data_property("page_count", Some("Book"), LiteralType::Int);
    onto.add_data_property("author_name", Some("Author"), LiteralType::Str);
    onto.add_data_property("publisher_name", Some("Publisher"), LiteralType::Str);
    onto.add_data_property("genre_name", Some("Genre"), LiteralType::Str);
    onto.add_data_property("rating", Some("Review"), LiteralType::Int);
    onto.add_data_property("review_user_id", Some("Review"), LiteralType::Str);
    onto.add_data_property("review_text", Some("Review"), LiteralType::Str);
    onto.add_data_property("user_age", Some("User"), LiteralType::Int);
    onto.add_data_property("user_location", Some("User"), LiteralType::Str);
    onto.add_data_property("user_name", Some("User"), LiteralType::Str);

    onto
}
