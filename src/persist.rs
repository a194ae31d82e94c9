// used for persistence
use rusqlite::{params, Connection, Statement};

use std::path::PathBuf;

use tracing::info;

use crate::datatype::{Literal, LiteralType};
use crate::error::Result;
use crate::ontology::{Object, Ontology};

/// Where the graph lives between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(PathBuf),
}
impl PersistenceMode {
    pub fn open(&self) -> Result<Connection> {
        Ok(match self {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        })
    }
}

// ------------- Persistence -------------
pub struct Persistor<'db> {
    pub db: &'db Connection,
    // Adders
    add_node: Statement<'db>,
    add_class: Statement<'db>,
    add_object_property: Statement<'db>,
    add_data_property: Statement<'db>,
    add_individual: Statement<'db>,
    add_statement: Statement<'db>,
    add_meta: Statement<'db>,
    // Get everything back out again
    all_nodes: Statement<'db>,
    all_classes: Statement<'db>,
    all_object_properties: Statement<'db>,
    all_data_properties: Statement<'db>,
    all_individuals: Statement<'db>,
    all_statements: Statement<'db>,
    get_meta: Statement<'db>,
}

impl<'db> Persistor<'db> {
    pub fn new<'connection>(connection: &'connection Connection) -> Result<Persistor<'connection>> {
        connection.execute_batch(
            "
            create table if not exists Meta (
                Key text not null,
                Value text not null,
                constraint unique_Key primary key (Key)
            );
            create table if not exists Node (
                Node_Identity integer not null,
                Name text not null,
                constraint unique_and_referenceable_Node_Identity primary key (
                    Node_Identity
                ),
                constraint unique_Name unique (Name)
            );
            create table if not exists Class (
                Name text not null,
                Parent text null,
                Comment text null,
                constraint unique_Class primary key (Name)
            );
            create table if not exists ObjectProperty (
                Name text not null,
                Domain text null,
                Range text null,
                Comment text null,
                constraint unique_ObjectProperty primary key (Name)
            );
            create table if not exists DataProperty (
                Name text not null,
                Domain text null,
                Range text not null,
                constraint unique_DataProperty primary key (Name)
            );
            create table if not exists Individual (
                Node_Identity integer not null,
                Class_Identity integer not null,
                constraint Individual_is_Node foreign key (
                    Node_Identity
                ) references Node(Node_Identity),
                constraint unique_Individual primary key (Node_Identity)
            );
            create table if not exists Statement (
                Subject integer not null,
                Predicate integer not null,
                Object_Node integer null,
                Object_Value any null,
                Object_Type text null,
                constraint Subject_is_Node foreign key (
                    Subject
                ) references Node(Node_Identity)
            );
            ",
        )?;
        Ok(Persistor {
            db: connection,
            add_node: connection.prepare(
                "insert or ignore into Node (Node_Identity, Name) values (?, ?)",
            )?,
            add_class: connection.prepare(
                "insert or ignore into Class (Name, Parent, Comment) values (?, ?, ?)",
            )?,
            add_object_property: connection.prepare(
                "insert or ignore into ObjectProperty (Name, Domain, Range, Comment)
                    values (?, ?, ?, ?)",
            )?,
            add_data_property: connection.prepare(
                "insert or ignore into DataProperty (Name, Domain, Range) values (?, ?, ?)",
            )?,
            add_individual: connection.prepare(
                "insert or ignore into Individual (Node_Identity, Class_Identity) values (?, ?)",
            )?,
            add_statement: connection.prepare(
                "insert into Statement (Subject, Predicate, Object_Node, Object_Value, Object_Type)
                    values (?, ?, ?, ?, ?)",
            )?,
            add_meta: connection.prepare(
                "insert or replace into Meta (Key, Value) values (?, ?)",
            )?,
            all_nodes: connection.prepare("select Node_Identity, Name from Node")?,
            all_classes: connection.prepare("select Name, Parent, Comment from Class")?,
            all_object_properties: connection
                .prepare("select Name, Domain, Range, Comment from ObjectProperty")?,
            all_data_properties: connection.prepare("select Name, Domain, Range from DataProperty")?,
            all_individuals: connection
                .prepare("select Node_Identity, Class_Identity from Individual")?,
            all_statements: connection.prepare(
                "select Subject, Predicate, Object_Node, Object_Value, Object_Type from Statement",
            )?,
            get_meta: connection.prepare("select Value from Meta where Key = ?")?,
        })
    }

    /// Write the whole graph out. Statements are not deduplicated on disk,
    /// so the statement table is cleared first.
    pub fn save_ontology(&mut self, onto: &Ontology) -> Result<()> {
        self.db.execute("delete from Statement", [])?;
        self.add_meta.execute(params!["base_iri", onto.base_iri()])?;
        for (name, id) in onto.interned() {
            self.add_node.execute(params![id, name])?;
        }
        for class in onto.classes() {
            self.add_class
                .execute(params![class.name(), class.parent(), class.comment()])?;
        }
        for prop in onto.object_properties() {
            self.add_object_property.execute(params![
                prop.name(),
                prop.domain(),
                prop.range(),
                prop.comment()
            ])?;
        }
        for prop in onto.data_properties() {
            self.add_data_property
                .execute(params![prop.name(), prop.domain(), prop.range().name()])?;
        }
        for (individual, class) in onto.typed_individuals() {
            self.add_individual.execute(params![individual, class])?;
        }
        for statement in onto.statements() {
            match &statement.object {
                Object::Node(id) => self.add_statement.execute(params![
                    statement.subject,
                    statement.predicate,
                    id,
                    Option::<String>::None,
                    Option::<String>::None
                ])?,
                Object::Literal(literal) => self.add_statement.execute(params![
                    statement.subject,
                    statement.predicate,
                    Option::<u64>::None,
                    literal,
                    literal.literal_type().name()
                ])?,
            };
        }
        info!(statements = onto.statement_count(), "ontology saved");
        Ok(())
    }

    /// Rebuild the graph persisted earlier; `None` when nothing was saved.
    pub fn restore_ontology(&mut self) -> Result<Option<Ontology>> {
        let base_iri = match self
            .get_meta
            .query_row(params!["base_iri"], |row| row.get::<_, String>(0))
        {
            Ok(value) => value,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut onto = Ontology::new(&base_iri);

        let mut rows = self.all_nodes.query([])?;
        while let Some(row) = rows.next()? {
            let id: u64 = row.get(0)?;
            let name: String = row.get(1)?;
            onto.retain(&name, id);
        }
        let mut rows = self.all_classes.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let parent: Option<String> = row.get(1)?;
            let comment: Option<String> = row.get(2)?;
            onto.add_class(&name, parent.as_deref(), comment.as_deref());
        }
        let mut rows = self.all_object_properties.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let domain: Option<String> = row.get(1)?;
            let range: Option<String> = row.get(2)?;
            let comment: Option<String> = row.get(3)?;
            onto.add_object_property(
                &name,
                domain.as_deref(),
                range.as_deref(),
                comment.as_deref(),
            );
        }
        let mut rows = self.all_data_properties.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let domain: Option<String> = row.get(1)?;
            let range: String = row.get(2)?;
            onto.add_data_property(&name, domain.as_deref(), LiteralType::from_name(&range));
        }
        let mut rows = self.all_individuals.query([])?;
        while let Some(row) = rows.next()? {
            let individual: u64 = row.get(0)?;
            let class: u64 = row.get(1)?;
            onto.retain_individual(individual, class);
        }
        let mut rows = self.all_statements.query([])?;
        while let Some(row) = rows.next()? {
            let subject: u64 = row.get(0)?;
            let predicate: u64 = row.get(1)?;
            let object_node: Option<u64> = row.get(2)?;
            let object = match object_node {
                Some(id) => Object::Node(id),
                None => {
                    let tag: String = row.get(4)?;
                    let literal = Literal::from_sql(&tag, row.get_ref(3)?)
                        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;
                    Object::Literal(literal)
                }
            };
            onto.retain_statement(subject, predicate, object);
        }
        info!(statements = onto.statement_count(), "ontology restored");
        Ok(Some(onto))
    }
}
