//! Gramps XML reader.
//!
//! The document is parsed once into owned records indexed by handle. Element
//! names are matched on their local part, so any Gramps XML namespace
//! version is accepted.

use std::collections::HashMap;
use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, instrument, warn};

use crate::domain::source::{
    EventRecord, FamilyRecord, GenealogySource, PersonRecord, SurnameRecord,
};
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

/// Owned index over a Gramps XML database.
#[derive(Debug, Default)]
pub struct GrampsXml {
    people: HashMap<String, PersonRecord>,
    families: HashMap<String, FamilyRecord>,
    events: HashMap<String, EventRecord>,
    /// family `id` attribute -> handle
    family_ids: HashMap<String, String>,
    /// tag name -> tag handle
    tags: HashMap<String, String>,
    /// (family handle, tag handles) in document order
    family_tags: Vec<(String, Vec<String>)>,
}

fn is(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| is(n, name))
}

fn element<'a, 'input: 'a>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is(n, name))
}

fn text_of(node: Option<Node>) -> String {
    node.and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

fn hlinks(node: Node, name: &str) -> Vec<String> {
    elements(node, name)
        .filter_map(|n| n.attribute("hlink"))
        .map(str::to_string)
        .collect()
}

fn hlink(node: Node, name: &str) -> Option<String> {
    element(node, name)
        .and_then(|n| n.attribute("hlink"))
        .map(str::to_string)
}

impl GrampsXml {
    /// Read and parse a document through the filesystem boundary.
    #[instrument(level = "debug", skip(fs))]
    pub fn load(fs: &dyn FileSystem, path: &Path) -> InfraResult<Self> {
        let text = fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
        Self::parse(&text).map_err(|e| match e {
            InfraError::Xml { source, .. } => InfraError::Xml {
                context: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn parse(text: &str) -> InfraResult<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text, options).map_err(|source| InfraError::Xml {
            context: "document".into(),
            source,
        })?;
        let root = doc.root_element();
        if root.tag_name().name() != "database" {
            return Err(InfraError::Format {
                message: format!(
                    "expected a Gramps <database> root, found <{}>",
                    root.tag_name().name()
                ),
            });
        }

        let mut index = Self::default();
        for section in root.children().filter(|n| n.is_element()) {
            match section.tag_name().name() {
                "tags" => elements(section, "tag").for_each(|n| index.read_tag(n)),
                "events" => elements(section, "event").for_each(|n| index.read_event(n)),
                "people" => elements(section, "person").for_each(|n| index.read_person(n)),
                "families" => elements(section, "family").for_each(|n| index.read_family(n)),
                other => debug!("skipping section <{}>", other),
            }
        }
        debug!(
            "document: {} people, {} families, {} events, {} tags",
            index.people.len(),
            index.families.len(),
            index.events.len(),
            index.tags.len()
        );
        Ok(index)
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn read_tag(&mut self, node: Node) {
        let (Some(handle), Some(name)) = (node.attribute("handle"), node.attribute("name")) else {
            warn!("tag without handle or name");
            return;
        };
        self.tags.entry(name.to_string()).or_insert_with(|| handle.to_string());
    }

    fn read_event(&mut self, node: Node) {
        let Some(handle) = node.attribute("handle") else {
            warn!("event without handle");
            return;
        };
        let date = element(node, "dateval")
            .or_else(|| element(node, "datestr"))
            .and_then(|n| n.attribute("val"))
            .map(str::to_string);
        self.events.insert(
            handle.to_string(),
            EventRecord {
                handle: handle.to_string(),
                kind: text_of(element(node, "type")),
                date,
            },
        );
    }

    fn read_person(&mut self, node: Node) {
        let Some(handle) = node.attribute("handle") else {
            warn!("person without handle");
            return;
        };
        let name = elements(node, "name")
            .find(|n| n.attribute("alt") != Some("1"))
            .or_else(|| element(node, "name"));
        let (first_name, surnames) = match name {
            Some(name) => (
                text_of(element(name, "first")),
                elements(name, "surname")
                    .map(|s| SurnameRecord {
                        name: text_of(Some(s)),
                        derivation: s.attribute("derivation").map(str::to_string),
                    })
                    .collect(),
            ),
            None => (String::new(), Vec::new()),
        };
        self.people.insert(
            handle.to_string(),
            PersonRecord {
                handle: handle.to_string(),
                gender: text_of(element(node, "gender")),
                first_name,
                surnames,
                child_of: hlinks(node, "childof"),
                parent_in: hlinks(node, "parentin"),
                event_refs: hlinks(node, "eventref"),
            },
        );
    }

    fn read_family(&mut self, node: Node) {
        let Some(handle) = node.attribute("handle") else {
            warn!("family without handle");
            return;
        };
        let id = node.attribute("id").map(str::to_string);
        if let Some(id) = &id {
            self.family_ids.insert(id.clone(), handle.to_string());
        }
        self.family_tags
            .push((handle.to_string(), hlinks(node, "tagref")));
        self.families.insert(
            handle.to_string(),
            FamilyRecord {
                handle: handle.to_string(),
                id,
                father: hlink(node, "father"),
                mother: hlink(node, "mother"),
                children: hlinks(node, "childref"),
                event_refs: hlinks(node, "eventref"),
            },
        );
    }
}

impl GenealogySource for GrampsXml {
    fn person(&self, handle: &str) -> Option<PersonRecord> {
        self.people.get(handle).cloned()
    }

    fn family(&self, handle: &str) -> Option<FamilyRecord> {
        self.families.get(handle).cloned()
    }

    fn event(&self, handle: &str) -> Option<EventRecord> {
        self.events.get(handle).cloned()
    }

    fn family_by_id(&self, id: &str) -> Option<String> {
        self.family_ids.get(id).cloned()
    }

    fn family_by_tag(&self, tag: &str) -> Option<String> {
        let tag_handle = self.tags.get(tag)?;
        self.family_tags
            .iter()
            .find(|(_, tags)| tags.contains(tag_handle))
            .map(|(family, _)| family.clone())
    }
}
