//! Mermaid ER diagram helpers

use once_cell::sync::Lazy;
use regex::Regex;

static ENTITY_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*\{").expect("valid regex"));

/// One entity block of an ER diagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBlock {
    pub name: String,
    pub attributes: Vec<String>,
}

impl EntityBlock {
    /// Render as a standalone `NAME { ... }` block for a per-table prompt
    pub fn render(&self) -> String {
        if self.attributes.is_empty() {
            return format!("{} {{\n}}", self.name);
        }
        format!("{} {{\n    {}\n}}", self.name, self.attributes.join("\n    "))
    }
}

/// Split a diagram into its entity blocks, in diagram order.
///
/// An entity opens on a line `NAME {` and closes on the next line holding
/// `}`, or on the opening line itself for `NAME { ... }`. Relationship lines
/// outside a block are ignored. A repeated entity name replaces the earlier
/// block's attributes in place.
pub fn extract_entities(diagram: &str) -> Vec<EntityBlock> {
    let mut entities: Vec<EntityBlock> = Vec::new();
    let mut current: Option<usize> = None;

    for line in diagram.lines().map(str::trim) {
        if let Some(caps) = ENTITY_START.captures(line) {
            let name = caps[1].to_string();
            let idx = match entities.iter().position(|e| e.name == name) {
                Some(idx) => {
                    entities[idx].attributes.clear();
                    idx
                }
                None => {
                    entities.push(EntityBlock {
                        name,
                        attributes: Vec::new(),
                    });
                    entities.len() - 1
                }
            };
            let rest = line[caps[0].len()..].trim();
            match rest.split_once('}') {
                Some((inline, _)) => {
                    let inline = inline.trim();
                    if !inline.is_empty() {
                        entities[idx].attributes.push(inline.to_string());
                    }
                    current = None;
                }
                None => {
                    if !rest.is_empty() {
                        entities[idx].attributes.push(rest.to_string());
                    }
                    current = Some(idx);
                }
            }
        } else if line.contains('}') {
            current = None;
        } else if let Some(idx) = current.filter(|_| !line.is_empty()) {
            entities[idx].attributes.push(line.to_string());
        }
    }

    entities
}
