//! JSON snapshots of a subtree.
//!
//! Export turns a node and everything below it into a serde-friendly
//! `NodeSnapshot`; import rebuilds such a snapshot under a parent. Tests use
//! this to declare fixture trees as data:
//!
//! ```text
//! { "name": "page", "primaryType": "mgnl:page",
//!   "properties": { "title": { "type": "String", "values": ["Home"] } },
//!   "children": [ { "name": "main" } ] }
//! ```
//!
//! `jcr:primaryType` and `jcr:mixinTypes` are carried by the `primaryType`
//! and `mixins` fields, not as properties.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::value::parse_date;
use crate::model::{Node, PropertyType, Value, MIXIN_TYPES, PRIMARY_TYPE};
use crate::{Error, Result};

/// Serialized form of one node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropertySnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

/// Serialized property: type tag plus text form of each value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    #[serde(rename = "type", default)]
    pub kind: PropertyType,
    #[serde(default)]
    pub values: Vec<Option<String>>,
}

// ============================================================================
// Export
// ============================================================================

pub fn snapshot(node: &Node) -> NodeSnapshot {
    let properties = node
        .properties()
        .into_iter()
        .filter(|p| {
            let name = p.name();
            name != PRIMARY_TYPE && name != MIXIN_TYPES
        })
        .map(|p| {
            let values = p.get_values().iter().map(Value::get_string).collect();
            (p.name(), PropertySnapshot { kind: p.property_type(), values })
        })
        .collect();

    NodeSnapshot {
        name: node.name(),
        identifier: Some(node.identifier()),
        primary_type: Some(node.primary_type()),
        mixins: node.mixin_types(),
        properties,
        children: node.nodes().iter().map(snapshot).collect(),
    }
}

/// Pretty-printed JSON of `node`'s subtree.
pub fn export_json(node: &Node) -> Result<String> {
    Ok(serde_json::to_string_pretty(&snapshot(node))?)
}

// ============================================================================
// Import
// ============================================================================

/// Rebuild `snap` as a new child of `parent`, registering everything with
/// `parent`'s session.
pub fn import(parent: &Node, snap: &NodeSnapshot) -> Result<Node> {
    let node = parent
        .add_node(&snap.name, snap.primary_type.as_deref())
        .ok_or_else(|| Error::InvalidArgument("snapshot node name must not be blank".into()))?;
    if let Some(id) = &snap.identifier {
        node.set_identifier(id)?;
    }
    for mixin in &snap.mixins {
        node.add_mixin(mixin)?;
    }
    for (name, prop) in &snap.properties {
        let values: Vec<Value> = prop
            .values
            .iter()
            .map(|v| value_from_text(v.as_deref(), prop.kind))
            .collect();
        node.set_property_values(name, values)?;
    }
    for child in &snap.children {
        import(&node, child)?;
    }
    Ok(node)
}

pub fn import_json(parent: &Node, json: &str) -> Result<Node> {
    let snap: NodeSnapshot = serde_json::from_str(json)?;
    import(parent, &snap)
}

fn value_from_text(text: Option<&str>, kind: PropertyType) -> Value {
    let Some(text) = text else {
        return Value::null();
    };
    match kind {
        PropertyType::Binary => Value::binary(text.as_bytes()),
        PropertyType::Date => parse_date(text)
            .map(Value::date)
            .unwrap_or_else(|| Value::string(text).with_type(kind)),
        PropertyType::Undefined => Value::string(text),
        _ => Value::string(text).with_type(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::format_date;
    use crate::storage::{RepositoryConfig, Session};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_export_shape() {
        let root = Node::new("");
        let page = root.add_node("page", Some("mgnl:page")).unwrap();
        page.set_property("title", "Home").unwrap();
        page.set_property_values("tags", ["a", "b"]).unwrap();
        page.add_node("main", None).unwrap();

        let snap = snapshot(&page);
        assert_eq!(snap.name, "page");
        assert_eq!(snap.primary_type.as_deref(), Some("mgnl:page"));
        assert_eq!(snap.properties.keys().collect::<Vec<_>>(), ["title", "tags"]);
        assert_eq!(snap.properties["tags"].values, vec![Some("a".to_string()), Some("b".to_string())]);
        assert_eq!(snap.children.len(), 1);

        let json = export_json(&page).unwrap();
        assert!(json.contains("\"primaryType\": \"mgnl:page\""));
    }

    #[test]
    fn test_import_registers_with_session() {
        let session = Session::new("website", RepositoryConfig::default());
        let json = r#"{
            "name": "page",
            "identifier": "page-1",
            "primaryType": "mgnl:page",
            "mixins": ["mix:versionable"],
            "properties": {
                "title": { "type": "String", "values": ["Home"] },
                "count": { "type": "Long", "values": ["7"] },
                "published": { "type": "Date", "values": ["2024-03-01T10:00:00.000Z"] }
            },
            "children": [ { "name": "main" } ]
        }"#;
        let page = import_json(&session.root_node(), json).unwrap();

        assert_eq!(session.get_node("/page").unwrap(), page);
        assert_eq!(session.get_node_by_identifier("page-1").unwrap(), page);
        assert!(page.is_node_type("mix:versionable"));
        assert_eq!(session.get_property("/page/count").unwrap().get_long().unwrap(), 7);
        let published = page.get_property("published").unwrap();
        assert_eq!(published.property_type(), PropertyType::Date);
        assert_eq!(format_date(&published.get_date().unwrap().unwrap()), "2024-03-01T10:00:00.000Z");
        assert!(session.node_exists("/page/main"));
    }

    #[test]
    fn test_round_trip_keeps_tree() {
        let source = Node::new("");
        let page = source.add_node("page", Some("mgnl:page")).unwrap();
        page.set_property("title", "Home").unwrap();
        page.add_node("main/text", None).unwrap().set_property("body", "Hi").unwrap();

        let target = Node::new("");
        let copy = import(&target, &snapshot(&page)).unwrap();
        assert_eq!(snapshot(&copy), snapshot(&page));
    }

    #[test]
    fn test_import_rejects_bad_input() {
        let root = Node::new("");
        assert!(matches!(import_json(&root, "not json"), Err(Error::Json(_))));
        assert!(matches!(import_json(&root, r#"{"name": " "}"#), Err(Error::InvalidArgument(_))));
    }
}
