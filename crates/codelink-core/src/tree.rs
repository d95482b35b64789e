//! Generic n-ary item tree backing the model/view layer
//!
//! Every persistent piece of a document (properties, outline rows) lives in
//! a `Tree`. Items are stored in an arena and addressed by `ItemKey`
//! handles; the parent link is a plain key, never an owning pointer, so a
//! subtree is dropped exactly when it is removed from its parent.
//!
//! Structural edits emit `RowsInserted` / `RowsAboutToBeRemoved` /
//! `RowsRemoved` to the tree's event sink. The "about to be removed"
//! notification is sent while the subtree is still reachable.

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use slotmap::{new_key_type, SlotMap};
use uuid::Uuid;

use crate::error::{CodeLinkError, Result};
use crate::events::{emit, EventSink, ModelEvent, NullEventSink};

new_key_type! {
    /// Handle to an item in a `Tree`
    pub struct ItemKey;
}

#[derive(Debug, Clone)]
struct TreeNode<T> {
    uuid: Uuid,
    parent: Option<ItemKey>,
    children: Vec<ItemKey>,
    data: T,
}

/// Arena-backed ordered tree
#[derive(Clone)]
pub struct Tree<T> {
    items: SlotMap<ItemKey, TreeNode<T>>,
    root: ItemKey,
    sink: Arc<dyn EventSink>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("len", &self.items.len())
            .field("root", &self.items.get(self.root).map(|n| &n.data))
            .finish_non_exhaustive()
    }
}

impl<T> Tree<T> {
    /// Create a tree holding only a root item
    pub fn new(root: T) -> Self {
        Self::with_root_uuid(root, Uuid::new_v4())
    }

    fn with_root_uuid(root: T, uuid: Uuid) -> Self {
        let mut items = SlotMap::with_key();
        let root = items.insert(TreeNode {
            uuid,
            parent: None,
            children: Vec::new(),
            data: root,
        });
        Self {
            items,
            root,
            sink: Arc::new(NullEventSink),
        }
    }

    /// Route structural notifications to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the event sink
    pub fn set_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sink = sink;
    }

    /// Handle of the root item
    pub fn root(&self) -> ItemKey {
        self.root
    }

    /// Total number of items, root included
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// A tree always has its root, so it is empty when the root has no children
    pub fn is_empty(&self) -> bool {
        self.child_count(None) == 0
    }

    /// Whether `item` is alive in this tree
    pub fn contains(&self, item: ItemKey) -> bool {
        self.items.contains_key(item)
    }

    /// Append `data` as the last child of `parent` (root if `None`)
    pub fn append_child(&mut self, data: T, parent: Option<ItemKey>) -> Result<ItemKey> {
        let parent = parent.unwrap_or(self.root);
        let row = self.child_count(Some(parent));
        self.insert_with_uuid(row, data, parent, Uuid::new_v4())
    }

    /// Insert `data` at `row` under `parent`; rows past the end append
    pub fn insert_child(
        &mut self,
        row: usize,
        data: T,
        parent: Option<ItemKey>,
    ) -> Result<ItemKey> {
        let parent = parent.unwrap_or(self.root);
        self.insert_with_uuid(row, data, parent, Uuid::new_v4())
    }

    fn insert_with_uuid(
        &mut self,
        row: usize,
        data: T,
        parent: ItemKey,
        uuid: Uuid,
    ) -> Result<ItemKey> {
        if !self.items.contains_key(parent) {
            return Err(CodeLinkError::ItemNotFound(format!("{:?}", parent)));
        }
        let key = self.items.insert(TreeNode {
            uuid,
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        let parent_node = &mut self.items[parent];
        let row = row.min(parent_node.children.len());
        parent_node.children.insert(row, key);
        let parent_uuid = parent_node.uuid;
        emit(
            self.sink.as_ref(),
            ModelEvent::RowsInserted {
                parent: parent_uuid,
                first: row,
                last: row,
            },
        );
        Ok(key)
    }

    /// Remove the child at `row` under `parent` together with its subtree
    ///
    /// Returns `false` without touching the tree when the row is out of range
    /// or the parent does not exist.
    pub fn remove_child(&mut self, row: usize, parent: Option<ItemKey>) -> bool {
        let parent = parent.unwrap_or(self.root);
        let Some(parent_node) = self.items.get(parent) else {
            return false;
        };
        let Some(&child) = parent_node.children.get(row) else {
            return false;
        };
        let parent_uuid = parent_node.uuid;

        let range = |first| ModelEvent::RowsAboutToBeRemoved {
            parent: parent_uuid,
            first,
            last: first,
        };
        emit(self.sink.as_ref(), range(row));

        let doomed = self.descendants(child);
        self.items[parent].children.remove(row);
        for key in doomed {
            self.items.remove(key);
        }

        emit(
            self.sink.as_ref(),
            ModelEvent::RowsRemoved {
                parent: parent_uuid,
                first: row,
                last: row,
            },
        );
        true
    }

    /// Number of children under `parent` (root if `None`); 0 for unknown items
    pub fn child_count(&self, parent: Option<ItemKey>) -> usize {
        let parent = parent.unwrap_or(self.root);
        self.items.get(parent).map_or(0, |n| n.children.len())
    }

    /// Position of `item` in its parent's child list
    pub fn row_of(&self, item: ItemKey) -> Option<usize> {
        let parent = self.items.get(item)?.parent?;
        self.items[parent].children.iter().position(|&c| c == item)
    }

    /// Parent of `item`; `None` for the root and for unknown items
    pub fn parent(&self, item: ItemKey) -> Option<ItemKey> {
        self.items.get(item).and_then(|n| n.parent)
    }

    /// Child at `row` under `parent` (root if `None`)
    pub fn child(&self, parent: Option<ItemKey>, row: usize) -> Option<ItemKey> {
        let parent = parent.unwrap_or(self.root);
        self.items.get(parent)?.children.get(row).copied()
    }

    /// Ordered children of `parent` (root if `None`)
    pub fn children(&self, parent: Option<ItemKey>) -> &[ItemKey] {
        let parent = parent.unwrap_or(self.root);
        self.items
            .get(parent)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Data stored at `item`
    pub fn get(&self, item: ItemKey) -> Option<&T> {
        self.items.get(item).map(|n| &n.data)
    }

    /// Mutable data stored at `item`
    pub fn get_mut(&mut self, item: ItemKey) -> Option<&mut T> {
        self.items.get_mut(item).map(|n| &mut n.data)
    }

    /// Stable identifier of `item`
    pub fn uuid(&self, item: ItemKey) -> Option<Uuid> {
        self.items.get(item).map(|n| n.uuid)
    }

    /// Look an item up by its stable identifier
    pub fn find(&self, uuid: Uuid) -> Option<ItemKey> {
        self.items
            .iter()
            .find(|(_, n)| n.uuid == uuid)
            .map(|(key, _)| key)
    }

    /// `item` and everything below it, depth-first, parents before children
    pub fn descendants(&self, item: ItemKey) -> Vec<ItemKey> {
        let mut out = Vec::new();
        let mut stack = vec![item];
        while let Some(key) = stack.pop() {
            let Some(node) = self.items.get(key) else {
                continue;
            };
            out.push(key);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Depth of `item` below the root (root is 0)
    pub fn depth(&self, item: ItemKey) -> usize {
        let mut depth = 0;
        let mut current = self.parent(item);
        while let Some(key) = current {
            depth += 1;
            current = self.parent(key);
        }
        depth
    }
}

/// Data that can be persisted as a tree item dictionary
pub trait TreeData {
    /// Type tag written under `"Class"`
    fn class(&self) -> &str;

    /// The item's own state, keyed by human-readable names
    fn fields(&self) -> Map<String, JsonValue>;
}

/// Serialize `item` and its subtree
///
/// Produces `{"Class": .., "Id": .., <fields>, "children": [..]}`; the
/// `children` key is omitted for leaves.
pub fn to_dict<T: TreeData>(tree: &Tree<T>, item: ItemKey) -> Result<JsonValue> {
    let node = tree
        .items
        .get(item)
        .ok_or_else(|| CodeLinkError::ItemNotFound(format!("{:?}", item)))?;

    let mut dict = Map::new();
    dict.insert("Class".to_string(), JsonValue::from(node.data.class()));
    dict.insert("Id".to_string(), JsonValue::from(node.uuid.to_string()));
    dict.extend(node.data.fields());

    if !node.children.is_empty() {
        let children = node
            .children
            .iter()
            .map(|&child| to_dict(tree, child))
            .collect::<Result<Vec<_>>>()?;
        dict.insert("children".to_string(), JsonValue::Array(children));
    }
    Ok(JsonValue::Object(dict))
}

/// Rebuild a tree from a dictionary produced by [`to_dict`]
///
/// `resolve` maps a `"Class"` tag plus the item's own fields to its data.
/// Identifiers are preserved.
pub fn from_dict<T, F>(dict: &JsonValue, resolve: F) -> Result<Tree<T>>
where
    F: Fn(&str, &Map<String, JsonValue>) -> Result<T>,
{
    let (uuid, data, children) = read_item(dict, &resolve)?;
    let mut tree = Tree::with_root_uuid(data, uuid);
    let root = tree.root;

    let mut pending: Vec<(ItemKey, &JsonValue)> =
        children.iter().rev().map(|c| (root, c)).collect();
    while let Some((parent, child)) = pending.pop() {
        let (uuid, data, grandchildren) = read_item(child, &resolve)?;
        let row = tree.child_count(Some(parent));
        let key = tree.insert_with_uuid(row, data, parent, uuid)?;
        pending.extend(grandchildren.iter().rev().map(|c| (key, c)));
    }
    Ok(tree)
}

fn read_item<'a, T, F>(dict: &'a JsonValue, resolve: &F) -> Result<(Uuid, T, &'a [JsonValue])>
where
    F: Fn(&str, &Map<String, JsonValue>) -> Result<T>,
{
    let map = dict
        .as_object()
        .ok_or_else(|| CodeLinkError::invalid("tree item must be an object"))?;
    let class = map
        .get("Class")
        .and_then(|c| c.as_str())
        .ok_or_else(|| CodeLinkError::invalid("tree item has no Class"))?;
    let uuid = match map.get("Id").and_then(|id| id.as_str()) {
        Some(id) => Uuid::parse_str(id)
            .map_err(|e| CodeLinkError::invalid(format!("bad item id '{}': {}", id, e)))?,
        None => Uuid::new_v4(),
    };

    let mut fields = map.clone();
    fields.remove("Class");
    fields.remove("Id");
    fields.remove("children");
    let data = resolve(class, &fields)?;

    let children = map
        .get("children")
        .and_then(|c| c.as_array())
        .map(|c| c.as_slice())
        .unwrap_or(&[]);
    Ok((uuid, data, children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VecEventSink;

    #[derive(Debug, Clone, PartialEq)]
    struct Label(String);

    impl TreeData for Label {
        fn class(&self) -> &str {
            "Label"
        }

        fn fields(&self) -> Map<String, JsonValue> {
            let mut map = Map::new();
            map.insert("Text".to_string(), JsonValue::from(self.0.clone()));
            map
        }
    }

    fn label(text: &str) -> Label {
        Label(text.to_string())
    }

    fn resolve(class: &str, fields: &Map<String, JsonValue>) -> Result<Label> {
        match class {
            "Label" => Ok(Label(
                fields
                    .get("Text")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default()
                    .to_string(),
            )),
            other => Err(CodeLinkError::UnknownClass(other.to_string())),
        }
    }

    #[test]
    fn test_append_and_rows() {
        let mut tree = Tree::new(label("root"));
        let a = tree.append_child(label("a"), None).unwrap();
        let b = tree.append_child(label("b"), None).unwrap();
        let a1 = tree.append_child(label("a1"), Some(a)).unwrap();

        assert_eq!(tree.child_count(None), 2);
        assert_eq!(tree.child_count(Some(a)), 1);
        assert_eq!(tree.row_of(a), Some(0));
        assert_eq!(tree.row_of(b), Some(1));
        assert_eq!(tree.row_of(a1), Some(0));
        assert_eq!(tree.parent(a1), Some(a));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.depth(a1), 2);
    }

    #[test]
    fn test_remove_child_drops_subtree() {
        let mut tree = Tree::new(label("root"));
        let a = tree.append_child(label("a"), None).unwrap();
        let a1 = tree.append_child(label("a1"), Some(a)).unwrap();
        let b = tree.append_child(label("b"), None).unwrap();

        assert!(tree.remove_child(0, None));
        assert!(!tree.contains(a));
        assert!(!tree.contains(a1));
        assert_eq!(tree.row_of(b), Some(0));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut tree = Tree::new(label("root"));
        tree.append_child(label("a"), None).unwrap();

        assert!(!tree.remove_child(5, None));
        assert_eq!(tree.child_count(None), 1);
    }

    #[test]
    fn test_insert_child_clamps_row() {
        let mut tree = Tree::new(label("root"));
        let a = tree.append_child(label("a"), None).unwrap();
        let z = tree.insert_child(0, label("z"), None).unwrap();
        let end = tree.insert_child(99, label("end"), None).unwrap();

        assert_eq!(tree.children(None), &[z, a, end]);
    }

    #[test]
    fn test_append_to_missing_parent() {
        let mut tree = Tree::new(label("root"));
        let a = tree.append_child(label("a"), None).unwrap();
        tree.remove_child(0, None);

        let err = tree.append_child(label("orphan"), Some(a)).unwrap_err();
        assert!(matches!(err, CodeLinkError::ItemNotFound(_)));
    }

    #[test]
    fn test_notifications_order() {
        let sink = Arc::new(VecEventSink::new());
        let mut tree = Tree::new(label("root")).with_sink(sink.clone());
        let root_uuid = tree.uuid(tree.root()).unwrap();

        tree.append_child(label("a"), None).unwrap();
        tree.remove_child(0, None);

        let events = sink.events();
        assert_eq!(
            events,
            vec![
                ModelEvent::RowsInserted { parent: root_uuid, first: 0, last: 0 },
                ModelEvent::RowsAboutToBeRemoved { parent: root_uuid, first: 0, last: 0 },
                ModelEvent::RowsRemoved { parent: root_uuid, first: 0, last: 0 },
            ]
        );
    }

    #[test]
    fn test_dict_roundtrip_preserves_ids() {
        let mut tree = Tree::new(label("root"));
        let a = tree.append_child(label("a"), None).unwrap();
        tree.append_child(label("a1"), Some(a)).unwrap();
        tree.append_child(label("a2"), Some(a)).unwrap();
        tree.append_child(label("b"), None).unwrap();

        let dict = to_dict(&tree, tree.root()).unwrap();
        assert_eq!(dict["Class"], "Label");
        assert_eq!(dict["children"][0]["Text"], "a");
        assert!(dict["children"][1].get("children").is_none());

        let restored = from_dict(&dict, resolve).unwrap();
        assert_eq!(restored.len(), tree.len());
        assert_eq!(to_dict(&restored, restored.root()).unwrap(), dict);

        let a_uuid = tree.uuid(a).unwrap();
        let restored_a = restored.find(a_uuid).unwrap();
        assert_eq!(restored.get(restored_a), Some(&label("a")));
        assert_eq!(restored.child_count(Some(restored_a)), 2);
    }

    #[test]
    fn test_from_dict_unknown_class() {
        let dict = serde_json::json!({"Class": "Mystery"});
        let err = from_dict(&dict, resolve).unwrap_err();
        assert!(matches!(err, CodeLinkError::UnknownClass(_)));
    }
}
