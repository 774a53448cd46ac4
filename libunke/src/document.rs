//! Document tree.
//!
//! All objects of a document live in one arena owned by the [`Document`] and
//! are addressed by [`ObjectId`]. Structure flows from parent to child through
//! `children` and property values; the `parent` handle is only a back
//! reference and never keeps anything alive.

use std::ops::{Index, IndexMut};

use indexmap::IndexMap;

use crate::value::{drop_flat, Value};

/// Handle to an object inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Position of the object in its document's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A brace-delimited block: a name, child objects, and properties.
///
/// `ext` is the payload produced by the [`ObjectFactory`](crate::ObjectFactory)
/// the document was parsed with; it is `()` by default.
#[derive(Debug, Clone)]
pub struct Object<X = ()> {
    name: Option<String>,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    properties: IndexMap<String, Value>,
    pub ext: X,
}

impl<X> Object<X> {
    fn new(name: Option<String>, ext: X) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            properties: IndexMap::new(),
            ext,
        }
    }

    /// The object tag, or `None` for an anonymous object.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// The enclosing object, `None` for the root or a detached object.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Child objects in document order.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Whether the object has neither children nor properties.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.properties.is_empty()
    }
}

/// A parsed (or built) Unke document.
#[derive(Debug, Clone)]
pub struct Document<X = ()> {
    objects: Vec<Object<X>>,
    root: Option<ObjectId>,
}

impl<X> Default for Document<X> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            root: None,
        }
    }
}

impl<X> Document<X> {
    /// Create an empty document without a root.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<ObjectId> {
        self.root
    }

    pub fn root_object(&self) -> Option<&Object<X>> {
        self.root.map(|id| &self[id])
    }

    pub fn set_root(&mut self, id: ObjectId) {
        self[id].parent = None;
        self.root = Some(id);
    }

    /// Allocate a detached object. Attach it with [`add_child`](Self::add_child),
    /// [`set_property`](Self::set_property) or [`set_root`](Self::set_root).
    pub fn new_object(&mut self, name: Option<&str>, ext: X) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(Object::new(name.map(String::from), ext));
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object<X>> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object<X>> {
        self.objects.get_mut(id.0)
    }

    /// Append `child` to the children of `parent`.
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) {
        self[child].parent = Some(parent);
        self[parent].children.push(child);
    }

    /// Set a property, returning the value it replaced.
    ///
    /// Objects reachable through `value` get `id` as their parent. A repeated
    /// name overwrites the earlier value in place.
    pub fn set_property(
        &mut self,
        id: ObjectId,
        name: impl Into<String>,
        value: Value,
    ) -> Option<Value> {
        self.adopt(id, &value);
        self[id].properties.insert(name.into(), value)
    }

    fn adopt(&mut self, parent: ObjectId, value: &Value) {
        let mut pending = vec![value];
        while let Some(value) = pending.pop() {
            match value {
                Value::Object(child) => self[*child].parent = Some(parent),
                Value::List(items) => pending.extend(items),
                _ => {}
            }
        }
    }

    /// Child objects of `id` in document order.
    pub fn children(&self, id: ObjectId) -> impl Iterator<Item = &Object<X>> + '_ {
        self[id].children.iter().map(move |child| &self[*child])
    }

    /// The other children of this object's parent.
    pub fn siblings(&self, id: ObjectId) -> Vec<ObjectId> {
        match self[id].parent {
            Some(parent) => self[parent]
                .children
                .iter()
                .copied()
                .filter(|sibling| *sibling != id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of objects allocated in this document.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects with their handles, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object<X>)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }
}

impl<X> Drop for Document<X> {
    fn drop(&mut self) {
        for object in &mut self.objects {
            drop_flat(object.properties.drain(..).map(|(_, value)| value).collect());
        }
    }
}

impl<X> Index<ObjectId> for Document<X> {
    type Output = Object<X>;

    fn index(&self, id: ObjectId) -> &Object<X> {
        &self.objects[id.0]
    }
}

impl<X> IndexMut<ObjectId> for Document<X> {
    fn index_mut(&mut self, id: ObjectId) -> &mut Object<X> {
        &mut self.objects[id.0]
    }
}

/// Structural equality: names, payloads, children and property values are
/// compared recursively from the roots; arena layout is ignored.
impl<X: PartialEq> PartialEq for Document<X> {
    fn eq(&self, other: &Self) -> bool {
        match (self.root, other.root) {
            (Some(a), Some(b)) => objects_equal(self, a, other, b),
            (None, None) => true,
            _ => false,
        }
    }
}

fn objects_equal<X: PartialEq>(
    left: &Document<X>,
    a: ObjectId,
    right: &Document<X>,
    b: ObjectId,
) -> bool {
    let (oa, ob) = (&left[a], &right[b]);
    oa.name == ob.name
        && oa.ext == ob.ext
        && oa.children.len() == ob.children.len()
        && oa
            .children
            .iter()
            .zip(&ob.children)
            .all(|(ca, cb)| objects_equal(left, *ca, right, *cb))
        && oa.properties.len() == ob.properties.len()
        && oa.properties.iter().all(|(k, va)| {
            ob.properties
                .get(k)
                .map_or(false, |vb| values_equal(left, va, right, vb))
        })
}

fn values_equal<X: PartialEq>(
    left: &Document<X>,
    a: &Value,
    right: &Document<X>,
    b: &Value,
) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => objects_equal(left, *a, right, *b),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| values_equal(left, x, right, y))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, ObjectId, ObjectId, ObjectId) {
        let mut doc = Document::new();
        let root = doc.new_object(Some("Root"), ());
        doc.set_root(root);
        let a = doc.new_object(Some("A"), ());
        let b = doc.new_object(Some("B"), ());
        doc.add_child(root, a);
        doc.add_child(root, b);
        (doc, root, a, b)
    }

    #[test]
    fn test_children_and_parent() {
        let (doc, root, a, b) = sample();
        assert_eq!(doc[root].children(), &[a, b]);
        assert_eq!(doc[a].parent(), Some(root));
        assert_eq!(doc[root].parent(), None);
        let names: Vec<_> = doc.children(root).filter_map(|o| o.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_siblings() {
        let (doc, root, a, b) = sample();
        assert_eq!(doc.siblings(a), vec![b]);
        assert!(doc.siblings(root).is_empty());
    }

    #[test]
    fn test_property_overwrite_keeps_position() {
        let (mut doc, root, _, _) = sample();
        doc.set_property(root, "x", Value::Integer(1));
        doc.set_property(root, "y", Value::Integer(2));
        let old = doc.set_property(root, "x", Value::Integer(3));
        assert_eq!(old, Some(Value::Integer(1)));
        let keys: Vec<_> = doc[root].properties().keys().cloned().collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert_eq!(doc[root].property("x"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_property_objects_are_adopted() {
        let (mut doc, root, _, _) = sample();
        let inner = doc.new_object(None, ());
        doc.set_property(root, "items", Value::List(vec![Value::Object(inner)]));
        assert_eq!(doc[inner].parent(), Some(root));
        assert!(doc[inner].is_anonymous());
    }

    #[test]
    fn test_deep_list_is_adopted_and_dropped() {
        let (mut doc, root, _, _) = sample();
        let leaf = doc.new_object(Some("Leaf"), ());
        let mut value = Value::List(vec![Value::Object(leaf)]);
        for _ in 0..100_000 {
            value = Value::List(vec![value]);
        }
        doc.set_property(root, "deep", value);
        assert_eq!(doc[leaf].parent(), Some(root));
        drop(doc);
    }

    #[test]
    fn test_structural_equality_ignores_layout() {
        let (left, ..) = sample();

        let mut right = Document::new();
        let b = right.new_object(Some("B"), ());
        let a = right.new_object(Some("A"), ());
        let root = right.new_object(Some("Root"), ());
        right.set_root(root);
        right.add_child(root, a);
        right.add_child(root, b);
        assert_eq!(left, right);

        right.set_property(b, "extra", Value::Boolean(true));
        assert_ne!(left, right);
    }
}
