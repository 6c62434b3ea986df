//! Copying objects from one document into another.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Deep-copies objects from a source document, renumbering references.
///
/// Each source object is copied at most once; repeated references map to
/// the same destination object, so cycles terminate.
pub(crate) struct ObjectImporter<'a> {
    source: &'a Document,
    mapping: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> ObjectImporter<'a> {
    pub fn new(source: &'a Document) -> Self {
        Self {
            source,
            mapping: BTreeMap::new(),
        }
    }

    /// Copy `obj` and everything it references into `dest`.
    pub fn import(&mut self, dest: &mut Document, obj: &Object) -> Object {
        match obj {
            Object::Reference(id) => Object::Reference(self.import_id(dest, *id)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|o| self.import(dest, o)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.import_dict(dest, dict)),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.import_dict(dest, &stream.dict);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn import_id(&mut self, dest: &mut Document, id: ObjectId) -> ObjectId {
        if let Some(&mapped) = self.mapping.get(&id) {
            return mapped;
        }

        let new_id = dest.new_object_id();
        self.mapping.insert(id, new_id);

        let source = self.source;
        let copied = match source.get_object(id) {
            Ok(obj) => self.import(dest, obj),
            Err(e) => {
                log::debug!("Dangling reference {:?}: {}", id, e);
                Object::Null
            }
        };
        dest.objects.insert(new_id, copied);
        new_id
    }

    fn import_dict(&mut self, dest: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            // Back-links into the source page tree would drag the whole
            // source document along.
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.import(dest, value));
        }
        copy
    }

    /// Number of objects copied so far.
    pub fn imported_count(&self) -> usize {
        self.mapping.len()
    }
}
