use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::diagnostics::error::RuntimeError;
use crate::runtime::value::Value;

/// Index of a layer inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayerId(usize);

#[derive(Debug, Default)]
struct Layer {
    parent: Option<LayerId>,
    fields: HashMap<String, Value>,
    tombstones: HashSet<String>,
}

#[derive(Debug, Default)]
struct Arena {
    layers: Vec<Layer>,
}

impl Arena {
    fn push(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.layers.len());
        self.layers.push(layer);
        id
    }
}

/// Open structural record built from delegation layers.
///
/// A record handle is an arena plus the index of its most specific layer.
/// Every layer-creating operation (`fork`, `with_extension`,
/// `without_fields`, `rename`) allocates a new layer in the arena and
/// leaves ancestor layers untouched, so handles sharing an ancestor never
/// observe each other's changes. Removal is a tombstone in the new layer,
/// not a mutation of the ancestor that binds the field: lookups stop at
/// the tombstone instead of falling through.
#[derive(Clone)]
pub struct Record {
    arena: Rc<RefCell<Arena>>,
    layer: LayerId,
}

impl Record {
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let layer = arena.push(Layer::default());
        Self {
            arena: Rc::new(RefCell::new(arena)),
            layer,
        }
    }

    fn derive(&self, layer: Layer) -> Record {
        let id = self.arena.borrow_mut().push(layer);
        Record {
            arena: Rc::clone(&self.arena),
            layer: id,
        }
    }

    /// Installs a binding in this handle's own layer.
    ///
    /// Fails if the own layer already binds `name` to a non-nil value; a
    /// tombstone in the own layer is cleared by the add. Bindings in
    /// ancestor layers are shadowed, not rejected.
    pub fn add(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut arena = self.arena.borrow_mut();
        let layer = &mut arena.layers[self.layer.0];
        if matches!(layer.fields.get(name), Some(bound) if !matches!(bound, Value::Nil)) {
            return Err(RuntimeError::DuplicateField {
                field: name.to_string(),
            });
        }
        layer.tombstones.remove(name);
        layer.fields.insert(name.to_string(), value);
        Ok(())
    }

    /// Replaces a binding in this handle's own layer unconditionally.
    ///
    /// Returns whether a visible non-nil binding was overwritten. The
    /// interactive-session affordance behind `Namespace::rebind`.
    pub fn put(&self, name: &str, value: Value) -> bool {
        let overwrote = self.get(name).is_ok();
        let mut arena = self.arena.borrow_mut();
        let layer = &mut arena.layers[self.layer.0];
        layer.tombstones.remove(name);
        layer.fields.insert(name.to_string(), value);
        overwrote
    }

    /// Resolves a field by walking the delegation chain outward.
    ///
    /// A tombstone anywhere on the walk makes the field absent even if an
    /// ancestor still binds it; a nil binding falls through.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        let arena = self.arena.borrow();
        let mut current = Some(self.layer);
        while let Some(id) = current {
            let layer = &arena.layers[id.0];
            if layer.tombstones.contains(name) {
                break;
            }
            match layer.fields.get(name) {
                Some(Value::Nil) | None => {}
                Some(value) => return Ok(value.clone()),
            }
            current = layer.parent;
        }
        Err(RuntimeError::NoSuchField {
            field: name.to_string(),
        })
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// New layer over `self` carrying every field visible through
    /// `other`'s chain. The copied fields shadow anything `self` binds.
    pub fn with_extension(&self, other: &Record) -> Record {
        let mut fields = HashMap::new();
        for (name, value) in other.visible_fields() {
            fields.insert(name, value);
        }
        self.derive(Layer {
            parent: Some(self.layer),
            fields,
            tombstones: HashSet::new(),
        })
    }

    /// New layer in which every given name is tombstoned.
    pub fn without_fields(&self, names: &[&str]) -> Record {
        self.derive(Layer {
            parent: Some(self.layer),
            fields: HashMap::new(),
            tombstones: names.iter().map(|name| name.to_string()).collect(),
        })
    }

    /// New layer where each `(old, new)` pair has the value seen at `old`
    /// copied to `new` and `old` tombstoned.
    pub fn rename(&self, pairs: &[(&str, &str)]) -> Result<Record, RuntimeError> {
        let mut fields = HashMap::new();
        let mut tombstones = HashSet::new();
        for (old, new) in pairs {
            let value = self.get(old)?;
            fields.insert(new.to_string(), value);
            tombstones.insert(old.to_string());
        }
        Ok(self.derive(Layer {
            parent: Some(self.layer),
            fields,
            tombstones,
        }))
    }

    /// Zero-field new layer over `self`: the user-visible `clone`.
    pub fn fork(&self) -> Record {
        self.derive(Layer {
            parent: Some(self.layer),
            fields: HashMap::new(),
            tombstones: HashSet::new(),
        })
    }

    /// Flattened view of every visible field, shadowing and tombstones
    /// applied, sorted by name for deterministic iteration.
    pub fn visible_fields(&self) -> Vec<(String, Value)> {
        let arena = self.arena.borrow();
        let mut seen: HashSet<String> = HashSet::new();
        let mut dead: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        let mut current = Some(self.layer);
        while let Some(id) = current {
            let layer = &arena.layers[id.0];
            for name in &layer.tombstones {
                dead.insert(name.clone());
            }
            for (name, value) in &layer.fields {
                if seen.contains(name) || dead.contains(name) {
                    continue;
                }
                seen.insert(name.clone());
                if !matches!(value, Value::Nil) {
                    out.push((name.clone(), value.clone()));
                }
            }
            current = layer.parent;
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record(layer {})", self.layer.0)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena) && self.layer == other.layer
    }
}
