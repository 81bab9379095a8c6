use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::diagnostics::error::RuntimeError;
use crate::runtime::protocol::Protocol;
use crate::runtime::record::Record;
use crate::runtime::tag::Tag;
use crate::runtime::value::Value;

/// Protocol registered in a namespace, with its propagation marker.
#[derive(Clone)]
pub(crate) struct ProtocolEntry {
    pub protocol: Protocol,
    pub exported: bool,
}

/// Implementation recorded locally but not yet linked into a protocol
/// table. The linker resolves the protocol tag against the merged tables
/// once every sibling module has contributed its own extensions.
#[derive(Clone)]
pub(crate) struct StagedImpl {
    pub type_tag: Tag,
    pub protocol_tag: Tag,
    pub methods: HashMap<String, Value>,
    pub exported: bool,
}

struct NamespaceInner {
    name: Rc<str>,
    bindings: Record,
    exports: Record,
    protocols: Vec<ProtocolEntry>,
    parent: Option<Weak<RefCell<NamespaceInner>>>,
    children: Vec<Namespace>,
    staged: Vec<StagedImpl>,
}

/// A module's namespace: a record of bindings specialized with an export
/// surface, a protocol table with parent-chain fallback, nested child
/// namespaces, and a staging area for implementations awaiting linking.
///
/// Parents own their children; the child's parent link is weak, so a
/// namespace tree owns no reference cycles.
#[derive(Clone)]
pub struct Namespace {
    inner: Rc<RefCell<NamespaceInner>>,
}

impl Namespace {
    pub fn root(name: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NamespaceInner {
                name: name.into(),
                bindings: Record::new(),
                exports: Record::new(),
                protocols: Vec::new(),
                parent: None,
                children: Vec::new(),
                staged: Vec::new(),
            })),
        }
    }

    /// Creates a nested namespace registered under this one.
    ///
    /// The child's bindings fork the parent's record, so parent bindings
    /// stay visible down the tree without being copied; the export
    /// surface starts empty, and protocol resolution falls back to the
    /// parent chain.
    pub fn child(&self, package: &str) -> Namespace {
        let child = Namespace {
            inner: Rc::new(RefCell::new(NamespaceInner {
                name: package.into(),
                bindings: self.inner.borrow().bindings.fork(),
                exports: Record::new(),
                protocols: Vec::new(),
                parent: Some(Rc::downgrade(&self.inner)),
                children: Vec::new(),
                staged: Vec::new(),
            })),
        };
        self.inner.borrow_mut().children.push(child.clone());
        child
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.to_string()
    }

    /// Binds a name in this namespace. Rebinding a live name is an error;
    /// use [`Namespace::rebind`] for the interactive-session affordance.
    pub fn define(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        self.inner.borrow().bindings.add(name, value)
    }

    /// Forced rebinding: replaces any existing binding and reports
    /// whether one was overwritten, so an interactive host can print its
    /// overwrite note.
    pub fn rebind(&self, name: &str, value: Value) -> bool {
        self.inner.borrow().bindings.put(name, value)
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        self.inner.borrow().bindings.get(name)
    }

    pub fn bindings(&self) -> Record {
        self.inner.borrow().bindings.clone()
    }

    /// The subset of bindings visible outside the module.
    pub fn exports(&self) -> Record {
        self.inner.borrow().exports.clone()
    }

    /// Copies a binding onto the export surface.
    ///
    /// A Protocol or ADT value additionally has its generated surface
    /// (method dispatch shortcuts or variant constructors) unpacked into
    /// the exports, which is what import-style flattening consumes.
    pub fn declare_export(&self, name: &str) -> Result<(), RuntimeError> {
        let value = self.get(name)?;
        let exports = self.exports();
        exports.put(name, value.clone());
        match value {
            Value::Protocol(protocol) => {
                for (binding, shortcut) in protocol.surface_bindings() {
                    exports.put(&binding, shortcut);
                }
            }
            Value::Adt(adt) => {
                for (binding, constructor) in adt.surface_bindings() {
                    exports.put(&binding, constructor);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Binds a protocol and registers it in the local protocol table.
    /// Exported protocols are propagated upward by the linker.
    pub fn declare_protocol(
        &self,
        protocol: &Protocol,
        exported: bool,
    ) -> Result<(), RuntimeError> {
        self.define(&protocol.name(), Value::Protocol(protocol.clone()))?;
        let mut inner = self.inner.borrow_mut();
        let tag = protocol.tag();
        if let Some(entry) = inner.protocols.iter_mut().find(|e| e.protocol.tag() == tag) {
            entry.protocol = protocol.clone();
            entry.exported = exported;
        } else {
            inner.protocols.push(ProtocolEntry {
                protocol: protocol.clone(),
                exported,
            });
        }
        Ok(())
    }

    /// Stages an implementation for the linker's second phase. Exported
    /// entries are additionally applied to the parent's protocol table
    /// during linking.
    pub fn register_implementation(
        &self,
        type_tag: Tag,
        protocol: &Protocol,
        methods: HashMap<String, Value>,
        exported: bool,
    ) {
        self.inner.borrow_mut().staged.push(StagedImpl {
            type_tag,
            protocol_tag: protocol.tag(),
            methods,
            exported,
        });
    }

    /// Resolves a protocol tag against the local table, falling back to
    /// the parent chain.
    pub fn resolve_protocol(&self, tag: &Tag) -> Option<Protocol> {
        if let Some(found) = self.find_local_protocol(tag) {
            return Some(found);
        }
        self.parent()?.resolve_protocol(tag)
    }

    pub fn parent(&self) -> Option<Namespace> {
        let weak = self.inner.borrow().parent.clone()?;
        weak.upgrade().map(|inner| Namespace { inner })
    }

    pub fn children(&self) -> Vec<Namespace> {
        self.inner.borrow().children.clone()
    }

    pub(crate) fn find_local_protocol(&self, tag: &Tag) -> Option<Protocol> {
        self.inner
            .borrow()
            .protocols
            .iter()
            .find(|entry| entry.protocol.tag() == *tag)
            .map(|entry| entry.protocol.clone())
    }

    pub(crate) fn protocol_entries(&self) -> Vec<ProtocolEntry> {
        self.inner.borrow().protocols.clone()
    }

    pub(crate) fn adopt_protocol(&self, entry: ProtocolEntry) {
        self.inner.borrow_mut().protocols.push(entry);
    }

    pub(crate) fn drain_staged(&self) -> Vec<StagedImpl> {
        self.inner.borrow_mut().staged.drain(..).collect()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        write!(
            f,
            "Namespace({}, {} children)",
            inner.name,
            inner.children.len()
        )
    }
}
