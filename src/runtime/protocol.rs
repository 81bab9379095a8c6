use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::diagnostics::error::RuntimeError;
use crate::runtime::native_function::NativeFunction;
use crate::runtime::tag::Tag;
use crate::runtime::value::{Value, tag_of};

/// Per-type method table: required methods overlaid on the protocol's
/// defaults at registration time.
pub type MethodTable = Rc<HashMap<String, Value>>;

struct ProtocolInner {
    name: Rc<str>,
    tag: Tag,
    required: Vec<String>,
    defaults: HashMap<String, Value>,
    impls: HashMap<Tag, MethodTable>,
    parents: Vec<Protocol>,
}

/// Named set of required operations with per-type implementation tables.
///
/// Protocols give the compiled language ad-hoc polymorphism over
/// externally defined types. A protocol is created once at module
/// definition time; implementations accumulate as modules declare them
/// and are never removed. Requisite and conflict checks run at
/// registration so structural errors surface at module-load time; parent
/// satisfaction is validated at program start, once linking has fixed the
/// final parent chain.
#[derive(Clone)]
pub struct Protocol {
    inner: Rc<RefCell<ProtocolInner>>,
}

impl Protocol {
    /// Defines a protocol under a process-local tag.
    pub fn define(name: &str) -> Self {
        Self::with_tag(name, Tag::fresh(name))
    }

    /// Defines a protocol under a location-stable tag, so independently
    /// loaded copies of the defining module are one logical protocol.
    pub fn define_stable(name: &str, package: &str, site: &str) -> Self {
        Self::with_tag(name, Tag::stable(name, package, site))
    }

    fn with_tag(name: &str, tag: Tag) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ProtocolInner {
                name: name.into(),
                tag,
                required: Vec::new(),
                defaults: HashMap::new(),
                impls: HashMap::new(),
                parents: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.to_string()
    }

    pub fn tag(&self) -> Tag {
        self.inner.borrow().tag.clone()
    }

    pub fn required(&self) -> Vec<String> {
        self.inner.borrow().required.clone()
    }

    pub fn same_instance(&self, other: &Protocol) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Registers a required method name.
    pub fn require(&self, method: &str) {
        let mut inner = self.inner.borrow_mut();
        if !inner.required.iter().any(|existing| existing.as_str() == method) {
            inner.required.push(method.to_string());
        }
    }

    /// Registers a required method with a default implementation; types
    /// that omit the method receive the default through the overlay.
    pub fn require_with_default(&self, method: &str, fallback: NativeFunction) {
        self.require(method);
        self.inner
            .borrow_mut()
            .defaults
            .insert(method.to_string(), Value::Function(fallback));
    }

    /// Declares that this protocol extends `parent`.
    ///
    /// Rejected when the two required-method sets overlap: the overlap
    /// would make dispatch of the shared names ambiguous.
    pub fn extend(&self, parent: &Protocol) -> Result<(), RuntimeError> {
        let mut conflicts: Vec<String> = {
            let own = self.inner.borrow();
            parent
                .required()
                .into_iter()
                .filter(|name| own.required.contains(name))
                .collect()
        };
        if !conflicts.is_empty() {
            conflicts.sort();
            return Err(RuntimeError::RequirementConflict {
                protocol: self.name(),
                parent: parent.name(),
                conflicts,
            });
        }
        self.inner.borrow_mut().parents.push(parent.clone());
        Ok(())
    }

    /// Registers `methods` as the implementation of this protocol for the
    /// type identified by `type_tag`.
    ///
    /// The supplied table is overlaid onto the defaults, and the union
    /// must match the required set exactly: omissions raise
    /// `MissingMethods`, extras raise `ExtraneousMethods`, both naming
    /// the offending methods. Re-registration for the same tag overwrites
    /// silently. Parent satisfaction is not checked here but at program
    /// start, since the parent chain may still grow during linking.
    pub fn add_implementation(
        &self,
        type_tag: Tag,
        methods: HashMap<String, Value>,
    ) -> Result<(), RuntimeError> {
        let mut inner = self.inner.borrow_mut();

        let mut extraneous: Vec<String> = methods
            .keys()
            .filter(|name| !inner.required.contains(*name))
            .cloned()
            .collect();
        if !extraneous.is_empty() {
            extraneous.sort();
            return Err(RuntimeError::ExtraneousMethods {
                protocol: inner.name.to_string(),
                type_tag,
                extraneous,
            });
        }

        let mut overlay = inner.defaults.clone();
        overlay.extend(methods);

        let mut missing: Vec<String> = inner
            .required
            .iter()
            .filter(|name| !overlay.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(RuntimeError::MissingMethods {
                protocol: inner.name.to_string(),
                type_tag,
                missing,
            });
        }

        inner.impls.insert(type_tag, Rc::new(overlay));
        Ok(())
    }

    pub fn has_implementation(&self, type_tag: &Tag) -> bool {
        self.inner.borrow().impls.contains_key(type_tag)
    }

    pub fn get_implementation(&self, type_tag: &Tag) -> Result<MethodTable, RuntimeError> {
        let inner = self.inner.borrow();
        inner
            .impls
            .get(type_tag)
            .cloned()
            .ok_or_else(|| RuntimeError::NoImplementation {
                protocol: inner.name.to_string(),
                type_tag: type_tag.clone(),
            })
    }

    /// Dispatches `method` on the tag of the first argument.
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let Some(receiver) = args.first() else {
            return Err(RuntimeError::WrongArity {
                callable: format!("{}.{}", self.name(), method),
                expected: 1,
                got: 0,
            });
        };
        let type_tag = tag_of(receiver);
        let table = self.get_implementation(&type_tag)?;
        match table.get(method) {
            Some(Value::Function(func)) => func.call(args),
            _ => Err(RuntimeError::MissingMethods {
                protocol: self.name(),
                type_tag,
                missing: vec![method.to_string()],
            }),
        }
    }

    /// Merges `other` into this protocol.
    ///
    /// The two must be structurally the same protocol: equal tags, or
    /// equal sorted required-method sets. On success `other`'s
    /// implementation entries overwrite same-keyed entries here: last
    /// writer wins, and duplicate registration across merged copies is
    /// accepted silently.
    pub fn merge(&self, other: &Protocol) -> Result<(), RuntimeError> {
        if self.same_instance(other) {
            return Ok(());
        }
        if !self.structurally_equal(other) {
            return Err(RuntimeError::DivergingProtocols {
                left: self.name(),
                right: other.name(),
            });
        }
        let entries: Vec<(Tag, MethodTable)> = other
            .inner
            .borrow()
            .impls
            .iter()
            .map(|(tag, table)| (tag.clone(), Rc::clone(table)))
            .collect();
        let mut inner = self.inner.borrow_mut();
        for (tag, table) in entries {
            inner.impls.insert(tag, table);
        }
        Ok(())
    }

    fn structurally_equal(&self, other: &Protocol) -> bool {
        if self.tag() == other.tag() {
            return true;
        }
        let mut left = self.required();
        let mut right = other.required();
        left.sort();
        right.sort();
        left == right
    }

    /// Verifies that every type implementing this protocol also
    /// implements every declared parent. Called at program start, once
    /// the fully merged parent chain is final.
    pub fn validate_parents(&self) -> Result<(), RuntimeError> {
        let (mut tags, parents) = {
            let inner = self.inner.borrow();
            (
                inner.impls.keys().cloned().collect::<Vec<_>>(),
                inner.parents.clone(),
            )
        };
        tags.sort_by_key(|tag| tag.to_string());
        for tag in &tags {
            for parent in &parents {
                if !parent.has_implementation(tag) {
                    return Err(RuntimeError::UnsatisfiedParent {
                        parent: parent.name(),
                        type_tag: tag.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Generated unqualified bindings for the protocol's surface: one
    /// dispatch shortcut per required method, each dispatching on the tag
    /// of its first argument. Unpacked into an importer's namespace by
    /// `declare_export`.
    pub fn surface_bindings(&self) -> Vec<(String, Value)> {
        let name = self.name();
        self.required()
            .into_iter()
            .map(|method| {
                let protocol = self.clone();
                let method_name = method.clone();
                let shortcut = NativeFunction::new(
                    format!("{}.{}", name, method),
                    move |args| protocol.invoke(&method_name, args),
                );
                (method, Value::Function(shortcut))
            })
            .collect()
    }
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        write!(f, "Protocol({} {})", inner.name, inner.tag)
    }
}
