use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::diagnostics::error::RuntimeError;
use crate::runtime::native_function::NativeFunction;
use crate::runtime::tag::Tag;
use crate::runtime::value::Value;

#[derive(Clone)]
struct VariantDef {
    name: String,
    qualified: Rc<str>,
    tag: Tag,
    arity: usize,
}

struct AdtInner {
    name: Rc<str>,
    tag: Tag,
    sealed: bool,
    variants: Vec<VariantDef>,
}

/// Closed sum type: a family tag plus named variant constructors.
///
/// Variants are registered during module initialization and the type is
/// then sealed; sealing permanently closes the variant set, which is the
/// basis for exhaustiveness assumptions in the compiled language. Values
/// carry both the family tag (protocol dispatch) and the variant tag
/// (pattern matching).
#[derive(Clone)]
pub struct Adt {
    inner: Rc<RefCell<AdtInner>>,
}

impl Adt {
    pub fn define(name: &str) -> Self {
        Self::with_tag(name, Tag::fresh(name))
    }

    pub fn define_stable(name: &str, package: &str, site: &str) -> Self {
        Self::with_tag(name, Tag::stable(name, package, site))
    }

    fn with_tag(name: &str, tag: Tag) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AdtInner {
                name: name.into(),
                tag,
                sealed: false,
                variants: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.to_string()
    }

    /// The family tag. ADT descriptor values answer this tag from
    /// `tag_of`, so the descriptor itself identifies the type in
    /// `add_implementation` calls.
    pub fn tag(&self) -> Tag {
        self.inner.borrow().tag.clone()
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.borrow().sealed
    }

    /// Registers a variant and installs its constructor.
    ///
    /// The constructor enforces the declared arity at construction time
    /// and produces values tagged with both the family tag and the
    /// variant's own tag, carrying the arguments as positional fields.
    /// Registering an existing variant name replaces it.
    pub fn add_variant(&self, name: &str, arity: usize) -> Result<(), RuntimeError> {
        let mut inner = self.inner.borrow_mut();
        if inner.sealed {
            return Err(RuntimeError::SealedAdt {
                adt: inner.name.to_string(),
                variant: name.to_string(),
            });
        }
        let qualified: Rc<str> = format!("{}.{}", inner.name, name).into();
        let def = VariantDef {
            name: name.to_string(),
            tag: Tag::fresh(&qualified),
            qualified,
            arity,
        };
        if let Some(existing) = inner.variants.iter_mut().find(|v| v.name == name) {
            *existing = def;
        } else {
            inner.variants.push(def);
        }
        Ok(())
    }

    /// Permanently closes the variant set.
    pub fn seal(&self) {
        self.inner.borrow_mut().sealed = true;
    }

    /// The constructor registered under `name`.
    pub fn get_variant(&self, name: &str) -> Result<NativeFunction, RuntimeError> {
        let inner = self.inner.borrow();
        let def = inner
            .variants
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| RuntimeError::UnknownVariant {
                adt: inner.name.to_string(),
                variant: name.to_string(),
            })?;
        Ok(Self::constructor(&inner.tag, def))
    }

    /// Variant names in registration order.
    pub fn variants(&self) -> Vec<String> {
        self.inner
            .borrow()
            .variants
            .iter()
            .map(|v| v.name.clone())
            .collect()
    }

    /// Generated bindings for the ADT's surface: one constructor per
    /// variant, keyed by variant name. Unpacked into an importer's
    /// namespace by `declare_export`.
    pub fn surface_bindings(&self) -> Vec<(String, Value)> {
        let inner = self.inner.borrow();
        inner
            .variants
            .iter()
            .map(|def| {
                (
                    def.name.clone(),
                    Value::Function(Self::constructor(&inner.tag, def)),
                )
            })
            .collect()
    }

    fn constructor(family: &Tag, def: &VariantDef) -> NativeFunction {
        let family = family.clone();
        let variant = def.tag.clone();
        let qualified = Rc::clone(&def.qualified);
        let arity = def.arity;
        let ctor_name = Rc::clone(&def.qualified);
        NativeFunction::new(ctor_name, move |args| {
            if args.len() != arity {
                return Err(RuntimeError::WrongArity {
                    callable: qualified.to_string(),
                    expected: arity,
                    got: args.len(),
                });
            }
            Ok(Value::Data(Rc::new(DataValue {
                family: family.clone(),
                variant: variant.clone(),
                name: Rc::clone(&qualified),
                fields: args,
            })))
        })
    }
}

impl fmt::Debug for Adt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        write!(f, "Adt({} {})", inner.name, inner.tag)
    }
}

/// Instance of an ADT variant: family and variant tags plus positional
/// fields in constructor-argument order. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct DataValue {
    family: Tag,
    variant: Tag,
    name: Rc<str>,
    fields: Vec<Value>,
}

impl DataValue {
    pub fn family_tag(&self) -> &Tag {
        &self.family
    }

    /// The variant's own tag, the key pattern matching compares.
    pub fn variant_tag(&self) -> &Tag {
        &self.variant
    }

    /// Qualified variant name, `Family.Variant`.
    pub fn variant_name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{}", self.name);
        }
        let items: Vec<String> = self.fields.iter().map(|v| v.to_string()).collect();
        write!(f, "{}({})", self.name, items.join(", "))
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family && self.variant == other.variant && self.fields == other.fields
    }
}
