use std::env;

use crate::diagnostics::error::RuntimeError;
use crate::runtime::namespace::Namespace;

/// Two-phase module linker.
///
/// Phase one propagates exported protocol definitions from children into
/// their parent namespace (adopting unknown tags, merging known ones);
/// phase two resolves every staged implementation against the
/// already-merged tables and registers it. The phases are separate
/// because an implementation staged in a leaf module may target a
/// protocol whose final parent chain is only known after every sibling
/// module has contributed its extensions; interleaving them would make
/// propagation order-dependent.
///
/// Both phases walk the tree depth-first from the root, handling each
/// level before recursing into its children.
pub struct Linker {
    trace: bool,
}

impl Linker {
    /// Tracing defaults to the `SABLE_TRACE_LINK` environment variable.
    pub fn new() -> Self {
        Self {
            trace: env::var_os("SABLE_TRACE_LINK").is_some(),
        }
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn link(&self, root: &Namespace) -> Result<(), RuntimeError> {
        self.setup_protocols(root)?;
        self.setup_implementations(root)
    }

    fn setup_protocols(&self, ns: &Namespace) -> Result<(), RuntimeError> {
        for child in ns.children() {
            for entry in child.protocol_entries() {
                if !entry.exported {
                    continue;
                }
                let tag = entry.protocol.tag();
                match ns.find_local_protocol(&tag) {
                    None => {
                        self.trace_link(&format!(
                            "adopt {} from {} into {}",
                            tag,
                            child.name(),
                            ns.name()
                        ));
                        ns.adopt_protocol(entry);
                    }
                    Some(existing) => {
                        self.trace_link(&format!(
                            "merge {} from {} into {}",
                            tag,
                            child.name(),
                            ns.name()
                        ));
                        existing.merge(&entry.protocol)?;
                    }
                }
            }
        }
        for child in ns.children() {
            self.setup_protocols(&child)?;
        }
        Ok(())
    }

    fn setup_implementations(&self, ns: &Namespace) -> Result<(), RuntimeError> {
        for staged in ns.drain_staged() {
            let protocol = ns
                .resolve_protocol(&staged.protocol_tag)
                .ok_or_else(|| RuntimeError::UnknownProtocol {
                    tag: staged.protocol_tag.clone(),
                })?;
            self.trace_link(&format!(
                "implement {} for {} in {}",
                staged.protocol_tag,
                staged.type_tag,
                ns.name()
            ));
            protocol.add_implementation(staged.type_tag.clone(), staged.methods.clone())?;

            if staged.exported {
                if let Some(parent) = ns.parent() {
                    if let Some(parent_protocol) = parent.resolve_protocol(&staged.protocol_tag) {
                        if !parent_protocol.same_instance(&protocol) {
                            parent_protocol
                                .add_implementation(staged.type_tag, staged.methods)?;
                        }
                    }
                }
            }
        }
        for child in ns.children() {
            self.setup_implementations(&child)?;
        }
        Ok(())
    }

    fn trace_link(&self, message: &str) {
        if self.trace {
            eprintln!("link: {}", message);
        }
    }
}

impl Default for Linker {
    fn default() -> Self {
        Self::new()
    }
}

/// Links a namespace tree with the default linker configuration.
pub fn link(root: &Namespace) -> Result<(), RuntimeError> {
    Linker::new().link(root)
}
