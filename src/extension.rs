//! Pluggable handlers for vendor and format extensions
//!
//! A handler is keyed by the namespace URI it understands. When a model part
//! declares that namespace, the handler is given the chance to rewrite every
//! mesh of that part before geometry is built. Handlers see the raw XML of the
//! part and the prefix it was bound to, so they can pick up elements and
//! attributes the core parser skips.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Mesh, ModelDocument};

/// What a handler gets to see besides the mesh
#[derive(Debug, Clone, Copy)]
pub struct ExtensionContext<'a> {
    /// Namespace URI the handler was matched on
    pub namespace: &'a str,
    /// Prefix the document bound the namespace to
    pub prefix: &'a str,
    /// Archive path of the model part
    pub part_name: &'a str,
    /// Full XML text of the model part
    pub document_xml: &'a str,
    /// Id of the object whose mesh is being processed
    pub object_id: &'a str,
}

/// Handler for one extension namespace
///
/// # Example
///
/// ```
/// use lib3mf_scene::extension::{ExtensionContext, ExtensionHandler};
/// use lib3mf_scene::model::Mesh;
/// use lib3mf_scene::Result;
///
/// struct DropDegenerate;
///
/// impl ExtensionHandler for DropDegenerate {
///     fn namespace(&self) -> &str {
///         "http://example.com/cleanup/2024"
///     }
///
///     fn apply(&self, _ctx: &ExtensionContext<'_>, mesh: &mut Mesh) -> Result<()> {
///         let keep: Vec<bool> = mesh
///             .triangles
///             .iter()
///             .map(|[a, b, c]| a != b && b != c && a != c)
///             .collect();
///         let mut i = 0;
///         mesh.triangles.retain(|_| { i += 1; keep[i - 1] });
///         let mut i = 0;
///         mesh.triangle_properties.retain(|_| { i += 1; keep[i - 1] });
///         Ok(())
///     }
/// }
/// ```
pub trait ExtensionHandler: Send + Sync {
    /// Namespace URI this handler understands
    fn namespace(&self) -> &str;

    /// Human-readable name, used in logs
    fn name(&self) -> &str {
        self.namespace()
    }

    /// Rewrite a mesh before geometry is built from it
    fn apply(&self, ctx: &ExtensionContext<'_>, mesh: &mut Mesh) -> Result<()>;
}

/// Ordered collection of extension handlers
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    handlers: Vec<Arc<dyn ExtensionHandler>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.namespace()))
            .finish()
    }
}

impl ExtensionRegistry {
    /// Create a new empty extension registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension handler; handlers run in registration order
    pub fn register(&mut self, handler: Arc<dyn ExtensionHandler>) {
        self.handlers.push(handler);
    }

    /// Get all registered handlers
    pub fn handlers(&self) -> &[Arc<dyn ExtensionHandler>] {
        &self.handlers
    }

    /// Whether no handler is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler whose namespace the document declares on one mesh
    ///
    /// The mesh is only copied when at least one handler applies. Handler
    /// failures are reported as [`Error::Extension`].
    pub fn apply_all<'m>(
        &self,
        document: &ModelDocument,
        object_id: &str,
        mesh: &'m Mesh,
    ) -> Result<Cow<'m, Mesh>> {
        let mut mesh = Cow::Borrowed(mesh);

        for handler in &self.handlers {
            let namespace = handler.namespace();
            let Some(prefix) = document.extension_prefix(namespace) else {
                continue;
            };

            let ctx = ExtensionContext {
                namespace,
                prefix,
                part_name: &document.part_name,
                document_xml: &document.xml,
                object_id,
            };
            debug!(extension = %handler.name(), object = %object_id, "applying extension");
            handler
                .apply(&ctx, mesh.to_mut())
                .map_err(|e| match e {
                    Error::Extension { .. } => e,
                    other => Error::Extension {
                        namespace: namespace.to_string(),
                        message: other.to_string(),
                    },
                })?;
        }

        Ok(mesh)
    }
}
