/// Context - the thread-affine execution target for GPU commands
///
/// Exactly one context is current per thread. Every resource records the
/// context that was current when it was created and re-checks, on every
/// call, that the current context is that one or a share-group sibling.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use crate::context::SemanticRegistry;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::pass::PassState;
use crate::renderer::{Renderer, RendererStats, Viewport};
use crate::resource::FrameBuffer;
use crate::{engine_debug, engine_fail, engine_fatal, engine_warn};

slotmap::new_key_type! {
    /// Identity of a context in the engine's context table
    pub struct ContextId;

    /// Identity of a resource inside its owning context's slot table
    pub struct ResourceSlot;
}

/// Identity of a share group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShareGroupId(pub(crate) u32);

static NEXT_SHARE_GROUP: AtomicU32 = AtomicU32::new(1);

impl ShareGroupId {
    fn next() -> Self {
        ShareGroupId(NEXT_SHARE_GROUP.fetch_add(1, Ordering::Relaxed))
    }
}

/// Kind of a resource registered in a context's slot table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    VertexArray,
    Texture,
    RenderBuffer,
    FrameBuffer,
    Program,
}

// ===== CURRENT CONTEXT =====

thread_local! {
    static CURRENT: RefCell<Option<Arc<Context>>> = const { RefCell::new(None) };
}

/// The context current on the calling thread
pub fn current() -> Option<Arc<Context>> {
    CURRENT.with(|current| current.borrow().clone())
}

fn set_current(context: Option<Arc<Context>>) {
    // The replaced context may be dropped here; its destructor reads the cell
    let previous = CURRENT.with(|current| current.replace(context));
    drop(previous);
}

/// Label of the context current on the calling thread, for log entries
pub(crate) fn current_label() -> Option<String> {
    CURRENT
        .try_with(|current| {
            current
                .try_borrow()
                .ok()
                .and_then(|current| current.as_ref().map(|context| context.label().to_string()))
        })
        .ok()
        .flatten()
}

/// The current context, or a fatal `NoCurrentContext` naming `what`
pub(crate) fn current_or_fatal(source: &str, what: &str) -> Arc<Context> {
    match current() {
        Some(context) => context,
        None => engine_fatal!(source, Error::NoCurrentContext(format!("{} requires a current context", what))),
    }
}

// ===== CONFIG =====

/// Context configuration
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Name used in logs and error messages
    pub label: String,
    /// Viewport used when rendering to the default framebuffer; updated by `resize()`
    pub default_viewport: Viewport,
    /// Number of vertex buffer binding slots of each vertex array
    pub max_vertex_bindings: u32,
    /// Name → semantic tables used by program reflection
    pub semantics: Arc<SemanticRegistry>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            label: "nebula".to_string(),
            default_viewport: Viewport::new(0, 0),
            max_vertex_bindings: 16,
            semantics: Arc::new(SemanticRegistry::default()),
        }
    }
}

// ===== CONTEXT =====

/// A renderer bound to a context identity, a share group and a semantic registry
pub struct Context {
    id: ContextId,
    share_group: ShareGroupId,
    config: ContextConfig,
    renderer: Arc<dyn Renderer>,
    default_frame_buffer: OnceLock<Arc<FrameBuffer>>,
    pub(crate) pass: Mutex<PassState>,
}

impl Context {
    /// Create a context in a new share group
    pub fn new(renderer: Arc<dyn Renderer>, config: ContextConfig) -> Arc<Context> {
        Self::create(renderer, config, ShareGroupId::next())
    }

    /// Create a context sharing resources with `sibling`
    pub fn new_shared(sibling: &Context, renderer: Arc<dyn Renderer>, config: ContextConfig) -> Arc<Context> {
        Self::create(renderer, config, sibling.share_group)
    }

    fn create(renderer: Arc<dyn Renderer>, config: ContextConfig, share_group: ShareGroupId) -> Arc<Context> {
        let id = Engine::register_context(&config.label, share_group);
        engine_debug!(
            "nebula::Context",
            "Created context '{}' ({:?}, share group {:?}, backend '{}')",
            config.label, id, share_group, renderer.name()
        );
        let pass = PassState::new(config.default_viewport);
        Arc::new(Context {
            id,
            share_group,
            config,
            renderer,
            default_frame_buffer: OnceLock::new(),
            pass: Mutex::new(pass),
        })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn share_group(&self) -> ShareGroupId {
        self.share_group
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn semantics(&self) -> &SemanticRegistry {
        &self.config.semantics
    }

    pub fn stats(&self) -> RendererStats {
        self.renderer.stats()
    }

    /// Number of live resources created under this context
    pub fn live_resources(&self) -> usize {
        Engine::live_resources(self.id)
    }

    /// Whether a resource owned by `(context, share_group)` may be used from this context
    pub fn is_compatible(&self, context: ContextId, share_group: ShareGroupId) -> bool {
        self.id == context || self.share_group == share_group
    }

    /// Whether this context is current on the calling thread
    pub fn is_current(&self) -> bool {
        CURRENT.with(|current| {
            current.borrow().as_ref().is_some_and(|c| c.id == self.id)
        })
    }

    /// Make this context current on the calling thread
    ///
    /// No-op if it already is. The returned guard restores the previously
    /// current context (or releases this one) when dropped.
    pub fn make_current(self: &Arc<Self>) -> Result<CurrentGuard> {
        let previous = current();
        if previous.as_ref().is_some_and(|p| p.id == self.id) {
            return Ok(CurrentGuard {
                context: Arc::clone(self),
                previous,
                switched: false,
                _not_send: PhantomData,
            });
        }

        if !self.renderer.make_current() {
            engine_fail!(
                "nebula::Context",
                Error::BackendError(format!("make_current failed for context '{}'", self.label()))
            );
        }
        set_current(Some(Arc::clone(self)));

        Ok(CurrentGuard {
            context: Arc::clone(self),
            previous,
            switched: true,
            _not_send: PhantomData,
        })
    }

    /// Release this context from the calling thread if it is current
    pub fn done_current(&self) -> bool {
        if !self.is_current() {
            return false;
        }
        let released = self.renderer.done_current();
        set_current(None);
        released
    }

    /// The window surface framebuffer of this context
    pub fn default_frame_buffer(self: &Arc<Self>) -> Arc<FrameBuffer> {
        Arc::clone(self.default_frame_buffer.get_or_init(|| FrameBuffer::new_default(self)))
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let leaked = Engine::unregister_context(self.id);
        for record in &leaked {
            engine_warn!(
                "nebula::Context",
                "Context '{}' destroyed with a live {:?} ({})",
                self.config.label, record.kind, record.label
            );
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("share_group", &self.share_group)
            .field("label", &self.config.label)
            .field("backend", &self.renderer.name())
            .finish()
    }
}

// ===== CURRENT GUARD =====

/// Scope of a `make_current()` call
#[must_use = "the context is released as soon as the guard is dropped"]
pub struct CurrentGuard {
    context: Arc<Context>,
    previous: Option<Arc<Context>>,
    switched: bool,
    _not_send: PhantomData<*const ()>,
}

impl CurrentGuard {
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        if !self.switched {
            return;
        }
        match self.previous.take() {
            Some(previous) => {
                if !previous.renderer.make_current() {
                    engine_warn!(
                        "nebula::Context",
                        "Failed to restore context '{}'",
                        previous.label()
                    );
                }
                set_current(Some(previous));
            }
            None => {
                if self.context.is_current() {
                    self.context.renderer.done_current();
                    set_current(None);
                }
            }
        }
    }
}

// ===== RESOURCE OWNER =====

/// Affinity guard embedded in every resource
///
/// Holds the integer identity of the owning context; never a reference to it.
#[derive(Debug)]
pub struct ResourceOwner {
    context: ContextId,
    share_group: ShareGroupId,
    kind: ResourceKind,
    slot: Option<ResourceSlot>,
}

impl ResourceOwner {
    /// Register a new resource under the current context
    ///
    /// Fatal if no context is current.
    pub(crate) fn acquire(kind: ResourceKind, label: String) -> (ResourceOwner, Arc<Context>) {
        let context = current_or_fatal("nebula::Resource", &format!("creating a {:?}", kind));
        let slot = Engine::register_resource(context.id, kind, label);
        let owner = ResourceOwner {
            context: context.id,
            share_group: context.share_group,
            kind,
            slot,
        };
        (owner, context)
    }

    /// Owner for objects that live outside the slot table (the default framebuffer)
    pub(crate) fn unregistered(context: &Context, kind: ResourceKind) -> ResourceOwner {
        ResourceOwner {
            context: context.id,
            share_group: context.share_group,
            kind,
            slot: None,
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn share_group(&self) -> ShareGroupId {
        self.share_group
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn slot(&self) -> Option<ResourceSlot> {
        self.slot
    }

    /// Whether the calling thread's current context may use this resource
    pub fn is_accessible(&self) -> bool {
        current().is_some_and(|c| c.is_compatible(self.context, self.share_group))
    }

    /// Verify affinity and return the current context
    ///
    /// Fatal `NoCurrentContext` or `ContextMismatch` on violation.
    pub fn check(&self) -> Arc<Context> {
        let source = "nebula::Resource";
        let context = current_or_fatal(source, &format!("using a {:?}", self.kind));
        if !context.is_compatible(self.context, self.share_group) {
            engine_fatal!(source, Error::ContextMismatch {
                resource: format!("{:?}", self.kind),
                owner: Engine::context_label(self.context).unwrap_or_else(|| "<destroyed>".to_string()),
                current: context.label().to_string(),
            });
        }
        context
    }

    /// Release the slot. Returns false if no compatible context is current,
    /// in which case the caller must not destroy the GPU object.
    pub(crate) fn release(&self) -> bool {
        let accessible = self.is_accessible();
        if let Some(slot) = self.slot {
            Engine::release_resource(self.context, slot);
        }
        accessible
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
