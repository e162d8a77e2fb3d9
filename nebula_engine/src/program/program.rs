/// Render and compute programs
///
/// A program is either fully built (compiled, linked and reflected) or not
/// created at all. Compile and link failures come back as `Err` carrying
/// the backend log; the transient shader objects are dropped with them.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use crate::context::{
    current_or_fatal, AttributeSemantic, Context, ResourceKind, ResourceOwner, SemanticRegistry,
    StorageBlockSemantic, UniformSemantic,
};
use crate::error::{Error, Result};
use crate::program::{reflect, AttributeInfo, Reflection, StorageBlockInfo, UniformInfo};
use crate::renderer::{Program as BackendProgram, ShaderStage};
use crate::{engine_debug, engine_error, engine_fail};

/// What a program is linked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Render,
    Compute,
}

// ===== BUILD HOOKS =====

/// Customization points around linking
pub trait BuildHooks {
    /// Called after every stage is attached, before linking
    fn pre_build(&self, _program: &mut dyn BackendProgram, _semantics: &SemanticRegistry) -> Result<()> {
        Ok(())
    }

    /// Called after a successful link; produces the reflected interface
    fn post_build(&self, program: &dyn BackendProgram, semantics: &SemanticRegistry) -> Result<Reflection> {
        Ok(reflect(program, semantics))
    }
}

/// Render programs pin every registered attribute name to its semantic's location
pub struct RenderHooks;

impl BuildHooks for RenderHooks {
    fn pre_build(&self, program: &mut dyn BackendProgram, semantics: &SemanticRegistry) -> Result<()> {
        for (name, semantic) in semantics.attribute_names() {
            program.bind_attribute_location(name, semantic.location())?;
        }
        Ok(())
    }
}

/// Compute programs use the default hooks
pub struct ComputeHooks;

impl BuildHooks for ComputeHooks {}

// ===== PROGRAM =====

/// Linked program bound to the context it was created in
pub struct Program {
    owner: ResourceOwner,
    kind: ProgramKind,
    backend: Arc<dyn BackendProgram>,
    reflection: Reflection,
    optional_uniforms: RwLock<BTreeSet<String>>,
}

impl Program {
    /// Build a render program from `(stage, source)` pairs
    ///
    /// A vertex and a fragment stage are required; geometry and tessellation
    /// stages are optional.
    pub fn new_render(sources: &[(ShaderStage, &str)]) -> Result<Arc<Program>> {
        Self::with_hooks(ProgramKind::Render, sources, &RenderHooks)
    }

    /// Build a compute program from a single compute stage
    pub fn new_compute(source: &str) -> Result<Arc<Program>> {
        Self::with_hooks(ProgramKind::Compute, &[(ShaderStage::Compute, source)], &ComputeHooks)
    }

    /// Build a program with custom hooks
    ///
    /// Fatal if no context is current.
    pub fn with_hooks(kind: ProgramKind, sources: &[(ShaderStage, &str)], hooks: &dyn BuildHooks) -> Result<Arc<Program>> {
        let context = current_or_fatal("nebula::Program", "building a program");
        check_stages(kind, sources)?;

        let (backend, reflection) = compile_and_link(&context, sources, hooks)?;
        let (owner, _) = ResourceOwner::acquire(
            ResourceKind::Program,
            format!("{:?} program ({} stages)", kind, sources.len()),
        );
        engine_debug!(
            "nebula::Program",
            "Linked {:?} program: {} uniforms, {} storage blocks, {} attributes",
            kind, reflection.uniforms.len(), reflection.storage_blocks.len(), reflection.attributes.len()
        );
        for input in reflection.attributes.iter().filter(|a| a.semantic.is_none()) {
            engine_debug!(
                "nebula::Program",
                "Vertex input '{}' (location {}) maps to no semantic",
                input.name, input.location
            );
        }

        Ok(Arc::new(Program {
            owner,
            kind,
            backend,
            reflection,
            optional_uniforms: RwLock::new(BTreeSet::new()),
        }))
    }

    /// Mark uniforms that may stay unresolved at draw time
    pub fn with_optional_uniforms(self: Arc<Self>, names: &[&str]) -> Arc<Self> {
        self.owner.check();
        {
            let mut optional = self.optional_uniforms.write().unwrap_or_else(PoisonError::into_inner);
            optional.extend(names.iter().map(|name| name.to_string()));
        }
        self
    }

    pub fn set_uniform_optional(&self, name: &str, optional: bool) {
        self.owner.check();
        let mut set = self.optional_uniforms.write().unwrap_or_else(PoisonError::into_inner);
        if optional {
            set.insert(name.to_string());
        } else {
            set.remove(name);
        }
    }

    pub fn is_uniform_optional(&self, name: &str) -> bool {
        self.owner.check();
        self.optional_uniforms.read().unwrap_or_else(PoisonError::into_inner).contains(name)
    }

    // ===== ACCESSORS =====

    pub fn owner(&self) -> &ResourceOwner {
        &self.owner
    }

    pub fn kind(&self) -> ProgramKind {
        self.owner.check();
        self.kind
    }

    pub fn backend(&self) -> &Arc<dyn BackendProgram> {
        self.owner.check();
        &self.backend
    }

    pub fn reflection(&self) -> &Reflection {
        self.owner.check();
        &self.reflection
    }

    pub fn uniforms(&self) -> &[UniformInfo] {
        self.owner.check();
        &self.reflection.uniforms
    }

    pub fn storage_blocks(&self) -> &[StorageBlockInfo] {
        self.owner.check();
        &self.reflection.storage_blocks
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        self.owner.check();
        &self.reflection.attributes
    }

    /// Local workgroup size (compute programs only)
    pub fn local_size(&self) -> Option<[u32; 3]> {
        self.owner.check();
        self.reflection.local_size
    }

    // ===== LOOKUPS =====

    pub fn uniform(&self, name: &str) -> Option<&UniformInfo> {
        self.owner.check();
        self.reflection.uniforms.iter().find(|u| u.name == name)
    }

    pub fn uniform_by_semantic(&self, semantic: UniformSemantic) -> Option<&UniformInfo> {
        self.owner.check();
        self.reflection.uniforms.iter().find(|u| u.semantic == Some(semantic))
    }

    pub fn storage_block(&self, name: &str) -> Option<&StorageBlockInfo> {
        self.owner.check();
        self.reflection.storage_blocks.iter().find(|b| b.name == name)
    }

    pub fn storage_block_by_semantic(&self, semantic: StorageBlockSemantic) -> Option<&StorageBlockInfo> {
        self.owner.check();
        self.reflection.storage_blocks.iter().find(|b| b.semantic == Some(semantic))
    }

    pub fn attribute(&self, semantic: AttributeSemantic) -> Option<&AttributeInfo> {
        self.owner.check();
        self.reflection.attributes.iter().find(|a| a.semantic == Some(semantic))
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&AttributeInfo> {
        self.owner.check();
        self.reflection.attributes.iter().find(|a| a.name == name)
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if !self.owner.release() {
            engine_error!(
                "nebula::Program",
                "Program dropped without a compatible current context; GPU program is leaked"
            );
            std::mem::forget(Arc::clone(&self.backend));
        }
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("uniforms", &self.reflection.uniforms.len())
            .field("storage_blocks", &self.reflection.storage_blocks.len())
            .field("attributes", &self.reflection.attributes.len())
            .finish()
    }
}

// ===== BUILD =====

fn check_stages(kind: ProgramKind, sources: &[(ShaderStage, &str)]) -> Result<()> {
    let has = |stage: ShaderStage| sources.iter().any(|(s, _)| *s == stage);
    let problem = match kind {
        ProgramKind::Compute if sources.len() != 1 || !has(ShaderStage::Compute) => {
            Some("a compute program takes exactly one compute stage")
        }
        ProgramKind::Render if has(ShaderStage::Compute) => Some("a render program cannot contain a compute stage"),
        ProgramKind::Render if !has(ShaderStage::Vertex) => Some("a render program needs a vertex stage"),
        ProgramKind::Render if !has(ShaderStage::Fragment) => Some("a render program needs a fragment stage"),
        _ => None,
    };
    if let Some(problem) = problem {
        engine_fail!("nebula::Program", Error::ProgramLink { log: problem.to_string() });
    }
    Ok(())
}

/// Source listing with line numbers, as printed next to compile diagnostics
fn numbered(source: &str) -> String {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{:4}: {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compile every stage, attach, run the hooks around the link
pub(crate) fn compile_and_link(
    context: &Context,
    sources: &[(ShaderStage, &str)],
    hooks: &dyn BuildHooks,
) -> Result<(Arc<dyn BackendProgram>, Reflection)> {
    let renderer = context.renderer();

    let mut shaders = Vec::with_capacity(sources.len());
    for (stage, source) in sources {
        match renderer.compile_shader(*stage, source) {
            Ok(shader) => shaders.push(shader),
            Err(error) => {
                engine_error!(
                    "nebula::Program",
                    "{:?} stage failed to compile\n{}\n{}",
                    stage, error, numbered(source)
                );
                return Err(error);
            }
        }
    }

    let mut program = renderer.create_program()?;
    for shader in shaders {
        program.attach(shader)?;
    }

    hooks.pre_build(&mut *program, context.semantics())?;
    if let Err(error) = program.link() {
        engine_error!("nebula::Program", "{}", error);
        return Err(error);
    }
    let reflection = hooks.post_build(&*program, context.semantics())?;

    Ok((Arc::from(program), reflection))
}

#[cfg(test)]
#[path = "program_tests.rs"]
mod tests;
