/// State layers and uniform resolution
///
/// A draw resolves every reflected uniform against an ordered list of
/// layers. Semantic ids are tried first across all layers, then raw names;
/// within each search the last layer wins.

use rustc_hash::FxHashMap;
use crate::context::{StorageBlockSemantic, UniformSemantic};
use crate::program::{StorageBlockInfo, UniformInfo};
use crate::state::{StorageBinding, UniformValue};

// ===== LAYER TRAIT =====

/// One source of uniform and storage block values
pub trait StateLayer {
    fn uniform_by_semantic(&self, semantic: UniformSemantic) -> Option<UniformValue>;

    fn uniform_by_name(&self, name: &str) -> Option<UniformValue>;

    fn storage_by_semantic(&self, _semantic: StorageBlockSemantic) -> Option<StorageBinding> {
        None
    }

    fn storage_by_name(&self, _name: &str) -> Option<StorageBinding> {
        None
    }
}

// ===== STATE SET =====

/// User-filled layer: values keyed by semantic id and by name
#[derive(Debug, Clone, Default)]
pub struct StateSet {
    semantic_uniforms: FxHashMap<UniformSemantic, UniformValue>,
    named_uniforms: FxHashMap<String, UniformValue>,
    semantic_storage: FxHashMap<StorageBlockSemantic, StorageBinding>,
    named_storage: FxHashMap<String, StorageBinding>,
}

impl StateSet {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== UNIFORMS =====

    /// Set a uniform addressed by its declared name
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> &mut Self {
        self.named_uniforms.insert(name.to_string(), value.into());
        self
    }

    /// Set a uniform addressed by semantic id
    pub fn set_semantic_uniform(&mut self, semantic: UniformSemantic, value: impl Into<UniformValue>) -> &mut Self {
        self.semantic_uniforms.insert(semantic, value.into());
        self
    }

    pub fn remove_uniform(&mut self, name: &str) -> Option<UniformValue> {
        self.named_uniforms.remove(name)
    }

    pub fn remove_semantic_uniform(&mut self, semantic: UniformSemantic) -> Option<UniformValue> {
        self.semantic_uniforms.remove(&semantic)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.named_uniforms.get(name)
    }

    pub fn semantic_uniform(&self, semantic: UniformSemantic) -> Option<&UniformValue> {
        self.semantic_uniforms.get(&semantic)
    }

    // ===== STORAGE BLOCKS =====

    pub fn set_storage_block(&mut self, name: &str, binding: impl Into<StorageBinding>) -> &mut Self {
        self.named_storage.insert(name.to_string(), binding.into());
        self
    }

    pub fn set_semantic_storage_block(&mut self, semantic: StorageBlockSemantic, binding: impl Into<StorageBinding>) -> &mut Self {
        self.semantic_storage.insert(semantic, binding.into());
        self
    }

    pub fn remove_storage_block(&mut self, name: &str) -> Option<StorageBinding> {
        self.named_storage.remove(name)
    }

    pub fn remove_semantic_storage_block(&mut self, semantic: StorageBlockSemantic) -> Option<StorageBinding> {
        self.semantic_storage.remove(&semantic)
    }

    pub fn is_empty(&self) -> bool {
        self.semantic_uniforms.is_empty()
            && self.named_uniforms.is_empty()
            && self.semantic_storage.is_empty()
            && self.named_storage.is_empty()
    }

    pub fn clear(&mut self) {
        self.semantic_uniforms.clear();
        self.named_uniforms.clear();
        self.semantic_storage.clear();
        self.named_storage.clear();
    }
}

impl StateLayer for StateSet {
    fn uniform_by_semantic(&self, semantic: UniformSemantic) -> Option<UniformValue> {
        self.semantic_uniforms.get(&semantic).cloned()
    }

    fn uniform_by_name(&self, name: &str) -> Option<UniformValue> {
        self.named_uniforms.get(name).cloned()
    }

    fn storage_by_semantic(&self, semantic: StorageBlockSemantic) -> Option<StorageBinding> {
        self.semantic_storage.get(&semantic).cloned()
    }

    fn storage_by_name(&self, name: &str) -> Option<StorageBinding> {
        self.named_storage.get(name).cloned()
    }
}

// ===== RESOLUTION =====

/// Resolve a reflected uniform. `layers` are ordered lowest precedence first.
pub fn resolve_uniform(layers: &[&dyn StateLayer], uniform: &UniformInfo) -> Option<UniformValue> {
    uniform
        .semantic
        .and_then(|semantic| layers.iter().rev().find_map(|layer| layer.uniform_by_semantic(semantic)))
        .or_else(|| layers.iter().rev().find_map(|layer| layer.uniform_by_name(&uniform.name)))
}

/// Resolve a reflected storage block. `layers` are ordered lowest precedence first.
pub fn resolve_storage_block(layers: &[&dyn StateLayer], block: &StorageBlockInfo) -> Option<StorageBinding> {
    block
        .semantic
        .and_then(|semantic| layers.iter().rev().find_map(|layer| layer.storage_by_semantic(semantic)))
        .or_else(|| layers.iter().rev().find_map(|layer| layer.storage_by_name(&block.name)))
}

#[cfg(test)]
#[path = "state_set_tests.rs"]
mod tests;
