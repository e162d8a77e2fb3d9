/// Semantic identifiers and the name registry used during reflection
///
/// Shader interface names are mapped to semantic ids once, when a program is
/// linked. Names absent from the registry stay unresolved (`None`) and are
/// matched by raw name at draw time instead.

use std::sync::Arc;
use rustc_hash::FxHashMap;

// ===== ATTRIBUTE SEMANTIC =====

/// Meaning of a vertex attribute; each semantic has a fixed input location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeSemantic {
    Position,
    Normal,
    Tangent,
    Color,
    TexCoord0,
    TexCoord1,
    TexCoord2,
    TexCoord3,
    BoneIndices,
    BoneWeights,
    Custom0,
    Custom1,
    Custom2,
    Custom3,
    Custom4,
    Custom5,
}

impl AttributeSemantic {
    pub const COUNT: usize = 16;

    pub const ALL: [AttributeSemantic; Self::COUNT] = [
        AttributeSemantic::Position,
        AttributeSemantic::Normal,
        AttributeSemantic::Tangent,
        AttributeSemantic::Color,
        AttributeSemantic::TexCoord0,
        AttributeSemantic::TexCoord1,
        AttributeSemantic::TexCoord2,
        AttributeSemantic::TexCoord3,
        AttributeSemantic::BoneIndices,
        AttributeSemantic::BoneWeights,
        AttributeSemantic::Custom0,
        AttributeSemantic::Custom1,
        AttributeSemantic::Custom2,
        AttributeSemantic::Custom3,
        AttributeSemantic::Custom4,
        AttributeSemantic::Custom5,
    ];

    /// Vertex input location bound to this semantic before linking
    pub fn location(self) -> u32 {
        self as u32
    }

    pub fn from_location(location: u32) -> Option<AttributeSemantic> {
        Self::ALL.get(location as usize).copied()
    }
}

// ===== UNIFORM SEMANTIC =====

/// Meaning of a uniform
///
/// The matrix and direction semantics are produced by the MVP layer;
/// `Custom` ids are free for applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UniformSemantic {
    ModelMatrix,
    ViewMatrix,
    ProjectionMatrix,
    ModelViewMatrix,
    ViewProjectionMatrix,
    ModelViewProjectionMatrix,
    NormalMatrix,
    InverseNormalMatrix,
    InverseModelMatrix,
    InverseViewMatrix,
    WorldPosition,
    WorldXDirection,
    WorldYDirection,
    WorldZDirection,
    CameraPosition,
    Custom(u32),
}

// ===== STORAGE BLOCK SEMANTIC =====

/// Meaning of a shader storage block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageBlockSemantic {
    Lights,
    Materials,
    Instances,
    Custom(u32),
}

// ===== REGISTRY =====

/// Immutable name → semantic tables of one context
#[derive(Debug, Clone)]
pub struct SemanticRegistry {
    attributes: FxHashMap<String, AttributeSemantic>,
    uniforms: FxHashMap<String, UniformSemantic>,
    storage_blocks: FxHashMap<String, StorageBlockSemantic>,
}

impl SemanticRegistry {
    /// Builder pre-filled with the engine's default names
    pub fn builder() -> SemanticRegistryBuilder {
        let mut builder = Self::empty_builder();
        for (name, semantic) in DEFAULT_ATTRIBUTES {
            builder = builder.attribute(name, *semantic);
        }
        for (name, semantic) in DEFAULT_UNIFORMS {
            builder = builder.uniform(name, *semantic);
        }
        for (name, semantic) in DEFAULT_STORAGE_BLOCKS {
            builder = builder.storage_block(name, *semantic);
        }
        builder
    }

    /// Builder with no names registered
    pub fn empty_builder() -> SemanticRegistryBuilder {
        SemanticRegistryBuilder {
            registry: SemanticRegistry {
                attributes: FxHashMap::default(),
                uniforms: FxHashMap::default(),
                storage_blocks: FxHashMap::default(),
            },
        }
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeSemantic> {
        self.attributes.get(name).copied()
    }

    pub fn uniform(&self, name: &str) -> Option<UniformSemantic> {
        self.uniforms.get(name).copied()
    }

    pub fn storage_block(&self, name: &str) -> Option<StorageBlockSemantic> {
        self.storage_blocks.get(name).copied()
    }

    /// Every registered attribute name with its semantic
    pub fn attribute_names(&self) -> impl Iterator<Item = (&str, AttributeSemantic)> {
        self.attributes.iter().map(|(name, semantic)| (name.as_str(), *semantic))
    }
}

impl Default for SemanticRegistry {
    fn default() -> Self {
        Self::builder().registry
    }
}

/// Setup-phase builder; the built registry can no longer change
pub struct SemanticRegistryBuilder {
    registry: SemanticRegistry,
}

impl SemanticRegistryBuilder {
    pub fn attribute(mut self, name: &str, semantic: AttributeSemantic) -> Self {
        self.registry.attributes.insert(name.to_string(), semantic);
        self
    }

    pub fn uniform(mut self, name: &str, semantic: UniformSemantic) -> Self {
        self.registry.uniforms.insert(name.to_string(), semantic);
        self
    }

    pub fn storage_block(mut self, name: &str, semantic: StorageBlockSemantic) -> Self {
        self.registry.storage_blocks.insert(name.to_string(), semantic);
        self
    }

    pub fn build(self) -> Arc<SemanticRegistry> {
        Arc::new(self.registry)
    }
}

// ===== DEFAULT NAMES =====

const DEFAULT_ATTRIBUTES: &[(&str, AttributeSemantic)] = &[
    ("a_position", AttributeSemantic::Position),
    ("a_normal", AttributeSemantic::Normal),
    ("a_tangent", AttributeSemantic::Tangent),
    ("a_color", AttributeSemantic::Color),
    ("a_texCoord", AttributeSemantic::TexCoord0),
    ("a_texCoord0", AttributeSemantic::TexCoord0),
    ("a_texCoord1", AttributeSemantic::TexCoord1),
    ("a_texCoord2", AttributeSemantic::TexCoord2),
    ("a_texCoord3", AttributeSemantic::TexCoord3),
    ("a_boneIndices", AttributeSemantic::BoneIndices),
    ("a_boneWeights", AttributeSemantic::BoneWeights),
];

const DEFAULT_UNIFORMS: &[(&str, UniformSemantic)] = &[
    ("u_model", UniformSemantic::ModelMatrix),
    ("u_view", UniformSemantic::ViewMatrix),
    ("u_projection", UniformSemantic::ProjectionMatrix),
    ("u_modelView", UniformSemantic::ModelViewMatrix),
    ("u_viewProjection", UniformSemantic::ViewProjectionMatrix),
    ("u_modelViewProjection", UniformSemantic::ModelViewProjectionMatrix),
    ("u_normalMatrix", UniformSemantic::NormalMatrix),
    ("u_inverseNormalMatrix", UniformSemantic::InverseNormalMatrix),
    ("u_inverseModel", UniformSemantic::InverseModelMatrix),
    ("u_inverseView", UniformSemantic::InverseViewMatrix),
    ("u_worldPosition", UniformSemantic::WorldPosition),
    ("u_worldXDirection", UniformSemantic::WorldXDirection),
    ("u_worldYDirection", UniformSemantic::WorldYDirection),
    ("u_worldZDirection", UniformSemantic::WorldZDirection),
    ("u_cameraPosition", UniformSemantic::CameraPosition),
];

const DEFAULT_STORAGE_BLOCKS: &[(&str, StorageBlockSemantic)] = &[
    ("LightsBlock", StorageBlockSemantic::Lights),
    ("MaterialsBlock", StorageBlockSemantic::Materials),
    ("InstancesBlock", StorageBlockSemantic::Instances),
];

#[cfg(test)]
#[path = "semantic_tests.rs"]
mod tests;
