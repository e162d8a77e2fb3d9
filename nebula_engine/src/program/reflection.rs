/// Post-link reflection: backend interface queries resolved to semantic ids

use crate::context::{AttributeSemantic, SemanticRegistry, StorageBlockSemantic, UniformSemantic};
use crate::renderer::{ActiveBlockMember, ComponentType, Program as BackendProgram, UniformType};

/// A reflected default-block uniform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    /// Declared name; arrays are reported without their `[0]` suffix
    pub name: String,
    pub semantic: Option<UniformSemantic>,
    pub index: u32,
    pub location: i32,
    pub uniform_type: UniformType,
    pub array_size: u32,
}

impl UniformInfo {
    /// Samplers and images are bound to units rather than written as values
    pub fn is_opaque(&self) -> bool {
        self.uniform_type.is_sampler() || self.uniform_type.is_image()
    }
}

/// A reflected shader storage block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBlockInfo {
    pub name: String,
    pub semantic: Option<StorageBlockSemantic>,
    pub index: u32,
    /// Binding point declared in the shader
    pub binding: u32,
    pub data_size: u64,
    pub members: Vec<ActiveBlockMember>,
}

impl StorageBlockInfo {
    /// Byte offset of a member variable
    pub fn member_offset(&self, name: &str) -> Option<u64> {
        self.members.iter().find(|m| m.name == name).map(|m| m.offset)
    }
}

/// A reflected vertex input
///
/// Inputs whose name is not registered keep `semantic: None` and are matched
/// to vertex array declarations by location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub semantic: Option<AttributeSemantic>,
    pub index: u32,
    pub location: u32,
    pub components: u8,
    pub component_type: ComponentType,
}

impl AttributeInfo {
    /// Integer inputs accept any integer vertex data of the right width
    pub fn is_integer(&self) -> bool {
        self.component_type.is_integer()
    }
}

/// Everything a linked program exposes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reflection {
    pub uniforms: Vec<UniformInfo>,
    pub storage_blocks: Vec<StorageBlockInfo>,
    pub attributes: Vec<AttributeInfo>,
    pub local_size: Option<[u32; 3]>,
}

fn is_builtin(name: &str) -> bool {
    name.starts_with("gl_")
}

/// Query the interface of a linked program and resolve names through `registry`
///
/// Built-in variables and inputs without a location are skipped. Names
/// absent from the registry resolve to no semantic and are looked up later by
/// raw name.
pub fn reflect(program: &dyn BackendProgram, registry: &SemanticRegistry) -> Reflection {
    let mut reflection = Reflection {
        local_size: program.local_workgroup_size(),
        ..Reflection::default()
    };

    for uniform in program.active_uniforms() {
        if is_builtin(&uniform.name) || uniform.location < 0 {
            continue;
        }
        let name = uniform.name.strip_suffix("[0]").unwrap_or(&uniform.name).to_string();
        reflection.uniforms.push(UniformInfo {
            semantic: registry.uniform(&name),
            name,
            index: uniform.index,
            location: uniform.location,
            uniform_type: uniform.uniform_type,
            array_size: uniform.array_size,
        });
    }

    for block in program.active_storage_blocks() {
        reflection.storage_blocks.push(StorageBlockInfo {
            semantic: registry.storage_block(&block.name),
            name: block.name,
            index: block.index,
            binding: block.binding,
            data_size: block.data_size,
            members: block.members,
        });
    }

    for attribute in program.active_attributes() {
        if is_builtin(&attribute.name) || attribute.location < 0 {
            continue;
        }
        reflection.attributes.push(AttributeInfo {
            semantic: registry.attribute(&attribute.name),
            name: attribute.name,
            index: attribute.index,
            location: attribute.location as u32,
            components: attribute.attribute_type.components(),
            component_type: attribute.attribute_type.component_type(),
        });
    }

    reflection
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
