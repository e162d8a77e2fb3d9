/// Headless shaders and programs
///
/// Linking merges the scanned interfaces of every stage and assigns
/// locations, indices and attribute slots the way a driver would.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use crate::error::{Error, Result};
use crate::renderer::headless::glsl_scan::{self, ShaderInterface};
use crate::renderer::headless::HeadlessState;
use crate::renderer::{
    ActiveAttribute, ActiveStorageBlock, ActiveUniform, Program, Shader, ShaderStage,
};
use crate::engine_bail;

// ============================================================================
// SHADER
// ============================================================================

pub struct HeadlessShader {
    state: Arc<HeadlessState>,
    name: u32,
    stage: ShaderStage,
    interface: ShaderInterface,
}

impl HeadlessShader {
    /// Compile `source`; `Err` carries the compiler log
    pub(crate) fn compile(state: Arc<HeadlessState>, stage: ShaderStage, source: &str) -> std::result::Result<Self, String> {
        let interface = glsl_scan::scan(stage, source)?;
        let name = state.allocate_name();
        Ok(Self { state, name, stage, interface })
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }
}

impl Shader for HeadlessShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessShader {
    fn drop(&mut self) {
        self.state.release_name(self.name);
    }
}

// ============================================================================
// PROGRAM
// ============================================================================

#[derive(Debug, Default)]
struct LinkedInterface {
    uniforms: Vec<ActiveUniform>,
    storage_blocks: Vec<ActiveStorageBlock>,
    attributes: Vec<ActiveAttribute>,
    local_size: Option<[u32; 3]>,
}

pub struct HeadlessProgram {
    state: Arc<HeadlessState>,
    name: u32,
    shaders: Vec<Arc<dyn Shader>>,
    bound_locations: BTreeMap<String, u32>,
    linked: Option<LinkedInterface>,
}

impl HeadlessProgram {
    pub(crate) fn new(state: Arc<HeadlessState>) -> Self {
        let name = state.allocate_name();
        Self {
            state,
            name,
            shaders: Vec::new(),
            bound_locations: BTreeMap::new(),
            linked: None,
        }
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    pub fn is_linked(&self) -> bool {
        self.linked.is_some()
    }

    fn stage_interfaces(&self) -> Vec<(ShaderStage, &ShaderInterface)> {
        self.shaders
            .iter()
            .filter_map(|shader| shader.as_any().downcast_ref::<HeadlessShader>())
            .map(|shader| (shader.stage, &shader.interface))
            .collect()
    }

    fn check_stages(stages: &[ShaderStage]) -> std::result::Result<(), String> {
        if stages.is_empty() {
            return Err("error: no shader stages attached".to_string());
        }
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].contains(stage) {
                return Err(format!("error: more than one {:?} shader attached", stage));
            }
        }
        if stages.contains(&ShaderStage::Compute) {
            if stages.len() > 1 {
                return Err("error: a compute shader cannot be linked with other stages".to_string());
            }
            return Ok(());
        }
        if !stages.contains(&ShaderStage::Vertex) {
            return Err("error: render program without a vertex shader".to_string());
        }
        if !stages.contains(&ShaderStage::Fragment) {
            return Err("error: render program without a fragment shader".to_string());
        }
        Ok(())
    }

    fn build_interface(&self) -> std::result::Result<LinkedInterface, String> {
        let stages = self.stage_interfaces();
        Self::check_stages(&stages.iter().map(|(stage, _)| *stage).collect::<Vec<_>>())?;

        let mut linked = LinkedInterface::default();

        // Uniforms are shared across stages by name
        let mut next_location = 0i32;
        for (_, interface) in &stages {
            for uniform in &interface.uniforms {
                let reported = if uniform.array_size > 1 {
                    format!("{}[0]", uniform.name)
                } else {
                    uniform.name.clone()
                };
                if let Some(existing) = linked.uniforms.iter().find(|u| u.name == reported) {
                    if existing.uniform_type != uniform.uniform_type || existing.array_size != uniform.array_size {
                        return Err(format!("error: uniform '{}' declared with different types", uniform.name));
                    }
                    continue;
                }
                linked.uniforms.push(ActiveUniform {
                    name: reported,
                    index: linked.uniforms.len() as u32,
                    location: next_location,
                    uniform_type: uniform.uniform_type,
                    array_size: uniform.array_size,
                });
                next_location += uniform.array_size.max(1) as i32;
            }

            for block in &interface.blocks {
                if let Some(existing) = linked.storage_blocks.iter().find(|b| b.name == block.name) {
                    if existing.members != block.members {
                        return Err(format!("error: buffer block '{}' declared with different members", block.name));
                    }
                    continue;
                }
                linked.storage_blocks.push(ActiveStorageBlock {
                    name: block.name.clone(),
                    index: linked.storage_blocks.len() as u32,
                    binding: block.binding,
                    data_size: block.data_size,
                    members: block.members.clone(),
                });
            }
        }

        if let Some((_, vertex)) = stages.iter().find(|(stage, _)| *stage == ShaderStage::Vertex) {
            linked.attributes = self.assign_attribute_locations(vertex)?;
        }
        linked.local_size = stages
            .iter()
            .find(|(stage, _)| *stage == ShaderStage::Compute)
            .and_then(|(_, interface)| interface.local_size);

        Ok(linked)
    }

    /// Explicit layout locations win over bound ones; the rest take the lowest free slot
    fn assign_attribute_locations(&self, vertex: &ShaderInterface) -> std::result::Result<Vec<ActiveAttribute>, String> {
        let mut assigned: Vec<Option<u32>> = vertex
            .inputs
            .iter()
            .map(|input| input.location.or_else(|| self.bound_locations.get(&input.name).copied()))
            .collect();

        for (i, location) in assigned.iter().enumerate() {
            if let Some(location) = location {
                if assigned[..i].contains(&Some(*location)) {
                    return Err(format!(
                        "error: vertex input '{}' aliases location {}",
                        vertex.inputs[i].name, location
                    ));
                }
            }
        }

        for i in 0..assigned.len() {
            if assigned[i].is_none() {
                let free = (0u32..).find(|location| !assigned.contains(&Some(*location))).unwrap_or(0);
                assigned[i] = Some(free);
            }
        }

        Ok(vertex
            .inputs
            .iter()
            .zip(assigned)
            .enumerate()
            .map(|(index, (input, location))| ActiveAttribute {
                name: input.name.clone(),
                index: index as u32,
                location: location.map_or(-1, |l| l as i32),
                attribute_type: input.input_type,
            })
            .collect())
    }

    fn linked(&self) -> Option<&LinkedInterface> {
        self.linked.as_ref()
    }
}

impl Program for HeadlessProgram {
    fn attach(&mut self, shader: Arc<dyn Shader>) -> Result<()> {
        if shader.as_any().downcast_ref::<HeadlessShader>().is_none() {
            engine_bail!("nebula::HeadlessProgram", "Shader was not created by a headless renderer");
        }
        self.shaders.push(shader);
        Ok(())
    }

    fn bind_attribute_location(&mut self, name: &str, location: u32) -> Result<()> {
        self.bound_locations.insert(name.to_string(), location);
        Ok(())
    }

    fn link(&mut self) -> Result<()> {
        match self.build_interface() {
            Ok(linked) => {
                self.linked = Some(linked);
                Ok(())
            }
            Err(log) => {
                self.linked = None;
                Err(Error::ProgramLink { log })
            }
        }
    }

    fn active_uniforms(&self) -> Vec<ActiveUniform> {
        self.linked().map(|l| l.uniforms.clone()).unwrap_or_default()
    }

    fn active_storage_blocks(&self) -> Vec<ActiveStorageBlock> {
        self.linked().map(|l| l.storage_blocks.clone()).unwrap_or_default()
    }

    fn active_attributes(&self) -> Vec<ActiveAttribute> {
        self.linked().map(|l| l.attributes.clone()).unwrap_or_default()
    }

    fn local_workgroup_size(&self) -> Option<[u32; 3]> {
        self.linked().and_then(|l| l.local_size)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessProgram {
    fn drop(&mut self) {
        self.state.release_name(self.name);
    }
}

