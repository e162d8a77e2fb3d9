//! Unit tests for semantic.rs

use crate::context::{AttributeSemantic, SemanticRegistry, StorageBlockSemantic, UniformSemantic};

// ============================================================================
// ATTRIBUTE SEMANTIC TESTS
// ============================================================================

#[test]
fn test_attribute_locations_are_ordinals() {
    for (index, semantic) in AttributeSemantic::ALL.iter().enumerate() {
        assert_eq!(semantic.location(), index as u32);
        assert_eq!(AttributeSemantic::from_location(index as u32), Some(*semantic));
    }
}

#[test]
fn test_attribute_from_location_out_of_range() {
    assert_eq!(AttributeSemantic::from_location(AttributeSemantic::COUNT as u32), None);
}

// ============================================================================
// REGISTRY TESTS
// ============================================================================

#[test]
fn test_default_registry_names() {
    let registry = SemanticRegistry::default();
    assert_eq!(registry.attribute("a_position"), Some(AttributeSemantic::Position));
    assert_eq!(registry.attribute("a_texCoord"), Some(AttributeSemantic::TexCoord0));
    assert_eq!(registry.uniform("u_modelViewProjection"), Some(UniformSemantic::ModelViewProjectionMatrix));
    assert_eq!(registry.uniform("u_cameraPosition"), Some(UniformSemantic::CameraPosition));
    assert_eq!(registry.storage_block("LightsBlock"), Some(StorageBlockSemantic::Lights));
}

#[test]
fn test_unknown_names_are_unresolved() {
    let registry = SemanticRegistry::default();
    assert_eq!(registry.attribute("inPosition"), None);
    assert_eq!(registry.uniform("u_color"), None);
    assert_eq!(registry.storage_block("Particles"), None);
}

#[test]
fn test_builder_adds_custom_names() {
    let registry = SemanticRegistry::builder()
        .uniform("u_time", UniformSemantic::Custom(7))
        .attribute("inPosition", AttributeSemantic::Position)
        .storage_block("Particles", StorageBlockSemantic::Custom(1))
        .build();

    assert_eq!(registry.uniform("u_time"), Some(UniformSemantic::Custom(7)));
    assert_eq!(registry.attribute("inPosition"), Some(AttributeSemantic::Position));
    assert_eq!(registry.attribute("a_position"), Some(AttributeSemantic::Position));
    assert_eq!(registry.storage_block("Particles"), Some(StorageBlockSemantic::Custom(1)));
}

#[test]
fn test_builder_overrides_default_name() {
    let registry = SemanticRegistry::builder()
        .uniform("u_model", UniformSemantic::Custom(0))
        .build();
    assert_eq!(registry.uniform("u_model"), Some(UniformSemantic::Custom(0)));
}

#[test]
fn test_empty_builder_has_no_names() {
    let registry = SemanticRegistry::empty_builder().build();
    assert_eq!(registry.attribute("a_position"), None);
    assert_eq!(registry.attribute_names().count(), 0);
}

#[test]
fn test_attribute_names_lists_every_alias() {
    let registry = SemanticRegistry::default();
    let tex_coord0: Vec<&str> = registry
        .attribute_names()
        .filter(|(_, semantic)| *semantic == AttributeSemantic::TexCoord0)
        .map(|(name, _)| name)
        .collect();
    assert_eq!(tex_coord0.len(), 2);
    assert!(tex_coord0.contains(&"a_texCoord"));
    assert!(tex_coord0.contains(&"a_texCoord0"));
}
