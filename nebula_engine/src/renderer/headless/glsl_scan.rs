/// Declaration scanner for GLSL sources
///
/// Extracts the interface a driver would report after linking: default-block
/// uniforms, std430 storage blocks with member offsets, vertex inputs and the
/// compute local size. Function bodies are skipped; every declared uniform
/// is reported as active.

use rustc_hash::FxHashMap;
use crate::renderer::{ActiveBlockMember, ShaderStage, UniformType};

/// A default-block uniform declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedUniform {
    pub name: String,
    pub uniform_type: UniformType,
    pub array_size: u32,
}

/// A `buffer` block declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedBlock {
    pub name: String,
    pub binding: u32,
    pub data_size: u64,
    pub members: Vec<ActiveBlockMember>,
}

/// A vertex stage input declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedInput {
    pub name: String,
    pub input_type: UniformType,
    /// `layout(location = N)` if declared
    pub location: Option<u32>,
}

/// Interface of one shader stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    pub uniforms: Vec<ScannedUniform>,
    pub blocks: Vec<ScannedBlock>,
    pub inputs: Vec<ScannedInput>,
    pub local_size: Option<[u32; 3]>,
}

type ScanResult<T> = std::result::Result<T, String>;

const QUALIFIERS: &[&str] = &[
    "uniform", "in", "out", "buffer", "shared", "const", "flat", "smooth", "noperspective",
    "centroid", "readonly", "writeonly", "coherent", "volatile", "restrict", "highp",
    "mediump", "lowp", "invariant", "precise",
];

const STORAGE: &[&str] = &["uniform", "in", "out", "buffer", "shared", "const"];

/// Scan `source` as a shader of `stage`. `Err` carries a compiler-style log.
pub fn scan(stage: ShaderStage, source: &str) -> ScanResult<ShaderInterface> {
    let body = preprocess(&strip_comments(source))?;
    let tokens = tokenize(&body);
    check_balanced(&tokens)?;

    let statements = split_statements(&tokens);
    let has_main = statements.iter().any(|statement| {
        function_name(statement).is_some_and(|i| i >= 1 && statement[i] == "main" && statement[i - 1] == "void")
    });
    if !has_main {
        return Err("0:0: error: missing entry point 'void main()'".to_string());
    }

    let mut interface = ShaderInterface::default();
    for statement in statements.iter().filter(|s| function_name(s).is_none()) {
        scan_declaration(stage, statement, &mut interface)?;
    }
    if stage == ShaderStage::Compute && interface.local_size.is_none() {
        interface.local_size = Some([1, 1, 1]);
    }
    Ok(interface)
}

// ===== LEXING =====

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'/') {
            for c in chars.by_ref() {
                if c == '\n' {
                    out.push('\n');
                    break;
                }
            }
            continue;
        }
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = '\0';
            for c in chars.by_ref() {
                if c == '\n' {
                    out.push('\n');
                }
                if previous == '*' && c == '/' {
                    break;
                }
                previous = c;
            }
            out.push(' ');
            continue;
        }
        out.push(c);
    }
    out
}

/// Drop preprocessor lines, failing on `#error`
fn preprocess(source: &str) -> ScanResult<String> {
    let mut body = String::with_capacity(source.len());
    for (number, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if let Some(directive) = trimmed.strip_prefix('#') {
            let directive = directive.trim_start();
            if let Some(message) = directive.strip_prefix("error") {
                return Err(format!("0:{}: error: #error{}", number + 1, message));
            }
            body.push('\n');
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }
    Ok(body)
}

fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in source.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

fn check_balanced(tokens: &[String]) -> ScanResult<()> {
    let mut braces = 0i32;
    let mut parens = 0i32;
    for token in tokens {
        match token.as_str() {
            "{" => braces += 1,
            "}" => braces -= 1,
            "(" => parens += 1,
            ")" => parens -= 1,
            _ => {}
        }
        if braces < 0 || parens < 0 {
            return Err(format!("0:0: error: unexpected '{}'", token));
        }
    }
    if braces != 0 {
        return Err("0:0: error: unbalanced braces".to_string());
    }
    if parens != 0 {
        return Err("0:0: error: unbalanced parentheses".to_string());
    }
    Ok(())
}

/// Top-level statements; function definitions end at their closing brace
fn split_statements(tokens: &[String]) -> Vec<Vec<&str>> {
    let mut statements = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth = 0u32;
    for token in tokens {
        let token = token.as_str();
        current.push(token);
        match token {
            "{" => depth += 1,
            "}" => {
                depth = depth.saturating_sub(1);
                if depth == 0 && function_name(&current).is_some() {
                    statements.push(std::mem::take(&mut current));
                }
            }
            ";" if depth == 0 => {
                current.pop();
                if !current.is_empty() {
                    statements.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }
    statements
}

/// Index of the function name token if `statement` is a function definition
fn function_name(statement: &[&str]) -> Option<usize> {
    let brace = statement.iter().position(|t| *t == "{")?;
    let paren = statement[..brace].iter().position(|t| *t == "(")?;
    if paren == 0 || statement[paren - 1] == "layout" {
        return None;
    }
    Some(paren - 1)
}

// ===== DECLARATIONS =====

fn scan_declaration(stage: ShaderStage, statement: &[&str], interface: &mut ShaderInterface) -> ScanResult<()> {
    let mut layout = FxHashMap::default();
    let mut storage = None;
    let mut i = 0;
    while i < statement.len() {
        let token = statement[i];
        if token == "layout" {
            i = parse_layout(statement, i + 1, &mut layout)?;
        } else if QUALIFIERS.contains(&token) {
            if STORAGE.contains(&token) {
                storage = Some(token);
            }
            i += 1;
        } else {
            break;
        }
    }
    let rest = &statement[i..];

    match storage {
        Some("uniform") if !rest.contains(&"{") => {
            let uniform_type = parse_type(rest.first().copied())?;
            for (name, array_size) in parse_declarators(&rest[1..])? {
                interface.uniforms.push(ScannedUniform {
                    name,
                    uniform_type,
                    array_size: array_size.unwrap_or(1).max(1),
                });
            }
        }
        Some("buffer") => {
            let block = parse_block(rest, &layout)?;
            interface.blocks.push(block);
        }
        Some("in") if rest.is_empty() => {
            let axis = |key: &str| layout.get(key).copied().unwrap_or(1);
            if ["local_size_x", "local_size_y", "local_size_z"].iter().any(|k| layout.contains_key(*k)) {
                interface.local_size = Some([axis("local_size_x"), axis("local_size_y"), axis("local_size_z")]);
            }
        }
        Some("in") if stage == ShaderStage::Vertex => {
            let input_type = parse_type(rest.first().copied())?;
            let location = layout.get("location").copied();
            for (name, _) in parse_declarators(&rest[1..])? {
                interface.inputs.push(ScannedInput { name, input_type, location });
            }
        }
        _ => {}
    }
    Ok(())
}

/// Parse `( key = value, key, ... )` starting at `start`; returns the index after `)`
fn parse_layout(statement: &[&str], start: usize, layout: &mut FxHashMap<String, u32>) -> ScanResult<usize> {
    if statement.get(start) != Some(&"(") {
        return Err("0:0: error: expected '(' after layout".to_string());
    }
    let mut i = start + 1;
    while i < statement.len() && statement[i] != ")" {
        let key = statement[i];
        if key == "," {
            i += 1;
            continue;
        }
        if statement.get(i + 1) == Some(&"=") {
            let value = statement.get(i + 2).copied().unwrap_or("");
            let value = value
                .parse::<u32>()
                .map_err(|_| format!("0:0: error: layout qualifier '{}' needs an integer literal", key))?;
            layout.insert(key.to_string(), value);
            i += 3;
        } else {
            layout.insert(key.to_string(), 0);
            i += 1;
        }
    }
    Ok(i + 1)
}

/// `name[N], name2, name3[]` → (name, array size); `Some(0)` is an unsized array
fn parse_declarators(tokens: &[&str]) -> ScanResult<Vec<(String, Option<u32>)>> {
    let mut declarators = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let name = tokens[i];
        if !is_identifier(name) {
            return Err(format!("0:0: error: unexpected '{}' in declaration", name));
        }
        i += 1;
        let mut array_size = None;
        if tokens.get(i) == Some(&"[") {
            if tokens.get(i + 1) == Some(&"]") {
                array_size = Some(0);
                i += 2;
            } else {
                let size = tokens
                    .get(i + 1)
                    .and_then(|t| t.parse::<u32>().ok())
                    .ok_or_else(|| format!("0:0: error: array size of '{}' must be an integer literal", name))?;
                array_size = Some(size);
                i += 3;
            }
        }
        // Skip initializers up to the next declarator
        let mut depth = 0u32;
        while i < tokens.len() && !(depth == 0 && tokens[i] == ",") {
            match tokens[i] {
                "(" => depth += 1,
                ")" => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }
        i += 1;
        declarators.push((name.to_string(), array_size));
    }
    Ok(declarators)
}

fn parse_block(tokens: &[&str], layout: &FxHashMap<String, u32>) -> ScanResult<ScannedBlock> {
    let name = tokens
        .first()
        .filter(|t| is_identifier(t))
        .ok_or_else(|| "0:0: error: buffer block needs a name".to_string())?;
    let open = tokens
        .iter()
        .position(|t| *t == "{")
        .ok_or_else(|| format!("0:0: error: buffer block '{}' has no body", name))?;
    let close = tokens
        .iter()
        .rposition(|t| *t == "}")
        .ok_or_else(|| format!("0:0: error: buffer block '{}' is not closed", name))?;

    let mut members = Vec::new();
    for member in tokens[open + 1..close].split(|t| *t == ";").filter(|m| !m.is_empty()) {
        let start = member.iter().position(|t| !QUALIFIERS.contains(t)).unwrap_or(member.len());
        let member = &member[start..];
        let member_type = parse_type(member.first().copied())?;
        for (member_name, array_size) in parse_declarators(&member[1..])? {
            members.push((member_name, member_type, array_size));
        }
    }

    let (members, data_size) = std430_layout(&members)?;
    Ok(ScannedBlock {
        name: name.to_string(),
        binding: layout.get("binding").copied().unwrap_or(0),
        data_size,
        members,
    })
}

fn is_identifier(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// GLSL type keyword → uniform type
pub fn parse_type(token: Option<&str>) -> ScanResult<UniformType> {
    use UniformType::*;
    let token = token.ok_or_else(|| "0:0: error: missing type".to_string())?;
    let parsed = match token {
        "float" => Float,
        "vec2" => Vec2,
        "vec3" => Vec3,
        "vec4" => Vec4,
        "int" => Int,
        "ivec2" => IVec2,
        "ivec3" => IVec3,
        "ivec4" => IVec4,
        "uint" => UInt,
        "uvec2" => UVec2,
        "uvec3" => UVec3,
        "uvec4" => UVec4,
        "bool" => Bool,
        "mat2" => Mat2,
        "mat3" => Mat3,
        "mat4" => Mat4,
        "sampler1D" => Sampler1D,
        "sampler2D" => Sampler2D,
        "sampler3D" => Sampler3D,
        "samplerCube" => SamplerCube,
        "sampler1DArray" => Sampler1DArray,
        "sampler2DArray" => Sampler2DArray,
        "samplerCubeArray" => SamplerCubeArray,
        "sampler2DRect" => Sampler2DRect,
        "sampler2DShadow" => Sampler2DShadow,
        "samplerCubeShadow" => SamplerCubeShadow,
        "sampler2DArrayShadow" => Sampler2DArrayShadow,
        "isampler2D" => ISampler2D,
        "isampler3D" => ISampler3D,
        "isampler2DArray" => ISampler2DArray,
        "usampler2D" => USampler2D,
        "usampler3D" => USampler3D,
        "usampler2DArray" => USampler2DArray,
        "image1D" => Image1D,
        "image2D" => Image2D,
        "image3D" => Image3D,
        "imageCube" => ImageCube,
        "image2DArray" => Image2DArray,
        "iimage2D" => IImage2D,
        "uimage2D" => UImage2D,
        other => return Err(format!("0:0: error: unknown type '{}'", other)),
    };
    Ok(parsed)
}

// ===== STD430 =====

/// (size, alignment) of a member type under std430 rules
fn std430_base(member_type: UniformType) -> Option<(u64, u64)> {
    use UniformType::*;
    match member_type {
        Float | Int | UInt | Bool => Some((4, 4)),
        Vec2 | IVec2 | UVec2 => Some((8, 8)),
        Vec3 | IVec3 | UVec3 => Some((12, 16)),
        Vec4 | IVec4 | UVec4 => Some((16, 16)),
        Mat2 => Some((16, 8)),
        Mat3 => Some((48, 16)),
        Mat4 => Some((64, 16)),
        _ => None,
    }
}

fn round_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Member offsets and minimum data size of a std430 block
///
/// An unsized trailing array gets an offset but adds nothing to the size.
pub fn std430_layout(members: &[(String, UniformType, Option<u32>)]) -> ScanResult<(Vec<ActiveBlockMember>, u64)> {
    let mut offset = 0u64;
    let mut block_alignment = 4u64;
    let mut laid_out = Vec::with_capacity(members.len());

    for (index, (name, member_type, array_size)) in members.iter().enumerate() {
        let (size, alignment) = std430_base(*member_type)
            .ok_or_else(|| format!("0:0: error: '{}' has an opaque type and cannot live in a buffer block", name))?;
        block_alignment = block_alignment.max(alignment);
        offset = round_up(offset, alignment);

        let (reported, extent) = match array_size {
            Some(0) if index + 1 != members.len() => {
                return Err(format!("0:0: error: unsized array '{}' must be the last block member", name));
            }
            Some(0) => (format!("{}[0]", name), 0),
            Some(count) => (format!("{}[0]", name), round_up(size, alignment) * *count as u64),
            None => (name.clone(), size),
        };
        laid_out.push(ActiveBlockMember { name: reported, offset });
        offset += extent;
    }

    Ok((laid_out, round_up(offset, block_alignment)))
}

#[cfg(test)]
#[path = "glsl_scan_tests.rs"]
mod tests;
