use bytemuck::{Pod, Zeroable};

pub const SOLVER_SOURCE: &str = include_str!("shaders/solver.wgsl");
pub const COMPOSITE_SOURCE: &str = include_str!("shaders/composite.wgsl");
pub const PRESENT_SOURCE: &str = include_str!("shaders/present.wgsl");

/// Tone-mapping rate. A pixel with `1 / exposure` hits reaches about 63% brightness.
pub const DEFAULT_EXPOSURE: f32 = 0.25;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PresentUniforms {
    pub surface_size: [f32; 2],
    pub side: u32,
    pub exposure: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(name: &str, source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{} failed to parse:\n{}", name, e.emit_to_string(source)));
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        if let Err(e) = validator.validate(&module) {
            panic!("{} failed validation:\n{}", name, e.emit_to_string(source));
        }
    }

    #[test]
    fn test_solver_shader_valid() {
        validate("solver.wgsl", SOLVER_SOURCE);
    }

    #[test]
    fn test_composite_shader_valid() {
        validate("composite.wgsl", COMPOSITE_SOURCE);
    }

    #[test]
    fn test_present_shader_valid() {
        validate("present.wgsl", PRESENT_SOURCE);
    }

    #[test]
    fn test_present_uniforms_size() {
        assert_eq!(std::mem::size_of::<PresentUniforms>(), 16);
    }

    #[test]
    fn test_solver_covers_every_variant() {
        for name in ["Lorenz", "Chen-Lee", "Halvorsen", "Lu Chen", "Hadley", "Rossler", "Lorenz Mod 2"] {
            assert!(SOLVER_SOURCE.contains(name), "solver kernel lacks {}", name);
        }
    }
}
