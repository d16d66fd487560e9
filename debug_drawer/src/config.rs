//! Drawer settings, loadable from TOML.

use serde::Deserialize;

/// Capacities and tessellation settings of the frame accumulator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawerConfig {
    /// Maximum vertices staged in the mesh batch per frame.
    pub mesh_vertex_capacity: usize,
    /// Maximum triangles staged in the mesh batch per frame.
    pub mesh_primitive_capacity: usize,
    /// Maximum mesh instances per frame.
    pub mesh_instance_capacity: usize,
    /// Maximum box instances per frame.
    pub box_instance_capacity: usize,
    /// Largest allowed chord deviation for world-space circles, in world units.
    pub circle_tolerance: f32,
    /// Radius of the screen-space point marker, in pixels.
    pub point_radius: f32,
    /// Chord deviation of the point marker, in pixels.
    pub point_tolerance: f32,
    /// Surfaces steeper than this angle from horizontal are shaded as walls.
    pub lighting_threshold_degrees: f32,
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            mesh_vertex_capacity: 1 << 20,
            mesh_primitive_capacity: 1 << 20,
            mesh_instance_capacity: 128 * 1024,
            box_instance_capacity: 256 * 1024,
            circle_tolerance: 0.1,
            point_radius: 5.0,
            point_tolerance: 1.0,
            lighting_threshold_degrees: 45.0,
        }
    }
}

impl DrawerConfig {
    /// Parse from TOML; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Cosine of the lighting threshold, as uploaded to the mesh shader.
    pub fn lighting_threshold_cos(&self) -> f32 {
        self.lighting_threshold_degrees.to_radians().cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = DrawerConfig::from_toml_str("circle_tolerance = 0.02\nbox_instance_capacity = 8\n")
            .expect("valid toml");
        assert_eq!(config.circle_tolerance, 0.02);
        assert_eq!(config.box_instance_capacity, 8);
        assert_eq!(config.point_radius, DrawerConfig::default().point_radius);
    }

    #[test]
    fn lighting_threshold() {
        let config = DrawerConfig::default();
        assert!((config.lighting_threshold_cos() - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(DrawerConfig::from_toml_str("point_radius = \"big\"").is_err());
    }
}
