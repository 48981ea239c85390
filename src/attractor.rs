//! The fixed catalog of chaotic vector fields.
//!
//! Every variant advances a point with one explicit Euler step,
//! `P' = P + dt * f(P)`, using the canonical literature parameters for
//! that system. The same formulas are compiled into the solver kernel
//! (`gpu/shaders/solver.wgsl`), keyed by [`AttractorVariant::device_index`].

use std::fmt;

use glam::Vec3;

/// One of the seven supported strange attractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttractorVariant {
    /// Lorenz (1963), sigma = 10, rho = 28, beta = 8/3.
    #[default]
    Lorenz,
    /// Chen-Lee, alpha = 5, beta = -10, delta = -0.38.
    ChenLee,
    /// Halvorsen, a = 1.4.
    Halvorsen,
    /// Lü-Chen, a = 36, b = 3, c = 20.
    LuChen,
    /// Hadley circulation, a = 0.2, b = 4, f = 8, g = 1.
    Hadley,
    /// Rössler, a = 0.2, b = 0.2, c = 5.7.
    Rossler,
    /// Modified Lorenz (Lorenz Mod 2), a = 0.9, b = 5, c = 9.9, d = 1.
    LorenzMod2,
}

impl AttractorVariant {
    /// Number of variants in the catalog.
    pub const COUNT: usize = 7;

    /// All variants in catalog order.
    pub const ALL: [AttractorVariant; Self::COUNT] = [
        AttractorVariant::Lorenz,
        AttractorVariant::ChenLee,
        AttractorVariant::Halvorsen,
        AttractorVariant::LuChen,
        AttractorVariant::Hadley,
        AttractorVariant::Rossler,
        AttractorVariant::LorenzMod2,
    ];

    /// Variant at catalog position `index`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Catalog position of this variant.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Value the solver kernel switches on.
    pub fn device_index(self) -> u32 {
        self as u32
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            AttractorVariant::Lorenz => "Lorenz",
            AttractorVariant::ChenLee => "Chen Lee",
            AttractorVariant::Halvorsen => "Halvorsen",
            AttractorVariant::LuChen => "Lü Chen",
            AttractorVariant::Hadley => "Hadley",
            AttractorVariant::Rossler => "Rössler",
            AttractorVariant::LorenzMod2 => "Lorenz Mod 2",
        }
    }

    /// Look a variant up by name, ignoring case, spaces, dashes and
    /// diacritics ("lu-chen", "Rossler", "lorenz_mod_2" all match).
    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize(name);
        Self::ALL
            .iter()
            .copied()
            .find(|v| normalize(v.name()) == key)
    }

    /// Integration step for one solver iteration.
    pub fn time_step(self) -> f32 {
        match self {
            AttractorVariant::Lorenz => 0.005,
            AttractorVariant::ChenLee => 0.002,
            AttractorVariant::Halvorsen => 0.004,
            AttractorVariant::LuChen => 0.002,
            AttractorVariant::Hadley => 0.008,
            AttractorVariant::Rossler => 0.02,
            AttractorVariant::LorenzMod2 => 0.004,
        }
    }

    /// The vector field `f(p)`.
    pub fn derivative(self, p: Vec3) -> Vec3 {
        let Vec3 { x, y, z } = p;
        match self {
            AttractorVariant::Lorenz => {
                let (sigma, rho, beta) = (10.0, 28.0, 8.0 / 3.0);
                Vec3::new(sigma * (y - x), x * (rho - z) - y, x * y - beta * z)
            }
            AttractorVariant::ChenLee => {
                let (alpha, beta, delta) = (5.0, -10.0, -0.38);
                Vec3::new(
                    alpha * x - y * z,
                    beta * y + x * z,
                    delta * z + x * y / 3.0,
                )
            }
            AttractorVariant::Halvorsen => {
                let a = 1.4;
                Vec3::new(
                    -a * x - 4.0 * y - 4.0 * z - y * y,
                    -a * y - 4.0 * z - 4.0 * x - z * z,
                    -a * z - 4.0 * x - 4.0 * y - x * x,
                )
            }
            AttractorVariant::LuChen => {
                let (a, b, c) = (36.0, 3.0, 20.0);
                Vec3::new(a * (y - x), -x * z + c * y, x * y - b * z)
            }
            AttractorVariant::Hadley => {
                let (a, b, f, g) = (0.2, 4.0, 8.0, 1.0);
                Vec3::new(
                    -y * y - z * z - a * x + a * f,
                    x * y - b * x * z - y + g,
                    b * x * y + x * z - z,
                )
            }
            AttractorVariant::Rossler => {
                let (a, b, c) = (0.2, 0.2, 5.7);
                Vec3::new(-y - z, x + a * y, b + z * (x - c))
            }
            AttractorVariant::LorenzMod2 => {
                let (a, b, c, d) = (0.9, 5.0, 9.9, 1.0);
                Vec3::new(
                    -a * x + y * y - z * z + a * c,
                    x * (y - b * z) + d,
                    -z + x * (b * y + z),
                )
            }
        }
    }

    /// Advance `p` by one solver iteration.
    pub fn step(self, p: Vec3) -> Vec3 {
        p + self.derivative(p) * self.time_step()
    }
}

impl fmt::Display for AttractorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            'ü' | 'Ü' => Some('u'),
            'ö' | 'Ö' => Some('o'),
            ' ' | '-' | '_' => None,
            c => Some(c.to_ascii_lowercase()),
        })
        .collect()
}
