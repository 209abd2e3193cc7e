//! The fixed planet table driving both the builder and the animation.

use std::fmt;

/// Angle added to the sun's spin every frame, in radians.
pub const SUN_SPIN_SPEED: f32 = 0.001;

/// Radius of the sun sphere in world units.
pub const SUN_RADIUS: f32 = 10.0;

/// Major radius of the ring attached to ringed planets.
pub const PLANET_RING_RADIUS: f32 = 5.0;

/// One row of the planet table. Never mutated after startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetConfig {
    /// Identifier, also the texture key.
    pub name: &'static str,
    /// Sphere radius.
    pub size_ratio: f32,
    /// Offset of the planet from its orbit group's origin along +X.
    pub orbit_distance: f32,
    /// Radians per frame, applied to both the orbit group and the planet body.
    pub rotation_speed: f32,
    /// Attach an extra tilted ring at the planet's position.
    pub extra_ring: bool,
}

impl PlanetConfig {
    /// A planet without an extra ring.
    pub const fn new(
        name: &'static str,
        size_ratio: f32,
        orbit_distance: f32,
        rotation_speed: f32,
    ) -> Self {
        Self {
            name,
            size_ratio,
            orbit_distance,
            rotation_speed,
            extra_ring: false,
        }
    }

    /// Mark the planet as ringed.
    pub const fn with_ring(mut self) -> Self {
        self.extra_ring = true;
        self
    }

    /// Distance from the orbit centre to the outermost visual part of the planet.
    fn outer_extent(&self) -> f32 {
        let reach = if self.extra_ring {
            PLANET_RING_RADIUS.max(self.size_ratio)
        } else {
            self.size_ratio
        };
        self.orbit_distance + reach
    }

    /// Distance from the orbit centre to the innermost visual part of the planet.
    fn inner_extent(&self) -> f32 {
        let reach = if self.extra_ring {
            PLANET_RING_RADIUS.max(self.size_ratio)
        } else {
            self.size_ratio
        };
        self.orbit_distance - reach
    }
}

/// Mercury through Neptune, in orbit order.
pub const REFERENCE_PLANETS: [PlanetConfig; 8] = [
    PlanetConfig::new("mercury", 100.0 / 277.0, 15.0, 0.002),
    PlanetConfig::new("venus", 100.0 / 133.0, 20.0, 0.0075),
    PlanetConfig::new("earth", 100.0 / 103.0, 25.0, 0.0065),
    PlanetConfig::new("mars", 100.0 / 208.0, 30.0, 0.0025),
    PlanetConfig::new("jupiter", 30.0 / 9.68, 40.0, 0.0055),
    PlanetConfig::new("saturn", 30.0 / 11.4, 50.0, 0.004).with_ring(),
    PlanetConfig::new("uranus", 30.0 / 26.8, 60.0, 0.006),
    PlanetConfig::new("neptune", 30.0 / 27.7, 70.0, 0.003),
];

/// A problem found in a planet table. Tables with warnings still build.
#[derive(Debug, Clone, PartialEq)]
pub enum TableWarning {
    NonPositive {
        planet: &'static str,
        field: &'static str,
        value: f32,
    },
    NotIncreasing {
        planet: &'static str,
        previous: &'static str,
    },
    Overlap {
        planet: &'static str,
        previous: &'static str,
    },
}

impl fmt::Display for TableWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive {
                planet,
                field,
                value,
            } => write!(f, "{planet}: {field} must be positive, got {value}"),
            Self::NotIncreasing { planet, previous } => {
                write!(f, "{planet}: orbit distance does not exceed {previous}'s")
            }
            Self::Overlap { planet, previous } => {
                write!(f, "{planet}: orbit overlaps {previous}'s")
            }
        }
    }
}

/// Check a planet table for values that would draw badly.
///
/// NaN counts as non-positive.
pub fn validate_table(planets: &[PlanetConfig]) -> Vec<TableWarning> {
    let mut warnings = Vec::new();

    for planet in planets {
        for (field, value) in [
            ("size_ratio", planet.size_ratio),
            ("orbit_distance", planet.orbit_distance),
            ("rotation_speed", planet.rotation_speed),
        ] {
            if !(value > 0.0) {
                warnings.push(TableWarning::NonPositive {
                    planet: planet.name,
                    field,
                    value,
                });
            }
        }
    }

    for pair in planets.windows(2) {
        let (previous, planet) = (&pair[0], &pair[1]);
        if planet.orbit_distance <= previous.orbit_distance {
            warnings.push(TableWarning::NotIncreasing {
                planet: planet.name,
                previous: previous.name,
            });
        } else if planet.inner_extent() <= previous.outer_extent() {
            warnings.push(TableWarning::Overlap {
                planet: planet.name,
                previous: previous.name,
            });
        }
    }

    warnings
}
