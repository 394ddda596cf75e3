//! Named Conductance Profiles - First-Class Config
//!
//! Profiles are SERIALIZABLE IDENTIFIERS, not raw parameter sets.
//! Config files name a profile; the integrator still accepts raw
//! conductances through `set_conductances` for interactive tweaking.
//!
//! ```json
//! { "integrator": { "profile": "SodiumBlocked" } }
//! ```

use serde::{Deserialize, Serialize};

/// Maximal channel conductances (mS/cm²)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conductances {
    /// Sodium conductance (g_Na)
    pub sodium: f32,
    /// Potassium conductance (g_K)
    pub potassium: f32,
    /// Leak conductance (g_L)
    pub leak: f32,
}

impl Default for Conductances {
    fn default() -> Self {
        ConductanceProfile::Standard.conductances()
    }
}

/// Hodgkin-Huxley membrane profiles
///
/// Each profile maps to a conductance set. The blocked profiles mirror the
/// classic pharmacology demonstrations (tetrodotoxin, tetraethylammonium).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConductanceProfile {
    /// Classic squid giant axon values
    #[default]
    Standard,

    /// ↑ g_Na, ↓ g_K
    /// Lower threshold, taller spikes
    HighExcitability,

    /// g_Na = 0 (TTX-like)
    /// No action potential can be produced
    SodiumBlocked,

    /// g_K = 0 (TEA-like)
    /// Repolarization relies on leak alone, spikes become plateaus
    PotassiumBlocked,
}

impl ConductanceProfile {
    /// Get conductances for this profile
    pub fn conductances(&self) -> Conductances {
        let (sodium, potassium, leak) = match self {
            Self::Standard => (120.0, 36.0, 0.3),
            Self::HighExcitability => (150.0, 30.0, 0.3),
            Self::SodiumBlocked => (0.0, 36.0, 0.3),
            Self::PotassiumBlocked => (120.0, 0.0, 0.3),
        };
        Conductances {
            sodium,
            potassium,
            leak,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Standard => "Standard - squid giant axon",
            Self::HighExcitability => "High excitability - strong sodium, weak potassium",
            Self::SodiumBlocked => "Sodium blocked - tetrodotoxin, no spikes",
            Self::PotassiumBlocked => "Potassium blocked - tetraethylammonium, prolonged depolarization",
        }
    }

    /// All profiles, in display order
    pub fn all() -> [ConductanceProfile; 4] {
        [
            Self::Standard,
            Self::HighExcitability,
            Self::SodiumBlocked,
            Self::PotassiumBlocked,
        ]
    }
}
