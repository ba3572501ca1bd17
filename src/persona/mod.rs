//! Persona system: response-style weights and speaker profiles.
//!
//! Two independent pieces live here:
//!
//! ```text
//! Persona (5 named styles)
//!   ↓  per-session weight, adapted by the evaluator
//! PersonaWeights  ∈ [WeightBounds.min, WeightBounds.max]
//!
//! arbitrary JSON "dna"
//!   ↓  sanitize_profile
//! PersonaProfile  (always fully populated, finite)
//! ```

pub mod profile;
pub mod weights;

pub use profile::{sanitize_profile, PersonaProfile};
pub use weights::{Persona, PersonaWeights, WeightBounds};
