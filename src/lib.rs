pub mod constants;
pub mod constellation;
pub mod elements;
pub mod observers;
pub mod propagator;
pub mod ref_system;
pub mod skypass;
pub mod skypass_errors;
pub mod time;
pub mod visibility;

pub use crate::constellation::{classify_constellation, Constellation};
pub use crate::elements::{ElementIdentity, MeanElements, OrbitalElements, RawElements};
pub use crate::observers::Observer;
pub use crate::propagator::{propagate, InertialState, PropagationModel};
pub use crate::skypass::{compute_visible, ElementRecord, SkyParams, SkyPass, SkyReport};
pub use crate::skypass_errors::{DecodeError, PropagationError, SkypassError};
pub use crate::visibility::VisibilityRecord;
