//! # SkyPass: batch sky view
//!
//! This module defines [`SkyPass`], the façade that turns a catalog of raw element records into
//! the list of objects currently above an observer's horizon. Each record runs through the same
//! independent pipeline:
//!
//! 1. **Classification** – the record name is mapped to a [`Constellation`]; unknown names are dropped,
//! 2. **Decoding** – the raw record becomes [`OrbitalElements`] with precomputed coefficients,
//! 3. **Propagation** – SGP4/SDP4 to the requested instant,
//! 4. **Transform** – TEME → geodetic → Earth-fixed → look angles,
//! 5. **Filter** – elevation strictly above the mask.
//!
//! A failure at any stage removes that object only. The output keeps the input order, with the
//! excluded entries omitted, whether the batch runs on the rayon pool or sequentially.
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use hifitime::Epoch;
//! use skypass::elements::RawElements;
//! use skypass::observers::Observer;
//! use skypass::skypass::{ElementRecord, SkyParams, SkyPass};
//!
//! let observer = Observer::new(45.0, 5.0, 300.0)?;
//! let records = vec![ElementRecord::new(
//!     "STARLINK-1007",
//!     "44713",
//!     RawElements::Tle(std::fs::read_to_string("starlink.tle")?),
//! )];
//!
//! let sky = SkyPass::new(SkyParams::builder().min_elevation_deg(10.0).build()?);
//! for rec in sky.compute_visible(&observer, Epoch::now()?, &records) {
//!     println!("{} az {:.1} el {:.1}", rec.name, rec.azimuth_deg, rec.elevation_deg);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Decode once, evaluate many
//!
//! [`SkyPass::prepare`] classifies and decodes a catalog once; [`SkyPass::visible_from_prepared`]
//! then evaluates any number of instants without recomputing the propagation coefficients.
//!
//! ## See also
//! ------------
//! * [`visibility`](crate::visibility) – horizon filter and output records.
//! * [`SkyParams`] – propagation model, elevation mask and parallelism switch.

use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

use hifitime::Epoch;
use itertools::{Either, Itertools};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{Degree, GravityModel, OpsMode, Radian, RADEG};
use crate::constellation::{classify_constellation, Constellation};
use crate::elements::omm::Omm;
use crate::elements::tle::TleEntry;
use crate::elements::{OrbitalElements, RawElements};
use crate::observers::Observer;
use crate::propagator::{propagate, PropagationModel};
use crate::skypass_errors::SkypassError;
use crate::visibility::{filter_visible, sight, Exclusion, ExclusionReason, VisibilityRecord};

/// One input record of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// Object name, used for the constellation lookup
    pub name: String,
    /// Caller-chosen identifier copied to the output
    pub id: String,
    pub elements: RawElements,
}

impl ElementRecord {
    pub fn new(name: impl Into<String>, id: impl Into<String>, elements: RawElements) -> Self {
        ElementRecord {
            name: name.into(),
            id: id.into(),
            elements,
        }
    }

    /// Record from one entry of a text catalog; the id is the catalog number field.
    pub fn from_tle_entry(entry: &TleEntry) -> Self {
        let id = entry.line1.get(2..7).unwrap_or_default().trim().to_string();
        ElementRecord {
            name: entry.name.clone().unwrap_or_default(),
            id,
            elements: RawElements::Tle(entry.to_text()),
        }
    }

    /// Record from a GP record; the id is the NORAD catalog number.
    pub fn from_omm(omm: Omm) -> Self {
        ElementRecord {
            name: omm.object_name.clone().unwrap_or_default(),
            id: omm.norad_cat_id.to_string(),
            elements: RawElements::Omm(omm),
        }
    }
}

/// Configuration of a [`SkyPass`] run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyParams {
    pub gravity: GravityModel,
    pub ops_mode: OpsMode,
    /// Elevation mask in degrees; objects must be strictly above it
    pub min_elevation_deg: Degree,
    /// Fan the batch out on the rayon pool
    pub parallel: bool,
}

impl Default for SkyParams {
    fn default() -> Self {
        SkyParams {
            gravity: GravityModel::Wgs72,
            ops_mode: OpsMode::Improved,
            min_elevation_deg: 0.0,
            parallel: true,
        }
    }
}

impl SkyParams {
    pub fn builder() -> SkyParamsBuilder {
        SkyParamsBuilder::new()
    }

    pub fn model(&self) -> PropagationModel {
        PropagationModel {
            gravity: self.gravity,
            ops_mode: self.ops_mode,
        }
    }

    /// Elevation mask in radians.
    pub fn mask(&self) -> Radian {
        self.min_elevation_deg * RADEG
    }

    /// Check the parameters, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), SkypassError> {
        let m = self.min_elevation_deg;
        let ge_min = matches!(m.partial_cmp(&-90.0), Some(Greater) | Some(Equal));
        let lt_max = m.partial_cmp(&90.0) == Some(Less);
        if !(ge_min && lt_max) {
            return Err(SkypassError::InvalidParameter(format!(
                "min_elevation_deg must be finite and in [-90, 90), got {m}"
            )));
        }
        Ok(())
    }
}

/// Builder for [`SkyParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct SkyParamsBuilder {
    params: SkyParams,
}

impl SkyParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: SkyParams::default(),
        }
    }

    pub fn gravity(mut self, v: GravityModel) -> Self {
        self.params.gravity = v;
        self
    }
    pub fn ops_mode(mut self, v: OpsMode) -> Self {
        self.params.ops_mode = v;
        self
    }
    pub fn min_elevation_deg(mut self, v: Degree) -> Self {
        self.params.min_elevation_deg = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.params.parallel = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `-90 ≤ min_elevation_deg < 90`, NaN and infinities rejected.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(SkyParams)`, or [`SkypassError::InvalidParameter`] naming the rejected value.
    pub fn build(self) -> Result<SkyParams, SkypassError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

impl fmt::Display for SkyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 36;
            writeln!(f, "Sky view parameters")?;
            writeln!(f, "-------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!("gravity           = {}", self.gravity, "Earth gravity constants")?;
            line!("ops_mode          = {}", self.ops_mode, "Sidereal time and node handling")?;
            line!(
                "min_elevation_deg = {:.3}",
                self.min_elevation_deg,
                "Elevation mask (strict)"
            )?;
            line!("parallel          = {}", self.parallel, "Use the rayon pool")?;
            Ok(())
        } else {
            write!(
                f,
                "SkyParams(gravity={}, ops_mode={}, mask={:.3}°, parallel={})",
                self.gravity, self.ops_mode, self.min_elevation_deg, self.parallel
            )
        }
    }
}

/// Visible objects together with the reason each other input was left out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkyReport {
    pub visible: Vec<VisibilityRecord>,
    /// In input order
    pub excluded: Vec<Exclusion>,
}

#[derive(Debug, Clone, PartialEq)]
struct PreparedEntry {
    index: usize,
    name: String,
    id: String,
    decoded: Result<(Constellation, OrbitalElements), ExclusionReason>,
}

/// A catalog classified and decoded once, ready for repeated evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCatalog {
    entries: Vec<PreparedEntry>,
    model: PropagationModel,
}

impl PreparedCatalog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Propagation model the catalog was decoded with.
    pub fn model(&self) -> PropagationModel {
        self.model
    }

    /// Number of records that passed classification and decoding.
    pub fn usable(&self) -> usize {
        self.entries.iter().filter(|e| e.decoded.is_ok()).count()
    }
}

fn prepare_one(index: usize, record: &ElementRecord, model: PropagationModel) -> PreparedEntry {
    let decoded = match classify_constellation(&record.name) {
        None => Err(ExclusionReason::Unclassified),
        Some(constellation) => record
            .elements
            .decode(model)
            .map(|elements| (constellation, elements))
            .map_err(ExclusionReason::Decode),
    };
    PreparedEntry {
        index,
        name: record.name.clone(),
        id: record.id.clone(),
        decoded,
    }
}

fn evaluate_one(
    entry: &PreparedEntry,
    observer: &Observer,
    time: Epoch,
    mask: Radian,
) -> Result<VisibilityRecord, Exclusion> {
    let exclusion = |reason| Exclusion {
        index: entry.index,
        name: entry.name.clone(),
        id: entry.id.clone(),
        reason,
    };

    let (constellation, elements) = entry.decoded.as_ref().map_err(|r| exclusion(r.clone()))?;
    let state = propagate(elements, &time).map_err(|e| exclusion(ExclusionReason::Propagation(e)))?;
    let sighting = sight(observer, &state);
    filter_visible(&entry.name, *constellation, &entry.id, &sighting, mask)
        .map_err(|elevation_deg| exclusion(ExclusionReason::BelowHorizon { elevation_deg }))
}

/// Batch visibility computation for one observer and instant at a time.
#[derive(Debug, Clone, Default)]
pub struct SkyPass {
    params: SkyParams,
}

impl SkyPass {
    pub fn new(params: SkyParams) -> Self {
        SkyPass { params }
    }

    pub fn params(&self) -> &SkyParams {
        &self.params
    }

    fn run<T, F>(&self, items: &[T], f: F) -> Vec<Result<VisibilityRecord, Exclusion>>
    where
        T: Sync,
        F: Fn(usize, &T) -> Result<VisibilityRecord, Exclusion> + Sync + Send,
    {
        if self.params.parallel {
            items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect()
        } else {
            items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
        }
    }

    fn collect_report(&self, outcomes: Vec<Result<VisibilityRecord, Exclusion>>) -> SkyReport {
        let total = outcomes.len();
        let (visible, excluded): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition_map(|outcome| match outcome {
                Ok(record) => Either::Left(record),
                Err(exclusion) => Either::Right(exclusion),
            });

        for e in &excluded {
            debug!(index = e.index, name = %e.name, id = %e.id, reason = %e.reason, "object excluded");
        }
        debug!(
            total,
            visible = visible.len(),
            excluded = excluded.len(),
            parallel = self.params.parallel,
            "sky view computed"
        );
        SkyReport { visible, excluded }
    }

    /// Objects strictly above the elevation mask, in input order.
    ///
    /// Arguments
    /// -----------------
    /// * `observer`: the ground site.
    /// * `time`: evaluation instant (UTC).
    /// * `records`: the catalog; records that cannot be classified, decoded or propagated are skipped.
    ///
    /// Return
    /// ----------
    /// * The visible objects; an empty vector when none is visible.
    pub fn compute_visible(
        &self,
        observer: &Observer,
        time: Epoch,
        records: &[ElementRecord],
    ) -> Vec<VisibilityRecord> {
        self.compute_with_diagnostics(observer, time, records).visible
    }

    /// Same as [`compute_visible`](SkyPass::compute_visible), also returning the exclusions.
    pub fn compute_with_diagnostics(
        &self,
        observer: &Observer,
        time: Epoch,
        records: &[ElementRecord],
    ) -> SkyReport {
        let model = self.params.model();
        let mask = self.params.mask();
        let outcomes = self.run(records, |i, record| {
            evaluate_one(&prepare_one(i, record, model), observer, time, mask)
        });
        self.collect_report(outcomes)
    }

    /// Classify and decode a catalog once.
    pub fn prepare(&self, records: &[ElementRecord]) -> PreparedCatalog {
        let model = self.params.model();
        let entries = if self.params.parallel {
            records
                .par_iter()
                .enumerate()
                .map(|(i, r)| prepare_one(i, r, model))
                .collect()
        } else {
            records
                .iter()
                .enumerate()
                .map(|(i, r)| prepare_one(i, r, model))
                .collect()
        };
        PreparedCatalog { entries, model }
    }

    /// Visible objects of a prepared catalog at `time`.
    pub fn visible_from_prepared(
        &self,
        observer: &Observer,
        time: Epoch,
        catalog: &PreparedCatalog,
    ) -> Vec<VisibilityRecord> {
        self.report_from_prepared(observer, time, catalog).visible
    }

    /// Visible objects and exclusions of a prepared catalog at `time`.
    pub fn report_from_prepared(
        &self,
        observer: &Observer,
        time: Epoch,
        catalog: &PreparedCatalog,
    ) -> SkyReport {
        let mask = self.params.mask();
        let outcomes = self.run(&catalog.entries, |_, entry| {
            evaluate_one(entry, observer, time, mask)
        });
        self.collect_report(outcomes)
    }
}

/// Visible objects with the default parameters (WGS72, mask 0°, parallel).
pub fn compute_visible(
    observer: &Observer,
    time: Epoch,
    records: &[ElementRecord],
) -> Vec<VisibilityRecord> {
    SkyPass::default().compute_visible(observer, time, records)
}

#[cfg(test)]
mod skypass_test {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let p = SkyParams::builder().build().unwrap();
        assert_eq!(p, SkyParams::default());
        assert_eq!(p.mask(), 0.0);
        assert!(p.parallel);
    }

    #[test]
    fn test_builder_rejects_bad_mask() {
        for bad in [f64::NAN, f64::INFINITY, 90.0, -90.5] {
            assert!(matches!(
                SkyParams::builder().min_elevation_deg(bad).build(),
                Err(SkypassError::InvalidParameter(_))
            ));
        }
        assert!(SkyParams::builder().min_elevation_deg(-90.0).build().is_ok());
    }

    #[test]
    fn test_params_json() {
        let p: SkyParams = serde_json::from_str(r#"{"gravity": "wgs84", "min_elevation_deg": 5.0}"#).unwrap();
        assert_eq!(p.gravity, GravityModel::Wgs84);
        assert_eq!(p.ops_mode, OpsMode::Improved);
        assert!(p.parallel);
        let back: SkyParams = serde_json::from_str(&serde_json::to_string(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_params_display() {
        let p = SkyParams::default();
        assert_eq!(
            p.to_string(),
            "SkyParams(gravity=wgs72, ops_mode=improved, mask=0.000°, parallel=true)"
        );
        let table = format!("{p:#}");
        assert!(table.starts_with("Sky view parameters"));
        assert!(table.contains("min_elevation_deg = 0.000"));
    }

    #[test]
    fn test_empty_batch() {
        let obs = Observer::new(0.0, 0.0, 0.0).unwrap();
        let report = SkyPass::default().compute_with_diagnostics(&obs, Epoch::from_gregorian_utc_at_midnight(2024, 1, 1), &[]);
        assert!(report.visible.is_empty());
        assert!(report.excluded.is_empty());
    }

    #[test]
    fn test_unclassified_and_undecodable() {
        let obs = Observer::new(0.0, 0.0, 0.0).unwrap();
        let records = vec![
            ElementRecord::new("ISS (ZARYA)", "25544", RawElements::Tle("garbage".into())),
            ElementRecord::new("STARLINK-1", "1", RawElements::Tle("garbage".into())),
        ];
        let report = SkyPass::default().compute_with_diagnostics(
            &obs,
            Epoch::from_gregorian_utc_at_midnight(2024, 1, 1),
            &records,
        );
        assert!(report.visible.is_empty());
        assert_eq!(report.excluded.len(), 2);
        assert_eq!(report.excluded[0].reason, ExclusionReason::Unclassified);
        assert!(matches!(report.excluded[1].reason, ExclusionReason::Decode(_)));
        assert_eq!(report.excluded[1].index, 1);
    }

    #[test]
    fn test_record_from_tle_entry() {
        let entry = TleEntry {
            name: Some("GPS BIIR-2  (PRN 13)".into()),
            line1: "1 24876U 97035A   24061.50000000  .00000015  00000-0  00000+0 0  9994".into(),
            line2: "2 24876  55.4967 140.1157 0051361  52.2141 308.2702  2.00562904195583".into(),
        };
        let r = ElementRecord::from_tle_entry(&entry);
        assert_eq!(r.id, "24876");
        assert_eq!(r.name, "GPS BIIR-2  (PRN 13)");
    }
}
