#![allow(dead_code)]

use hifitime::Epoch;
use nalgebra::{Matrix2, Vector2};

use skypass::constants::{DPI, MINUTES_PER_DAY, RADEG};
use skypass::elements::{ElementIdentity, MeanElements, OrbitalElements, RawElements};
use skypass::observers::Observer;
use skypass::ref_system::{inertial_to_geodetic, wrap_pi};
use skypass::{ElementRecord, PropagationModel};

pub const VANGUARD: [&str; 2] = [
    "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753",
    "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667",
];

pub const ISS: [&str; 3] = [
    "ISS (ZARYA)",
    "1 25544U 98067A   24061.52543534  .00018023  00000-0  32313-3 0  9993",
    "2 25544  51.6410 118.9424 0005630 321.6407 183.4990 15.49942322441784",
];

pub const GPS: [&str; 3] = [
    "GPS BIIR-2  (PRN 13)",
    "1 24876U 97035A   24061.50000000  .00000015  00000-0  00000+0 0  9994",
    "2 24876  55.4967 140.1157 0051361  52.2141 308.2702  2.00562904195583",
];

pub const GEO: [&str; 3] = [
    "GALAXY 11",
    "1 26038U 00007A   24061.50000000 -.00000278  00000-0  00000+0 0  9991",
    "2 26038   0.0154 129.5265 0002412 234.5236 311.7238  1.00271759 88277",
];

pub const MOLNIYA: [&str; 3] = [
    "MOLNIYA 1-83",
    "1 21897U 92011A   24061.50000000  .00000080  00000-0  00000+0 0  9995",
    "2 21897  62.8523 254.3866 7126345 281.6712  14.6732  2.00611126235219",
];

/// Mean motion above 17 rev/day puts the orbit under the surface.
pub const DECAYED: [&str; 3] = [
    "STARLINK-9999",
    "1 99999U 24001A   24061.50000000  .00000000  00000-0  00000+0 0  9999",
    "2 99999  51.6000 100.0000 0001000  90.0000 270.0000 17.50000000    13",
];

pub fn tle_text(record: &[&str]) -> String {
    record.join("\n")
}

/// Catalog record from a three-line array, identified by its catalog number.
pub fn tle_record(record: &[&str; 3]) -> ElementRecord {
    ElementRecord::new(
        record[0],
        record[1][2..7].trim(),
        RawElements::Tle(tle_text(record)),
    )
}

pub fn query_time() -> Epoch {
    Epoch::from_gregorian_utc(2024, 3, 1, 12, 0, 0, 0)
}

pub fn grenoble() -> Observer {
    Observer::new(45.0, 5.0, 300.0).unwrap()
}

fn leo_mean(epoch: Epoch, raan: f64, mean_anomaly: f64) -> MeanElements {
    MeanElements {
        epoch,
        mean_motion: 15.05 * DPI / MINUTES_PER_DAY,
        eccentricity: 0.001,
        inclination: 53.0 * RADEG,
        raan,
        arg_perigee: 0.0,
        mean_anomaly,
        bstar: 1.0e-4,
        mean_motion_dot: 0.0,
        mean_motion_ddot: 0.0,
    }
}

fn sub_point(epoch: Epoch, params: Vector2<f64>) -> Vector2<f64> {
    let elements = OrbitalElements::new(
        leo_mean(epoch, params[0], params[1]),
        ElementIdentity::default(),
        PropagationModel::default(),
    )
    .unwrap();
    let state = elements.propagate(&epoch).unwrap();
    let g = inertial_to_geodetic(&state.position, state.gmst);
    Vector2::new(g.latitude, g.longitude)
}

/// Elements of a 53° LEO whose sub-satellite point at `epoch` is the observer's geodetic
/// position, so that the object is at the zenith.
///
/// Node and mean anomaly are solved with a Newton iteration on the propagated sub-point.
pub fn overhead_leo(observer: &Observer, epoch: Epoch) -> MeanElements {
    let target = Vector2::new(observer.latitude(), observer.longitude());
    let incl = 53.0 * RADEG;
    let gmst = skypass::time::gstime(skypass::time::julian_date(&epoch));

    // spherical first guess on an ascending pass
    let u = (target[0].sin() / incl.sin()).asin();
    let ra_offset = (incl.cos() * u.sin()).atan2(u.cos());
    let mut x = Vector2::new(target[1] + gmst - ra_offset, u);

    let residual = |p: Vector2<f64>| {
        let s = sub_point(epoch, p);
        Vector2::new(s[0] - target[0], wrap_pi(s[1] - target[1]))
    };

    let h = 1.0e-7;
    for _ in 0..15 {
        let f = residual(x);
        if f.norm() < 1.0e-12 {
            break;
        }
        let d0 = (residual(x + Vector2::new(h, 0.0)) - f) / h;
        let d1 = (residual(x + Vector2::new(0.0, h)) - f) / h;
        let jac = Matrix2::from_columns(&[d0, d1]);
        x -= jac.try_inverse().unwrap() * f;
    }
    leo_mean(epoch, x[0].rem_euclid(DPI), x[1].rem_euclid(DPI))
}

/// Element record of [`overhead_leo`] in GP form.
pub fn overhead_record(name: &str, id: u32, observer: &Observer, epoch: Epoch) -> ElementRecord {
    let mean = overhead_leo(observer, epoch);
    let json = serde_json::json!({
        "OBJECT_NAME": name,
        "OBJECT_ID": "2019-074A",
        "EPOCH": epoch_iso(epoch),
        "MEAN_MOTION": mean.mean_motion * MINUTES_PER_DAY / DPI,
        "ECCENTRICITY": mean.eccentricity,
        "INCLINATION": mean.inclination / RADEG,
        "RA_OF_ASC_NODE": mean.raan / RADEG,
        "ARG_OF_PERICENTER": mean.arg_perigee / RADEG,
        "MEAN_ANOMALY": mean.mean_anomaly / RADEG,
        "NORAD_CAT_ID": id,
        "BSTAR": mean.bstar,
    });
    ElementRecord::from_omm(serde_json::from_value(json).unwrap())
}

fn epoch_iso(epoch: Epoch) -> String {
    let (y, mo, d, h, mi, s, ns) = epoch.to_gregorian_utc();
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{ns:09}")
}
