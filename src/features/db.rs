use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Dynamic range kept below the loudest value, in dB.
pub const TOP_DB: f32 = 80.0;

/// Reference level that maps to 0 dB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbReference {
    /// Peak value of the whole matrix; output is ≤ 0 dB.
    Max,
    /// Fixed reference of 1.0.
    Unity,
}

/// `10 * log10(max(amin, S) / ref)`, clipped to `TOP_DB` below the peak.
///
/// An empty matrix is returned unchanged; an all-zero one becomes a
/// constant floor instead of `-inf`.
pub fn power_to_db(power: &Array2<f32>, reference: DbReference, amin: f32) -> Array2<f32> {
    if power.is_empty() {
        return power.clone();
    }
    let ref_value = match reference {
        DbReference::Max => power.iter().fold(0.0f32, |m, &v| m.max(v.abs())),
        DbReference::Unity => 1.0,
    };
    let ref_db = 10.0 * ref_value.max(amin).log10();

    let mut db = power.mapv(|v| 10.0 * v.max(amin).log10() - ref_db);
    let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let floor = peak - TOP_DB;
    db.mapv_inplace(|v| v.max(floor));
    db
}

/// Magnitude to dB: `power_to_db(S², ref², amin²)`.
pub fn amplitude_to_db(magnitude: &Array2<f32>, reference: DbReference, amin: f32) -> Array2<f32> {
    let power = magnitude.mapv(|v| v * v);
    power_to_db(&power, reference, amin * amin)
}
