use ndarray::{s, Array2, ArrayView2};

/// Force the time axis (columns) to exactly `fixed_timesteps`.
///
/// Longer inputs keep their first `fixed_timesteps` columns; shorter ones
/// are followed by columns of exact zeros. The bin axis is never touched.
pub fn pad_or_truncate(matrix: ArrayView2<'_, f32>, fixed_timesteps: usize) -> Array2<f32> {
    let (bins, frames) = matrix.dim();
    if frames > fixed_timesteps {
        return matrix.slice(s![.., ..fixed_timesteps]).to_owned();
    }

    let mut out = Array2::<f32>::zeros((bins, fixed_timesteps));
    out.slice_mut(s![.., ..frames]).assign(&matrix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(bins: usize, frames: usize) -> Array2<f32> {
        Array2::from_shape_fn((bins, frames), |(f, t)| (f * 1000 + t) as f32 + 1.0)
    }

    #[test]
    fn test_truncates_long_input() {
        let m = ramp(13, 200);
        let out = pad_or_truncate(m.view(), 150);
        assert_eq!(out.dim(), (13, 150));
        assert_eq!(out, m.slice(s![.., 0..150]));
    }

    #[test]
    fn test_pads_short_input_with_zeros() {
        let m = ramp(13, 100);
        let out = pad_or_truncate(m.view(), 150);
        assert_eq!(out.dim(), (13, 150));
        assert_eq!(out.slice(s![.., 0..100]), m);
        assert!(out.slice(s![.., 100..150]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_exact_width_is_identity() {
        let m = ramp(84, 150);
        assert_eq!(pad_or_truncate(m.view(), 150), m);
    }

    #[test]
    fn test_zero_width_becomes_all_zero() {
        let m = Array2::<f32>::zeros((13, 0));
        let out = pad_or_truncate(m.view(), 150);
        assert_eq!(out.dim(), (13, 150));
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_width_always_matches_and_is_idempotent() {
        for frames in [0, 1, 149, 150, 151, 400] {
            let m = ramp(5, frames);
            let once = pad_or_truncate(m.view(), 150);
            assert_eq!(once.dim(), (5, 150), "frames = {frames}");
            assert_eq!(pad_or_truncate(once.view(), 150), once, "frames = {frames}");
        }
    }

    #[test]
    fn test_zero_target_width() {
        let out = pad_or_truncate(ramp(3, 10).view(), 0);
        assert_eq!(out.dim(), (3, 0));
    }

    #[test]
    fn test_preserves_negative_db_values() {
        let m = Array2::from_elem((2, 3), -80.0f32);
        let out = pad_or_truncate(m.view(), 5);
        assert_eq!(out[[1, 2]], -80.0);
        assert_eq!(out[[1, 3]], 0.0);
    }
}
