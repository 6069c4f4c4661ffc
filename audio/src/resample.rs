//! Sample rate conversion via rubato.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::AudioError;

/// Resamples a mono buffer from `from_rate` to `to_rate` in one shot.
///
/// Equal rates return the input unchanged. The whole clip is processed as
/// a single chunk; clips here are a few seconds long at most.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        params,
        samples.len(),
        1,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let output = resampler
        .process(&[samples], None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    Ok(output.into_iter().next().unwrap_or_default())
}
