//! # Adaptive background model
//!
//! Per-pixel mixture-of-distributions background subtraction in the spirit of
//! Stauffer-Grimson. Each pixel keeps a small set of `(mean, variance,
//! weight)` components approximating the colours it has shown over time.
//! Samples matching a sufficiently weighty component are background; abrupt
//! local changes are foreground. Adaptation is online and single-pass, so
//! slow scene drift (lighting, weather) folds into the model while motion
//! keeps standing out.

use crate::frame::Frame;
use crate::mask::ForegroundMask;
use anyhow::{anyhow, Result};
use nalgebra as na;

/// Weight assigned to a freshly inserted mixture component.
const NEW_COMPONENT_WEIGHT: f32 = 0.05;

/// Tunable parameters of the background model.
///
/// The defaults are tuned for 8-bit surveillance footage and are what the
/// pipeline uses; the struct exists so tests can pin behaviour down.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug)]
pub struct BackgroundParams {
    /// Blend rate of means, variances and weights toward new samples.
    pub learning_rate: f32,
    /// Match tolerance in standard deviations.
    pub match_threshold: f32,
    /// Variance given to newly created components.
    pub initial_variance: f32,
    /// Floor applied to variances after each update.
    pub min_variance: f32,
    /// Minimum normalised weight a matched component needs for its pixel to
    /// count as background.
    pub background_weight: f32,
    /// Maximum mixture components per pixel.
    pub max_components: usize,
}

impl Default for BackgroundParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.02,
            match_threshold: 2.5,
            initial_variance: 225.0,
            min_variance: 4.0,
            background_weight: 0.25,
            max_components: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Component {
    mean: na::Vector3<f32>,
    variance: f32,
    weight: f32,
}

/// Per-pixel adaptive statistical model of the static scene.
///
/// Created once per pipeline run for a fixed frame size; it cannot be resized
/// mid-run. Each [`BackgroundModel::apply`] call classifies a frame and folds
/// it into the statistics in the same pass.
pub struct BackgroundModel {
    components: Vec<Component>,
    width: usize,
    height: usize,
    params: BackgroundParams,
    seeded: bool,
}

impl BackgroundModel {
    /// Create a model for frames of the given dimensions.
    pub fn new(width: usize, height: usize, params: BackgroundParams) -> Self {
        Self {
            components: vec![Component::default(); width * height * params.max_components],
            width,
            height,
            params,
            seeded: false,
        }
    }

    /// Get width and height the model was created for.
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Classify `frame` into `mask` and update the model statistics.
    ///
    /// Foreground pixels are written as 255, background as 0. The mask is
    /// resized to the model's dimensions. A frame whose dimensions differ
    /// from the model's is a configuration error and fails the call.
    pub fn apply(&mut self, frame: &Frame, mask: &mut ForegroundMask) -> Result<()> {
        let (w, h) = frame.dim();
        if (w, h) != (self.width, self.height) {
            return Err(anyhow!(
                "frame is {}x{}, but the model was created for {}x{}",
                w,
                h,
                self.width,
                self.height
            ));
        }

        mask.resize(self.width, self.height);

        if !self.seeded {
            // First frame: seed one full-weight component per pixel.
            let k = self.params.max_components;
            for (i, px) in frame.data().iter().enumerate() {
                self.components[i * k] = Component {
                    mean: px.to_vector(),
                    variance: self.params.initial_variance,
                    weight: 1.0,
                };
            }
            self.seeded = true;
            mask.data_mut().fill(0);
            return Ok(());
        }

        for (i, px) in frame.data().iter().enumerate() {
            let foreground = Self::update_pixel(
                &mut self.components[i * self.params.max_components..],
                &self.params,
                px.to_vector(),
            );
            mask.data_mut()[i] = if foreground { 255 } else { 0 };
        }

        Ok(())
    }

    /// Update one pixel's mixture with a new sample. Returns whether the
    /// sample is classified as foreground.
    fn update_pixel(slots: &mut [Component], params: &BackgroundParams, sample: na::Vector3<f32>) -> bool {
        let k = params.max_components;
        let slots = &mut slots[..k];
        let alpha = params.learning_rate;

        // Find the first component the sample falls into.
        let mut matched = None;
        for (i, c) in slots.iter().enumerate() {
            if c.weight <= 0.0 {
                continue;
            }
            let dist2 = (sample - c.mean).norm_squared();
            if dist2 < params.match_threshold * params.match_threshold * c.variance {
                matched = Some((i, dist2));
                break;
            }
        }

        let foreground = match matched {
            Some((m, dist2)) => {
                for (i, c) in slots.iter_mut().enumerate() {
                    if c.weight <= 0.0 {
                        continue;
                    }
                    if i == m {
                        c.weight += alpha * (1.0 - c.weight);
                    } else {
                        c.weight *= 1.0 - alpha;
                    }
                }
                let c = &mut slots[m];
                c.mean += alpha * (sample - c.mean);
                c.variance = ((1.0 - alpha) * c.variance + alpha * dist2).max(params.min_variance);
                Self::normalized_weight(slots, m) < params.background_weight
            }
            None => {
                // No component explains the sample: replace the weakest slot
                // (or fill an empty one) with a fresh wide component.
                for c in slots.iter_mut() {
                    if c.weight > 0.0 {
                        c.weight *= 1.0 - alpha;
                    }
                }
                let victim = slots
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| a.weight.total_cmp(&b.weight))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                slots[victim] = Component {
                    mean: sample,
                    variance: params.initial_variance,
                    weight: NEW_COMPONENT_WEIGHT,
                };
                true
            }
        };

        Self::renormalize(slots);
        foreground
    }

    fn renormalize(slots: &mut [Component]) {
        let total: f32 = slots.iter().map(|c| c.weight.max(0.0)).sum();
        if total > 0.0 {
            for c in slots.iter_mut() {
                if c.weight > 0.0 {
                    c.weight /= total;
                }
            }
        }
    }

    fn normalized_weight(slots: &[Component], m: usize) -> f32 {
        let total: f32 = slots.iter().map(|c| c.weight.max(0.0)).sum();
        if total > 0.0 {
            slots[m].weight / total
        } else {
            0.0
        }
    }

    #[cfg(test)]
    fn weights(&self, x: usize, y: usize) -> Vec<f32> {
        let k = self.params.max_components;
        let idx = (y * self.width + x) * k;
        self.components[idx..idx + k]
            .iter()
            .filter(|c| c.weight > 0.0)
            .map(|c| c.weight)
            .collect()
    }
}
