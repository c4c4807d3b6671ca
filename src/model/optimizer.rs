//! Adam (Adaptive Moment Estimation)
//!
//! The optimizer holds the hyper-parameters and the shared step counter;
//! every parameter tensor owns its moment estimates in an [`AdamState`].

use super::config::TrainingConfig;
use ndarray::{Array, Dimension, ShapeBuilder, Zip};

/// First and second moment estimates of one parameter tensor
#[derive(Debug, Clone)]
pub struct AdamState<D: Dimension> {
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> AdamState<D> {
    pub fn new<Sh: ShapeBuilder<Dim = D>>(shape: Sh) -> Self {
        let m = Array::zeros(shape);
        let v = Array::zeros(m.raw_dim());
        Self { m, v }
    }

    pub fn reset(&mut self) {
        self.m.fill(0.0);
        self.v.fill(0.0);
    }
}

#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    /// Gradients are clamped to `[-clip, clip]` before the update
    pub clip: Option<f64>,
    t: i32,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            clip: None,
            t: 0,
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
            clip: config.gradient_clip,
            t: 0,
        }
    }

    /// Advances the step counter; call once per batch before the updates
    pub fn step(&mut self) {
        self.t += 1;
    }

    pub fn iterations(&self) -> i32 {
        self.t
    }

    /// Updates `param` in place from `grad`
    pub fn update<D: Dimension>(
        &self,
        param: &mut Array<f64, D>,
        grad: &Array<f64, D>,
        state: &mut AdamState<D>,
    ) {
        let t = self.t.max(1);
        let lr_t = self.learning_rate * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let clip = self.clip;

        Zip::from(param)
            .and(grad)
            .and(&mut state.m)
            .and(&mut state.v)
            .for_each(|p, &g, m, v| {
                let g = match clip {
                    Some(c) => g.clamp(-c, c),
                    None => g,
                };
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                *p -= lr_t * *m / (v.sqrt() + eps);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(0.01);
        let mut weights = Array2::ones((3, 2));
        let grads = Array2::from_elem((3, 2), 0.5);
        let mut state = AdamState::new((3, 2));

        adam.step();
        adam.update(&mut weights, &grads, &mut state);

        // bias-corrected first step is ~lr * sign(g)
        for &w in weights.iter() {
            assert!((w - 0.99).abs() < 1e-6);
        }
    }

    #[test]
    fn test_adam_minimizes_quadratic() {
        let mut adam = Adam::new(0.1);
        let mut x = Array1::from_vec(vec![3.0, -2.0]);
        let mut state = AdamState::new(2);

        for _ in 0..500 {
            let grad = &x * 2.0;
            adam.step();
            adam.update(&mut x, &grad, &mut state);
        }

        assert!(x.iter().all(|v| v.abs() < 5e-2));
        assert_eq!(adam.iterations(), 500);
    }

    #[test]
    fn test_gradient_clip() {
        let mut adam = Adam::new(0.01);
        adam.clip = Some(1.0);
        let mut a = Array1::zeros(1);
        let mut state = AdamState::new(1);
        adam.step();
        adam.update(&mut a, &Array1::from_vec(vec![1e6]), &mut state);

        // clipped gradient still gives a unit-direction first step
        assert!((a[0] + 0.01).abs() < 1e-6);
    }
}
