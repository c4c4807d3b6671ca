//! Fully-connected layer, activations and inverted dropout

use super::optimizer::{Adam, AdamState};
use super::ModelError;
use ndarray::{Array1, Array2, Array3, Axis, Ix1, Ix2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Element-wise activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Tanh,
    Sigmoid,
}

impl Activation {
    pub fn apply(&self, x: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Linear => x.clone(),
            Activation::Relu => x.mapv(|v| v.max(0.0)),
            Activation::Tanh => x.mapv(f64::tanh),
            Activation::Sigmoid => x.mapv(sigmoid),
        }
    }

    /// Derivative at the pre-activation values `z`
    pub fn derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Linear => Array2::ones(z.raw_dim()),
            Activation::Relu => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Tanh => z.mapv(|v| 1.0 - v.tanh().powi(2)),
            Activation::Sigmoid => z.mapv(|v| {
                let s = sigmoid(v);
                s * (1.0 - s)
            }),
        }
    }
}

pub(crate) fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

#[derive(Debug, Clone)]
struct DenseCache {
    input: Array2<f64>,
    pre_activation: Array2<f64>,
}

/// Fully-connected layer `y = act(x · W + b)` over a batch `[batch, in]`
#[derive(Debug, Clone)]
pub struct Dense {
    /// `[in, out]`
    pub weights: Array2<f64>,
    /// `[out]`
    pub biases: Array1<f64>,
    pub activation: Activation,
    cache: Option<DenseCache>,
    grad_w: Array2<f64>,
    grad_b: Array1<f64>,
    adam_w: AdamState<Ix2>,
    adam_b: AdamState<Ix1>,
}

impl Dense {
    /// Glorot-uniform weights, zero biases
    pub fn new(input_size: usize, output_size: usize, activation: Activation, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (input_size + output_size) as f64).sqrt();
        Self {
            weights: Array2::random_using(
                (input_size, output_size),
                Uniform::new(-limit, limit),
                rng,
            ),
            biases: Array1::zeros(output_size),
            activation,
            cache: None,
            grad_w: Array2::zeros((input_size, output_size)),
            grad_b: Array1::zeros(output_size),
            adam_w: AdamState::new((input_size, output_size)),
            adam_b: AdamState::new(output_size),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<(), ModelError> {
        if x.ncols() != self.input_size() {
            return Err(ModelError::Shape(format!(
                "dense layer expects {} inputs, got {}",
                self.input_size(),
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Inference pass
    pub fn forward(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        self.check_input(x)?;
        Ok(self.activation.apply(&(x.dot(&self.weights) + &self.biases)))
    }

    /// Training pass; keeps what `backward` needs
    pub fn forward_train(&mut self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        self.check_input(x)?;
        let pre_activation = x.dot(&self.weights) + &self.biases;
        let out = self.activation.apply(&pre_activation);
        self.cache = Some(DenseCache {
            input: x.clone(),
            pre_activation,
        });
        Ok(out)
    }

    /// Stores parameter gradients and returns the gradient w.r.t. the input
    pub fn backward(&mut self, d_out: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let cache = self.cache.take().ok_or(ModelError::MissingForwardPass)?;
        let dz = d_out * &self.activation.derivative(&cache.pre_activation);

        self.grad_w = cache.input.t().dot(&dz);
        self.grad_b = dz.sum_axis(Axis(0));
        Ok(dz.dot(&self.weights.t()))
    }

    pub fn apply_gradients(&mut self, adam: &Adam) {
        adam.update(&mut self.weights, &self.grad_w, &mut self.adam_w);
        adam.update(&mut self.biases, &self.grad_b, &mut self.adam_b);
    }

    pub fn reset_optimizer(&mut self) {
        self.adam_w.reset();
        self.adam_b.reset();
    }

    /// Parameter gradients from the last `backward`
    pub fn gradients(&self) -> (&Array2<f64>, &Array1<f64>) {
        (&self.grad_w, &self.grad_b)
    }
}

/// Inverted dropout over `[batch, steps, features]` activations.
///
/// Kept units are scaled by `1 / (1 - rate)` at training time so inference
/// needs no rescaling.
#[derive(Debug, Clone)]
pub struct Dropout {
    pub rate: f64,
    mask: Option<Array3<f64>>,
}

impl Dropout {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 0.99),
            mask: None,
        }
    }

    pub fn forward_train(&mut self, x: Array3<f64>, rng: &mut StdRng) -> Array3<f64> {
        if self.rate <= 0.0 {
            self.mask = None;
            return x;
        }

        let keep = 1.0 - self.rate;
        let scale = 1.0 / keep;
        let mask = Array3::from_shape_simple_fn(x.raw_dim(), || {
            if rng.gen::<f64>() < keep {
                scale
            } else {
                0.0
            }
        });
        let out = x * &mask;
        self.mask = Some(mask);
        out
    }

    pub fn backward(&mut self, d_out: Array3<f64>) -> Array3<f64> {
        match self.mask.take() {
            Some(mask) => d_out * &mask,
            None => d_out,
        }
    }
}
