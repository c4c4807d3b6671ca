//! Batched LSTM layer with backpropagation through time
//!
//! The four gates share one kernel: columns `[0, H)` are the input gate,
//! `[H, 2H)` forget, `[2H, 3H)` cell candidate and `[3H, 4H)` output.
//!
//! ```text
//! z = x_t · W_x + h_{t-1} · W_h + b
//! i = σ(z_i)   f = σ(z_f)   g = tanh(z_g)   o = σ(z_o)
//! c_t = f ⊙ c_{t-1} + i ⊙ g
//! h_t = o ⊙ tanh(c_t)
//! ```

use super::layers::sigmoid;
use super::optimizer::{Adam, AdamState};
use super::ModelError;
use ndarray::{s, Array1, Array2, Array3, ArrayView3, Axis, Ix1, Ix2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;

/// Activations of one time step, kept for the backward pass
#[derive(Debug, Clone)]
struct StepCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    c: Array2<f64>,
    tanh_c: Array2<f64>,
}

impl StepCache {
    fn hidden(&self) -> Array2<f64> {
        &self.o * &self.tanh_c
    }
}

/// LSTM layer returning the hidden state of every step
#[derive(Debug, Clone)]
pub struct LstmLayer {
    /// `[input, 4H]`
    pub w_x: Array2<f64>,
    /// `[H, 4H]`
    pub w_h: Array2<f64>,
    /// `[4H]`
    pub b: Array1<f64>,
    hidden_size: usize,
    cache: Option<Vec<StepCache>>,
    grad_w_x: Array2<f64>,
    grad_w_h: Array2<f64>,
    grad_b: Array1<f64>,
    adam_w_x: AdamState<Ix2>,
    adam_w_h: AdamState<Ix2>,
    adam_b: AdamState<Ix1>,
}

impl LstmLayer {
    /// Glorot-uniform kernels, zero biases except the forget gate at 1.0
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let gates = 4 * hidden_size;
        let limit_x = (6.0 / (input_size + gates) as f64).sqrt();
        let limit_h = (6.0 / (hidden_size + gates) as f64).sqrt();

        let mut b = Array1::zeros(gates);
        b.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            w_x: Array2::random_using((input_size, gates), Uniform::new(-limit_x, limit_x), rng),
            w_h: Array2::random_using((hidden_size, gates), Uniform::new(-limit_h, limit_h), rng),
            b,
            hidden_size,
            cache: None,
            grad_w_x: Array2::zeros((input_size, gates)),
            grad_w_h: Array2::zeros((hidden_size, gates)),
            grad_b: Array1::zeros(gates),
            adam_w_x: AdamState::new((input_size, gates)),
            adam_w_h: AdamState::new((hidden_size, gates)),
            adam_b: AdamState::new(gates),
        }
    }

    pub fn input_size(&self) -> usize {
        self.w_x.nrows()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn parameter_count(&self) -> usize {
        self.w_x.len() + self.w_h.len() + self.b.len()
    }

    fn check_input(&self, x: &ArrayView3<'_, f64>) -> Result<(), ModelError> {
        if x.shape()[2] != self.input_size() {
            return Err(ModelError::Shape(format!(
                "LSTM layer expects {} features per step, got {}",
                self.input_size(),
                x.shape()[2]
            )));
        }
        if x.shape()[1] == 0 {
            return Err(ModelError::Shape("empty sequence".into()));
        }
        Ok(())
    }

    fn cell(&self, x_t: Array2<f64>, h_prev: Array2<f64>, c_prev: Array2<f64>) -> StepCache {
        let hs = self.hidden_size;
        let z = x_t.dot(&self.w_x) + h_prev.dot(&self.w_h) + &self.b;

        let i = z.slice(s![.., 0..hs]).mapv(sigmoid);
        let f = z.slice(s![.., hs..2 * hs]).mapv(sigmoid);
        let g = z.slice(s![.., 2 * hs..3 * hs]).mapv(f64::tanh);
        let o = z.slice(s![.., 3 * hs..]).mapv(sigmoid);

        let c = &f * &c_prev + &i * &g;
        let tanh_c = c.mapv(f64::tanh);

        StepCache {
            x: x_t,
            h_prev,
            c_prev,
            i,
            f,
            g,
            o,
            c,
            tanh_c,
        }
    }

    fn run(&self, x: ArrayView3<'_, f64>, mut on_step: impl FnMut(StepCache)) -> Result<Array3<f64>, ModelError> {
        self.check_input(&x)?;
        let (batch, steps, _) = x.dim();

        let mut h = Array2::zeros((batch, self.hidden_size));
        let mut c = Array2::zeros((batch, self.hidden_size));
        let mut outputs = Array3::zeros((batch, steps, self.hidden_size));

        for t in 0..steps {
            let x_t = x.slice(s![.., t, ..]).to_owned();
            let step = self.cell(x_t, h, c);
            h = step.hidden();
            c = step.c.clone();
            outputs.slice_mut(s![.., t, ..]).assign(&h);
            on_step(step);
        }

        Ok(outputs)
    }

    /// Inference over `[batch, steps, input]`, returns `[batch, steps, H]`
    pub fn forward(&self, x: ArrayView3<'_, f64>) -> Result<Array3<f64>, ModelError> {
        self.run(x, |_| {})
    }

    /// Training pass; keeps every step for [`backward`](Self::backward)
    pub fn forward_train(&mut self, x: &Array3<f64>) -> Result<Array3<f64>, ModelError> {
        let mut steps = Vec::with_capacity(x.shape()[1]);
        let outputs = self.run(x.view(), |step| steps.push(step))?;
        self.cache = Some(steps);
        Ok(outputs)
    }

    /// Backpropagation through time.
    ///
    /// `d_out` is the loss gradient w.r.t. every hidden output
    /// `[batch, steps, H]`. Parameter gradients are stored on the layer and
    /// the gradient w.r.t. the input sequence is returned.
    pub fn backward(&mut self, d_out: &Array3<f64>) -> Result<Array3<f64>, ModelError> {
        let cache = self.cache.take().ok_or(ModelError::MissingForwardPass)?;
        let (batch, steps, hidden) = d_out.dim();
        if steps != cache.len() || hidden != self.hidden_size {
            return Err(ModelError::Shape(format!(
                "LSTM gradient has {} steps of width {}, forward pass had {} of width {}",
                steps,
                hidden,
                cache.len(),
                self.hidden_size
            )));
        }

        let hs = self.hidden_size;
        let mut d_x = Array3::zeros((batch, steps, self.input_size()));
        let mut grad_w_x = Array2::zeros(self.w_x.raw_dim());
        let mut grad_w_h = Array2::zeros(self.w_h.raw_dim());
        let mut grad_b = Array1::zeros(self.b.raw_dim());
        let mut dh_next = Array2::zeros((batch, hs));
        let mut dc_next = Array2::zeros((batch, hs));

        for (t, step) in cache.iter().enumerate().rev() {
            let dh = &d_out.slice(s![.., t, ..]) + &dh_next;

            let d_o = &dh * &step.tanh_c;
            let dc = &dh * &step.o * &step.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;
            let d_f = &dc * &step.c_prev;
            let d_i = &dc * &step.g;
            let d_g = &dc * &step.i;
            dc_next = &dc * &step.f;

            let mut dz = Array2::zeros((batch, 4 * hs));
            dz.slice_mut(s![.., 0..hs])
                .assign(&(d_i * &step.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., hs..2 * hs])
                .assign(&(d_f * &step.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * hs..3 * hs])
                .assign(&(d_g * &step.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * hs..])
                .assign(&(d_o * &step.o.mapv(|v| v * (1.0 - v))));

            grad_w_x += &step.x.t().dot(&dz);
            grad_w_h += &step.h_prev.t().dot(&dz);
            grad_b += &dz.sum_axis(Axis(0));

            d_x.slice_mut(s![.., t, ..]).assign(&dz.dot(&self.w_x.t()));
            dh_next = dz.dot(&self.w_h.t());
        }

        self.grad_w_x = grad_w_x;
        self.grad_w_h = grad_w_h;
        self.grad_b = grad_b;
        Ok(d_x)
    }

    pub fn apply_gradients(&mut self, adam: &Adam) {
        adam.update(&mut self.w_x, &self.grad_w_x, &mut self.adam_w_x);
        adam.update(&mut self.w_h, &self.grad_w_h, &mut self.adam_w_h);
        adam.update(&mut self.b, &self.grad_b, &mut self.adam_b);
    }

    pub fn reset_optimizer(&mut self) {
        self.adam_w_x.reset();
        self.adam_w_h.reset();
        self.adam_b.reset();
    }

    /// `(dW_x, dW_h, db)` from the last `backward`
    pub fn gradients(&self) -> (&Array2<f64>, &Array2<f64>, &Array1<f64>) {
        (&self.grad_w_x, &self.grad_w_h, &self.grad_b)
    }
}
