//! Small dense feed-forward networks trained with mini-batch SGD.
//!
//! Weights live in `nalgebra` matrices; the forward pass and backpropagation
//! are matrix-vector products over one sample at a time.

use nalgebra::{DMatrix, DVector};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};
use crate::rng::RandomNumberGenerator;

/// Per-element gradient bound.
pub const GRADIENT_CLIP: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Tanh,
    Linear,
}

impl Activation {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Relu => x.max(0.0),
            Self::Tanh => x.tanh(),
            Self::Linear => x,
        }
    }

    /// Derivative expressed through the activation's output.
    fn derivative(self, output: f64) -> f64 {
        match self {
            Self::Relu => {
                if output > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Tanh => 1.0 - output * output,
            Self::Linear => 1.0,
        }
    }
}

/// Shape of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: Activation,
    /// Fraction of this layer's outputs dropped while training.
    pub dropout: f64,
}

impl LayerSpec {
    pub fn new(units: usize, activation: Activation) -> Self {
        Self {
            units,
            activation,
            dropout: 0.0,
        }
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    /// `units × inputs`; entry `(o, i)` connects input `i` to output `o`.
    weights: DMatrix<f64>,
    biases: DVector<f64>,
    activation: Activation,
    dropout: f64,
}

impl DenseLayer {
    /// Xavier-uniform weights, zero biases.
    fn new(inputs: usize, spec: LayerSpec, rng: &mut RandomNumberGenerator) -> Self {
        let limit = (6.0 / (inputs + spec.units) as f64).sqrt();
        let weights = DMatrix::from_fn(spec.units, inputs, |_, _| (rng.unit() * 2.0 - 1.0) * limit);

        Self {
            weights,
            biases: DVector::zeros(spec.units),
            activation: spec.activation,
            dropout: spec.dropout,
        }
    }

    fn units(&self) -> usize {
        self.biases.len()
    }

    fn forward(&self, input: &DVector<f64>) -> DVector<f64> {
        let activation = self.activation;
        (&self.weights * input + &self.biases).map(|z| activation.apply(z))
    }

    /// Inverted dropout mask: kept units are scaled so inference needs no
    /// rescaling.
    fn dropout_mask(&self, rng: &mut RandomNumberGenerator) -> DVector<f64> {
        if self.dropout <= 0.0 {
            return DVector::from_element(self.units(), 1.0);
        }
        let keep = 1.0 - self.dropout;
        DVector::from_fn(self.units(), |_, _| if rng.chance(keep) { 1.0 / keep } else { 0.0 })
    }
}

#[derive(Debug, Clone)]
struct Gradients {
    weights: Vec<DMatrix<f64>>,
    biases: Vec<DVector<f64>>,
}

impl Gradients {
    fn zeros(layers: &[DenseLayer]) -> Self {
        Self {
            weights: layers
                .iter()
                .map(|l| DMatrix::zeros(l.weights.nrows(), l.weights.ncols()))
                .collect(),
            biases: layers.iter().map(|l| DVector::zeros(l.units())).collect(),
        }
    }
}

/// Copies `values` into a vector of exactly `len` entries; missing entries
/// read as zero and extra ones are ignored.
fn column(values: &[f64], len: usize) -> DVector<f64> {
    DVector::from_fn(len, |i, _| values.get(i).copied().unwrap_or(0.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    input_size: usize,
    layers: Vec<DenseLayer>,
}

impl Network {
    /// # Errors
    ///
    /// Returns `OptimizerError::Configuration` for a zero-sized input or
    /// layer, no layers, or a dropout rate outside `[0, 1)`.
    pub fn new(input_size: usize, specs: &[LayerSpec], rng: &mut RandomNumberGenerator) -> Result<Self> {
        if input_size == 0 || specs.is_empty() || specs.iter().any(|s| s.units == 0) {
            return Err(OptimizerError::Configuration(
                "Networks need a non-empty input and at least one non-empty layer".to_string(),
            ));
        }
        if specs.iter().any(|s| !(0.0..1.0).contains(&s.dropout)) {
            return Err(OptimizerError::Configuration(
                "Dropout must be in [0, 1)".to_string(),
            ));
        }

        let mut inputs = input_size;
        let layers = specs
            .iter()
            .map(|spec| {
                let layer = DenseLayer::new(inputs, *spec, rng);
                inputs = spec.units;
                layer
            })
            .collect();

        Ok(Self { input_size, layers })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::units)
    }

    /// Inference pass; dropout is inactive.
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        self.forward(&column(input, self.input_size))
            .as_slice()
            .to_vec()
    }

    fn forward(&self, input: &DVector<f64>) -> DVector<f64> {
        self.layers
            .iter()
            .fold(input.clone(), |activations, layer| layer.forward(&activations))
    }

    /// Mean squared error over `rows`.
    pub fn loss(&self, rows: &[(Vec<f64>, Vec<f64>)]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        rows.iter()
            .map(|(input, target)| mse(&self.predict(input), target))
            .sum::<f64>()
            / rows.len() as f64
    }

    /// Runs `epochs` passes of shuffled mini-batch SGD and returns the final
    /// training loss.
    pub fn fit(
        &mut self,
        rows: &[(Vec<f64>, Vec<f64>)],
        epochs: usize,
        batch_size: usize,
        learning_rate: f64,
        rng: &mut RandomNumberGenerator,
    ) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }

        let outputs = self.output_size();
        let samples: Vec<(DVector<f64>, DVector<f64>)> = rows
            .iter()
            .map(|(input, target)| (column(input, self.input_size), column(target, outputs)))
            .collect();

        let mut order: Vec<usize> = (0..samples.len()).collect();
        for _ in 0..epochs {
            order.shuffle(&mut rng.rng);
            for batch in order.chunks(batch_size.max(1)) {
                let batch: Vec<&(DVector<f64>, DVector<f64>)> =
                    batch.iter().map(|&i| &samples[i]).collect();
                self.train_batch(&batch, learning_rate, rng);
            }
        }

        self.loss(rows)
    }

    fn train_batch(
        &mut self,
        batch: &[&(DVector<f64>, DVector<f64>)],
        learning_rate: f64,
        rng: &mut RandomNumberGenerator,
    ) {
        let mut gradients = Gradients::zeros(&self.layers);
        for (input, target) in batch {
            self.accumulate(input, target, &mut gradients, rng);
        }

        let scale = 1.0 / batch.len() as f64;
        let clip = |g: f64| g.clamp(-GRADIENT_CLIP, GRADIENT_CLIP);
        for ((layer, weights), biases) in self
            .layers
            .iter_mut()
            .zip(&gradients.weights)
            .zip(&gradients.biases)
        {
            layer.weights -= (weights * scale).map(clip) * learning_rate;
            layer.biases -= (biases * scale).map(clip) * learning_rate;
        }
    }

    /// Backpropagates one sample into `gradients`.
    fn accumulate(
        &self,
        input: &DVector<f64>,
        target: &DVector<f64>,
        gradients: &mut Gradients,
        rng: &mut RandomNumberGenerator,
    ) {
        // activations[0] is the input; activations[l + 1] the masked output of layer l.
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.clone());
        let mut outputs = Vec::with_capacity(self.layers.len());
        let mut masks = Vec::with_capacity(self.layers.len());

        for (l, layer) in self.layers.iter().enumerate() {
            let output = layer.forward(&activations[l]);
            let mask = layer.dropout_mask(rng);
            activations.push(output.component_mul(&mask));
            outputs.push(output);
            masks.push(mask);
        }

        let n = target.len().max(1) as f64;
        let mut delta = (&activations[self.layers.len()] - target) * (2.0 / n);

        for (l, layer) in self.layers.iter().enumerate().rev() {
            let activation = layer.activation;
            let dz = delta
                .component_mul(&masks[l])
                .component_mul(&outputs[l].map(|y| activation.derivative(y)));

            gradients.weights[l] += &dz * activations[l].transpose();
            gradients.biases[l] += &dz;

            delta = layer.weights.transpose() * &dz;
        }
    }
}

pub fn mse(prediction: &[f64], target: &[f64]) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    prediction
        .iter()
        .zip(target)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / target.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_rows() -> Vec<(Vec<f64>, Vec<f64>)> {
        (0..20)
            .map(|i| {
                let x = i as f64 / 10.0 - 1.0;
                (vec![x], vec![2.0 * x + 0.5])
            })
            .collect()
    }

    #[test]
    fn test_shapes() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let network = Network::new(
            14,
            &[
                LayerSpec::new(32, Activation::Relu).with_dropout(0.2),
                LayerSpec::new(16, Activation::Relu),
                LayerSpec::new(10, Activation::Linear),
            ],
            &mut rng,
        )
        .unwrap();

        assert_eq!(network.input_size(), 14);
        assert_eq!(network.output_size(), 10);
        assert_eq!(network.predict(&[0.1; 14]).len(), 10);
    }

    #[test]
    fn test_invalid_shapes() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        assert!(Network::new(0, &[LayerSpec::new(1, Activation::Linear)], &mut rng).is_err());
        assert!(Network::new(3, &[], &mut rng).is_err());
        assert!(Network::new(
            3,
            &[LayerSpec::new(2, Activation::Relu).with_dropout(1.0)],
            &mut rng
        )
        .is_err());
    }

    #[test]
    fn test_fit_reduces_loss_on_linear_target() {
        let mut rng = RandomNumberGenerator::from_seed(7);
        let mut network = Network::new(
            1,
            &[
                LayerSpec::new(8, Activation::Tanh),
                LayerSpec::new(1, Activation::Linear),
            ],
            &mut rng,
        )
        .unwrap();
        let rows = linear_rows();

        let before = network.loss(&rows);
        let after = network.fit(&rows, 300, 4, 0.05, &mut rng);

        assert!(after < before);
        assert!(after < 0.05, "loss after training: {}", after);
    }

    #[test]
    fn test_linear_layer_is_affine_map() {
        let mut rng = RandomNumberGenerator::from_seed(2);
        let mut network = Network::new(3, &[LayerSpec::new(2, Activation::Linear)], &mut rng).unwrap();
        network.layers[0].weights = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 2.0, -1.0, 0.5, 0.0]);
        network.layers[0].biases = DVector::from_vec(vec![0.5, 1.0]);

        assert_eq!(network.predict(&[1.0, 2.0, 3.0]), vec![7.5, 1.0]);
        // Missing inputs read as zero.
        assert_eq!(network.predict(&[1.0]), vec![1.5, 0.0]);
    }

    #[test]
    fn test_single_step_moves_against_gradient() {
        let mut rng = RandomNumberGenerator::from_seed(4);
        let mut network = Network::new(1, &[LayerSpec::new(1, Activation::Linear)], &mut rng).unwrap();
        network.layers[0].weights = DMatrix::from_element(1, 1, 0.0);
        network.layers[0].biases = DVector::zeros(1);
        let rows = vec![(vec![1.0], vec![1.0])];

        // d/dw (w + b - 1)^2 = -2 at w = b = 0.
        network.fit(&rows, 1, 1, 0.1, &mut rng);

        assert!((network.layers[0].weights[(0, 0)] - 0.2).abs() < 1e-12);
        assert!((network.layers[0].biases[0] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_activation() {
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert_eq!(Activation::Relu.apply(3.0), 3.0);
        assert_eq!(Activation::Linear.apply(-2.0), -2.0);
        assert!((Activation::Tanh.apply(0.5) - 0.5f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_mse() {
        assert_eq!(mse(&[1.0, 3.0], &[1.0, 1.0]), 2.0);
        assert_eq!(mse(&[], &[]), 0.0);
    }
}
