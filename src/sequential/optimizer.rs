use super::layer::{Layer, Dense};
use super::tensor::Tensor;
use serde::{Serialize, Deserialize};

#[typetag::serde(tag = "type")]
pub trait Optimizer {
    // consumes the gradients stored on each layer, leaving them zeroed
    fn step(&mut self, layers: &mut [Box<dyn Layer>]);
}


// Adam

#[derive(Serialize, Deserialize, Clone, Default)]
struct Moments {
    weights_m: Vec<f32>,
    weights_v: Vec<f32>,
    biases_m: Vec<f32>,
    biases_v: Vec<f32>
}

impl Moments {
    fn zeros(dense: &Dense) -> Self {
        let weights_len = dense.weights.read().len();
        let biases_len = dense.biases.read().len();
        Self {
            weights_m: vec![0.0; weights_len],
            weights_v: vec![0.0; weights_len],
            biases_m: vec![0.0; biases_len],
            biases_v: vec![0.0; biases_len]
        }
    }
}

#[derive(Clone, Copy)]
struct AdamStep {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    bias_correction1: f32,
    bias_correction2: f32
}

impl AdamStep {
    fn apply(&self, params: &Tensor, grads: &Tensor, m: &mut [f32], v: &mut [f32]) -> Tensor {
        let params_data = params.read();
        let grads_data = grads.read();

        let updated: Vec<f32> = params_data.iter()
            .zip(grads_data.iter())
            .zip(m.iter_mut().zip(v.iter_mut()))
            .map(|((&p, &g), (m_i, v_i))| {
                *m_i = self.beta1 * *m_i + (1.0 - self.beta1) * g;
                *v_i = self.beta2 * *v_i + (1.0 - self.beta2) * g * g;
                let m_hat = *m_i / self.bias_correction1;
                let v_hat = *v_i / self.bias_correction2;
                p - self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon)
            })
            .collect();

        Tensor::from_vec(updated, params.shape.clone())
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    step_count: u32,
    // one entry per dense layer, in network order
    moments: Vec<Moments>
}

impl Adam {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            step_count: 0,
            moments: Vec::new()
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }
}

#[typetag::serde]
impl Optimizer for Adam {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        self.step_count += 1;
        let t = self.step_count as i32;
        let hyper = AdamStep {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            bias_correction1: 1.0 - self.beta1.powi(t),
            bias_correction2: 1.0 - self.beta2.powi(t)
        };

        let dense_layers = layers.iter_mut().filter_map(|layer| layer.as_any_mut().downcast_mut::<Dense>());
        for (slot, dense_layer) in dense_layers.enumerate() {
            if self.moments.len() <= slot {
                self.moments.push(Moments::zeros(dense_layer));
            }
            let moments = &mut self.moments[slot];

            if let (Some(d_weights), Some(d_biases)) = (dense_layer.d_weights.take(), dense_layer.d_biases.take()) {
                let new_weights = hyper.apply(&dense_layer.weights, &d_weights, &mut moments.weights_m, &mut moments.weights_v);
                let new_biases = hyper.apply(&dense_layer.biases, &d_biases, &mut moments.biases_m, &mut moments.biases_v);

                dense_layer.weights = new_weights;
                dense_layer.biases = new_biases;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_approx_eq(a: &[f32], b: &[f32]) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6, "{} vs {}", x, y);
        }
    }

    fn dense_with_gradients() -> Dense {
        let mut dense_layer = Dense::from_parameters(
            Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]),
            Tensor::from_vec(vec![0.5, -0.5], vec![1, 2])
        );
        dense_layer.d_weights = Some(Tensor::from_vec(vec![2.0, -3.0, 0.0, 5.0], vec![2, 2]));
        dense_layer.d_biases = Some(Tensor::from_vec(vec![0.1, -0.1], vec![1, 2]));
        dense_layer
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        // after bias correction the first update is lr * g / (|g| + eps), i.e. lr * sign(g)
        let mut optimizer = Adam::new(0.1);
        let mut layers: Vec<Box<dyn Layer>> = vec![Box::new(dense_with_gradients())];
        optimizer.step(&mut layers);

        let updated = layers[0].as_any().downcast_ref::<Dense>().unwrap();
        assert_vec_approx_eq(&updated.weights.read(), &[0.9, 2.1, 3.0, 3.9]);
        assert_vec_approx_eq(&updated.biases.read(), &[0.4, -0.4]);
        assert_eq!(optimizer.step_count(), 1);
    }

    #[test]
    fn test_adam_consumes_gradients() {
        let mut optimizer = Adam::new(0.1);
        let mut layers: Vec<Box<dyn Layer>> = vec![Box::new(dense_with_gradients())];
        optimizer.step(&mut layers);
        let after_first = layers[0].as_any().downcast_ref::<Dense>().unwrap().weights.deep_clone();

        // no new backward pass, so the second step has nothing to apply
        optimizer.step(&mut layers);
        let dense_layer = layers[0].as_any().downcast_ref::<Dense>().unwrap();

        assert!(dense_layer.d_weights.is_none());
        assert_eq!(dense_layer.weights, after_first);
    }
}
