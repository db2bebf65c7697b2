use super::tensor::Tensor;
use serde::{Serialize, Deserialize};

#[typetag::serde(tag = "type")]
pub trait Loss {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32;
    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor;
}


// mean squared error, averaged over every entry of the batch

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct MeanSquaredError;

#[typetag::serde]
impl Loss for MeanSquaredError {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32 {
        let count = y_pred.read().len().max(1) as f32;
        let diff = y_pred.map2(y_true, |pred_x, true_x| pred_x - true_x);
        diff.read().iter().map(|x| x * x).sum::<f32>() / count
    }

    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor {
        let count = y_pred.read().len().max(1) as f32;
        y_pred.map2(y_true, move |pred_x, true_x| 2.0 * (pred_x - true_x) / count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_approx_eq(a: &[f32], b: &[f32]) {
        let tolerance = 1e-6;
        assert_eq!(a.len(), b.len(), "vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < tolerance, "mismatch at index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_mse_averages_over_all_entries() {
        let y_pred = Tensor::from_vec(vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0], vec![2, 3]);
        let y_true = Tensor::from_vec(vec![1.0, 0.0, 3.0, 0.0, 0.0, 1.0], vec![2, 3]);

        // squared errors: 0, 4, 0, 0, 0, 1 -> 5 / 6
        let loss = MeanSquaredError.calculate(&y_pred, &y_true);
        assert!((loss - 5.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_mse_gradient() {
        let y_pred = Tensor::from_vec(vec![1.0, 2.0, 3.0, 0.0], vec![2, 2]);
        let y_true = Tensor::from_vec(vec![1.0, 0.0, 4.0, 0.0], vec![2, 2]);

        // 2 * (pred - true) / 4
        let gradient = MeanSquaredError.gradient(&y_pred, &y_true);
        assert_vec_approx_eq(&gradient.read(), &[0.0, 1.0, -0.5, 0.0]);
    }

    #[test]
    fn test_mse_zero_when_equal() {
        let y = Tensor::from_vec(vec![0.3, -0.7, 1.5], vec![1, 3]);
        assert_eq!(MeanSquaredError.calculate(&y, &y.deep_clone()), 0.0);
    }
}
