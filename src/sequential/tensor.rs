use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rand::Rng;
use rand_distr::{Normal, Distribution};
use rayon::prelude::*;
use std::fmt;
use serde::{Serialize, Deserialize, Serializer, Deserializer};

pub struct Tensor {
    pub data: Arc<RwLock<Vec<f32>>>,
    pub shape: Vec<usize>,
    pub strides: Vec<usize>
}

impl Tensor {
    pub fn zeros(shape: Vec<usize>) -> Self {
        let data: Vec<f32> = vec![0.0; shape.iter().product()];
        Self::from_vec(data, shape)
    }

    // samples from N(0, std^2)
    pub fn random<R: Rng + ?Sized>(shape: Vec<usize>, std: f32, rng: &mut R) -> Self {
        let normal = Normal::new(0.0, std).expect("standard deviation must be finite and non-negative");
        let data: Vec<f32> = (0..shape.iter().product()).map(|_| normal.sample(rng)).collect();
        Self::from_vec(data, shape)
    }

    pub fn from_vec(data: Vec<f32>, shape: Vec<usize>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>(), "data length does not match shape");
        Self {
            data: Arc::new(RwLock::new(data)),
            strides: Tensor::calc_strides(&shape),
            shape
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    // shares the underlying buffer, only strides are swapped
    pub fn transpose(&self) -> Self {
        let mut new_shape = self.shape.clone();
        new_shape.reverse();
        let mut new_strides = self.strides.clone();
        new_strides.reverse();

        Self {
            data: Arc::clone(&self.data),
            shape: new_shape,
            strides: new_strides
        }
    }

    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape.len(), 2, "self must be a 2D tensor.");
        assert_eq!(other.shape.len(), 2, "other must be a 2D tensor.");
        assert_eq!(self.shape[1], other.shape[0], "self columns must equal other rows");

        let k = self.shape[1];
        let n = other.shape[1];

        let c = Tensor::zeros(vec![self.shape[0], n]);
        if n == 0 {
            return c;
        }

        let a_data = self.read();
        let b_data = other.read();

        {
            let mut c_data_guard = c.write();
            let c_slice: &mut [f32] = &mut c_data_guard;

            c_slice.par_chunks_mut(n).enumerate().for_each(|(m_idx, c_row)| {
                for k_idx in 0..k {
                    let a_val = a_data[m_idx * self.strides[0] + k_idx * self.strides[1]];
                    for n_idx in 0..n {
                        let b_val = b_data[k_idx * other.strides[0] + n_idx * other.strides[1]];
                        c_row[n_idx] += a_val * b_val;
                    }
                }
            });
        }

        c
    }

    // column sums, shape [1, n]
    pub fn sum_rows(&self) -> Tensor {
        assert_eq!(self.shape.len(), 2, "sum_rows only works for 2D tensors");

        let n = self.cols();
        let data = self.read();
        let totals = data.par_chunks(n.max(1)).map(|row_slice| {
            row_slice.to_vec()
        }).reduce(
            || vec![0.0; n],
            |mut acc, row| {
                for (a, r) in acc.iter_mut().zip(row.iter()) {
                    *a += r;
                }
                acc
            }
        );

        Tensor::from_vec(totals, vec![1, n])
    }

    pub fn row(&self, index: usize) -> Vec<f32> {
        let n = self.cols();
        let start = index * self.strides[0];
        self.read()[start..start + n].to_vec()
    }

    // per-row maximum, used for the bootstrap estimate
    pub fn max_rows(&self) -> Vec<f32> {
        let n = self.cols();
        self.read()
            .chunks(n)
            .map(|row| row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b)))
            .collect()
    }

    // per-row index of the largest entry, first one wins on ties
    pub fn argmax_rows(&self) -> Vec<usize> {
        let n = self.cols();
        self.read()
            .chunks(n)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
                    .0
            })
            .collect()
    }

    pub fn map<F>(&self, f: F) -> Tensor
    where F: Fn(f32) -> f32 + Sync + Send {
        let input_data = self.read();
        let new_data: Vec<f32> = input_data.par_iter().map(|&x| f(x)).collect();
        Tensor::from_vec(new_data, self.shape.clone())
    }

    // map through self allowing access to second tensor
    pub fn map2<F>(&self, other: &Tensor, f: F) -> Tensor
    where F: Fn(f32, f32) -> f32 + Sync + Send {
        assert_eq!(self.shape, other.shape, "tensors must have the same shape");

        let data1 = self.read();
        let data2 = other.read();
        let new_data: Vec<f32> = data1.par_iter().zip(data2.par_iter()).map(|(&x1, &x2)| f(x1, x2)).collect();
        Tensor::from_vec(new_data, self.shape.clone())
    }

    pub fn deep_clone(&self) -> Tensor {
        let data_clone = self.read().clone();
        Tensor::from_vec(data_clone, self.shape.clone())
    }

    fn calc_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides: Vec<usize> = vec![1; shape.len()];
        for i in (0..strides.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }
}

impl Clone for Tensor {
    // shallow: clones share storage, use deep_clone for an independent copy
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            shape: self.shape.clone(),
            strides: self.strides.clone()
        }
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && *self.read() == *other.read()
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
         .field("shape", &self.shape)
         .field("data", &*self.read())
         .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct SerializableTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Serialize for Tensor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        let s_tensor = SerializableTensor {
            shape: self.shape.clone(),
            data: self.read().clone()
        };
        s_tensor.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tensor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let s_tensor = SerializableTensor::deserialize(deserializer)?;
        if s_tensor.data.len() != s_tensor.shape.iter().product::<usize>() {
            return Err(serde::de::Error::custom("tensor data length does not match shape"));
        }
        Ok(Tensor::from_vec(s_tensor.data, s_tensor.shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_vec_approx_eq(a: &[f32], b: &[f32]) {
        let tolerance = 1e-5;
        assert_eq!(a.len(), b.len(), "vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < tolerance, "mismatch at index {}: {} vs {}", i, x, y);
        }
    }

    fn reference_matmul(a: &Tensor, b: &Tensor) -> Vec<f32> {
        let m = a.shape[0];
        let k = a.shape[1];
        let n = b.shape[1];
        let mut result = vec![0.0; m * n];
        let a_data = a.read();
        let b_data = b.read();

        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0;
                for l in 0..k {
                    sum += a_data[i * a.strides[0] + l * a.strides[1]] * b_data[l * b.strides[0] + j * b.strides[1]];
                }
                result[i * n + j] = sum;
            }
        }
        result
    }

    #[test]
    fn test_random_is_reproducible_with_seed() {
        let a = Tensor::random(vec![11, 4], 0.3, &mut StdRng::seed_from_u64(7));
        let b = Tensor::random(vec![11, 4], 0.3, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.read().len(), 44);
        assert_eq!(a, b);
    }

    #[test]
    fn test_strides() {
        assert_eq!(Tensor::calc_strides(&[1, 2, 3, 4]), vec![24, 12, 4, 1]);
        assert_eq!(Tensor::calc_strides(&[5]), vec![1]);
    }

    #[test]
    fn test_transpose_shares_storage() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let tt = t.transpose();
        assert_eq!(tt.shape, vec![3, 2]);
        assert_eq!(tt.strides, vec![1, 3]);
        assert_eq!((tt.rows(), tt.cols()), (3, 2));
        assert!(Arc::ptr_eq(&t.data, &tt.data));
    }

    #[test]
    fn test_matmul_simple() {
        // [[1, 2, 3], [4, 5, 6]] @ [[7, 8], [9, 10], [11, 12]]
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let b = Tensor::from_vec(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], vec![3, 2]);

        let c = a.matmul(&b);

        assert_eq!(c.shape, vec![2, 2]);
        assert_eq!(*c.read(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_transpose_against_reference() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = Tensor::random(vec![17, 11], 1.0, &mut rng);
        let b = Tensor::random(vec![17, 3], 1.0, &mut rng);

        // the shape of the weight gradient in a dense layer: input.T @ d_output
        let result = a.transpose().matmul(&b);
        let expected = reference_matmul(&a.transpose(), &b);

        assert_eq!(result.shape, vec![11, 3]);
        assert_vec_approx_eq(&result.read(), &expected);
    }

    #[test]
    fn test_sum_rows() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let s = t.sum_rows();

        assert_eq!(s.shape, vec![1, 3]);
        assert_vec_approx_eq(&s.read(), &[5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_row_reductions() {
        let t = Tensor::from_vec(vec![0.5, -1.0, 0.5, -3.0, -2.0, 4.0], vec![2, 3]);

        assert_eq!(t.max_rows(), vec![0.5, 4.0]);
        assert_eq!(t.argmax_rows(), vec![0, 2]);
        assert_eq!(t.row(1), vec![-3.0, -2.0, 4.0]);
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let t = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]);
        let copy = t.deep_clone();
        copy.write()[0] = 9.0;

        assert_eq!(*t.read(), vec![1.0, 2.0]);
        assert_eq!(*t.clone().read(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_map2_simple_add() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], vec![1, 3]);
        let b = Tensor::from_vec(vec![10.0, 20.0, 30.0], vec![1, 3]);
        let result = a.map2(&b, |x, y| x + y);

        assert_vec_approx_eq(&result.read(), &[11.0, 22.0, 33.0]);
    }

    #[test]
    #[should_panic]
    fn test_map2_shape_mismatch() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], vec![1, 3]);
        let b = Tensor::from_vec(vec![10.0, 20.0], vec![1, 2]);
        a.map2(&b, |x, y| x + y);
    }
}
