pub mod tensor;
pub mod layer;
pub mod loss;
pub mod optimizer;

use tensor::Tensor;
use layer::{Layer, Dense, ReLU};
use loss::Loss;
use optimizer::Optimizer;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

#[derive(Serialize, Deserialize)]
pub struct Sequential {
    pub layers: Vec<Box<dyn Layer>>,
    pub loss: Box<dyn Loss>,
    pub optimizer: Box<dyn Optimizer>
}

impl Sequential {
    pub fn new(layers: Vec<Box<dyn Layer>>, loss: Box<dyn Loss>, optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            layers,
            loss,
            optimizer
        }
    }

    // dense -> relu -> dense
    pub fn two_layer<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        loss: Box<dyn Loss>,
        optimizer: Box<dyn Optimizer>,
        rng: &mut R
    ) -> Self {
        let layers: Vec<Box<dyn Layer>> = vec![
            Box::new(Dense::new(input_size, hidden_size, rng)),
            Box::new(ReLU::new()),
            Box::new(Dense::new(hidden_size, output_size, rng))
        ];
        Self::new(layers, loss, optimizer)
    }

    pub fn predict(&mut self, input: &Tensor) -> Tensor {
        let mut output = input.clone();
        for layer in &mut self.layers {
            output = layer.forward(&output);
        }
        output
    }

    // one forward/backward pass and a single optimizer step, returns the loss before the step
    pub fn train_on_batch(&mut self, x_batch: &Tensor, y_batch: &Tensor) -> f32 {
        let y_pred = self.predict(x_batch);
        let loss = self.loss.calculate(&y_pred, y_batch);

        let mut d_output = self.loss.gradient(&y_pred, y_batch);
        for layer in self.layers.iter_mut().rev() {
            d_output = layer.backward(&d_output);
        }
        self.optimizer.step(&mut self.layers);

        loss
    }

    pub fn dense_layers(&self) -> impl Iterator<Item = &Dense> {
        self.layers.iter().filter_map(|layer| layer.as_any().downcast_ref::<Dense>())
    }

    pub fn input_size(&self) -> Option<usize> {
        self.dense_layers().next().map(Dense::input_size)
    }

    pub fn output_size(&self) -> Option<usize> {
        self.dense_layers().last().map(Dense::output_size)
    }

    /// Writes the whole model (parameters and optimizer state) to `path`,
    /// replacing any previous checkpoint. Parent directories are created.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::io("create model directory", parent, source))?;
        }
        let file = File::create(path).map_err(|source| Error::io("create model file", path, source))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush().map_err(|source| Error::io("write model file", path, source))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::io("open model file", path, source))?;
        let model = bincode::deserialize_from(BufReader::new(file))?;
        Ok(model)
    }
}
