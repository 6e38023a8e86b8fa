// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Mini-batch training with Adam and early stopping.
//
// Per epoch:
//   1. Training phase on Autodiff<InferBackend> (dropout active):
//      forward → binary cross-entropy → backward → Adam step
//   2. Validation phase on the inner backend via model.valid()
//      (dropout disabled, no gradients)
//   3. Early-stopping check on the validation loss
//
// Early stopping:
//   The weights from the epoch with the lowest validation loss
//   are kept. After `patience` epochs in a row without a strict
//   improvement the loop stops, and the best weights are what the
//   caller gets back. Without a validation set the loop runs all
//   epochs and returns the final weights.
//
// Adam uses the Keras defaults: lr=1e-3, β1=0.9, β2=0.999, ε=1e-7.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::path::PathBuf;

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::ElementConversion,
};
use serde::{Deserialize, Serialize};

use crate::data::{batcher::PostBatcher, dataset::PostDataset, splitter::SplitStrategy};
use crate::domain::error::PipelineError;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{count_correct, DisasterClassifier};
use crate::ml::{InferBackend, InferDevice, TrainBackend};

// ─── Training Options ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    /// Fraction of samples held out for validation, in [0, 1)
    pub validation_split: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Epochs without validation improvement before stopping
    pub patience: usize,
    /// Seeds weight initialisation, dropout and batch order
    pub seed: u64,
    pub split: SplitStrategy,
    /// Append per-epoch metrics to this CSV file when set
    pub metrics_csv: Option<PathBuf>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            validation_split: 0.2,
            epochs: 20,
            batch_size: 32,
            learning_rate: 1e-3,
            patience: 3,
            seed: 42,
            split: SplitStrategy::Tail,
            metrics_csv: None,
        }
    }
}

impl TrainingOptions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PipelineError::Validation(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if self.epochs == 0 || self.batch_size == 0 || self.patience == 0 {
            return Err(PipelineError::Validation(
                "epochs, batch_size and patience must be positive".to_string(),
            ));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(PipelineError::Validation(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

// ─── Training History ─────────────────────────────────────────────────────────
/// Per-epoch diagnostics returned to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    /// Epoch whose weights were kept, when a validation set existed
    pub best_epoch: Option<usize>,
    pub stopped_early: bool,
}

// ─── Early Stopping ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Continue,
    Stop,
}

/// Tracks the best validation loss and a snapshot taken at that epoch.
pub struct EarlyStopping<S> {
    patience: usize,
    best_loss: f64,
    best_epoch: Option<usize>,
    best: Option<S>,
    wait: usize,
}

impl<S> EarlyStopping<S> {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss: f64::INFINITY,
            best_epoch: None,
            best: None,
            wait: 0,
        }
    }

    /// Record one epoch's validation loss. `snapshot` is only called
    /// when the loss strictly improves.
    pub fn observe(&mut self, epoch: usize, loss: f64, snapshot: impl FnOnce() -> S) -> StopDecision {
        if loss < self.best_loss {
            self.best_loss = loss;
            self.best_epoch = Some(epoch);
            self.best = Some(snapshot());
            self.wait = 0;
            return StopDecision::Continue;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            StopDecision::Stop
        } else {
            StopDecision::Continue
        }
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn into_best(self) -> Option<S> {
        self.best
    }
}

// ─── Training Loop ────────────────────────────────────────────────────────────
pub fn run_training(
    opts: &TrainingOptions,
    mut model: DisasterClassifier<TrainBackend>,
    train_dataset: PostDataset,
    val_dataset: PostDataset,
    device: &InferDevice,
) -> Result<(DisasterClassifier<InferBackend>, TrainingHistory), PipelineError> {
    let train_count = train_dataset.sample_count();
    let val_count = val_dataset.sample_count();
    tracing::info!(
        "Training on {} posts, validating on {} (batch_size={}, epochs={})",
        train_count,
        val_count,
        opts.batch_size,
        opts.epochs
    );

    let metrics_logger = opts
        .metrics_csv
        .as_ref()
        .map(MetricsLogger::new)
        .transpose()
        .map_err(|e| PipelineError::Training(format!("cannot open metrics CSV: {e}")))?;

    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    let train_loader = DataLoaderBuilder::new(PostBatcher::<TrainBackend>::new(device.clone()))
        .batch_size(opts.batch_size)
        .shuffle(opts.seed)
        .num_workers(1)
        .build(train_dataset);

    // Validation runs on the inner backend, no autodiff overhead
    let val_loader = (val_count > 0).then(|| {
        DataLoaderBuilder::new(PostBatcher::<InferBackend>::new(device.clone()))
            .batch_size(opts.batch_size)
            .num_workers(1)
            .build(val_dataset)
    });

    let mut stopper = EarlyStopping::new(opts.patience);
    let mut history = TrainingHistory::default();

    for epoch in 1..=opts.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;

        for batch in train_loader.iter() {
            let batch_len = batch.labels.dims()[0];
            let (loss, logits) = model.forward_loss(batch.input_ids, batch.labels.clone());

            loss_sum += loss.clone().into_scalar().elem::<f64>() * batch_len as f64;
            correct += count_correct(logits.detach(), batch.labels);
            seen += batch_len;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(opts.learning_rate, model, grads);
        }

        let train_loss = ratio(loss_sum, seen);
        let train_accuracy = ratio(correct as f64, seen);

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let (val_loss, val_accuracy) = match &val_loader {
            Some(loader) => {
                let mut loss_sum = 0.0f64;
                let mut correct = 0usize;
                let mut seen = 0usize;

                for batch in loader.iter() {
                    let batch_len = batch.labels.dims()[0];
                    let (loss, logits) =
                        model_valid.forward_loss(batch.input_ids, batch.labels.clone());
                    loss_sum += loss.into_scalar().elem::<f64>() * batch_len as f64;
                    correct += count_correct(logits, batch.labels);
                    seen += batch_len;
                }

                (Some(ratio(loss_sum, seen)), Some(ratio(correct as f64, seen)))
            }
            None => (None, None),
        };

        let metrics = EpochMetrics::new(epoch, train_loss, train_accuracy, val_loss, val_accuracy);
        tracing::info!(
            "Epoch {:>3}/{} | loss={:.4} | acc={:.1}% | val_loss={} | val_acc={}",
            epoch,
            opts.epochs,
            train_loss,
            train_accuracy * 100.0,
            val_loss.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into()),
            val_accuracy
                .map(|v| format!("{:.1}%", v * 100.0))
                .unwrap_or_else(|| "-".into()),
        );

        if let Some(logger) = &metrics_logger {
            logger
                .log(&metrics)
                .map_err(|e| PipelineError::Training(format!("cannot write metrics: {e}")))?;
        }
        history.epochs.push(metrics);

        if let Some(val_loss) = val_loss {
            if stopper.observe(epoch, val_loss, || model_valid.clone()) == StopDecision::Stop {
                tracing::info!(
                    "Early stopping after epoch {} (best epoch {:?})",
                    epoch,
                    stopper.best_epoch()
                );
                history.stopped_early = true;
                break;
            }
        }
    }

    history.best_epoch = stopper.best_epoch();
    let final_model = match stopper.into_best() {
        Some(best) => best,
        None => model.valid(),
    };

    tracing::info!("Training complete!");
    Ok((final_model, history))
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count > 0 {
        numerator / count as f64
    } else {
        f64::NAN
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_after_patience_epochs_without_improvement() {
        let mut es = EarlyStopping::new(3);
        let losses = [0.9, 0.8, 0.85, 0.81, 0.80];
        let decisions: Vec<StopDecision> = losses
            .iter()
            .enumerate()
            .map(|(i, &l)| es.observe(i + 1, l, || i + 1))
            .collect();

        assert_eq!(
            decisions,
            vec![
                StopDecision::Continue,
                StopDecision::Continue,
                StopDecision::Continue,
                StopDecision::Continue,
                // 0.80 ties the best; ties are not improvements
                StopDecision::Stop,
            ]
        );
        assert_eq!(es.best_epoch(), Some(2));
        assert_eq!(es.into_best(), Some(2));
    }

    #[test]
    fn test_improvement_resets_patience() {
        let mut es = EarlyStopping::new(2);
        assert_eq!(es.observe(1, 1.0, || 1), StopDecision::Continue);
        assert_eq!(es.observe(2, 1.1, || 2), StopDecision::Continue);
        assert_eq!(es.observe(3, 0.5, || 3), StopDecision::Continue);
        assert_eq!(es.observe(4, 0.6, || 4), StopDecision::Continue);
        assert_eq!(es.observe(5, 0.7, || 5), StopDecision::Stop);
        assert_eq!(es.into_best(), Some(3));
    }

    #[test]
    fn test_nan_loss_is_never_an_improvement() {
        let mut es: EarlyStopping<u8> = EarlyStopping::new(1);
        assert_eq!(es.observe(1, f64::NAN, || 1), StopDecision::Stop);
        assert!(es.into_best().is_none());
    }

    #[test]
    fn test_run_training_stops_early_and_returns_best_weights() {
        use crate::data::dataset::PostSample;
        use burn::data::dataloader::batcher::Batcher;

        // Validation repeats the training inputs with the labels
        // flipped, so fitting the training set soon makes validation
        // loss climb.
        let inputs = [[2, 3, 0, 0], [4, 5, 0, 0], [6, 7, 0, 0], [8, 9, 0, 0]];
        let samples = |flip: u8| -> Vec<PostSample> {
            inputs
                .iter()
                .enumerate()
                .map(|(i, ids)| PostSample {
                    input_ids: ids.to_vec(),
                    label: (i % 2) as u8 ^ flip,
                })
                .collect()
        };
        let val = samples(1);

        let opts = TrainingOptions {
            epochs: 30,
            batch_size: 4,
            learning_rate: 0.05,
            patience: 2,
            ..Default::default()
        };
        let device = InferDevice::default();
        TrainBackend::seed(opts.seed);
        let model = crate::ml::model::tiny_config(20, 4).init::<TrainBackend>(&device);

        let (best_model, history) = run_training(
            &opts,
            model,
            PostDataset::new(samples(0)),
            PostDataset::new(val.clone()),
            &device,
        )
        .unwrap();

        assert!(history.stopped_early);
        let val_losses: Vec<f64> = history.epochs.iter().map(|m| m.val_loss.unwrap()).collect();
        let (best_index, best_loss) = val_losses
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |acc, (i, l)| if l < acc.1 { (i, l) } else { acc });
        assert_eq!(history.best_epoch, Some(best_index + 1));
        assert_eq!(history.epochs.len(), best_index + 1 + opts.patience);

        let batch = PostBatcher::<InferBackend>::new(device).batch(val);
        let (loss, _) = best_model.forward_loss(batch.input_ids, batch.labels);
        let returned_loss = loss.into_scalar().elem::<f64>();
        assert!((returned_loss - best_loss).abs() < 1e-5);

        let last_loss = *val_losses.last().unwrap();
        assert!(last_loss > best_loss);
        assert!((returned_loss - last_loss).abs() > 1e-6);
    }

    #[test]
    fn test_option_validation() {
        assert!(TrainingOptions::default().validate().is_ok());

        let bad_split = TrainingOptions { validation_split: 1.0, ..Default::default() };
        assert!(matches!(bad_split.validate(), Err(PipelineError::Validation(_))));

        let no_epochs = TrainingOptions { epochs: 0, ..Default::default() };
        assert!(no_epochs.validate().is_err());
    }
}
