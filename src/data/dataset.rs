use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One encoded, padded training sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSample {
    pub input_ids: Vec<u32>,
    pub label: u8,
}

pub struct PostDataset {
    samples: Vec<PostSample>,
}

impl PostDataset {
    pub fn new(samples: Vec<PostSample>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<PostSample> for PostDataset {
    fn get(&self, index: usize) -> Option<PostSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
