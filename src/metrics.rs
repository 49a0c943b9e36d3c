//! Similarity and distance metrics over embedding vectors

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(Error::EmptyVector);
    }
    Ok(())
}

/// Compute cosine similarity between two vectors
///
/// Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Compute euclidean (L2) distance between two vectors
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt())
}

/// Compute manhattan (L1) distance between two vectors
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum())
}

/// All three metrics for one pair of vectors
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub cosine_similarity: f32,
    pub euclidean_distance: f32,
    pub manhattan_distance: f32,
}

impl Metrics {
    pub fn compute(a: &[f32], b: &[f32]) -> Result<Self> {
        Ok(Metrics {
            cosine_similarity: cosine_similarity(a, b)?,
            euclidean_distance: euclidean_distance(a, b)?,
            manhattan_distance: manhattan_distance(a, b)?,
        })
    }
}

/// Euclidean distance treated as the far end of the scale
pub const EUCLIDEAN_SCALE: f32 = 2.0;

/// Manhattan distance treated as the far end of the scale
pub const MANHATTAN_SCALE: f32 = 4.0;

/// Coarse reading of a similarity score or a distance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBand {
    VerySimilar,
    Similar,
    SomewhatSimilar,
    Dissimilar,
}

impl SimilarityBand {
    pub fn from_cosine(similarity: f32) -> Self {
        if similarity >= 0.8 {
            SimilarityBand::VerySimilar
        } else if similarity >= 0.6 {
            SimilarityBand::Similar
        } else if similarity >= 0.4 {
            SimilarityBand::SomewhatSimilar
        } else {
            SimilarityBand::Dissimilar
        }
    }

    /// Lower is closer; cut at a quarter, half and three quarters of `scale`
    pub fn from_distance(distance: f32, scale: f32) -> Self {
        if distance <= scale * 0.25 {
            SimilarityBand::VerySimilar
        } else if distance <= scale * 0.5 {
            SimilarityBand::Similar
        } else if distance <= scale * 0.75 {
            SimilarityBand::SomewhatSimilar
        } else {
            SimilarityBand::Dissimilar
        }
    }

    pub fn from_euclidean(distance: f32) -> Self {
        Self::from_distance(distance, EUCLIDEAN_SCALE)
    }

    pub fn from_manhattan(distance: f32) -> Self {
        Self::from_distance(distance, MANHATTAN_SCALE)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SimilarityBand::VerySimilar => "very similar",
            SimilarityBand::Similar => "similar",
            SimilarityBand::SomewhatSimilar => "somewhat similar",
            SimilarityBand::Dissimilar => "dissimilar",
        }
    }
}
