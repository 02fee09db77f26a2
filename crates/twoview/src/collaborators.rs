//! Seams to the outside world: where correspondences and manual points come from.

use std::collections::{HashMap, VecDeque};

use twoview_linalg::Point2d;

use crate::types::{CorrespondenceSet, ImagePair};

/// Errors of the bundled collaborator implementations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// No correspondences are known for the pair.
    #[error("No correspondences for pair {0}")]
    UnknownPair(ImagePair),

    /// The picker ran out of scripted points for an image.
    #[error("Requested {requested} points in {image}, only {available} left")]
    Exhausted {
        /// Image the points were requested in.
        image: String,
        /// Number of requested points.
        requested: usize,
        /// Number of points still queued.
        available: usize,
    },
}

/// A source of matched points for image pairs, such as a feature matcher.
pub trait CorrespondenceProvider {
    /// Error type of the provider.
    type Error: std::error::Error;

    /// Correspondences between the two images of `pair`.
    fn correspondences(&mut self, pair: &ImagePair) -> Result<CorrespondenceSet, Self::Error>;
}

/// A source of manually selected points, such as an interactive viewer.
pub trait PointPicker {
    /// Error type of the picker.
    type Error: std::error::Error;

    /// Pick `count` points in `image`.
    fn pick(&mut self, image: &str, count: usize) -> Result<Vec<Point2d>, Self::Error>;
}

/// Serves correspondence sets loaded up front, for example from a table.
#[derive(Debug, Clone, Default)]
pub struct TableProvider {
    sets: HashMap<ImagePair, CorrespondenceSet>,
}

impl TableProvider {
    /// Index the sets by their image pair.
    pub fn new(sets: impl IntoIterator<Item = CorrespondenceSet>) -> Self {
        Self {
            sets: sets.into_iter().map(|s| (s.pair().clone(), s)).collect(),
        }
    }

    /// Known image pairs, in a stable order.
    pub fn pairs(&self) -> Vec<ImagePair> {
        let mut pairs: Vec<_> = self.sets.keys().cloned().collect();
        pairs.sort_by_key(|p| p.to_string());
        pairs
    }
}

impl CorrespondenceProvider for TableProvider {
    type Error = CollaboratorError;

    fn correspondences(&mut self, pair: &ImagePair) -> Result<CorrespondenceSet, Self::Error> {
        if let Some(set) = self.sets.get(pair) {
            return Ok(set.clone());
        }
        // answer the reversed request by swapping the stored set
        let reversed = ImagePair::new(pair.b.clone(), pair.a.clone());
        self.sets
            .get(&reversed)
            .map(CorrespondenceSet::swapped)
            .ok_or_else(|| CollaboratorError::UnknownPair(pair.clone()))
    }
}

/// Replays points queued per image, standing in for a human at a viewer.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPicker {
    queues: HashMap<String, VecDeque<Point2d>>,
}

impl ScriptedPicker {
    /// Create a picker with no queued points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue points to be returned for `image`.
    pub fn push(&mut self, image: impl Into<String>, points: impl IntoIterator<Item = Point2d>) {
        self.queues.entry(image.into()).or_default().extend(points);
    }

    /// Number of points still queued for `image`.
    pub fn remaining(&self, image: &str) -> usize {
        self.queues.get(image).map_or(0, VecDeque::len)
    }
}

impl PointPicker for ScriptedPicker {
    type Error = CollaboratorError;

    fn pick(&mut self, image: &str, count: usize) -> Result<Vec<Point2d>, Self::Error> {
        let available = self.remaining(image);
        if available < count {
            return Err(CollaboratorError::Exhausted {
                image: image.to_string(),
                requested: count,
                available,
            });
        }
        let queue = self.queues.entry(image.to_string()).or_default();
        Ok(queue.drain(..count).collect())
    }
}
