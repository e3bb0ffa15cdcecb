//! Owned keypoint collections for the two images being matched.
//!
//! The store validates descriptor dimensions once at construction so that the
//! matching stages can assume every descriptor pair has equal length. Stages
//! borrow the collections immutably and return their annotations as values.
use crate::types::Keypoint;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("keypoint {index} has an empty descriptor")]
    EmptyDescriptor { index: usize },
    #[error("keypoint {index} has descriptor length {found}, expected {expected}")]
    InconsistentDescriptor {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("descriptor length differs between collections: left {left}, right {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Keypoints of a single image sharing one descriptor length.
#[derive(Clone, Debug, Default)]
pub struct KeypointSet {
    keypoints: Vec<Keypoint>,
    descriptor_len: Option<usize>,
}

impl KeypointSet {
    pub fn new(keypoints: Vec<Keypoint>) -> Result<Self, StoreError> {
        let mut descriptor_len = None;
        for (index, kp) in keypoints.iter().enumerate() {
            let found = kp.descriptor.len();
            if found == 0 {
                return Err(StoreError::EmptyDescriptor { index });
            }
            match descriptor_len {
                None => descriptor_len = Some(found),
                Some(expected) if expected != found => {
                    return Err(StoreError::InconsistentDescriptor {
                        index,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            keypoints,
            descriptor_len,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Descriptor length shared by all keypoints, `None` for an empty set.
    pub fn descriptor_len(&self) -> Option<usize> {
        self.descriptor_len
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn get(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    pub fn position(&self, index: usize) -> Option<[f32; 2]> {
        self.keypoints.get(index).map(|kp| kp.position)
    }
}

/// Both collections of a matching run: `left` is the query side, `right`
/// the target side.
#[derive(Clone, Debug, Default)]
pub struct DescriptorStore {
    left: KeypointSet,
    right: KeypointSet,
}

impl DescriptorStore {
    pub fn new(left: KeypointSet, right: KeypointSet) -> Result<Self, StoreError> {
        if let (Some(l), Some(r)) = (left.descriptor_len(), right.descriptor_len()) {
            if l != r {
                return Err(StoreError::DimensionMismatch { left: l, right: r });
            }
        }
        Ok(Self { left, right })
    }

    pub fn from_keypoints(left: Vec<Keypoint>, right: Vec<Keypoint>) -> Result<Self, StoreError> {
        Self::new(KeypointSet::new(left)?, KeypointSet::new(right)?)
    }

    pub fn left(&self) -> &KeypointSet {
        &self.left
    }

    pub fn right(&self) -> &KeypointSet {
        &self.right
    }
}
