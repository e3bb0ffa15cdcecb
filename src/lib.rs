#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod homography;
pub mod pipeline;
pub mod store;
pub mod types;

// Stage modules, public for tools and tests that drive stages one by one.
pub mod geometry;
pub mod io;
pub mod matcher;
pub mod ransac;
pub mod refine;
pub mod report;
pub mod source;
pub mod synthetic;

// --- High-level re-exports -------------------------------------------------

pub use crate::config::PipelineConfig;
pub use crate::pipeline::{HomographyPipeline, PipelineOutput};
pub use crate::store::{DescriptorStore, KeypointSet, StoreError};
pub use crate::types::{Correspondence, Correspondences, InlierGate, Keypoint, RatioComparison};

pub use crate::diagnostics::PipelineTrace;

pub use crate::homography::{apply_homography_points, Homography};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use keypoint_homography::prelude::*;
///
/// # fn main() -> Result<(), StoreError> {
/// let left = vec![Keypoint::new([10.0, 20.0], 1.5, 0.0, vec![1.0, 0.0])];
/// let right = vec![Keypoint::new([15.0, 23.0], 1.5, 0.0, vec![1.0, 0.0])];
/// let store = DescriptorStore::from_keypoints(left, right)?;
///
/// let out = HomographyPipeline::new(PipelineConfig::default()).run(&store);
/// println!("found={} accepted={}", out.found(), out.report.summary.accepted);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        DescriptorStore, Homography, HomographyPipeline, Keypoint, PipelineConfig, StoreError,
    };
}

// --- Stage-level API (for tools & advanced users) ---------------------------

pub mod stages {
    pub use crate::matcher::{Matcher, MatcherOptions};
    pub use crate::ransac::{RansacEstimator, RansacOptions, RansacResult};
    pub use crate::refine::{RefineOptions, RefineResult, Refiner};
    pub use crate::report::{MatchReport, RecallListing, ReportOptions, Reporter};

    pub use crate::diagnostics::{
        MatchingStage, RansacStage, RefinementIteration, RefinementStage, StageTiming,
        TimingBreakdown,
    };
}
