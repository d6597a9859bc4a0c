//! External collaborators
//!
//! The trajectory sampler, user-supplied probe functions and the model
//! builder live outside this crate. These traits are the seams through which
//! the controller and context registry talk to them.

use std::collections::BTreeMap;

use phaseview_geom::Point2;
use serde::{Deserialize, Serialize};

use crate::context::EventDescriptor;
use crate::error::{PhaseviewResult, SceneError, SceneResult};

/// Column names a sample set always carries
pub const X: &str = "x";
pub const Y: &str = "y";
/// Optional columns
pub const T: &str = "t";
pub const SPEED: &str = "speed";

/// Discretized trajectory: named columns of equal length
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    columns: BTreeMap<String, Vec<f64>>,
    len: usize,
}

impl SampleSet {
    /// Planar samples
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> SceneResult<Self> {
        let len = x.len();
        let set = Self {
            columns: BTreeMap::new(),
            len,
        };
        set.with_column(X, x)?.with_column(Y, y)
    }

    /// Attach sample times; they must not decrease
    pub fn with_time(self, t: Vec<f64>) -> SceneResult<Self> {
        if t.windows(2).any(|w| w[1] < w[0]) {
            return Err(SceneError::InvalidArgument(
                "sample times must be non-decreasing".to_string(),
            ));
        }
        self.with_column(T, t)
    }

    pub fn with_speed(self, speed: Vec<f64>) -> SceneResult<Self> {
        self.with_column(SPEED, speed)
    }

    /// Attach any other named column
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> SceneResult<Self> {
        if values.len() != self.len {
            return Err(SceneError::shape(format!(
                "column '{}' has {} samples, expected {}",
                name,
                values.len(),
                self.len
            )));
        }
        self.columns.insert(name.to_string(), values);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// The `t` column, if present
    pub fn times(&self) -> Option<&[f64]> {
        self.column(T)
    }

    pub fn points_xy(&self) -> Vec<Point2> {
        match (self.column(X), self.column(Y)) {
            (Some(x), Some(y)) => x.iter().zip(y).map(|(&x, &y)| Point2::new(x, y)).collect(),
            _ => Vec::new(),
        }
    }

    /// Every column's value at one sample index
    pub fn values_at(&self, index: usize) -> Option<BTreeMap<String, f64>> {
        if index >= self.len {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|(name, values)| (name.clone(), values[index]))
                .collect(),
        )
    }
}

/// Source of trajectory samples
pub trait SampleProvider {
    /// Materialize the full discretized trajectory
    fn sample(&self) -> PhaseviewResult<SampleSet>;

    /// Per-variable values at a sample index
    fn value_at(&self, index: usize) -> Option<BTreeMap<String, f64>>;
}

impl SampleProvider for SampleSet {
    fn sample(&self) -> PhaseviewResult<SampleSet> {
        Ok(self.clone())
    }

    fn value_at(&self, index: usize) -> Option<BTreeMap<String, f64>> {
        self.values_at(index)
    }
}

/// Result of a user probe function at a clicked point
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutput {
    pub scalars: BTreeMap<String, f64>,
    pub vectors: BTreeMap<String, Vec<f64>>,
}

/// User function `(x, y) -> (scalars, vectors)` evaluated on click
pub type UserFunction = Box<dyn FnMut(Point2) -> PhaseviewResult<ProbeOutput>>;

/// Domain-criterion function that grows a region from a seed point
pub trait DomainGrower {
    /// Boundary of the region grown from `seed` with initial `radius`
    fn grow(&mut self, seed: Point2, radius: f64) -> PhaseviewResult<Vec<Point2>>;
}

/// Auxiliary function specification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuxFunction {
    pub name: String,
    pub args: Vec<String>,
    pub body: String,
}

/// What a context object adds to the dynamical-system definition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelContribution {
    pub pars: BTreeMap<String, f64>,
    pub fnspecs: Vec<AuxFunction>,
    pub events: Vec<EventDescriptor>,
}

impl ModelContribution {
    pub fn is_empty(&self) -> bool {
        self.pars.is_empty() && self.fnspecs.is_empty() && self.events.is_empty()
    }
}

/// External model-construction step
pub trait ModelBuilder {
    fn contribute(&mut self, contribution: ModelContribution);
}

/// Collects contributions in order
impl ModelBuilder for Vec<ModelContribution> {
    fn contribute(&mut self, contribution: ModelContribution) {
        self.push(contribution);
    }
}
