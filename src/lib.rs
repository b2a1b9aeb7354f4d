#![no_std]
#![allow(non_snake_case)]

/*

    This work is heavily based off of TinyMPC [ https://tinympc.org/ ]

*/

//! Allocation-free ADMM solver for linear MPC with box constraints.
//!
//! The problem dimensions are const generics shared by every type:
//!
//! - `NX`: number of states
//! - `NU`: number of inputs
//! - `HX`: horizon length, the number of state knot points
//! - `HU`: number of input knot points, which must equal `HX - 1`
//!
//! A [`Cache`] is computed once (or loaded from offline tables) and is never
//! mutated afterwards. A [`Workspace`] holds everything that changes between
//! control cycles, and a [`Solver`] borrows both together with the
//! [`Settings`] to run a solve. [`MpcContext`] bundles the three into an
//! owned object with buffer-based entry points.

#[cfg(feature = "std")]
extern crate std;

pub mod cache;
pub mod context;
pub mod settings;
pub mod solver;
pub mod workspace;

pub(crate) mod util;


pub use cache::Cache;
pub use context::MpcContext;
pub use settings::Settings;
pub use solver::Solver;
pub use workspace::{Residuals, Workspace};

/// Errors that can occur during system setup
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The input horizon must be exactly one shorter than the state horizon
    InvalidHorizonLengths,
    /// The value of rho must be strictly positive `(rho > 0)`
    RhoNotPositive,
    /// `Q` or `Qf` contains a negative weight
    QNotPositiveSemidefinite,
    /// `R` contains a non-positive weight
    RNotPositiveDefinite,
    /// The matrix `R_aug + B^T * P * B` is not invertible
    RpBPBNotInvertible,
    /// The resulting matrices contained non-finite elements (Inf or NaN)
    NonFiniteValues,
    /// A flat buffer did not have the length required by its matrix shape
    BufferLength { expected: usize, found: usize },
    /// A lower bound was larger than its upper bound
    InvalidBounds,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidHorizonLengths => {
                write!(f, "input horizon must be state horizon minus one")
            }
            Error::RhoNotPositive => write!(f, "rho must be strictly positive"),
            Error::QNotPositiveSemidefinite => write!(f, "state weights must be non-negative"),
            Error::RNotPositiveDefinite => write!(f, "input weights must be strictly positive"),
            Error::RpBPBNotInvertible => write!(f, "R_aug + B^T P B is not invertible"),
            Error::NonFiniteValues => write!(f, "matrices contain non-finite values"),
            Error::BufferLength { expected, found } => {
                write!(f, "buffer length {found} does not match expected {expected}")
            }
            Error::InvalidBounds => write!(f, "lower bound exceeds upper bound"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Outcome of the most recent solve
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Status {
    /// No solve has finished yet, or one is in progress
    #[default]
    Unsolved,
    /// All residuals dropped below their tolerances
    Solved,
    /// The iteration budget ran out first. The trajectory is still usable.
    MaxIterReached,
}

impl Status {
    /// Integer status code as exposed to external callers
    pub fn code(&self) -> u8 {
        match self {
            Status::Unsolved => 0,
            Status::Solved => 1,
            Status::MaxIterReached => 2,
        }
    }
}
