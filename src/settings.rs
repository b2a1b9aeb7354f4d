use nalgebra::{convert, RealField};

const DEFAULT_ABS_PRI_TOL: f64 = 1e-3;
const DEFAULT_ABS_DUA_TOL: f64 = 1e-3;
const DEFAULT_MAX_ITER: usize = 100;
const DEFAULT_CHECK_INTERVAL: usize = 1;

/// User settings, read-only for the duration of a solve
#[derive(Debug, Clone, PartialEq)]
pub struct Settings<T> {
    /// Absolute tolerance on the primal residuals
    pub abs_pri_tol: T,
    /// Absolute tolerance on the dual residuals
    pub abs_dua_tol: T,
    /// Hard cap on iterations per solve
    pub max_iter: usize,
    /// If `false` every solve runs exactly `max_iter` iterations
    pub check_termination: bool,
    /// Residuals are evaluated every `check_interval` iterations
    pub check_interval: usize,
    /// Project the state trajectory onto `[x_min, x_max]`
    pub en_state_bound: bool,
    /// Project the input trajectory onto `[u_min, u_max]`
    pub en_input_bound: bool,
}

impl<T: RealField + Copy> Default for Settings<T> {
    fn default() -> Self {
        Self {
            abs_pri_tol: convert(DEFAULT_ABS_PRI_TOL),
            abs_dua_tol: convert(DEFAULT_ABS_DUA_TOL),
            max_iter: DEFAULT_MAX_ITER,
            check_termination: true,
            check_interval: DEFAULT_CHECK_INTERVAL,
            en_state_bound: true,
            en_input_bound: true,
        }
    }
}

impl<T> Settings<T> {
    pub fn with_tolerances(self, abs_pri_tol: T, abs_dua_tol: T) -> Self {
        Self {
            abs_pri_tol,
            abs_dua_tol,
            ..self
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self { max_iter, ..self }
    }

    pub fn with_check_termination(self, check_termination: bool) -> Self {
        Self {
            check_termination,
            ..self
        }
    }

    pub fn with_check_interval(self, check_interval: usize) -> Self {
        Self {
            check_interval,
            ..self
        }
    }

    pub fn with_bounds_enabled(self, en_state_bound: bool, en_input_bound: bool) -> Self {
        Self {
            en_state_bound,
            en_input_bound,
            ..self
        }
    }

    /// Whether residuals are due after `iter` completed iterations
    #[inline(always)]
    pub(crate) fn is_check_iter(&self, iter: usize) -> bool {
        iter % self.check_interval.max(1) == 0
    }
}
