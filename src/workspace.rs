use nalgebra::{convert, RealField, SMatrix, SVector, Scalar};

use crate::util::{from_row_major, ordered, shift_columns_left};
use crate::{Error, Status};

/// Primal and dual residuals of the latest checked iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residuals<T> {
    pub primal_state: T,
    pub primal_input: T,
    pub dual_state: T,
    pub dual_input: T,
}

/// Problem variables, everything that is mutated between or during solves
#[derive(Debug, Clone)]
pub struct Workspace<T, const NX: usize, const NU: usize, const HX: usize, const HU: usize> {
    // Linear state space model
    pub(crate) Adyn: SMatrix<T, NX, NX>,
    pub(crate) Bdyn: SMatrix<T, NX, NU>,

    // Diagonal state, terminal and input cost
    pub(crate) Q: SVector<T, NX>,
    pub(crate) Qf: SVector<T, NX>,
    pub(crate) R: SVector<T, NU>,

    // State and input bounds
    pub(crate) x_min: SMatrix<T, NX, HX>,
    pub(crate) x_max: SMatrix<T, NX, HX>,
    pub(crate) u_min: SMatrix<T, NU, HU>,
    pub(crate) u_max: SMatrix<T, NU, HU>,

    // Reference trajectory to track for one horizon
    pub(crate) Xref: SMatrix<T, NX, HX>,
    pub(crate) Uref: SMatrix<T, NU, HU>,

    // State and inputs
    pub(crate) x: SMatrix<T, NX, HX>,
    pub(crate) u: SMatrix<T, NU, HU>,

    // Linear cost terms
    pub(crate) q: SMatrix<T, NX, HX>,
    pub(crate) r: SMatrix<T, NU, HU>,

    // Riccati backward pass terms
    pub(crate) p: SMatrix<T, NX, HX>,
    pub(crate) d: SMatrix<T, NU, HU>,

    // Auxiliary variables
    pub(crate) v: SMatrix<T, NX, HX>,
    pub(crate) vnew: SMatrix<T, NX, HX>,
    pub(crate) z: SMatrix<T, NU, HU>,
    pub(crate) znew: SMatrix<T, NU, HU>,

    // Dual variables
    pub(crate) g: SMatrix<T, NX, HX>,
    pub(crate) y: SMatrix<T, NU, HU>,

    pub(crate) primal_residual_state: T,
    pub(crate) primal_residual_input: T,
    pub(crate) dual_residual_state: T,
    pub(crate) dual_residual_input: T,
    pub(crate) iter: usize,
    pub(crate) status: Status,
}

impl<T, const NX: usize, const NU: usize, const HX: usize, const HU: usize>
    Workspace<T, NX, NU, HX, HU>
where
    T: Scalar + RealField + Copy,
{
    /// Creates a zero-initialised workspace with unbounded box constraints.
    ///
    /// ## Arguments
    /// - `Adyn`: State space propagation matrix
    /// - `Bdyn`: State space input matrix
    /// - `Q`: Stage state penalty vector
    /// - `Qf`: Terminal state penalty vector
    /// - `R`: Input penalty vector
    pub fn new(
        Adyn: SMatrix<T, NX, NX>,
        Bdyn: SMatrix<T, NX, NU>,
        Q: SVector<T, NX>,
        Qf: SVector<T, NX>,
        R: SVector<T, NU>,
    ) -> Result<Self, Error> {
        // Guard against invalid horizon lengths
        if HU == 0 || HU + 1 != HX {
            return Err(Error::InvalidHorizonLengths);
        }

        let inf: T = convert(f64::INFINITY);

        Ok(Self {
            Adyn,
            Bdyn,
            Q,
            Qf,
            R,
            x_min: SMatrix::from_element(-inf),
            x_max: SMatrix::from_element(inf),
            u_min: SMatrix::from_element(-inf),
            u_max: SMatrix::from_element(inf),
            Xref: SMatrix::zeros(),
            Uref: SMatrix::zeros(),
            x: SMatrix::zeros(),
            u: SMatrix::zeros(),
            q: SMatrix::zeros(),
            r: SMatrix::zeros(),
            p: SMatrix::zeros(),
            d: SMatrix::zeros(),
            v: SMatrix::zeros(),
            vnew: SMatrix::zeros(),
            z: SMatrix::zeros(),
            znew: SMatrix::zeros(),
            g: SMatrix::zeros(),
            y: SMatrix::zeros(),
            primal_residual_state: T::zero(),
            primal_residual_input: T::zero(),
            dual_residual_state: T::zero(),
            dual_residual_input: T::zero(),
            iter: 0,
            status: Status::Unsolved,
        })
    }

    /// Same as [`Workspace::new`], reading the model from flat row-major tables
    pub fn from_row_major(
        Adyn: &[T],
        Bdyn: &[T],
        Q: &[T],
        Qf: &[T],
        R: &[T],
    ) -> Result<Self, Error> {
        Self::new(
            from_row_major(Adyn)?,
            from_row_major(Bdyn)?,
            from_row_major(Q)?,
            from_row_major(Qf)?,
            from_row_major(R)?,
        )
    }

    /// Set the measured state, column 0 of the state trajectory
    pub fn set_initial_state(&mut self, x0: &SVector<T, NX>) {
        self.x.set_column(0, x0);
    }

    /// Set a time-varying state reference for the entire horizon
    pub fn set_x_reference(&mut self, Xref: &SMatrix<T, NX, HX>) {
        self.Xref = *Xref;
    }

    /// Set a constant state reference for the entire horizon
    pub fn set_const_x_reference(&mut self, xref: &SVector<T, NX>) {
        for i in 0..HX {
            self.Xref.set_column(i, xref);
        }
    }

    /// Set a time-varying input reference for the entire horizon
    pub fn set_u_reference(&mut self, Uref: &SMatrix<T, NU, HU>) {
        self.Uref = *Uref;
    }

    /// Set varying min-max bounds on states for entire horizon
    pub fn set_x_bounds(
        &mut self,
        x_min: &SMatrix<T, NX, HX>,
        x_max: &SMatrix<T, NX, HX>,
    ) -> Result<(), Error> {
        if !ordered(x_min, x_max) {
            return Err(Error::InvalidBounds);
        }
        self.x_min = *x_min;
        self.x_max = *x_max;
        Ok(())
    }

    /// Set varying min-max bounds on inputs for entire horizon
    pub fn set_u_bounds(
        &mut self,
        u_min: &SMatrix<T, NU, HU>,
        u_max: &SMatrix<T, NU, HU>,
    ) -> Result<(), Error> {
        if !ordered(u_min, u_max) {
            return Err(Error::InvalidBounds);
        }
        self.u_min = *u_min;
        self.u_max = *u_max;
        Ok(())
    }

    /// Set constant min-max bounds on states for entire horizon
    pub fn set_const_x_bounds(
        &mut self,
        x_min: &SVector<T, NX>,
        x_max: &SVector<T, NX>,
    ) -> Result<(), Error> {
        let mut min: SMatrix<T, NX, HX> = SMatrix::zeros();
        let mut max: SMatrix<T, NX, HX> = SMatrix::zeros();

        for i in 0..HX {
            min.set_column(i, x_min);
            max.set_column(i, x_max);
        }
        self.set_x_bounds(&min, &max)
    }

    /// Set constant min-max bounds on inputs for entire horizon
    pub fn set_const_u_bounds(
        &mut self,
        u_min: &SVector<T, NU>,
        u_max: &SVector<T, NU>,
    ) -> Result<(), Error> {
        let mut min: SMatrix<T, NU, HU> = SMatrix::zeros();
        let mut max: SMatrix<T, NU, HU> = SMatrix::zeros();

        for i in 0..HU {
            min.set_column(i, u_min);
            max.set_column(i, u_max);
        }
        self.set_u_bounds(&min, &max)
    }

    /// Zero the scaled dual variables of both constraint types
    pub fn reset_duals(&mut self) {
        self.y = SMatrix::zeros();
        self.g = SMatrix::zeros();
    }

    /// Shift slack and dual variables one step forward in time.
    ///
    /// Call this between control cycles instead of [`Workspace::reset_duals`]
    /// to warm start the next solve from the previous one.
    pub fn shift_warm_start(&mut self) {
        shift_columns_left(&mut self.v);
        shift_columns_left(&mut self.z);
        shift_columns_left(&mut self.g);
        shift_columns_left(&mut self.y);
    }

    pub fn iterations(&self) -> usize {
        self.iter
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn residuals(&self) -> Residuals<T> {
        Residuals {
            primal_state: self.primal_residual_state,
            primal_input: self.primal_residual_input,
            dual_state: self.dual_residual_state,
            dual_input: self.dual_residual_input,
        }
    }

    /// Get the system state `x` for the time `i`
    pub fn x_at(&self, i: usize) -> SVector<T, NX> {
        self.x.column(i).into()
    }

    /// Get the system input `u` for the time `i`
    pub fn u_at(&self, i: usize) -> SVector<T, NU> {
        self.u.column(i).into()
    }

    /// Get the system input `u` for the current time
    pub fn u_now(&self) -> SVector<T, NU> {
        self.u_at(0)
    }

    /// Get reference to matrix containing state predictions
    pub fn x_matrix(&self) -> &SMatrix<T, NX, HX> {
        &self.x
    }

    /// Get reference to matrix containing input predictions
    pub fn u_matrix(&self) -> &SMatrix<T, NU, HU> {
        &self.u
    }

    /// State slack, the projected copy of the state trajectory
    pub fn x_slack(&self) -> &SMatrix<T, NX, HX> {
        &self.v
    }

    /// Input slack, the projected copy of the input trajectory
    pub fn u_slack(&self) -> &SMatrix<T, NU, HU> {
        &self.z
    }

    pub fn x_reference(&self) -> &SMatrix<T, NX, HX> {
        &self.Xref
    }

    pub fn dynamics(&self) -> (&SMatrix<T, NX, NX>, &SMatrix<T, NX, NU>) {
        (&self.Adyn, &self.Bdyn)
    }
}
