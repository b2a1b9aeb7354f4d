use nalgebra::{RealField, SVector, Scalar};

use crate::util::{check_len, write_row_major};
use crate::{Cache, Error, Settings, Solver, Status, Workspace};

/// Owned solver context: one set of [`Settings`], one [`Cache`] and one [`Workspace`].
///
/// This is the entry point for callers that exchange flat buffers with the
/// solver, such as a control task or a foreign function boundary. Each
/// context is fully independent, so several vehicles can be controlled side
/// by side without any shared state.
#[derive(Debug, Clone)]
pub struct MpcContext<T, const NX: usize, const NU: usize, const HX: usize, const HU: usize> {
    pub settings: Settings<T>,
    cache: Cache<T, NX, NU>,
    work: Workspace<T, NX, NU, HX, HU>,
}

impl<T, const NX: usize, const NU: usize, const HX: usize, const HU: usize>
    MpcContext<T, NX, NU, HX, HU>
where
    T: Scalar + RealField + Copy,
{
    /// Assemble a context from a cache that was computed or loaded beforehand
    pub fn new(
        settings: Settings<T>,
        cache: Cache<T, NX, NU>,
        work: Workspace<T, NX, NU, HX, HU>,
    ) -> Self {
        Self {
            settings,
            cache,
            work,
        }
    }

    /// Compute the cache from the model stored in `work`, then assemble the context
    pub fn setup(
        settings: Settings<T>,
        work: Workspace<T, NX, NU, HX, HU>,
        rho: T,
        riccati_iters: usize,
    ) -> Result<Self, Error> {
        let cache = Cache::new(
            rho,
            riccati_iters,
            &work.Adyn,
            &work.Bdyn,
            &work.Q,
            &work.Qf,
            &work.R,
        )?;

        Ok(Self::new(settings, cache, work))
    }

    /// Copy `NX` numbers into column 0 of the state trajectory
    pub fn set_initial_state(&mut self, x0: &[T]) -> Result<(), Error> {
        check_len(NX, x0.len())?;
        self.work.set_initial_state(&SVector::from_column_slice(x0));

        log::debug!("set_initial_state: {:?}", x0);
        Ok(())
    }

    /// Broadcast `NX` numbers across every column of the state reference
    pub fn set_reference(&mut self, xref: &[T]) -> Result<(), Error> {
        check_len(NX, xref.len())?;
        self.work.set_const_x_reference(&SVector::from_column_slice(xref));

        log::debug!("set_reference: {:?}", xref);
        Ok(())
    }

    pub fn reset_duals(&mut self) {
        self.work.reset_duals();
        log::debug!("reset_duals finished");
    }

    pub fn solve(&mut self) -> Status {
        let status = Solver::new(&self.settings, &self.cache, &mut self.work).solve();

        log::debug!(
            "solve finished: {:?} after {} iterations",
            status,
            self.work.iter
        );
        status
    }

    /// Write the `NX x HX` state trajectory into `buffer` in row-major order
    pub fn get_state_trajectory(&self, buffer: &mut [T]) -> Result<(), Error> {
        write_row_major(&self.work.x, buffer)?;

        log::debug!("get_state_trajectory: {:?}", buffer);
        Ok(())
    }

    /// Write the `NU x HU` input trajectory into `buffer` in row-major order
    pub fn get_input_trajectory(&self, buffer: &mut [T]) -> Result<(), Error> {
        write_row_major(&self.work.u, buffer)?;

        log::debug!("get_input_trajectory: {:?}", buffer);
        Ok(())
    }

    pub fn cache(&self) -> &Cache<T, NX, NU> {
        &self.cache
    }

    pub fn workspace(&self) -> &Workspace<T, NX, NU, HX, HU> {
        &self.work
    }

    /// Mutable access for bounds, input references and warm starting
    pub fn workspace_mut(&mut self) -> &mut Workspace<T, NX, NU, HX, HU> {
        &mut self.work
    }
}
