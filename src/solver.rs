use nalgebra::{RealField, Scalar};

use crate::util::max_abs_diff;
use crate::{Cache, Settings, Status, Workspace};

/// Runs the ADMM iterations on a borrowed workspace.
///
/// The solver only holds a shared reference to the [`Cache`], so the
/// precomputed matrices cannot change (or be recomputed) during a solve.
/// Exclusive access to the [`Workspace`] guarantees one solve at a time.
pub struct Solver<'a, T, const NX: usize, const NU: usize, const HX: usize, const HU: usize> {
    settings: &'a Settings<T>,
    cache: &'a Cache<T, NX, NU>,
    work: &'a mut Workspace<T, NX, NU, HX, HU>,
}

impl<'a, T, const NX: usize, const NU: usize, const HX: usize, const HU: usize>
    Solver<'a, T, NX, NU, HX, HU>
where
    T: Scalar + RealField + Copy,
{
    pub fn new(
        settings: &'a Settings<T>,
        cache: &'a Cache<T, NX, NU>,
        work: &'a mut Workspace<T, NX, NU, HX, HU>,
    ) -> Self {
        Self {
            settings,
            cache,
            work,
        }
    }

    /// # Solve for the optimal MPC solution
    ///
    /// The workspace must already hold the measured state in column 0 of `x`
    /// and the desired references. Runs at most `max_iter` iterations and
    /// leaves trajectories, residuals, iteration count and status in the
    /// workspace. Never allocates.
    ///
    /// Bounds with `min > max` are a precondition violation and give an
    /// unspecified (but finite-time) result.
    pub fn solve(&mut self) -> Status {
        self.work.status = Status::Unsolved;
        self.work.iter = 0;

        while self.work.iter < self.settings.max_iter {
            // Update linear cost terms from the references, duals and slacks
            self.update_linear_cost();

            // Backward pass to update Riccati variables
            self.backward_pass();

            // Roll out to get new trajectory
            self.forward_pass();

            // Project slack variables into feasible domain
            self.update_slack();

            // Compute next iteration of dual variables
            self.update_dual();

            self.work.iter += 1;

            let converged = self.check_termination();

            // Save slack variables for the next dual residual
            self.work.v = self.work.vnew;
            self.work.z = self.work.znew;

            if converged {
                self.work.status = Status::Solved;
                log::debug!("Solver converged in {} iterations", self.work.iter);
                return self.work.status;
            }
        }

        self.work.status = Status::MaxIterReached;
        log::debug!("Solver reached max iterations ({})", self.work.iter);
        self.work.status
    }

    /// Update linear cost terms of the Riccati feedback from the changing slack and dual variables
    fn update_linear_cost(&mut self) {
        let s = &mut *self.work;
        let rho = self.cache.rho;

        // Input cost
        for (i, uref) in s.Uref.column_iter().enumerate() {
            s.r.set_column(i, &(-uref.component_mul(&s.R)));
        }
        s.r += (s.y - s.z).scale(rho);

        // State cost
        for (i, xref) in s.Xref.column_iter().enumerate() {
            s.q.set_column(i, &(-xref.component_mul(&s.Q)));
        }
        s.q += (s.g - s.v).scale(rho);

        // Terminal condition at the end of the horizon
        let p_f = -(self.cache.Plqr * s.Xref.column(HX - 1))
            + (s.g.column(HX - 1) - s.v.column(HX - 1)).scale(rho);
        s.p.set_column(HX - 1, &p_f);
    }

    /// Update linear terms from Riccati backward pass
    fn backward_pass(&mut self) {
        let s = &mut *self.work;
        let c = self.cache;

        for i in (0..HU).rev() {
            let p_next = s.p.column(i + 1).clone_owned();
            let r_curr = s.r.column(i).clone_owned();

            let d_curr = c.RpBPBi * (s.Bdyn.tr_mul(&p_next) + r_curr);
            let p_curr =
                s.q.column(i) + c.AmBKt * p_next - c.Klqrt * r_curr + c.coeff_d2p * d_curr;

            s.d.set_column(i, &d_curr);
            s.p.set_column(i, &p_curr);
        }
    }

    /// Use LQR feedback policy to roll out trajectory
    fn forward_pass(&mut self) {
        let s = &mut *self.work;
        let c = self.cache;

        // Column 0 holds the measurement and is never written here
        for i in 0..HU {
            let x_curr = s.x.column(i).clone_owned();
            let u_curr = c.nKlqr * x_curr - s.d.column(i);

            s.u.set_column(i, &u_curr);
            s.x.set_column(i + 1, &(s.Adyn * x_curr + s.Bdyn * u_curr));
        }
    }

    /// Project slack variables into their feasible domain
    fn update_slack(&mut self) {
        let s = &mut *self.work;

        s.znew = s.u + s.y;
        s.vnew = s.x + s.g;

        // Box constraints on input
        if self.settings.en_input_bound {
            s.znew
                .zip_zip_apply(&s.u_min, &s.u_max, |u, min, max| *u = (*u).clamp(min, max));
        }

        // Box constraints on state
        if self.settings.en_state_bound {
            s.vnew
                .zip_zip_apply(&s.x_min, &s.x_max, |x, min, max| *x = (*x).clamp(min, max));
        }
    }

    /// Augmented Lagrangian multiplier update of the scaled duals
    fn update_dual(&mut self) {
        let s = &mut *self.work;

        s.y += s.u - s.znew;
        s.g += s.x - s.vnew;
    }

    /// Evaluate residuals if due, and report whether all of them are below tolerance
    fn check_termination(&mut self) -> bool {
        let s = &mut *self.work;
        let settings = self.settings;

        if !settings.is_check_iter(s.iter) {
            return false;
        }

        s.primal_residual_state = max_abs_diff(&s.x, &s.vnew);
        s.dual_residual_state = max_abs_diff(&s.vnew, &s.v);
        s.primal_residual_input = max_abs_diff(&s.u, &s.znew);
        s.dual_residual_input = max_abs_diff(&s.znew, &s.z);

        log::trace!(
            "{}: prim {} {} dual {} {}",
            s.iter,
            s.primal_residual_state,
            s.primal_residual_input,
            s.dual_residual_state,
            s.dual_residual_input,
        );

        settings.check_termination
            && s.primal_residual_state < settings.abs_pri_tol
            && s.primal_residual_input < settings.abs_pri_tol
            && s.dual_residual_state < settings.abs_dua_tol
            && s.dual_residual_input < settings.abs_dua_tol
    }
}
