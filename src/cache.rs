use nalgebra::{convert, RealField, SMatrix, SVector, Scalar};

use crate::util::from_row_major;
use crate::Error;

/// Relative convergence threshold on the change of `Plqr` between Riccati iterations
const RICCATI_TOL: f64 = 1e-6;

/// Contains all pre-computed values for a given problem and value of rho.
///
/// Nothing in here is ever written after construction, the solver only gets
/// a shared reference. Recomputing any single matrix without the others would
/// desynchronise it from `rho`, so the fields are not publicly mutable.
#[derive(Debug, Clone)]
pub struct Cache<T, const NX: usize, const NU: usize> {
    /// Penalty-parameter for this cache
    pub(crate) rho: T,

    /// (Negated) Infinite-time horizon LQR gain
    pub(crate) nKlqr: SMatrix<T, NU, NX>,

    /// Transposed infinite-time horizon LQR gain
    pub(crate) Klqrt: SMatrix<T, NX, NU>,

    /// Infinite-time horizon LQR cost-to-go
    pub(crate) Plqr: SMatrix<T, NX, NX>,

    /// Precomputed `inv(R_aug + B^T * Plqr * B)`
    pub(crate) RpBPBi: SMatrix<T, NU, NU>,

    /// Precomputed `(A - B * Klqr)^T`
    pub(crate) AmBKt: SMatrix<T, NX, NX>,

    /// Precomputed `Klqr^T * R_aug - AmBKt * Plqr * B`, maps the feedforward term onto the costate
    pub(crate) coeff_d2p: SMatrix<T, NX, NU>,
}

impl<T, const NX: usize, const NU: usize> Cache<T, NX, NU>
where
    T: Scalar + RealField + Copy,
{
    /// Solve the rho-augmented infinite-horizon Riccati recursion.
    ///
    /// Starting from `Plqr = diag(Qf)`, iterates until the largest change in
    /// `Plqr` is negligible or `iters` iterations have run. This performs
    /// matrix inversions and is meant to run once, outside the control loop.
    pub fn new(
        rho: T,
        iters: usize,
        A: &SMatrix<T, NX, NX>,
        B: &SMatrix<T, NX, NU>,
        Q: &SVector<T, NX>,
        Qf: &SVector<T, NX>,
        R: &SVector<T, NU>,
    ) -> Result<Self, Error> {
        if !rho.is_positive() {
            return Err(Error::RhoNotPositive);
        }

        if !Q.iter().chain(Qf.iter()).all(|q| q >= &T::zero()) {
            return Err(Error::QNotPositiveSemidefinite);
        }

        if !R.iter().all(|r| r > &T::zero()) {
            return Err(Error::RNotPositiveDefinite);
        }

        // ADMM-augmented cost matrices for LQR problem
        let Q_aug = SMatrix::from_diagonal(&Q.add_scalar(rho));
        let R_aug = SMatrix::from_diagonal(&R.add_scalar(rho));

        let tol: T = convert(RICCATI_TOL);
        let Bt = B.transpose();
        let At = A.transpose();

        let mut Plqr = SMatrix::from_diagonal(Qf);
        let mut converged = false;

        for iter in 0..iters {
            let Klqr = (R_aug + Bt * Plqr * B)
                .try_inverse()
                .ok_or(Error::RpBPBNotInvertible)?
                * (Bt * Plqr * A);
            let Pnext = Q_aug + At * Plqr * A - At * Plqr * B * Klqr;

            let change = (Pnext - Plqr).abs().max();
            Plqr = Pnext;

            if !change.is_finite() {
                return Err(Error::NonFiniteValues);
            }

            if change <= tol * (T::one() + Plqr.abs().max()) {
                log::debug!("Riccati recursion converged after {} iterations", iter + 1);
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!("Riccati recursion did not converge within {iters} iterations");
        }

        // Gain and inverse are taken from the final cost-to-go so the pair is consistent
        let RpBPBi = (R_aug + Bt * Plqr * B)
            .try_inverse()
            .ok_or(Error::RpBPBNotInvertible)?;
        let Klqr = RpBPBi * (Bt * Plqr * A);
        let AmBKt = (A - B * Klqr).transpose();
        let coeff_d2p = Klqr.transpose() * R_aug - AmBKt * Plqr * B;

        log::debug!("Cache computed for rho = {rho}");

        Self::assemble(rho, Klqr, Plqr, RpBPBi, AmBKt, coeff_d2p)
    }

    /// Load a cache produced offline from flat row-major tables.
    ///
    /// The tables must have been generated with the same `rho`, this cannot be
    /// verified here.
    pub fn from_row_major(
        rho: T,
        Kinf: &[T],
        Pinf: &[T],
        Quu_inv: &[T],
        AmBKt: &[T],
        coeff_d2p: &[T],
    ) -> Result<Self, Error> {
        if !rho.is_positive() {
            return Err(Error::RhoNotPositive);
        }

        Self::assemble(
            rho,
            from_row_major(Kinf)?,
            from_row_major(Pinf)?,
            from_row_major(Quu_inv)?,
            from_row_major(AmBKt)?,
            from_row_major(coeff_d2p)?,
        )
    }

    fn assemble(
        rho: T,
        Klqr: SMatrix<T, NU, NX>,
        Plqr: SMatrix<T, NX, NX>,
        RpBPBi: SMatrix<T, NU, NU>,
        AmBKt: SMatrix<T, NX, NX>,
        coeff_d2p: SMatrix<T, NX, NU>,
    ) -> Result<Self, Error> {
        ([].iter())
            .chain(Klqr.iter())
            .chain(Plqr.iter())
            .chain(RpBPBi.iter())
            .chain(AmBKt.iter())
            .chain(coeff_d2p.iter())
            .all(|x| x.is_finite())
            .then(|| Cache {
                rho,
                nKlqr: -Klqr,
                Klqrt: Klqr.transpose(),
                Plqr,
                RpBPBi,
                AmBKt,
                coeff_d2p,
            })
            .ok_or(Error::NonFiniteValues)
    }

    /// Penalty parameter baked into this cache
    pub fn rho(&self) -> T {
        self.rho
    }

    /// Infinite-horizon feedback gain `K`, such that `u = -K * x`
    pub fn gain(&self) -> SMatrix<T, NU, NX> {
        -self.nKlqr
    }

    /// Infinite-horizon cost-to-go `P`
    pub fn cost_to_go(&self) -> &SMatrix<T, NX, NX> {
        &self.Plqr
    }

    /// `inv(R + rho * I + B^T * P * B)`
    pub fn input_hessian_inv(&self) -> &SMatrix<T, NU, NU> {
        &self.RpBPBi
    }

    /// Transposed closed-loop transition `(A - B * K)^T`
    pub fn closed_loop_t(&self) -> &SMatrix<T, NX, NX> {
        &self.AmBKt
    }

    /// Feedforward to costate coupling `K^T * R_aug - (A - B * K)^T * P * B`
    pub fn coupling(&self) -> &SMatrix<T, NX, NU> {
        &self.coeff_d2p
    }
}
