#![allow(non_snake_case)]

use nalgebra::SVector;
use tinympc_box::{Error, MpcContext, Settings, Status, Workspace};

#[path = "problem_data/quadrotor_20hz.rs"]
mod quadrotor_20hz;

use quadrotor_20hz::*;

const HX: usize = 10;
const HU: usize = HX - 1;

const STEPS: usize = 70;

fn main() -> Result<(), Error> {
    env_logger::init();

    let mut work = Workspace::<f64, NX, NU, HX, HU>::from_row_major(&ADYN, &BDYN, &Q, &QF, &R)?;
    work.set_const_u_bounds(&SVector::from_element(-0.5), &SVector::from_element(0.5))?;
    work.set_const_x_bounds(&SVector::from_element(-5.0), &SVector::from_element(5.0))?;

    let settings = Settings::default()
        .with_tolerances(1e-3, 1e-3)
        .with_max_iter(100);

    let mut mpc = MpcContext::setup(settings, work, RHO, 5000)?;
    mpc.set_reference(&HOVER)?;

    println!("Size of MPC object: {} bytes", core::mem::size_of_val(&mpc));

    let (A, B) = {
        let (A, B) = mpc.workspace().dynamics();
        (*A, *B)
    };

    let goal = SVector::<f64, NX>::from_column_slice(&HOVER);
    let mut x = SVector::<f64, NX>::from_column_slice(&X0);

    let mut total_iters = 0;
    let mut unsolved = 0;
    let mut us = [0.0; NU * HU];

    for k in 0..STEPS {
        mpc.set_initial_state(x.as_slice())?;
        mpc.reset_duals();

        let status = mpc.solve();
        total_iters += mpc.workspace().iterations();
        if status != Status::Solved {
            unsolved += 1;
        }

        // First input of every row is the one to apply now
        mpc.get_input_trajectory(&mut us)?;
        let u = SVector::<f64, NU>::from_fn(|row, _| us[row * HU]);

        x = A * x + B * u;

        log::info!(
            "step {k:2}: {:?} in {:3} iterations, tracking error {:.4}",
            status,
            mpc.workspace().iterations(),
            (x - goal).norm()
        );
    }

    println!(
        "Final tracking error {:.4} after {STEPS} steps",
        (x - goal).norm()
    );
    println!(
        "Average iterations per solve: {:.1}, {unsolved} solves hit the iteration cap",
        total_iters as f64 / STEPS as f64
    );

    Ok(())
}
