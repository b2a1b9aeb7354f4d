#![allow(non_snake_case)]

use nalgebra::SVector;
use tinympc_box::{Cache, MpcContext, Settings, Solver, Status, Workspace};

#[path = "../demos/problem_data/quadrotor_20hz.rs"]
mod quadrotor_20hz;

use quadrotor_20hz::*;

const HX: usize = 10;
const HU: usize = HX - 1;

const STEPS: usize = 70;

type Work = Workspace<f64, NX, NU, HX, HU>;
type Context = MpcContext<f64, NX, NU, HX, HU>;

fn hover_workspace() -> Work {
    let mut work = Work::from_row_major(&ADYN, &BDYN, &Q, &QF, &R).unwrap();
    work.set_const_u_bounds(&SVector::from_element(-0.5), &SVector::from_element(0.5)).unwrap();
    work.set_const_x_bounds(&SVector::from_element(-5.0), &SVector::from_element(5.0)).unwrap();
    work
}

fn hover_settings() -> Settings<f64> {
    Settings::default()
        .with_tolerances(1e-3, 1e-3)
        .with_max_iter(100)
}

fn hover_context() -> Context {
    MpcContext::setup(hover_settings(), hover_workspace(), RHO, 5000).unwrap()
}

#[test]
fn hover_closed_loop_settles_after_initial_climb() {
    let mut mpc = hover_context();
    mpc.set_reference(&HOVER).unwrap();

    let (A, B) = {
        let (A, B) = mpc.workspace().dynamics();
        (*A, *B)
    };

    let goal = SVector::<f64, NX>::from_column_slice(&HOVER);
    let mut x = SVector::<f64, NX>::from_column_slice(&X0);

    let mut errors = [0.0; STEPS];
    let mut statuses = [Status::Unsolved; STEPS];

    for k in 0..STEPS {
        errors[k] = (x - goal).norm();

        mpc.set_initial_state(x.as_slice()).unwrap();
        mpc.reset_duals();

        statuses[k] = mpc.solve();
        assert_ne!(statuses[k], Status::Unsolved);
        assert_eq!(mpc.workspace().status(), statuses[k]);
        assert!(mpc.workspace().iterations() <= 100);

        // The projected input copy always respects the actuator limits
        assert!(mpc.workspace().u_slack().iter().all(|z| z.abs() <= 0.5));

        let u = mpc.workspace().u_now();

        x = A * x + B * u;
    }

    // The climb under saturated thrust first raises the full-state error
    // through the vertical velocity, so the error peaks early
    let peak = (0..STEPS)
        .max_by(|&a, &b| errors[a].total_cmp(&errors[b]))
        .unwrap();
    assert!(peak < 10, "tracking error peaked at step {peak}");

    for k in peak + 1..STEPS {
        assert!(
            errors[k] <= errors[k - 1] + 1e-3,
            "tracking error rose from {} to {} at step {k}",
            errors[k - 1],
            errors[k]
        );
    }

    // Once the constraints stop being active every solve converges
    for (k, status) in statuses.iter().enumerate().skip(10) {
        assert_eq!(*status, Status::Solved, "solve {k} did not converge");
    }

    let final_error = (x - goal).norm();
    assert!(
        final_error < 0.01,
        "tracking error went from {} to {final_error}",
        errors[0]
    );
}

#[test]
fn hover_trajectory_buffers_have_expected_layout() {
    let mut mpc = hover_context();
    mpc.set_reference(&HOVER).unwrap();
    mpc.set_initial_state(&X0).unwrap();
    mpc.solve();

    let mut xs = [0.0; NX * HX];
    let mut us = [0.0; NU * HU];
    mpc.get_state_trajectory(&mut xs).unwrap();
    mpc.get_input_trajectory(&mut us).unwrap();

    let work = mpc.workspace();
    for row in 0..NX {
        // First column is still the measured state
        assert_eq!(xs[row * HX], X0[row]);
        for col in 0..HX {
            assert_eq!(xs[row * HX + col], work.x_at(col)[row]);
        }
    }
    for row in 0..NU {
        for col in 0..HU {
            assert_eq!(us[row * HU + col], work.u_at(col)[row]);
        }
    }
}

#[test]
fn independent_contexts_do_not_interfere() {
    let mut first = hover_context();
    let mut second = hover_context();

    first.set_reference(&HOVER).unwrap();
    first.set_initial_state(&X0).unwrap();
    first.solve();
    let first_inputs = *first.workspace().u_matrix();

    // An unrelated problem in another context leaves the first untouched
    let mut other = X0;
    other[2] = 1.5;
    second.set_reference(&other).unwrap();
    second.set_initial_state(&HOVER).unwrap();
    second.solve();
    assert_eq!(first.workspace().u_matrix(), &first_inputs);

    // Same inputs on a fresh context give bit-identical results
    let mut fresh = hover_context();
    fresh.set_reference(&HOVER).unwrap();
    fresh.set_initial_state(&X0).unwrap();
    fresh.solve();
    assert_eq!(fresh.workspace().u_matrix(), &first_inputs);
    assert_eq!(fresh.workspace().iterations(), first.workspace().iterations());
}

#[test]
fn one_cache_drives_many_workspaces() {
    let reference = hover_workspace();
    let (A, B) = reference.dynamics();
    let cache = Cache::new(
        RHO,
        5000,
        A,
        B,
        &SVector::from_column_slice(&Q),
        &SVector::from_column_slice(&QF),
        &SVector::from_column_slice(&R),
    ).unwrap();
    let settings = hover_settings();

    let mut a = hover_workspace();
    let mut b = hover_workspace();
    let goal = SVector::from_column_slice(&HOVER);
    let x0 = SVector::from_column_slice(&X0);

    for work in [&mut a, &mut b] {
        work.set_const_x_reference(&goal);
        work.set_initial_state(&x0);
        Solver::new(&settings, &cache, work).solve();
    }

    assert_eq!(a.u_matrix(), b.u_matrix());
    assert_eq!(a.iterations(), b.iterations());
}
