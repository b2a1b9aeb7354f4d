#![allow(non_snake_case)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{matrix, vector, SMatrix, SVector};
use tinympc_box::{Cache, MpcContext, Settings, Solver, Workspace};

#[path = "../demos/problem_data/quadrotor_20hz.rs"]
mod quadrotor_20hz;

fn hover_benchmark(c: &mut Criterion) {
    use quadrotor_20hz::*;

    const HX: usize = 10;
    const HU: usize = HX - 1;

    let mut work =
        Workspace::<f64, NX, NU, HX, HU>::from_row_major(&ADYN, &BDYN, &Q, &QF, &R).unwrap();
    work.set_const_u_bounds(&SVector::from_element(-0.5), &SVector::from_element(0.5)).unwrap();

    let settings = Settings::default().with_max_iter(100);
    let mut mpc = MpcContext::setup(settings, work, RHO, 5000).unwrap();
    mpc.set_reference(&HOVER).unwrap();

    c.bench_function("tinympc_quadrotor_hover_solve", |b| {
        b.iter(|| {
            mpc.set_initial_state(black_box(&X0)).unwrap();
            mpc.reset_duals();
            black_box(mpc.solve())
        });
    });
}

const KX: usize = 9;
const KU: usize = 3;
const DT: f32 = 0.1;
const DD: f32 = 0.5 * DT * DT;
const LP: f32 = 0.95;

const A: SMatrix<f32, KX, KX> = matrix![
    1., 0., 0., DT, 0., 0., DD, 0., 0.;
    0., 1., 0., 0., DT, 0., 0., DD, 0.;
    0., 0., 1., 0., 0., DT, 0., 0., DD;
    0., 0., 0., 1., 0., 0., DT, 0., 0.;
    0., 0., 0., 0., 1., 0., 0., DT, 0.;
    0., 0., 0., 0., 0., 1., 0., 0., DT;
    0., 0., 0., 0., 0., 0., LP, 0., 0.;
    0., 0., 0., 0., 0., 0., 0., LP, 0.;
    0., 0., 0., 0., 0., 0., 0., 0., LP;
];

const B: SMatrix<f32, KX, KU> = matrix![
    0., 0., 0.;
    0., 0., 0.;
    0., 0., 0.;
    0., 0., 0.;
    0., 0., 0.;
    0., 0., 0.;
    (1. - LP), 0., 0.;
    0., (1. - LP), 0.;
    0., 0., (1. - LP);
];

const KQ: SVector<f32, KX> = vector![5., 5., 5., 0., 0., 0., 0., 0., 0.];
const KR: SVector<f32, KU> = vector![1., 1., 1.];
const KRHO: f32 = 4.0;

fn kinematic_benchmark(c: &mut Criterion) {
    const HX: usize = 150;
    const HU: usize = HX - 1;

    let cache = Cache::new(KRHO, 1000, &A, &B, &KQ, &KQ, &KR).unwrap();
    let mut work = Workspace::<f32, KX, KU, HX, HU>::new(A, B, KQ, KQ, KR).unwrap();
    work.set_const_u_bounds(&SVector::from_element(-10.0), &SVector::from_element(10.0)).unwrap();

    let mut xref = SMatrix::<f32, KX, HX>::zeros();
    for i in 0..HX {
        xref[(0, i)] = (i as f32 / 25.0).sin() * 10.;
        xref[(1, i)] = (i as f32 / 25.0).cos() * 10.;
    }
    work.set_x_reference(&xref);

    let settings = Settings::default()
        .with_max_iter(6)
        .with_check_interval(3);

    c.bench_function("tinympc_kinematic3d_solve", |b| {
        b.iter(|| {
            work.set_initial_state(&SVector::zeros());
            black_box(Solver::new(&settings, &cache, &mut work).solve())
        });
    });
}

criterion_group!(benches, hover_benchmark, kinematic_benchmark);
criterion_main!(benches);
