use numsim_lsolver::{
    algorithms::{Jacobi, PreconditionedConjugateGradient, SolveAlgorithm, Sor},
    factorization::ilu0,
    IterationInfo, Result, SolveResult, SparseMatrix,
};
use std::f64::consts::PI;
use std::time::Instant;

/// Assembles the 5-point finite-difference Laplacian `-Δu` on an `n x n`
/// interior grid of the unit square with homogeneous Dirichlet boundaries.
/// Unknown `(i, j)` is stored at index `i * n + j`.
fn create_poisson_matrix(n: usize) -> SparseMatrix<f64> {
    let h = 1.0 / (n + 1) as f64;
    let inv_h2 = 1.0 / (h * h);
    let mut a = SparseMatrix::with_capacity(n * n, n * n, 5 * n * n);

    for i in 0..n {
        for j in 0..n {
            let row = i * n + j;
            // Columns in ascending order so every set() appends
            if i > 0 {
                a.set(row, row - n, -inv_h2);
            }
            if j > 0 {
                a.set(row, row - 1, -inv_h2);
            }
            a.set(row, row, 4.0 * inv_h2);
            if j + 1 < n {
                a.set(row, row + 1, -inv_h2);
            }
            if i + 1 < n {
                a.set(row, row + n, -inv_h2);
            }
        }
    }
    a
}

/// Grid samples of `f(x, y)` at the interior nodes.
fn sample(n: usize, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    let h = 1.0 / (n + 1) as f64;
    (0..n * n)
        .map(|k| f((k / n + 1) as f64 * h, (k % n + 1) as f64 * h))
        .collect()
}

fn max_error(x: &[f64], exact: &[f64]) -> f64 {
    x.iter()
        .zip(exact)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

fn main() {
    // Initialize logging based on RUST_LOG environment variable
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Usage: poisson_fdm [grid size] [SOR weight]
    let mut args = std::env::args().skip(1);
    let n: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(24);
    let weight: f64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2.0 / (1.0 + (PI / (n + 1) as f64).sin()));
    let tolerance = 1e-6;
    let max_iterations = 20 * n * n;

    log::info!("Setting up {}x{} Poisson grid ({} unknowns)...", n, n, n * n);
    let a = create_poisson_matrix(n);
    log::info!(
        "  Non-zeros: {} (fill ratio {:.4})",
        a.nnz(),
        a.nnz() as f64 / a.size() as f64
    );

    // u = sin(pi x) sin(pi y)  =>  -Δu = 2 pi^2 u
    let exact = sample(n, |x, y| (PI * x).sin() * (PI * y).sin());
    let b: Vec<f64> = exact.iter().map(|u| 2.0 * PI * PI * u).collect();
    let x0 = vec![0.0; n * n];

    log::info!("  Tolerance: {}", tolerance);
    log::info!("  Max Iterations: {}", max_iterations);

    let sor = Sor::with_params(weight, tolerance, max_iterations);
    let jacobi = Jacobi::with_params(tolerance, max_iterations);
    let ilu = match ilu0(&a) {
        Ok(factors) => factors,
        Err(e) => {
            log::error!("ILU(0) failed: {}", e);
            return;
        }
    };
    let pcg = PreconditionedConjugateGradient::with_params(ilu, tolerance, max_iterations);

    report("SOR", &exact, || sor.solve(&a, &b, &x0));
    report("Jacobi", &exact, || jacobi.solve(&a, &b, &x0));
    report("PCG + ILU(0)", &exact, || pcg.solve(&a, &b, &x0));
}

fn report(
    name: &str,
    exact: &[f64],
    run: impl FnOnce() -> Result<SolveResult<f64, IterationInfo>>,
) {
    log::info!("Running {} solver...", name);
    let start_time = Instant::now();
    let x_result = run();
    let duration = start_time.elapsed();

    match x_result {
        Ok(result) => {
            log::info!("{} finished:", name);
            log::info!("  Converged: {}", result.metadata.converged);
            log::info!("  Iterations: {}", result.metadata.iterations);
            log::info!(
                "  Final Residual Norm: {:.6e}",
                result.metadata.residual_norm
            );
            log::info!("  Max error vs analytic: {:.6e}", max_error(&result.x, exact));
            log::info!("  Time elapsed: {:?}", duration);
        }
        Err(e) => {
            // Use log::error for errors
            log::error!("{} failed: {}", name, e);
        }
    }
}
