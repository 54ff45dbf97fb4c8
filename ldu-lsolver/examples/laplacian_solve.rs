use ldu_lsolver::{
    Amgx, AmgxSolver, LduAddressing, LduMatrix, LsolverError, SolverControls,
};
use std::time::Instant;

/// Creates the 5-point Laplacian of an `nx` x `ny` cell grid in LDU form.
/// Faces are numbered row by row, x-faces before y-faces within a row of
/// cells. Boundary cells get one extra diagonal unit per boundary face.
fn create_laplacian_2d(nx: usize, ny: usize) -> Result<LduMatrix<f64>, LsolverError> {
    let n = nx * ny;
    let mut owners = Vec::new();
    let mut neighbours = Vec::new();
    let mut diag = vec![0.0; n];

    for j in 0..ny {
        for i in 0..nx {
            let cell = j * nx + i;
            if i + 1 < nx {
                owners.push(cell);
                neighbours.push(cell + 1);
            } else {
                diag[cell] += 1.0;
            }
            if j + 1 < ny {
                owners.push(cell);
                neighbours.push(cell + nx);
            } else {
                diag[cell] += 1.0;
            }
            if i == 0 {
                diag[cell] += 1.0;
            }
            if j == 0 {
                diag[cell] += 1.0;
            }
        }
    }
    for (&own, &nei) in owners.iter().zip(&neighbours) {
        diag[own] += 1.0;
        diag[nei] += 1.0;
    }

    let n_faces = owners.len();
    let addressing = LduAddressing::new(n, owners, neighbours)?;
    Ok(LduMatrix::symmetric(addressing, diag, vec![-1.0; n_faces])?)
}

fn main() -> Result<(), LsolverError> {
    env_logger::init();

    let (nx, ny) = (256, 256);
    let matrix = create_laplacian_2d(nx, ny)?;
    let source = vec![1.0; nx * ny];
    let mut psi = vec![0.0; nx * ny];
    println!(
        "Created {}x{} Laplacian: {} cells, {} faces",
        nx,
        ny,
        nx * ny,
        matrix.addressing().n_faces()
    );

    let mut solver = AmgxSolver::new("p", Amgx::shared(), SolverControls::default())?;

    for step in 0..3 {
        let start = Instant::now();
        let performance = solver.solve(&matrix, &mut psi, &source, 0)?;
        println!("{}", performance);
        println!("Step {} took {:?}", step, start.elapsed());
    }

    let max = psi.iter().cloned().fold(f64::MIN, f64::max);
    println!("Max psi: {:.6}", max);
    Ok(())
}
