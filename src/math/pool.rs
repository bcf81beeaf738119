use anyhow::Result;

#[cfg(feature = "mt")]
use rayon::prelude::*;

/// Runs `unit(i)` for every `i in 0..n_units` and returns the results in
/// index order, whatever order the workers finished in. A failing unit does
/// not stop the others. `threads == 0` lets the pool pick.
pub fn run_indexed<T, F>(threads: usize, n_units: usize, unit: F) -> Result<Vec<Result<T>>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    #[cfg(feature = "mt")]
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
        Ok(pool.install(|| (0..n_units).into_par_iter().map(&unit).collect()))
    }

    #[cfg(not(feature = "mt"))]
    {
        let _ = threads;
        Ok((0..n_units).map(unit).collect())
    }
}

pub fn backend_name() -> &'static str {
    if cfg!(feature = "mt") { "rayon" } else { "sequential" }
}
