//! Conditional parallel iteration over positions.

use super::config::EngineConfig;

/// Maps a function over items, in parallel when the config allows it.
///
/// Output order always matches input order.
#[allow(unused_variables)]
pub(crate) fn maybe_parallel_map<T, U, F>(items: &[T], config: &EngineConfig, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if config.should_parallelize(items.len()) {
            return items.par_iter().map(f).collect();
        }
    }

    items.iter().map(f).collect()
}
