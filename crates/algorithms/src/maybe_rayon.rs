//! Row loops run on rayon with the `parallel` feature and on a plain
//! iterator without it. Import with `use crate::maybe_rayon::*`.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

/// `into_par_iter()` for builds without rayon. The chain that follows
/// resolves to the standard `Iterator` adapters.
#[cfg(not(feature = "parallel"))]
pub trait IntoParallelIterator: IntoIterator + Sized {
    fn into_par_iter(self) -> Self::IntoIter {
        self.into_iter()
    }
}

#[cfg(not(feature = "parallel"))]
impl<I: IntoIterator> IntoParallelIterator for I {}
