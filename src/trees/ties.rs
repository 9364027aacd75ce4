//! Epsilon-tolerant maxima and tie-breaking.
use super::params::TieBreak;
use crate::data::dataset::RealNumber;
use rand::Rng;

/// Largest finite-or-infinite value and the indices within `epsilon` of it.
///
/// NaNs are ignored. Returns `None` when nothing is comparable. When the
/// maximum is infinite only exact matches count as ties.
pub(crate) fn max_with_ties<T: RealNumber>(values: &[T], epsilon: T) -> Option<(T, Vec<usize>)> {
    let max = values
        .iter()
        .copied()
        .filter(|value| !value.is_nan())
        .fold(None, |best: Option<T>, value| match best {
            Some(best) if best >= value => Some(best),
            _ => Some(value),
        })?;

    let ties = values
        .iter()
        .enumerate()
        .filter(|(_, &value)| value == max || (value - max).abs() < epsilon)
        .map(|(index, _)| index)
        .collect();
    Some((max, ties))
}

impl TieBreak {
    /// Picks one of `ties`, which must not be empty.
    pub(crate) fn choose<R: Rng + ?Sized>(&self, ties: &[usize], rng: &mut R) -> usize {
        match self {
            TieBreak::First => ties[0],
            TieBreak::Random => ties[rng.gen_range(0..ties.len())],
        }
    }
}
