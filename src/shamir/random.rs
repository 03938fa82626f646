//! Draws from a cryptographically secure generator.
//!
//! Everything here goes through `try_fill_bytes`, so a failing source is
//! reported to the caller instead of panicking or falling back.

use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use super::ShamirError;

/// Fill `dest` with random bytes
pub fn fill<R: RngCore + CryptoRng>(rng: &mut R, dest: &mut [u8]) -> Result<(), ShamirError> {
    rng.try_fill_bytes(dest)
        .map_err(ShamirError::RandomSourceFailure)
}

/// Uniform index in `0..bound`, by rejection sampling so there is no modulo bias
fn uniform_index<R: RngCore + CryptoRng>(rng: &mut R, bound: usize) -> Result<usize, ShamirError> {
    debug_assert!(bound > 0 && bound <= u32::MAX as usize);
    let bound = bound as u32;
    // Largest value such that zone + 1 is a multiple of bound
    let zone = u32::MAX - (u32::MAX - bound + 1) % bound;

    let mut buf = Zeroizing::new([0u8; 4]);
    loop {
        fill(rng, &mut buf[..])?;
        let v = u32::from_le_bytes(*buf);
        if v <= zone {
            return Ok((v % bound) as usize);
        }
    }
}

/// Fisher-Yates shuffle in place
pub fn shuffle<T, R: RngCore + CryptoRng>(rng: &mut R, items: &mut [T]) -> Result<(), ShamirError> {
    for i in (1..items.len()).rev() {
        let j = uniform_index(rng, i + 1)?;
        items.swap(i, j);
    }
    Ok(())
}

/// `count` distinct nonzero field elements, uniformly chosen
///
/// The caller must already have checked `count <= 255`.
pub fn distinct_coordinates<R: RngCore + CryptoRng>(
    rng: &mut R,
    count: usize,
) -> Result<Zeroizing<Vec<u8>>, ShamirError> {
    debug_assert!(count <= 255);
    let mut elements: Zeroizing<Vec<u8>> = Zeroizing::new((1..=255u8).collect());
    shuffle(rng, &mut elements[..])?;
    elements.truncate(count);
    Ok(elements)
}
