mod gf256;
pub mod random;

use std::fmt;

use gf256::GF256;
use log::debug;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Largest share count, one per nonzero field element
pub const MAX_SHARES: usize = 255;

#[derive(Debug, Error)]
pub enum ShamirError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(&'static str),
    #[error("all shares must have the same length and carry at least one data byte")]
    InconsistentShares,
    #[error("shares must have distinct tags (tag {0} appears more than once)")]
    DuplicateShare(u8),
    #[error("share tag cannot be zero")]
    InvalidShareTag,
    #[error("secure random source failed: {0}")]
    RandomSourceFailure(#[source] rand::Error),
    #[error("division by zero in GF(256)")]
    DivisionByZero,
}

/// Share represents a single share from the Shamir Secret Sharing scheme.
///
/// Layout is `L` evaluation bytes followed by one x-coordinate tag byte,
/// the same layout other GF(256) implementations with a trailing tag use.
/// The buffer is wiped when the share is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    bytes: Vec<u8>,
}

impl Share {
    /// Wrap raw share bytes, e.g. after decoding them from transport form
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The x-coordinate this share was evaluated at
    pub fn tag(&self) -> u8 {
        self.bytes.last().copied().unwrap_or(0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Share {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// Share bytes are sensitive; only show the shape.
impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("tag", &self.tag())
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Split a secret into n shares, requiring t shares to reconstruct.
///
/// Randomness comes from the operating system.
pub fn split(secret: &[u8], shares: usize, threshold: usize) -> Result<Vec<Share>, ShamirError> {
    split_with_rng(secret, shares, threshold, &mut OsRng)
}

/// Same as [`split`] but draws from the given generator
pub fn split_with_rng<R: RngCore + CryptoRng>(
    secret: &[u8],
    shares: usize,
    threshold: usize,
    rng: &mut R,
) -> Result<Vec<Share>, ShamirError> {
    // Validate inputs before touching the generator
    check_split_parameters(secret.len(), shares, threshold)?;
    debug!(
        "splitting {} byte secret into {} shares, threshold {}",
        secret.len(),
        shares,
        threshold
    );

    let coordinates = random::distinct_coordinates(rng, shares)?;
    let share_len = secret.len() + 1;
    let mut result: Vec<Share> = coordinates
        .iter()
        .map(|&x| {
            let mut bytes = vec![0u8; share_len];
            bytes[share_len - 1] = x;
            Share { bytes }
        })
        .collect();

    // coefficients[0] is the secret byte, the rest are random.
    // On an early return both this buffer and the partial shares are wiped on drop.
    let mut coefficients = Zeroizing::new(vec![0u8; threshold]);

    for (i, &byte) in secret.iter().enumerate() {
        coefficients[0] = byte;
        random::fill(rng, &mut coefficients[1..])?;

        for share in result.iter_mut() {
            let x = GF256::new(share.tag());
            share.bytes[i] = evaluate(&coefficients, x).value();
        }

        coefficients[..].zeroize();
    }

    Ok(result)
}

/// Horner evaluation; `coefficients[0]` is the constant term
fn evaluate(coefficients: &[u8], x: GF256) -> GF256 {
    coefficients
        .iter()
        .rev()
        .fold(GF256::ZERO, |acc, &c| acc * x + GF256::new(c))
}

/// Combine shares to recover the original secret.
///
/// Shares from different splits, or fewer than the original threshold,
/// still interpolate to *something*; there is no way to detect that here.
pub fn combine<S: AsRef<[u8]>>(shares: &[S]) -> Result<Zeroizing<Vec<u8>>, ShamirError> {
    let secret_len = check_share_set(shares)?;
    debug!("combining {} shares of a {} byte secret", shares.len(), secret_len);

    let xs: Vec<GF256> = shares
        .iter()
        .map(|s| GF256::new(s.as_ref()[secret_len]))
        .collect();

    // Lagrange basis polynomials evaluated at x = 0. They depend only on the
    // tags, so every byte position reuses them.
    let mut basis = Vec::with_capacity(xs.len());
    for (j, &x_j) in xs.iter().enumerate() {
        let mut term = GF256::ONE;
        for (m, &x_m) in xs.iter().enumerate() {
            if m == j {
                continue;
            }
            term *= x_m.checked_div(x_m - x_j)?;
        }
        basis.push(term);
    }

    let mut result = Zeroizing::new(Vec::with_capacity(secret_len));
    for byte_idx in 0..secret_len {
        let mut value = GF256::ZERO;
        for (share, &l) in shares.iter().zip(basis.iter()) {
            value += l * GF256::new(share.as_ref()[byte_idx]);
        }
        result.push(value.value());
    }

    Ok(result)
}

fn check_split_parameters(
    secret_len: usize,
    shares: usize,
    threshold: usize,
) -> Result<(), ShamirError> {
    if !(2..=MAX_SHARES).contains(&shares) {
        return Err(ShamirError::InvalidParameters(
            "shares must be between 2 and 255",
        ));
    }
    if threshold < 2 {
        return Err(ShamirError::InvalidParameters("threshold must be at least 2"));
    }
    if threshold > shares {
        return Err(ShamirError::InvalidParameters(
            "threshold cannot exceed the number of shares",
        ));
    }
    if secret_len == 0 {
        return Err(ShamirError::InvalidParameters("secret cannot be empty"));
    }
    Ok(())
}

/// Structural checks on a share set. Returns the secret length.
fn check_share_set<S: AsRef<[u8]>>(shares: &[S]) -> Result<usize, ShamirError> {
    if shares.len() < 2 {
        return Err(ShamirError::InvalidParameters(
            "at least two shares are required",
        ));
    }

    let share_len = shares[0].as_ref().len();
    if share_len < 2 || shares.iter().any(|s| s.as_ref().len() != share_len) {
        return Err(ShamirError::InconsistentShares);
    }

    let mut seen = [false; 256];
    for share in shares {
        let tag = share.as_ref()[share_len - 1];
        if tag == 0 {
            return Err(ShamirError::InvalidShareTag);
        }
        if seen[tag as usize] {
            return Err(ShamirError::DuplicateShare(tag));
        }
        seen[tag as usize] = true;
    }

    Ok(share_len - 1)
}
