//! Arithmetic in GF(2^8) over x^8 + x^4 + x^3 + x + 1 (0x11B, the AES field).
//!
//! Multiplication and division go through log/exp tables that are built once,
//! on first use, and never written again.

use std::ops::{Add, AddAssign, Mul, MulAssign, Sub};
use std::sync::OnceLock;

use super::ShamirError;

/// Reduction byte for the primitive polynomial, with the x^8 term dropped
const REDUCTION: u8 = 0x1B;

/// 0x03 generates the multiplicative group of this field
const GENERATOR: u8 = 0x03;

struct Tables {
    log: [u8; 256],
    exp: [u8; 255],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mut log = [0u8; 256];
        let mut exp = [0u8; 255];
        let mut x: u8 = 1;
        for (i, slot) in exp.iter_mut().enumerate() {
            *slot = x;
            log[x as usize] = i as u8;
            x = reference_mul(x, GENERATOR);
        }
        Tables { log, exp }
    })
}

/// Shift-and-add multiplication, only used to build the tables
fn reference_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= REDUCTION;
        }
        b >>= 1;
    }
    product
}

/// An element of GF(256)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GF256(u8);

impl GF256 {
    pub const ZERO: GF256 = GF256(0);
    pub const ONE: GF256 = GF256(1);

    pub fn new(value: u8) -> Self {
        GF256(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Field division, failing when `rhs` is zero
    pub fn checked_div(self, rhs: GF256) -> Result<GF256, ShamirError> {
        if rhs.0 == 0 {
            return Err(ShamirError::DivisionByZero);
        }
        if self.0 == 0 {
            return Ok(GF256::ZERO);
        }
        let t = tables();
        let log_a = t.log[self.0 as usize] as usize;
        let log_b = t.log[rhs.0 as usize] as usize;
        Ok(GF256(t.exp[(log_a + 255 - log_b) % 255]))
    }
}

impl Add for GF256 {
    type Output = GF256;

    fn add(self, rhs: GF256) -> GF256 {
        GF256(self.0 ^ rhs.0)
    }
}

impl AddAssign for GF256 {
    fn add_assign(&mut self, rhs: GF256) {
        self.0 ^= rhs.0;
    }
}

// Characteristic 2: subtraction is addition.
impl Sub for GF256 {
    type Output = GF256;

    fn sub(self, rhs: GF256) -> GF256 {
        GF256(self.0 ^ rhs.0)
    }
}

impl Mul for GF256 {
    type Output = GF256;

    fn mul(self, rhs: GF256) -> GF256 {
        if self.0 == 0 || rhs.0 == 0 {
            return GF256::ZERO;
        }
        let t = tables();
        let log_a = t.log[self.0 as usize] as usize;
        let log_b = t.log[rhs.0 as usize] as usize;
        GF256(t.exp[(log_a + log_b) % 255])
    }
}

impl MulAssign for GF256 {
    fn mul_assign(&mut self, rhs: GF256) {
        *self = *self * rhs;
    }
}
