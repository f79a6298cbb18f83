// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Alexandre Severino
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use std::ops::{Add, Div, Mul, Neg, Sub};

use rug::Rational;

use crate::kernel::Sign;

/// Exact rational scalar used whenever a floating point evaluation cannot be
/// certified.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CgarRational(pub Rational);

impl CgarRational {
    pub fn zero() -> Self {
        CgarRational(Rational::new())
    }

    /// Exact conversion; `None` for NaN and infinities.
    pub fn from_f64(v: f64) -> Option<Self> {
        Rational::from_f64(v).map(CgarRational)
    }

    pub fn sign(&self) -> Sign {
        Sign::from_ordering(self.0.cmp0())
    }

    pub fn is_zero(&self) -> bool {
        self.0.cmp0() == std::cmp::Ordering::Equal
    }

    /// Nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64()
    }

    /// `Some(v)` when the value is exactly representable as a finite `f64`.
    pub fn to_f64_exact(&self) -> Option<f64> {
        let v = self.0.to_f64();
        if !v.is_finite() {
            return None;
        }
        match Rational::from_f64(v) {
            Some(back) if back == self.0 => Some(v),
            _ => None,
        }
    }
}

impl From<i32> for CgarRational {
    fn from(v: i32) -> Self {
        CgarRational(Rational::from(v))
    }
}

impl<'a, 'b> Add<&'b CgarRational> for &'a CgarRational {
    type Output = CgarRational;

    fn add(self, rhs: &'b CgarRational) -> CgarRational {
        let mut result = self.0.clone();
        result += &rhs.0;
        CgarRational(result)
    }
}

impl<'a, 'b> Sub<&'b CgarRational> for &'a CgarRational {
    type Output = CgarRational;

    fn sub(self, rhs: &'b CgarRational) -> CgarRational {
        let mut result = self.0.clone();
        result -= &rhs.0;
        CgarRational(result)
    }
}

impl<'a, 'b> Mul<&'b CgarRational> for &'a CgarRational {
    type Output = CgarRational;

    fn mul(self, rhs: &'b CgarRational) -> CgarRational {
        let mut result = self.0.clone();
        result *= &rhs.0;
        CgarRational(result)
    }
}

impl<'a, 'b> Div<&'b CgarRational> for &'a CgarRational {
    type Output = CgarRational;

    fn div(self, rhs: &'b CgarRational) -> CgarRational {
        debug_assert!(!rhs.is_zero(), "rational division by zero");
        let mut result = self.0.clone();
        result /= &rhs.0;
        CgarRational(result)
    }
}

impl<'a> Neg for &'a CgarRational {
    type Output = CgarRational;

    fn neg(self) -> CgarRational {
        CgarRational(-self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_conversion_is_exact() {
        let r = CgarRational::from_f64(0.1).unwrap();
        assert_eq!(r.to_f64(), 0.1);
        assert_eq!(r.to_f64_exact(), Some(0.1));
        assert!(CgarRational::from_f64(f64::NAN).is_none());
        assert!(CgarRational::from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn thirds_are_not_representable() {
        let one = CgarRational::from(1);
        let three = CgarRational::from(3);
        let third = &one / &three;
        assert_eq!(third.to_f64_exact(), None);
        assert_eq!(&(&third * &three) - &one, CgarRational::zero());
    }

    #[test]
    fn sign_follows_value() {
        assert_eq!(CgarRational::from(-2).sign(), Sign::Negative);
        assert_eq!(CgarRational::zero().sign(), Sign::Zero);
        assert_eq!((-&CgarRational::from(-2)).sign(), Sign::Positive);
    }
}
