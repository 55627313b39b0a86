//! The STARK curve `y^2 = x^3 + alpha * x + beta` over the STARK prime field
//!
//! `Point` is the public affine form. Its `add` and `double` are the textbook
//! chord-and-tangent formulas and are only used on public data (verification,
//! tests).
//!
//! `scalar_mul` runs on secret scalars. It is a Montgomery ladder over
//! projective coordinates using the complete addition formulas of
//! Renes-Costello-Batina (2016, algorithm 1). The curve has prime order, so
//! one formula covers doubling and the identity with no special cases. Swaps
//! are masked with `subtle`, and the final conversion inverts by a fixed
//! exponent. Every scalar costs the same field operations.
use std::ops::Neg;
use std::sync::LazyLock;

use subtle::{Choice, ConditionallySelectable};

use crate::error::{Result, SignerError};
use crate::field::{constant, FieldElement};
use crate::scalar::Scalar;

pub const CURVE_ALPHA: FieldElement = FieldElement::ONE;

pub const CURVE_BETA_HEX: &str =
    "0x6f21413efbe40de150e596d72f7a8c5609ad26c15c915c1f4cdfcb99cee9e89";

pub const GENERATOR_X_HEX: &str =
    "0x1ef15c18599971b7beced415a40f0c7deacfd9b0d1819e03d723d8bc943cfca";

pub const GENERATOR_Y_HEX: &str =
    "0x5668060aa49730b7be4801df46ec62de53ecd11abe43a32873000c36e8dc1f";

static CURVE_BETA: LazyLock<FieldElement> = LazyLock::new(|| constant(CURVE_BETA_HEX));

/// `3 * beta`
static CURVE_B3: LazyLock<FieldElement> =
    LazyLock::new(|| FieldElement::from_u64(3) * *CURVE_BETA);

static GENERATOR: LazyLock<Point> = LazyLock::new(|| Point::Affine {
    x: constant(GENERATOR_X_HEX),
    y: constant(GENERATOR_Y_HEX),
});

/// A point on the STARK curve, or the identity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine { x: FieldElement, y: FieldElement },
}

impl Point {
    /// Checked construction from coordinates
    pub fn new(x: FieldElement, y: FieldElement) -> Result<Self> {
        let point = Point::Affine { x, y };
        if !point.is_on_curve() {
            return Err(SignerError::InvalidPoint {
                x: x.to_hex_string(),
                y: y.to_hex_string(),
            });
        }
        Ok(point)
    }

    /// The base point `G`
    pub fn generator() -> Self {
        *GENERATOR
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    pub fn x(&self) -> Option<FieldElement> {
        match self {
            Point::Infinity => None,
            Point::Affine { x, .. } => Some(*x),
        }
    }

    pub fn y(&self) -> Option<FieldElement> {
        match self {
            Point::Infinity => None,
            Point::Affine { y, .. } => Some(*y),
        }
    }

    pub fn is_on_curve(&self) -> bool {
        match self {
            Point::Infinity => true,
            Point::Affine { x, y } => {
                y.square() == x.square() * *x + CURVE_ALPHA * *x + *CURVE_BETA
            }
        }
    }

    pub fn add(&self, other: &Point) -> Result<Point> {
        match (self, other) {
            (Point::Infinity, p) | (p, Point::Infinity) => Ok(*p),
            (Point::Affine { x: x1, y: y1 }, Point::Affine { x: x2, y: y2 }) => {
                if x1 == x2 {
                    if y1 == y2 {
                        return self.double();
                    }
                    // P + (-P)
                    return Ok(Point::Infinity);
                }
                let lambda = (*y2 - *y1) * (*x2 - *x1).inverse()?;
                let x3 = lambda.square() - *x1 - *x2;
                let y3 = lambda * (*x1 - x3) - *y1;
                Ok(Point::Affine { x: x3, y: y3 })
            }
        }
    }

    pub fn double(&self) -> Result<Point> {
        match self {
            Point::Infinity => Ok(Point::Infinity),
            Point::Affine { x, y } => {
                if y.is_zero() {
                    return Ok(Point::Infinity);
                }
                let three = FieldElement::from_u64(3);
                let two = FieldElement::from_u64(2);
                let lambda = (three * x.square() + CURVE_ALPHA) * (two * *y).inverse()?;
                let x3 = lambda.square() - two * *x;
                let y3 = lambda * (*x - x3) - *y;
                Ok(Point::Affine { x: x3, y: y3 })
            }
        }
    }

    /// `k * self` via a Montgomery ladder.
    ///
    /// Runs exactly `SCALAR_BITS` steps of two complete additions each, with
    /// branch-free swaps, whatever the value of `k`.
    pub fn scalar_mul(&self, k: &Scalar) -> Result<Point> {
        let mut r0 = ProjectivePoint::IDENTITY;
        let mut r1 = ProjectivePoint::from(*self);
        for bit in k.bits_be() {
            ProjectivePoint::conditional_swap(&mut r0, &mut r1, bit);
            r1 = r0.add(&r1);
            r0 = r0.add(&r0);
            ProjectivePoint::conditional_swap(&mut r0, &mut r1, bit);
        }
        Ok(r0.to_affine())
    }
}

/// `(X : Y : Z)` standing for `(X / Z, Y / Z)`; `Z = 0` is the identity
#[derive(Clone, Copy)]
struct ProjectivePoint {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl ProjectivePoint {
    const IDENTITY: Self = Self {
        x: FieldElement::ZERO,
        y: FieldElement::ONE,
        z: FieldElement::ZERO,
    };

    /// Complete addition, valid for equal inputs and the identity
    fn add(&self, other: &Self) -> Self {
        let (x1, y1, z1) = (self.x, self.y, self.z);
        let (x2, y2, z2) = (other.x, other.y, other.z);
        let a = CURVE_ALPHA;
        let b3 = *CURVE_B3;

        let t0 = x1 * x2;
        let t1 = y1 * y2;
        let t2 = z1 * z2;
        let t3 = (x1 + y1) * (x2 + y2) - (t0 + t1);
        let t4 = (x1 + z1) * (x2 + z2) - (t0 + t2);
        let t5 = (y1 + z1) * (y2 + z2) - (t1 + t2);

        let z3 = b3 * t2 + a * t4;
        let x3 = t1 - z3;
        let z3 = t1 + z3;
        let y3 = x3 * z3;

        let a_t2 = a * t2;
        let t1 = t0 + t0 + t0 + a_t2;
        let t2 = a * (t0 - a_t2);
        let t4 = b3 * t4 + t2;

        Self {
            x: x3 * t3 - t5 * t4,
            y: y3 + t1 * t4,
            z: z3 * t5 + t3 * t1,
        }
    }

    fn to_affine(self) -> Point {
        let z_inv = self.z.fermat_inverse();
        let (x, y) = (self.x * z_inv, self.y * z_inv);
        if self.z.is_zero() {
            return Point::Infinity;
        }
        Point::Affine { x, y }
    }
}

impl From<Point> for ProjectivePoint {
    fn from(point: Point) -> Self {
        match point {
            Point::Infinity => Self::IDENTITY,
            Point::Affine { x, y } => Self {
                x,
                y,
                z: FieldElement::ONE,
            },
        }
    }
}

impl ConditionallySelectable for ProjectivePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
        }
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        match self {
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => Point::Affine { x, y: -y },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::curve_order;
    use proptest::prelude::*;

    #[test]
    fn test_generator_is_on_curve() {
        let g = Point::generator();
        assert!(g.is_on_curve());
        assert!(Point::new(g.x().unwrap(), g.y().unwrap()).is_ok());
    }

    #[test]
    fn test_off_curve_point_rejected() {
        let g = Point::generator();
        let result = Point::new(g.x().unwrap(), g.y().unwrap() + FieldElement::ONE);
        assert!(matches!(result, Err(SignerError::InvalidPoint { .. })));
    }

    #[test]
    fn test_identity_laws() {
        let g = Point::generator();
        assert_eq!(g.add(&Point::Infinity).unwrap(), g);
        assert_eq!(Point::Infinity.add(&g).unwrap(), g);
        assert_eq!(g.add(&-g).unwrap(), Point::Infinity);
        assert_eq!(Point::Infinity.double().unwrap(), Point::Infinity);
    }

    #[test]
    fn test_small_multiples() {
        let g = Point::generator();
        let two_g = g.double().unwrap();
        assert_eq!(g.add(&g).unwrap(), two_g);
        assert!(two_g.is_on_curve());

        assert_eq!(g.scalar_mul(&Scalar::zero()).unwrap(), Point::Infinity);
        assert_eq!(g.scalar_mul(&Scalar::one()).unwrap(), g);
        assert_eq!(g.scalar_mul(&Scalar::from_u64(2)).unwrap(), two_g);
        assert_eq!(
            g.scalar_mul(&Scalar::from_u64(3)).unwrap(),
            two_g.add(&g).unwrap()
        );
    }

    #[test]
    fn test_order_minus_one_is_negation() {
        let g = Point::generator();
        let n_minus_one = Scalar::new(curve_order() - 1u32).unwrap();
        let p = g.scalar_mul(&n_minus_one).unwrap();
        assert_eq!(p, -g);
        assert_eq!(p.add(&g).unwrap(), Point::Infinity);
    }

    #[test]
    fn test_scalar_mul_of_infinity() {
        assert_eq!(
            Point::Infinity.scalar_mul(&Scalar::from_u64(99)).unwrap(),
            Point::Infinity
        );
    }

    #[test]
    fn test_public_key_matches_starknet_crypto() {
        for key in ["0x1", "0x1234def56789012345678901234567890123456789012345678901234567890"] {
            let d = FieldElement::from_hex_str(key).unwrap();
            let q = Point::generator()
                .scalar_mul(&Scalar::from_field_element(&d).unwrap())
                .unwrap();
            let expected = starknet_crypto::get_public_key(&d.to_felt());
            assert_eq!(q.x().unwrap().to_felt(), expected);
        }
    }

    #[test]
    fn test_ladder_work_is_independent_of_scalar() {
        use crate::field::op_count;

        let g = Point::generator();
        let scalars = [
            Scalar::one(),
            Scalar::from_u64(0x8000_0000),
            Scalar::new(curve_order() - 1u32).unwrap(),
        ];
        g.scalar_mul(&Scalar::one()).unwrap();
        op_count::take();

        let counts: Vec<(u64, u64)> = scalars
            .iter()
            .map(|k| {
                g.scalar_mul(k).unwrap();
                op_count::take()
            })
            .collect();

        assert_eq!(counts[0].1, 1);
        assert!(counts[0].0 > 0);
        assert!(counts.iter().all(|c| *c == counts[0]), "{:?}", counts);
    }

    #[test]
    fn test_projective_add_handles_identity_and_doubling() {
        let g = Point::generator();
        let pg = ProjectivePoint::from(g);
        let identity = ProjectivePoint::IDENTITY;

        assert_eq!(pg.add(&identity).to_affine(), g);
        assert_eq!(identity.add(&pg).to_affine(), g);
        assert_eq!(identity.add(&identity).to_affine(), Point::Infinity);
        assert_eq!(pg.add(&pg).to_affine(), g.double().unwrap());
        assert_eq!(
            pg.add(&ProjectivePoint::from(-g)).to_affine(),
            Point::Infinity
        );
    }

    #[test]
    fn test_conditional_swap() {
        let g = ProjectivePoint::from(Point::generator());
        let mut a = ProjectivePoint::IDENTITY;
        let mut b = g;
        ProjectivePoint::conditional_swap(&mut a, &mut b, Choice::from(0));
        assert_eq!(a.to_affine(), Point::Infinity);
        ProjectivePoint::conditional_swap(&mut a, &mut b, Choice::from(1));
        assert_eq!(a.to_affine(), Point::generator());
        assert_eq!(b.to_affine(), Point::Infinity);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn scalar_mul_distributes(a in any::<u64>(), b in any::<u64>()) {
            let g = Point::generator();
            let sa = Scalar::from_u64(a);
            let sb = Scalar::from_u64(b);
            let lhs = g.scalar_mul(&(&sa + &sb)).unwrap();
            let rhs = g.scalar_mul(&sa).unwrap().add(&g.scalar_mul(&sb).unwrap()).unwrap();
            prop_assert_eq!(lhs, rhs);
            prop_assert!(lhs.is_on_curve());
        }
    }
}
