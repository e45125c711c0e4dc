use plonk_composer::Fr;
use proptest::prelude::*;

fn fr() -> impl Strategy<Value = Fr> {
    any::<[u64; 4]>().prop_map(|limbs| {
        // clear the top bits so the limbs are always below the modulus
        Fr::from_canonical([limbs[0], limbs[1], limbs[2], limbs[3] >> 4]).unwrap_or_else(Fr::zero)
    })
}

proptest! {
    #[test]
    fn add_then_sub(a in fr(), b in fr()) {
        prop_assert_eq!((a + b) - b, a);
    }

    #[test]
    fn mul_then_div(a in fr(), b in fr()) {
        prop_assume!(!b.is_zero());
        prop_assert_eq!((a * b) / b, a);
    }

    #[test]
    fn invert_is_inverse(a in fr()) {
        prop_assume!(!a.is_zero());
        prop_assert!((a * a.invert()).is_one());
    }

    #[test]
    fn batch_invert_matches(values in proptest::collection::vec(fr(), 1..16)) {
        let mut batch = values.clone();
        Fr::batch_invert(&mut batch);
        for (v, inv) in values.iter().zip(&batch) {
            if v.is_zero() {
                continue;
            }
            prop_assert_eq!(*inv, v.invert());
        }
    }

    #[test]
    fn endomorphism_split(k in fr()) {
        let lambda = Fr::cube_root_of_unity();
        let (k1, k2) = k.split_into_endomorphism_scalars();
        prop_assert_eq!(k1 - k2 * lambda, k);
        prop_assert!(k1.to_signed_u128().is_some());
        prop_assert!(k2.to_signed_u128().is_some());
    }

    #[test]
    fn sqrt_of_square(a in fr()) {
        let (found, root) = a.square().sqrt();
        prop_assert!(found);
        prop_assert!(root == a || root == -a);
    }
}
