/// Concatenates supplied slices into one continuous vector.
#[macro_export]
macro_rules! concat_slices {
    ($($slice: expr),+) => {
        [$(&$slice[..]),+].concat()
    }
}

/// Product of pairings of the supplied `G1, G2` pairs, separated by `;`. The pairing engine
/// defaults to a type named `E` in scope.
/// ```compile_fail
/// pairing_product! { a, b; c, d }
/// ```
/// expands to `E::multi_pairing([a.into(), c.into()], [b.into(), d.into()])`
#[macro_export]
macro_rules! pairing_product {
    (using $pairing_engine: ident: $($g1: expr, $g2: expr);+) => {
        <$pairing_engine as ark_ec::pairing::Pairing>::multi_pairing(
            [$(<$pairing_engine as ark_ec::pairing::Pairing>::G1Prepared::from($g1)),+],
            [$(<$pairing_engine as ark_ec::pairing::Pairing>::G2Prepared::from($g2)),+],
        )
    };
    ($($g1: expr, $g2: expr);+) => {
        $crate::pairing_product! { using E: $($g1, $g2);+ }
    };
}
