use fastrand::Rng;

/// Index-shuffle mutation.
///
/// Every position is, with probability `indpb`, swapped with a different
/// position chosen uniformly. Returns a new assignment; swaps keep it a
/// permutation.
pub fn shuffle_indexes(genes: &[usize], indpb: f64, rng: &mut Rng) -> Vec<usize> {
    let mut out = genes.to_vec();
    let len = out.len();
    if len < 2 {
        return out;
    }

    for i in 0..len {
        if rng.f64() < indpb {
            let mut j = rng.usize(0..len - 1);
            if j >= i {
                j += 1;
            }
            out.swap(i, j);
        }
    }
    out
}
