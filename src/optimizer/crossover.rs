use fastrand::Rng;

/// Partially matched crossover (PMX) with random cut points.
///
/// Returns two children: the first keeps `p1`'s segment, the second keeps
/// `p2`'s. Both are valid permutations whenever the parents are.
pub fn pmx(p1: &[usize], p2: &[usize], rng: &mut Rng) -> (Vec<usize>, Vec<usize>) {
    let (start, end) = random_cuts(p1.len(), rng);
    pmx_with_cuts(p1, p2, start, end)
}

/// Two distinct cut points `start < end` in `0..=len`.
pub fn random_cuts(len: usize, rng: &mut Rng) -> (usize, usize) {
    if len < 2 {
        return (0, len);
    }
    let a = rng.usize(0..=len);
    let mut b = rng.usize(0..len);
    if b >= a {
        b += 1;
    }
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// PMX over the fixed segment `[start, end)`.
pub fn pmx_with_cuts(
    p1: &[usize],
    p2: &[usize],
    start: usize,
    end: usize,
) -> (Vec<usize>, Vec<usize>) {
    debug_assert_eq!(p1.len(), p2.len());
    let end = end.min(p1.len());
    let start = start.min(end);
    (
        build_child(p1, p2, start, end),
        build_child(p2, p1, start, end),
    )
}

/// Copies `template[start..end]` into the child, then places the donor's
/// remaining genes. A donor gene already present in the segment is replaced
/// by following the mapping chain `template[k] -> donor[k]` until it leaves
/// the segment.
fn build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![0usize; n];
    let mut in_segment = vec![false; n];
    let mut template_pos = vec![0usize; n];

    for (i, &v) in template.iter().enumerate() {
        template_pos[v] = i;
    }
    for i in start..end {
        child[i] = template[i];
        in_segment[template[i]] = true;
    }

    for i in (0..start).chain(end..n) {
        let mut gene = donor[i];
        while in_segment[gene] {
            gene = donor[template_pos[gene]];
        }
        child[i] = gene;
    }

    child
}
