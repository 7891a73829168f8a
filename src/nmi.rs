use rustc_hash::FxHashMap;

/// Symmetric normalised mutual information between two labelings:
/// 2 I(A;B) / (H(A) + H(B)), 0 for mismatched or empty inputs and for the
/// degenerate case where both entropies vanish.
pub fn calculate_nmi(labels_a: &[u32], labels_b: &[u32]) -> f64 {
    if labels_a.len() != labels_b.len() || labels_a.is_empty() {
        return 0.0;
    }

    let n = labels_a.len() as f64;
    let mut count_a: FxHashMap<u32, usize> = FxHashMap::default();
    let mut count_b: FxHashMap<u32, usize> = FxHashMap::default();
    let mut joint: FxHashMap<(u32, u32), usize> = FxHashMap::default();

    for (&a, &b) in labels_a.iter().zip(labels_b.iter()) {
        *count_a.entry(a).or_insert(0) += 1;
        *count_b.entry(b).or_insert(0) += 1;
        *joint.entry((a, b)).or_insert(0) += 1;
    }

    let mut h_a = 0.0;
    for &count in count_a.values() {
        let p = count as f64 / n;
        h_a -= p * p.ln();
    }

    let mut h_b = 0.0;
    for &count in count_b.values() {
        let p = count as f64 / n;
        h_b -= p * p.ln();
    }

    let mut mutual = 0.0;
    for (&(a, b), &count) in joint.iter() {
        let p_ab = count as f64 / n;
        let p_a = count_a[&a] as f64 / n;
        let p_b = count_b[&b] as f64 / n;
        mutual += p_ab * (p_ab / (p_a * p_b)).ln();
    }

    if h_a + h_b == 0.0 {
        return 0.0;
    }
    2.0 * mutual / (h_a + h_b)
}
