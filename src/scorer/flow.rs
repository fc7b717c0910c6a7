use super::loader::FrequencyOracle;
use crate::error::{invalid, QapResult};
use crate::matrix::FlowMatrix;

/// Symmetric flow between every unordered symbol pair: the frequency of
/// `xy` plus the frequency of `yx`. The diagonal stays at zero.
pub fn build_flow_matrix<O: FrequencyOracle + ?Sized>(
    alphabet: &[char],
    oracle: &O,
) -> QapResult<FlowMatrix> {
    let n = alphabet.len();
    if n < 2 {
        return invalid(format!("alphabet needs at least 2 symbols, got {}", n));
    }
    for (i, c) in alphabet.iter().enumerate() {
        if alphabet[..i].contains(c) {
            return invalid(format!("symbol '{}' appears twice in the alphabet", c));
        }
    }

    let mut flow = FlowMatrix::zeros(n);
    let mut key = String::with_capacity(8);

    for i in 0..n {
        for j in (i + 1)..n {
            key.clear();
            key.push(alphabet[i]);
            key.push(alphabet[j]);
            let forward = oracle.frequency(&key);

            key.clear();
            key.push(alphabet[j]);
            key.push(alphabet[i]);
            let backward = oracle.frequency(&key);

            let value = forward + backward;
            if !value.is_finite() || value < 0.0 {
                return invalid(format!(
                    "frequency oracle returned {} for pair '{}{}'",
                    value, alphabet[i], alphabet[j]
                ));
            }
            flow.set(i, j, value);
            flow.set(j, i, value);
        }
    }

    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::loader::BigramTable;

    #[test]
    fn test_both_orders_are_summed() {
        let table = BigramTable::from_pairs([("ab", 10u64), ("ba", 5u64), ("bc", 2u64)]);
        let alphabet = ['a', 'b', 'c'];
        let flow = build_flow_matrix(&alphabet, &table).unwrap();

        assert_eq!(flow.get(0, 1), 15.0);
        assert_eq!(flow.get(1, 0), 15.0);
        assert_eq!(flow.get(1, 2), 2.0 + 1.0 / 17.0);
        assert_eq!(flow.get(0, 2), 2.0 / 17.0);
        assert_eq!(flow.get(2, 2), 0.0);
        assert!(flow.is_symmetric());
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let oracle = |_: &str| 1.0;
        assert!(build_flow_matrix(&['a', 'b', 'a'], &oracle).is_err());
    }

    #[test]
    fn test_negative_frequency_rejected() {
        let oracle = |_: &str| -1.0;
        assert!(build_flow_matrix(&['a', 'b'], &oracle).is_err());
    }
}
