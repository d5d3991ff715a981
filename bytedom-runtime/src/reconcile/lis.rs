/// Longest strictly increasing subsequence of `sources`, skipping `None`
/// entries (items with no previous position).
///
/// Returns indices into `sources`, in ascending order. Patience sorting with
/// predecessor links, O(n log n).
pub fn longest_increasing_subsequence(sources: &[Option<usize>]) -> Vec<usize> {
    let mut predecessors: Vec<Option<usize>> = vec![None; sources.len()];
    // tails[k]: index of the smallest tail of an increasing run of length k + 1
    let mut tails: Vec<usize> = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        let value = match source {
            Some(value) => *value,
            None => continue,
        };
        let len = tails.partition_point(|&t| sources[t].map_or(false, |tail| tail < value));
        if len > 0 {
            predecessors[i] = Some(tails[len - 1]);
        }
        if len == tails.len() {
            tails.push(i);
        } else {
            tails[len] = i;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        result.push(i);
        cursor = predecessors[i];
    }
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(sources: &[Option<usize>], indices: &[usize]) -> Vec<usize> {
        indices.iter().filter_map(|&i| sources[i]).collect()
    }

    #[test]
    fn test_empty_and_all_new() {
        assert!(longest_increasing_subsequence(&[]).is_empty());
        assert!(longest_increasing_subsequence(&[None, None]).is_empty());
    }

    #[test]
    fn test_already_sorted() {
        let sources = [Some(0), Some(1), Some(2), Some(3)];
        assert_eq!(longest_increasing_subsequence(&sources), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_skips_new_items() {
        let sources = [Some(2), None, Some(0), Some(1), None, Some(3)];
        let lis = longest_increasing_subsequence(&sources);
        assert_eq!(lis, vec![2, 3, 5]);
        assert_eq!(values(&sources, &lis), vec![0, 1, 3]);
    }

    #[test]
    fn test_reversed() {
        let sources = [Some(4), Some(3), Some(2), Some(1), Some(0)];
        assert_eq!(longest_increasing_subsequence(&sources).len(), 1);
    }

    #[test]
    fn test_swap() {
        // [1,2,3] -> [2,1,3]
        let sources = [Some(1), Some(0), Some(2)];
        let lis = longest_increasing_subsequence(&sources);
        assert_eq!(lis.len(), 2);
        assert_eq!(lis.last(), Some(&2));
    }
}
