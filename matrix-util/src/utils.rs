use fnv::FnvHashMap as HashMap;
use rand::prelude::SliceRandom;
use std::hash::Hash;

/// Partition a membership vector into groups of indexes
/// # Arguments
/// * `membership` - a vector of membership (e.g., cell type assignment)
/// * `nelem_per_group` - number of elements per group (if `None`, no downsampling)
/// # Returns
/// A hashmap: group name -> indexes of the elements
pub fn partition_by_membership<T>(
    membership: &[T],
    nelem_per_group: Option<usize>,
) -> HashMap<T, Vec<usize>>
where
    T: Eq + Hash + Clone,
{
    let mut groups: HashMap<T, Vec<usize>> = HashMap::default();
    for (elem, k) in membership.iter().enumerate() {
        groups.entry(k.clone()).or_default().push(elem);
    }

    if let Some(ntarget) = nelem_per_group {
        let mut rng = rand::rng();
        for elems in groups.values_mut() {
            if elems.len() > ntarget {
                elems.shuffle(&mut rng);
                elems.truncate(ntarget);
                elems.sort_unstable();
            }
        }
    }

    groups
}
