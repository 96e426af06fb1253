use crate::types::HashMap;
use core::hash::Hash;

/// Where items absent from the reference sequence end up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Unmatched {
    /// Unmatched items first, then matched ones.
    Beginning,
    /// Matched items first, then unmatched ones.
    #[default]
    End,
}

/// Order `items` by the position of their keys in `reference`.
///
/// - Items whose key occurs in `reference` are sorted by the index of its first
///   occurrence. The sort is stable, so ties keep their original order.
/// - Items without a key, or whose key is not in `reference`, keep their
///   original relative order and are placed according to `unmatched`.
pub fn order_against_reference<'r, T, Q>(
    items: impl IntoIterator<Item = T>,
    reference: impl IntoIterator<Item = &'r Q>,
    unmatched: Unmatched,
    key: impl Fn(&T) -> Option<&Q>,
) -> Vec<T>
where
    Q: Hash + Eq + ?Sized + 'r,
{
    let mut positions: HashMap<&'r Q, usize> = HashMap::default();
    for (idx, item) in reference.into_iter().enumerate() {
        positions.entry(item).or_insert(idx);
    }

    let mut matched = Vec::new();
    let mut rest = Vec::new();
    for item in items {
        let position = key(&item).and_then(|k| positions.get(k).copied());
        match position {
            Some(position) => matched.push((position, item)),
            None => rest.push(item),
        }
    }
    matched.sort_by_key(|&(position, _)| position);

    let matched = matched.into_iter().map(|(_, item)| item);
    match unmatched {
        Unmatched::Beginning => rest.into_iter().chain(matched).collect(),
        Unmatched::End => matched.chain(rest).collect(),
    }
}

/// [`order_against_reference`] for items that are their own key.
pub fn order<T: Hash + Eq>(
    items: impl IntoIterator<Item = T>,
    reference: &[T],
    unmatched: Unmatched,
) -> Vec<T> {
    order_against_reference(items, reference, unmatched, |item| Some(item))
}
