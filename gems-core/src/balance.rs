//! Category-balanced sampling of surplus candidates.
//!
//! Slots are spread as evenly as possible over the categories present:
//! each gets `target / categories` and the first `target % categories`
//! categories, in encounter order, get one more. A category with fewer
//! candidates than slots contributes everything it has and the unused
//! slots are not handed to other categories.

use rand::Rng;
use rand::seq::index;

use crate::Place;

/// Pick at most `target` places, balanced across [`Place::category`].
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use gems_core::{Place, PlaceKind, select_balanced};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let place = |id: u32, key: &str| {
///     Place::new(format!("node/{id}"), format!("Spot {id}"), PlaceKind::new(key, "x"), Coord { x: 0.0, y: 0.0 })
/// };
/// let places = vec![place(1, "leisure"), place(2, "leisure"), place(3, "historic"), place(4, "historic")];
/// let mut rng = StdRng::seed_from_u64(7);
/// let picked = select_balanced(places, 2, &mut rng);
/// assert_eq!(picked.len(), 2);
/// assert_ne!(picked[0].category, picked[1].category);
/// ```
pub fn select_balanced<R>(places: Vec<Place>, target: usize, rng: &mut R) -> Vec<Place>
where
    R: Rng + ?Sized,
{
    select_balanced_by(places, target, |place| place.category, rng)
}

/// Balanced selection over any grouping key.
///
/// Groups keep their encounter order and chosen items keep their input
/// order within a group, so a seeded `rng` gives reproducible output.
pub fn select_balanced_by<T, K, F, R>(items: Vec<T>, target: usize, key: F, rng: &mut R) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
    R: Rng + ?Sized,
{
    if items.is_empty() || target == 0 {
        return Vec::new();
    }
    let groups = group_in_encounter_order(items, key);
    let (base, remainder) = split_slots(target, groups.len());

    let mut selected = Vec::with_capacity(target);
    for (position, members) in groups.into_iter().enumerate() {
        let slots = if position < remainder { base + 1 } else { base };
        if members.len() <= slots {
            selected.extend(members);
        } else {
            selected.extend(sample_in_order(members, slots, rng));
        }
    }
    selected
}

fn group_in_encounter_order<T, K, F>(items: Vec<T>, key: F) -> Vec<Vec<T>>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut keys: Vec<K> = Vec::new();
    let mut groups: Vec<Vec<T>> = Vec::new();
    for item in items {
        let item_key = key(&item);
        match keys.iter().position(|existing| *existing == item_key) {
            Some(position) => {
                if let Some(group) = groups.get_mut(position) {
                    group.push(item);
                }
            }
            None => {
                keys.push(item_key);
                groups.push(vec![item]);
            }
        }
    }
    groups
}

#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "slot allocation is a quotient with a remainder tie-break"
)]
const fn split_slots(target: usize, groups: usize) -> (usize, usize) {
    if groups == 0 {
        return (0, 0);
    }
    (target / groups, target % groups)
}

fn sample_in_order<T, R>(members: Vec<T>, amount: usize, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    let mut picks = index::sample(rng, members.len(), amount).into_vec();
    picks.sort_unstable();
    let mut picks = picks.into_iter().peekable();
    members
        .into_iter()
        .enumerate()
        .filter_map(|(position, member)| {
            if picks.peek() == Some(&position) {
                picks.next();
                Some(member)
            } else {
                None
            }
        })
        .collect()
}
