/// Moves the `dragged` block next to `target`.
///
/// The dragged ids are removed from `items`, then spliced back in their
/// given order before or after `target`. When `target` is itself dragged
/// (or absent) the block goes to the end. The result is always a permutation
/// of `items` plus any dragged ids not already present.
pub fn reorder<T>(items: &[T], dragged: &[T], target: &T, position: super::DropPosition) -> Vec<T>
where
    T: PartialEq + Clone,
{
    let mut result: Vec<T> = items
        .iter()
        .filter(|item| !dragged.contains(item))
        .cloned()
        .collect();
    let Some(target_index) = result.iter().position(|item| item == target) else {
        result.extend(dragged.iter().cloned());
        return result;
    };
    let insert_at = match position {
        super::DropPosition::Before => target_index,
        super::DropPosition::After => target_index + 1,
    };
    result.splice(insert_at..insert_at, dragged.iter().cloned());
    result
}
