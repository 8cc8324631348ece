/// Iterate `V, F(V), F(F(V)), ...` and return the first value that `step`
/// maps to an equal value.
///
/// Termination is the caller's business: `step` must eventually stabilise,
/// e.g. by growing monotonically inside a finite domain.
pub fn fixed_point<T, F>(start: T, mut step: F) -> T
where
    T: PartialEq,
    F: FnMut(&T) -> T,
{
    let mut current = start;
    loop {
        let next = step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Like [`fixed_point`], also reporting how many steps it took to stabilise.
pub fn fixed_point_counted<T, F>(start: T, mut step: F) -> (T, usize)
where
    T: PartialEq,
    F: FnMut(&T) -> T,
{
    let mut steps = 0;
    let value = fixed_point(start, |value| {
        steps += 1;
        step(value)
    });
    (value, steps)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn stops_at_first_repeated_value() {
        assert_eq!(fixed_point(1u32, |&n| if n < 100 { n * 2 } else { n }), 128);
    }

    #[test]
    fn start_value_can_already_be_fixed() {
        let (value, steps) = fixed_point_counted(7, |&n| n);
        assert_eq!(value, 7);
        assert_eq!(steps, 1);
    }

    #[test]
    fn closes_a_set_under_a_relation() {
        let edges = [(1, 2), (2, 3), (3, 1), (4, 5)];
        let reachable = fixed_point(BTreeSet::from([1]), |set| {
            let mut next = set.clone();
            next.extend(edges.iter().filter(|(a, _)| set.contains(a)).map(|&(_, b)| b));
            next
        });
        assert_eq!(reachable, BTreeSet::from([1, 2, 3]));
    }
}
