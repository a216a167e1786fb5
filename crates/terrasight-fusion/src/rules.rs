//! First-match-wins rule lists.

/// A condition paired with the outcome it selects.
pub struct OrderedRule<I, O> {
    pub name: &'static str,
    pub when: fn(&I) -> bool,
    pub then: O,
}

/// Return the first rule whose condition holds for `input`.
///
/// Rules are evaluated in slice order; later rules are never consulted once
/// one matches.
pub fn first_match<'r, I, O>(rules: &'r [OrderedRule<I, O>], input: &I) -> Option<&'r OrderedRule<I, O>> {
    rules.iter().find(|rule| (rule.when)(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn over_ten(x: &i32) -> bool {
        *x > 10
    }

    fn over_five(x: &i32) -> bool {
        *x > 5
    }

    const RULES: &[OrderedRule<i32, &str>] = &[
        OrderedRule { name: "big", when: over_ten, then: "big" },
        OrderedRule { name: "medium", when: over_five, then: "medium" },
    ];

    #[test]
    fn earlier_rule_wins_when_both_match() {
        assert_eq!(first_match(RULES, &20).map(|r| r.then), Some("big"));
    }

    #[test]
    fn falls_through_to_later_rule() {
        assert_eq!(first_match(RULES, &7).map(|r| r.name), Some("medium"));
    }

    #[test]
    fn none_when_nothing_matches() {
        assert!(first_match(RULES, &1).is_none());
    }
}
