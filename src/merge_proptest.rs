//! Property-based tests for the merge operations.
//!
//! These tests use proptest to generate random constraints, requirement
//! values and feature lists and verify the algebraic laws the resolver
//! relies on: identity, commutativity, associativity and idempotence.

#[cfg(test)]
mod proptest_tests {
    use crate::constraint::{Bound, Constraint, ConstraintMerger, VersionRange};
    use crate::model::{EnvironmentDecl, Feature, TaskDefinition};
    use crate::platform::{self, PlatformSet};
    use crate::requirement::{MergePolicy, RequirementMerger, RequirementPolicies, RequirementValue};
    use crate::resolver::resolve;
    use crate::store::FeatureStore;
    use crate::version::SegmentedVersion;
    use indexmap::IndexSet;
    use proptest::prelude::*;

    // ============================================================================
    // Strategies
    // ============================================================================

    /// Versions with one spelling each, so equality under the comparator is
    /// string equality.
    fn version() -> impl Strategy<Value = String> {
        (0u8..5, 0u8..5).prop_map(|(major, minor)| format!("{major}.{minor}"))
    }

    fn bound() -> impl Strategy<Value = Option<Bound>> {
        prop::option::of((version(), any::<bool>()).prop_map(|(version, inclusive)| Bound {
            version,
            inclusive,
        }))
    }

    fn range() -> impl Strategy<Value = VersionRange> {
        (bound(), bound()).prop_map(|(lower, upper)| VersionRange { lower, upper })
    }

    fn constraint() -> impl Strategy<Value = Constraint> {
        prop_oneof![
            Just(Constraint::Any),
            range().prop_map(Constraint::from_range),
            (prop::sample::select(vec!["*openblas", "*mkl"]), range()).prop_map(|(build, range)| {
                Constraint::Pin {
                    build: build.to_string(),
                    range,
                }
            }),
        ]
    }

    fn platforms() -> impl Strategy<Value = Option<IndexSet<String>>> {
        prop::option::of(
            prop::sample::subsequence(vec!["linux-64", "osx-arm64", "win-64"], 1..=3)
                .prop_map(|set| set.into_iter().map(str::to_string).collect()),
        )
    }

    fn merge(a: &Constraint, b: &Constraint) -> Option<Constraint> {
        ConstraintMerger::new(&SegmentedVersion)
            .merge("pkg", a, b)
            .ok()
    }

    // ============================================================================
    // Constraint merge properties
    // ============================================================================

    proptest! {
        /// Property: Any is the identity of constraint merging
        #[test]
        fn any_is_identity(c in constraint()) {
            prop_assert_eq!(merge(&Constraint::Any, &c), Some(c.clone()));
            prop_assert_eq!(merge(&c, &Constraint::Any), Some(c));
        }

        /// Property: merging does not depend on argument order
        #[test]
        fn constraint_merge_is_commutative(a in constraint(), b in constraint()) {
            prop_assert_eq!(merge(&a, &b), merge(&b, &a));
        }

        /// Property: merging does not depend on grouping
        #[test]
        fn constraint_merge_is_associative(a in constraint(), b in constraint(), c in constraint()) {
            let left = merge(&a, &b).and_then(|ab| merge(&ab, &c));
            let right = merge(&b, &c).and_then(|bc| merge(&a, &bc));
            prop_assert_eq!(left, right);
        }

        /// Property: a satisfiable constraint merged with itself is unchanged
        #[test]
        fn constraint_merge_is_idempotent(c in constraint()) {
            if let Some(once) = merge(&c, &c) {
                prop_assert_eq!(merge(&once, &once), Some(once));
            }
        }

        /// Property: a merged range only admits versions both inputs admit
        #[test]
        fn intersection_is_contained_in_both(a in range(), b in range(), candidate in version()) {
            let merged = a.intersect(&b, &SegmentedVersion);
            if merged.contains(&candidate, &SegmentedVersion) {
                prop_assert!(a.contains(&candidate, &SegmentedVersion));
                prop_assert!(b.contains(&candidate, &SegmentedVersion));
            }
        }
    }

    // ============================================================================
    // Requirement merge properties
    // ============================================================================

    fn merge_requirement(policy: MergePolicy, a: &RequirementValue, b: &RequirementValue) -> Option<RequirementValue> {
        let mut policies = RequirementPolicies::empty();
        policies.declare("key", policy);
        RequirementMerger::new(&policies, &SegmentedVersion)
            .merge("key", a, b)
            .ok()
    }

    proptest! {
        /// Property: max does not depend on argument order or grouping
        #[test]
        fn max_is_commutative_and_associative(a in version(), b in version(), c in version()) {
            let (a, b, c) = (
                RequirementValue::Version(a),
                RequirementValue::Version(b),
                RequirementValue::Version(c),
            );
            prop_assert_eq!(
                merge_requirement(MergePolicy::Max, &a, &b),
                merge_requirement(MergePolicy::Max, &b, &a)
            );
            let left = merge_requirement(MergePolicy::Max, &a, &b)
                .and_then(|ab| merge_requirement(MergePolicy::Max, &ab, &c));
            let right = merge_requirement(MergePolicy::Max, &b, &c)
                .and_then(|bc| merge_requirement(MergePolicy::Max, &a, &bc));
            prop_assert_eq!(left, right);
        }

        /// Property: and on flags is boolean conjunction
        #[test]
        fn and_is_conjunction(a in any::<bool>(), b in any::<bool>()) {
            let merged = merge_requirement(MergePolicy::And, &a.into(), &b.into());
            prop_assert_eq!(merged, Some(RequirementValue::Flag(a && b)));
        }

        /// Property: equal-or-fail accepts exactly the equal pairs
        #[test]
        fn equal_or_fail_accepts_only_equal_values(a in version(), b in version()) {
            let merged = merge_requirement(
                MergePolicy::EqualOrFail,
                &RequirementValue::Version(a.clone()),
                &RequirementValue::Version(b.clone()),
            );
            prop_assert_eq!(merged.is_some(), a == b);
        }
    }

    // ============================================================================
    // Platform and resolution properties
    // ============================================================================

    proptest! {
        /// Property: inserting an unrestricted feature never changes the result
        #[test]
        fn unrestricted_feature_is_platform_identity(
            restrictions in prop::collection::vec(platforms(), 0..4),
            position in 0usize..4,
        ) {
            let named: Vec<(String, Option<IndexSet<String>>)> = restrictions
                .into_iter()
                .enumerate()
                .map(|(i, r)| (format!("f{i}"), r))
                .collect();
            let mut with_free = named.clone();
            with_free.insert(position.min(named.len()), ("free".to_string(), None));

            let view = |list: &[(String, Option<IndexSet<String>>)]| {
                platform::validate(
                    "env",
                    &PlatformSet::Any,
                    list.iter().map(|(n, r)| (n.as_str(), r.as_ref())),
                )
                .ok()
            };
            prop_assert_eq!(view(&named), view(&with_free));
        }

        /// Property: the last feature defining a task wins, with provenance
        #[test]
        fn last_declared_task_wins(count in 1usize..6) {
            let mut store = FeatureStore::new();
            let mut names = Vec::new();
            for i in 0..count {
                let name = format!("f{i}");
                store
                    .register(
                        Feature::new(name.as_str())
                            .with_task("run", TaskDefinition::new(format!("cmd-{i}")))
                            .unwrap(),
                    )
                    .unwrap();
                names.push(name);
            }

            let env = resolve(&EnvironmentDecl::new("env", names), &store).unwrap();
            let winner = &env.tasks["run"];
            let last = count - 1;
            prop_assert_eq!(&winner.feature, &format!("f{last}"));
            prop_assert_eq!(&winner.value.cmd, &format!("cmd-{last}"));
        }

        /// Property: resolving twice yields the same snapshot
        #[test]
        fn resolution_is_idempotent(deps in prop::collection::vec(constraint(), 1..4)) {
            let mut store = FeatureStore::new();
            let mut names = Vec::new();
            for (i, c) in deps.into_iter().enumerate() {
                let mut feature = Feature::new(format!("f{i}"));
                feature.dependencies.insert("pkg".to_string(), c);
                names.push(feature.name.clone());
                store.register(feature).unwrap();
            }
            let decl = EnvironmentDecl::new("env", names);
            prop_assert_eq!(resolve(&decl, &store).ok(), resolve(&decl, &store).ok());
        }
    }
}
