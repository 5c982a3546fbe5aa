//! Property-based tests for name classification functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::naming::{
        app_for_var, base_name, classify, fallback_nice_name, instance_name, is_valid_app_name,
        VarClass,
    };
    use proptest::prelude::*;

    // ============================================================================
    // classify property tests
    // ============================================================================

    proptest! {
        /// Property: classify is deterministic (same key = same class)
        #[test]
        fn classify_is_deterministic(key in ".*") {
            let result1 = classify(&key);
            let result2 = classify(&key);
            prop_assert_eq!(result1, result2);
        }

        /// Property: a key without "__" always classifies as global
        #[test]
        fn classify_no_separator_is_global(key in "[A-Z][A-Z0-9_]*") {
            prop_assume!(!key.contains("__"));
            prop_assert_eq!(classify(&key), VarClass::Global);
        }

        /// Property: the owning app of a well-formed base-app variable is
        /// the base name
        #[test]
        fn classify_base_app_variable(
            base in "[A-Z][A-Z0-9]{0,8}",
            suffix in "[A-Z][A-Z0-9]{0,8}_NAME",
        ) {
            let key = format!("{base}__{suffix}");
            let owner = app_for_var(&key);
            prop_assert!(owner.is_some());
            let owner = owner.unwrap();
            prop_assert!(
                owner == base || owner.starts_with(&format!("{base}__")),
                "owner '{}' must be '{}' or an instance of it",
                owner,
                base
            );
        }

        /// Property: classify never returns an instance in the reserved set
        #[test]
        fn classify_never_yields_reserved_instance(key in "[A-Z][A-Z0-9_]{0,30}") {
            if let VarClass::AppInstance { instance, .. } = classify(&key) {
                prop_assert!(
                    !crate::naming::is_reserved_instance(&instance),
                    "reserved instance '{}' leaked out of classify",
                    instance
                );
            }
        }

        /// Property: the app name reported by classify validates, and the
        /// variable starts with it
        #[test]
        fn classify_owner_is_consistent(key in "[A-Z][A-Z0-9_]{0,30}") {
            if let Some(owner) = app_for_var(&key) {
                prop_assert!(is_valid_app_name(&owner));
                prop_assert!(key.starts_with(&owner));
            }
        }
    }

    // ============================================================================
    // app name property tests
    // ============================================================================

    proptest! {
        /// Property: base name + instance name reassemble the app name
        #[test]
        fn base_and_instance_partition_name(
            base in "[A-Z][A-Z0-9]{0,8}",
            instance in "[A-Z0-9]{1,6}",
        ) {
            let app = format!("{base}__{instance}");
            prop_assert_eq!(base_name(&app), base.as_str());
            prop_assert_eq!(instance_name(&app), Some(instance.as_str()));
        }

        /// Property: a bare base name validates
        #[test]
        fn bare_base_names_validate(base in "[A-Z][A-Z0-9]{0,12}") {
            prop_assert!(is_valid_app_name(&base));
        }

        /// Property: lowercase names never validate
        #[test]
        fn lowercase_names_never_validate(name in "[a-z][a-z0-9]{0,12}") {
            prop_assert!(!is_valid_app_name(&name));
        }

        /// Property: the nice-name fallback is non-empty for valid names
        /// and never contains the instance separator
        #[test]
        fn nice_name_fallback_is_presentable(
            base in "[A-Z][A-Z0-9]{0,8}",
            instance in "[A-Z0-9]{1,6}",
        ) {
            let app = format!("{base}__{instance}");
            let nice = fallback_nice_name(&app);
            prop_assert!(!nice.is_empty());
            prop_assert!(!nice.contains("__"));
        }
    }
}
