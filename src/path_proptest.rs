//! Property-based tests for path normalization and command assembly.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::command::{CommandBuilder, CommandSpec, OptionSpec, Separator};
    use crate::path::{contains, file_name, join, normalize};
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9_-]{1,8}"
    }

    fn relative_path() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..5).prop_map(|parts| parts.join("/"))
    }

    // ============================================================================
    // normalize / contains property tests
    // ============================================================================

    proptest! {
        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(input in "[a-z./\\\\]{0,20}") {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Property: normalize never yields backslashes or empty strings
        #[test]
        fn normalize_output_is_canonical(input in "[a-z./\\\\]{0,20}") {
            let result = normalize(&input);
            prop_assert!(!result.contains('\\'));
            prop_assert!(!result.is_empty());
            prop_assert!(!result.contains("//"));
        }

        /// Property: a path contains itself
        #[test]
        fn contains_is_reflexive(path in relative_path()) {
            prop_assert!(contains(&path, &path));
        }

        /// Property: a path contains anything joined beneath it
        #[test]
        fn contains_children(parent in relative_path(), child in relative_path()) {
            prop_assert!(contains(&parent, &join(&parent, &child)));
        }

        /// Property: a sibling sharing only a name prefix is never contained
        #[test]
        fn contains_rejects_name_prefix(parent in relative_path(), suffix in segment()) {
            let sibling = format!("{}{}/file", parent, suffix);
            prop_assert!(!contains(&parent, &sibling));
        }

        /// Property: file_name of a joined path is the last joined segment
        #[test]
        fn file_name_is_last_segment(dir in relative_path(), name in segment()) {
            prop_assert_eq!(file_name(&join(&dir, &name)), name);
        }
    }

    // ============================================================================
    // CommandBuilder property tests
    // ============================================================================

    static TOOL: CommandSpec = CommandSpec::new("tool", &[]);
    static RUN: CommandSpec = CommandSpec::new(
        "run",
        &[
            OptionSpec::switch("verbose", "--verbose"),
            OptionSpec::required("env", "--env", Separator::Space).multiple(),
            OptionSpec::required("label", "--label", Separator::Equals).multiple(),
        ],
    );

    fn build(envs: &[String], labels: &[String], params: &[String], verbose: bool) -> CommandBuilder {
        let mut command = CommandBuilder::new(&[&TOOL, &RUN]);
        if verbose {
            command.flag("verbose").unwrap();
        }
        for env in envs {
            command.value("env", env).unwrap();
        }
        for label in labels {
            command.value("label", label).unwrap();
        }
        for param in params {
            command.parameter(param);
        }
        command
    }

    proptest! {
        /// Property: to_string always equals to_array joined with spaces
        #[test]
        fn to_string_matches_joined_array(
            envs in prop::collection::vec("[A-Z]{1,4}=[a-z0-9]{1,4}", 0..4),
            labels in prop::collection::vec("[a-z]{1,6}", 0..4),
            params in prop::collection::vec("[a-z./]{1,8}", 0..4),
            verbose in any::<bool>(),
        ) {
            let command = build(&envs, &labels, &params, verbose);
            prop_assert_eq!(command.to_string(), command.to_array().join(" "));
        }

        /// Property: reset always returns the builder to its bare segment names
        #[test]
        fn reset_yields_bare_segments(
            envs in prop::collection::vec("[A-Z]{1,4}=[a-z0-9]{1,4}", 0..4),
            params in prop::collection::vec("[a-z./]{1,8}", 0..4),
            verbose in any::<bool>(),
        ) {
            let mut command = build(&envs, &[], &params, verbose);
            command.reset();
            prop_assert_eq!(command.to_array(), vec!["tool".to_string(), "run".to_string()]);
        }

        /// Property: option tokens and parameters keep their call order
        #[test]
        fn tokens_keep_call_order(envs in prop::collection::vec("[A-Z]{1,4}=[a-z0-9]{1,4}", 1..5)) {
            let command = build(&envs, &[], &[], false);
            let argv = command.to_array();
            let values: Vec<&String> = argv.iter().skip(2).skip(1).step_by(2).collect();
            prop_assert_eq!(values.len(), envs.len());
            for (value, env) in values.iter().zip(envs.iter()) {
                prop_assert_eq!(*value, env);
            }
        }
    }
}
