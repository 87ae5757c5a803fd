//! Parent/child nesting validation over depth-annotated text.
//!
//! Accumulates human-readable diagnostics only; rendering proceeds
//! regardless, so a badly nested post still displays.

use crate::context::RenderContext;
use crate::depth::split_first_pair;
use crate::tag::TagRegistry;

/// Walk the annotated text and queue a structural error for every
/// restriction violation.
pub(crate) fn validate(registry: &TagRegistry, text: &str, ctx: &mut RenderContext) {
    walk(registry, None, text, ctx);
}

fn walk(registry: &TagRegistry, parent: Option<&str>, fragment: &str, ctx: &mut RenderContext) {
    let mut rest = fragment;
    while let Some((_, pair, after)) = split_first_pair(rest) {
        check(registry, parent, pair.name, ctx);
        let no_parse = registry.get(pair.name).is_some_and(|def| def.is_no_parse());
        if !no_parse {
            walk(registry, Some(pair.name), pair.body, ctx);
        }
        rest = after;
    }
}

fn check(registry: &TagRegistry, parent: Option<&str>, child: &str, ctx: &mut RenderContext) {
    if let Some(parent) = parent
        && let Some(parent_def) = registry.get(parent)
        && !parent_def.children_allowed().is_empty()
        && !parent_def.children_allowed().iter().any(|n| n == child)
    {
        ctx.structure_error(format!("[{parent}] tags may not contain [{child}] tags."));
    }

    if let Some(child_def) = registry.get(child)
        && !child_def.parents_allowed().is_empty()
        && !parent.is_some_and(|p| child_def.parents_allowed().iter().any(|n| n == p))
    {
        ctx.structure_error(format!(
            "[{child}] tags are only allowed inside [{}] tags.",
            child_def.parents_allowed().join("] or [")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::annotate;
    use crate::tag::{builtin_definitions, TagRegistry};

    fn errors_for(text: &str) -> Vec<String> {
        let registry = TagRegistry::build(builtin_definitions()).unwrap();
        let mut ctx = RenderContext::new();
        validate(&registry, &annotate(text), &mut ctx);
        ctx.into_errors()
    }

    #[test]
    fn test_valid_nesting_is_clean() {
        assert!(errors_for("<quote><b>x</b></quote>").is_empty());
        assert!(errors_for("<list><*>a</*></list>").is_empty());
        assert!(errors_for("<table><row><cell>x</cell></row></table>").is_empty());
    }

    #[test]
    fn test_cell_outside_row_flagged() {
        let errors = errors_for("<cell>x</cell>");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("[cell]"));
        assert!(errors[0].contains("[row]"));
    }

    #[test]
    fn test_foreign_child_in_list_flagged() {
        let errors = errors_for("<list><b>x</b></list>");
        assert!(errors.iter().any(|e| e.contains("[list]") && e.contains("[b]")));
    }

    #[test]
    fn test_row_outside_table_flagged_both_ways() {
        let errors = errors_for("<quote><row><cell>x</cell></row></quote>");
        // row outside table, but cell inside row is fine
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("[row]") && errors[0].contains("[table]"));
    }

    #[test]
    fn test_no_parse_bodies_not_walked() {
        // A neutralized code body cannot contain annotated pairs anyway;
        // this guards the recursion for extension tags without neutralized
        // bodies.
        assert!(errors_for("<code>x</code>").is_empty());
    }

    #[test]
    fn test_deep_recursion() {
        let errors = errors_for("<quote><quote><cell>x</cell></quote></quote>");
        assert_eq!(errors.len(), 1);
    }
}
