//! Per-call scratch state threaded through the render pipeline.

/// Mutable state scoped to a single `render_markup` call.
///
/// Tag render functions receive `&mut RenderContext` and use it to report
/// semantic errors and to coordinate the few cross-tag behaviors that need
/// shared state (table header rows, hider element ids). Nothing in here
/// outlives the call, so concurrent renders cannot observe each other.
#[derive(Debug)]
pub struct RenderContext {
    error_queue: Vec<String>,
    /// Set when the tag occurrence currently being rendered reported a
    /// semantic error. The renderer resets this around each occurrence and
    /// falls back to the literal source when it comes back set.
    tag_errored: bool,
    /// True while a generic misalignment error has already been queued,
    /// so repeated cleanup passes stay idempotent.
    misaligned: bool,
    /// The next `[row]` rendered is a header row. Armed at the start of the
    /// call and re-armed by `[/table]`, consumed by the first `[row]`.
    pub(crate) header_row_pending: bool,
    /// Monotonic counter handing out unique ids to `[hider]` elements.
    pub(crate) hider_index: usize,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            error_queue: Vec::new(),
            tag_errored: false,
            misaligned: false,
            header_row_pending: true,
            hider_index: 0,
        }
    }

    /// Report a semantic error for the tag occurrence currently rendering.
    ///
    /// Queues the message and flags the occurrence so the renderer emits its
    /// escaped literal source instead of the tag output.
    pub fn tag_error(&mut self, message: impl Into<String>) {
        self.error_queue.push(message.into());
        self.tag_errored = true;
    }

    /// Report a structural (nesting) error. Informational only; rendering
    /// is unaffected.
    pub fn structure_error(&mut self, message: impl Into<String>) {
        self.error_queue.push(message.into());
    }

    /// Queue the generic misalignment error, at most once per call.
    pub(crate) fn misalignment_error(&mut self) {
        if !self.misaligned {
            self.misaligned = true;
            self.error_queue
                .push("Some of the tags in this post appear to be misaligned.".to_owned());
        }
    }

    /// Run `f` with a cleared per-occurrence error flag, returning whether
    /// the occurrence reported an error. The surrounding flag is restored so
    /// a child's error never bleeds into its parent.
    pub(crate) fn scoped_tag_errors<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> (T, bool) {
        let saved = self.tag_errored;
        self.tag_errored = false;
        let value = f(self);
        let errored = self.tag_errored;
        self.tag_errored = saved;
        (value, errored)
    }

    /// Claim the next hider id.
    pub(crate) fn next_hider_index(&mut self) -> usize {
        let index = self.hider_index;
        self.hider_index += 1;
        index
    }

    pub(crate) fn into_errors(self) -> Vec<String> {
        self.error_queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_error_sets_flag_within_scope() {
        let mut ctx = RenderContext::new();
        let ((), errored) = ctx.scoped_tag_errors(|ctx| ctx.tag_error("bad value"));
        assert!(errored);
        assert_eq!(ctx.into_errors(), vec!["bad value".to_owned()]);
    }

    #[test]
    fn test_child_error_does_not_leak_to_parent() {
        let mut ctx = RenderContext::new();
        let ((), outer_errored) = ctx.scoped_tag_errors(|ctx| {
            let ((), inner) = ctx.scoped_tag_errors(|ctx| ctx.tag_error("inner"));
            assert!(inner);
        });
        assert!(!outer_errored);
    }

    #[test]
    fn test_misalignment_error_queued_once() {
        let mut ctx = RenderContext::new();
        ctx.misalignment_error();
        ctx.misalignment_error();
        assert_eq!(ctx.into_errors().len(), 1);
    }

    #[test]
    fn test_hider_index_is_monotonic() {
        let mut ctx = RenderContext::new();
        assert_eq!(ctx.next_hider_index(), 0);
        assert_eq!(ctx.next_hider_index(), 1);
    }
}
