//! Username existence oracle for mention linking.

/// Decides whether `[@name]` tokens become member links.
///
/// The forum server backs this with its member index; a browser-side
/// preview has no index and configures no oracle, in which case every
/// mention links. Lookups must be case-insensitive: `[@Bob]` and `[@bob]`
/// refer to the same member.
pub trait UnameOracle {
    /// True when a member with this name exists.
    fn exists(&self, uname: &str) -> bool;
}

impl<F> UnameOracle for F
where
    F: Fn(&str) -> bool,
{
    fn exists(&self, uname: &str) -> bool {
        self(uname)
    }
}
