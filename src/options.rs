/// Runtime configuration for an [`Interpreter`](crate::Interpreter).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Treat every top-level script as strict mode code.
    pub strict: bool,
    /// Nested call limit; exceeding it throws a RangeError.
    pub max_call_depth: usize,
    /// Property count at which an object's property store moves from the
    /// list representation to the hashed one.
    pub property_list_cutover: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strict: false,
            max_call_depth: 512,
            property_list_cutover: 9,
        }
    }
}

impl Options {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_property_list_cutover(mut self, cutover: usize) -> Self {
        self.property_list_cutover = cutover.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let opts = Options::default()
            .with_strict(true)
            .with_max_call_depth(16)
            .with_property_list_cutover(0);
        assert!(opts.strict);
        assert_eq!(opts.max_call_depth, 16);
        assert_eq!(opts.property_list_cutover, 1);
        assert_eq!(Options::default().property_list_cutover, 9);
    }
}
