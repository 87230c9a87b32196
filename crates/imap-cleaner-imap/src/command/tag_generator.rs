//! Command tag generator.

/// Produces `A0000`, `A0001`, ... for one connection.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Returns the next tag.
    ///
    /// The counter wraps after `u32::MAX` commands; tags only need to be
    /// unique among commands in flight, and this client has at most one.
    pub fn next(&mut self) -> String {
        let n = self.counter;
        self.counter = self.counter.wrapping_add(1);
        format!("{}{n:04}", self.prefix)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_tags() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next(), "A0000");
        assert_eq!(tags.next(), "A0001");
        assert_eq!(tags.next(), "A0002");
    }

    #[test]
    fn custom_prefix_and_padding() {
        let mut tags = TagGenerator::new('X');
        for _ in 0..100 {
            let _ = tags.next();
        }
        assert_eq!(tags.next(), "X0100");
    }

    #[test]
    fn wraps_instead_of_panicking() {
        let mut tags = TagGenerator {
            counter: u32::MAX,
            prefix: 'A',
        };
        assert_eq!(tags.next(), format!("A{}", u32::MAX));
        assert_eq!(tags.next(), "A0000");
    }
}
