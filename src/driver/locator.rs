use std::fmt;

/// One step of a [`Locator`] chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub selector: String,
    pub nth: Option<usize>,
}

/// Backend-agnostic description of a set of elements.
///
/// A locator is a chain of selectors: each segment is resolved relative to the
/// elements matched by the previous one, optionally narrowed to a single match
/// with [`nth`](Self::nth). Selector syntax is whatever the driver backend
/// understands; the booking flow only composes them.
///
/// ```ignore
/// // Lessons inside the container of the third day heading
/// let lessons = Locator::new(".day-heading")
///     .nth(2)
///     .then("xpath=ancestor::div[1]")
///     .then(".lesson");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    segments: Vec<Segment>,
}

impl Locator {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment {
                selector: selector.into(),
                nth: None,
            }],
        }
    }

    /// Narrow the last segment to its `index`-th match (0-based)
    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.nth = Some(index);
        }
        self
    }

    /// Resolve `selector` relative to the current matches
    pub fn then(mut self, selector: impl Into<String>) -> Self {
        self.segments.push(Segment {
            selector: selector.into(),
            nth: None,
        });
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Index selected on the last segment, if any
    pub fn index(&self) -> Option<usize> {
        self.segments.last().and_then(|s| s.nth)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            f.write_str(&segment.selector)?;
            if let Some(nth) = segment.nth {
                write!(f, " >> nth={}", nth)?;
            }
        }
        Ok(())
    }
}
