use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Source location of a node: byte offsets into the source plus the
/// line/column of the start position (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Span {
            start,
            end,
            line,
            column,
        }
    }

    /// Span for synthesized nodes that have no source text.
    pub fn dummy() -> Self {
        Span::default()
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0 && self.line == 0
    }

    /// Union of two spans. A dummy span on either side yields the other.
    pub fn combine(&self, other: &Span) -> Span {
        if self.is_dummy() {
            return *other;
        }
        if other.is_dummy() {
            return *self;
        }
        let (first, _) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span together with the source text it points into.
#[derive(Debug, Clone)]
pub struct Context {
    pub span: Span,
    source: Arc<str>,
}

impl Context {
    pub fn new(span: Span, source: Arc<str>) -> Self {
        Context { span, source }
    }

    pub fn combine(&self, other: &Context) -> Context {
        Context {
            span: self.span.combine(&other.span),
            source: Arc::clone(&self.source),
        }
    }

    /// The slice of source text covered by this context.
    pub fn code(&self) -> &str {
        let start = self.span.start as usize;
        let end = (self.span.end as usize).min(self.source.len());
        self.source.get(start..end).unwrap_or("")
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_orders_by_start() {
        let a = Span::new(10, 14, 2, 3);
        let b = Span::new(2, 5, 1, 3);
        let c = a.combine(&b);
        assert_eq!(c.start, 2);
        assert_eq!(c.end, 14);
        assert_eq!(c.line, 1);
    }

    #[test]
    fn test_combine_with_dummy() {
        let a = Span::new(3, 9, 1, 4);
        assert_eq!(a.combine(&Span::dummy()), a);
        assert_eq!(Span::dummy().combine(&a), a);
    }

    #[test]
    fn test_context_code() {
        let source: Arc<str> = Arc::from("var abc = 1;");
        let ctx = Context::new(Span::new(4, 7, 1, 5), source);
        assert_eq!(ctx.code(), "abc");
    }
}
