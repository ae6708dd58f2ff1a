use crate::model::{DistName, PathSegment};

/// Stack of entered objects; frame 0 is always the root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationContext {
    frames: Vec<PathSegment>,
}

impl NavigationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current_class(&self) -> Option<&str> {
        self.frames.last().map(|f| f.class.as_str())
    }

    /// Concatenation of all frames; `None` before the root is entered
    pub fn current_path(&self) -> Option<DistName> {
        if self.frames.is_empty() {
            None
        } else {
            Some(DistName::new(self.frames.clone()))
        }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.frames.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.frames.pop()
    }

    /// Follow a rename of `old` to `new` if the current position lies beneath it
    pub fn follow_rename(&mut self, old: &DistName, new: &DistName) {
        let Some(current) = self.current_path() else {
            return;
        };
        if let Some(renamed) = current.with_prefix_replaced(old, new) {
            self.frames = renamed.segments().to_vec();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_and_path() {
        let mut ctx = NavigationContext::new();
        assert!(ctx.current_path().is_none());
        ctx.push(PathSegment::new("R", "1"));
        ctx.push(PathSegment::new("A", "2"));
        assert_eq!(ctx.current_path().unwrap().to_string(), "R-1/A-2");
        assert_eq!(ctx.current_class(), Some("A"));
        ctx.pop();
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_follow_rename() {
        let mut ctx = NavigationContext::new();
        ctx.push(PathSegment::new("R", "1"));
        ctx.push(PathSegment::new("A", "2"));
        ctx.push(PathSegment::new("B", "3"));
        ctx.follow_rename(
            &DistName::parse("R-1/A-2").unwrap(),
            &DistName::parse("R-1/A-9").unwrap(),
        );
        assert_eq!(ctx.current_path().unwrap().to_string(), "R-1/A-9/B-3");
    }
}
