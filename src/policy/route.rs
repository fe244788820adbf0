//! Route shapes
//!
//! A route shape is a path template such as `/api/meters/{id}/balance` where a
//! `{name}` segment matches exactly one non-empty path segment.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

// == Route Shape ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteShape {
    template: String,
    segments: Vec<Segment>,
}

impl RouteShape {
    pub fn parse(template: &str) -> Self {
        let segments = path_segments(template)
            .map(|seg| {
                if seg.starts_with('{') && seg.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();

        Self {
            template: template.to_string(),
            segments,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whole-path match.
    pub fn matches(&self, path: &str) -> bool {
        let segments: Vec<&str> = path_segments(path).collect();
        segments.len() == self.segments.len() && self.matches_leading(&segments)
    }

    /// Matches the path itself or anything nested below it.
    pub fn matches_prefix(&self, path: &str) -> bool {
        let segments: Vec<&str> = path_segments(path).collect();
        segments.len() >= self.segments.len() && self.matches_leading(&segments)
    }

    /// Ordering key for longest-match selection: segment count, then literal count.
    pub fn specificity(&self) -> (usize, usize) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        (self.segments.len(), literals)
    }

    fn matches_leading(&self, path: &[&str]) -> bool {
        self.segments
            .iter()
            .zip(path)
            .all(|(shape, actual)| match shape {
                Segment::Literal(lit) => lit == actual,
                Segment::Param => !actual.is_empty(),
            })
    }
}

/// Non-empty `/`-separated segments; leading, trailing and doubled slashes vanish.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
