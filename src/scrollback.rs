pub const DEFAULT_CAPACITY: usize = 500;

/// A bounded log of rendered lines. Once it is full, every new line pushes
/// the oldest one out.
#[derive(Debug)]
pub struct Scrollback {
    lines: std::collections::VecDeque<String>,
    capacity: usize,
}

impl Scrollback {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: std::collections::VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// The lines visible in a window `rows` tall whose bottom edge sits
    /// `scroll_offset` lines above the newest line.
    pub fn snapshot(&self, rows: usize, scroll_offset: usize) -> Vec<&str> {
        let end = self.lines.len().saturating_sub(scroll_offset);
        let start = end.saturating_sub(rows);
        self.lines
            .range(start..end)
            .map(std::string::String::as_str)
            .collect()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(std::string::String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn filled(capacity: usize, count: usize) -> Scrollback {
        let mut scrollback = Scrollback::new(capacity);
        for i in 0..count {
            scrollback.append(format!("line {}", i));
        }
        scrollback
    }

    #[test]
    fn test_under_capacity() {
        let scrollback = filled(5, 3);
        assert_eq!(scrollback.len(), 3);
        assert_eq!(
            scrollback.lines().collect::<Vec<_>>(),
            vec!["line 0", "line 1", "line 2"]
        );
    }

    #[test]
    fn test_evicts_oldest() {
        for extra in 0..12 {
            let scrollback = filled(5, 5 + extra);
            assert_eq!(scrollback.len(), 5);
            let expected: Vec<_> =
                (extra..extra + 5).map(|i| format!("line {}", i)).collect();
            assert_eq!(scrollback.lines().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn test_snapshot_window() {
        let scrollback = filled(100, 10);
        assert_eq!(scrollback.snapshot(3, 0), vec!["line 7", "line 8", "line 9"]);
        assert_eq!(scrollback.snapshot(3, 2), vec!["line 5", "line 6", "line 7"]);
        assert_eq!(scrollback.snapshot(20, 0).len(), 10);
        assert_eq!(scrollback.snapshot(3, 8), vec!["line 0", "line 1"]);
        assert!(scrollback.snapshot(3, 10).is_empty());
        assert!(scrollback.snapshot(3, 50).is_empty());
        assert!(scrollback.snapshot(0, 0).is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let scrollback = filled(0, 3);
        assert_eq!(scrollback.capacity(), 1);
        assert_eq!(scrollback.lines().collect::<Vec<_>>(), vec!["line 2"]);
    }

    #[test]
    fn test_default() {
        let scrollback = Scrollback::default();
        assert!(scrollback.is_empty());
        assert_eq!(scrollback.capacity(), DEFAULT_CAPACITY);
    }
}
