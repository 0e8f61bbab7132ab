/// Thumbnail variants from best to worst; not every video has the larger ones.
const QUALITIES: [&str; 5] = ["maxresdefault", "sddefault", "hqdefault", "mqdefault", "default"];

/// Prioritized thumbnail URLs for the error fallback, walked with [`try_next`](Self::try_next)
/// each time the renderer reports a failed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCandidates {
    urls: Vec<String>,
    cursor: usize,
}

impl ThumbnailCandidates {
    pub fn for_video(video_id: &str) -> Self {
        Self::from_urls(
            QUALITIES
                .iter()
                .map(|quality| format!("https://i.ytimg.com/vi/{video_id}/{quality}.jpg"))
                .collect(),
        )
    }

    pub fn from_urls(urls: Vec<String>) -> Self {
        Self { urls, cursor: 0 }
    }

    pub fn current(&self) -> Option<&str> {
        self.urls.get(self.cursor).map(String::as_str)
    }

    /// Give up on the current URL and return the next candidate, if any remain.
    pub fn try_next(&mut self) -> Option<&str> {
        if self.cursor < self.urls.len() {
            self.cursor += 1;
        }
        self.current()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.urls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_candidates_in_priority_order() {
        let mut thumbs = ThumbnailCandidates::for_video("abc");
        assert_eq!(thumbs.current(), Some("https://i.ytimg.com/vi/abc/maxresdefault.jpg"));
        assert_eq!(thumbs.try_next(), Some("https://i.ytimg.com/vi/abc/sddefault.jpg"));
        assert_eq!(thumbs.try_next(), Some("https://i.ytimg.com/vi/abc/hqdefault.jpg"));
        assert_eq!(thumbs.try_next(), Some("https://i.ytimg.com/vi/abc/mqdefault.jpg"));
        assert_eq!(thumbs.try_next(), Some("https://i.ytimg.com/vi/abc/default.jpg"));
        assert!(!thumbs.is_exhausted());
        assert_eq!(thumbs.try_next(), None);
        assert!(thumbs.is_exhausted());
        assert_eq!(thumbs.try_next(), None);
    }

    #[test]
    fn empty_list_is_exhausted() {
        let mut thumbs = ThumbnailCandidates::from_urls(Vec::new());
        assert!(thumbs.is_exhausted());
        assert_eq!(thumbs.try_next(), None);
    }
}
