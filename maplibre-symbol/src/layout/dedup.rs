use std::collections::HashMap;

use crate::geometry::anchor::{Anchor, Anchors};

/// Anchors accepted so far per label text. Lives for one layout pass.
#[derive(Debug, Default)]
pub struct CompareText {
    anchors: HashMap<String, Anchors>,
}

impl CompareText {
    /// Whether a label with `text` was already accepted closer than `repeat_distance` to
    /// `anchor`. Anchors which are not too close are recorded.
    pub fn anchor_is_too_close(&mut self, text: &str, repeat_distance: f64, anchor: &Anchor) -> bool {
        let other_anchors = self.anchors.entry(text.to_string()).or_default();

        if other_anchors
            .iter()
            .any(|other_anchor| anchor.point.distance_to(other_anchor.point) < repeat_distance)
        {
            return true;
        }

        other_anchors.push(*anchor);
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::{geometry::anchor::Anchor, layout::dedup::CompareText};

    #[test]
    fn rejects_close_anchors_with_same_text() {
        let mut compare_text = CompareText::default();
        let a = Anchor::new(100.0, 100.0, 0.0, Some(0));
        let b = Anchor::new(150.0, 100.0, 0.0, Some(0));

        assert!(!compare_text.anchor_is_too_close("Main", 100.0, &a));
        assert!(compare_text.anchor_is_too_close("Main", 100.0, &b));
        // other texts are never compared
        assert!(!compare_text.anchor_is_too_close("Elm", 100.0, &b));
        assert!(!compare_text.anchor_is_too_close(
            "Main",
            10.0,
            &Anchor::new(125.0, 100.0, 0.0, None)
        ));
        // a rejected anchor is not recorded
        assert!(!compare_text.anchor_is_too_close("Main", 20.0, &b));
    }
}
