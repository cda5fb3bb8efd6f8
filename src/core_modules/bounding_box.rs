// THEORY:
// `BoundingBox` and `BoxList` are the final output of the spatial grouping
// stage, and of the whole pipeline. A box is a "dumb" summary of one accepted
// blob: where it sits, how big it is, and how solidly it fills its rectangle.
//
// Key architectural principles:
// 1.  **Immutable Summary**: a box is created once by the extractor and only read
//     afterwards. Its fields are private and exposed through accessors.
// 2.  **Discovery Order**: a `BoxList` keeps boxes in the order the labeling scan
//     found them. Nothing in the pipeline sorts it; ranking by score is left to
//     the caller.
// 3.  **Empty Is Not Failure**: an empty list means "no candidates". Failures are
//     reported through `PipelineError` before a list is ever built.

use serde::Serialize;

/// Axis-aligned box around one accepted blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    score: f32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32, score: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            score: score.clamp(0.0, 1.0),
        }
    }

    /// Left edge of the box.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Top edge of the box.
    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill density of the blob inside its box, in [0, 1].
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Boxes in labeling-scan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BoxList {
    boxes: Vec<BoundingBox>,
}

impl BoxList {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_vec(boxes: Vec<BoundingBox>) -> Self {
        Self { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BoundingBox> {
        self.boxes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundingBox> {
        self.boxes.iter()
    }

    pub fn as_slice(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn into_vec(self) -> Vec<BoundingBox> {
        self.boxes
    }
}

impl IntoIterator for BoxList {
    type Item = BoundingBox;
    type IntoIter = std::vec::IntoIter<BoundingBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.into_iter()
    }
}

impl<'a> IntoIterator for &'a BoxList {
    type Item = &'a BoundingBox;
    type IntoIter = std::slice::Iter<'a, BoundingBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_clamped_into_unit_range() {
        assert_eq!(BoundingBox::new(0, 0, 1, 1, 1.7).score(), 1.0);
        assert_eq!(BoundingBox::new(0, 0, 1, 1, -0.2).score(), 0.0);
    }

    #[test]
    fn list_serializes_as_a_plain_array() {
        let list = BoxList::from_vec(vec![BoundingBox::new(3, 4, 50, 20, 0.5)]);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "x": 3, "y": 4, "width": 50, "height": 20, "score": 0.5 }])
        );
    }

    #[test]
    fn empty_list_has_no_boxes() {
        let list = BoxList::new();
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
        assert!(list.get(0).is_none());
    }
}
