// THEORY:
// The `BlobExtractor` is the engine of the spatial grouping stage. It turns the
// dilated raster into a list of candidate plate boxes by connected-component
// labeling.
//
// Algorithm steps:
// 1.  **Labeling**: `imageproc::region_labelling::connected_components` assigns
//     a label to every "on" pixel over 8-connectivity, the same neighbourhood
//     the dilator uses. Diagonal contact therefore never splits a blob in two.
// 2.  **Aggregation**: one row-major pass over the labels tracks the min/max
//     coordinates and the member count of each component. A component gets its
//     slot the first time the scan meets it, so components come out in scan
//     order of their first pixel whatever numbering the labeller chose.
//     The score is the fill density `count / (width * height)`: 1.0 for a
//     solid rectangle, lower for sparse or ragged shapes.
// 3.  **Filtering**: the caller's `RegionFilter` sees `(width, height)` before a
//     box is created. Rejected candidates are dropped silently.
//
// The extractor is stateless: one call, one raster, one list. It holds no
// memory of previous images.

use crate::core_modules::bounding_box::{BoundingBox, BoxList};
use crate::core_modules::raster::{Raster, alloc_filled};
use crate::core_modules::region_filter::RegionFilter;
use crate::error::PipelineError;
use image::Luma;
use imageproc::region_labelling::{Connectivity, connected_components};

/// Slot marker for a label the scan has not met yet.
const UNSEEN: usize = usize::MAX;

/// A labeled connected component before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// Number of "on" pixels in the component.
    pub pixel_count: usize,
}

impl Component {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Fill density of the component inside its bounding box.
    pub fn density(&self) -> f32 {
        let area = self.width() as f64 * self.height() as f64;
        (self.pixel_count as f64 / area) as f32
    }

    pub fn to_box(&self) -> BoundingBox {
        BoundingBox::new(self.min_x, self.min_y, self.width(), self.height(), self.density())
    }
}

pub mod blob_extractor {
    use super::*;

    /// Labels every 8-connected component of "on" pixels, in scan order.
    pub fn label_components(raster: &Raster) -> Result<Vec<Component>, PipelineError> {
        let mut components = Vec::new();
        for_each_component(raster, |component| {
            components
                .try_reserve(1)
                .map_err(|e| PipelineError::allocation::<Component>(components.len() + 1, e))?;
            components.push(component);
            Ok(())
        })?;
        Ok(components)
    }

    /// Extracts the boxes of all components accepted by `filter`.
    pub fn find_blobs<F>(raster: &Raster, filter: &F) -> Result<BoxList, PipelineError>
    where
        F: RegionFilter + ?Sized,
    {
        let mut boxes: Vec<BoundingBox> = Vec::new();
        let mut rejected = 0usize;

        for_each_component(raster, |component| {
            let (width, height) = (component.width(), component.height());
            if !filter.accept(width, height) {
                tracing::trace!(x = component.min_x, y = component.min_y, width, height, "candidate rejected");
                rejected += 1;
                return Ok(());
            }
            boxes
                .try_reserve(1)
                .map_err(|e| PipelineError::allocation::<BoundingBox>(boxes.len() + 1, e))?;
            boxes.push(component.to_box());
            Ok(())
        })?;

        tracing::debug!(accepted = boxes.len(), rejected, "blob extraction finished");
        Ok(BoxList::from_vec(boxes))
    }

    /// Labels the raster and hands each finished component to `sink`, in scan
    /// order of the component's first pixel.
    fn for_each_component<S>(raster: &Raster, mut sink: S) -> Result<(), PipelineError>
    where
        S: FnMut(Component) -> Result<(), PipelineError>,
    {
        raster.ensure_single_channel("blob extractor")?;
        let mask = raster.to_mask_image()?;
        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));
        drop(mask);

        let max_label = labels.iter().copied().max().unwrap_or(0) as usize;
        let mut slots = alloc_filled(max_label + 1, UNSEEN)?;
        let mut components: Vec<Component> = Vec::new();

        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            let slot = slots[label];
            match slot {
                UNSEEN => {
                    components
                        .try_reserve(1)
                        .map_err(|e| PipelineError::allocation::<Component>(components.len() + 1, e))?;
                    slots[label] = components.len();
                    components.push(Component {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                        pixel_count: 1,
                    });
                }
                _ => {
                    let component = &mut components[slot];
                    component.pixel_count += 1;
                    component.min_x = component.min_x.min(x);
                    component.max_x = component.max_x.max(x);
                    component.max_y = y;
                }
            }
        }

        for component in components {
            sink(component)?;
        }
        Ok(())
    }
}
