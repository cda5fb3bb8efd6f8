pub mod binarizer;
pub mod blob_extractor;
pub mod bounding_box;
pub mod dilator;
pub mod edge_detector;
pub mod input;
pub mod loader;
pub mod raster;
pub mod region_filter;
pub mod utils;
