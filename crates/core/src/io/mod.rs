//! Reading and writing rasters, vector layers and result tables

mod geotiff;
mod geojson_io;
mod table;

pub use geojson_io::{read_geojson, read_geojson_str};
pub use geotiff::{read_geotiff, write_geotiff};
pub use table::{Cell, Table};
