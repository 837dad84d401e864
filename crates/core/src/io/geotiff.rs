//! GeoTIFF reading/writing through the `tiff` crate.
//!
//! Only north-up grids georeferenced with ModelPixelScale + ModelTiepoint
//! are understood; the GDAL no-data tag is read and written.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::debug;

/// Read the first band of a GeoTIFF file
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    decode(file)
}

fn tiff_err(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Other(format!("{}: {}", context, e))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn decode<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader).map_err(|e| tiff_err("TIFF decode error", e))?;
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| tiff_err("Cannot read dimensions", e))?;
    let (rows, cols) = (height as usize, width as usize);

    let data: Vec<T> = match decoder
        .read_image()
        .map_err(|e| tiff_err("Cannot read image data", e))?
    {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    // Multi-sample images: keep the first sample of each pixel
    let samples = data.len() / (rows * cols).max(1);
    let data = if samples > 1 {
        data.into_iter().step_by(samples).collect()
    } else {
        data
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    match read_geotransform(&mut decoder) {
        Some(transform) => raster.set_transform(transform),
        None => debug!("No GeoTIFF georeferencing tags, using identity transform"),
    }

    if let Ok(text) = decoder.get_tag_ascii_string(Tag::GdalNodata) {
        let text = text.trim_matches(char::from(0)).trim();
        match text.parse::<f64>() {
            Ok(v) => raster.set_nodata(num_traits::cast(v).or_else(|| v.is_nan().then(T::default_nodata))),
            Err(_) => debug!("Ignoring unparsable nodata tag '{}'", text),
        }
    }

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint = [I, J, K, X, Y, Z], scale = [sx, sy, sz]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Write a raster as a single-band 32-bit float GeoTIFF
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode(raster, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn encode<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(|e| tiff_err("TIFF encoder error", e))?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| tiff_err("Cannot create TIFF image", e))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    // GeoKey directory v1.1.0 with two keys: projected model, pixel-is-area
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];

    let enc = image.encoder();
    enc.write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(|e| tiff_err("Cannot write scale tag", e))?;
    enc.write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(|e| tiff_err("Cannot write tiepoint tag", e))?;
    enc.write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])
        .map_err(|e| tiff_err("Cannot write geokey tag", e))?;

    let nodata = raster
        .nodata()
        .and_then(|v| v.to_f64())
        .map(|v| if v.is_nan() { "nan".to_string() } else { v.to_string() })
        .unwrap_or_else(|| "nan".to_string());
    enc.write_tag(Tag::GdalNodata, nodata.as_str())
        .map_err(|e| tiff_err("Cannot write nodata tag", e))?;

    image
        .write_data(&data)
        .map_err(|e| tiff_err("Cannot write image data", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_tif(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hydromorph-{}-{}.tif", name, std::process::id()))
    }

    #[test]
    fn test_file_roundtrip_keeps_grid_and_nodata() {
        let mut dem: Raster<f64> = Raster::filled(4, 5, 612.5);
        dem.set_transform(GeoTransform::new(350_000.0, 2_150_000.0, 30.0, -30.0));
        dem.set(1, 2, -9999.0).unwrap();
        dem.set_nodata(Some(-9999.0));

        let path = temp_tif("dem");
        write_geotiff(&dem, &path).unwrap();
        let back: Raster<f64> = read_geotiff(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(back.shape(), (4, 5));
        assert_eq!(back.transform(), dem.transform());
        assert_eq!(back.nodata(), Some(-9999.0));
        assert_eq!(back.get(0, 0).unwrap(), 612.5);
        assert!(back.is_nodata(back.get(1, 2).unwrap()));
        assert_eq!(back.statistics().valid_count, 19);
    }

    #[test]
    fn test_nan_nodata_roundtrip() {
        let mut r: Raster<f64> = Raster::filled(3, 3, 1.0);
        r.set(0, 0, f64::NAN).unwrap();
        r.set_nodata(Some(f64::NAN));

        let path = temp_tif("nan");
        write_geotiff(&r, &path).unwrap();
        let back: Raster<f64> = read_geotiff(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(back.get(0, 0).unwrap().is_nan());
        assert_eq!(back.statistics().valid_count, 8);
    }
}
