//! Native single-band GeoTIFF reading and writing
//!
//! Uses the `tiff` crate. Georeferencing is carried in ModelPixelScale
//! (33550) and ModelTiepoint (33922), the EPSG code in the GeoKeyDirectory
//! (34735) and the no-data value in GDAL_NODATA (42113).

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Read the first band of a GeoTIFF file
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read a GeoTIFF held in memory
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_all(&buf),
        DecodingResult::F64(buf) => cast_all(&buf),
        DecodingResult::U8(buf) => cast_all(&buf),
        DecodingResult::U16(buf) => cast_all(&buf),
        DecodingResult::U32(buf) => cast_all(&buf),
        DecodingResult::I16(buf) => cast_all(&buf),
        DecodingResult::I32(buf) => cast_all(&buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));
    if let Some(nodata) = read_nodata(&mut decoder) {
        // NaN needs no sentinel on float rasters
        if !nodata.is_nan() {
            raster.set_nodata(num_traits::cast(nodata));
        }
    }

    Ok(raster)
}

fn cast_all<S, T>(buf: &[S]) -> Vec<T>
where
    S: Copy + num_traits::ToPrimitive + num_traits::NumCast,
    T: RasterElement,
{
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT)).ok()?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }
    None
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(tag(GEO_KEY_DIRECTORY)).ok()?;
    if keys.len() < 4 {
        return None;
    }

    // [version, revision, minor, count, (key, location, count, value)*]
    let num_keys = keys[3] as usize;
    keys[4..]
        .chunks_exact(4)
        .take(num_keys)
        .find_map(|entry| match (entry[0], entry[1]) {
            (PROJECTED_CS_TYPE_KEY | GEOGRAPHIC_TYPE_KEY, 0) if entry[3] > 0 => {
                Some(CRS::from_epsg(entry[3] as u32))
            }
            _ => None,
        })
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(tag(GDAL_NODATA)).ok()?;
    let text = text.trim_end_matches('\0').trim();
    if text.eq_ignore_ascii_case("nan") {
        Some(f64::NAN)
    } else {
        text.parse::<f64>().ok()
    }
}

/// Write a raster as a single-band 32-bit float GeoTIFF
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Encode a raster as GeoTIFF bytes
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                f32::NAN
            } else {
                num_traits::cast(v).unwrap_or(f32::NAN)
            }
        })
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    let geokeys = geokey_directory(raster.crs());

    let tiff_err = |e: tiff::TiffError| Error::Other(format!("Cannot write GeoTIFF tag: {}", e));
    image
        .encoder()
        .write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(tiff_err)?;
    image
        .encoder()
        .write_tag(tag(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(tiff_err)?;
    image
        .encoder()
        .write_tag(tag(GEO_KEY_DIRECTORY), geokeys.as_slice())
        .map_err(tiff_err)?;
    image
        .encoder()
        .write_tag(tag(GDAL_NODATA), "nan")
        .map_err(tiff_err)?;

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

fn geokey_directory(crs: Option<&CRS>) -> Vec<u16> {
    let code = crs
        .and_then(|c| c.epsg())
        .and_then(|e| u16::try_from(e).ok());

    let mut keys = vec![1, 1, 0, 0];
    let mut push = |key: u16, value: u16| {
        keys.extend_from_slice(&[key, 0, 1, value]);
    };

    match code {
        Some(epsg) if crs.is_some_and(|c| c.is_geographic()) => {
            push(GT_MODEL_TYPE_KEY, MODEL_TYPE_GEOGRAPHIC);
            push(GT_RASTER_TYPE_KEY, RASTER_PIXEL_IS_AREA);
            push(GEOGRAPHIC_TYPE_KEY, epsg);
        }
        Some(epsg) => {
            push(GT_MODEL_TYPE_KEY, MODEL_TYPE_PROJECTED);
            push(GT_RASTER_TYPE_KEY, RASTER_PIXEL_IS_AREA);
            push(PROJECTED_CS_TYPE_KEY, epsg);
        }
        None => {
            push(GT_MODEL_TYPE_KEY, MODEL_TYPE_PROJECTED);
            push(GT_RASTER_TYPE_KEY, RASTER_PIXEL_IS_AREA);
        }
    }

    keys[3] = ((keys.len() - 4) / 4) as u16;
    keys
}
