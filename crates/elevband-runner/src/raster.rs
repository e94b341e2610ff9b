//! Raster services backed by the GDAL library.

use elevband_dem::{
    CornerBounds, DemError, GeoTransform, Int16Raster, MapProjector, RasterBandStore,
    RasterIntrospection, RasterWarpService, WarpRequest,
};
use gdal::errors::GdalError;
use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use gdal_sys::{
    CPLErrorReset, CPLGetLastErrorMsg, GDALClose, GDALDatasetH, GDALWarp, GDALWarpAppOptionsFree,
    GDALWarpAppOptionsNew,
};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr;
use tracing::{debug, info};

type Result<T> = elevband_dem::Result<T>;

/// EPSG code of the geographic WGS84 points handed to the projector.
pub const GEOGRAPHIC_EPSG: u32 = 4326;

/// Driver of the re-georeferenced tile copies.
pub const SHIFTED_TILE_DRIVER: &str = "GTiff";

/// Build the warp option list for `request`. Sources and output are passed
/// to the warper separately.
pub fn warp_options(request: &WarpRequest, memory_mb: u32) -> Result<Vec<String>> {
    request.validate()?;

    let mut options: Vec<String> = vec![
        "-wm".into(),
        memory_mb.to_string(),
        "-multi".into(),
        "-overwrite".into(),
    ];

    if let Some(method) = &request.resampling {
        options.extend(["-r".into(), method.clone()]);
    }
    if let (Some(x), Some(y)) = (request.resolution_x, request.resolution_y) {
        options.extend(["-tr".into(), x.to_string(), y.to_string()]);
    }
    if let Some(srs) = &request.target_srs {
        options.extend(["-t_srs".into(), srs.clone()]);
    }
    if let Some(extents) = &request.extents {
        options.push("-te".into());
        for value in [extents.min_x, extents.min_y, extents.max_x, extents.max_y] {
            options.push(value.to_string());
        }
    }
    if let Some(no_data) = request.no_data {
        options.extend(["-dstnodata".into(), no_data.to_string()]);
    }
    options.extend([
        "-ot".into(),
        request.output_type.clone(),
        "-of".into(),
        request.output_format.clone(),
    ]);
    Ok(options)
}

/// Affine transform placing a `rows` x `cols` raster between `bounds`.
pub fn corner_transform(bounds: &CornerBounds, rows: usize, cols: usize) -> [f64; 6] {
    [
        bounds.ul_x,
        (bounds.lr_x - bounds.ul_x) / cols as f64,
        0.0,
        bounds.ul_y,
        0.0,
        (bounds.lr_y - bounds.ul_y) / rows as f64,
    ]
}

fn gdal_failed(operation: String) -> impl FnOnce(GdalError) -> DemError {
    move |e| DemError::RasterOperation {
        operation,
        message: e.to_string(),
    }
}

fn open(path: &Path) -> Result<Dataset> {
    Dataset::open(path).map_err(gdal_failed(format!("open {}", path.display())))
}

fn open_update(path: &Path) -> Result<Dataset> {
    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_UPDATE,
        allowed_drivers: None,
        open_options: None,
        sibling_files: None,
    };
    Dataset::open_ex(path, options).map_err(gdal_failed(format!("open {} for update", path.display())))
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|_| DemError::InvalidWarpRequest(format!("NUL byte in {value:?}")))
}

fn c_path(path: &Path) -> Result<CString> {
    let text = path
        .to_str()
        .ok_or_else(|| DemError::InvalidWarpRequest(format!("non UTF-8 path {}", path.display())))?;
    c_string(text)
}

/// Message of the last error GDAL raised on this thread.
fn last_error_message() -> String {
    // SAFETY: GDAL returns a valid, NUL-terminated thread-local buffer
    let message = unsafe { CStr::from_ptr(CPLGetLastErrorMsg()) };
    match message.to_string_lossy().trim() {
        "" => "no diagnostic from GDAL".to_string(),
        text => text.to_string(),
    }
}

fn display_sources(request: &WarpRequest) -> String {
    request
        .sources
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// GDAL implementations of the raster services.
#[derive(Debug, Clone)]
pub struct GdalRasters {
    warp_memory_mb: u32,
}

impl GdalRasters {
    pub fn new(warp_memory_mb: u32) -> Self {
        Self { warp_memory_mb }
    }
}

impl RasterWarpService for GdalRasters {
    fn warp(&self, request: &WarpRequest) -> Result<()> {
        let options = warp_options(request, self.warp_memory_mb)?;
        info!(
            "Warping [{}] to {} with [{}]",
            display_sources(request),
            request.output.display(),
            options.join(" ")
        );

        let sources = request
            .sources
            .iter()
            .map(|path| open(path))
            .collect::<Result<Vec<Dataset>>>()?;
        let output = c_path(&request.output)?;
        let args = options
            .iter()
            .map(|o| c_string(o))
            .collect::<Result<Vec<CString>>>()?;
        let mut argv: Vec<*mut c_char> = args.iter().map(|a| a.as_ptr().cast_mut()).collect();
        argv.push(ptr::null_mut());

        // SAFETY: argv is NULL-terminated and outlives the options object;
        // the source handles stay open while `sources` is alive.
        let created = unsafe {
            CPLErrorReset();
            let app_options = GDALWarpAppOptionsNew(argv.as_mut_ptr(), ptr::null_mut());
            if app_options.is_null() {
                return Err(DemError::RasterOperation {
                    operation: "GDALWarp options".to_string(),
                    message: last_error_message(),
                });
            }

            let mut handles: Vec<GDALDatasetH> = sources.iter().map(|ds| ds.c_dataset()).collect();
            let mut usage_error: c_int = 0;
            let created = GDALWarp(
                output.as_ptr(),
                ptr::null_mut(),
                handles.len() as c_int,
                handles.as_mut_ptr(),
                app_options,
                &mut usage_error,
            );
            GDALWarpAppOptionsFree(app_options);
            created
        };

        if created.is_null() {
            return Err(DemError::RasterOperation {
                operation: format!("GDALWarp {}", request.output.display()),
                message: last_error_message(),
            });
        }
        // SAFETY: the handle was returned to us by GDALWarp and is closed once
        unsafe {
            GDALClose(created);
        }
        Ok(())
    }

    fn assign_bounds(&self, source: &Path, bounds: &CornerBounds, output: &Path) -> Result<()> {
        info!(
            "Copying {} to {} with corners {} {} {} {}",
            source.display(),
            output.display(),
            bounds.ul_x,
            bounds.ul_y,
            bounds.lr_x,
            bounds.lr_y
        );
        let failed = |what: &str| gdal_failed(format!("{what} {}", output.display()));

        let dataset = open(source)?;
        let (cols, rows) = dataset.raster_size();
        let driver =
            DriverManager::get_driver_by_name(SHIFTED_TILE_DRIVER).map_err(failed("driver for"))?;

        let mut copy = dataset
            .create_copy(&driver, output, &RasterCreationOptions::new())
            .map_err(failed("copy to"))?;
        copy.set_geo_transform(&corner_transform(bounds, rows, cols))
            .map_err(failed("georeference"))?;
        Ok(())
    }
}

impl RasterIntrospection for GdalRasters {
    fn projection_string(&self, path: &Path) -> Result<String> {
        let failed = || gdal_failed(format!("spatial reference of {}", path.display()));

        let srs = open(path)?.spatial_ref().map_err(failed())?;
        let proj4 = srs.to_proj4().map_err(failed())?.trim().to_string();
        if proj4.is_empty() {
            return Err(DemError::UnexpectedOutput {
                tool: "OSRExportToProj4".to_string(),
                reason: format!("no projection string for {}", path.display()),
            });
        }

        debug!("{} projection: {proj4}", path.display());
        Ok(proj4)
    }

    fn transform(&self, path: &Path) -> Result<GeoTransform> {
        open(path)?
            .geo_transform()
            .map(GeoTransform)
            .map_err(gdal_failed(format!("geotransform of {}", path.display())))
    }

    fn raster_size(&self, path: &Path) -> Result<(usize, usize)> {
        let (cols, rows) = open(path)?.raster_size();
        Ok((rows, cols))
    }
}

impl RasterBandStore for GdalRasters {
    fn read_int16(&self, path: &Path) -> Result<Int16Raster> {
        let failed = || gdal_failed(format!("read {}", path.display()));

        let dataset = open(path)?;
        let band = dataset.rasterband(1).map_err(failed())?;
        let (cols, rows) = band.size();
        let buffer: Buffer<i16> = band
            .read_as((0, 0), (cols, rows), (cols, rows), None)
            .map_err(failed())?;

        Int16Raster::new(rows, cols, buffer.data().to_vec())
    }

    fn write_int16(&self, path: &Path, raster: &Int16Raster) -> Result<()> {
        let dataset = open_update(path)?;
        let mut band = dataset
            .rasterband(1)
            .map_err(gdal_failed(format!("band 1 of {}", path.display())))?;

        let (cols, rows) = band.size();
        if (rows, cols) != (raster.rows(), raster.cols()) {
            return Err(DemError::BufferSize {
                rows,
                cols,
                len: raster.data().len(),
            });
        }

        let mut buffer = Buffer::new((cols, rows), raster.data().to_vec());
        band.write((0, 0), (cols, rows), &mut buffer)
            .map_err(gdal_failed(format!("write {}", path.display())))?;
        Ok(())
    }
}

impl MapProjector for GdalRasters {
    fn project(&self, target_srs: &str, points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>> {
        debug!("Projecting {} points into [{target_srs}]", points.len());
        let failed = |what: &str| gdal_failed(format!("{what} [{target_srs}]"));

        let source = SpatialRef::from_epsg(GEOGRAPHIC_EPSG).map_err(failed("WGS84 to"))?;
        let target = SpatialRef::from_definition(target_srs).map_err(failed("parse"))?;
        let transform = CoordTransform::new(&source, &target).map_err(failed("transform to"))?;

        // EPSG:4326 takes latitude first
        let mut xs: Vec<f64> = points.iter().map(|&(_, lat)| lat).collect();
        let mut ys: Vec<f64> = points.iter().map(|&(lon, _)| lon).collect();
        let mut zs: [f64; 0] = [];
        transform
            .transform_coords(&mut xs, &mut ys, &mut zs)
            .map_err(failed("project into"))?;

        let projected = if target.is_geographic() {
            ys.into_iter().zip(xs).collect()
        } else {
            xs.into_iter().zip(ys).collect()
        };
        Ok(projected)
    }
}
