//! Reads the monitoring-station catalog: a comma delimited file with a header
//! and at least the `code`, `name`, `lat` and `lon` columns.

use crate::stations::error::StationError;
use crate::types::station::{CatalogEntry, Location, StationCode};
use polars::prelude::*;
use std::path::Path;

fn catalog_column(
    df: &DataFrame,
    path: &Path,
    column: &'static str,
    dtype: &DataType,
) -> Result<Column, StationError> {
    df.column(column)
        .and_then(|c| c.cast(dtype))
        .map_err(|source| StationError::MissingColumn {
            path: path.to_path_buf(),
            column,
            source,
        })
}

pub fn read_catalog(path: &Path) -> Result<Vec<CatalogEntry>, StationError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| StationError::CatalogRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| StationError::CatalogRead(path.to_path_buf(), e))?;

    let codes = catalog_column(&df, path, "code", &DataType::Int64)?;
    let names = catalog_column(&df, path, "name", &DataType::String)?;
    let lats = catalog_column(&df, path, "lat", &DataType::Float64)?;
    let lons = catalog_column(&df, path, "lon", &DataType::Float64)?;

    let as_typed = |column: &'static str, e: PolarsError| StationError::MissingColumn {
        path: path.to_path_buf(),
        column,
        source: e,
    };
    let codes = codes.i64().map_err(|e| as_typed("code", e))?;
    let names = names.str().map_err(|e| as_typed("name", e))?;
    let lats = lats.f64().map_err(|e| as_typed("lat", e))?;
    let lons = lons.f64().map_err(|e| as_typed("lon", e))?;

    let invalid = |column: &'static str, row: usize| StationError::InvalidValue {
        path: path.to_path_buf(),
        column,
        row,
    };

    let mut entries = Vec::with_capacity(df.height());
    for (row, (((code, name), lat), lon)) in codes
        .into_iter()
        .zip(names.into_iter())
        .zip(lats.into_iter())
        .zip(lons.into_iter())
        .enumerate()
    {
        let code = code
            .and_then(|c| u32::try_from(c).ok())
            .ok_or_else(|| invalid("code", row))?;
        let name = name.ok_or_else(|| invalid("name", row))?;
        let latitude = lat.ok_or_else(|| invalid("lat", row))?;
        let longitude = lon.ok_or_else(|| invalid("lon", row))?;
        entries.push(CatalogEntry {
            code: StationCode(code),
            name: name.to_string(),
            location: Location {
                latitude,
                longitude,
            },
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn catalog_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_catalog_keeps_order() -> Result<(), Box<dyn std::error::Error>> {
        let file = catalog_file(
            "code,name,lat,lon,type\n\
             99,Pinheiros,-23.5614,-46.7020,urban\n\
             1,Parque D.Pedro II,-23.5448,-46.6276,urban\n",
        );
        let entries = read_catalog(file.path())?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, StationCode(99));
        assert_eq!(entries[0].name, "Pinheiros");
        assert_eq!(entries[1].code, StationCode(1));
        assert!((entries[1].location.longitude + 46.6276).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_missing_coordinate_is_invalid() {
        let file = catalog_file("code,name,lat,lon\n99,Pinheiros,,-46.7020\n");
        let err = read_catalog(file.path()).unwrap_err();
        assert!(matches!(
            err,
            StationError::InvalidValue { column: "lat", row: 0, .. }
        ));
    }

    #[test]
    fn test_missing_column() {
        let file = catalog_file("code,name,latitude,lon\n99,Pinheiros,-23.5,-46.7\n");
        let err = read_catalog(file.path()).unwrap_err();
        assert!(matches!(err, StationError::MissingColumn { column: "lat", .. }));
    }
}
