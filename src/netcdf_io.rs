//! NetCDF reading and writing of gridded fields
//!
//! Fields are read as `f64` with fill values mapped to NaN and packed data
//! unpacked, and written back as `f64` with their coordinates and
//! attributes plus a global `history` line.

use crate::errors::{ClimVisError, Result};
use crate::field::{Coordinate, GriddedField};
use chrono::Utc;
use ndarray::{aview1, ArrayD, IxDyn};
use netcdf::{create, AttributeValue, File, Variable};
use std::collections::BTreeMap;
use std::{fs, path::Path};

/// Attributes consumed while decoding and not carried on the field
const DECODING_ATTRIBUTES: [&str; 4] = ["_FillValue", "missing_value", "scale_factor", "add_offset"];

fn attribute_number(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Double(v) => Some(*v),
        AttributeValue::Float(v) => Some(f64::from(*v)),
        AttributeValue::Int(v) => Some(f64::from(*v)),
        AttributeValue::Short(v) => Some(f64::from(*v)),
        AttributeValue::Schar(v) => Some(f64::from(*v)),
        AttributeValue::Uchar(v) => Some(f64::from(*v)),
        AttributeValue::Ushort(v) => Some(f64::from(*v)),
        AttributeValue::Uint(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn attribute_text(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Str(s) => Some(s.clone()),
        AttributeValue::Strs(s) => Some(s.join(", ")),
        other => attribute_number(other).map(|v| v.to_string()),
    }
}

fn numeric_attribute(var: &Variable, name: &str) -> Result<Option<f64>> {
    match var.attribute(name) {
        Some(attr) => Ok(attribute_number(&attr.value()?)),
        None => Ok(None),
    }
}

fn text_attributes(var: &Variable) -> Result<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    for attr in var.attributes() {
        if DECODING_ATTRIBUTES.contains(&attr.name()) {
            continue;
        }
        match attribute_text(&attr.value()?) {
            Some(text) => {
                attributes.insert(attr.name().to_string(), text);
            }
            None => tracing::debug!(attribute = attr.name(), "skipped unsupported attribute type"),
        }
    }
    Ok(attributes)
}

/// Load `var_name` with its coordinate variables and attributes.
///
/// Dimensions without a coordinate variable get `0..len` index values.
///
/// # Errors
///
/// Returns `VariableNotFound` if the variable is absent and `NetCDFError`
/// on read failures.
pub fn read_field(file: &File, var_name: &str) -> Result<GriddedField> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| ClimVisError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    let dims: Vec<(String, usize)> = var
        .dimensions()
        .iter()
        .map(|d| (d.name().to_string(), d.len()))
        .collect();
    let shape: Vec<usize> = dims.iter().map(|(_, len)| *len).collect();

    let fill = numeric_attribute(&var, "_FillValue")?;
    let missing = numeric_attribute(&var, "missing_value")?;
    let scale = numeric_attribute(&var, "scale_factor")?.unwrap_or(1.0);
    let offset = numeric_attribute(&var, "add_offset")?.unwrap_or(0.0);

    let raw = var.get_values::<f64, _>(..)?;
    let mut data = ArrayD::from_shape_vec(IxDyn(&shape), raw)?;
    data.mapv_inplace(|v| {
        if Some(v) == fill || Some(v) == missing {
            f64::NAN
        } else {
            v * scale + offset
        }
    });

    let mut coords = Vec::with_capacity(dims.len());
    for (name, len) in &dims {
        let coord = match file.variable(name) {
            Some(cvar) if cvar.dimensions().len() == 1 => {
                let mut coord = Coordinate::new(name.clone(), cvar.get_values::<f64, _>(..)?);
                coord.attributes = text_attributes(&cvar)?;
                coord
            }
            _ => Coordinate::new(name.clone(), (0..*len).map(|i| i as f64).collect()),
        };
        coords.push(coord);
    }

    let mut field = GriddedField::new(var_name, data, coords)?;
    field.attributes = text_attributes(&var)?;
    tracing::debug!(variable = var_name, shape = ?shape, "read field");
    Ok(field)
}

/// Write `field` to a new NetCDF file at `output_path`, replacing any
/// existing file.
///
/// The field's `history` attribute becomes the global `history`, followed by
/// a line stamping this write.
///
/// # Errors
///
/// Returns `IoError` if an existing file cannot be removed and `NetCDFError`
/// on write failures.
pub fn write_field(field: &GriddedField, output_path: &Path) -> Result<()> {
    if output_path.exists() {
        fs::remove_file(output_path)?;
    }

    let mut file = create(output_path)?;

    for coord in &field.coords {
        file.add_dimension(&coord.name, coord.len())?;
    }
    for coord in &field.coords {
        let mut cvar = file.add_variable::<f64>(&coord.name, &[coord.name.as_str()])?;
        for (key, value) in &coord.attributes {
            cvar.put_attribute(key, value.as_str())?;
        }
        cvar.put(aview1(&coord.values).into_dyn(), ..)?;
    }

    let dim_names = field.dim_names();
    let dim_refs: Vec<&str> = dim_names.iter().map(String::as_str).collect();
    let mut var = file.add_variable::<f64>(&field.name, &dim_refs)?;
    for (key, value) in field.attributes.iter().filter(|(k, _)| k.as_str() != "history") {
        var.put_attribute(key, value.as_str())?;
    }
    var.put(field.data.view(), ..)?;

    let stamp = format!("Created by climvis on {}", Utc::now().to_rfc3339());
    let history = match field.attributes.get("history") {
        Some(previous) if !previous.is_empty() => format!("{previous}\n{stamp}"),
        _ => stamp,
    };
    file.add_attribute("history", history)?;

    tracing::info!(variable = %field.name, path = %output_path.display(), "wrote field");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn decodes_fill_and_packing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("packed.nc");
        {
            let mut file = create(&path).unwrap();
            file.add_dimension("x", 3).unwrap();
            let mut var = file.add_variable::<f32>("t", &["x"]).unwrap();
            var.put_attribute("_FillValue", -999.0f32).unwrap();
            var.put_attribute("scale_factor", 0.5f32).unwrap();
            var.put_attribute("add_offset", 10.0f32).unwrap();
            var.put_attribute("units", "K").unwrap();
            var.put(aview1(&[2.0f32, -999.0, 4.0]).into_dyn(), ..).unwrap();
        }
        let file = netcdf::open(&path).unwrap();
        let field = read_field(&file, "t").unwrap();
        assert_eq!(field.data[[0]], 11.0);
        assert!(field.data[[1]].is_nan());
        assert_eq!(field.data[[2]], 12.0);
        assert_eq!(field.units(), Some("K"));
        assert!(!field.attributes.contains_key("scale_factor"));
        // no coordinate variable
        assert_eq!(field.coords[0].values, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn missing_variable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.nc");
        drop(create(&path).unwrap());
        let file = netcdf::open(&path).unwrap();
        assert!(matches!(
            read_field(&file, "nope"),
            Err(ClimVisError::VariableNotFound { .. })
        ));
    }
}
