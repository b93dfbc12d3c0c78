//! "Drop one field" exports for sharing the underlying datasets.

use std::io::{Read, Write};

use geojson::GeoJson;

use crate::error::CartoError;

/// Copies a CSV document, leaving out `column`.
///
/// A missing column yields an unchanged copy. Returns the number of data rows.
pub fn export_csv<R: Read, W: Write>(reader: R, writer: W, column: &str) -> Result<usize, CartoError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut writer = csv::Writer::from_writer(writer);

    let headers = reader.headers()?.clone();
    let skip = headers.iter().position(|h| h.trim() == column);
    if skip.is_none() {
        log::warn!("Column {column:?} not found, copying unchanged");
    }
    let keep = |i: usize| Some(i) != skip;

    writer.write_record(headers.iter().enumerate().filter(|(i, _)| keep(*i)).map(|(_, h)| h))?;

    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        writer.write_record(record.iter().enumerate().filter(|(i, _)| keep(*i)).map(|(_, v)| v))?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

/// Removes property `name` from every feature. Returns how many features had it.
pub fn strip_property(geojson: &mut GeoJson, name: &str) -> usize {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter_mut().collect::<Vec<_>>(),
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => Vec::new(),
    };
    features
        .into_iter()
        .filter_map(|f| f.properties.as_mut())
        .filter_map(|p| p.remove(name))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(input: &str, column: &str) -> (String, usize) {
        let mut out = Vec::new();
        let rows = export_csv(input.as_bytes(), &mut out, column).unwrap();
        (String::from_utf8(out).unwrap(), rows)
    }

    #[test]
    fn drops_named_column() {
        let (out, rows) = run("pays,current,titre\nUSA,12,\"a, b\"\nIND,3,c\n", "titre");
        assert_eq!(out, "pays,current\nUSA,12\nIND,3\n");
        assert_eq!(rows, 2);
    }

    #[test]
    fn missing_column_copies() {
        let (out, _) = run("pays,current\nUSA,12\n", "titre");
        assert_eq!(out, "pays,current\nUSA,12\n");
    }

    #[test]
    fn quoted_fields_survive() {
        let (out, _) = run("a,b,c\n\"x,y\",1,2\n", "b");
        assert_eq!(out, "a,c\n\"x,y\",2\n");
    }

    #[test]
    fn strips_property_from_every_feature() {
        let mut gj: GeoJson = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null, "properties": { "ADM0_A3": "USA", "articles": [1, 2] } },
                { "type": "Feature", "geometry": null, "properties": { "ADM0_A3": "IND" } },
                { "type": "Feature", "geometry": null, "properties": null }
            ]
        })
        .to_string()
        .parse()
        .unwrap();

        assert_eq!(strip_property(&mut gj, "articles"), 1);
        let GeoJson::FeatureCollection(fc) = &gj else { panic!("collection expected") };
        assert!(fc.features.iter().all(|f| !f.contains_property("articles")));
        assert_eq!(fc.features[0].property("ADM0_A3"), Some(&json!("USA")));
    }
}
