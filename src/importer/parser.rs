use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::ReaderBuilder;

use super::ImportError;
use crate::domain::street_light::GEO_POINT_COLUMN;
use crate::domain::{SkipReason, SourceRow, StreetLight};

const DELIMITER: u8 = b';';

/// Read the whole semicolon-delimited file into memory
pub fn read_rows(path: &Path) -> Result<Vec<SourceRow>, ImportError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ImportError::InputNotFound(path.to_path_buf()),
        _ => ImportError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    tracing::info!("Reading CSV: {}", path.display());
    read_rows_from(file)
}

pub fn read_rows_from<R: Read>(reader: R) -> Result<Vec<SourceRow>, ImportError> {
    // Short rows are kept; missing cells read as absent
    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(reader);

    // Header names, without a leading BOM
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    // A comma-delimited export collapses into a single header
    if !headers.iter().any(|h| h == GEO_POINT_COLUMN) {
        return Err(ImportError::MissingColumn(GEO_POINT_COLUMN));
    }

    // Key every record by its header name
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let cells: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        rows.push(SourceRow::new(cells));
    }

    tracing::info!("Read {} rows", rows.len());

    Ok(rows)
}

/// Records built from the input plus the number of rows left out
#[derive(Debug, Default)]
pub struct TransformOutcome {
    pub records: Vec<StreetLight>,
    pub skipped: usize,
}

/// Build a `StreetLight` for every row with usable coordinates, keeping input order
pub fn transform_rows(rows: &[SourceRow]) -> TransformOutcome {
    let mut records = Vec::with_capacity(rows.len());
    let mut missing_coordinates = 0;
    let mut invalid_coordinates = 0;

    for row in rows {
        match StreetLight::from_row(row) {
            Ok(light) => records.push(light),
            Err(SkipReason::MissingCoordinates) => missing_coordinates += 1,
            Err(SkipReason::InvalidCoordinates(e)) => {
                invalid_coordinates += 1;
                tracing::trace!(
                    "Skipping row with {:?}: {}",
                    row.get(GEO_POINT_COLUMN),
                    e
                );
            }
        }
    }

    let skipped = missing_coordinates + invalid_coordinates;
    if skipped > 0 {
        tracing::debug!(
            "Skipped {} rows: {} without coordinates, {} with invalid coordinates",
            skipped,
            missing_coordinates,
            invalid_coordinates
        );
    }

    TransformOutcome { records, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Numéro d'ouvrage;Numéro de lampe;Arrondissement;Secteur;Catégorie de l'ouvrage;Régime (horaires);Catégorie de voie;Type de lampe;Famille de luminaire;Puissance nominale;geo_point_2d";

    fn csv_with(lines: &[&str]) -> String {
        let mut content = String::from(HEADER);
        for line in lines {
            content.push('\n');
            content.push_str(line);
        }
        content
    }

    #[test]
    fn test_read_rows_by_header() {
        let content = csv_with(&[
            "101;1;75001;Centre;Candélabre;Soir et nuit;Voie;LED;Boule;70;48.86,2.35",
        ]);
        let rows = read_rows_from(content.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Numéro d'ouvrage"), Some("101"));
        assert_eq!(rows[0].get("Régime (horaires)"), Some("Soir et nuit"));
        assert_eq!(rows[0].get(GEO_POINT_COLUMN), Some("48.86,2.35"));
    }

    #[test]
    fn test_read_rows_strips_bom() {
        let content = format!("\u{feff}{}", csv_with(&["101;;;;;;;;;;48.86,2.35"]));
        let rows = read_rows_from(content.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Numéro d'ouvrage"), Some("101"));
    }

    #[test]
    fn test_comma_delimited_file_is_rejected() {
        let content = "Secteur,geo_point_2d\nCentre,\"48.86,2.35\"";
        let result = read_rows_from(content.as_bytes());

        assert!(matches!(
            result,
            Err(ImportError::MissingColumn(GEO_POINT_COLUMN))
        ));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let content = csv_with(&["101;1"]);
        let rows = read_rows_from(content.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(GEO_POINT_COLUMN), None);
    }

    #[test]
    fn test_missing_file() {
        let result = read_rows(Path::new("/tmp/nonexistent_eclairage_public.csv"));
        assert!(matches!(result, Err(ImportError::InputNotFound(_))));
    }

    #[test]
    fn test_transform_skips_unusable_rows() {
        let content = csv_with(&[
            "101;1;75001;Centre;Candélabre;Soir et nuit;Voie;LED;Boule;70;48.86,2.35",
            "102;1;75002;Centre;Candélabre;Soir et nuit;Voie;LED;Boule;70;",
            "103;1;75003;Centre;Candélabre;Soir et nuit;Voie;LED;Boule;70;bad",
        ]);
        let rows = read_rows_from(content.as_bytes()).unwrap();
        let outcome = transform_rows(&rows);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped, 2);

        let light = &outcome.records[0];
        assert_eq!(light.latitude, 48.86);
        assert_eq!(light.longitude, 2.35);
        assert_eq!(light.geometry, "POINT(2.35 48.86)");
        assert_eq!(light.numero_ouvrage.as_deref(), Some("101"));
    }

    #[test]
    fn test_transform_preserves_order() {
        let lines: Vec<String> = (0..20)
            .map(|i| format!("{};1;;;;;;;;;48.{},2.3", i, i + 10))
            .collect();
        let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let rows = read_rows_from(csv_with(&line_refs).as_bytes()).unwrap();
        let outcome = transform_rows(&rows);

        let ids: Vec<String> = outcome
            .records
            .iter()
            .filter_map(|r| r.numero_ouvrage.clone())
            .collect();
        let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_transform_never_emits_non_finite_values() {
        let content = csv_with(&[
            "1;1;;;;;;;;NaN;48.86,2.35",
            "2;1;;;;;;;;inf;48.86,2.35",
            "3;1;;;;;;;;-inf;48.86,2.35",
            "4;1;;;;;;;;12,5;48.86,2.35",
            "5;1;;;;;;;;70;NaN,2.35",
        ]);
        let rows = read_rows_from(content.as_bytes()).unwrap();
        let outcome = transform_rows(&rows);

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.skipped, 1);
        for light in &outcome.records {
            assert!(light.latitude.is_finite());
            assert!(light.longitude.is_finite());
            assert!(light.puissance_nominale.map_or(true, f64::is_finite));
        }
        assert_eq!(outcome.records[3].puissance_nominale, Some(12.5));
    }
}
