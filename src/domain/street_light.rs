use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

pub const GEO_POINT_COLUMN: &str = "geo_point_2d";
pub const NUMERO_OUVRAGE_COLUMN: &str = "Numéro d'ouvrage";
pub const NUMERO_LAMPE_COLUMN: &str = "Numéro de lampe";
pub const ARRONDISSEMENT_COLUMN: &str = "Arrondissement";
pub const SECTEUR_COLUMN: &str = "Secteur";
pub const CATEGORIE_OUVRAGE_COLUMN: &str = "Catégorie de l'ouvrage";
pub const REGIME_HORAIRE_COLUMN: &str = "Régime (horaires)";
pub const CATEGORIE_VOIE_COLUMN: &str = "Catégorie de voie";
pub const TYPE_LAMPE_COLUMN: &str = "Type de lampe";
pub const FAMILLE_LUMINAIRE_COLUMN: &str = "Famille de luminaire";
pub const PUISSANCE_NOMINALE_COLUMN: &str = "Puissance nominale";

/// One CSV line keyed by header name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    cells: HashMap<String, String>,
}

impl SourceRow {
    pub fn new(cells: HashMap<String, String>) -> Self {
        Self { cells }
    }

    /// Cell value for `column`; empty and whitespace-only cells count as missing
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn get_owned(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_string)
    }
}

impl<K, V> FromIterator<(K, V)> for SourceRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("expected \"lat,lng\", got {0} component(s)")]
    WrongArity(usize),
    #[error("invalid coordinate value {0:?}")]
    InvalidNumber(String),
    #[error("coordinate value {0} is not finite")]
    NotFinite(f64),
}

/// Why a row produced no record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("no geo_point_2d value")]
    MissingCoordinates,
    #[error(transparent)]
    InvalidCoordinates(#[from] CoordinateError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// WKT point, longitude first
    pub fn to_wkt(&self) -> String {
        format!("POINT({} {})", self.lon, self.lat)
    }
}

/// Parse a combined `geo_point_2d` value (`"lat, lng"`)
pub fn parse_geo_point(value: &str) -> Result<Coordinates, CoordinateError> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 2 {
        return Err(CoordinateError::WrongArity(parts.len()));
    }

    let parse = |token: &str| -> Result<f64, CoordinateError> {
        let token = token.trim();
        let parsed: f64 = token
            .parse()
            .map_err(|_| CoordinateError::InvalidNumber(token.to_string()))?;
        if parsed.is_finite() {
            Ok(parsed)
        } else {
            Err(CoordinateError::NotFinite(parsed))
        }
    };

    Ok(Coordinates {
        lat: parse(parts[0])?,
        lon: parse(parts[1])?,
    })
}

/// Replace NaN and infinite values with `None`
pub fn sanitize_float(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Parse a numeric cell, accepting a decimal comma ("1,5").
///
/// "NaN" and "inf" parse as-is; `StreetLight::sanitized` drops them.
pub fn parse_float_cell(value: &str) -> Option<f64> {
    value.trim().replace(',', ".").parse().ok()
}

/// Insert-ready row of the `street_lights` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetLight {
    pub numero_ouvrage: Option<String>,
    pub numero_lampe: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub geometry: String,
    pub arrondissement: Option<String>,
    pub secteur: Option<String>,
    pub categorie_ouvrage: Option<String>,
    pub regime_horaire: Option<String>,
    pub categorie_voie: Option<String>,
    pub type_lampe: Option<String>,
    pub famille_luminaire: Option<String>,
    pub puissance_nominale: Option<f64>,
}

impl StreetLight {
    /// Map a CSV row to a record.
    ///
    /// Rows without a usable `geo_point_2d` are skipped, never imported.
    pub fn from_row(row: &SourceRow) -> Result<Self, SkipReason> {
        let geo_point = row
            .get(GEO_POINT_COLUMN)
            .ok_or(SkipReason::MissingCoordinates)?;
        let coords = parse_geo_point(geo_point)?;
        Ok(Self::with_coordinates(row, coords))
    }

    pub fn with_coordinates(row: &SourceRow, coords: Coordinates) -> Self {
        Self {
            numero_ouvrage: row.get_owned(NUMERO_OUVRAGE_COLUMN),
            numero_lampe: row.get_owned(NUMERO_LAMPE_COLUMN),
            latitude: coords.lat,
            longitude: coords.lon,
            geometry: coords.to_wkt(),
            arrondissement: row.get_owned(ARRONDISSEMENT_COLUMN),
            secteur: row.get_owned(SECTEUR_COLUMN),
            categorie_ouvrage: row.get_owned(CATEGORIE_OUVRAGE_COLUMN),
            regime_horaire: row.get_owned(REGIME_HORAIRE_COLUMN),
            categorie_voie: row.get_owned(CATEGORIE_VOIE_COLUMN),
            type_lampe: row.get_owned(TYPE_LAMPE_COLUMN),
            famille_luminaire: row.get_owned(FAMILLE_LUMINAIRE_COLUMN),
            puissance_nominale: row
                .get(PUISSANCE_NOMINALE_COLUMN)
                .and_then(parse_float_cell),
        }
        .sanitized()
    }

    /// Drop non-finite values from every optional float field.
    /// The only place NaN and infinity are filtered out of a record.
    pub fn sanitized(mut self) -> Self {
        self.puissance_nominale = sanitize_float(self.puissance_nominale);
        self
    }
}
