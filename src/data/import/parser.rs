use std::fmt;
use std::io::Read;
use std::ops::AddAssign;

use serde::Deserialize;

use crate::data::models::AddressRecord;

const DELIMITER: u8 = b';';

/// The subset of BAN columns the store needs, located by header name.
#[derive(Debug, Deserialize)]
struct BanRow {
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lon: String,
    #[serde(default)]
    numero: String,
    #[serde(default)]
    nom_voie: String,
    #[serde(default)]
    code_postal: String,
    #[serde(default)]
    nom_commune: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The row could not be read at all (bad encoding)
    Malformed,
    /// The source has no `lat` or `lon` column
    MissingCoordinates,
    /// `lat` or `lon` is not a finite number
    InvalidCoordinate,
    /// `lat` or `lon` is exactly zero, which the source uses for "unknown"
    ZeroCoordinate,
    MissingCity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Record(AddressRecord),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub malformed: usize,
    pub missing_coordinates: usize,
    pub invalid_coordinate: usize,
    pub zero_coordinate: usize,
    pub missing_city: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        let counter = match reason {
            SkipReason::Malformed => &mut self.malformed,
            SkipReason::MissingCoordinates => &mut self.missing_coordinates,
            SkipReason::InvalidCoordinate => &mut self.invalid_coordinate,
            SkipReason::ZeroCoordinate => &mut self.zero_coordinate,
            SkipReason::MissingCity => &mut self.missing_city,
        };
        *counter += 1;
    }

    pub fn total(&self) -> usize {
        self.malformed
            + self.missing_coordinates
            + self.invalid_coordinate
            + self.zero_coordinate
            + self.missing_city
    }
}

impl AddAssign for SkipCounts {
    fn add_assign(&mut self, other: SkipCounts) {
        self.malformed += other.malformed;
        self.missing_coordinates += other.missing_coordinates;
        self.invalid_coordinate += other.invalid_coordinate;
        self.zero_coordinate += other.zero_coordinate;
        self.missing_city += other.missing_city;
    }
}

impl fmt::Display for SkipCounts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} skipped ({} malformed, {} without coordinate columns, {} invalid coordinates, \
             {} zero coordinates, {} without city)",
            self.total(),
            self.malformed,
            self.missing_coordinates,
            self.invalid_coordinate,
            self.zero_coordinate,
            self.missing_city
        )
    }
}

/// Forward-only sequence of parsed rows. Restarting means re-reading the source.
pub struct AddressRows<R> {
    records: csv::StringRecordsIntoIter<R>,
    headers: csv::StringRecord,
    has_coordinates: bool,
}

impl<R: Read> Iterator for AddressRows<R> {
    type Item = RowOutcome;

    fn next(&mut self) -> Option<RowOutcome> {
        let record = self.records.next()?;
        let outcome = match record.and_then(|record| self.read_row(record)) {
            Ok(_) if !self.has_coordinates => RowOutcome::Skipped(SkipReason::MissingCoordinates),
            Ok(row) => parse_row(row),
            Err(_) => RowOutcome::Skipped(SkipReason::Malformed),
        };
        Some(outcome)
    }
}

impl<R> AddressRows<R> {
    /// Rows short on trailing columns read them as empty, extra columns are dropped.
    fn read_row(&self, mut record: csv::StringRecord) -> csv::Result<BanRow> {
        record.truncate(self.headers.len());
        while record.len() < self.headers.len() {
            record.push_field("");
        }
        record.deserialize(Some(&self.headers))
    }
}

/// Reads `;`-separated BAN rows, locating columns by their header name.
pub fn parse_addresses<R: Read>(reader: R) -> AddressRows<R> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().cloned().unwrap_or_default();
    let has_coordinates =
        headers.iter().any(|h| h == "lat") && headers.iter().any(|h| h == "lon");

    AddressRows {
        records: reader.into_records(),
        headers,
        has_coordinates,
    }
}

fn parse_row(row: BanRow) -> RowOutcome {
    let (lat, lon) = match (parse_coordinate(&row.lat), parse_coordinate(&row.lon)) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return RowOutcome::Skipped(SkipReason::InvalidCoordinate),
    };
    if lat == 0.0 || lon == 0.0 {
        return RowOutcome::Skipped(SkipReason::ZeroCoordinate);
    }
    if row.nom_commune.trim().is_empty() {
        return RowOutcome::Skipped(SkipReason::MissingCity);
    }

    RowOutcome::Record(AddressRecord::new(
        lat,
        lon,
        &row.numero,
        &row.nom_voie,
        &row.code_postal,
        &row.nom_commune
    ))
}

fn parse_coordinate(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id;numero;rep;nom_voie;code_postal;nom_commune;lon;lat";

    fn parse(text: &str) -> Vec<RowOutcome> {
        parse_addresses(text.as_bytes()).collect()
    }

    fn records(outcomes: &[RowOutcome]) -> Vec<&AddressRecord> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                RowOutcome::Record(r) => Some(r),
                RowOutcome::Skipped(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_valid_row() {
        let text = format!(
            "{}\n67482_1234_00012;12;;Rue du Marché;67000;Strasbourg;7.75;48.58\n",
            HEADER
        );
        let outcomes = parse(&text);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0],
            RowOutcome::Record(AddressRecord::new(
                48.58, 7.75, "12", "Rue du Marché", "67000", "Strasbourg"
            ))
        );
    }

    #[test]
    fn test_columns_located_by_name() {
        let text = "nom_commune;lat;code_postal;lon;nom_voie;numero\n\
                    Colmar;48.08;68000;7.36;Grand Rue;3\n";
        let outcomes = parse(text);
        let parsed = records(&outcomes);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].lat, 48.08);
        assert_eq!(parsed[0].lon, 7.36);
        assert_eq!(parsed[0].display_name, "3 Grand Rue, Colmar");
    }

    #[test]
    fn test_optional_columns_default_to_empty() {
        let text = "lat;lon;nom_commune\n48.08;7.36;Colmar\n";
        let outcomes = parse(text);
        let parsed = records(&outcomes);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].postcode, "");
        assert_eq!(parsed[0].display_name, "Colmar");
    }

    #[test]
    fn test_zero_coordinates_are_skipped() {
        let text = format!(
            "{}\na;1;;Rue;67000;Strasbourg;0;48.5\nb;2;;Rue;67000;Strasbourg;7.7;0\nc;3;;Rue;67000;Strasbourg;0.0;0.0\n",
            HEADER
        );

        assert_eq!(
            parse(&text),
            vec![RowOutcome::Skipped(SkipReason::ZeroCoordinate); 3]
        );
    }

    #[test]
    fn test_invalid_coordinates_are_skipped() {
        let text = format!(
            "{}\na;1;;Rue;67000;Strasbourg;abc;48.5\nb;2;;Rue;67000;Strasbourg;;48.5\nc;3;;Rue;67000;Strasbourg;NaN;48.5\nd;4;;Rue;67000;Strasbourg;7.7;48.5\n",
            HEADER
        );
        let outcomes = parse(&text);

        assert_eq!(outcomes[0], RowOutcome::Skipped(SkipReason::InvalidCoordinate));
        assert_eq!(outcomes[1], RowOutcome::Skipped(SkipReason::InvalidCoordinate));
        assert_eq!(outcomes[2], RowOutcome::Skipped(SkipReason::InvalidCoordinate));
        assert_eq!(records(&outcomes).len(), 1);
    }

    #[test]
    fn test_missing_coordinate_columns() {
        let text = "numero;nom_voie;nom_commune\n1;Rue;Colmar\n2;Rue;Colmar\n";

        assert_eq!(
            parse(text),
            vec![RowOutcome::Skipped(SkipReason::MissingCoordinates); 2]
        );
    }

    #[test]
    fn test_malformed_row_does_not_stop_parsing() {
        let text = b"lat;lon;nom_commune\n48.5;7.7;Col\xffmar\n48.08;7.36;Colmar\n";
        let outcomes = parse_addresses(&text[..]).collect::<Vec<RowOutcome>>();

        assert_eq!(outcomes[0], RowOutcome::Skipped(SkipReason::Malformed));
        assert_eq!(records(&outcomes).len(), 1);
    }

    #[test]
    fn test_short_row_reads_missing_optionals_as_empty() {
        let text = "lat;lon;nom_commune;numero;nom_voie\n48.5;7.7;Colmar\n48.5;7.7;Colmar;3\n";
        let outcomes = parse(text);
        let parsed = records(&outcomes);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].number, "");
        assert_eq!(parsed[0].display_name, "Colmar");
        assert_eq!(parsed[1].display_name, "3, Colmar");
    }

    #[test]
    fn test_short_row_without_coordinates_is_invalid() {
        let text = format!("{}\nbroken;row\n", HEADER);

        assert_eq!(parse(&text), vec![RowOutcome::Skipped(SkipReason::InvalidCoordinate)]);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let text = "lat;lon;nom_commune\n48.5;7.7;Colmar;surplus\n";

        assert_eq!(records(&parse(text))[0].display_name, "Colmar");
    }

    #[test]
    fn test_missing_city_is_skipped() {
        let text = format!("{}\na;1;;Rue;67000;  ;7.7;48.5\n", HEADER);

        assert_eq!(parse(&text), vec![RowOutcome::Skipped(SkipReason::MissingCity)]);
    }

    #[test]
    fn test_coordinates_are_trimmed() {
        let text = format!("{}\na;1;;Rue;67000;Strasbourg; 7.7 ; 48.5\n", HEADER);
        let outcomes = parse(&text);

        assert_eq!(records(&outcomes)[0].lat, 48.5);
    }

    #[test]
    fn test_skip_counts() {
        let mut counts = SkipCounts::default();
        counts.record(SkipReason::ZeroCoordinate);
        counts.record(SkipReason::ZeroCoordinate);
        counts.record(SkipReason::Malformed);

        let mut total = SkipCounts::default();
        total += counts;
        total += counts;

        assert_eq!(counts.total(), 3);
        assert_eq!(total.zero_coordinate, 4);
        assert_eq!(total.malformed, 2);
        assert_eq!(total.total(), 6);
    }
}
