use crate::data::schema::addresses;

/// One address as it is persisted in the destination store.
///
/// Built by the parser from a single source row and never modified
/// afterwards. City centres reuse the same shape, see [`AddressRecord::centre`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRecord {
    pub lat: f64,
    pub lon: f64,
    pub number: String,
    pub street: String,
    pub postcode: String,
    pub city: String,
    pub display_name: String,
}

impl AddressRecord {
    pub fn new(
        lat: f64,
        lon: f64,
        number: &str,
        street: &str,
        postcode: &str,
        city: &str
    ) -> Self {
        let number = number.trim();
        let street = street.trim();
        let city = city.trim();

        AddressRecord {
            lat,
            lon,
            number: number.to_owned(),
            street: street.to_owned(),
            postcode: postcode.trim().to_owned(),
            city: city.to_owned(),
            display_name: display_name(number, street, city),
        }
    }

    /// Synthetic record standing for the averaged location of a city.
    pub fn centre(lat: f64, lon: f64, postcode: &str, city: &str) -> Self {
        AddressRecord {
            lat,
            lon,
            number: String::new(),
            street: String::new(),
            postcode: postcode.to_owned(),
            city: city.to_owned(),
            display_name: centre_display_name(city),
        }
    }
}

/// `"{number} {street}, {city}"`, or just the city when the address has
/// neither a number nor a street.
pub fn display_name(number: &str, street: &str, city: &str) -> String {
    let parts = [number, street]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<&str>>();

    if parts.is_empty() {
        city.to_owned()
    } else {
        format!("{}, {}", parts.join(" "), city)
    }
}

pub fn centre_display_name(city: &str) -> String {
    format!("{} (centre)", city)
}

#[derive(Insertable, Debug)]
#[table_name = "addresses"]
pub struct NewAddress<'a> {
    pub lat: f64,
    pub lon: f64,
    pub numero: &'a str,
    pub rue: &'a str,
    pub code_postal: &'a str,
    pub ville: &'a str,
    pub display_name: &'a str,
}

impl<'a> From<&'a AddressRecord> for NewAddress<'a> {
    fn from(record: &'a AddressRecord) -> Self {
        NewAddress {
            lat: record.lat,
            lon: record.lon,
            numero: record.number.as_str(),
            rue: record.street.as_str(),
            code_postal: record.postcode.as_str(),
            ville: record.city.as_str(),
            display_name: record.display_name.as_str(),
        }
    }
}
