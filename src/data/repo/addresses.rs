use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Nullable, Text};
use diesel::SqliteConnection;

use crate::data::models::{AddressRecord, NewAddress};

const TOP_CITIES_LIMIT: i64 = 10;

const CITY_CENTRES_QUERY: &str = "
    SELECT
        ville,
        AVG(lat) AS lat,
        AVG(lon) AS lon,
        MIN(code_postal) AS code_postal
    FROM addresses
    GROUP BY ville
    ORDER BY MIN(id)";

const TOP_CITIES_QUERY: &str = "
    SELECT ville, COUNT(*) AS count
    FROM addresses
    GROUP BY ville
    ORDER BY count DESC, MIN(id) ASC
    LIMIT ?";

#[derive(QueryableByName, Debug)]
struct CityCentreRow {
    #[sql_type = "Text"]
    ville: String,
    #[sql_type = "Double"]
    lat: f64,
    #[sql_type = "Double"]
    lon: f64,
    #[sql_type = "Nullable<Text>"]
    code_postal: Option<String>,
}

#[derive(QueryableByName, Debug)]
struct CityCount {
    #[sql_type = "Text"]
    ville: String,
    #[sql_type = "BigInt"]
    count: i64,
}

#[derive(QueryableByName, Debug)]
struct Count {
    #[sql_type = "BigInt"]
    count: i64,
}

/// Row counts of the finished store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub total: i64,
    pub cities: i64,
    pub top_cities: Vec<(String, i64)>,
}

/// Inserts the whole slice in a single transaction.
pub fn insert_addresses(
    conn: &SqliteConnection,
    records: &[AddressRecord]
) -> QueryResult<usize> {
    use crate::data::schema::addresses::dsl::*;

    let new_addresses = records
        .iter()
        .map(NewAddress::from)
        .collect::<Vec<NewAddress>>();

    conn.transaction(|| {
        diesel::insert_into(addresses)
            .values(&new_addresses)
            .execute(conn)
    })
}

/// Computes one centre per distinct city (exact, case-sensitive match)
/// from every row currently stored.
///
/// The postcode of a centre is the smallest one of its group. Nothing
/// downstream relies on it being meaningful.
pub fn city_centres(conn: &SqliteConnection) -> QueryResult<Vec<AddressRecord>> {
    let rows = diesel::sql_query(CITY_CENTRES_QUERY).load::<CityCentreRow>(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            AddressRecord::centre(
                row.lat,
                row.lon,
                row.code_postal.as_deref().unwrap_or(""),
                &row.ville
            )
        })
        .collect())
}

/// Appends the city centres next to the raw points. Must only run once
/// every region has been imported.
pub fn add_city_centres(conn: &SqliteConnection) -> QueryResult<usize> {
    let centres = city_centres(conn)?;
    insert_addresses(conn, &centres)
}

/// Refreshes planner statistics then compacts the file.
pub fn optimize(conn: &SqliteConnection) -> QueryResult<()> {
    conn.batch_execute("ANALYZE; VACUUM;")
}

pub fn count_addresses(conn: &SqliteConnection) -> QueryResult<i64> {
    use crate::data::schema::addresses::dsl::*;

    addresses.count().get_result(conn)
}

pub fn count_cities(conn: &SqliteConnection) -> QueryResult<i64> {
    diesel::sql_query("SELECT COUNT(DISTINCT ville) AS count FROM addresses")
        .get_result::<Count>(conn)
        .map(|c| c.count)
}

pub fn top_cities(conn: &SqliteConnection, limit: i64) -> QueryResult<Vec<(String, i64)>> {
    diesel::sql_query(TOP_CITIES_QUERY)
        .bind::<BigInt, _>(limit)
        .load::<CityCount>(conn)
        .map(|rows| rows.into_iter().map(|r| (r.ville, r.count)).collect())
}

pub fn store_stats(conn: &SqliteConnection) -> QueryResult<StoreStats> {
    Ok(StoreStats {
        total: count_addresses(conn)?,
        cities: count_cities(conn)?,
        top_cities: top_cities(conn, TOP_CITIES_LIMIT)?,
    })
}
