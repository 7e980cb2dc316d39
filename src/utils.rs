const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}
