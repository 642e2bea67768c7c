//! Configuration access port trait.

/// Read-only access to sectioned key/value configuration.
///
/// Numeric getters fall back to `default` when the key is missing or does not
/// parse; validation is responsible for rejecting bad values.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
}
