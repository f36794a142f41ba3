use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MODEL_NOT_FOUND_RE: Regex =
        Regex::new(r"(?i)model\s+(?:not|isn't|is not)\s+found").unwrap();
    static ref MODEL_NO_ACCESS_RE: Regex =
        Regex::new(r"(?i)you don't have access to this model").unwrap();
}

/// True when an estimator failure means the model itself is unavailable to
/// this key, as opposed to a bad answer or a transient fault.
pub fn is_model_unavailable(status: u16, code: Option<&str>, message: &str) -> bool {
    status == 404
        || code == Some("model_not_found")
        || MODEL_NOT_FOUND_RE.is_match(message)
        || MODEL_NO_ACCESS_RE.is_match(message)
}
