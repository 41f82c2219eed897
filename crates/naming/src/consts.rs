use regex::Regex;
use std::sync::LazyLock;

/// Image extensions accepted for candidate-region and reference images.
/// Compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "jpe", "png", "gif"];

/// Same set as [`IMAGE_EXTENSIONS`], as a case-insensitive regex fragment.
pub const IMAGE_EXTENSION_PATTERN: &str = "(?i:jpe?g|jpe|png|gif)";

/// Marker between the base name and the extension of a candidate-region image.
pub const CANDIDATE_REGION_MARKER: &str = "_CR";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(CANDIDATE_REGION_REGEX, format!(r"^(.+){}\.({})$", CANDIDATE_REGION_MARKER, IMAGE_EXTENSION_PATTERN).as_str());
