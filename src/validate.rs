use std::error::Error;
use std::fmt;

use regex::Regex;

pub fn validate_name(name: &str) -> Result<(), InvalidName> {
    let rgx = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    if rgx.is_match(name) {
        Ok(())
    } else {
        Err(InvalidName { name: name.into() })
    }
}

/// The rejected name. Must contain only a-Z, 0-9, _ or -.
pub struct InvalidName {
    pub name: String,
}

impl Error for InvalidName {}

impl fmt::Display for InvalidName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\"{}\". Invalid name. Must contain only a-Z, 0-9, _ or -",
            self.name
        )
    }
}

impl fmt::Debug for InvalidName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
