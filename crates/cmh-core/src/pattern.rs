use regex::RegexBuilder;

/// Server-name filter used by fan-out enumeration and search.
///
/// The pattern is compiled as a case-insensitive regular expression when it
/// parses; otherwise it degrades to a literal case-insensitive equality
/// match. A missing pattern matches every server.
#[derive(Debug, Clone)]
pub enum ServerPattern {
    Any,
    Regex(regex::Regex),
    Literal(String),
}

impl ServerPattern {
    pub fn parse(pattern: Option<&str>) -> Self {
        match pattern {
            None => Self::Any,
            Some(raw) => match RegexBuilder::new(raw).case_insensitive(true).build() {
                Ok(re) => Self::Regex(re),
                Err(_) => Self::Literal(raw.to_lowercase()),
            },
        }
    }

    pub fn matches(&self, server_name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Regex(re) => re.is_match(server_name),
            Self::Literal(literal) => server_name.to_lowercase() == *literal,
        }
    }
}
