use std::env;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Runtime configuration for the engine: the facet set and its display
/// label, the tag vocabulary, and the page size. The facet set and tag
/// vocabulary are fixed for the lifetime of the engine and supplied
/// externally.
#[derive(Clone, Debug)]
pub struct Config {
    facets: Vec<String>,
    facet_label: String,
    tags: Vec<String>,
    page_size: usize,
}

impl Config {
    pub fn new(facets: Vec<String>, facet_label: String, tags: Vec<String>, page_size: usize) -> Self {
        Self {
            facets,
            facet_label,
            tags,
            page_size,
        }
    }

    /// Reads the configuration from `ROSTER_FACETS`, `ROSTER_FACET_LABEL`,
    /// `ROSTER_TAGS` (comma-separated lists) and `ROSTER_PAGE_SIZE`.
    pub fn from_env() -> Self {
        let facets = split_list(&get_variable("ROSTER_FACETS"));
        let facet_label = get_variable("ROSTER_FACET_LABEL");
        let tags = split_list(&get_variable("ROSTER_TAGS"));
        let page_size = get_variable("ROSTER_PAGE_SIZE")
            .parse()
            .expect("parse ROSTER_PAGE_SIZE as usize");

        Self::new(facets, facet_label, tags, page_size)
    }

    /// Returns the configured facets in declaration order. The order is
    /// significant: it breaks ties in the per-facet performance ranking.
    pub fn facets(&self) -> &[String] {
        &self.facets
    }

    /// Returns the display label for the facet column ("District",
    /// "Church", ...).
    pub fn facet_label(&self) -> &str {
        &self.facet_label
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn contains_facet(&self, facet: &str) -> bool {
        self.facets.iter().any(|f| f == facet)
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            vec![
                "Suphan Buri".to_owned(),
                "Kanchanaburi".to_owned(),
                "Uthai Thani".to_owned(),
                "Sing Buri".to_owned(),
            ],
            "District".to_owned(),
            vec![
                "Committee".to_owned(),
                "Volunteer".to_owned(),
                "Alumni".to_owned(),
            ],
            10,
        )
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
