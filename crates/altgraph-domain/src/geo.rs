//! Geolocation data attached to IP addresses

/// What the geolocation collaborator knows about one IP
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeoInfo {
    /// Country name
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country_code: Option<String>,
    /// Region code
    pub region: Option<String>,
    /// Region name
    pub region_name: Option<String>,
    /// City
    pub city: Option<String>,
    /// Internet service provider
    pub isp: Option<String>,
    /// Organization
    pub org: Option<String>,
    /// Flagged as a proxy or VPN exit
    pub proxy: bool,
    /// Flagged as a hosting provider
    pub hosting: bool,
}

impl GeoInfo {
    /// Best human-readable region: region name, falling back to region code
    pub fn display_region(&self) -> Option<&str> {
        self.region_name
            .as_deref()
            .filter(|r| !r.is_empty())
            .or_else(|| self.region.as_deref().filter(|r| !r.is_empty()))
    }
}
