//! Dispatch engine configuration object and helpers.
//!
//! Configuration is an explicit value constructed by the caller and passed
//! into services; the domain never reads environment state on its own.

use crate::domain::geo::ServiceZone;

/// Builder-style configuration for the dispatch and acceptance services.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Circular zones rides may start and end in.
    pub(crate) service_zones: Vec<ServiceZone>,
    /// Upper bound on conditional-write attempts when resolving an
    /// acceptance race before reporting the race as lost.
    pub(crate) accept_retry_limit: u32,
    /// Slug prefixing human-readable ride confirmation codes.
    pub(crate) confirmation_code_slug: String,
}

impl DispatchConfig {
    /// Construct a configuration covering the given service zones.
    #[must_use]
    pub fn new(service_zones: Vec<ServiceZone>) -> Self {
        Self {
            service_zones,
            accept_retry_limit: 3,
            confirmation_code_slug: "ride".to_owned(),
        }
    }

    /// Override the bounded retry count for contended acceptance writes.
    #[must_use]
    pub fn with_accept_retry_limit(mut self, limit: u32) -> Self {
        self.accept_retry_limit = limit.max(1);
        self
    }

    /// Override the confirmation code slug.
    #[must_use]
    pub fn with_confirmation_code_slug(mut self, slug: impl Into<String>) -> Self {
        self.confirmation_code_slug = slug.into();
        self
    }

    /// Zones rides must start and end within.
    #[must_use]
    pub fn service_zones(&self) -> &[ServiceZone] {
        self.service_zones.as_slice()
    }

    /// Bounded retry count for contended acceptance writes.
    #[must_use]
    pub fn accept_retry_limit(&self) -> u32 {
        self.accept_retry_limit
    }

    /// Slug prefixing confirmation codes.
    #[must_use]
    pub fn confirmation_code_slug(&self) -> &str {
        self.confirmation_code_slug.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::GeoPoint;

    fn zone() -> ServiceZone {
        ServiceZone::new("downtown", GeoPoint::new(40.0, -74.0), 5.0)
    }

    #[test]
    fn defaults_are_applied() {
        let config = DispatchConfig::new(vec![zone()]);
        assert_eq!(config.accept_retry_limit(), 3);
        assert_eq!(config.confirmation_code_slug(), "ride");
        assert_eq!(config.service_zones().len(), 1);
    }

    #[test]
    fn retry_limit_floor_is_one() {
        let config = DispatchConfig::new(vec![zone()]).with_accept_retry_limit(0);
        assert_eq!(config.accept_retry_limit(), 1);
    }
}
