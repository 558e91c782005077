//! Scope strings and the parameters adapters are bound to.

/// Scope of items that exist outside any provider hierarchy (IPs, DNS names).
pub const GLOBAL_SCOPE: &str = "global";

/// Wildcard scope.
///
/// Only valid on backlink queries whose destination scope the engine cannot
/// know; the downstream consumer resolves it at query time.
pub const WILDCARD_SCOPE: &str = "*";

/// How a resource type's scope string is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeShape {
    /// `global`
    Global,
    /// `project` (or account id)
    Project,
    /// `project.region`
    Regional,
    /// `project.zone`
    Zonal,
}

impl ScopeShape {
    /// Render the scope string for the given parameters.
    ///
    /// `None` when the parameters do not carry the region/zone this shape
    /// needs.
    pub fn scope_for(&self, params: &ScopeParams) -> Option<String> {
        match self {
            ScopeShape::Global => Some(GLOBAL_SCOPE.to_string()),
            ScopeShape::Project => Some(project_scope(&params.project_id)),
            ScopeShape::Regional => params
                .region
                .as_deref()
                .map(|r| regional_scope(&params.project_id, r)),
            ScopeShape::Zonal => params
                .zone
                .as_deref()
                .map(|z| zonal_scope(&params.project_id, z)),
        }
    }
}

/// Scope of project-level resources.
pub fn project_scope(project_id: &str) -> String {
    project_id.to_string()
}

/// Scope of regional resources: `project.region`.
pub fn regional_scope(project_id: &str, region: &str) -> String {
    format!("{project_id}.{region}")
}

/// Scope of zonal resources: `project.zone`.
pub fn zonal_scope(project_id: &str, zone: &str) -> String {
    format!("{project_id}.{zone}")
}

/// The project/region/zone an adapter set is bound to at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeParams {
    /// Project (or account) identifier
    pub project_id: String,
    /// Region, for regional adapters
    pub region: Option<String>,
    /// Zone, for zonal adapters
    pub zone: Option<String>,
}

impl ScopeParams {
    /// Parameters with only a project bound.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: None,
            zone: None,
        }
    }

    /// Bind a region.
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Bind a zone.
    #[must_use]
    pub fn zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }
}
