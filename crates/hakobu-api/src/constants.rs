/// Route prefix for the versioned API surface.
pub const API_PREFIX: &str = "/api/v0";
