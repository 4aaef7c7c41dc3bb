/// Shared identifier types used across the codebase

use uuid::Uuid;

/// Navigation page identifier (owned by the page catalog)
pub type PageId = Uuid;

/// Role identifier - the unit of page-assignment ownership
pub type RoleId = Uuid;

/// Dashboard user identifier
pub type UserId = Uuid;
