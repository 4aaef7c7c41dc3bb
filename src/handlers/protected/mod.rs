// handlers/protected - /api/* endpoints
//
//   roles       page-order read/save, operation batches, per-role tree
//   navigation  merged per-user navigation trees

pub mod navigation;
pub mod roles;
