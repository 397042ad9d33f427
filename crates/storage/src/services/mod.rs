pub mod ledger;
pub mod media;
pub mod points;
pub mod reconcile;
